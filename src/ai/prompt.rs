//! Prompt Assembly
//!
//! Builds the instruction text for one batch from the request-shape
//! descriptor: mode rules, language directive, exact item quota, the JSON
//! shape the model must return, and a digest of items already produced by
//! earlier batches so follow-up batches do not repeat them.

use serde_json::Value;

use crate::types::{GenerationMode, OutputLanguage};

/// Everything the prompt for one batch depends on
pub struct PromptContext<'a> {
    pub mode: GenerationMode,
    pub language: OutputLanguage,
    /// Items this batch must produce
    pub item_count: usize,
    /// Digests of items produced by earlier batches
    pub produced_digests: &'a [String],
}

/// Output-language directive line
pub fn lang_instruction(language: OutputLanguage) -> &'static str {
    match language {
        OutputLanguage::English => "Write output in clear academic English.",
        OutputLanguage::Arabic => "اكتب الناتج باللغة العربية الفصحى.",
    }
}

/// Build the full instruction text for one batch
pub fn build_instructions(ctx: &PromptContext<'_>) -> String {
    let mut prompt = String::new();

    prompt.push_str(lang_instruction(ctx.language));
    prompt.push_str("\n\n");
    prompt.push_str(&mode_rules(ctx.mode, ctx.item_count));
    prompt.push_str("\n\nReturn JSON only, exactly this shape:\n");
    prompt.push_str(mode_shape(ctx.mode));

    if !ctx.produced_digests.is_empty() {
        prompt.push_str("\n\nDo not repeat any of these already generated items:\n");
        for digest in ctx.produced_digests {
            prompt.push_str("- ");
            prompt.push_str(digest);
            prompt.push('\n');
        }
    }

    prompt
}

/// Extract the do-not-repeat digest for each recovered item
///
/// Items missing the digest field are skipped; an unusable digest only
/// weakens dedup across batches, it never fails the request.
pub fn digest_items(items: &[Value], mode: GenerationMode) -> Vec<String> {
    let field = mode.digest_field();
    items
        .iter()
        .filter_map(|item| item.get(field).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
        .collect()
}

fn mode_rules(mode: GenerationMode, item_count: usize) -> String {
    match mode {
        GenerationMode::Questions => format!(
            "Create exactly {} multiple-choice study questions from the given material.\n\
             Rules:\n\
             - 4 options per question\n\
             - an expanded explanation for the correct option\n\
             - a brief explanation for each wrong option\n\
             - cover distinct ideas, no overlapping questions",
            item_count
        ),
        GenerationMode::Summary => format!(
            "Summarize the given material into exactly {} structured sections without repetition.\n\
             Rules:\n\
             - merge related ideas\n\
             - organized, instructional style\n\
             - each section has a short title and a focused body",
            item_count
        ),
        GenerationMode::Flashcards => format!(
            "Create exactly {} study flashcards from the given material.\n\
             Rules:\n\
             - front is a short cue, back is the full answer\n\
             - one fact per card\n\
             - cover distinct ideas, no duplicate cards",
            item_count
        ),
    }
}

fn mode_shape(mode: GenerationMode) -> &'static str {
    match mode {
        GenerationMode::Questions => {
            r#"{
 "questions":[
  {
   "q":"",
   "options":["","","",""],
   "answer":0,
   "explanations":["","","",""]
  }
 ]
}"#
        }
        GenerationMode::Summary => {
            r#"{
 "sections":[
  {
   "title":"",
   "body":""
  }
 ]
}"#
        }
        GenerationMode::Flashcards => {
            r#"{
 "cards":[
  {
   "front":"",
   "back":""
  }
 ]
}"#
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_language_directive_present() {
        let ctx = PromptContext {
            mode: GenerationMode::Questions,
            language: OutputLanguage::English,
            item_count: 10,
            produced_digests: &[],
        };
        let prompt = build_instructions(&ctx);
        assert!(prompt.contains("clear academic English"));
        assert!(prompt.contains("exactly 10"));
        assert!(prompt.contains("\"questions\""));
    }

    #[test]
    fn test_arabic_is_default_directive() {
        let ctx = PromptContext {
            mode: GenerationMode::Summary,
            language: OutputLanguage::Arabic,
            item_count: 5,
            produced_digests: &[],
        };
        let prompt = build_instructions(&ctx);
        assert!(prompt.contains("العربية الفصحى"));
    }

    #[test]
    fn test_no_repeat_block_only_with_prior_items() {
        let empty = PromptContext {
            mode: GenerationMode::Questions,
            language: OutputLanguage::English,
            item_count: 10,
            produced_digests: &[],
        };
        assert!(!build_instructions(&empty).contains("Do not repeat"));

        let digests = vec!["What is osmosis?".to_string()];
        let follow_up = PromptContext {
            produced_digests: &digests,
            ..empty
        };
        let prompt = build_instructions(&follow_up);
        assert!(prompt.contains("Do not repeat"));
        assert!(prompt.contains("- What is osmosis?"));
    }

    #[test]
    fn test_digest_uses_mode_field() {
        let questions = vec![json!({"q": "Why is the sky blue?", "answer": 1})];
        assert_eq!(
            digest_items(&questions, GenerationMode::Questions),
            vec!["Why is the sky blue?"]
        );

        let cards = vec![json!({"front": "Capital of Jordan", "back": "Amman"})];
        assert_eq!(
            digest_items(&cards, GenerationMode::Flashcards),
            vec!["Capital of Jordan"]
        );
    }

    #[test]
    fn test_digest_skips_malformed_items() {
        let items = vec![json!({"front": "ok"}), json!({"back": "no front"}), json!(42)];
        assert_eq!(digest_items(&items, GenerationMode::Flashcards).len(), 1);
    }
}

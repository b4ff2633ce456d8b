//! Structured Output Recovery
//!
//! Recovers a well-formed structured document from free-form model text. The
//! upstream model is not contractually obligated to return clean output: it
//! may prepend prose, wrap the document in markdown fences, or emit truncated
//! JSON. Recovery is a three-tier fallback:
//!
//! 1. Strip fence markers wherever they appear and try a direct parse
//! 2. Locate the outermost balanced brace span and parse that
//! 3. Validate the expected items key is present and list-shaped
//!
//! Every failure mode is tagged (`NoStructuredContent`, `Malformed`,
//! `UnexpectedShape`) so the orchestrator can treat them uniformly as batch
//! failures without losing the reason.

use serde_json::Value;
use tracing::debug;

use crate::constants::recovery::PREVIEW_CHARS;
use crate::types::RecoveryError;

/// Recover a structured document from raw model text
pub fn recover_document(raw: &str) -> Result<Value, RecoveryError> {
    let cleaned = preprocess(raw);

    // Tier 1: the stripped text is already a complete document
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(value);
    }

    // Tier 2: outermost brace-delimited span
    debug!("Direct parse failed, searching for brace-delimited span");
    let span = locate_brace_span(&cleaned).ok_or(RecoveryError::NoStructuredContent)?;

    serde_json::from_str::<Value>(span).map_err(|e| RecoveryError::Malformed {
        detail: e.to_string(),
        preview: preview(span),
    })
}

/// Recover the item list stored under `items_key`
pub fn recover_items(raw: &str, items_key: &str) -> Result<Vec<Value>, RecoveryError> {
    let document = recover_document(raw)?;

    let items = document
        .get(items_key)
        .ok_or_else(|| {
            RecoveryError::UnexpectedShape(format!("missing top-level '{}' key", items_key))
        })?
        .as_array()
        .ok_or_else(|| {
            RecoveryError::UnexpectedShape(format!("'{}' key is not a list", items_key))
        })?;

    Ok(items.clone())
}

/// Strip fence markers and byte-order marks
///
/// Fence markers are removed wherever they appear, not just at the edges,
/// since the model may surround the fenced block with prose. A marker sharing
/// its line with content keeps everything from the first brace on.
fn preprocess(raw: &str) -> String {
    let stripped: String = raw
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            match trimmed.strip_prefix("```") {
                Some(rest) => match rest.find(['{', '}']) {
                    Some(pos) => &rest[pos..],
                    None => "",
                },
                None => line,
            }
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    stripped.trim_start_matches('\u{feff}').trim().to_string()
}

/// Find the outermost `{` .. balanced `}` span, string-aware
fn locate_brace_span(s: &str) -> Option<&str> {
    let start = s.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    // Opening brace with no balanced closer: report the unbalanced tail so the
    // caller fails with Malformed rather than NotFound
    Some(&s[start..])
}

fn preview(s: &str) -> String {
    s.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_document_passes_through() {
        let raw = r#"{"questions":[{"q":"What is 2+2?"}]}"#;
        let items = recover_items(raw, "questions").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["q"], "What is 2+2?");
    }

    #[test]
    fn test_fenced_document_matches_unwrapped() {
        let bare = r#"{"questions":[{"q":"a"},{"q":"b"}]}"#;
        let fenced = format!("```json\n{}\n```", bare);

        assert_eq!(
            recover_items(bare, "questions").unwrap(),
            recover_items(&fenced, "questions").unwrap()
        );
    }

    #[test]
    fn test_fences_inside_prose() {
        let raw = "Here you go:\n```json\n{\"cards\":[{\"front\":\"x\"}]}\n```\nEnjoy!";
        let items = recover_items(raw, "cards").unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_single_line_fenced_document() {
        let raw = r#"```json {"cards":[{"front":"x"}]} ```"#;
        let items = recover_items(raw, "cards").unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_prose_around_document() {
        let raw = r#"Sure! Here is the quiz:
{"questions":[{"q":"What?"}]}
Let me know if you need more."#;
        let items = recover_items(raw, "questions").unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_no_braces_at_all() {
        let err = recover_document("I could not produce any questions.").unwrap_err();
        assert_eq!(err, RecoveryError::NoStructuredContent);
    }

    #[test]
    fn test_truncated_document_is_malformed() {
        let raw = r#"{"questions":[{"q":"unfinished"#;
        let err = recover_document(raw).unwrap_err();
        assert!(matches!(err, RecoveryError::Malformed { .. }));
    }

    #[test]
    fn test_missing_items_key() {
        let raw = r#"{"result":"ok"}"#;
        let err = recover_items(raw, "questions").unwrap_err();
        assert!(matches!(err, RecoveryError::UnexpectedShape(_)));
    }

    #[test]
    fn test_items_key_not_a_list() {
        let raw = r#"{"questions":"a lot of them"}"#;
        let err = recover_items(raw, "questions").unwrap_err();
        assert!(matches!(err, RecoveryError::UnexpectedShape(_)));
    }

    #[test]
    fn test_nested_braces_in_strings() {
        let raw = r#"prefix {"sections":[{"title":"curly { brace } talk"}]} suffix"#;
        let items = recover_items(raw, "sections").unwrap();
        assert_eq!(items[0]["title"], "curly { brace } talk");
    }

    #[test]
    fn test_order_preserved() {
        let raw = r#"{"questions":[{"q":"1"},{"q":"2"},{"q":"3"}]}"#;
        let items = recover_items(raw, "questions").unwrap();
        let order: Vec<&str> = items.iter().map(|i| i["q"].as_str().unwrap()).collect();
        assert_eq!(order, vec!["1", "2", "3"]);
    }
}

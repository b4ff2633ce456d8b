//! Generation Request Types
//!
//! The request-shape descriptor that parameterizes the orchestrator: what kind
//! of study items to produce, in which language, how many, and from what
//! content. Immutable once built.

use serde::{Deserialize, Serialize};

/// What kind of structured items the caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Multiple-choice questions with per-option explanations
    #[default]
    Questions,
    /// Structured summary sections
    Summary,
    /// Front/back flashcards
    Flashcards,
}

impl GenerationMode {
    /// Top-level key under which the model returns the item list
    pub fn items_key(&self) -> &'static str {
        match self {
            Self::Questions => "questions",
            Self::Summary => "sections",
            Self::Flashcards => "cards",
        }
    }

    /// Human-readable label for reports and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Questions => "questions",
            Self::Summary => "summary sections",
            Self::Flashcards => "flashcards",
        }
    }

    /// Item field used for the do-not-repeat digest in follow-up batches
    pub fn digest_field(&self) -> &'static str {
        match self {
            Self::Questions => "q",
            Self::Summary => "title",
            Self::Flashcards => "front",
        }
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Questions => write!(f, "questions"),
            Self::Summary => write!(f, "summary"),
            Self::Flashcards => write!(f, "flashcards"),
        }
    }
}

/// Output language directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputLanguage {
    /// Modern Standard Arabic
    #[default]
    Arabic,
    /// Clear academic English
    English,
}

impl OutputLanguage {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Arabic => "ar",
            Self::English => "en",
        }
    }
}

/// Source content for a generation request
///
/// A request carries either text (a raw topic or extracted document text) or a
/// binary payload the upstream model consumes directly, never both.
#[derive(Debug, Clone)]
pub enum RequestContent {
    /// Short topic supplied directly by the caller
    Topic(String),
    /// Text extracted from a document
    Text(String),
    /// Binary document passed through to the model inline
    Binary { data: Vec<u8>, media_type: String },
}

impl RequestContent {
    /// Text body, if this is text-bearing content
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Topic(t) | Self::Text(t) => Some(t),
            Self::Binary { .. } => None,
        }
    }

    /// True when the text body is empty or whitespace-only
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Topic(t) | Self::Text(t) => t.trim().is_empty(),
            Self::Binary { data, .. } => data.is_empty(),
        }
    }
}

/// One logical generation request
///
/// Built once by the caller surface and owned by the orchestrator invocation
/// that processes it.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    pub language: OutputLanguage,
    /// Exact number of items the caller expects back
    pub item_count: usize,
    pub content: RequestContent,
}

impl GenerationRequest {
    pub fn new(mode: GenerationMode, item_count: usize, content: RequestContent) -> Self {
        Self {
            mode,
            language: OutputLanguage::default(),
            item_count,
            content,
        }
    }

    pub fn with_language(mut self, language: OutputLanguage) -> Self {
        self.language = language;
        self
    }
}

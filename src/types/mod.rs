//! Core Types
//!
//! Error taxonomy, request descriptors, and report types shared across the
//! crate.

pub mod error;
pub mod report;
pub mod request;

pub use error::{
    ApiError, ErrorCategory, ErrorClassifier, QuizError, RecoveryError, Result, ValidationError,
};
pub use report::{BatchOutcome, GenerationReport, GenerationStatus};
pub use request::{GenerationMode, GenerationRequest, OutputLanguage, RequestContent};

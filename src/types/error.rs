//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provides error classification for credential-rotation decisions.
//!
//! ## Error Categories
//!
//! - **RateLimit**: quota rejection on the current key (rotate)
//! - **Auth**: key rejected outright (rotate)
//! - **Network**: connectivity issues (rotate, the next key uses a fresh attempt)
//! - **BadRequest**: malformed payload (rotation will not help, but the base
//!   design still rotates for simplicity)
//! - **Transient**: temporary upstream issues
//!
//! ## Design Principles
//!
//! - Single unified error type (`QuizError`) for the entire application
//! - Structured variants with context for better debugging
//! - Category-based routing for rotation decisions
//! - No panic/unwrap - all errors are recoverable

use std::time::Duration;
use thiserror::Error;

use crate::constants::retry;

// =============================================================================
// Error Categories
// =============================================================================

/// Categories for a single failed upstream attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited / quota exhausted on this key
    RateLimit,
    /// Authentication failed for this key
    Auth,
    /// Network/connectivity issues
    Network,
    /// Upstream unavailable (5xx, overloaded)
    Unavailable,
    /// Invalid request payload
    BadRequest,
    /// Temporary upstream issues
    Transient,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// True when the failure is tied to the credential itself, so trying the
    /// next key in the pool is the right move
    pub fn is_credential_specific(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Auth)
    }

    /// Get recommended delay before the next attempt
    pub fn recommended_delay(&self) -> Duration {
        match self {
            Self::RateLimit => Duration::from_secs(retry::RATE_LIMIT_DELAY_SECS),
            Self::Network => Duration::from_secs(1),
            Self::Unavailable | Self::Transient => Duration::from_millis(500),
            _ => Duration::from_millis(retry::ATTEMPT_DELAY_MS),
        }
    }
}

// =============================================================================
// API Error
// =============================================================================

/// A single failed upstream attempt with category and retry hints
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Error category for rotation decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Rotation position of the key used (never the key itself)
    pub key_index: Option<usize>,
    /// Suggested wait time before the next attempt (if applicable)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(idx) = self.key_index {
            write!(f, "[key#{}:{}] {}", idx, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create a new API error
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            key_index: None,
            retry_after: None,
        }
    }

    /// Add the rotation position of the key that produced the error
    pub fn key_index(mut self, index: usize) -> Self {
        self.key_index = Some(index);
        self
    }

    /// Add suggested retry delay
    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    /// Create from simple message (defaults to Unknown category)
    pub fn from_message(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Unknown, message)
    }

    /// Check if the failure is credential-specific
    pub fn is_credential_specific(&self) -> bool {
        self.category.is_credential_specific()
    }

    /// Get recommended delay before the next attempt
    pub fn recommended_delay(&self) -> Duration {
        self.retry_after
            .unwrap_or_else(|| self.category.recommended_delay())
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Error classifier for upstream failures
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from the upstream service
    pub fn classify(message: &str) -> ApiError {
        let lower = message.to_lowercase();

        // Rate limiting patterns
        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota")
            || lower.contains("resource_exhausted")
        {
            return ApiError::new(ErrorCategory::RateLimit, message)
                .retry_after(Duration::from_secs(2));
        }

        // Authentication patterns
        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("api_key")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
            || lower.contains("unauthenticated")
        {
            return ApiError::new(ErrorCategory::Auth, message);
        }

        // Network patterns
        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("unreachable")
        {
            return ApiError::new(ErrorCategory::Network, message)
                .retry_after(Duration::from_secs(1));
        }

        // Upstream unavailable patterns
        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("service unavailable")
            || lower.contains("overloaded")
            || lower.contains("internal error")
            || lower.contains("500")
        {
            return ApiError::new(ErrorCategory::Unavailable, message);
        }

        // Bad request patterns
        if lower.contains("400") || lower.contains("bad request") || lower.contains("invalid") {
            return ApiError::new(ErrorCategory::BadRequest, message);
        }

        // Transient patterns
        if lower.contains("retry") || lower.contains("temporary") {
            return ApiError::new(ErrorCategory::Transient, message)
                .retry_after(Duration::from_millis(500));
        }

        ApiError::new(ErrorCategory::Unknown, message)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str) -> ApiError {
        match status {
            429 => ApiError::new(ErrorCategory::RateLimit, message)
                .retry_after(Duration::from_secs(2)),
            401 | 403 => ApiError::new(ErrorCategory::Auth, message),
            400 => ApiError::new(ErrorCategory::BadRequest, message),
            // 500 series are transient upstream issues
            500 | 502 | 503 | 504 => ApiError::new(ErrorCategory::Unavailable, message),
            _ => ApiError::new(ErrorCategory::Unknown, message),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Request rejected before any upstream call was made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("requested item count {requested} outside allowed range {min}..={max}")]
    CountOutOfRange {
        requested: usize,
        min: usize,
        max: usize,
    },

    #[error("extracted content is empty")]
    EmptyContent,
}

// =============================================================================
// Recovery Error
// =============================================================================

/// Structured output could not be recovered from raw model text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    /// No brace-delimited span exists anywhere in the text
    #[error("no structured content found in response")]
    NoStructuredContent,

    /// A candidate span was found but does not parse
    #[error("malformed structured content: {detail}. Content preview: {preview}...")]
    Malformed { detail: String, preview: String },

    /// Parsed fine but the expected items key is missing or not a list
    #[error("unexpected document shape: {0}")]
    UnexpectedShape(String),
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum QuizError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Startup / Request Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    // -------------------------------------------------------------------------
    // Upstream Errors
    // -------------------------------------------------------------------------
    /// One upstream attempt failed
    #[error("API error: {0}")]
    Api(ApiError),

    /// Every key in the pool failed for one logical call
    #[error("all {attempts} credentials exhausted, last error: {last}")]
    KeysExhausted { attempts: usize, last: ApiError },

    // -------------------------------------------------------------------------
    // Recovery Errors
    // -------------------------------------------------------------------------
    #[error("recovery failed: {0}")]
    Recovery(#[from] RecoveryError),

    // -------------------------------------------------------------------------
    // Timeouts
    // -------------------------------------------------------------------------
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },
}

impl From<ApiError> for QuizError {
    fn from(err: ApiError) -> Self {
        QuizError::Api(err)
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl QuizError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when the error terminates a single batch, not the whole request
    pub fn is_batch_scoped(&self) -> bool {
        matches!(
            self,
            Self::KeysExhausted { .. } | Self::Recovery(_) | Self::Timeout { .. }
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Generation request bounds
pub mod generation {
    /// Minimum item count a caller may request
    pub const MIN_ITEMS: usize = 5;

    /// Hard ceiling on the item count of a single request
    pub const MAX_ITEMS: usize = 60;

    /// Maximum items asked of the upstream model in one call
    pub const MAX_ITEMS_PER_CALL: usize = 10;

    /// Maximum characters of text content sent in one upstream call
    pub const MAX_CONTENT_CHARS: usize = 12_000;
}

/// Credential pool constants
pub mod pool {
    /// Env var prefix for numbered API keys (`GEMINI_KEY_1`, `GEMINI_KEY_2`, ...)
    pub const ENV_KEY_PREFIX: &str = "GEMINI_KEY_";

    /// Highest numbered env key the loader scans for
    pub const MAX_ENV_KEYS: usize = 16;
}

/// Retry loop constants
pub mod retry {
    /// Base delay between attempts on different keys (milliseconds)
    pub const ATTEMPT_DELAY_MS: u64 = 250;

    /// Extra wait when the previous key was rate limited (seconds)
    pub const RATE_LIMIT_DELAY_SECS: u64 = 2;
}

/// Structured output recovery constants
pub mod recovery {
    /// Characters of raw output echoed into recovery error messages
    pub const PREVIEW_CHARS: usize = 200;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// Default Gemini API base URL
    pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Default Gemini model
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
}

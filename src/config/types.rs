//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/quizforge/) and project (./quizforge.toml)
//! level configuration.

use serde::{Deserialize, Serialize};

use crate::ai::client::ClientConfig;
use crate::ai::{FailurePolicy, OrchestratorConfig, TimeoutConfig};
use crate::constants::{generation, network};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Upstream model settings
    pub llm: LlmConfig,

    /// Batching and request-bound settings
    pub generation: GenerationConfig,

    /// API keys (config-file source; merged with numbered env keys)
    /// Never serialized to output for security
    #[serde(skip_serializing)]
    pub keys: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
            keys: Vec::new(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `QuizError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(crate::types::QuizError::config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(crate::types::QuizError::config(
                "LLM timeout_secs must be greater than 0",
            ));
        }

        if self.generation.min_items > self.generation.max_items {
            return Err(crate::types::QuizError::config(format!(
                "generation.min_items ({}) exceeds generation.max_items ({})",
                self.generation.min_items, self.generation.max_items
            )));
        }

        if self.generation.max_items_per_call == 0 {
            return Err(crate::types::QuizError::config(
                "generation.max_items_per_call must be greater than 0",
            ));
        }

        if self.generation.max_content_chars == 0 {
            return Err(crate::types::QuizError::config(
                "generation.max_content_chars must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Client settings for the upstream call layer
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base: self.llm.api_base.clone(),
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            max_output_tokens: self.llm.max_output_tokens,
            timeout_secs: self.llm.timeout_secs,
        }
    }

    /// Orchestrator settings derived from the generation section
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            min_items: self.generation.min_items,
            max_items: self.generation.max_items,
            max_items_per_call: self.generation.max_items_per_call,
            max_content_chars: self.generation.max_content_chars,
            policy: self.generation.policy,
            timeouts: TimeoutConfig {
                upstream_call: std::time::Duration::from_secs(self.llm.timeout_secs),
                request: std::time::Duration::from_secs(self.generation.request_timeout_secs),
            },
        }
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model name
    pub model: String,

    /// API base URL
    pub api_base: String,

    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,

    /// Maximum tokens to generate per call
    pub max_output_tokens: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: network::DEFAULT_MODEL.to_string(),
            api_base: network::DEFAULT_API_BASE.to_string(),
            temperature: 0.7,
            max_output_tokens: 8192,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Caller-facing floor on the requested item count
    pub min_items: usize,

    /// Hard ceiling on the requested item count
    pub max_items: usize,

    /// Items asked of the upstream model in one call
    pub max_items_per_call: usize,

    /// Characters of text content sent in one upstream call
    pub max_content_chars: usize,

    /// What to do when a single batch fails
    pub policy: FailurePolicy,

    /// Overall deadline for one request (seconds)
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_items: generation::MIN_ITEMS,
            max_items: generation::MAX_ITEMS,
            max_items_per_call: generation::MAX_ITEMS_PER_CALL,
            max_content_chars: generation::MAX_CONTENT_CHARS,
            policy: FailurePolicy::default(),
            request_timeout_secs: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_bad_temperature_rejected() {
        let mut config = Config::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = Config::default();
        config.generation.min_items = 50;
        config.generation.max_items = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_per_call_rejected() {
        let mut config = Config::default();
        config.generation.max_items_per_call = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_keys_never_serialized() {
        let mut config = Config::default();
        config.keys = vec!["secret-key".to_string()];
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn test_policy_round_trips_kebab_case() {
        let parsed: GenerationConfig = toml::from_str(r#"policy = "fail-fast""#).unwrap();
        assert_eq!(parsed.policy, FailurePolicy::FailFast);
    }
}

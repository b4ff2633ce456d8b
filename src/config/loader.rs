//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/quizforge/config.toml)
//! 3. Project config (./quizforge.toml)
//! 4. Environment variables (QUIZFORGE_* prefix)
//!
//! API keys are collected separately: the config-file `keys` list is merged
//! with numbered `GEMINI_KEY_{n}` environment variables, empty entries
//! filtered, preserving env order first (matching the original deployment's
//! key layout).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::Config;
use crate::constants::pool;
use crate::types::{QuizError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. QUIZFORGE_LLM_MODEL -> llm.model
        figment = figment.merge(Env::prefixed("QUIZFORGE_").split('_').lowercase(true));

        let mut config: Config = figment
            .extract()
            .map_err(|e| QuizError::config(format!("configuration error: {}", e)))?;

        config.keys = Self::collect_keys(&config.keys);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| QuizError::config(format!("configuration error: {}", e)))?;

        config.keys = Self::collect_keys(&config.keys);
        config.validate()?;
        Ok(config)
    }

    /// Merge numbered env keys with the config-file key list
    ///
    /// Scans `GEMINI_KEY_1` .. `GEMINI_KEY_{MAX_ENV_KEYS}`; gaps are allowed.
    pub fn collect_keys(file_keys: &[String]) -> Vec<String> {
        let mut keys: Vec<String> = (1..=pool::MAX_ENV_KEYS)
            .filter_map(|n| env::var(format!("{}{}", pool::ENV_KEY_PREFIX, n)).ok())
            .filter(|k| !k.trim().is_empty())
            .collect();

        keys.extend(
            file_keys
                .iter()
                .filter(|k| !k.trim().is_empty())
                .cloned(),
        );
        keys
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/quizforge/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("quizforge"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("quizforge.toml")
    }
}

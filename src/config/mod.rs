//! Configuration
//!
//! TOML + environment configuration with a figment resolution chain.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{Config, GenerationConfig, LlmConfig};

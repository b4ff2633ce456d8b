//! Resilient Batched Generation
//!
//! The orchestration core: credential pool rotation, the upstream generation
//! client, bounded retry, structured output recovery, batch planning, and the
//! orchestrator that ties them together.
//!
//! ## Modules
//!
//! - `key_pool`: round-robin credential pool
//! - `client`: one Gemini call bound to one key
//! - `retry`: pool-bounded retry for a single logical call
//! - `recovery`: structured output recovery from free-form model text
//! - `planner`: batch size and content chunk planning
//! - `prompt`: mode/language prompt assembly
//! - `orchestrator`: per-request state machine and aggregation

pub mod client;
pub mod key_pool;
pub mod orchestrator;
pub mod planner;
pub mod prompt;
pub mod recovery;
pub mod retry;
pub mod timeout;

pub use client::GeminiClient;
pub use key_pool::{KeyPool, PoolKey};
pub use orchestrator::{FailurePolicy, Orchestrator, OrchestratorConfig};
pub use planner::{Batch, plan_batches};
pub use recovery::recover_items;
pub use retry::ResilientCaller;
pub use timeout::{TimeoutConfig, with_timeout};

use async_trait::async_trait;

use crate::types::Result;

/// Inline binary content forwarded to the model untouched
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub data: Vec<u8>,
    pub media_type: String,
}

/// Payload for one upstream call: assembled instructions plus the batch's
/// content slice (text) or the request's inline media
#[derive(Debug, Clone)]
pub struct GenerationPayload {
    pub instructions: String,
    pub text: Option<String>,
    pub media: Option<MediaPart>,
}

impl GenerationPayload {
    pub fn text_only(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            text: None,
            media: None,
        }
    }
}

/// One call to the upstream generation service, bound to one credential
///
/// Implementations consume the key's quota for the duration of a single call
/// and must not reuse sessions across calls. The returned text carries zero
/// structural guarantees.
#[async_trait]
pub trait GenerationCall: Send + Sync {
    async fn call(&self, key: PoolKey<'_>, payload: &GenerationPayload) -> Result<String>;

    /// Check if the upstream service is reachable
    async fn health_check(&self, key: PoolKey<'_>) -> Result<bool>;
}

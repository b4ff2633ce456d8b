//! QuizForge - AI-Driven Quiz and Study-Aid Generator
//!
//! Turns a topic or a source document into an exact-count set of structured
//! study items (multiple-choice questions, summary sections, or flashcards)
//! through a resilient batched generation pipeline.
//!
//! ## Core Features
//!
//! - **Credential Pool**: round-robin rotation across upstream API keys with
//!   bounded per-call failover
//! - **Batch Planning**: large requests decomposed into bounded sub-requests
//!   that respect per-call item and content-size limits
//! - **Output Recovery**: three-tier recovery of structured documents from
//!   free-form model text
//! - **Exact-Count Aggregation**: partial failure degrades to an explicit
//!   partial result, never to padded or silently short output
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use quizforge::ai::{GeminiClient, KeyPool, Orchestrator, ResilientCaller};
//! use quizforge::ai::client::ClientConfig;
//! use quizforge::ai::OrchestratorConfig;
//! use quizforge::types::{GenerationMode, GenerationRequest, RequestContent};
//!
//! let pool = Arc::new(KeyPool::new(keys)?);
//! let client = Arc::new(GeminiClient::new(ClientConfig::default())?);
//! let caller = ResilientCaller::new(pool, client);
//! let orchestrator = Orchestrator::new(caller, OrchestratorConfig::default());
//!
//! let request = GenerationRequest::new(
//!     GenerationMode::Questions,
//!     25,
//!     RequestContent::Topic("photosynthesis".into()),
//! );
//! let report = orchestrator.generate(request).await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: credential pool, upstream client, retry, recovery, planning,
//!   orchestration
//! - [`config`]: figment-based configuration with env-sourced key pool
//! - [`types`]: error taxonomy, request descriptors, report types
//! - [`cli`]: command implementations and terminal rendering

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, QuizError, Result};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use ai::{
    // Upstream
    GeminiClient,
    GenerationCall,
    GenerationPayload,
    // Pool
    KeyPool,
    // Orchestration
    Orchestrator,
    OrchestratorConfig,
    FailurePolicy,
    ResilientCaller,
    // Timeout
    TimeoutConfig,
    with_timeout,
};

pub use types::{
    GenerationMode, GenerationReport, GenerationRequest, GenerationStatus, OutputLanguage,
    RequestContent,
};

//! Generation Orchestrator
//!
//! Drives one logical request through the pipeline: validate, plan batches,
//! dispatch each batch through the resilient caller, recover structured items
//! from the raw response, aggregate, and finalize against the exact-count
//! contract.
//!
//! State flow per request:
//! `Planning -> Dispatching(i) -> Aggregating(i) -> ... -> Finalizing`.
//! Batches run strictly sequentially because each follow-up prompt carries a
//! do-not-repeat digest of earlier output. A batch that fails (pool exhausted
//! or unrecoverable output) is handled by the configured policy: best-effort
//! abandons the batch and keeps already-produced work; fail-fast aborts the
//! whole request.

use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::planner::{Batch, plan_batches};
use super::prompt::{PromptContext, build_instructions, digest_items};
use super::recovery::recover_items;
use super::retry::ResilientCaller;
use super::timeout::{TimeoutConfig, with_timeout};
use super::{GenerationPayload, MediaPart};
use crate::constants::generation;
use crate::types::{
    BatchOutcome, GenerationReport, GenerationRequest, GenerationStatus, QuizError, RequestContent,
    Result, ValidationError,
};

/// What to do when a single batch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abandon the failed batch and keep going; a single bad batch does not
    /// discard work already produced (default for multi-batch requests)
    #[default]
    BestEffort,
    /// Abort the whole request on the first batch failure
    FailFast,
}

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Caller-facing floor on the requested item count
    pub min_items: usize,
    /// Hard ceiling on the requested item count
    pub max_items: usize,
    /// Items asked of the upstream model in one call
    pub max_items_per_call: usize,
    /// Characters of text content sent in one upstream call
    pub max_content_chars: usize,
    pub policy: FailurePolicy,
    pub timeouts: TimeoutConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            min_items: generation::MIN_ITEMS,
            max_items: generation::MAX_ITEMS,
            max_items_per_call: generation::MAX_ITEMS_PER_CALL,
            max_content_chars: generation::MAX_CONTENT_CHARS,
            policy: FailurePolicy::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// Drives one generation request end to end
pub struct Orchestrator {
    caller: ResilientCaller,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(caller: ResilientCaller, config: OrchestratorConfig) -> Self {
        Self { caller, config }
    }

    /// Run one logical request to a terminal report
    ///
    /// Validation failures reject the request before any upstream call.
    /// The terminal status is `Succeeded` (exact count, truncated if the model
    /// over-produced) or `Partial` (fewer than requested, with the actual
    /// count); a shortfall is never padded and never re-planned.
    #[instrument(skip(self, request), fields(request_id, mode = %request.mode, requested = request.item_count))]
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationReport> {
        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", request_id.to_string().as_str());
        let started_at = Utc::now();

        self.validate(&request)?;

        // Planning
        let batches = plan_batches(
            request.item_count,
            self.config.max_items_per_call,
            request.content.text(),
            self.config.max_content_chars,
        );
        info!(batches = batches.len(), "Planned batch sequence");

        let media = match &request.content {
            RequestContent::Binary { data, media_type } => Some(MediaPart {
                data: data.clone(),
                media_type: media_type.clone(),
            }),
            _ => None,
        };

        let deadline = Instant::now() + self.config.timeouts.request;
        let mut items: Vec<Value> = Vec::with_capacity(request.item_count);
        let mut digests: Vec<String> = Vec::new();
        let mut outcomes: Vec<BatchOutcome> = Vec::new();

        for batch in &batches {
            // Enough already aggregated: skip the remaining upstream calls
            if items.len() >= request.item_count {
                debug!(batch = batch.index, "Target count reached, skipping batch");
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(batch = batch.index, "Request deadline reached, stopping dispatch");
                outcomes.push(BatchOutcome {
                    batch_index: batch.index,
                    quota: batch.item_count,
                    recovered: 0,
                    attempts: 0,
                    abandoned: Some("not dispatched: request deadline reached".to_string()),
                });
                continue;
            }

            // Dispatching(i)
            let payload = self.build_payload(&request, batch, &digests, media.clone());
            let remaining = deadline.saturating_duration_since(now);
            let dispatched = with_timeout(
                remaining,
                self.caller.call_with_retry(&payload),
                "batch dispatch",
            )
            .await;

            // Aggregating(i)
            let failure = match dispatched {
                Ok(outcome) => match recover_items(&outcome.text, request.mode.items_key()) {
                    Ok(batch_items) => {
                        debug!(
                            batch = batch.index,
                            recovered = batch_items.len(),
                            attempts = outcome.attempts,
                            "Batch aggregated"
                        );
                        digests.extend(digest_items(&batch_items, request.mode));
                        outcomes.push(BatchOutcome {
                            batch_index: batch.index,
                            quota: batch.item_count,
                            recovered: batch_items.len(),
                            attempts: outcome.attempts,
                            abandoned: None,
                        });
                        items.extend(batch_items);
                        continue;
                    }
                    Err(recovery) => (outcome.attempts, QuizError::from(recovery)),
                },
                Err(err) => {
                    let attempts = match &err {
                        QuizError::KeysExhausted { attempts, .. } => *attempts,
                        _ => 0,
                    };
                    (attempts, err)
                }
            };

            let (attempts, error) = failure;
            match self.config.policy {
                FailurePolicy::FailFast => {
                    warn!(batch = batch.index, error = %error, "Batch failed, aborting request");
                    return Err(error);
                }
                FailurePolicy::BestEffort => {
                    warn!(batch = batch.index, error = %error, "Batch abandoned");
                    outcomes.push(BatchOutcome {
                        batch_index: batch.index,
                        quota: batch.item_count,
                        recovered: 0,
                        attempts,
                        abandoned: Some(error.to_string()),
                    });
                }
            }
        }

        // Finalizing
        let status = if items.len() >= request.item_count {
            items.truncate(request.item_count);
            GenerationStatus::Succeeded
        } else {
            GenerationStatus::Partial
        };
        let produced = items.len();

        info!(?status, produced, requested = request.item_count, "Request finalized");

        Ok(GenerationReport {
            request_id,
            mode: request.mode,
            status,
            items,
            requested: request.item_count,
            produced,
            batches: outcomes,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Reject invalid requests before any upstream call
    fn validate(&self, request: &GenerationRequest) -> Result<()> {
        if request.item_count < self.config.min_items || request.item_count > self.config.max_items
        {
            return Err(ValidationError::CountOutOfRange {
                requested: request.item_count,
                min: self.config.min_items,
                max: self.config.max_items,
            }
            .into());
        }

        if request.content.is_blank() {
            return Err(ValidationError::EmptyContent.into());
        }

        Ok(())
    }

    fn build_payload(
        &self,
        request: &GenerationRequest,
        batch: &Batch,
        digests: &[String],
        media: Option<MediaPart>,
    ) -> GenerationPayload {
        let instructions = build_instructions(&PromptContext {
            mode: request.mode,
            language: request.language,
            item_count: batch.item_count,
            produced_digests: digests,
        });

        GenerationPayload {
            instructions,
            text: batch.content_slice.clone(),
            media,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::key_pool::{KeyPool, PoolKey};
    use crate::ai::{GenerationCall, GenerationPayload};
    use crate::types::{ErrorClassifier, GenerationMode};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Scripted upstream: one entry consumed per call attempt
    #[derive(Clone)]
    enum Script {
        /// Respond with n items, labels starting at `offset`
        Items { n: usize, offset: usize },
        /// Respond with this raw text
        Raw(&'static str),
        /// Fail the attempt with a 503
        Fail,
    }

    struct ScriptedBackend {
        script: Mutex<Vec<Script>>,
        payloads: Mutex<Vec<GenerationPayload>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
                payloads: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.payloads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerationCall for ScriptedBackend {
        async fn call(&self, key: PoolKey<'_>, payload: &GenerationPayload) -> Result<String> {
            self.payloads.lock().unwrap().push(payload.clone());
            let step = {
                let mut script = self.script.lock().unwrap();
                if script.is_empty() {
                    Script::Fail
                } else {
                    script.remove(0)
                }
            };

            match step {
                Script::Items { n, offset } => {
                    let questions: Vec<_> = (0..n)
                        .map(|i| json!({"q": format!("question {}", offset + i)}))
                        .collect();
                    Ok(json!({"questions": questions}).to_string())
                }
                Script::Raw(text) => Ok(text.to_string()),
                Script::Fail => Err(QuizError::Api(
                    ErrorClassifier::classify_http_status(503, "overloaded").key_index(key.index),
                )),
            }
        }

        async fn health_check(&self, _key: PoolKey<'_>) -> Result<bool> {
            Ok(true)
        }
    }

    fn orchestrator(
        pool_size: usize,
        backend: Arc<ScriptedBackend>,
        policy: FailurePolicy,
    ) -> Orchestrator {
        let pool = Arc::new(KeyPool::new((0..pool_size).map(|i| format!("k{}", i))).unwrap());
        let caller = ResilientCaller::new(pool, backend as Arc<dyn GenerationCall>);
        Orchestrator::new(
            caller,
            OrchestratorConfig {
                policy,
                ..Default::default()
            },
        )
    }

    fn topic_request(count: usize) -> GenerationRequest {
        GenerationRequest::new(
            GenerationMode::Questions,
            count,
            RequestContent::Topic("cell biology".to_string()),
        )
    }

    #[tokio::test]
    async fn test_exact_count_success() {
        let backend = ScriptedBackend::new(vec![
            Script::Items { n: 10, offset: 0 },
            Script::Items { n: 10, offset: 10 },
        ]);
        let orch = orchestrator(1, backend.clone(), FailurePolicy::BestEffort);

        let report = orch.generate(topic_request(20)).await.unwrap();
        assert_eq!(report.status, GenerationStatus::Succeeded);
        assert_eq!(report.produced, 20);
        assert_eq!(report.items.len(), 20);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_overproduction_truncated_in_order() {
        let backend = ScriptedBackend::new(vec![Script::Items { n: 12, offset: 0 }]);
        let orch = orchestrator(1, backend, FailurePolicy::BestEffort);

        let report = orch.generate(topic_request(10)).await.unwrap();
        assert_eq!(report.status, GenerationStatus::Succeeded);
        assert_eq!(report.items.len(), 10);
        assert_eq!(report.items[0]["q"], "question 0");
        assert_eq!(report.items[9]["q"], "question 9");
    }

    #[tokio::test]
    async fn test_fenced_overproduced_response_truncated() {
        // Model wraps 12 items in a markdown fence; caller asked for 10
        let backend = ScriptedBackend::new(vec![Script::Raw(
            "```json\n{\"questions\":[{\"q\":\"0\"},{\"q\":\"1\"},{\"q\":\"2\"},{\"q\":\"3\"},\
             {\"q\":\"4\"},{\"q\":\"5\"},{\"q\":\"6\"},{\"q\":\"7\"},{\"q\":\"8\"},{\"q\":\"9\"},\
             {\"q\":\"10\"},{\"q\":\"11\"}]}\n```",
        )]);
        let orch = orchestrator(1, backend, FailurePolicy::BestEffort);

        let report = orch.generate(topic_request(10)).await.unwrap();
        assert_eq!(report.status, GenerationStatus::Succeeded);
        assert_eq!(report.items.len(), 10);
        assert_eq!(report.items[9]["q"], "9");
    }

    #[tokio::test]
    async fn test_partial_when_one_batch_exhausts_pool() {
        // 25 items -> batches [10, 10, 5]; third batch fails on both keys
        let backend = ScriptedBackend::new(vec![
            Script::Items { n: 10, offset: 0 },
            Script::Items { n: 10, offset: 10 },
            Script::Fail,
            Script::Fail,
        ]);
        let orch = orchestrator(2, backend, FailurePolicy::BestEffort);

        let report = orch.generate(topic_request(25)).await.unwrap();
        assert_eq!(report.status, GenerationStatus::Partial);
        assert_eq!(report.produced, 20);
        assert_eq!(report.abandoned_batches(), 1);
        let abandoned = &report.batches[2];
        assert_eq!(abandoned.attempts, 2);
        assert!(abandoned.abandoned.as_ref().unwrap().contains("exhausted"));
    }

    #[tokio::test]
    async fn test_unrecoverable_output_does_not_crash() {
        let backend = ScriptedBackend::new(vec![
            Script::Raw("I have no braces to give."),
            Script::Items { n: 10, offset: 0 },
        ]);
        let orch = orchestrator(1, backend, FailurePolicy::BestEffort);

        let report = orch.generate(topic_request(20)).await.unwrap();
        assert_eq!(report.status, GenerationStatus::Partial);
        assert_eq!(report.produced, 10);
        assert!(
            report.batches[0]
                .abandoned
                .as_ref()
                .unwrap()
                .contains("no structured content")
        );
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_request() {
        let backend = ScriptedBackend::new(vec![Script::Fail]);
        let orch = orchestrator(1, backend.clone(), FailurePolicy::FailFast);

        let err = orch.generate(topic_request(20)).await.unwrap_err();
        assert!(matches!(err, QuizError::KeysExhausted { .. }));
        // First batch failed, second was never dispatched
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_count_below_floor_rejected_without_calls() {
        let backend = ScriptedBackend::new(vec![]);
        let orch = orchestrator(1, backend.clone(), FailurePolicy::BestEffort);

        let err = orch.generate(topic_request(3)).await.unwrap_err();
        assert!(matches!(
            err,
            QuizError::Validation(ValidationError::CountOutOfRange { .. })
        ));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_count_above_ceiling_rejected_not_clamped() {
        let backend = ScriptedBackend::new(vec![]);
        let orch = orchestrator(1, backend.clone(), FailurePolicy::BestEffort);

        let err = orch.generate(topic_request(100)).await.unwrap_err();
        assert!(matches!(
            err,
            QuizError::Validation(ValidationError::CountOutOfRange { .. })
        ));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_content_rejected_without_calls() {
        let backend = ScriptedBackend::new(vec![]);
        let orch = orchestrator(1, backend.clone(), FailurePolicy::BestEffort);

        let request = GenerationRequest::new(
            GenerationMode::Questions,
            10,
            RequestContent::Text("   \n".to_string()),
        );
        let err = orch.generate(request).await.unwrap_err();
        assert!(matches!(
            err,
            QuizError::Validation(ValidationError::EmptyContent)
        ));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_follow_up_batch_carries_do_not_repeat_digest() {
        let backend = ScriptedBackend::new(vec![
            Script::Items { n: 10, offset: 0 },
            Script::Items { n: 10, offset: 10 },
        ]);
        let orch = orchestrator(1, backend.clone(), FailurePolicy::BestEffort);

        orch.generate(topic_request(20)).await.unwrap();

        let payloads = backend.payloads.lock().unwrap();
        assert!(!payloads[0].instructions.contains("Do not repeat"));
        assert!(payloads[1].instructions.contains("Do not repeat"));
        assert!(payloads[1].instructions.contains("question 0"));
    }

    #[tokio::test]
    async fn test_stops_dispatching_once_target_reached() {
        // First batch over-produces past the total; second batch is skipped
        let backend = ScriptedBackend::new(vec![Script::Items { n: 20, offset: 0 }]);
        let orch = orchestrator(1, backend.clone(), FailurePolicy::BestEffort);

        let report = orch.generate(topic_request(20)).await.unwrap();
        assert_eq!(report.status, GenerationStatus::Succeeded);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_media_request_passes_binary_to_every_batch() {
        let backend = ScriptedBackend::new(vec![
            Script::Items { n: 10, offset: 0 },
            Script::Items { n: 10, offset: 10 },
        ]);
        let orch = orchestrator(1, backend.clone(), FailurePolicy::BestEffort);

        let request = GenerationRequest::new(
            GenerationMode::Questions,
            20,
            RequestContent::Binary {
                data: vec![1, 2, 3],
                media_type: "application/pdf".to_string(),
            },
        );
        orch.generate(request).await.unwrap();

        let payloads = backend.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 2);
        assert!(payloads.iter().all(|p| p.media.is_some()));
        assert!(payloads.iter().all(|p| p.text.is_none()));
    }
}

//! Resilient Caller
//!
//! Retries a single logical upstream call across the key pool. The loop runs
//! exactly `pool.len()` times, drawing the next rotation position each
//! iteration, so every key is tried at most once per logical call and the loop
//! always terminates. The last attempt's error is surfaced when the whole pool
//! fails.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::key_pool::KeyPool;
use super::{GenerationCall, GenerationPayload};
use crate::types::{ApiError, QuizError, Result};

/// Successful call plus how many attempts it took
#[derive(Debug)]
pub struct CallOutcome {
    pub text: String,
    pub attempts: usize,
}

/// Retries one logical call across every key in the pool
pub struct ResilientCaller {
    pool: Arc<KeyPool>,
    client: Arc<dyn GenerationCall>,
}

impl ResilientCaller {
    pub fn new(pool: Arc<KeyPool>, client: Arc<dyn GenerationCall>) -> Self {
        Self { pool, client }
    }

    pub fn pool(&self) -> &KeyPool {
        &self.pool
    }

    /// Try the payload against successive keys until one succeeds
    ///
    /// Fails with `KeysExhausted` only after every key in the pool has been
    /// tried exactly once for this call.
    pub async fn call_with_retry(&self, payload: &GenerationPayload) -> Result<CallOutcome> {
        let max_attempts = self.pool.len();
        let mut last_error: Option<ApiError> = None;

        for attempt in 1..=max_attempts {
            let key = self.pool.next();
            debug!(
                attempt,
                max_attempts,
                key_index = key.index,
                "Upstream attempt"
            );

            match self.client.call(key, payload).await {
                Ok(text) => {
                    return Ok(CallOutcome {
                        text,
                        attempts: attempt,
                    });
                }
                Err(QuizError::Api(api)) => {
                    warn!(
                        attempt,
                        category = %api.category,
                        error = %api,
                        "Upstream attempt failed"
                    );
                    let delay = api.recommended_delay();
                    last_error = Some(api);
                    if attempt < max_attempts {
                        sleep(delay + random_jitter(delay)).await;
                    }
                }
                Err(other) => {
                    warn!(attempt, error = %other, "Upstream attempt failed");
                    last_error = Some(ApiError::from_message(other.to_string()));
                    if attempt < max_attempts {
                        sleep(Duration::from_millis(crate::constants::retry::ATTEMPT_DELAY_MS))
                            .await;
                    }
                }
            }
        }

        Err(QuizError::KeysExhausted {
            attempts: max_attempts,
            last: last_error.unwrap_or_else(|| ApiError::from_message("no attempts made")),
        })
    }
}

/// Random jitter so concurrent requests don't hammer upstream in lockstep
fn random_jitter(base: Duration) -> Duration {
    let max_jitter_ms = (base.as_millis() as u64) / 4;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_jitter_ms))
}

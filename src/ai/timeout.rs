//! Unified Timeout Configuration
//!
//! Centralized timeouts plus a helper for wrapping async operations. The
//! orchestrator uses the per-call timeout around each upstream dispatch and
//! the request deadline to stop dispatching further batches.

use std::future::Future;
use std::time::Duration;

use crate::constants::network;
use crate::types::{QuizError, Result};

/// Timeouts for one logical request
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for a single upstream call
    pub upstream_call: Duration,
    /// Overall deadline for one logical request; observed at batch
    /// granularity (no further batches are dispatched once it passes)
    pub request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_call: Duration::from_secs(network::DEFAULT_TIMEOUT_SECS),
            request: Duration::from_secs(600),
        }
    }
}

/// Execute an async operation with a timeout
///
/// Returns a timeout error if the operation doesn't complete within the
/// specified duration.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(QuizError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_config_defaults() {
        let config = TimeoutConfig::default();
        assert_eq!(config.upstream_call.as_secs(), 120);
        assert_eq!(config.request.as_secs(), 600);
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, QuizError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, QuizError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(matches!(result.unwrap_err(), QuizError::Timeout { .. }));
    }
}

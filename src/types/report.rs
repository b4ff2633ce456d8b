//! Generation Report Types
//!
//! The terminal outcome of one orchestrated request. A partial result is a
//! status, not an error: callers must be able to tell "got fewer than asked"
//! from full success, and from "got none", without string matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::request::GenerationMode;

/// Terminal status of an orchestrated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    /// Exactly the requested number of items was produced
    Succeeded,
    /// Fewer items than requested; `produced` carries the actual count
    Partial,
}

/// Outcome of a single planned batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub batch_index: usize,
    /// Items the batch was asked to produce
    pub quota: usize,
    /// Items actually recovered (0 when abandoned)
    pub recovered: usize,
    /// Upstream attempts consumed by this batch
    pub attempts: usize,
    /// Why the batch was abandoned, if it was
    pub abandoned: Option<String>,
}

/// Final result of one generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub request_id: Uuid,
    pub mode: GenerationMode,
    pub status: GenerationStatus,
    /// Items in production order, truncated to exactly `requested` on success
    pub items: Vec<Value>,
    pub requested: usize,
    pub produced: usize,
    pub batches: Vec<BatchOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.status == GenerationStatus::Succeeded
    }

    /// Batches that produced nothing
    pub fn abandoned_batches(&self) -> usize {
        self.batches.iter().filter(|b| b.abandoned.is_some()).count()
    }

    /// Total upstream attempts across all batches
    pub fn total_attempts(&self) -> usize {
        self.batches.iter().map(|b| b.attempts).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(batches: Vec<BatchOutcome>, produced: usize, requested: usize) -> GenerationReport {
        GenerationReport {
            request_id: Uuid::new_v4(),
            mode: GenerationMode::Questions,
            status: if produced >= requested {
                GenerationStatus::Succeeded
            } else {
                GenerationStatus::Partial
            },
            items: Vec::new(),
            requested,
            produced,
            batches,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_abandoned_count() {
        let report = report_with(
            vec![
                BatchOutcome {
                    batch_index: 0,
                    quota: 10,
                    recovered: 10,
                    attempts: 1,
                    abandoned: None,
                },
                BatchOutcome {
                    batch_index: 1,
                    quota: 10,
                    recovered: 0,
                    attempts: 3,
                    abandoned: Some("all credentials exhausted".to_string()),
                },
            ],
            10,
            20,
        );
        assert_eq!(report.abandoned_batches(), 1);
        assert_eq!(report.total_attempts(), 4);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_partial_distinguishable_from_success() {
        let full = report_with(Vec::new(), 20, 20);
        let partial = report_with(Vec::new(), 10, 20);
        let empty = report_with(Vec::new(), 0, 20);

        assert_eq!(full.status, GenerationStatus::Succeeded);
        assert_eq!(partial.status, GenerationStatus::Partial);
        assert_eq!(empty.status, GenerationStatus::Partial);
        assert_ne!(partial.produced, empty.produced);
    }
}

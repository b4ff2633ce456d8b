//! Batch Planner
//!
//! Decomposes one logical request into bounded sub-requests. Item counts are
//! split greedily so no batch exceeds the per-call maximum and the sizes sum
//! exactly to the requested total. Oversized text content is partitioned into
//! sequential fixed-size chunks in source order; each chunk is given an equal
//! share of the item total and planning stops as soon as the total is covered.
//!
//! Ordering is deterministic and stable. Batches are not independent: later
//! batches carry a do-not-repeat digest of earlier output, so batch `i` must
//! be dispatched before batch `i + 1`.

use crate::constants::generation;

/// One bounded sub-request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position in the dispatch sequence
    pub index: usize,
    /// Items this batch asks the model for, always in `1..=per_call_max`
    pub item_count: usize,
    /// The content chunk this batch covers, or the full content when no
    /// chunking applied; `None` for content-free (topic-only or media) requests
    pub content_slice: Option<String>,
}

/// Plan the ordered batch sequence for a request
///
/// `total_items` is clamped to the hard ceiling before planning; bounds
/// enforcement with a caller-facing floor is the orchestrator's job.
pub fn plan_batches(
    total_items: usize,
    per_call_max: usize,
    content: Option<&str>,
    max_content_chars: usize,
) -> Vec<Batch> {
    let total = total_items.min(generation::MAX_ITEMS);
    if total == 0 || per_call_max == 0 {
        return Vec::new();
    }

    let chunks = match content {
        Some(text) if text.chars().count() > max_content_chars => {
            chunk_text(text, max_content_chars)
        }
        Some(text) => vec![text.to_string()],
        None => Vec::new(),
    };

    if chunks.len() <= 1 {
        // Single slice (or none): pure item-count batching, every batch
        // carries the same content reference
        let slice = chunks.into_iter().next();
        return split_quota(total, per_call_max)
            .into_iter()
            .enumerate()
            .map(|(index, item_count)| Batch {
                index,
                item_count,
                content_slice: slice.clone(),
            })
            .collect();
    }

    // Chunked content: spread the total evenly across chunks, stop early once
    // the total is covered
    let quota_per_chunk = total.div_ceil(chunks.len());
    let mut batches = Vec::new();
    let mut remaining = total;

    for chunk in chunks {
        if remaining == 0 {
            break;
        }
        let chunk_quota = quota_per_chunk.min(remaining);
        for item_count in split_quota(chunk_quota, per_call_max) {
            batches.push(Batch {
                index: batches.len(),
                item_count,
                content_slice: Some(chunk.clone()),
            });
        }
        remaining -= chunk_quota;
    }

    batches
}

/// Greedy split: each batch takes `min(per_call_max, remaining)`
fn split_quota(total: usize, per_call_max: usize) -> Vec<usize> {
    let mut sizes = Vec::with_capacity(total.div_ceil(per_call_max));
    let mut remaining = total;
    while remaining > 0 {
        let take = per_call_max.min(remaining);
        sizes.push(take);
        remaining -= take;
    }
    sizes
}

/// Partition text into fixed-size character chunks, source order, no overlap
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

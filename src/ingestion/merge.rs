//! Merge functions - fold freshly fetched records into the stored dataset
//!
//! Conflict resolution is last-write-wins on the (timestamp, lat, lon) key:
//! incoming beats existing, and among incoming duplicates the last fetched
//! wins. The result is stably sorted by timestamp.

use crate::ingestion::types::{Dataset, MergeStats, Record, RecordKey};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Merge `incoming` into `existing`
/// Pure function - no side effects
pub fn merge(existing: Dataset, incoming: Vec<Record>) -> Dataset {
    merge_with_stats(existing, incoming).0
}

/// Same as [`merge`], also reporting what changed
pub fn merge_with_stats(existing: Dataset, incoming: Vec<Record>) -> (Dataset, MergeStats) {
    let existing_len = existing.len();

    if incoming.is_empty() {
        let stats = MergeStats {
            existing: existing_len,
            total: existing_len,
            ..MergeStats::default()
        };
        return (existing, stats);
    }

    let stored_keys: HashSet<RecordKey> = existing.iter().map(Record::key).collect();
    let incoming_keys: HashSet<RecordKey> = incoming.iter().map(Record::key).collect();
    let replaced = incoming_keys.intersection(&stored_keys).count();

    let combined: Vec<Record> = existing.into_records().into_iter().chain(incoming).collect();
    let combined_len = combined.len();

    let mut merged = dedup_keep_last(combined);
    merged.sort_by_key(|record| record.timestamp); // stable

    debug!(
        "Merged {} records into {} ({} duplicates dropped)",
        combined_len,
        merged.len(),
        combined_len - merged.len()
    );

    let stats = MergeStats {
        existing: existing_len,
        incoming: combined_len - existing_len,
        inserted: incoming_keys.len() - replaced,
        replaced,
        total: merged.len(),
    };

    (Dataset::from(merged), stats)
}

/// Keep only the last occurrence of each key, in its original position
fn dedup_keep_last(records: Vec<Record>) -> Vec<Record> {
    let last_seen: HashMap<RecordKey, usize> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| (record.key(), idx))
        .collect();

    records
        .into_iter()
        .enumerate()
        .filter(|(idx, record)| last_seen.get(&record.key()) == Some(idx))
        .map(|(_, record)| record)
        .collect()
}

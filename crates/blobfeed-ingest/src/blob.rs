//! Blob identities and ordering policy

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Identity of a remote object as reported by a listing page.
///
/// Immutable once created; discarded after its ingestion task has been
/// dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    /// Object key, unique within the container at listing time
    pub name: String,
    /// Last-modified instant from the storage system's own metadata
    pub last_modified: DateTime<Utc>,
    /// Object size in bytes (not interpreted by the engine)
    pub size: i64,
}

/// Deduplicated listing result keyed by blob name.
///
/// Insertion is a set-add, which protects against storage APIs that
/// return overlapping pages.
pub type BlobSet = HashMap<String, BlobRef>;

/// Render a [`BlobSet`] as a sequence sorted ascending by last-modified,
/// ties broken by name for determinism.
///
/// Oldest objects are dispatched first, so when a shutdown interrupts a
/// cycle mid-batch the older entries are the ones most likely to have
/// been fully drained. This is a dispatch-order guarantee only; task
/// completion is concurrent and unordered.
pub fn oldest_first(set: BlobSet) -> Vec<BlobRef> {
    let mut blobs: Vec<BlobRef> = set.into_values().collect();
    blobs.sort_by(|a, b| {
        a.last_modified
            .cmp(&b.last_modified)
            .then_with(|| a.name.cmp(&b.name))
    });
    blobs
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn blob(name: &str, secs: i64) -> BlobRef {
        BlobRef {
            name: name.to_string(),
            last_modified: Utc.timestamp_opt(secs, 0).unwrap(),
            size: 0,
        }
    }

    #[test]
    fn test_oldest_first_sorts_by_last_modified() {
        let mut set = BlobSet::new();
        for b in [blob("c", 30), blob("a", 10), blob("b", 20)] {
            set.insert(b.name.clone(), b);
        }

        let ordered = oldest_first(set);
        let names: Vec<&str> = ordered.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_equal_timestamps_break_ties_by_name() {
        let mut set = BlobSet::new();
        for b in [blob("zulu", 10), blob("alpha", 10), blob("mike", 10)] {
            set.insert(b.name.clone(), b);
        }

        let ordered = oldest_first(set);
        let names: Vec<&str> = ordered.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mike", "zulu"]);
    }

    #[test]
    fn test_ordering_is_non_decreasing() {
        let mut set = BlobSet::new();
        for (i, secs) in [50i64, 10, 30, 30, 20].iter().enumerate() {
            let b = blob(&format!("blob-{}", i), *secs);
            set.insert(b.name.clone(), b);
        }

        let ordered = oldest_first(set);
        for pair in ordered.windows(2) {
            assert!(pair[0].last_modified <= pair[1].last_modified);
        }
    }
}

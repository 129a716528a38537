//! Paginated container listing
//!
//! Enumerates every object currently in the container, one capped page at
//! a time, and accumulates the entries into a name-keyed set. Container
//! sizes are unbounded, so pages must stay capped; the set keeps memory
//! proportional to the number of distinct objects, not to the number of
//! pages.

use blobfeed_common::FeedError;
use tracing::debug;

use crate::blob::BlobSet;
use crate::storage::BlobStore;

/// Page size cap for listing calls. Listing an unbounded container in one
/// request risks exhausting memory on the storage gateway and here.
pub const MAX_PAGE_RESULTS: i32 = 100;

/// Enumerate all objects in the container.
///
/// Fails with [`FeedError::StorageUnavailable`] if any page request
/// errors; the failure is propagated, not retried, and the next poll
/// cycle starts the listing over. Entries repeated across overlapping
/// pages collapse into a single [`BlobSet`] entry.
pub async fn list_all(store: &dyn BlobStore) -> Result<BlobSet, FeedError> {
    let mut blobs = BlobSet::new();
    let mut token: Option<String> = None;
    let mut pages = 0u32;

    loop {
        let page = store
            .list_page(token.as_deref(), MAX_PAGE_RESULTS)
            .await
            .map_err(FeedError::StorageUnavailable)?;
        pages += 1;

        for entry in page.entries {
            blobs.insert(entry.name.clone(), entry);
        }

        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    debug!(blobs = blobs.len(), pages, "Container listing complete");

    Ok(blobs)
}

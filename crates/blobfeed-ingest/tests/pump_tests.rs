//! End-to-end pump tests against an in-memory blob store

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use blobfeed_ingest::blob::BlobRef;
use blobfeed_ingest::config::IngestConfig;
use blobfeed_ingest::pump::BlobPump;
use blobfeed_ingest::storage::{BlobPage, BlobStore};
use blobfeed_ingest::Event;

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

/// In-memory container with per-blob failure injection.
#[derive(Default)]
struct MemoryStore {
    blobs: Mutex<BTreeMap<String, (DateTime<Utc>, Vec<u8>)>>,
    list_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    /// Names whose fetch always fails
    fail_fetch: Mutex<HashSet<String>>,
    /// Names whose next delete fails (cleared after one failure)
    fail_delete_once: Mutex<HashSet<String>>,
}

impl MemoryStore {
    fn put(&self, name: &str, modified_secs: i64, payload: &[u8]) {
        self.blobs.lock().unwrap().insert(
            name.to_string(),
            (
                Utc.timestamp_opt(modified_secs, 0).unwrap(),
                payload.to_vec(),
            ),
        );
    }

    fn names(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn list_page(&self, token: Option<&str>, max_results: i32) -> Result<BlobPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let blobs = self.blobs.lock().unwrap();
        let entries: Vec<BlobRef> = blobs
            .iter()
            .filter(|(name, _)| token.map_or(true, |t| name.as_str() > t))
            .take(max_results as usize)
            .map(|(name, (modified, payload))| BlobRef {
                name: name.clone(),
                last_modified: *modified,
                size: payload.len() as i64,
            })
            .collect();

        let next_token = match entries.last() {
            Some(last) if blobs.keys().any(|k| k.as_str() > last.name.as_str()) => {
                Some(last.name.clone())
            },
            _ => None,
        };

        Ok(BlobPage {
            entries,
            next_token,
        })
    }

    async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_fetch.lock().unwrap().contains(name) {
            anyhow::bail!("injected fetch failure for {}", name);
        }

        let blobs = self.blobs.lock().unwrap();
        blobs
            .get(name)
            .map(|(_, payload)| payload.clone())
            .ok_or_else(|| anyhow::anyhow!("no such blob: {}", name))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        if self.fail_delete_once.lock().unwrap().remove(name) {
            anyhow::bail!("injected delete failure for {}", name);
        }

        self.blobs.lock().unwrap().remove(name);
        Ok(())
    }
}

fn config(workers: usize, interval_secs: u64) -> IngestConfig {
    IngestConfig {
        interval_secs,
        workers,
        tags: Vec::new(),
    }
}

async fn recv_event(events: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(RECV_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("sink closed before event arrived")
}

#[tokio::test(start_paused = true)]
async fn single_cycle_drains_container_oldest_first() {
    let store = Arc::new(MemoryStore::default());
    store.put("logs/2017_11_01_19_41_34_0000003.c.log.xml", 30, b"third");
    store.put("logs/2017_11_01_19_41_34_0000001.a.log.xml", 10, b"first");
    store.put("logs/2017_11_01_19_41_34_0000002.b.log.xml", 20, b"second");

    let (sink, mut events) = mpsc::unbounded_channel();
    // One worker makes completion order equal dispatch order.
    let handle = BlobPump::new("logs", store.clone(), config(1, 3600)).start(sink);

    let first = recv_event(&mut events).await;
    let second = recv_event(&mut events).await;
    let third = recv_event(&mut events).await;

    assert_eq!(first.payload, b"first");
    assert_eq!(second.payload, b"second");
    assert_eq!(third.payload, b"third");

    assert_eq!(first.container, "logs");
    assert_eq!(first.sort_order, "2017_11_01_19_41_34_0000001");
    assert_eq!(
        first.timestamp.as_deref(),
        Some("2017-11-01T19:41:34.0000001Z")
    );

    handle.stop().await;

    assert!(store.names().is_empty(), "all blobs should be deleted");
}

#[tokio::test(start_paused = true)]
async fn delete_failure_reemits_identical_event_next_cycle() {
    let store = Arc::new(MemoryStore::default());
    store.put("logs/entry.log", 10, b"payload");
    store
        .fail_delete_once
        .lock()
        .unwrap()
        .insert("logs/entry.log".to_string());

    let (sink, mut events) = mpsc::unbounded_channel();
    let handle = BlobPump::new("logs", store.clone(), config(2, 1)).start(sink);

    // First cycle: event emitted, delete fails, blob stays listed.
    let first = recv_event(&mut events).await;
    // Second cycle: the same blob produces a duplicate event.
    let second = recv_event(&mut events).await;

    assert_eq!(first, second, "duplicate must be byte-identical");

    handle.stop().await;

    assert!(
        store.names().is_empty(),
        "second cycle's delete should succeed"
    );
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_leaves_blob_for_next_cycle() {
    let store = Arc::new(MemoryStore::default());
    store.put("logs/bad.log", 10, b"unreachable");
    store
        .fail_fetch
        .lock()
        .unwrap()
        .insert("logs/bad.log".to_string());

    let (sink, mut events) = mpsc::unbounded_channel();
    let handle = BlobPump::new("logs", store.clone(), config(2, 1)).start(sink);

    // Wait until the pump has attempted the fetch at least twice, which
    // proves the blob survived a full cycle.
    while store.fetch_calls.load(Ordering::SeqCst) < 2 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    handle.stop().await;

    assert_eq!(store.names(), vec!["logs/bad.log".to_string()]);
    assert!(
        events.try_recv().is_err(),
        "failed fetches must not emit events"
    );
}

#[tokio::test(start_paused = true)]
async fn stop_is_terminal_no_new_cycle_starts() {
    let store = Arc::new(MemoryStore::default());

    let (sink, _events) = mpsc::unbounded_channel();
    let handle = BlobPump::new("logs", store.clone(), config(2, 3600)).start(sink);

    // Let the first (empty) cycle run.
    while store.list_calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let cycles_before_stop = store.list_calls.load(Ordering::SeqCst);

    handle.stop().await;

    // Anything listed after the drain returned would be a new cycle.
    let cycles_after_stop = store.list_calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(7200)).await;

    assert_eq!(cycles_before_stop, cycles_after_stop);
    assert_eq!(
        store.list_calls.load(Ordering::SeqCst),
        cycles_after_stop,
        "no poll cycle may begin after stop"
    );
}

#[tokio::test(start_paused = true)]
async fn events_carry_configured_tags() {
    let store = Arc::new(MemoryStore::default());
    store.put("logs/entry.log", 10, b"tagged");

    let ingest = IngestConfig {
        interval_secs: 3600,
        workers: 2,
        tags: vec!["prod".to_string(), "eu-west".to_string()],
    };

    let (sink, mut events) = mpsc::unbounded_channel();
    let handle = BlobPump::new("logs", store.clone(), ingest).start(sink);

    let event = recv_event(&mut events).await;
    assert_eq!(event.tags, vec!["prod", "eu-west"]);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn pagination_survives_many_blobs() {
    let store = Arc::new(MemoryStore::default());
    // More blobs than one listing page (MAX_PAGE_RESULTS = 100).
    for i in 0..250 {
        store.put(&format!("logs/blob-{:04}.log", i), i, b"x");
    }

    let (sink, mut events) = mpsc::unbounded_channel();
    let handle = BlobPump::new("logs", store.clone(), config(8, 3600)).start(sink);

    for _ in 0..250 {
        recv_event(&mut events).await;
    }

    handle.stop().await;
    assert!(store.names().is_empty());
}

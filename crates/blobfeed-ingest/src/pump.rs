//! Poll loop and ingestion tasks
//!
//! The driver repeatedly lists the container, sorts the result oldest
//! first, and fans the blobs out to the worker pool: each task fetches
//! the blob, queues one event on the sink, then deletes the blob.
//! Delivery is at-least-once: a delete failure (or a crash between
//! queue and delete) re-emits the blob on a later cycle.

use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use blobfeed_common::FeedError;

use crate::blob::{oldest_first, BlobRef};
use crate::config::IngestConfig;
use crate::event::{Event, EventSink};
use crate::lister;
use crate::pool::WorkerPool;
use crate::sortkey;
use crate::storage::BlobStore;

/// The ingestion engine.
///
/// Constructed once at startup, then consumed by [`BlobPump::start`],
/// which runs the poll loop on a background task and hands back a
/// [`PumpHandle`] for shutdown.
pub struct BlobPump {
    container: String,
    store: Arc<dyn BlobStore>,
    config: IngestConfig,
    shutdown: CancellationToken,
}

impl BlobPump {
    pub fn new(
        container: impl Into<String>,
        store: Arc<dyn BlobStore>,
        config: IngestConfig,
    ) -> Self {
        info!("Creating worker pool with {} workers", config.workers);
        Self {
            container: container.into(),
            store,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Spawn the poll loop and return its shutdown handle.
    pub fn start(self, sink: EventSink) -> PumpHandle {
        let shutdown = self.shutdown.clone();
        let task = tokio::spawn(self.run(sink));
        PumpHandle { shutdown, task }
    }

    /// Drive poll cycles until shutdown is requested, then drain.
    ///
    /// The stop flag is checked before each cycle, before each individual
    /// dispatch, and while sleeping, so shutdown never waits out a full
    /// poll interval, only the in-flight tasks.
    pub async fn run(self, sink: EventSink) {
        let mut pool = WorkerPool::new(self.config.workers);

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            if let Err(err) = self.run_cycle(&mut pool, &sink).await {
                // Cycle-level failures are logged and retried on the next
                // cycle at the normal interval; the loop never dies.
                error!(error = ?err, "Poll cycle failed");
            }

            debug!("Sleeping for {} seconds", self.config.interval_secs);
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = sleep(Duration::from_secs(self.config.interval_secs)) => {}
            }
        }

        info!("Shutting down worker pool");
        pool.drain().await;
        info!("Worker pool drained, pump stopped");
    }

    /// One Listing → Dispatching pass.
    async fn run_cycle(&self, pool: &mut WorkerPool, sink: &EventSink) -> Result<(), FeedError> {
        let blobs = lister::list_all(self.store.as_ref()).await?;
        let blobs = oldest_first(blobs);

        if !blobs.is_empty() {
            info!("Found {} blobs to be retrieved", blobs.len());
        }

        for blob in blobs {
            if self.shutdown.is_cancelled() {
                info!("Received shutdown request while dispatching blobs");
                break;
            }

            let store = self.store.clone();
            let container = self.container.clone();
            let tags = self.config.tags.clone();
            let sink = sink.clone();
            let shutdown = self.shutdown.clone();

            pool.submit(async move {
                // A task dispatched before the stop request may start
                // after it; abandon without side effects in that case.
                if shutdown.is_cancelled() {
                    return;
                }

                match ingest_blob(store.as_ref(), &container, &blob, &tags, &sink).await {
                    Ok(()) => debug!(blob = %blob.name, "Finished processing blob"),
                    Err(FeedError::Delete { name, source }) => warn!(
                        blob = %name,
                        error = ?source,
                        "Delete failed; event already queued, blob will be re-emitted next cycle"
                    ),
                    Err(err) => warn!(
                        error = ?err,
                        "Blob ingestion failed; blob remains for the next cycle"
                    ),
                }
            })
            .await;
        }

        Ok(())
    }
}

/// Fetch one blob, queue its event, delete the blob.
///
/// Each step is a failure point: a fetch failure leaves the blob
/// untouched (retried next cycle), and a delete failure leaves it in
/// place after its event was queued (duplicated next cycle). A closed
/// sink aborts before the delete so content is never destroyed without
/// being queued.
async fn ingest_blob(
    store: &dyn BlobStore,
    container: &str,
    blob: &BlobRef,
    tags: &[String],
    sink: &EventSink,
) -> Result<(), FeedError> {
    debug!(blob = %blob.name, "Fetching blob");
    let payload = store
        .fetch(&blob.name)
        .await
        .map_err(|source| FeedError::Fetch {
            name: blob.name.clone(),
            source,
        })?;

    let event = Event {
        payload,
        container: container.to_string(),
        sort_order: sortkey::sortable_token(&blob.name).to_string(),
        timestamp: sortkey::timestamp_token(&blob.name),
        tags: Vec::new(),
    }
    .decorate(tags);

    debug!(blob = %blob.name, "Queueing event");
    sink.send(event)
        .map_err(|_| FeedError::SinkClosed(blob.name.clone()))?;

    debug!(blob = %blob.name, "Deleting blob");
    store
        .delete(&blob.name)
        .await
        .map_err(|source| FeedError::Delete {
            name: blob.name.clone(),
            source,
        })?;

    Ok(())
}

/// Shutdown handle for a running pump.
///
/// The stop flag is monotonic: once cancelled it is never reset, no new
/// cycle starts, and no further task is dispatched.
pub struct PumpHandle {
    shutdown: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl PumpHandle {
    /// Request shutdown without waiting for the drain.
    pub fn request_stop(&self) {
        self.shutdown.cancel();
    }

    /// Request shutdown and block until every in-flight task has drained.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(err) = self.task.await {
            warn!(?err, "Pump task panicked during shutdown");
        }
    }
}

//! Blobfeed Ingest Library
//!
//! An at-least-once ingestion pump from cloud blob storage into an event
//! pipeline: poll a container, turn every object into one downstream
//! event, delete the object to mark it consumed.
//!
//! # Pipeline
//!
//! Poll loop → [`lister`] (paginated enumeration) → [`blob::oldest_first`]
//! (deterministic ordering) → [`pool::WorkerPool`] (bounded fan-out) →
//! per-blob fetch/emit/delete → downstream sink.
//!
//! # Example
//!
//! ```no_run
//! use blobfeed_ingest::{config::Config, pump::BlobPump, storage::S3Container};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = Arc::new(S3Container::new(&config.storage).await?);
//!     let (sink, mut events) = tokio::sync::mpsc::unbounded_channel();
//!
//!     let handle = BlobPump::new(config.storage.container, store, config.ingest).start(sink);
//!     while let Some(event) = events.recv().await {
//!         println!("{}", serde_json::to_string(&event)?);
//!     }
//!     handle.stop().await;
//!     Ok(())
//! }
//! ```

pub mod blob;
pub mod config;
pub mod event;
pub mod lister;
pub mod pool;
pub mod pump;
pub mod sortkey;
pub mod storage;

// Re-export the types most callers need
pub use blob::{BlobRef, BlobSet};
pub use event::{Event, EventSink};
pub use pump::{BlobPump, PumpHandle};

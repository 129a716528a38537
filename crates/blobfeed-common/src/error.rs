//! Error types for Blobfeed

use thiserror::Error;

/// Result type alias for Blobfeed operations
pub type Result<T> = std::result::Result<T, FeedError>;

/// Main error type for Blobfeed
///
/// The three storage variants map directly onto the ingestion failure
/// modes: a listing failure aborts the current poll cycle, a fetch
/// failure aborts one object's task (the object is re-listed next cycle),
/// and a delete failure leaves an already-emitted object in place so its
/// event is duplicated on the next cycle. None of them is fatal.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("container listing failed")]
    StorageUnavailable(#[source] anyhow::Error),

    #[error("failed to fetch blob {name}")]
    Fetch {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to delete blob {name}")]
    Delete {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("event sink closed: {0}")]
    SinkClosed(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl FeedError {
    /// Blob name this error concerns, if it is a per-object failure.
    pub fn blob_name(&self) -> Option<&str> {
        match self {
            FeedError::Fetch { name, .. } | FeedError::Delete { name, .. } => Some(name),
            _ => None,
        }
    }
}

//! Events and the downstream sink

use serde::Serialize;
use tokio::sync::mpsc;

/// One downstream event per ingested blob.
///
/// Ownership moves to the sink the moment the event is enqueued; the
/// engine never touches it again.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Event {
    /// Fetched blob content
    #[serde(with = "payload_text")]
    pub payload: Vec<u8>,
    /// Name of the container the blob came from
    pub container: String,
    /// Filename-derived sortable token
    pub sort_order: String,
    /// Filename-derived timestamp literal, when the name follows the
    /// appender convention
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Configured decoration tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Event {
    /// Apply configured decoration before the event is handed downstream.
    pub fn decorate(mut self, tags: &[String]) -> Self {
        self.tags.extend_from_slice(tags);
        self
    }
}

/// Append-only, unbounded event intake.
///
/// The engine's only contract with the downstream consumer is "construct
/// event, append, move on"; no acknowledgment is awaited.
pub type EventSink = mpsc::UnboundedSender<Event>;

/// Serialize payload bytes as (lossy) UTF-8 text; blob contents in this
/// pipeline are log entries.
mod payload_text {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(payload: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&String::from_utf8_lossy(payload))
    }
}

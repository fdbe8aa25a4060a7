//! Error types for the protocol layer.
//!
//! When you see a `ProtocolError`, the bytes arrived fine but their
//! contents could not be turned into (or produced from) a message. None of
//! these errors is a reason to drop the connection.

/// Errors that can occur while decoding or encoding SyncPlay messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame is not valid JSON (or not UTF-8).
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The frame is JSON, but its top level is not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// None of the object's keys names a known message kind.
    ///
    /// The payload is the comma-separated list of keys we did see, which
    /// is usually all you need to spot a newer server feature.
    #[error("unknown message kind: {0}")]
    UnknownKind(String),

    /// A known kind was present but its payload could not be decoded,
    /// even after applying every tolerance rule.
    #[error("malformed {kind} payload: {source}")]
    Malformed {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing an outbound message failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ProtocolError {
    /// Returns `true` for inbound decode failures (as opposed to
    /// outbound encode failures).
    pub fn is_decode(&self) -> bool {
        !matches!(self, Self::Encode(_))
    }
}

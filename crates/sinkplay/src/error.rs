//! Unified error type for the SinkPlay client.

use sinkplay_protocol::ProtocolError;
use sinkplay_session::{SessionError, ValidationError};
use sinkplay_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// This is what [`SyncplayClient`](crate::SyncplayClient) returns and
/// what an [`ErrorReporter`](crate::ErrorReporter) receives.
#[derive(Debug, thiserror::Error)]
pub enum SinkplayError {
    /// The connection settings were rejected before any I/O.
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    /// Connecting, sending or receiving failed, or the server hung up.
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The server sent an `Error` message. The connection stays open.
    #[error("server error: {0}")]
    Server(String),

    /// The client has been disconnected.
    #[error("not connected")]
    NotConnected,
}

impl SinkplayError {
    /// `true` for errors that end the connection.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinkplay_session::SessionState;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let sinkplay_err: SinkplayError = err.into();
        assert!(matches!(sinkplay_err, SinkplayError::Transport(_)));
        assert!(sinkplay_err.to_string().contains("gone"));
        assert!(sinkplay_err.is_fatal());
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownKind("Nope".into());
        let sinkplay_err: SinkplayError = err.into();
        assert!(matches!(sinkplay_err, SinkplayError::Protocol(_)));
        assert!(!sinkplay_err.is_fatal());
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::NotActive(SessionState::Handshaking);
        let sinkplay_err: SinkplayError = err.into();
        assert!(matches!(sinkplay_err, SinkplayError::Session(_)));
        assert!(sinkplay_err.to_string().contains("Handshaking"));
    }

    #[test]
    fn test_from_validation_error() {
        let sinkplay_err: SinkplayError = ValidationError::EmptyRoom.into();
        assert_eq!(
            sinkplay_err.to_string(),
            "invalid configuration: room name is empty"
        );
    }
}

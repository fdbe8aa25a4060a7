//! Error types for the session layer.

use crate::SessionState;

/// A [`SessionConfig`](crate::SessionConfig) that cannot be used to
/// connect. Raised before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server address is empty")]
    EmptyServer,

    #[error("nickname is empty")]
    EmptyNick,

    #[error("room name is empty")]
    EmptyRoom,
}

/// Errors returned by [`Session`](crate::Session) operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A local intent (chat, readiness, file) arrived before the handshake
    /// finished or after the connection ended. Nothing was changed.
    #[error("session is not active (state: {0})")]
    NotActive(SessionState),

    /// A lifecycle call that does not apply in the current state, e.g.
    /// `on_transport_connected` without a preceding `begin_connect`.
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },

    /// An inbound frame could not be decoded.
    #[error(transparent)]
    Protocol(#[from] sinkplay_protocol::ProtocolError),
}

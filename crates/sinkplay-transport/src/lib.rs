//! Transport layer for SinkPlay.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! how we reach a SyncPlay server, plus the newline [`LineFrameCodec`] that
//! turns a TCP byte stream into discrete frames.
//!
//! # Feature Flags
//!
//! - `tcp` (default): plain TCP transport via `tokio::net::TcpStream`

mod error;
mod framing;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
pub use framing::{DEFAULT_MAX_FRAME_LEN, LineFrameCodec};
#[cfg(feature = "tcp")]
pub use tcp::{TcpConnection, TcpConnector};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opens outgoing connections to a server.
///
/// The returned futures are declared `Send` so that a generic connection
/// can be moved into a `tokio::spawn`ed task.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Connects to `addr` (`host:port`).
    fn connect(
        &self,
        addr: &str,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single connection that sends raw bytes and receives whole frames.
pub trait Connection: Send + Sync + 'static {
    /// Writes `data` to the peer as-is. Callers are responsible for the
    /// line terminator.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next frame (without its `\n` delimiter).
    ///
    /// Returns `Ok(None)` when the peer closes the connection. Must be
    /// cancel-safe: dropping the future mid-read loses no buffered data.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the connection. Unflushed writes are discarded.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_equality() {
        assert_eq!(ConnectionId::new(1), ConnectionId::new(1));
        assert_ne!(ConnectionId::new(1), ConnectionId::new(2));
    }
}

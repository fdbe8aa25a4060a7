//! TCP transport implementation using `tokio::net::TcpStream`.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio_util::codec::FramedRead;

use crate::{
    Connection, ConnectionId, Connector, DEFAULT_MAX_FRAME_LEN,
    LineFrameCodec, TransportError,
};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A [`Connector`] that dials plain TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    max_frame_len: usize,
}

impl TcpConnector {
    /// Creates a connector with the default 1 MiB frame limit.
    pub fn new() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Overrides the limit on buffered partial frames.
    pub fn max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for TcpConnector {
    type Connection = TcpConnection;

    async fn connect(
        &self,
        addr: &str,
    ) -> Result<Self::Connection, TransportError> {
        let stream = TcpStream::connect(addr).await.map_err(|source| {
            TransportError::ConnectFailed {
                addr: addr.to_string(),
                source,
            }
        })?;
        // SyncPlay messages are small and latency-sensitive (pings).
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }
        Ok(TcpConnection::from_stream(stream, self.max_frame_len))
    }
}

/// A single TCP connection to a SyncPlay server.
///
/// The stream is split into independently locked halves so a pending
/// `recv` never blocks a `send` from the same task's `select!` loop.
pub struct TcpConnection {
    id: ConnectionId,
    reader: Mutex<FramedRead<OwnedReadHalf, LineFrameCodec>>,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpConnection {
    /// Wraps an already-connected stream.
    pub fn from_stream(stream: TcpStream, max_frame_len: usize) -> Self {
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        match stream.peer_addr() {
            Ok(peer) => tracing::debug!(%id, %peer, "TCP connection open"),
            Err(_) => tracing::debug!(%id, "TCP connection open"),
        }

        let (read, write) = stream.into_split();
        Self {
            id,
            reader: Mutex::new(FramedRead::new(
                read,
                LineFrameCodec::with_max_frame_len(max_frame_len),
            )),
            writer: Mutex::new(write),
        }
    }
}

impl Connection for TcpConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        // `FramedRead::next` is cancel-safe: partial data lives in the
        // codec's buffer, not in the future.
        self.reader.lock().await.next().await.transpose()
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

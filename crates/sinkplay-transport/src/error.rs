/// Errors that can occur in the transport layer.
///
/// Every variant here is fatal for the connection it came from: the
/// session above us treats any `TransportError` as "the socket is gone".
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Establishing the TCP connection failed (refused, unreachable,
    /// DNS failure, ...).
    #[error("connect to {addr} failed: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    ///
    /// `#[from]` lets the frame decoder bubble up raw socket errors
    /// with `?`; `FramedRead` requires that conversion.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[from] std::io::Error),

    /// The peer sent more than `limit` bytes without a line delimiter.
    #[error("partial frame exceeds {limit} bytes without a newline")]
    FrameTooLarge { limit: usize },
}

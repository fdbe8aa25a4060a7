//! # SinkPlay
//!
//! A headless SyncPlay client. It connects to a SyncPlay server, completes
//! the handshake, answers every keep-alive, and keeps an up-to-date model
//! of the room (users, readiness, files, chat) that a UI can read.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sinkplay::prelude::*;
//!
//! # async fn demo() -> Result<(), SinkplayError> {
//! let config = SessionConfig::new("syncplay.pl", "alice", "movie-night");
//! let mut client = SyncplayClient::builder(config)
//!     .reporter(TracingReporter)
//!     .connect()
//!     .await?;
//!
//! client.toggle_ready()?;
//! client.send_chat("ready when you are")?;
//! println!("{} users", client.snapshot().users.len());
//!
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod driver;
mod error;
mod reporter;

pub use client::{ClientBuilder, ClientEvent, EVENT_BUFFER, SyncplayClient};
pub use error::SinkplayError;
pub use reporter::{ErrorReporter, TracingReporter};

pub use sinkplay_protocol as protocol;
pub use sinkplay_room as room;
pub use sinkplay_session as session;
pub use sinkplay_transport as transport;

/// Everything an application typically needs.
pub mod prelude {
    pub use crate::{
        ClientBuilder, ClientEvent, ErrorReporter, SinkplayError,
        SyncplayClient, TracingReporter,
    };
    pub use sinkplay_room::{ChatEntry, MediaInfo, RoomSnapshot, User};
    pub use sinkplay_session::{
        Clock, DEFAULT_PORT, ServerInfo, SessionConfig, SessionEvent,
        SessionState, SystemClock,
    };
}

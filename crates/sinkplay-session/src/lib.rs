//! Client session management for SinkPlay.
//!
//! This crate is the protocol "brain" of a SyncPlay client:
//!
//! 1. **Configuration**: where to connect and as whom ([`SessionConfig`])
//! 2. **State machine**: the handshake, keep-alive replies, and how each
//!    server message changes the room ([`Session`])
//! 3. **Time**: an injectable [`Clock`] for ping arithmetic and chat stamps
//!
//! It performs no I/O. Every call takes a decoded message or a local intent
//! and returns the messages to send back plus the events to surface.
//!
//! # How it fits in the stack
//!
//! ```text
//! Client (above)  ← owns the socket, feeds frames in, writes replies out
//!     ↕
//! Session Layer (this crate)  ← handshake, keep-alive, room updates
//!     ↕
//! Protocol + Room (below)  ← message types, room model
//! ```

mod clock;
mod config;
mod error;
mod event;
mod machine;

pub use clock::{Clock, SystemClock, unix_seconds};
pub use config::{DEFAULT_PORT, SessionConfig};
pub use error::{SessionError, ValidationError};
pub use event::{Outcome, ServerInfo, SessionEvent};
pub use machine::{Session, SessionState};

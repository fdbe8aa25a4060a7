//! Wire protocol for SinkPlay.
//!
//! This crate defines the "language" a SyncPlay client and server speak:
//!
//! - **Types** ([`ServerMessage`], [`ClientMessage`] and their payloads):
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonLineCodec`]): how those messages
//!   are converted to and from one line of JSON.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (frames) and session (room
//! state). It doesn't know about sockets or users, only how to turn a
//! frame into a typed message and back.
//!
//! ```text
//! Transport (frames) → Protocol (ServerMessage) → Session (room state)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod de;
mod error;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::{
    Codec, JsonLineCodec, LINE_TERMINATOR, decode_server_message,
    encode_client_message,
};
pub use error::ProtocolError;
pub use types::{
    ChatMessage, ClientFeatures, ClientHello, ClientMessage, ClientPing,
    ClientState, FeatureValue, Features, FileInfo, IgnoringOnTheFly,
    ListEntry, PROTOCOL_VERSION, PlayState, PlaylistChange, PlaylistIndex,
    RELEASE_VERSION, ReadyUpdate, RoomList, RoomRef, ServerError,
    ServerHello, ServerMessage, ServerPing, SetMessage, StateMessage,
    UserEvent, UserUpdate, password_digest,
};

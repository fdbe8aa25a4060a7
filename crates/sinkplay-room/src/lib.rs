//! Room model for SinkPlay.
//!
//! Holds everything the client knows about the room it joined: who is in
//! it, who is ready, what each user is playing, and the chat log.
//!
//! # Key types
//!
//! - [`RoomModel`]: the mutable model, owned by the session
//! - [`RoomSnapshot`]: an immutable copy handed to presentation
//! - [`User`], [`MediaInfo`], [`ChatEntry`]: the records it is made of

mod model;
mod snapshot;
mod user;

pub use model::RoomModel;
pub use snapshot::RoomSnapshot;
pub use user::{ChatEntry, MediaInfo, User};

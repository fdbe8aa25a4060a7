//! Read-only copies of the room model.

use serde::Serialize;

use crate::{ChatEntry, MediaInfo, User};

/// Everything presentation needs to draw the room, as of one instant.
///
/// Snapshots are plain data. They are published as `Arc<RoomSnapshot>`, so
/// readers never contend with the task that owns the live model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoomSnapshot {
    /// Our own name as assigned by the server. Empty before the handshake.
    pub local_name: String,
    /// Users in the order they first appeared.
    pub users: Vec<User>,
    pub chat: Vec<ChatEntry>,
    /// Local playback position, in seconds.
    pub position: f64,
    pub self_ready: bool,
    pub local_file: Option<MediaInfo>,
    pub playlist: Vec<String>,
    pub playlist_index: Option<u64>,
}

impl RoomSnapshot {
    /// Looks up a user by name.
    pub fn user(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|u| u.name == name)
    }

    /// Names of the users in `room`, in display order.
    pub fn users_in<'a>(&'a self, room: &'a str) -> impl Iterator<Item = &'a str> {
        self.users
            .iter()
            .filter(move |u| u.room.as_deref() == Some(room))
            .map(|u| u.name.as_str())
    }

    /// `true` when the snapshot carries no room state at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

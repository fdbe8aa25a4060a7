//! What the session hands back to its driver.

use sinkplay_protocol::{ClientMessage, Features};
use sinkplay_room::{ChatEntry, MediaInfo};

/// Server details learned from the handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerInfo {
    /// The name the server gave us.
    pub username: String,
    pub room: String,
    pub version: String,
    pub realversion: String,
    pub motd: String,
    pub features: Features,
}

/// Something presentation may want to react to.
///
/// The room model already reflects every one of these by the time the
/// event is produced; events only say *what* changed.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The handshake completed.
    Welcome(ServerInfo),
    UserJoined {
        name: String,
        room: Option<String>,
    },
    UserLeft {
        name: String,
    },
    UserMoved {
        name: String,
        room: Option<String>,
    },
    FileChanged {
        name: String,
        file: Option<MediaInfo>,
    },
    ReadyChanged {
        name: String,
        ready: bool,
        manually_initiated: bool,
    },
    /// A `List` response was applied.
    UsersListed {
        count: usize,
    },
    Chat(ChatEntry),
    /// The room's shared playback state. Advisory: this client does not
    /// control a player.
    PlayState {
        position: f64,
        paused: bool,
        do_seek: bool,
        set_by: Option<String>,
    },
    PlaylistChanged {
        user: Option<String>,
        files: Vec<String>,
    },
    PlaylistIndexChanged {
        user: Option<String>,
        index: Option<u64>,
    },
    /// The server sent an `Error`. The connection stays open.
    ServerError(String),
}

/// The result of feeding one server message to the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Messages to send, in order.
    pub replies: Vec<ClientMessage>,
    pub events: Vec<SessionEvent>,
}

impl Outcome {
    pub fn is_empty(&self) -> bool {
        self.replies.is_empty() && self.events.is_empty()
    }

    pub(crate) fn reply(&mut self, message: ClientMessage) {
        self.replies.push(message);
    }

    pub(crate) fn event(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}

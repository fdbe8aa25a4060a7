//! Records stored in the room model.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// MediaInfo
// ---------------------------------------------------------------------------

/// A media file as announced by a user. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    pub name: String,
    /// Length in seconds. Never NaN or infinite.
    pub duration_seconds: Option<f64>,
    pub size_bytes: Option<u64>,
}

impl MediaInfo {
    /// Creates a `MediaInfo`, dropping a duration that is not finite.
    pub fn new(
        name: impl Into<String>,
        duration_seconds: Option<f64>,
        size_bytes: Option<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            duration_seconds: duration_seconds.filter(|d| d.is_finite()),
            size_bytes,
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// One participant. Names are unique within a [`RoomModel`](crate::RoomModel).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub name: String,
    pub room: Option<String>,
    pub ready: bool,
    pub file: Option<MediaInfo>,
}

impl User {
    /// A user that just appeared: not ready, nothing loaded.
    pub fn new(name: impl Into<String>, room: Option<String>) -> Self {
        Self {
            name: name.into(),
            room,
            ready: false,
            file: None,
        }
    }

    /// Sets the loaded file.
    pub fn with_file(mut self, file: Option<MediaInfo>) -> Self {
        self.file = file;
        self
    }

    /// Sets the readiness flag.
    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }
}

// ---------------------------------------------------------------------------
// ChatEntry
// ---------------------------------------------------------------------------

/// A chat line, stamped with the local time it was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub message: String,
}

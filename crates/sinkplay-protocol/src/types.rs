//! SyncPlay message types.
//!
//! Every SyncPlay frame is a JSON object with a single top-level key naming
//! the message *kind*:
//!
//! ```text
//! {"Hello": {...}}   {"State": {...}}   {"Set": {...}}
//! {"List": {...}}    {"Chat": ...}      {"Error": {...}}
//! ```
//!
//! Inbound ([`ServerMessage`]) and outbound ([`ClientMessage`]) messages are
//! modelled separately because the two directions do not share shapes: the
//! server's `Chat` is an object, ours is a bare string; the server's `List`
//! is a nested map, ours is `null`.
//!
//! Inbound structs only implement `Deserialize`, and every field that some
//! server in the wild omits carries `#[serde(default)]`. The older, leaner
//! message shapes are therefore just subsets of the richer ones below.

use std::collections::BTreeMap;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::de::{
    lenient_duration, lenient_size, nullable_flag, nullable_index,
    optional_file,
};

/// Protocol version we claim in `Hello.version`. Servers use it for
/// compatibility checks; 1.2.255 is what current clients send.
pub const PROTOCOL_VERSION: &str = "1.2.255";

/// The release we report in `Hello.realversion`.
pub const RELEASE_VERSION: &str = "1.7.0";

// ---------------------------------------------------------------------------
// Shared building blocks
// ---------------------------------------------------------------------------

/// A room reference as it appears on the wire: `{"name": "lobby"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRef {
    pub name: String,
}

impl RoomRef {
    /// Wraps a room name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A feature flag value advertised by a server or peer.
///
/// Servers mix integers (`maxChatMessageLength: 150`), booleans
/// (`chat: true`) and strings (`uiMode: "GUI"`) in the same map.
/// `#[serde(untagged)]` tries the variants top to bottom: integer, then
/// boolean, then string. A value that is none of these (a float, an
/// object) fails the decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Bool(bool),
    String(String),
}

/// A feature map, keyed by feature name.
pub type Features = BTreeMap<String, FeatureValue>;

/// Media file metadata.
///
/// Inbound, `duration` is usually a numeric string and `size` may be
/// missing. Outbound, we always send `duration` as a number and omit
/// fields we do not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,

    #[serde(
        default,
        deserialize_with = "lenient_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<u64>,
}

/// Tracks which side is deliberately ignoring on-the-fly state changes.
///
/// The server bumps `server` when it wants us to disregard in-flight
/// playstate; we echo it back so it knows we saw the bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IgnoringOnTheFly {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<u64>,
}

// ---------------------------------------------------------------------------
// ServerMessage: what the server sends us
// ---------------------------------------------------------------------------

/// A decoded inbound message, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Hello(ServerHello),
    Error(ServerError),
    Chat(ChatMessage),
    Set(SetMessage),
    State(StateMessage),
    /// Room name → (username → entry).
    List(RoomList),
}

impl ServerMessage {
    /// The wire key of this message's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hello(_) => "Hello",
            Self::Error(_) => "Error",
            Self::Chat(_) => "Chat",
            Self::Set(_) => "Set",
            Self::State(_) => "State",
            Self::List(_) => "List",
        }
    }
}

/// The server's handshake reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerHello {
    /// The username the server actually assigned (it may differ from
    /// the one we asked for when the name is taken).
    pub username: String,
    pub room: RoomRef,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub realversion: String,
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub motd: String,
}

/// A server-side error notice, e.g. a wrong password or version mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerError {
    pub message: String,
}

/// A chat line relayed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    pub username: String,
    pub message: String,
}

/// A `Set` message. Any combination of its sections may be present.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMessage {
    #[serde(default)]
    pub playlist_change: Option<PlaylistChange>,
    #[serde(default)]
    pub playlist_index: Option<PlaylistIndex>,
    #[serde(default)]
    pub ready: Option<ReadyUpdate>,
    #[serde(default)]
    pub user: Option<BTreeMap<String, UserUpdate>>,
}

/// A shared playlist replacement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistChange {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

/// A shared playlist cursor move. `index` is `None` when the server sends
/// `null` or a sentinel string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistIndex {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "nullable_index")]
    pub index: Option<u64>,
}

/// A readiness change for one user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyUpdate {
    pub username: String,
    #[serde(default, deserialize_with = "nullable_flag")]
    pub is_ready: bool,
    #[serde(default, deserialize_with = "nullable_flag")]
    pub manually_initiated: bool,
}

/// Per-user delta inside `Set.user`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub room: Option<RoomRef>,
    #[serde(default)]
    pub event: Option<UserEvent>,
    #[serde(default, deserialize_with = "optional_file")]
    pub file: Option<FileInfo>,
}

/// A membership event attached to a user delta.
///
/// On the wire this is an object with a `joined: true` or `left: true`
/// flag (plus, for joins, the peer's version). `#[serde(try_from)]` lets us
/// decode the loose object first and then decide which variant it is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawUserEvent")]
pub enum UserEvent {
    Joined { version: Option<String> },
    Left,
}

#[derive(Deserialize)]
struct RawUserEvent {
    #[serde(default)]
    joined: Option<serde_json::Value>,
    #[serde(default)]
    left: Option<serde_json::Value>,
    #[serde(default)]
    version: Option<String>,
}

impl TryFrom<RawUserEvent> for UserEvent {
    type Error = String;

    fn try_from(raw: RawUserEvent) -> Result<Self, Self::Error> {
        let is_true = |v: &Option<serde_json::Value>| {
            matches!(v, Some(serde_json::Value::Bool(true)))
        };
        if is_true(&raw.joined) {
            Ok(Self::Joined {
                version: raw.version,
            })
        } else if is_true(&raw.left) {
            Ok(Self::Left)
        } else {
            Err("user event has neither joined nor left set".to_string())
        }
    }
}

/// The periodic state broadcast. Every one of these requires a reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMessage {
    pub ping: ServerPing,
    #[serde(default)]
    pub playstate: Option<PlayState>,
    #[serde(default)]
    pub ignoring_on_the_fly: Option<IgnoringOnTheFly>,
}

/// Timing data from the server.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPing {
    /// Server timestamp (seconds) to be echoed back.
    pub latency_calculation: f64,
    /// Our previous `clientLatencyCalculation`, echoed back.
    #[serde(default)]
    pub client_latency_calculation: Option<f64>,
    /// The server's round-trip estimate, in seconds.
    #[serde(default)]
    pub server_rtt: f64,
}

/// The room's shared playback state. Advisory for this client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayState {
    pub position: f64,
    pub paused: bool,
    #[serde(default)]
    pub do_seek: Option<bool>,
    #[serde(default)]
    pub set_by: Option<String>,
}

/// The payload of an inbound `List`: room → username → entry.
pub type RoomList = BTreeMap<String, BTreeMap<String, ListEntry>>;

/// One user's row in a `List` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub controller: bool,
    #[serde(default, deserialize_with = "nullable_flag")]
    pub is_ready: bool,
    /// Servers send `{}` for "no file".
    #[serde(default, deserialize_with = "optional_file")]
    pub file: Option<FileInfo>,
    #[serde(default)]
    pub features: Features,
}

// ---------------------------------------------------------------------------
// ClientMessage: what we send
// ---------------------------------------------------------------------------

/// An outbound message. Encoded by [`crate::Codec::encode`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// `{"Hello": {...}}`, sent once, right after TCP connects.
    Hello(ClientHello),
    /// `{"Chat": "text"}`
    Chat(String),
    /// `{"Set": {"ready": {...}}}`
    SetReady {
        is_ready: bool,
        manually_initiated: bool,
    },
    /// `{"Set": {"file": {...}}}`
    SetFile(FileInfo),
    /// `{"List": null}`
    ListRequest,
    /// `{"State": {...}}`, the keep-alive reply.
    State(ClientState),
}

impl ClientMessage {
    /// The wire key of this message's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hello(_) => "Hello",
            Self::Chat(_) => "Chat",
            Self::SetReady { .. } | Self::SetFile(_) => "Set",
            Self::ListRequest => "List",
            Self::State(_) => "State",
        }
    }
}

/// Our handshake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientHello {
    pub username: String,
    /// Lowercase hex MD5 of the server password. Omitted when the server
    /// has no password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub room: RoomRef,
    pub version: String,
    pub realversion: String,
    pub features: ClientFeatures,
}

impl ClientHello {
    /// Builds our handshake for `username` joining `room`.
    ///
    /// An empty `password` means the server is not password-protected;
    /// otherwise the server expects the MD5 hex digest, never the
    /// plaintext.
    pub fn new(username: &str, room: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password_digest(password),
            room: RoomRef::new(room),
            version: PROTOCOL_VERSION.to_string(),
            realversion: RELEASE_VERSION.to_string(),
            features: ClientFeatures::default(),
        }
    }
}

/// Hashes a server password the way SyncPlay servers compare it.
///
/// Returns `None` for an empty password so the field is left off the wire.
pub fn password_digest(password: &str) -> Option<String> {
    if password.is_empty() {
        return None;
    }
    let digest = Md5::digest(password.as_bytes());
    Some(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// The capabilities we advertise in our `Hello`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFeatures {
    pub shared_playlists: bool,
    pub chat: bool,
    pub ui_mode: String,
    pub feature_list: bool,
    pub readiness: bool,
    pub managed_rooms: bool,
    pub persistent_rooms: bool,
}

/// The fixed feature set this client advertises.
impl Default for ClientFeatures {
    fn default() -> Self {
        Self {
            shared_playlists: false,
            chat: true,
            ui_mode: "GUI".to_string(),
            feature_list: true,
            readiness: true,
            managed_rooms: false,
            persistent_rooms: false,
        }
    }
}

/// Our `State` reply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientState {
    pub ping: ClientPing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignoring_on_the_fly: Option<IgnoringOnTheFly>,
}

/// The ping block of our `State` reply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPing {
    /// The server's `latencyCalculation`, echoed verbatim.
    pub latency_calculation: f64,
    /// Local clock minus the server's `latencyCalculation`: a one-way
    /// clock offset estimate, not a round trip.
    pub client_latency_calculation: f64,
    pub client_rtt: f64,
}

//! The session state machine.
//!
//! ```text
//!                begin_connect         on_transport_connected      server Hello
//! Disconnected ───────────────→ Connecting ──────────────────→ Handshaking ─────────→ Active
//!      ↑                            │                                 │                  │
//!      └────── connect_failed ──────┘                                 │                  │
//!      └──────────────────────── on_disconnected ─────────────────────┴──────────────────┘
//! ```
//!
//! The session never touches a socket. Its driver feeds it decoded server
//! messages and local intents, and writes out whatever it returns.

use std::collections::BTreeMap;
use std::fmt;

use sinkplay_protocol::{
    ChatMessage, ClientHello, ClientMessage, ClientPing, ClientState, FileInfo,
    IgnoringOnTheFly, RoomList, ServerHello, ServerMessage, SetMessage,
    StateMessage, UserEvent, UserUpdate, decode_server_message,
};
use sinkplay_room::{ChatEntry, MediaInfo, RoomModel, RoomSnapshot, User};

use crate::{
    Clock, Outcome, ServerInfo, SessionConfig, SessionError, SessionEvent,
    SystemClock, unix_seconds,
};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    /// TCP connect in progress.
    Connecting,
    /// Our `Hello` is out; waiting for the server's.
    Handshaking,
    /// Handshake done. Local intents are accepted.
    Active,
}

impl SessionState {
    /// `true` while a socket is open (handshaking or active).
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Handshaking | Self::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Handshaking => write!(f, "Handshaking"),
            Self::Active => write!(f, "Active"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One client's view of one SyncPlay connection.
///
/// Owns the [`RoomModel`]. Generic over the [`Clock`] so tests can pin
/// the time used for keep-alive replies and chat timestamps.
#[derive(Debug)]
pub struct Session<C: Clock = SystemClock> {
    config: SessionConfig,
    state: SessionState,
    room: RoomModel,
    server: Option<ServerInfo>,
    clock: C,
}

impl Session<SystemClock> {
    /// Creates a disconnected session using the system clock.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Session<C> {
    /// Creates a disconnected session using `clock`.
    pub fn with_clock(config: SessionConfig, clock: C) -> Self {
        Self {
            config,
            state: SessionState::Disconnected,
            room: RoomModel::new(),
            server: None,
            clock,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// What the server told us in its `Hello`. `None` until then.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server.as_ref()
    }

    pub fn room(&self) -> &RoomModel {
        &self.room
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        self.room.snapshot()
    }

    // -- Lifecycle ----------------------------------------------------------

    /// `Disconnected → Connecting`.
    pub fn begin_connect(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Disconnected, SessionState::Connecting, "begin connecting")
    }

    /// `Connecting → Disconnected`.
    pub fn connect_failed(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Connecting, SessionState::Disconnected, "fail a connect")
    }

    /// `Connecting → Handshaking`. Returns the `Hello` to send.
    pub fn on_transport_connected(&mut self) -> Result<ClientMessage, SessionError> {
        self.transition(SessionState::Connecting, SessionState::Handshaking, "start a handshake")?;
        self.room.set_local_name(self.config.nick.as_str());
        Ok(ClientMessage::Hello(ClientHello::new(
            &self.config.nick,
            &self.config.room,
            &self.config.password,
        )))
    }

    /// The connection ended, for whatever reason. Forgets the room.
    pub fn on_disconnected(&mut self) {
        if self.state != SessionState::Disconnected {
            tracing::info!(from = %self.state, "session disconnected");
        }
        self.state = SessionState::Disconnected;
        self.server = None;
        self.room.clear();
    }

    fn transition(
        &mut self,
        from: SessionState,
        to: SessionState,
        action: &'static str,
    ) -> Result<(), SessionError> {
        if self.state != from {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                action,
            });
        }
        tracing::debug!(%from, %to, "session transition");
        self.state = to;
        Ok(())
    }

    // -- Inbound ------------------------------------------------------------

    /// Decodes and handles one raw frame.
    ///
    /// # Errors
    /// [`SessionError::Protocol`] if the frame does not decode. The session
    /// is unchanged in that case.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<Outcome, SessionError> {
        let message = decode_server_message(frame)?;
        Ok(self.handle(message))
    }

    /// Applies one server message.
    pub fn handle(&mut self, message: ServerMessage) -> Outcome {
        let mut out = Outcome::default();
        if !self.state.is_connected() {
            tracing::debug!(kind = message.kind(), state = %self.state, "message while not connected, ignoring");
            return out;
        }

        match message {
            ServerMessage::Hello(hello) => self.on_hello(hello, &mut out),
            ServerMessage::State(state) => self.on_state(state, &mut out),
            ServerMessage::Error(error) => {
                tracing::warn!(message = %error.message, "server error");
                out.event(SessionEvent::ServerError(error.message));
            }
            other if self.state != SessionState::Active => {
                tracing::debug!(kind = other.kind(), "room update before handshake, ignoring");
            }
            ServerMessage::Set(set) => self.on_set(set, &mut out),
            ServerMessage::List(list) => self.on_list(list, &mut out),
            ServerMessage::Chat(chat) => self.on_chat(chat, &mut out),
        }
        out
    }

    fn on_hello(&mut self, hello: ServerHello, out: &mut Outcome) {
        if self.state != SessionState::Handshaking {
            tracing::debug!(state = %self.state, "unexpected Hello, ignoring");
            return;
        }

        let info = ServerInfo {
            username: hello.username,
            room: hello.room.name,
            version: hello.version,
            realversion: hello.realversion,
            motd: hello.motd,
            features: hello.features,
        };
        tracing::info!(
            username = %info.username,
            room = %info.room,
            server_version = %info.realversion,
            "handshake complete"
        );

        self.room.set_local_name(info.username.as_str());
        self.room.set_self_ready(false);
        self.state = SessionState::Active;
        self.server = Some(info.clone());

        out.reply(ClientMessage::SetReady {
            is_ready: false,
            manually_initiated: false,
        });
        out.reply(ClientMessage::ListRequest);
        out.event(SessionEvent::Welcome(info));
    }

    fn on_state(&mut self, state: StateMessage, out: &mut Outcome) {
        let now = unix_seconds(self.clock.now());
        let ping = state.ping;
        tracing::trace!(latency_calculation = ping.latency_calculation, now, "keep-alive");

        out.reply(ClientMessage::State(ClientState {
            ping: ClientPing {
                latency_calculation: ping.latency_calculation,
                client_latency_calculation: now - ping.latency_calculation,
                client_rtt: ping.server_rtt,
            },
            ignoring_on_the_fly: state
                .ignoring_on_the_fly
                .and_then(|i| i.server)
                .map(|server| IgnoringOnTheFly {
                    server: Some(server),
                    client: None,
                }),
        }));

        if let Some(play) = state.playstate {
            out.event(SessionEvent::PlayState {
                position: play.position,
                paused: play.paused,
                do_seek: play.do_seek.unwrap_or(false),
                set_by: play.set_by,
            });
        }
    }

    fn on_set(&mut self, set: SetMessage, out: &mut Outcome) {
        if let Some(users) = set.user {
            self.on_user_updates(users, out);
        }

        if let Some(ready) = set.ready {
            self.room.set_ready(&ready.username, ready.is_ready);
            out.event(SessionEvent::ReadyChanged {
                name: ready.username,
                ready: ready.is_ready,
                manually_initiated: ready.manually_initiated,
            });
        }

        if let Some(change) = set.playlist_change {
            self.room.set_playlist(change.files.clone());
            out.event(SessionEvent::PlaylistChanged {
                user: change.user,
                files: change.files,
            });
        }

        if let Some(index) = set.playlist_index {
            self.room.set_playlist_index(index.index);
            out.event(SessionEvent::PlaylistIndexChanged {
                user: index.user,
                index: index.index,
            });
        }
    }

    fn on_user_updates(&mut self, users: BTreeMap<String, UserUpdate>, out: &mut Outcome) {
        for (name, update) in users {
            let room = update.room.map(|r| r.name);
            let file = update.file.map(media_from_wire);

            match update.event {
                Some(UserEvent::Joined { version }) => {
                    tracing::debug!(%name, ?room, ?version, "user joined");
                    self.room
                        .upsert_user(User::new(name.as_str(), room.clone()).with_file(file));
                    out.event(SessionEvent::UserJoined { name, room });
                }
                Some(UserEvent::Left) => {
                    if self.room.remove_user(&name).is_some() {
                        tracing::debug!(%name, "user left");
                        out.event(SessionEvent::UserLeft { name });
                    }
                }
                None => {
                    if room.is_some() && self.room.set_room(&name, room.clone()) {
                        out.event(SessionEvent::UserMoved {
                            name: name.clone(),
                            room,
                        });
                    }
                    if file.is_some() && self.room.set_file(&name, file.clone()) {
                        out.event(SessionEvent::FileChanged { name, file });
                    }
                }
            }
        }
    }

    fn on_list(&mut self, list: RoomList, out: &mut Outcome) {
        let mut count = 0;
        for (room, entries) in list {
            for (name, entry) in entries {
                if name == self.room.local_name() {
                    self.room.set_self_ready(entry.is_ready);
                }
                self.room.upsert_user(
                    User::new(name, Some(room.clone()))
                        .with_ready(entry.is_ready)
                        .with_file(entry.file.map(media_from_wire)),
                );
                count += 1;
            }
        }
        tracing::debug!(count, "user list applied");
        out.event(SessionEvent::UsersListed { count });
    }

    fn on_chat(&mut self, chat: ChatMessage, out: &mut Outcome) {
        let entry = ChatEntry {
            timestamp: self.clock.now(),
            username: chat.username,
            message: chat.message,
        };
        self.room.append_chat(entry.clone());
        out.event(SessionEvent::Chat(entry));
    }

    // -- Local intents ------------------------------------------------------

    /// Returns the `Chat` to send. Our own line shows up in the room once
    /// the server echoes it.
    pub fn send_chat(&mut self, text: &str) -> Result<ClientMessage, SessionError> {
        self.require_active()?;
        Ok(ClientMessage::Chat(text.to_string()))
    }

    /// Sets our readiness and returns the `Set.ready` to send.
    pub fn set_ready(&mut self, ready: bool) -> Result<ClientMessage, SessionError> {
        self.require_active()?;
        self.room.set_self_ready(ready);
        Ok(ClientMessage::SetReady {
            is_ready: ready,
            manually_initiated: true,
        })
    }

    /// Flips our readiness.
    pub fn toggle_ready(&mut self) -> Result<ClientMessage, SessionError> {
        let ready = !self.room.self_ready();
        self.set_ready(ready)
    }

    /// Records a newly opened local file and returns the `Set.file` that
    /// announces it.
    pub fn load_file(&mut self, file: MediaInfo) -> Result<ClientMessage, SessionError> {
        self.require_active()?;
        let wire = FileInfo {
            name: file.name.clone(),
            duration: file.duration_seconds,
            size: file.size_bytes,
        };
        self.room.set_local_file(Some(file));
        Ok(ClientMessage::SetFile(wire))
    }

    /// Records the local playback position. Accepted in any state; nothing
    /// is sent.
    pub fn report_position(&mut self, seconds: f64) {
        self.room.set_position(seconds);
    }

    fn require_active(&self) -> Result<(), SessionError> {
        if self.state == SessionState::Active {
            Ok(())
        } else {
            Err(SessionError::NotActive(self.state))
        }
    }
}

fn media_from_wire(file: FileInfo) -> MediaInfo {
    MediaInfo::new(file.name, file.duration, file.size)
}

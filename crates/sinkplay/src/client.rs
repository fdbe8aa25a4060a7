//! `SyncplayClient` and its builder.
//!
//! This is the entry point for joining a SyncPlay room. It ties together
//! all the layers: transport → protocol → session → room.

use std::sync::Arc;

use sinkplay_protocol::{Codec, JsonLineCodec};
use sinkplay_room::{MediaInfo, RoomSnapshot};
use sinkplay_session::{
    Clock, Session, SessionConfig, SessionEvent, SessionState, SystemClock,
};
use sinkplay_transport::{
    Connection, Connector, DEFAULT_MAX_FRAME_LEN, TcpConnector,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::driver::Driver;
use crate::{ErrorReporter, SinkplayError, TracingReporter};

/// A local intent, queued for the connection task.
#[derive(Debug)]
pub(crate) enum Command {
    Chat(String),
    SetReady(bool),
    ToggleReady,
    LoadFile(MediaInfo),
    ReportPosition(f64),
}

/// How many undelivered events are kept for [`SyncplayClient::take_events`].
/// Once the queue is full, newer events are dropped until it is drained.
pub const EVENT_BUFFER: usize = 256;

/// Notifications delivered through [`SyncplayClient::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Something changed in the room or on the server.
    Session(SessionEvent),
    /// The connection task has stopped. Always the last event, even when
    /// the queue overflowed.
    Disconnected,
}

// ---------------------------------------------------------------------------
// ClientBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and connecting a [`SyncplayClient`].
///
/// # Example
///
/// ```rust,no_run
/// use sinkplay::prelude::*;
///
/// # async fn demo() -> Result<(), SinkplayError> {
/// let client = SyncplayClient::builder(
///     SessionConfig::new("127.0.0.1", "alice", "lobby").with_port(8999),
/// )
/// .reporter(|error: SinkplayError| eprintln!("{error}"))
/// .connect()
/// .await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: SessionConfig,
    reporter: Arc<dyn ErrorReporter>,
    clock: Arc<dyn Clock>,
    max_frame_len: usize,
}

impl ClientBuilder {
    /// Creates a builder that reports through [`TracingReporter`] and uses
    /// the system clock.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            reporter: Arc::new(TracingReporter),
            clock: Arc::new(SystemClock),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Sets where runtime errors are delivered.
    pub fn reporter(mut self, reporter: impl ErrorReporter) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Sets the clock used for keep-alive replies and chat timestamps.
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Caps how large one inbound line may grow. Applies to
    /// [`connect`](Self::connect); a custom connector sets its own limit.
    pub fn max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Connects over TCP.
    pub async fn connect(self) -> Result<SyncplayClient, SinkplayError> {
        let connector = TcpConnector::new().max_frame_len(self.max_frame_len);
        self.connect_with(connector).await
    }

    /// Connects through `connector`, sends `Hello`, and starts the
    /// connection task.
    ///
    /// # Errors
    /// - [`SinkplayError::Validation`] if server, nick or room is blank.
    ///   Nothing is dialled.
    /// - [`SinkplayError::Transport`] if the connection cannot be opened
    ///   or the `Hello` cannot be written.
    ///
    /// These are returned, not reported.
    pub async fn connect_with<K: Connector>(
        self,
        connector: K,
    ) -> Result<SyncplayClient, SinkplayError> {
        self.config.validate()?;

        let mut session = Session::with_clock(self.config, self.clock);
        session.begin_connect()?;
        let addr = session.config().addr();
        tracing::info!(%addr, nick = %session.config().nick, room = %session.config().room, "connecting");

        let conn = match connector.connect(&addr).await {
            Ok(conn) => conn,
            Err(e) => {
                session.connect_failed()?;
                return Err(e.into());
            }
        };
        let conn_id = conn.id();

        let codec = JsonLineCodec;
        let hello = session.on_transport_connected()?;
        let sent = match codec.encode(&hello) {
            Ok(bytes) => conn.send(&bytes).await.map_err(SinkplayError::from),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = sent {
            session.on_disconnected();
            let _ = conn.close().await;
            return Err(e);
        }
        tracing::debug!(%conn_id, "hello sent");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let (snapshot_tx, snapshot_rx) =
            watch::channel(Arc::new(session.snapshot()));
        let (state_tx, state_rx) = watch::channel(session.state());

        let driver = Driver::new(
            session,
            codec,
            self.reporter,
            cancel.clone(),
            snapshot_tx,
            state_tx,
            event_tx,
        );
        let task = tokio::spawn(driver.run(conn, command_rx));

        Ok(SyncplayClient {
            commands: command_tx,
            snapshot: snapshot_rx,
            state: state_rx,
            events: Some(event_rx),
            cancel,
            task: Some(task),
        })
    }
}

// ---------------------------------------------------------------------------
// SyncplayClient
// ---------------------------------------------------------------------------

/// A live connection to one SyncPlay room.
///
/// All room state lives in a background task. This handle posts intents to
/// it and reads the snapshots it publishes; none of its methods wait on
/// the network except [`disconnect`](Self::disconnect).
///
/// Dropping the handle stops the task as well, without waiting for it.
pub struct SyncplayClient {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<Arc<RoomSnapshot>>,
    state: watch::Receiver<SessionState>,
    events: Option<mpsc::Receiver<ClientEvent>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SyncplayClient {
    /// Starts configuring a connection.
    pub fn builder(config: SessionConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// The latest room snapshot.
    pub fn snapshot(&self) -> Arc<RoomSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// A receiver that is notified whenever the room changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RoomSnapshot>> {
        self.snapshot.clone()
    }

    /// The current connection state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// A receiver that is notified on every state change.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Takes the event stream. Only the first call returns `Some`.
    ///
    /// Up to [`EVENT_BUFFER`] events wait here until it is taken and
    /// drained; the rest are dropped. [`snapshot`](Self::snapshot) is
    /// always current regardless.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<ClientEvent>> {
        self.events.take()
    }

    /// `true` from the handshake until the session is torn down.
    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected()
    }

    pub fn send_chat(&self, text: impl Into<String>) -> Result<(), SinkplayError> {
        self.post(Command::Chat(text.into()))
    }

    pub fn set_ready(&self, ready: bool) -> Result<(), SinkplayError> {
        self.post(Command::SetReady(ready))
    }

    pub fn toggle_ready(&self) -> Result<(), SinkplayError> {
        self.post(Command::ToggleReady)
    }

    /// Announces a newly opened local file to the room.
    pub fn load_file(&self, file: MediaInfo) -> Result<(), SinkplayError> {
        self.post(Command::LoadFile(file))
    }

    /// Records the local playback position, in seconds.
    pub fn report_position(&self, seconds: f64) -> Result<(), SinkplayError> {
        self.post(Command::ReportPosition(seconds))
    }

    /// Stops the connection task and waits for it to finish.
    ///
    /// On return the socket is closed, the snapshot is empty and the state
    /// is [`SessionState::Disconnected`]. A write stuck on a peer that is
    /// not reading is abandoned. Calling this again is a no-op.
    pub async fn disconnect(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "connection task ended abnormally");
            }
        }
    }

    fn post(&self, command: Command) -> Result<(), SinkplayError> {
        self.commands
            .send(command)
            .map_err(|_| SinkplayError::NotConnected)
    }
}

impl Drop for SyncplayClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

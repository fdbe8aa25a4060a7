//! The connection task.
//!
//! One task per connection owns the socket, the [`Session`] and through it
//! the room model. Everything else talks to it over channels:
//!
//! ```text
//!   SyncplayClient ──commands──→ ┐
//!   cancel token ──────────────→ ├─ select! ──→ Session ──→ replies → socket
//!   socket frames ─────────────→ ┘                 │
//!                                                  ├──→ watch: snapshot, state
//!                                                  └──→ mpsc: events
//! ```
//!
//! Every write also races the cancel token, so a peer that stops reading
//! cannot hold up `disconnect()`.

use std::sync::Arc;

use sinkplay_protocol::{ClientMessage, Codec, JsonLineCodec};
use sinkplay_room::RoomSnapshot;
use sinkplay_session::{Clock, Session, SessionEvent, SessionState};
use sinkplay_transport::{Connection, TransportError};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::client::{ClientEvent, Command};
use crate::{ErrorReporter, SinkplayError};

/// Why the loop ended.
enum Exit {
    /// `disconnect()` was called or the handle was dropped, possibly in
    /// the middle of a write.
    Requested,
    Failed(TransportError),
}

pub(crate) struct Driver<C: Clock> {
    session: Session<C>,
    codec: JsonLineCodec,
    reporter: Arc<dyn ErrorReporter>,
    cancel: CancellationToken,
    snapshot: watch::Sender<Arc<RoomSnapshot>>,
    state: watch::Sender<SessionState>,
    events: mpsc::Sender<ClientEvent>,
    /// Slot held back for the final `Disconnected`, so a full queue
    /// cannot swallow it.
    last_event: Option<mpsc::OwnedPermit<ClientEvent>>,
}

impl<C: Clock> Driver<C> {
    pub(crate) fn new(
        session: Session<C>,
        codec: JsonLineCodec,
        reporter: Arc<dyn ErrorReporter>,
        cancel: CancellationToken,
        snapshot: watch::Sender<Arc<RoomSnapshot>>,
        state: watch::Sender<SessionState>,
        events: mpsc::Sender<ClientEvent>,
    ) -> Self {
        let last_event = events.clone().try_reserve_owned().ok();
        Self {
            session,
            codec,
            reporter,
            cancel,
            snapshot,
            state,
            events,
            last_event,
        }
    }

    /// Runs until cancelled or until the connection fails.
    pub(crate) async fn run<K: Connection>(
        mut self,
        conn: K,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        let conn_id = conn.id();
        tracing::debug!(%conn_id, "connection task started");

        let cancel = self.cancel.clone();
        let exit = loop {
            let step = tokio::select! {
                biased;

                // Fires on `disconnect()` and when the handle is dropped.
                _ = cancel.cancelled() => Err(Exit::Requested),

                Some(command) = commands.recv() => {
                    self.on_command(&conn, command).await
                }

                frame = conn.recv() => match frame {
                    Ok(Some(frame)) => self.on_frame(&conn, &frame).await,
                    Ok(None) => Err(Exit::Failed(TransportError::ConnectionClosed(
                        "server closed the connection".to_string(),
                    ))),
                    Err(e) => Err(Exit::Failed(e)),
                },
            };
            if let Err(exit) = step {
                break exit;
            }
        };

        match exit {
            Exit::Requested => tracing::info!(%conn_id, "disconnecting"),
            Exit::Failed(e) => {
                tracing::warn!(%conn_id, error = %e, "connection lost");
                self.reporter.report_error(e.into());
            }
        }

        if let Err(e) = conn.close().await {
            tracing::debug!(%conn_id, error = %e, "close failed");
        }
        self.session.on_disconnected();
        self.publish();
        match self.last_event.take() {
            Some(permit) => {
                permit.send(ClientEvent::Disconnected);
            }
            None => self.emit(ClientEvent::Disconnected),
        }
    }

    /// Handles one inbound frame. Only a reason to stop is returned;
    /// everything else is logged or reported and the loop continues.
    async fn on_frame<K: Connection>(
        &mut self,
        conn: &K,
        frame: &[u8],
    ) -> Result<(), Exit> {
        if frame.iter().all(u8::is_ascii_whitespace) {
            tracing::trace!("skipping blank frame");
            return Ok(());
        }

        let message = match self.codec.decode(frame) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    frame = %String::from_utf8_lossy(frame),
                    "dropping undecodable frame"
                );
                return Ok(());
            }
        };
        tracing::trace!(kind = message.kind(), "received");

        let outcome = self.session.handle(message);
        for reply in &outcome.replies {
            self.send(conn, reply).await?;
        }
        for event in outcome.events {
            if let SessionEvent::ServerError(message) = &event {
                self.reporter
                    .report_error(SinkplayError::Server(message.clone()));
            }
            self.emit(ClientEvent::Session(event));
        }
        self.publish();
        Ok(())
    }

    async fn on_command<K: Connection>(
        &mut self,
        conn: &K,
        command: Command,
    ) -> Result<(), Exit> {
        let result = match command {
            Command::Chat(text) => self.session.send_chat(&text),
            Command::SetReady(ready) => self.session.set_ready(ready),
            Command::ToggleReady => self.session.toggle_ready(),
            Command::LoadFile(file) => self.session.load_file(file),
            Command::ReportPosition(seconds) => {
                self.session.report_position(seconds);
                self.publish();
                return Ok(());
            }
        };

        match result {
            Ok(message) => {
                self.send(conn, &message).await?;
                self.publish();
            }
            Err(e) => self.reporter.report_error(e.into()),
        }
        Ok(())
    }

    async fn send<K: Connection>(
        &self,
        conn: &K,
        message: &ClientMessage,
    ) -> Result<(), Exit> {
        let bytes = match self.codec.encode(message) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.reporter.report_error(e.into());
                return Ok(());
            }
        };
        tracing::trace!(kind = message.kind(), len = bytes.len(), "sending");
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Exit::Requested),
            sent = conn.send(&bytes) => sent.map_err(Exit::Failed),
        }
    }

    /// Queues an event without waiting. When nobody drains the queue the
    /// newest events are dropped; snapshots stay authoritative.
    fn emit(&self, event: ClientEvent) {
        if let Err(TrySendError::Full(event)) = self.events.try_send(event) {
            tracing::trace!(?event, "event queue full, dropping event");
        }
    }

    /// Pushes the current snapshot and state to watchers, if they changed.
    fn publish(&self) {
        let snapshot = self.session.snapshot();
        self.snapshot.send_if_modified(|current| {
            if **current == snapshot {
                false
            } else {
                *current = Arc::new(snapshot);
                true
            }
        });

        let state = self.session.state();
        self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

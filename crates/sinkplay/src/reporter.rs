//! Where runtime errors go.
//!
//! Errors that happen inside the connection task (a dropped socket, a
//! server `Error` message, an intent sent too early) have no caller to
//! return to. They are handed to an [`ErrorReporter`] instead, exactly
//! once each.

use crate::SinkplayError;

/// Receives errors raised inside the connection task.
///
/// Any `Fn(SinkplayError)` closure is a reporter:
///
/// ```rust
/// use sinkplay::{ErrorReporter, SinkplayError};
///
/// let reporter = |error: SinkplayError| eprintln!("sinkplay: {error}");
/// reporter.report_error(SinkplayError::NotConnected);
/// ```
pub trait ErrorReporter: Send + Sync + 'static {
    fn report_error(&self, error: SinkplayError);
}

impl<F> ErrorReporter for F
where
    F: Fn(SinkplayError) + Send + Sync + 'static,
{
    fn report_error(&self, error: SinkplayError) {
        self(error)
    }
}

/// Logs errors through `tracing`. The default reporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report_error(&self, error: SinkplayError) {
        if error.is_fatal() {
            tracing::error!(%error, "connection lost");
        } else {
            tracing::warn!(%error, "client error");
        }
    }
}

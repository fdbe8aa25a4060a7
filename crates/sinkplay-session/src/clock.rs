//! Wall-clock access.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// A source of the current time.
///
/// SyncPlay's keep-alive arithmetic compares our clock with the server's,
/// so this is wall-clock time (not a monotonic instant).
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1e9
}

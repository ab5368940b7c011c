//! Connection pool event and error logging.

use diesel::r2d2::event::{AcquireEvent, CheckinEvent, CheckoutEvent, ReleaseEvent, TimeoutEvent};
use diesel::r2d2::{self, HandleError, HandleEvent};
use tracing::{debug, error, info, warn};

/// Logs connection lifecycle events emitted by the pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolEventLogger;

impl HandleEvent for PoolEventLogger {
    fn handle_acquire(&self, event: AcquireEvent) {
        info!(connection_id = event.connection_id(), "new connection opened for the pool");
    }

    fn handle_release(&self, event: ReleaseEvent) {
        info!(
            connection_id = event.connection_id(),
            age_ms = u64::try_from(event.age().as_millis()).unwrap_or(u64::MAX),
            "connection removed from the pool"
        );
    }

    fn handle_checkout(&self, event: CheckoutEvent) {
        debug!(
            connection_id = event.connection_id(),
            wait_ms = u64::try_from(event.duration().as_millis()).unwrap_or(u64::MAX),
            "connection checked out"
        );
    }

    fn handle_timeout(&self, event: TimeoutEvent) {
        warn!(
            timeout_ms = u64::try_from(event.timeout().as_millis()).unwrap_or(u64::MAX),
            "timed out waiting for a pooled connection"
        );
    }

    fn handle_checkin(&self, event: CheckinEvent) {
        debug!(
            connection_id = event.connection_id(),
            held_ms = u64::try_from(event.duration().as_millis()).unwrap_or(u64::MAX),
            "connection returned to the pool"
        );
    }
}

/// Logs errors raised while the pool opens or validates connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolErrorLogger;

impl HandleError<r2d2::Error> for PoolErrorLogger {
    fn handle_error(&self, err: r2d2::Error) {
        error!(error = %err, "unexpected error on pooled connection");
    }
}

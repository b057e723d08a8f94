// ── Dependent alert signaling ──
//
// Audible/visual alerting lives outside this crate. The monitor only needs
// to silence it when monitoring stops.

use tracing::info;

/// A subsystem whose alerts must end when monitoring ends.
pub trait AlertSignal: Send + Sync {
    /// Cancel every active alert. Called unconditionally on `stop()`.
    fn stop_all_alerts(&self);
}

/// An [`AlertSignal`] that only records the cancellation in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingAlertSignal;

impl AlertSignal for LoggingAlertSignal {
    fn stop_all_alerts(&self) {
        info!("stopping all alerts");
    }
}

//! Device telemetry reconciliation for firetap smoke-detector dashboards.
//!
//! Raw device pushes arrive in several firmware generations' shapes. This
//! crate turns them into one canonical [`Reading`], decides its safety
//! [`ReadingStatus`], and keeps a bounded, deduplicated, persisted
//! [`Timeline`] per device:
//!
//! - **[`DeviceMonitor`]**: the subscription coordinator.
//!   [`start()`](DeviceMonitor::start) loads the persisted timeline and
//!   opens the current-state, readings-archive, and alert-feed
//!   subscriptions; [`stop()`](DeviceMonitor::stop) tears them down and
//!   silences dependent alerts.
//!
//! - **[`DeviceStore`]**: reactive state built on `tokio::sync::watch`:
//!   latest reading, timeline, alert cards, phase, last update. Consumers
//!   read snapshots or await changes through a [`StateStream`].
//!
//! - **Reconciliation**: [`convert`] (schema normalizer), [`classify`]
//!   (status priority table), [`history`] (merge-dedup and change
//!   detection), [`persist`] (durable bounded history).

pub mod alerts;
pub mod classify;
pub mod config;
pub mod convert;
pub mod error;
pub mod history;
pub mod model;
pub mod monitor;
pub mod persist;
pub mod reconcile;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use alerts::{AlertSignal, LoggingAlertSignal};
pub use classify::classify;
pub use config::MonitorConfig;
pub use error::CoreError;
pub use history::{ChangeDetector, ChangeSummary, LiveBuffer, merge};
pub use monitor::DeviceMonitor;
pub use persist::{
    FileKeyValueStore, HistoryStore, KeyValueStore, MemoryKeyValueStore, StorageError,
};
pub use reconcile::{DeviceContext, Feed};
pub use store::{AlertCards, DeviceStore, MonitorPhase};
pub use stream::{StateStream, StateWatchStream};

pub use model::{ButtonEvent, DeviceId, GasStatus, Reading, ReadingId, ReadingStatus, Timeline};

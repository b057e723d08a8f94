// ── Per-device reconciliation ──
//
// The synchronous half of a monitor. Owns the archive slice, the live
// buffer, and the committed change summary; applies one push at a time
// and republishes only the slice of `DeviceStore` that push owns.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use firetap_api::{Error as TransportError, Push, Snapshot};
use serde_json::Value;
use strum::Display;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::convert::{normalize_alert_feed, normalize_archive, normalize_current};
use crate::history::{ChangeDetector, ChangeSummary, LiveBuffer, merge};
use crate::model::{DeviceId, Reading};
use crate::persist::HistoryStore;
use crate::store::{DeviceStore, MonitorPhase};

/// Which subscription a push came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Feed {
    /// `devices/{id}`
    Current,
    /// `devices/{id}/readings`
    Archive,
    /// `devices/{id}/statusHistory`, newest few by timestamp.
    Alerts,
}

/// Runtime state for one monitored device.
pub struct DeviceContext {
    device: DeviceId,
    store: Arc<DeviceStore>,
    history: HistoryStore,
    detector: ChangeDetector,
    history_limit: usize,
    alert_card_limit: usize,
    archive: Vec<Arc<Reading>>,
    live: LiveBuffer,
    committed: Option<ChangeSummary>,
}

impl DeviceContext {
    /// Create the context, seed it from persisted history, and publish
    /// the `Loading` phase.
    pub fn open(
        device: DeviceId,
        config: &MonitorConfig,
        history: HistoryStore,
        store: Arc<DeviceStore>,
    ) -> Self {
        let persisted = history.load(&device);
        let live = LiveBuffer::seeded(config.history_limit, persisted.iter().cloned());

        store.reset();
        store.set_timeline(persisted);
        store.set_phase(MonitorPhase::Loading);
        info!(device_id = %device, restored = live.len(), "device context opened");

        Self {
            device,
            store,
            history,
            detector: ChangeDetector::new(config.temperature_threshold),
            history_limit: config.history_limit,
            alert_card_limit: config.alert_card_limit,
            archive: Vec::new(),
            live,
            committed: None,
        }
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.store
    }

    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    /// Apply one push from `feed`.
    pub fn apply(&mut self, feed: Feed, push: Push, now: DateTime<Utc>) {
        match push {
            Ok(snapshot) => match feed {
                Feed::Current => self.on_current(&snapshot, now),
                Feed::Archive => self.on_archive(&snapshot, now),
                Feed::Alerts => self.on_alerts(&snapshot, now),
            },
            Err(error) => self.on_error(feed, &error),
        }
        self.store.mark_applied();
    }

    // ── Current state ───────────────────────────────────────────────

    pub fn on_current(&mut self, snapshot: &Snapshot, now: DateTime<Utc>) {
        let Some(raw) = snapshot.value() else {
            self.enter_no_data("device node absent");
            self.store.set_latest(None);
            self.store.set_timeline(Default::default());
            return;
        };

        let reading = Arc::new(normalize_current(raw, now));
        debug!(
            device_id = %self.device,
            status = %reading.status,
            timestamp = %reading.timestamp,
            "current state"
        );

        if let Some(next) = self.detector.detect(self.committed.as_ref(), &reading) {
            self.committed = Some(next);
            self.live.push(Arc::clone(&reading));
            debug!(device_id = %self.device, buffered = self.live.len(), "recorded transition");
        }

        if let Some(embedded) = raw.get("readings").filter(|v| v.is_object()) {
            self.archive = normalize_archive(embedded, now);
        }

        self.store.set_latest(Some(reading));
        if self.store.set_phase(MonitorPhase::Live) {
            info!(device_id = %self.device, "device live");
        }
        self.store.touch(now);
        self.rebuild();
    }

    // ── Readings archive ────────────────────────────────────────────

    pub fn on_archive(&mut self, snapshot: &Snapshot, now: DateTime<Utc>) {
        let Some(raw) = snapshot.value() else {
            debug!(device_id = %self.device, "readings archive empty");
            return;
        };

        self.archive = normalize_archive(raw, now);
        debug!(device_id = %self.device, entries = self.archive.len(), "readings archive");
        self.rebuild();
    }

    // ── Alert feed ──────────────────────────────────────────────────

    pub fn on_alerts(&mut self, snapshot: &Snapshot, now: DateTime<Utc>) {
        let cards = snapshot
            .value()
            .map(|raw: &Value| normalize_alert_feed(raw, self.alert_card_limit, now))
            .unwrap_or_default();
        debug!(device_id = %self.device, cards = cards.len(), "alert feed");
        self.store.set_alert_cards(cards);
    }

    // ── Transport errors ────────────────────────────────────────────

    /// Transport errors never propagate. Losing the current-state feed
    /// means the device is unobservable; the other feeds only degrade.
    pub fn on_error(&mut self, feed: Feed, error: &TransportError) {
        warn!(device_id = %self.device, %feed, %error, "subscription error");
        if feed == Feed::Current {
            self.enter_no_data("current-state subscription failed");
        }
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn enter_no_data(&self, reason: &str) {
        if self.store.set_phase(MonitorPhase::NoData) {
            info!(device_id = %self.device, reason, "device has no data");
        }
    }

    /// Merge archive and live readings, publish, and persist.
    fn rebuild(&self) {
        let timeline = merge(&self.archive, &self.live, self.history_limit);
        self.history.save(&self.device, &timeline);
        self.store.set_timeline(timeline);
    }
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("device", &self.device)
            .field("archive", &self.archive.len())
            .field("live", &self.live.len())
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

// ── Reactive device state ──
//
// Each slice of state lives in its own `watch` channel so consumers only
// wake for the slice they care about. Writes come from one place, the
// monitor's event loop; readers are lock-free.

mod phase;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

pub use phase::MonitorPhase;

use crate::model::{Reading, Timeline};
use crate::stream::StateStream;

/// Alert cards, newest first.
pub type AlertCards = Arc<Vec<Arc<Reading>>>;

/// Observable state of one monitored device.
pub struct DeviceStore {
    latest: watch::Sender<Option<Arc<Reading>>>,
    timeline: watch::Sender<Arc<Timeline>>,
    alert_cards: watch::Sender<AlertCards>,
    phase: watch::Sender<MonitorPhase>,
    last_updated: watch::Sender<Option<DateTime<Utc>>>,
    applied: watch::Sender<u64>,
}

impl DeviceStore {
    pub fn new() -> Self {
        let (latest, _) = watch::channel(None);
        let (timeline, _) = watch::channel(Arc::new(Timeline::default()));
        let (alert_cards, _) = watch::channel(Arc::new(Vec::new()));
        let (phase, _) = watch::channel(MonitorPhase::Idle);
        let (last_updated, _) = watch::channel(None);
        let (applied, _) = watch::channel(0);

        Self {
            latest,
            timeline,
            alert_cards,
            phase,
            last_updated,
            applied,
        }
    }

    // ── Snapshots ───────────────────────────────────────────────────

    pub fn latest(&self) -> Option<Arc<Reading>> {
        self.latest.borrow().clone()
    }

    pub fn timeline(&self) -> Arc<Timeline> {
        self.timeline.borrow().clone()
    }

    pub fn alert_cards(&self) -> AlertCards {
        self.alert_cards.borrow().clone()
    }

    pub fn phase(&self) -> MonitorPhase {
        *self.phase.borrow()
    }

    pub fn loading(&self) -> bool {
        self.phase().is_loading()
    }

    pub fn no_data(&self) -> bool {
        self.phase().is_no_data()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        *self.last_updated.borrow()
    }

    /// Pushes fully applied since this store was created. Never resets.
    pub fn applied(&self) -> u64 {
        *self.applied.borrow()
    }

    // ── Subscriptions ───────────────────────────────────────────────

    pub fn subscribe_latest(&self) -> StateStream<Option<Arc<Reading>>> {
        StateStream::new(self.latest.subscribe())
    }

    pub fn subscribe_timeline(&self) -> StateStream<Arc<Timeline>> {
        StateStream::new(self.timeline.subscribe())
    }

    pub fn subscribe_alert_cards(&self) -> StateStream<AlertCards> {
        StateStream::new(self.alert_cards.subscribe())
    }

    pub fn subscribe_phase(&self) -> StateStream<MonitorPhase> {
        StateStream::new(self.phase.subscribe())
    }

    pub fn subscribe_last_updated(&self) -> StateStream<Option<DateTime<Utc>>> {
        StateStream::new(self.last_updated.subscribe())
    }

    pub fn subscribe_applied(&self) -> StateStream<u64> {
        StateStream::new(self.applied.subscribe())
    }

    // ── Mutations (event loop only) ─────────────────────────────────

    // `send_modify` / `send_replace` update even with zero receivers.

    pub(crate) fn set_latest(&self, reading: Option<Arc<Reading>>) {
        self.latest.send_replace(reading);
    }

    pub(crate) fn set_timeline(&self, timeline: Timeline) {
        self.timeline.send_replace(Arc::new(timeline));
    }

    pub(crate) fn set_alert_cards(&self, cards: Vec<Arc<Reading>>) {
        self.alert_cards.send_replace(Arc::new(cards));
    }

    /// Only notifies subscribers when the phase actually changes.
    pub(crate) fn set_phase(&self, phase: MonitorPhase) -> bool {
        self.phase.send_if_modified(|current| {
            let changed = *current != phase;
            *current = phase;
            changed
        })
    }

    pub(crate) fn touch(&self, at: DateTime<Utc>) {
        self.last_updated.send_replace(Some(at));
    }

    /// Record one push as applied, after every slice it touched.
    pub(crate) fn mark_applied(&self) {
        self.applied.send_modify(|n| *n += 1);
    }

    /// Return every slice to its initial value, except the phase.
    pub(crate) fn reset(&self) {
        self.set_latest(None);
        self.set_timeline(Timeline::default());
        self.set_alert_cards(Vec::new());
        self.last_updated.send_replace(None);
    }
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeviceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceStore")
            .field("phase", &self.phase())
            .field("timeline_len", &self.timeline().len())
            .field("alert_cards", &self.alert_cards().len())
            .field("last_updated", &self.last_updated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_and_empty() {
        let store = DeviceStore::new();
        assert_eq!(store.phase(), MonitorPhase::Idle);
        assert!(store.latest().is_none());
        assert!(store.timeline().is_empty());
        assert!(store.alert_cards().is_empty());
        assert!(store.last_updated().is_none());
        assert!(!store.loading());
        assert!(!store.no_data());
    }

    #[test]
    fn set_phase_reports_change() {
        let store = DeviceStore::new();
        assert!(store.set_phase(MonitorPhase::Loading));
        assert!(!store.set_phase(MonitorPhase::Loading));
        assert!(store.loading());
        assert!(store.set_phase(MonitorPhase::NoData));
        assert!(store.no_data());
    }

    #[tokio::test]
    async fn subscribers_see_updates_without_prior_receivers() {
        let store = DeviceStore::new();
        let mut phases = store.subscribe_phase();
        store.set_phase(MonitorPhase::Live);
        assert_eq!(phases.changed().await, Some(MonitorPhase::Live));
    }

    #[test]
    fn reset_keeps_phase() {
        let store = DeviceStore::new();
        store.set_phase(MonitorPhase::Live);
        store.touch(Utc::now());
        store.reset();
        assert_eq!(store.phase(), MonitorPhase::Live);
        assert!(store.last_updated().is_none());
    }

    #[tokio::test]
    async fn applied_count_survives_reset() {
        let store = DeviceStore::new();
        let mut applied = store.subscribe_applied();
        store.mark_applied();
        store.mark_applied();
        store.reset();
        store.mark_applied();

        assert_eq!(store.applied(), 3);
        assert_eq!(applied.wait_for(|n| *n >= 3).await, Some(3));
    }
}

// ── History merge ──
//
// The authoritative timeline is rebuilt from two sources on every push:
// the device's readings archive and the readings this process observed
// live. Archive entries go first so they win timestamp collisions.

mod buffer;
mod change;

use std::sync::Arc;

pub use buffer::LiveBuffer;
pub use change::{ChangeDetector, ChangeSummary};

use crate::model::{Reading, Timeline};

/// Merge archive and live readings into a timeline of at most `limit`
/// entries.
///
/// Within each source the first occurrence of a millisecond timestamp
/// wins; across sources the archive wins. Callers pass archive readings in
/// archive-key order and live readings newest first, which makes the
/// result independent of push interleaving.
pub fn merge<'a, A, L>(archive: A, live: L, limit: usize) -> Timeline
where
    A: IntoIterator<Item = &'a Arc<Reading>>,
    L: IntoIterator<Item = &'a Arc<Reading>>,
{
    Timeline::from_readings(archive.into_iter().chain(live).cloned(), limit)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{ButtonEvent, GasStatus, ReadingId, ReadingStatus};

    fn at(ms: i64, id: ReadingId) -> Arc<Reading> {
        Arc::new(Reading {
            id,
            timestamp: DateTime::from_timestamp_millis(ms).unwrap(),
            smoke_analog: 0.0,
            smoke_detected: false,
            gas_status: GasStatus::Normal,
            temperature: None,
            humidity: None,
            message: String::new(),
            sensor_error: false,
            sprinkler_active: false,
            button_event: ButtonEvent::Idle,
            button_state: "idle".into(),
            last_type: None,
            status: ReadingStatus::Safe,
        })
    }

    fn archived(ms: i64) -> Arc<Reading> {
        at(ms, ReadingId::Archive(format!("-{ms}")))
    }

    fn live(ms: i64) -> Arc<Reading> {
        at(ms, ReadingId::Live(ms))
    }

    fn millis(t: &Timeline) -> Vec<i64> {
        t.iter().map(|r| r.timestamp_millis()).collect()
    }

    #[test]
    fn sorted_descending() {
        let archive = vec![archived(1_000), archived(3_000)];
        let live = vec![live(2_000), live(4_000)];
        let t = merge(&archive, &live, 500);
        assert_eq!(millis(&t), vec![4_000, 3_000, 2_000, 1_000]);
    }

    #[test]
    fn archive_wins_timestamp_collision() {
        let archive = vec![archived(2_000)];
        let live = vec![live(2_000)];
        let t = merge(&archive, &live, 500);
        assert_eq!(t.len(), 1);
        assert!(t.latest().unwrap().id.is_archive());
    }

    #[test]
    fn dedups_within_one_source() {
        let first = live(5_000);
        let mut second = (*live(5_000)).clone();
        second.message = "later duplicate".into();
        let live = vec![Arc::clone(&first), Arc::new(second)];
        let t = merge(&[], &live, 500);
        assert_eq!(t.len(), 1);
        assert_eq!(t.latest().unwrap().message, "");
    }

    #[test]
    fn idempotent_on_own_output() {
        let archive = vec![archived(1_000), archived(2_000), archived(2_000)];
        let live = vec![live(3_000), live(1_000)];
        let once = merge(&archive, &live, 500);
        let twice = merge(once.as_slice(), once.as_slice(), 500);
        assert_eq!(once, twice);
    }

    #[test]
    fn never_exceeds_limit() {
        let base = Utc::now();
        let archive: Vec<_> = (0..400)
            .map(|i| archived((base - Duration::seconds(i)).timestamp_millis()))
            .collect();
        let live: Vec<_> = (400..900)
            .map(|i| live((base - Duration::seconds(i)).timestamp_millis()))
            .collect();
        let t = merge(&archive, &live, 500);
        assert_eq!(t.len(), 500);
        assert_eq!(t.latest().unwrap().timestamp_millis(), base.timestamp_millis());
    }

    #[test]
    fn interleaving_does_not_matter() {
        let archive = vec![archived(1_000), archived(2_000)];
        let live_a = vec![live(3_000), live(2_000)];
        let a = merge(&archive, &live_a, 500);
        let b = merge(&archive, &live_a, 500);
        assert_eq!(a, b);
        assert_eq!(millis(&a), vec![3_000, 2_000, 1_000]);
        assert!(a.as_slice()[1].id.is_archive());
    }
}

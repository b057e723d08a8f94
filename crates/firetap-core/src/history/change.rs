// ── Change detection ──
//
// Live pushes arrive on every telemetry tick. Only transitions are worth a
// timeline entry: a status, button, sprinkler, or smoke change, or the
// temperature crossing the threshold in either direction.

use crate::model::{ButtonEvent, Reading, ReadingStatus};

/// The committed state a new reading is compared against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeSummary {
    pub status: ReadingStatus,
    pub temperature: Option<f64>,
    pub smoke_detected: bool,
    pub button_event: ButtonEvent,
    pub sprinkler_active: bool,
}

impl ChangeSummary {
    pub fn of(reading: &Reading) -> Self {
        Self {
            status: reading.status,
            temperature: reading.temperature,
            smoke_detected: reading.smoke_detected,
            button_event: reading.button_event,
            sprinkler_active: reading.sprinkler_active,
        }
    }
}

/// Decides whether a live reading is a transition.
#[derive(Debug, Clone, Copy)]
pub struct ChangeDetector {
    threshold: f64,
}

impl ChangeDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// An absent temperature is never hot.
    fn is_hot(&self, temperature: Option<f64>) -> bool {
        temperature.is_some_and(|t| t >= self.threshold)
    }

    /// Compare `reading` with the committed summary. Returns the summary to
    /// commit when the reading should be recorded, `None` otherwise. The
    /// first observation always records.
    pub fn detect(&self, previous: Option<&ChangeSummary>, reading: &Reading) -> Option<ChangeSummary> {
        let next = ChangeSummary::of(reading);
        let Some(prev) = previous else {
            return Some(next);
        };

        let changed = prev.status != next.status
            || prev.button_event != next.button_event
            || prev.sprinkler_active != next.sprinkler_active
            || prev.smoke_detected != next.smoke_detected
            || self.is_hot(prev.temperature) != self.is_hot(next.temperature);

        changed.then_some(next)
    }
}

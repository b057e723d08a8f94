// ── Timeline ──
//
// Bounded, deduplicated, strictly time-descending history for one device.
// Replaced wholesale on every merge; never edited in place.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::reading::Reading;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline(Vec<Arc<Reading>>);

impl Timeline {
    /// Build a timeline from readings in priority order.
    ///
    /// The first reading seen for a given millisecond wins. Survivors are
    /// sorted newest first (stable, so equal-priority ties keep their input
    /// order) and cut to `limit`.
    pub fn from_readings<I>(readings: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = Arc<Reading>>,
    {
        let mut seen = HashSet::new();
        let mut entries: Vec<Arc<Reading>> = readings
            .into_iter()
            .filter(|r| seen.insert(r.timestamp_millis()))
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&Arc<Reading>> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Reading>> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Arc<Reading>] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Arc<Reading>> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Arc<Reading>;
    type IntoIter = std::slice::Iter<'a, Arc<Reading>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

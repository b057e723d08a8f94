use std::collections::VecDeque;
use std::sync::Arc;

use crate::model::Reading;

/// Readings observed live by this process, newest first, bounded.
#[derive(Debug, Clone)]
pub struct LiveBuffer {
    entries: VecDeque<Arc<Reading>>,
    capacity: usize,
}

impl LiveBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Seed from a persisted timeline (already newest first).
    pub fn seeded<I>(capacity: usize, readings: I) -> Self
    where
        I: IntoIterator<Item = Arc<Reading>>,
    {
        let mut buffer = Self::new(capacity);
        buffer.entries.extend(readings.into_iter().take(capacity));
        buffer
    }

    /// Prepend a reading, dropping the oldest once over capacity.
    pub fn push(&mut self, reading: Arc<Reading>) {
        self.entries.push_front(reading);
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Reading>> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a LiveBuffer {
    type Item = &'a Arc<Reading>;
    type IntoIter = std::collections::vec_deque::Iter<'a, Arc<Reading>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

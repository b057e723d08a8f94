// ── Durable history ──
//
// A string key/value seam plus the bounded per-device history built on it.
// Reconciliation never fails because of storage: `HistoryStore` logs and
// swallows every load and save problem.

mod file;
mod memory;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;

use crate::model::{DeviceId, Reading, Timeline};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode history: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Durable string storage keyed by name.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Bounded, per-device timeline persistence.
#[derive(Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
    prefix: String,
    limit: usize,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, prefix: impl Into<String>, limit: usize) -> Self {
        Self {
            kv,
            prefix: prefix.into(),
            limit,
        }
    }

    pub fn key(&self, device: &DeviceId) -> String {
        format!("{}{device}", self.prefix)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Load the persisted timeline. Missing or corrupt data yields an
    /// empty timeline.
    pub fn load(&self, device: &DeviceId) -> Timeline {
        let key = self.key(device);
        let raw = match self.kv.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Timeline::default(),
            Err(e) => {
                warn!(device_id = %device, error = %e, "failed to read persisted history");
                return Timeline::default();
            }
        };

        match serde_json::from_str::<Vec<Reading>>(&raw) {
            Ok(readings) => {
                let timeline = Timeline::from_readings(readings.into_iter().map(Arc::new), self.limit);
                debug!(device_id = %device, entries = timeline.len(), "loaded persisted history");
                timeline
            }
            Err(e) => {
                warn!(device_id = %device, error = %e, "discarding corrupt persisted history");
                Timeline::default()
            }
        }
    }

    /// Persist the newest `limit` entries. Failures are logged, not returned.
    pub fn save(&self, device: &DeviceId, timeline: &Timeline) {
        if let Err(e) = self.try_save(device, timeline) {
            warn!(device_id = %device, error = %e, "failed to persist history");
        }
    }

    fn try_save(&self, device: &DeviceId, timeline: &Timeline) -> Result<(), StorageError> {
        let kept: Vec<&Reading> = timeline
            .iter()
            .take(self.limit)
            .map(AsRef::as_ref)
            .collect();
        let encoded = serde_json::to_string(&kept)?;
        self.kv.set(&self.key(device), &encoded)?;
        debug!(device_id = %device, entries = kept.len(), "persisted history");
        Ok(())
    }

    /// Drop the persisted timeline for `device`.
    pub fn clear(&self, device: &DeviceId) -> Result<(), StorageError> {
        self.kv.remove(&self.key(device))
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("prefix", &self.prefix)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

// ── Runtime monitor configuration ──
//
// Tuning for one DeviceMonitor. Built by the CLI (or any host) and handed
// in; core never reads config files.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const DEFAULT_HISTORY_LIMIT: usize = 500;
pub const DEFAULT_ALERT_CARD_LIMIT: usize = 5;
pub const DEFAULT_TEMPERATURE_THRESHOLD: f64 = 50.0;
pub const DEFAULT_STORAGE_KEY_PREFIX: &str = "firetap_history_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Maximum retained timeline entries, also the live-buffer cap.
    pub history_limit: usize,
    /// How many alert-feed entries to request and display.
    pub alert_card_limit: usize,
    /// Temperature whose crossing records a timeline entry.
    pub temperature_threshold: f64,
    /// Prefix for per-device keys in the local key/value store.
    pub storage_key_prefix: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            alert_card_limit: DEFAULT_ALERT_CARD_LIMIT,
            temperature_threshold: DEFAULT_TEMPERATURE_THRESHOLD,
            storage_key_prefix: DEFAULT_STORAGE_KEY_PREFIX.into(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.history_limit == 0 {
            return Err(CoreError::Config {
                message: "history_limit must be at least 1".into(),
            });
        }
        if self.alert_card_limit == 0 {
            return Err(CoreError::Config {
                message: "alert_card_limit must be at least 1".into(),
            });
        }
        if !self.temperature_threshold.is_finite() {
            return Err(CoreError::Config {
                message: format!(
                    "temperature_threshold must be finite, got {}",
                    self.temperature_threshold
                ),
            });
        }
        if self.storage_key_prefix.is_empty() {
            return Err(CoreError::Config {
                message: "storage_key_prefix must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = MonitorConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.history_limit, 500);
        assert_eq!(cfg.alert_card_limit, 5);
    }

    #[test]
    fn zero_limits_rejected() {
        let cfg = MonitorConfig {
            history_limit: 0,
            ..MonitorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(CoreError::Config { .. })));

        let cfg = MonitorConfig {
            alert_card_limit: 0,
            ..MonitorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn nan_threshold_rejected() {
        let cfg = MonitorConfig {
            temperature_threshold: f64::NAN,
            ..MonitorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}

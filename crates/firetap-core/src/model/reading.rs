// ── Canonical reading ──
//
// One normalized sensor/event record. Field names serialize in camelCase
// so persisted timelines stay readable by any dashboard client.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ── ReadingId ───────────────────────────────────────────────────────

/// Where a reading came from and how to refer to it.
///
/// Archived readings keep their archive entry key; live readings are
/// identified by the instant (epoch millis) at which they were generated.
/// Live ids order before archive ids; archive ids order by key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingId {
    Live(i64),
    Archive(String),
}

impl ReadingId {
    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Archive(_))
    }
}

impl fmt::Display for ReadingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live(ms) => write!(f, "{ms}"),
            Self::Archive(key) => f.write_str(key),
        }
    }
}

// ── ButtonEvent ─────────────────────────────────────────────────────

/// Manual override signal from the device's physical button.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ButtonEvent {
    #[default]
    Idle,
    Alert,
    Sprinkler,
}

impl ButtonEvent {
    /// Map the raw button `state` string. Anything unrecognized is idle.
    pub fn from_state(state: &str) -> Self {
        match state {
            "alert" => Self::Alert,
            "sprinkler" => Self::Sprinkler,
            _ => Self::Idle,
        }
    }

    /// Text shown in place of the device message while the override is active.
    pub fn message(self) -> Option<&'static str> {
        match self {
            Self::Idle => None,
            Self::Alert => Some("alert triggered"),
            Self::Sprinkler => Some("sprinkler activated"),
        }
    }
}

// ── ReadingStatus ───────────────────────────────────────────────────

/// Derived safety status.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ReadingStatus {
    #[default]
    Safe,
    Alert,
    #[serde(rename = "Smoke Detected")]
    #[strum(serialize = "Smoke Detected")]
    SmokeDetected,
}

impl ReadingStatus {
    /// `true` for any status other than `Safe`.
    pub fn is_alarming(self) -> bool {
        !matches!(self, Self::Safe)
    }
}

// ── GasStatus ───────────────────────────────────────────────────────

/// Gas sensor state. Unknown firmware values are preserved verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GasStatus {
    #[default]
    Normal,
    Critical,
    Detected,
    Other(String),
}

impl GasStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Normal => "normal",
            Self::Critical => "critical",
            Self::Detected => "detected",
            Self::Other(raw) => raw,
        }
    }

    /// `critical` and `detected` raise an alert.
    pub fn is_alarming(&self) -> bool {
        matches!(self, Self::Critical | Self::Detected)
    }
}

impl From<&str> for GasStatus {
    fn from(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "normal" => Self::Normal,
            "critical" => Self::Critical,
            "detected" => Self::Detected,
            _ => Self::Other(raw.to_owned()),
        }
    }
}

impl From<String> for GasStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<GasStatus> for String {
    fn from(status: GasStatus) -> Self {
        match status {
            GasStatus::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for GasStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Reading ─────────────────────────────────────────────────────────

/// A canonical reading. Built once by the normalizer and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: ReadingId,
    pub timestamp: DateTime<Utc>,
    pub smoke_analog: f64,
    pub smoke_detected: bool,
    #[serde(default)]
    pub gas_status: GasStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sensor_error: bool,
    #[serde(default)]
    pub sprinkler_active: bool,
    #[serde(default)]
    pub button_event: ButtonEvent,
    #[serde(default = "idle_state")]
    pub button_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_type: Option<String>,
    pub status: ReadingStatus,
}

fn idle_state() -> String {
    "idle".into()
}

impl Reading {
    /// Dedup key: the timestamp at millisecond resolution.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle of a monitored device: `Idle → Loading → {Live, NoData}`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MonitorPhase {
    /// Not monitoring.
    #[default]
    Idle,
    /// Started, waiting for the first current-state push.
    Loading,
    /// The device node exists and is being tracked.
    Live,
    /// The device node is absent or unreachable.
    NoData,
}

impl MonitorPhase {
    pub fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_no_data(self) -> bool {
        matches!(self, Self::NoData)
    }

    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

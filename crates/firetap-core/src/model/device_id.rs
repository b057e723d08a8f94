// ── Device identifier ──

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Characters the data store forbids in a path key.
const FORBIDDEN: &[char] = &['/', '.', '#', '$', '[', ']'];

/// Identifier of one monitored device, usable as a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        let trimmed = raw.trim().to_owned();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidDeviceId {
                id: raw,
                reason: "must not be empty".into(),
            });
        }
        if let Some(c) = trimmed.chars().find(|c| FORBIDDEN.contains(c) || c.is_control()) {
            return Err(CoreError::InvalidDeviceId {
                id: raw,
                reason: format!("contains forbidden character {c:?}"),
            });
        }
        Ok(Self(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

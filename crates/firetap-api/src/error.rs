// ── Transport error types ──
//
// Failures the data store reports through a subscription's error callback.
// A subscription that reports an error is cancelled by the store; the
// underlying transport owns any retry policy.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("permission denied at '{path}'")]
    PermissionDenied { path: String },

    #[error("path '{path}' is unreachable: {reason}")]
    Unreachable { path: String, reason: String },

    #[error("store disconnected")]
    Disconnected,

    #[error("invalid path '{path}'")]
    InvalidPath { path: String },
}

impl Error {
    /// The path the error refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::PermissionDenied { path }
            | Self::Unreachable { path, .. }
            | Self::InvalidPath { path } => Some(path),
            Self::Disconnected => None,
        }
    }
}

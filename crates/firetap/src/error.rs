//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use firetap_config::ConfigError;
use firetap_core::{CoreError, StorageError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const DATA: i32 = 65;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────

    #[error("Could not read {}", path.display())]
    #[diagnostic(code(firetap::read_failed), help("Check that the file exists and is readable."))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid JSON", path.display())]
    #[diagnostic(
        code(firetap::invalid_json),
        help("The file must contain a single JSON document.")
    )]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid replay step {step}: {reason}")]
    #[diagnostic(
        code(firetap::invalid_script),
        help(
            "Each step is an object with a \"path\" and either a \"value\" \
             (null deletes) or an \"error\" of permission_denied, unreachable, \
             disconnected or invalid_path."
        )
    )]
    InvalidScript { step: usize, reason: String },

    #[error("Invalid device id '{id}': {reason}")]
    #[diagnostic(code(firetap::invalid_device))]
    InvalidDevice { id: String, reason: String },

    // ── Lookup ───────────────────────────────────────────────────────

    #[error("No persisted history for device '{device}'")]
    #[diagnostic(
        code(firetap::not_found),
        help("History is written by `firetap replay`. Storage: {storage}")
    )]
    NoHistory { device: String, storage: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(firetap::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(
        code(firetap::config),
        help("Check the config file (`firetap config path`) and FIRETAP_* variables.")
    )]
    Config(#[from] ConfigError),

    // ── Runtime ──────────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(firetap::storage))]
    Storage(#[from] StorageError),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(firetap::render))]
    Render(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(firetap::io))]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(firetap::internal))]
    Internal(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidJson { .. } | Self::InvalidScript { .. } => exit_code::DATA,
            Self::InvalidDevice { .. } | Self::Validation { .. } => exit_code::USAGE,
            Self::NoHistory { .. } => exit_code::NOT_FOUND,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidDeviceId { id, reason } => Self::InvalidDevice { id, reason },
            CoreError::Config { message } => Self::Validation {
                field: "monitor".into(),
                reason: message,
            },
            CoreError::Storage(e) => Self::Storage(e),
        }
    }
}

// ── Core error types ──
//
// Errors that cross the crate boundary. Reconciliation itself never
// fails outward: transport problems become an observable phase and
// persistence problems become log entries. What remains here is
// configuration, identifier validation, and explicit storage calls.

use thiserror::Error;

use crate::persist::StorageError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid device id '{id}': {reason}")]
    InvalidDeviceId { id: String, reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

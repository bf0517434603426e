//! Error type shared by all capability implementations.

use thiserror::Error;

/// Errors a device capability can report.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    /// Communication with the hardware failed. Non-retryable within a run.
    #[error("hardware communication failed: {0}")]
    Comm(String),

    /// The device did not respond within its per-operation timeout.
    #[error("device operation timed out")]
    Timeout,

    /// The device refused the command (bad parameters, wrong mode).
    #[error("command rejected: {0}")]
    Rejected(String),

    /// The device is busy with another command.
    #[error("device busy: {0}")]
    Busy(String),
}

impl CapabilityError {
    /// Whether this error rules out further commands to the device
    /// within the current run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CapabilityError::Comm(_))
    }
}

// ABOUTME: Error types for per-device deployment sequences.
// ABOUTME: Every variant here is fatal for its device; rename failures never reach this type.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::backend::{ConfigWriteError, StorageError, TherapyError};

/// Fatal errors that abort one device's sequence.
///
/// The message of the underlying backend error is carried verbatim; it is
/// what the terminal `error` event and the device result report.
#[derive(Debug, Clone, Error)]
pub enum InstallError {
    /// Precondition: the role must be set before deployment starts.
    #[error("device role not set")]
    RoleNotSet,

    #[error("erase failed: {0}")]
    Erase(String),

    #[error("firmware transfer failed: {0}")]
    Transfer(String),

    #[error("config write failed: {0}")]
    ConfigWrite(String),

    #[error("therapy apply failed: {0}")]
    Therapy(String),

    #[error("update skipped by operator")]
    Skipped,

    #[error("device locked by {holder} (pid {pid}) since {started_at}")]
    DeviceLocked {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("lock error: {0}")]
    Lock(String),
}

impl InstallError {
    pub fn erase(source: StorageError) -> Self {
        InstallError::Erase(source.to_string())
    }

    pub fn transfer(source: StorageError) -> Self {
        InstallError::Transfer(source.to_string())
    }

    pub fn lock_error(message: impl Into<String>) -> Self {
        InstallError::Lock(message.into())
    }

    pub fn lock_held(holder: String, pid: u32, started_at: DateTime<Utc>) -> Self {
        InstallError::DeviceLocked {
            holder,
            pid,
            started_at,
        }
    }
}

impl From<ConfigWriteError> for InstallError {
    fn from(source: ConfigWriteError) -> Self {
        InstallError::ConfigWrite(source.to_string())
    }
}

impl From<TherapyError> for InstallError {
    fn from(source: TherapyError) -> Self {
        InstallError::Therapy(source.to_string())
    }
}

// ABOUTME: Unified backend error with SNAFU pattern.
// ABOUTME: Wraps per-capability errors for programmatic handling at the probe boundary.

use snafu::Snafu;

use super::traits::{ConfigWriteError, StorageError, TherapyError, VolumeError};

/// Unified backend error for callers that work across capabilities.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum BackendError {
    #[snafu(display("storage operation failed: {source}"))]
    Storage { source: StorageError },

    #[snafu(display("config write failed: {source}"))]
    Config { source: ConfigWriteError },

    #[snafu(display("volume operation failed: {source}"))]
    Volume { source: VolumeError },

    #[snafu(display("therapy apply failed: {source}"))]
    Therapy { source: TherapyError },

    #[snafu(display("device probe failed for {path}: {reason}"))]
    Probe { path: String, reason: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Device is missing or disappeared mid-operation.
    DeviceUnavailable,
    /// A destructive or semi-destructive operation failed on the device.
    OperationFailed,
    /// The host cannot perform the operation at all.
    Unsupported,
}

impl BackendError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            BackendError::Storage { source } => match source {
                StorageError::DeviceNotFound(_) | StorageError::Disconnected(_) => {
                    BackendErrorKind::DeviceUnavailable
                }
                StorageError::EraseFailed(_) | StorageError::TransferFailed(_) => {
                    BackendErrorKind::OperationFailed
                }
            },
            BackendError::Config { source } => match source {
                ConfigWriteError::DeviceNotFound(_) => BackendErrorKind::DeviceUnavailable,
                ConfigWriteError::WriteFailed(_) => BackendErrorKind::OperationFailed,
            },
            BackendError::Volume { source } => match source {
                VolumeError::Unsupported(_) => BackendErrorKind::Unsupported,
                VolumeError::RenameFailed(_) | VolumeError::NotFound(_) => {
                    BackendErrorKind::OperationFailed
                }
            },
            BackendError::Therapy { source } => match source {
                TherapyError::DeviceNotFound(_) | TherapyError::Disconnected(_) => {
                    BackendErrorKind::DeviceUnavailable
                }
                TherapyError::ApplyFailed(_) => BackendErrorKind::OperationFailed,
            },
            BackendError::Probe { .. } => BackendErrorKind::DeviceUnavailable,
        }
    }
}

impl From<StorageError> for BackendError {
    fn from(source: StorageError) -> Self {
        BackendError::Storage { source }
    }
}

impl From<ConfigWriteError> for BackendError {
    fn from(source: ConfigWriteError) -> Self {
        BackendError::Config { source }
    }
}

impl From<VolumeError> for BackendError {
    fn from(source: VolumeError) -> Self {
        BackendError::Volume { source }
    }
}

impl From<TherapyError> for BackendError {
    fn from(source: TherapyError) -> Self {
        BackendError::Therapy { source }
    }
}

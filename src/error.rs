// ABOUTME: Application-wide error types for perista.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("invalid device spec '{0}', expected PATH or PATH:ROLE")]
    InvalidDeviceSpec(String),

    #[error("invalid device selection: {0}")]
    Selection(#[from] crate::types::BatchSelectionError),

    #[error("invalid role: {0}")]
    Role(#[from] crate::types::ParseRoleError),

    #[error("invalid device path: {0}")]
    DevicePath(#[from] crate::types::DevicePathError),

    #[error("invalid firmware version: {0}")]
    FirmwareVersion(#[from] crate::types::FirmwareVersionError),

    #[error("firmware bundle error: {0}")]
    FirmwareBundle(#[from] crate::types::FirmwareBundleError),

    #[error("settings error: {0}")]
    Settings(#[from] crate::config::SettingsError),

    #[error("backend error: {0}")]
    Backend(#[from] crate::backend::BackendError),

    #[error("some devices failed")]
    BatchFailed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

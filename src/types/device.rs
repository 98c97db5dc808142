// ABOUTME: Device identity types: connection path, display label, role, mode.
// ABOUTME: Devices are immutable value objects for the duration of one deployment.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::Role;

#[derive(Debug, Error)]
pub enum DevicePathError {
    #[error("device path cannot be empty")]
    Empty,

    #[error("device path contains a NUL byte")]
    InteriorNul,
}

/// A connection handle for one device: a mount point or serial port.
///
/// The orchestrator never interprets the path itself; it only hands it to
/// the backend operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DevicePath(String);

impl DevicePath {
    pub fn new(value: &str) -> Result<Self, DevicePathError> {
        if value.is_empty() {
            return Err(DevicePathError::Empty);
        }
        if value.contains('\0') {
            return Err(DevicePathError::InteriorNul);
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<std::path::Path> for DevicePath {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

/// Whether a device is running its application or sitting in the bootloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    /// Normal application firmware is running.
    Application,
    /// Device is in bootloader / DFU mode and exposes its update surface.
    Bootloader,
}

/// One physical device as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub path: DevicePath,
    pub label: String,
    pub role: Option<Role>,
    pub mode: DeviceMode,
}

impl Device {
    pub fn new(path: DevicePath, label: impl Into<String>) -> Self {
        Self {
            path,
            label: label.into(),
            role: None,
            mode: DeviceMode::Application,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_mode(mut self, mode: DeviceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn has_role(&self) -> bool {
        self.role.is_some()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.path)
    }
}

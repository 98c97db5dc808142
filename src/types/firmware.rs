// ABOUTME: Firmware bundle types: a resolved version plus a local artifact path.
// ABOUTME: Bundles come from the external download/cache collaborator, read-only here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FirmwareVersionError {
    #[error("firmware version cannot be empty")]
    Empty,

    #[error("firmware version contains whitespace")]
    Whitespace,
}

/// A firmware version token, e.g. "2.4.1" or "2024.08-rc1".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FirmwareVersion(String);

impl FirmwareVersion {
    pub fn new(value: &str) -> Result<Self, FirmwareVersionError> {
        if value.is_empty() {
            return Err(FirmwareVersionError::Empty);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(FirmwareVersionError::Whitespace);
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum FirmwareBundleError {
    #[error("firmware bundle not found at {0}")]
    NotFound(PathBuf),

    #[error("firmware bundle at {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("firmware bundle at {0} is empty")]
    EmptyBundle(PathBuf),

    #[error("I/O error reading bundle: {0}")]
    Io(#[from] std::io::Error),
}

/// A locally-available firmware artifact: version plus the directory holding
/// the files to transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareBundle {
    pub version: FirmwareVersion,
    pub path: PathBuf,
}

impl FirmwareBundle {
    /// Open an already-downloaded bundle, verifying it exists and holds at
    /// least one file.
    pub fn open(version: FirmwareVersion, path: &Path) -> Result<Self, FirmwareBundleError> {
        if !path.exists() {
            return Err(FirmwareBundleError::NotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FirmwareBundleError::NotADirectory(path.to_path_buf()));
        }
        if std::fs::read_dir(path)?.next().is_none() {
            return Err(FirmwareBundleError::EmptyBundle(path.to_path_buf()));
        }
        Ok(Self {
            version,
            path: path.to_path_buf(),
        })
    }
}

impl fmt::Display for FirmwareBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.path.display())
    }
}

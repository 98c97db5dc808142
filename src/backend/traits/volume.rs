// ABOUTME: Volume labeling trait for device backends.
// ABOUTME: Rename a mounted volume and resolve the path the host gave it.

use async_trait::async_trait;

use crate::types::DevicePath;

/// Cosmetic volume operations. Failure here never fails a deployment.
#[async_trait]
pub trait VolumeOps: Send + Sync {
    /// Rename the mounted volume to the given label.
    async fn rename_volume(&self, device: &DevicePath, new_name: &str)
    -> Result<(), VolumeError>;

    /// Resolve the mount path a renamed volume actually landed on.
    ///
    /// Hosts append numeric suffixes on collision (`NAME`, `NAME 1`, ...);
    /// implementations must account for that.
    async fn resolve_renamed_path(
        &self,
        old_path: &DevicePath,
        expected_name: &str,
    ) -> Result<DevicePath, VolumeError>;
}

/// Errors from volume operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VolumeError {
    #[error("rename failed: {0}")]
    RenameFailed(String),

    #[error("renamed volume not found for label '{0}'")]
    NotFound(String),

    #[error("volume rename not supported on this host: {0}")]
    Unsupported(String),
}

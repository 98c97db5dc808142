// ABOUTME: Configuration write trait for device backends.
// ABOUTME: Writes the role-selected config template onto a device.

use async_trait::async_trait;

use crate::types::{DevicePath, Role};

/// Writing the device configuration file.
#[async_trait]
pub trait ConfigOps: Send + Sync {
    /// Write the configuration content for the given role to the device.
    ///
    /// The content is an opaque template selected by the caller; the role is
    /// passed alongside so backends can key any side channel off it.
    async fn write_config(
        &self,
        device: &DevicePath,
        role: Role,
        content: &str,
    ) -> Result<(), ConfigWriteError>;
}

/// Errors from configuration writes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigWriteError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("config write failed: {0}")]
    WriteFailed(String),
}

// ABOUTME: Storage operations trait for device backends.
// ABOUTME: Erase the device and transfer firmware with streamed progress.

use async_trait::async_trait;
use std::path::Path;

use super::TransferStream;
use crate::types::DevicePath;

/// Destructive storage operations on one device.
#[async_trait]
pub trait StorageOps: Send + Sync {
    /// Erase all user-visible content on the device.
    async fn erase(&self, device: &DevicePath) -> Result<(), StorageError>;

    /// Transfer the firmware bundle to the device.
    ///
    /// Returns a progress stream; the transfer completes when the stream
    /// ends without having yielded an error item.
    async fn transfer_firmware(
        &self,
        firmware: &Path,
        device: &DevicePath,
    ) -> Result<TransferStream, StorageError>;
}

/// Errors from storage operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("erase failed: {0}")]
    EraseFailed(String),

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error("device disconnected: {0}")]
    Disconnected(String),
}

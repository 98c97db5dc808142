// ABOUTME: Therapy profile application trait for device backends.
// ABOUTME: A single remote call that streams its own stage/percent/message events.

use async_trait::async_trait;

use super::TherapyStream;
use crate::config::TherapyProfile;
use crate::types::DevicePath;

/// Applying a therapy profile to one device.
#[async_trait]
pub trait TherapyOps: Send + Sync {
    /// Apply the profile, streaming coarse progress.
    ///
    /// The apply completes when the stream ends without having yielded an
    /// error item.
    async fn apply_therapy_profile(
        &self,
        device: &DevicePath,
        profile: &TherapyProfile,
    ) -> Result<TherapyStream, TherapyError>;
}

/// Errors from therapy profile application.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TherapyError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("profile apply failed: {0}")]
    ApplyFailed(String),

    #[error("device disconnected: {0}")]
    Disconnected(String),
}

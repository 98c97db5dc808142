// ABOUTME: Stage/event/result types emitted by the deployment orchestrator.
// ABOUTME: Callers fold StageEvents into whatever state representation they use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::types::{Device, DevicePath};

/// Batch result message when every device succeeded.
pub const MSG_ALL_UPDATED: &str = "All devices updated successfully";

/// Batch result message when at least one device failed.
pub const MSG_SOME_FAILED: &str = "Some devices failed to update";

/// A named phase of a per-device sequence.
///
/// `Wiping`/`Copying`/`Configuring` belong to the firmware flow,
/// `Connecting`/`Sending`/`Rebooting` to the therapy flow; `Complete` and
/// `Error` are the shared terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Wiping,
    Copying,
    Configuring,
    Connecting,
    Sending,
    Rebooting,
    Complete,
    Error,
}

impl Stage {
    /// Terminal stages end a device's sequence; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Wiping => "wiping",
            Stage::Copying => "copying",
            Stage::Configuring => "configuring",
            Stage::Connecting => "connecting",
            Stage::Sending => "sending",
            Stage::Rebooting => "rebooting",
            Stage::Complete => "complete",
            Stage::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// One progress notification for one device.
///
/// For a given device, events are non-decreasing in stage order; `Error`
/// may interrupt from any non-terminal stage and is always terminal;
/// `Complete` is terminal and always carries progress 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEvent {
    pub device_path: DevicePath,
    pub stage: Stage,
    pub progress: u8,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_device_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_device_path: Option<DevicePath>,
}

impl StageEvent {
    pub fn new(
        device_path: DevicePath,
        stage: Stage,
        progress: u8,
        message: impl Into<String>,
    ) -> Self {
        Self {
            device_path,
            stage,
            progress,
            message: message.into(),
            current_file: None,
            new_device_label: None,
            new_device_path: None,
        }
    }

    pub fn with_current_file(mut self, file: impl Into<String>) -> Self {
        self.current_file = Some(file.into());
        self
    }

    pub fn with_renamed(mut self, label: impl Into<String>, path: DevicePath) -> Self {
        self.new_device_label = Some(label.into());
        self.new_device_path = Some(path);
        self
    }
}

/// Where the orchestrator delivers events. The caller decides how to fold
/// them into its own state (store, channel, log).
pub type EventSink = Arc<dyn Fn(StageEvent) + Send + Sync>;

/// Terminal outcome for one device in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceUpdateResult {
    pub device: Device,
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeviceUpdateResult {
    pub fn succeeded(device: Device) -> Self {
        Self {
            device,
            success: true,
            error: None,
        }
    }

    pub fn failed(device: Device, error: impl Into<String>) -> Self {
        Self {
            device,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Frozen result of one batch, produced after every device reached a
/// terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub success: bool,
    pub message: String,
    pub device_updates: Vec<DeviceUpdateResult>,
    pub finished_at: DateTime<Utc>,
}

impl UpdateResult {
    /// Freeze per-device outcomes into the batch result. Success is the
    /// logical AND across devices; the message is intentionally binary.
    pub fn from_device_updates(device_updates: Vec<DeviceUpdateResult>) -> Self {
        let success = device_updates.iter().all(|u| u.success);
        let message = if success {
            MSG_ALL_UPDATED
        } else {
            MSG_SOME_FAILED
        };
        Self {
            success,
            message: message.to_string(),
            device_updates,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DevicePath;

    fn device(path: &str) -> Device {
        Device::new(DevicePath::new(path).unwrap(), path)
    }

    #[test]
    fn batch_success_is_and_of_device_results() {
        let result = UpdateResult::from_device_updates(vec![
            DeviceUpdateResult::succeeded(device("/a")),
            DeviceUpdateResult::failed(device("/b"), "erase failed: gone"),
        ]);
        assert!(!result.success);
        assert_eq!(result.message, MSG_SOME_FAILED);

        let result =
            UpdateResult::from_device_updates(vec![DeviceUpdateResult::succeeded(device("/a"))]);
        assert!(result.success);
        assert_eq!(result.message, MSG_ALL_UPDATED);
    }

    #[test]
    fn terminal_stages() {
        assert!(Stage::Complete.is_terminal());
        assert!(Stage::Error.is_terminal());
        assert!(!Stage::Configuring.is_terminal());
    }
}

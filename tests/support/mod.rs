// ABOUTME: Shared test support: scripted fake backend and event collection.
// ABOUTME: The fake records calls and plays back per-device outcomes.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use perista::backend::{
    ConfigOps, ConfigWriteError, StorageError, StorageOps, TherapyError, TherapyOps,
    TherapyPhase, TherapyProgress, TherapyStream, TransferProgress, TransferStream, VolumeError,
    VolumeOps,
};
use perista::config::{Settings, TherapyProfile, ThrottleSettings};
use perista::deploy::{EventSink, StageEvent};
use perista::types::{Device, DeviceMode, DevicePath, FirmwareBundle, FirmwareVersion, Role};

/// Scripted backend double. Records every call and fails operations the
/// test has scripted for a given device path.
#[derive(Default)]
pub struct FakeBackend {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    calls: Vec<String>,
    fail_erase: HashMap<String, String>,
    fail_transfer: HashMap<String, String>,
    fail_config: HashMap<String, String>,
    fail_rename: HashMap<String, String>,
    fail_therapy: HashMap<String, String>,
    transfer_files: Vec<String>,
    resolve_suffix: String,
    written_configs: HashMap<String, String>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.inner.lock().transfer_files = vec!["firmware.uf2".to_string()];
        backend
    }

    pub fn fail_erase(&self, path: &str, message: &str) {
        self.inner
            .lock()
            .fail_erase
            .insert(path.to_string(), message.to_string());
    }

    pub fn fail_transfer(&self, path: &str, message: &str) {
        self.inner
            .lock()
            .fail_transfer
            .insert(path.to_string(), message.to_string());
    }

    pub fn fail_config(&self, path: &str, message: &str) {
        self.inner
            .lock()
            .fail_config
            .insert(path.to_string(), message.to_string());
    }

    pub fn fail_rename(&self, path: &str, message: &str) {
        self.inner
            .lock()
            .fail_rename
            .insert(path.to_string(), message.to_string());
    }

    pub fn fail_therapy(&self, path: &str, message: &str) {
        self.inner
            .lock()
            .fail_therapy
            .insert(path.to_string(), message.to_string());
    }

    /// Files the transfer stream will report, in order.
    pub fn set_transfer_files(&self, files: &[&str]) {
        self.inner.lock().transfer_files = files.iter().map(|f| f.to_string()).collect();
    }

    /// Suffix the host appended to the renamed volume (e.g. " 1").
    pub fn set_resolve_suffix(&self, suffix: &str) {
        self.inner.lock().resolve_suffix = suffix.to_string();
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    pub fn written_config(&self, path: &str) -> Option<String> {
        self.inner.lock().written_configs.get(path).cloned()
    }

    fn record(&self, call: String) {
        self.inner.lock().calls.push(call);
    }
}

#[async_trait]
impl StorageOps for FakeBackend {
    async fn erase(&self, device: &DevicePath) -> Result<(), StorageError> {
        self.record(format!("erase:{device}"));
        if let Some(message) = self.inner.lock().fail_erase.get(device.as_str()) {
            return Err(StorageError::EraseFailed(message.clone()));
        }
        Ok(())
    }

    async fn transfer_firmware(
        &self,
        _firmware: &Path,
        device: &DevicePath,
    ) -> Result<TransferStream, StorageError> {
        self.record(format!("transfer:{device}"));
        let inner = self.inner.lock();
        let files = inner.transfer_files.clone();
        let failure = inner.fail_transfer.get(device.as_str()).cloned();
        drop(inner);

        let total = files.len() as u32;
        let mut items: Vec<Result<TransferProgress, StorageError>> = Vec::new();
        for (index, file) in files.iter().enumerate() {
            // A scripted failure interrupts the stream halfway through.
            if failure.is_some() && index == files.len() / 2 {
                break;
            }
            items.push(Ok(TransferProgress {
                current_file: file.clone(),
                total_files: total,
                completed_files: index as u32 + 1,
            }));
        }
        if let Some(message) = failure {
            items.push(Err(StorageError::TransferFailed(message)));
        }
        Ok(futures::stream::iter(items).boxed())
    }
}

#[async_trait]
impl ConfigOps for FakeBackend {
    async fn write_config(
        &self,
        device: &DevicePath,
        role: Role,
        content: &str,
    ) -> Result<(), ConfigWriteError> {
        self.record(format!("write_config:{device}:{role}"));
        let mut inner = self.inner.lock();
        if let Some(message) = inner.fail_config.get(device.as_str()) {
            return Err(ConfigWriteError::WriteFailed(message.clone()));
        }
        inner
            .written_configs
            .insert(device.to_string(), content.to_string());
        Ok(())
    }
}

#[async_trait]
impl VolumeOps for FakeBackend {
    async fn rename_volume(
        &self,
        device: &DevicePath,
        new_name: &str,
    ) -> Result<(), VolumeError> {
        self.record(format!("rename:{device}:{new_name}"));
        if let Some(message) = self.inner.lock().fail_rename.get(device.as_str()) {
            return Err(VolumeError::RenameFailed(message.clone()));
        }
        Ok(())
    }

    async fn resolve_renamed_path(
        &self,
        old_path: &DevicePath,
        expected_name: &str,
    ) -> Result<DevicePath, VolumeError> {
        self.record(format!("resolve:{old_path}:{expected_name}"));
        let suffix = self.inner.lock().resolve_suffix.clone();
        let parent = PathBuf::from(old_path.as_str())
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let resolved = parent.join(format!("{expected_name}{suffix}"));
        DevicePath::new(&resolved.to_string_lossy())
            .map_err(|e| VolumeError::NotFound(e.to_string()))
    }
}

#[async_trait]
impl TherapyOps for FakeBackend {
    async fn apply_therapy_profile(
        &self,
        device: &DevicePath,
        profile: &TherapyProfile,
    ) -> Result<TherapyStream, TherapyError> {
        self.record(format!("therapy:{device}:{}", profile.name));
        let failure = self.inner.lock().fail_therapy.get(device.as_str()).cloned();

        let mut items: Vec<Result<TherapyProgress, TherapyError>> = vec![Ok(TherapyProgress {
            phase: TherapyPhase::Sending,
            percent: 20,
            message: "Uploading profile".to_string(),
        })];
        match failure {
            Some(message) => items.push(Err(TherapyError::ApplyFailed(message))),
            None => {
                items.push(Ok(TherapyProgress {
                    phase: TherapyPhase::Sending,
                    percent: 70,
                    message: "Profile written".to_string(),
                }));
                items.push(Ok(TherapyProgress {
                    phase: TherapyPhase::Rebooting,
                    percent: 95,
                    message: "Rebooting device".to_string(),
                }));
            }
        }
        Ok(futures::stream::iter(items).boxed())
    }
}

/// Event sink that appends into a shared vector.
pub fn collecting_sink() -> (EventSink, Arc<Mutex<Vec<StageEvent>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink: EventSink = Arc::new(move |event| sink_seen.lock().push(event));
    (sink, seen)
}

/// Settings whose throttle forwards every event (no coalescing).
pub fn passthrough_settings() -> Settings {
    Settings {
        throttle: ThrottleSettings {
            min_interval: std::time::Duration::from_millis(0),
            min_change_percent: 0,
        },
        ..Settings::default()
    }
}

pub fn device(path: &str, role: Option<Role>) -> Device {
    let mut device = Device::new(DevicePath::new(path).unwrap(), format!("Device {path}"))
        .with_mode(DeviceMode::Bootloader);
    device.role = role;
    device
}

/// A minimal on-disk firmware bundle; keep the TempDir alive for the test.
pub fn fake_bundle() -> (tempfile::TempDir, FirmwareBundle) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("firmware.uf2"), b"uf2").unwrap();
    let bundle =
        FirmwareBundle::open(FirmwareVersion::new("1.2.3").unwrap(), dir.path()).unwrap();
    (dir, bundle)
}

/// A therapy profile for tests.
pub fn profile(name: &str) -> TherapyProfile {
    TherapyProfile {
        name: name.to_string(),
        advanced: serde_json::json!({ "volume": 40 }),
    }
}

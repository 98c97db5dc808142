// ABOUTME: Mass-storage backend for devices that mount as USB volumes.
// ABOUTME: Realizes erase/transfer/config/rename/therapy as filesystem operations.

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::error::BackendError;
use super::traits::{
    ConfigOps, ConfigWriteError, StorageError, StorageOps, TherapyError, TherapyOps,
    TherapyPhase, TherapyProgress, TherapyStream, TransferProgress, TransferStream, VolumeError,
    VolumeOps,
};
use crate::config::{CONFIG_FILENAME, TherapyProfile};
use crate::types::{Device, DeviceMode, DevicePath, Role};

/// Bootloader metadata files that must survive an erase. The bootloader
/// serves these read-only; deleting them fails on real hardware.
const PRESERVED_FILES: &[&str] = &["INFO_UF2.TXT", "INDEX.HTM"];

/// Marker file whose presence identifies a volume in bootloader mode.
const BOOTLOADER_MARKER: &str = "INFO_UF2.TXT";

/// Filename dropped on the device to hand over a therapy profile.
const THERAPY_FILENAME: &str = "therapy.json";

/// Marker file the device firmware treats as a reboot request.
const REBOOT_MARKER: &str = "REBOOT.TXT";

/// Backend for devices exposed as mounted mass-storage volumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MscBackend;

impl MscBackend {
    pub fn new() -> Self {
        Self
    }

    /// Inspect a mount point and build the device value object for it.
    ///
    /// The label is the mount directory name; the mode is read off the
    /// bootloader marker file.
    pub async fn probe(&self, path: &DevicePath) -> Result<Device, BackendError> {
        let mount = Path::new(path.as_str());
        let metadata = tokio::fs::metadata(mount).await.map_err(|e| {
            BackendError::Probe {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })?;
        if !metadata.is_dir() {
            return Err(BackendError::Probe {
                path: path.to_string(),
                reason: "not a mounted directory".to_string(),
            });
        }

        let label = mount
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());

        let mode = if tokio::fs::try_exists(mount.join(BOOTLOADER_MARKER))
            .await
            .unwrap_or(false)
        {
            DeviceMode::Bootloader
        } else {
            DeviceMode::Application
        };

        Ok(Device::new(path.clone(), label).with_mode(mode))
    }
}

/// Collect every file under `root`, relative to it, in stable order.
fn collect_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                stack.push(path);
            } else if let Ok(rel) = path.strip_prefix(root) {
                files.push(rel.to_path_buf());
            }
        }
    }
    files.sort();
    Ok(files)
}

#[async_trait]
impl StorageOps for MscBackend {
    async fn erase(&self, device: &DevicePath) -> Result<(), StorageError> {
        let mount = Path::new(device.as_str());
        let mut entries = tokio::fs::read_dir(mount)
            .await
            .map_err(|e| StorageError::DeviceNotFound(format!("{device}: {e}")))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::EraseFailed(e.to_string()))?
        {
            let name = entry.file_name();
            if PRESERVED_FILES.iter().any(|p| name.eq_ignore_ascii_case(p)) {
                continue;
            }
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StorageError::EraseFailed(e.to_string()))?;
            let removed = if file_type.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            removed.map_err(|e| {
                StorageError::EraseFailed(format!("{}: {e}", path.display()))
            })?;
        }
        Ok(())
    }

    async fn transfer_firmware(
        &self,
        firmware: &Path,
        device: &DevicePath,
    ) -> Result<TransferStream, StorageError> {
        let mount = PathBuf::from(device.as_str());
        if !tokio::fs::try_exists(&mount).await.unwrap_or(false) {
            return Err(StorageError::DeviceNotFound(device.to_string()));
        }

        let source = firmware.to_path_buf();
        let files = {
            let source = source.clone();
            tokio::task::spawn_blocking(move || collect_files(&source))
                .await
                .map_err(|e| StorageError::TransferFailed(e.to_string()))?
                .map_err(|e| StorageError::TransferFailed(e.to_string()))?
        };

        let total_files = files.len() as u32;
        let (mut tx, rx) = mpsc::unbounded();

        tokio::spawn(async move {
            let mut completed: u32 = 0;
            for rel in files {
                let from = source.join(&rel);
                let to = mount.join(&rel);
                if let Some(parent) = to.parent() {
                    if let Err(e) = tokio::fs::create_dir_all(parent).await {
                        let _ = tx.start_send(Err(StorageError::TransferFailed(format!(
                            "{}: {e}",
                            parent.display()
                        ))));
                        return;
                    }
                }
                if let Err(e) = tokio::fs::copy(&from, &to).await {
                    let _ = tx.start_send(Err(StorageError::TransferFailed(format!(
                        "{}: {e}",
                        rel.display()
                    ))));
                    return;
                }
                completed += 1;
                let _ = tx.start_send(Ok(TransferProgress {
                    current_file: rel.to_string_lossy().into_owned(),
                    total_files,
                    completed_files: completed,
                }));
            }
        });

        Ok(rx.boxed())
    }
}

#[async_trait]
impl ConfigOps for MscBackend {
    async fn write_config(
        &self,
        device: &DevicePath,
        _role: Role,
        content: &str,
    ) -> Result<(), ConfigWriteError> {
        let mount = Path::new(device.as_str());
        if !tokio::fs::try_exists(mount).await.unwrap_or(false) {
            return Err(ConfigWriteError::DeviceNotFound(device.to_string()));
        }
        tokio::fs::write(mount.join(CONFIG_FILENAME), content)
            .await
            .map_err(|e| ConfigWriteError::WriteFailed(e.to_string()))
    }
}

#[async_trait]
impl VolumeOps for MscBackend {
    async fn rename_volume(
        &self,
        device: &DevicePath,
        new_name: &str,
    ) -> Result<(), VolumeError> {
        let output = if cfg!(target_os = "macos") {
            Command::new("diskutil")
                .args(["rename", device.as_str(), new_name])
                .output()
                .await
        } else if cfg!(target_os = "linux") {
            let source = Command::new("findmnt")
                .args(["-n", "-o", "SOURCE", device.as_str()])
                .output()
                .await
                .map_err(|e| VolumeError::RenameFailed(e.to_string()))?;
            if !source.status.success() {
                return Err(VolumeError::RenameFailed(format!(
                    "findmnt failed for {device}"
                )));
            }
            let block_dev = String::from_utf8_lossy(&source.stdout).trim().to_string();
            Command::new("fatlabel")
                .args([&block_dev, new_name])
                .output()
                .await
        } else {
            return Err(VolumeError::Unsupported(
                std::env::consts::OS.to_string(),
            ));
        };

        let output = output.map_err(|e| VolumeError::RenameFailed(e.to_string()))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(VolumeError::RenameFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }

    async fn resolve_renamed_path(
        &self,
        old_path: &DevicePath,
        expected_name: &str,
    ) -> Result<DevicePath, VolumeError> {
        let parent = match Path::new(old_path.as_str()).parent() {
            Some(parent) => parent.to_path_buf(),
            None => return Err(VolumeError::NotFound(expected_name.to_string())),
        };

        // Hosts append " 1", " 2", ... when the label collides with an
        // existing mount directory.
        let mut candidates = vec![expected_name.to_string()];
        for suffix in 1..=9 {
            candidates.push(format!("{expected_name} {suffix}"));
        }

        for candidate in candidates {
            let path = parent.join(&candidate);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return DevicePath::new(&path.to_string_lossy())
                    .map_err(|e| VolumeError::NotFound(e.to_string()));
            }
        }
        Err(VolumeError::NotFound(expected_name.to_string()))
    }
}

#[async_trait]
impl TherapyOps for MscBackend {
    async fn apply_therapy_profile(
        &self,
        device: &DevicePath,
        profile: &TherapyProfile,
    ) -> Result<TherapyStream, TherapyError> {
        let mount = PathBuf::from(device.as_str());
        let payload = serde_json::to_vec_pretty(profile)
            .map_err(|e| TherapyError::ApplyFailed(e.to_string()))?;
        let device_name = device.to_string();

        let (mut tx, rx) = mpsc::unbounded();
        tokio::spawn(async move {
            let _ = tx.start_send(Ok(TherapyProgress {
                phase: TherapyPhase::Connecting,
                percent: 0,
                message: "Connecting to device".to_string(),
            }));
            if !tokio::fs::try_exists(&mount).await.unwrap_or(false) {
                let _ = tx.start_send(Err(TherapyError::DeviceNotFound(device_name)));
                return;
            }

            let _ = tx.start_send(Ok(TherapyProgress {
                phase: TherapyPhase::Sending,
                percent: 30,
                message: "Sending therapy profile".to_string(),
            }));
            if let Err(e) = tokio::fs::write(mount.join(THERAPY_FILENAME), &payload).await {
                let _ = tx.start_send(Err(TherapyError::ApplyFailed(e.to_string())));
                return;
            }
            let _ = tx.start_send(Ok(TherapyProgress {
                phase: TherapyPhase::Sending,
                percent: 80,
                message: "Profile written".to_string(),
            }));

            let _ = tx.start_send(Ok(TherapyProgress {
                phase: TherapyPhase::Rebooting,
                percent: 95,
                message: "Rebooting device".to_string(),
            }));
            if let Err(e) = tokio::fs::write(mount.join(REBOOT_MARKER), b"reboot\n").await {
                let _ = tx.start_send(Err(TherapyError::ApplyFailed(e.to_string())));
            }
        });

        Ok(rx.boxed())
    }
}

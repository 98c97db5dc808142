// ABOUTME: Device lock to prevent concurrent deployments to the same device.
// ABOUTME: Atomic lock-file creation under the OS temp dir with holder info as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;

use super::error::InstallError;
use crate::types::DevicePath;

/// Directory under the OS temp dir holding perista lock files.
const LOCK_DIR: &str = "perista-locks";

/// Information about who holds a device lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Device being deployed to.
    pub device: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(device: &DevicePath) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            device: device.to_string(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    /// Path to the lock file for a device.
    pub fn lock_path(device: &DevicePath) -> PathBuf {
        let sanitized: String = device
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        std::env::temp_dir()
            .join(LOCK_DIR)
            .join(format!("{sanitized}.lock"))
    }
}

/// A held device lock. Released explicitly after the device's sequence ends.
pub struct DeviceLock {
    path: PathBuf,
    device: DevicePath,
}

impl std::fmt::Debug for DeviceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLock")
            .field("device", &self.device)
            .finish()
    }
}

impl DeviceLock {
    /// Acquire a lock for the given device.
    ///
    /// Uses `create_new` for atomic acquisition (no TOCTOU race). Returns
    /// an error if the lock is held by another live process. Auto-breaks
    /// stale (>1 hour) and corrupted locks with a warning.
    pub fn acquire(device: &DevicePath, force: bool) -> Result<Self, InstallError> {
        let path = LockInfo::lock_path(device);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                InstallError::lock_error(format!("failed to create lock directory: {e}"))
            })?;
        }

        if Self::try_create(&path, device)? {
            return Ok(Self {
                path,
                device: device.clone(),
            });
        }

        // Lock file exists - decide whether to break it.
        if !Self::check_existing_lock(&path, force)? {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| InstallError::lock_error(format!("failed to read lock info: {e}")))?;
            if let Ok(existing) = serde_json::from_str::<LockInfo>(&contents) {
                return Err(InstallError::lock_held(
                    existing.holder,
                    existing.pid,
                    existing.started_at,
                ));
            }
            return Err(InstallError::lock_error("lock held by another process"));
        }

        tracing::debug!("Removing stale/forced lock at {}", path.display());
        let _ = std::fs::remove_file(&path);

        if Self::try_create(&path, device)? {
            Ok(Self {
                path,
                device: device.clone(),
            })
        } else {
            Err(InstallError::lock_error(
                "lock acquired by another process during break",
            ))
        }
    }

    /// Atomically create the lock file. Ok(false) when it already exists.
    fn try_create(path: &PathBuf, device: &DevicePath) -> Result<bool, InstallError> {
        let info = LockInfo::new(device);
        let json = serde_json::to_string(&info)
            .map_err(|e| InstallError::lock_error(format!("failed to serialize lock: {e}")))?;

        let created = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path);
        match created {
            Ok(mut file) => {
                use std::io::Write;
                file.write_all(json.as_bytes()).map_err(|e| {
                    InstallError::lock_error(format!("failed to write lock info: {e}"))
                })?;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(InstallError::lock_error(format!(
                "failed to acquire lock: {e}"
            ))),
        }
    }

    /// Check if an existing lock should be broken (stale, forced, or corrupted).
    fn check_existing_lock(path: &PathBuf, force: bool) -> Result<bool, InstallError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                tracing::warn!("Lock info unreadable, breaking lock");
                return Ok(true);
            }
        };

        match serde_json::from_str::<LockInfo>(&contents) {
            Ok(existing) => {
                if force {
                    tracing::warn!(
                        "Breaking lock held by {} (pid {}) since {}",
                        existing.holder,
                        existing.pid,
                        existing.started_at
                    );
                    Ok(true)
                } else if existing.is_stale() {
                    tracing::warn!(
                        "Auto-breaking stale lock held by {} (pid {}) since {}",
                        existing.holder,
                        existing.pid,
                        existing.started_at
                    );
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Err(_) => {
                tracing::warn!("Lock info corrupted, breaking lock");
                Ok(true)
            }
        }
    }

    /// Release the lock.
    pub fn release(self) -> Result<(), InstallError> {
        std::fs::remove_file(&self.path)
            .map_err(|e| InstallError::lock_error(format!("failed to release lock: {e}")))
    }
}

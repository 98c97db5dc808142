// ABOUTME: Batch coordinator: runs the per-device sequence across a selection.
// ABOUTME: Strictly sequential; one device's failure never aborts the batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::InstallError;
use super::event::{DeviceUpdateResult, EventSink, Stage, StageEvent, UpdateResult};
use super::lock::DeviceLock;
use super::sequencer::{run_install, run_therapy};
use super::throttle::ProgressThrottle;
use crate::backend::{ConfigOps, StorageOps, TherapyOps, VolumeOps};
use crate::config::{Settings, TherapyProfile};
use crate::diagnostics::{Diagnostics, Warning};
use crate::types::{Batch, Device, FirmwareBundle};

/// Operator-level "skip remaining devices" flag, checked only at the
/// per-device loop boundary (never mid-sequence).
pub type SkipFlag = Arc<AtomicBool>;

/// Runs device sequences against an injected backend.
///
/// Devices share a host bus, so batches are processed one device at a
/// time. There is no mid-sequence cancellation: once a device's sequence
/// starts it runs to a terminal state.
#[derive(Debug)]
pub struct Coordinator<B> {
    backend: B,
    settings: Settings,
}

impl<B> Coordinator<B> {
    pub fn new(backend: B, settings: Settings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn skipped(&self, device: &Device) -> DeviceUpdateResult {
        tracing::info!(device = %device.path, "skipping remaining device at operator request");
        DeviceUpdateResult::failed(device.clone(), InstallError::Skipped.to_string())
    }

    fn lock_device(
        device: &Device,
        force: bool,
        sink: &EventSink,
    ) -> Result<DeviceLock, DeviceUpdateResult> {
        DeviceLock::acquire(&device.path, force).map_err(|e| {
            sink(StageEvent::new(
                device.path.clone(),
                Stage::Error,
                0,
                e.to_string(),
            ));
            DeviceUpdateResult::failed(device.clone(), e.to_string())
        })
    }

    fn unlock_device(lock: DeviceLock, device: &Device, diag: &mut Diagnostics) {
        if let Err(e) = lock.release() {
            diag.warn(Warning::lock_release(format!(
                "failed to release lock for {}: {e}",
                device.path
            )));
        }
    }

    fn finish_device(device: &Device, result: Result<(), InstallError>) -> DeviceUpdateResult {
        match result {
            Ok(()) => DeviceUpdateResult::succeeded(device.clone()),
            Err(e) => {
                tracing::warn!(device = %device.path, "device update failed: {e}");
                DeviceUpdateResult::failed(device.clone(), e.to_string())
            }
        }
    }
}

impl<B> Coordinator<B>
where
    B: StorageOps + ConfigOps + VolumeOps,
{
    /// Deploy firmware to every device in the batch, sequentially.
    ///
    /// Always returns a result covering every device in the batch: fatal
    /// per-device errors are caught into that device's entry and the loop
    /// continues with the next device.
    pub async fn perform_batch_update(
        &self,
        batch: &Batch,
        firmware: &FirmwareBundle,
        sink: EventSink,
        skip: &SkipFlag,
        force: bool,
        diag: &mut Diagnostics,
    ) -> UpdateResult {
        let mut updates = Vec::with_capacity(batch.len());
        for device in batch.iter() {
            if skip.load(Ordering::SeqCst) {
                updates.push(self.skipped(device));
                continue;
            }

            let lock = match Self::lock_device(device, force, &sink) {
                Ok(lock) => lock,
                Err(update) => {
                    updates.push(update);
                    continue;
                }
            };

            let throttle = ProgressThrottle::new(Arc::clone(&sink), &self.settings.throttle);
            let result = run_install(
                &self.backend,
                device,
                firmware,
                &self.settings,
                &throttle,
                diag,
            )
            .await
            .map(|_outcome| ());
            // Terminal events are stage changes and pass straight through,
            // but the flush contract holds regardless.
            throttle.flush();

            Self::unlock_device(lock, device, diag);
            updates.push(Self::finish_device(device, result));
        }
        UpdateResult::from_device_updates(updates)
    }
}

impl<B: TherapyOps> Coordinator<B> {
    /// Apply a therapy profile to every device in the batch, sequentially,
    /// under the same result model as a firmware batch.
    pub async fn perform_batch_configure(
        &self,
        batch: &Batch,
        profile: &TherapyProfile,
        sink: EventSink,
        skip: &SkipFlag,
        force: bool,
        diag: &mut Diagnostics,
    ) -> UpdateResult {
        let mut updates = Vec::with_capacity(batch.len());
        for device in batch.iter() {
            if skip.load(Ordering::SeqCst) {
                updates.push(self.skipped(device));
                continue;
            }

            let lock = match Self::lock_device(device, force, &sink) {
                Ok(lock) => lock,
                Err(update) => {
                    updates.push(update);
                    continue;
                }
            };

            let throttle = ProgressThrottle::new(Arc::clone(&sink), &self.settings.throttle);
            let result = run_therapy(&self.backend, device, profile, &throttle).await;
            throttle.flush();

            Self::unlock_device(lock, device, diag);
            updates.push(Self::finish_device(device, result));
        }
        UpdateResult::from_device_updates(updates)
    }
}

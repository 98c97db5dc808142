// ABOUTME: Per-device stage sequencer: erase, transfer, configure, optionally rename.
// ABOUTME: Typestate transitions emit throttled stage events; drivers translate failures.

use futures::StreamExt;

use super::error::InstallError;
use super::event::{Stage, StageEvent};
use super::state::{Configured, Copied, Idle, RenamedVolume, Wiped};
use super::throttle::ProgressThrottle;
use crate::backend::{
    ConfigOps, StorageOps, TherapyOps, TherapyPhase, TransferProgress, VolumeError, VolumeOps,
};
use crate::config::{Settings, TherapyProfile, config_for_role};
use crate::diagnostics::{Diagnostics, Warning};
use crate::types::{Device, FirmwareBundle, Role};

/// A firmware install in progress on one device, parameterized by state.
///
/// Construction validates the role precondition, so a device with no
/// assigned role fails before any backend call is made.
#[derive(Debug)]
pub struct Install<'a, S> {
    device: &'a Device,
    firmware: &'a FirmwareBundle,
    settings: &'a Settings,
    role: Role,
    state: S,
}

/// What a completed install produced beyond the firmware itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub renamed: Option<RenamedVolume>,
}

impl<'a> Install<'a, Idle> {
    /// Begin an install for one device.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::RoleNotSet` when the device has no assigned
    /// role; nothing has touched the device at that point.
    pub fn new(
        device: &'a Device,
        firmware: &'a FirmwareBundle,
        settings: &'a Settings,
    ) -> Result<Self, InstallError> {
        let role = device.role.ok_or(InstallError::RoleNotSet)?;
        Ok(Self {
            device,
            firmware,
            settings,
            role,
            state: Idle,
        })
    }
}

impl<'a, S> Install<'a, S> {
    fn transition<T>(self, state: T) -> Install<'a, T> {
        Install {
            device: self.device,
            firmware: self.firmware,
            settings: self.settings,
            role: self.role,
            state,
        }
    }

    fn event(&self, stage: Stage, progress: u8, message: impl Into<String>) -> StageEvent {
        StageEvent::new(self.device.path.clone(), stage, progress, message)
    }

    /// Progress value for the rename event: halfway into the headroom the
    /// copy stage leaves above `copy_weight`.
    fn rename_progress(&self) -> u8 {
        let copy_weight = self.settings.copy_weight;
        copy_weight + (100 - copy_weight) / 2
    }
}

impl<'a> Install<'a, Idle> {
    /// Erase the device. FATAL on failure.
    #[must_use = "install state must be used"]
    pub async fn erase<B: StorageOps>(
        self,
        backend: &B,
        progress: &ProgressThrottle,
    ) -> Result<Install<'a, Wiped>, InstallError> {
        progress.offer(self.event(Stage::Wiping, 0, "Erasing device"));
        backend
            .erase(&self.device.path)
            .await
            .map_err(InstallError::erase)?;
        Ok(self.transition(Wiped))
    }
}

impl<'a> Install<'a, Wiped> {
    /// Transfer the firmware bundle, relaying streamed progress. FATAL on failure.
    #[must_use = "install state must be used"]
    pub async fn transfer<B: StorageOps>(
        self,
        backend: &B,
        progress: &ProgressThrottle,
    ) -> Result<Install<'a, Copied>, InstallError> {
        progress.offer(self.event(Stage::Copying, 0, "Copying firmware"));
        let mut stream = backend
            .transfer_firmware(&self.firmware.path, &self.device.path)
            .await
            .map_err(InstallError::transfer)?;

        let copy_weight = self.settings.copy_weight;
        while let Some(item) = stream.next().await {
            let tick = item.map_err(InstallError::transfer)?;
            let percent = copy_progress(&tick, copy_weight);
            progress.offer(
                self.event(Stage::Copying, percent, format!("Copying {}", tick.current_file))
                    .with_current_file(tick.current_file),
            );
        }
        Ok(self.transition(Copied))
    }
}

impl<'a> Install<'a, Copied> {
    /// Write the role configuration, then attempt the cosmetic rename.
    ///
    /// The config write is FATAL. The rename is the one designated
    /// non-fatal step: its failure is logged and recorded as a warning,
    /// and the install still completes without the new label/path fields.
    #[must_use = "install state must be used"]
    pub async fn configure<B: ConfigOps + VolumeOps>(
        self,
        backend: &B,
        progress: &ProgressThrottle,
        diag: &mut Diagnostics,
    ) -> Result<Install<'a, Configured>, InstallError> {
        let copy_weight = self.settings.copy_weight;
        progress.offer(self.event(Stage::Configuring, copy_weight, "Writing configuration"));
        backend
            .write_config(&self.device.path, self.role, config_for_role(self.role))
            .await?;

        let renamed = match self.rename(backend).await {
            Ok(renamed) => {
                progress.offer(
                    self.event(
                        Stage::Configuring,
                        self.rename_progress(),
                        format!("Renamed volume to {}", renamed.label),
                    )
                    .with_renamed(renamed.label.clone(), renamed.path.clone()),
                );
                Some(renamed)
            }
            Err(e) => {
                tracing::warn!(device = %self.device.path, "volume rename failed: {e}");
                diag.warn(Warning::volume_rename(format!(
                    "volume rename failed for {}: {e}",
                    self.device.path
                )));
                None
            }
        };

        Ok(self.transition(Configured { renamed }))
    }

    async fn rename<B: VolumeOps>(&self, backend: &B) -> Result<RenamedVolume, VolumeError> {
        let label = self.settings.label_for(self.role).to_string();
        backend.rename_volume(&self.device.path, &label).await?;
        let path = backend
            .resolve_renamed_path(&self.device.path, &label)
            .await?;
        Ok(RenamedVolume { label, path })
    }
}

impl Install<'_, Configured> {
    /// Emit the terminal `complete` event and hand back the outcome.
    pub fn finish(self, progress: &ProgressThrottle) -> InstallOutcome {
        progress.offer(self.event(Stage::Complete, 100, "Update complete"));
        InstallOutcome {
            renamed: self.state.renamed,
        }
    }
}

/// Stage progress during the copy phase, capped at `copy_weight`.
fn copy_progress(tick: &TransferProgress, copy_weight: u8) -> u8 {
    if tick.total_files == 0 {
        return 0;
    }
    let scaled =
        u64::from(tick.completed_files) * u64::from(copy_weight) / u64::from(tick.total_files);
    scaled.min(u64::from(copy_weight)) as u8
}

/// Run the full firmware sequence for one device.
///
/// Any fatal failure is translated into a terminal `error` event carrying
/// the error's message verbatim, then returned to the caller.
pub async fn run_install<B>(
    backend: &B,
    device: &Device,
    firmware: &FirmwareBundle,
    settings: &Settings,
    progress: &ProgressThrottle,
    diag: &mut Diagnostics,
) -> Result<InstallOutcome, InstallError>
where
    B: StorageOps + ConfigOps + VolumeOps,
{
    let result: Result<InstallOutcome, InstallError> = async {
        let install = Install::new(device, firmware, settings)?;
        let install = install.erase(backend, progress).await?;
        let install = install.transfer(backend, progress).await?;
        let install = install.configure(backend, progress, diag).await?;
        Ok(install.finish(progress))
    }
    .await;

    if let Err(ref e) = result {
        emit_error(progress, device, e);
    }
    result
}

/// Run the therapy-configuration sequence for one device.
///
/// Relay-only: the backend's single apply call streams its own
/// stage/percent/message notifications; this driver maps and throttles them.
pub async fn run_therapy<B: TherapyOps>(
    backend: &B,
    device: &Device,
    profile: &TherapyProfile,
    progress: &ProgressThrottle,
) -> Result<(), InstallError> {
    let result: Result<(), InstallError> = async {
        progress.offer(StageEvent::new(
            device.path.clone(),
            Stage::Connecting,
            0,
            "Connecting to device",
        ));
        let mut stream = backend.apply_therapy_profile(&device.path, profile).await?;
        while let Some(item) = stream.next().await {
            let tick = item?;
            progress.offer(StageEvent::new(
                device.path.clone(),
                stage_for_phase(tick.phase),
                tick.percent,
                tick.message,
            ));
        }
        progress.offer(StageEvent::new(
            device.path.clone(),
            Stage::Complete,
            100,
            "Therapy profile applied",
        ));
        Ok(())
    }
    .await;

    if let Err(ref e) = result {
        emit_error(progress, device, e);
    }
    result
}

fn stage_for_phase(phase: TherapyPhase) -> Stage {
    match phase {
        TherapyPhase::Connecting => Stage::Connecting,
        TherapyPhase::Sending => Stage::Sending,
        TherapyPhase::Rebooting => Stage::Rebooting,
    }
}

fn emit_error(progress: &ProgressThrottle, device: &Device, error: &InstallError) {
    let at = progress.last_progress().unwrap_or(0);
    progress.offer(StageEvent::new(
        device.path.clone(),
        Stage::Error,
        at,
        error.to_string(),
    ));
}

// ABOUTME: Firmware-update wizard: release selection, device selection, install, done.
// ABOUTME: Gates navigation on step readiness; folds orchestrator events for display.

use std::collections::HashMap;

use crate::deploy::{StageEvent, UpdateResult};
use crate::types::{Device, FirmwareVersion};

/// Highest reachable step in the firmware flow.
pub const FIRMWARE_MAX_STEP: usize = 3;

/// Steps of the firmware-update flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareStep {
    SelectRelease,
    SelectDevices,
    Installing,
    Complete,
}

impl FirmwareStep {
    fn from_index(index: usize) -> Self {
        match index {
            0 => FirmwareStep::SelectRelease,
            1 => FirmwareStep::SelectDevices,
            2 => FirmwareStep::Installing,
            _ => FirmwareStep::Complete,
        }
    }
}

/// State of one pass through the firmware-update flow.
///
/// Consumes orchestrator output via `record_event`/`record_result`; never
/// drives the deployment itself.
#[derive(Debug, Default)]
pub struct FirmwareWizard {
    step: usize,
    selected_release: Option<FirmwareVersion>,
    selected_devices: Vec<Device>,
    device_events: HashMap<String, StageEvent>,
    result: Option<UpdateResult>,
    log: Vec<String>,
}

impl FirmwareWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> FirmwareStep {
        FirmwareStep::from_index(self.step)
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    /// Jump to a step, clamped to the valid range.
    pub fn set_step(&mut self, step: usize) {
        self.step = step.min(FIRMWARE_MAX_STEP);
    }

    /// Whether the current step's readiness predicate passes.
    pub fn can_advance(&self) -> bool {
        match self.step() {
            FirmwareStep::SelectRelease => self.selected_release.is_some(),
            FirmwareStep::SelectDevices => {
                !self.selected_devices.is_empty()
                    && self.selected_devices.iter().all(Device::has_role)
            }
            // Installing and Complete have no manual forward navigation.
            FirmwareStep::Installing | FirmwareStep::Complete => false,
        }
    }

    /// Advance one step when the readiness predicate allows it.
    pub fn next(&mut self) -> bool {
        if self.can_advance() && self.step < FIRMWARE_MAX_STEP {
            self.step += 1;
            true
        } else {
            false
        }
    }

    /// Go back one step. Only device selection is reversible; once the
    /// install starts the flow cannot be rewound.
    pub fn previous(&mut self) -> bool {
        if self.step() == FirmwareStep::SelectDevices {
            self.step -= 1;
            true
        } else {
            false
        }
    }

    /// Restore the initial snapshot: selections, events, result, log.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn select_release(&mut self, version: FirmwareVersion) {
        self.selected_release = Some(version);
    }

    pub fn selected_release(&self) -> Option<&FirmwareVersion> {
        self.selected_release.as_ref()
    }

    pub fn select_devices(&mut self, devices: Vec<Device>) {
        self.selected_devices = devices;
    }

    pub fn selected_devices(&self) -> &[Device] {
        &self.selected_devices
    }

    /// Fold one orchestrator event into the per-device display state.
    pub fn record_event(&mut self, event: StageEvent) {
        self.log.push(format!(
            "{}: {} {}% {}",
            event.device_path, event.stage, event.progress, event.message
        ));
        self.device_events
            .insert(event.device_path.to_string(), event);
    }

    /// Latest event observed for a device, if any.
    pub fn device_event(&self, device_path: &str) -> Option<&StageEvent> {
        self.device_events.get(device_path)
    }

    /// Store the frozen batch result and move to the final step.
    pub fn record_result(&mut self, result: UpdateResult) {
        self.result = Some(result);
        self.step = FIRMWARE_MAX_STEP;
    }

    pub fn result(&self) -> Option<&UpdateResult> {
        self.result.as_ref()
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }
}

// ABOUTME: Therapy-configuration wizard: profile selection, device selection, result.
// ABOUTME: Mirrors the firmware flow's guard pattern with a shorter step range.

use std::collections::HashMap;

use crate::config::TherapyProfile;
use crate::deploy::{StageEvent, UpdateResult};
use crate::types::Device;

/// Highest reachable step in the therapy flow.
pub const THERAPY_MAX_STEP: usize = 2;

/// Steps of the therapy-configuration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TherapyStep {
    SelectProfile,
    SelectDevices,
    Configuring,
}

impl TherapyStep {
    fn from_index(index: usize) -> Self {
        match index {
            0 => TherapyStep::SelectProfile,
            1 => TherapyStep::SelectDevices,
            _ => TherapyStep::Configuring,
        }
    }
}

/// State of one pass through the therapy-configuration flow.
#[derive(Debug, Default)]
pub struct TherapyWizard {
    step: usize,
    selected_profile: Option<TherapyProfile>,
    selected_devices: Vec<Device>,
    device_events: HashMap<String, StageEvent>,
    result: Option<UpdateResult>,
    log: Vec<String>,
}

impl TherapyWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> TherapyStep {
        TherapyStep::from_index(self.step)
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    /// Jump to a step, clamped to the valid range.
    pub fn set_step(&mut self, step: usize) {
        self.step = step.min(THERAPY_MAX_STEP);
    }

    /// Whether the current step's readiness predicate passes.
    ///
    /// Profiles are role-agnostic, so device selection only requires a
    /// non-empty selection here.
    pub fn can_advance(&self) -> bool {
        match self.step() {
            TherapyStep::SelectProfile => self.selected_profile.is_some(),
            TherapyStep::SelectDevices => !self.selected_devices.is_empty(),
            TherapyStep::Configuring => false,
        }
    }

    /// Advance one step when the readiness predicate allows it.
    pub fn next(&mut self) -> bool {
        if self.can_advance() && self.step < THERAPY_MAX_STEP {
            self.step += 1;
            true
        } else {
            false
        }
    }

    /// Go back one step. The configuring step is non-reversible.
    pub fn previous(&mut self) -> bool {
        if self.step() == TherapyStep::SelectDevices {
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

    pub fn select_profile(&mut self, profile: TherapyProfile) {
        self.selected_profile = Some(profile);
    }

    pub fn selected_profile(&self) -> Option<&TherapyProfile> {
        self.selected_profile.as_ref()
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

    /// Store the frozen batch result; the flow stays on the result step.
    pub fn record_result(&mut self, result: UpdateResult) {
        self.result = Some(result);
        self.step = THERAPY_MAX_STEP;
    }

    pub fn result(&self) -> Option<&UpdateResult> {
        self.result.as_ref()
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_without_profile() {
        let mut wizard = TherapyWizard::new();
        assert!(!wizard.next());
        wizard.select_profile(TherapyProfile {
            name: "evening".to_string(),
            advanced: serde_json::Value::Null,
        });
        assert!(wizard.next());
        assert_eq!(wizard.step(), TherapyStep::SelectDevices);
    }

    #[test]
    fn configuring_is_terminal_for_navigation() {
        let mut wizard = TherapyWizard::new();
        wizard.set_step(2);
        assert!(!wizard.next());
        assert!(!wizard.previous());
    }
}

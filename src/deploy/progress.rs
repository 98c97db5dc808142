// ABOUTME: Weighted overall-progress aggregation across download and install phases.
// ABOUTME: Pure recomputation from per-device state; nothing here is persisted.

use std::collections::HashMap;

use super::event::{Stage, StageEvent};
use crate::types::DevicePath;

/// Share of the displayed bar occupied by the download phase.
const DOWNLOAD_WEIGHT: f64 = 0.2;

/// Share of the displayed bar occupied by the per-device install phase.
const INSTALL_WEIGHT: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default)]
struct DeviceProgress {
    percent: u8,
    complete: bool,
}

/// Combines one download percentage and N per-device install percentages
/// into a single 0-100 scalar.
#[derive(Debug, Default)]
pub struct OverallProgress {
    download_percent: u8,
    installing: bool,
    devices: HashMap<String, DeviceProgress>,
}

impl OverallProgress {
    /// Start tracking the given devices, each at zero progress.
    pub fn new<'a>(devices: impl IntoIterator<Item = &'a DevicePath>) -> Self {
        Self {
            download_percent: 0,
            installing: false,
            devices: devices
                .into_iter()
                .map(|path| (path.to_string(), DeviceProgress::default()))
                .collect(),
        }
    }

    /// Record download progress (0-100). Only meaningful before install.
    pub fn set_download(&mut self, percent: u8) {
        self.download_percent = percent.min(100);
    }

    /// Switch to the install phase. Also implied by the first observed event.
    pub fn begin_install(&mut self) {
        self.installing = true;
    }

    /// Fold one relayed stage event into the per-device state.
    ///
    /// Errored devices keep their last known progress so a late failure
    /// does not retroactively collapse the bar.
    pub fn observe(&mut self, event: &StageEvent) {
        self.installing = true;
        let entry = self
            .devices
            .entry(event.device_path.to_string())
            .or_default();
        match event.stage {
            Stage::Complete => {
                entry.percent = 100;
                entry.complete = true;
            }
            Stage::Error => {}
            _ => entry.percent = event.progress,
        }
    }

    /// Current overall percentage.
    pub fn overall(&self) -> u8 {
        if !self.installing {
            return (f64::from(self.download_percent) * DOWNLOAD_WEIGHT).round() as u8;
        }
        if !self.devices.is_empty() && self.devices.values().all(|d| d.complete) {
            return 100;
        }
        let mean = if self.devices.is_empty() {
            0.0
        } else {
            let sum: f64 = self.devices.values().map(|d| f64::from(d.percent)).sum();
            sum / self.devices.len() as f64
        };
        (DOWNLOAD_WEIGHT * 100.0 + mean * INSTALL_WEIGHT).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> DevicePath {
        DevicePath::new(p).unwrap()
    }

    fn event(p: &str, stage: Stage, progress: u8) -> StageEvent {
        StageEvent::new(path(p), stage, progress, "tick")
    }

    #[test]
    fn download_phase_occupies_first_fifth() {
        let mut overall = OverallProgress::new([&path("/a")]);
        overall.set_download(50);
        assert_eq!(overall.overall(), 10);
        overall.set_download(100);
        assert_eq!(overall.overall(), 20);
    }

    #[test]
    fn install_phase_averages_devices() {
        let mut overall = OverallProgress::new([&path("/a"), &path("/b")]);
        overall.begin_install();
        overall.observe(&event("/a", Stage::Copying, 40));
        // /a at 40, /b at 0 -> mean 20 -> 20 + 16 = 36
        assert_eq!(overall.overall(), 36);
    }

    #[test]
    fn single_device_copy_example() {
        let mut overall = OverallProgress::new([&path("/a")]);
        overall.observe(&event("/a", Stage::Copying, 40));
        assert_eq!(overall.overall(), 52);
    }

    #[test]
    fn all_complete_pins_hundred() {
        let mut overall = OverallProgress::new([&path("/a"), &path("/b")]);
        overall.observe(&event("/a", Stage::Complete, 100));
        overall.observe(&event("/b", Stage::Complete, 100));
        assert_eq!(overall.overall(), 100);
    }

    #[test]
    fn error_keeps_last_known_progress() {
        let mut overall = OverallProgress::new([&path("/a")]);
        overall.observe(&event("/a", Stage::Copying, 60));
        overall.observe(&event("/a", Stage::Error, 0));
        assert_eq!(overall.overall(), 20 + 48);
    }

    #[test]
    fn no_devices_average_is_zero() {
        let mut overall = OverallProgress::new(std::iter::empty());
        overall.begin_install();
        assert_eq!(overall.overall(), 20);
    }
}

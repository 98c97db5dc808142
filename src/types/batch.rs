// ABOUTME: Validated device selection for one deployment batch.
// ABOUTME: Non-empty, at most two devices, unique connection paths.

use nonempty::NonEmpty;
use thiserror::Error;

use super::{Device, DevicePath};

/// Devices share a host bus, so a batch is capped at a connected pair.
pub const MAX_BATCH_DEVICES: usize = 2;

#[derive(Debug, Error)]
pub enum BatchSelectionError {
    #[error("no devices selected")]
    Empty,

    #[error("too many devices selected: {0} (maximum {MAX_BATCH_DEVICES})")]
    TooMany(usize),

    #[error("duplicate device path: {0}")]
    DuplicatePath(DevicePath),
}

/// The device selection for one run of the deployment sequence.
///
/// Iteration order is selection order; the coordinator processes devices
/// strictly in this order.
#[derive(Debug, Clone)]
pub struct Batch {
    devices: NonEmpty<Device>,
}

impl Batch {
    pub fn new(devices: Vec<Device>) -> Result<Self, BatchSelectionError> {
        if devices.len() > MAX_BATCH_DEVICES {
            return Err(BatchSelectionError::TooMany(devices.len()));
        }
        for (i, device) in devices.iter().enumerate() {
            if devices[..i].iter().any(|d| d.path == device.path) {
                return Err(BatchSelectionError::DuplicatePath(device.path.clone()));
            }
        }
        let devices = NonEmpty::from_vec(devices).ok_or(BatchSelectionError::Empty)?;
        Ok(Self { devices })
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub fn devices(&self) -> &NonEmpty<Device> {
        &self.devices
    }

    /// True when every selected device has an assigned role.
    pub fn all_roles_assigned(&self) -> bool {
        self.devices.iter().all(Device::has_role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceMode, Role};

    fn device(path: &str) -> Device {
        Device::new(DevicePath::new(path).unwrap(), path)
            .with_role(Role::Primary)
            .with_mode(DeviceMode::Bootloader)
    }

    #[test]
    fn empty_selection_rejected() {
        assert!(matches!(Batch::new(vec![]), Err(BatchSelectionError::Empty)));
    }

    #[test]
    fn three_devices_rejected() {
        let result = Batch::new(vec![device("/a"), device("/b"), device("/c")]);
        assert!(matches!(result, Err(BatchSelectionError::TooMany(3))));
    }

    #[test]
    fn duplicate_paths_rejected() {
        let result = Batch::new(vec![device("/a"), device("/a")]);
        assert!(matches!(
            result,
            Err(BatchSelectionError::DuplicatePath(_))
        ));
    }

    #[test]
    fn pair_accepted_in_order() {
        let batch = Batch::new(vec![device("/a"), device("/b")]).unwrap();
        let paths: Vec<_> = batch.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, ["/a", "/b"]);
    }
}

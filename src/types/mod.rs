// ABOUTME: Validated domain types for devices and firmware.
// ABOUTME: Newtypes catch malformed paths, roles, and versions at the boundary.

mod batch;
mod device;
mod firmware;
mod role;

pub use batch::{Batch, BatchSelectionError, MAX_BATCH_DEVICES};
pub use device::{Device, DeviceMode, DevicePath, DevicePathError};
pub use firmware::{FirmwareBundle, FirmwareBundleError, FirmwareVersion, FirmwareVersionError};
pub use role::{ParseRoleError, Role};

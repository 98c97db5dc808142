// ABOUTME: Install state markers for the type state pattern.
// ABOUTME: State types carry their own data; transitions consume self.

use crate::types::DevicePath;

/// Initial state: role validated, nothing touched yet.
/// Available actions: `erase()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

/// Device erased.
/// Available actions: `transfer()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Wiped;

/// Firmware copied onto the device.
/// Available actions: `configure()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Copied;

/// Configuration written; rename outcome (if any) captured.
/// Available actions: `finish()`
#[derive(Debug, Clone, Default)]
pub struct Configured {
    pub(crate) renamed: Option<RenamedVolume>,
}

/// Where a renamed volume ended up, after resolving host-appended suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedVolume {
    pub label: String,
    pub path: DevicePath,
}

// ABOUTME: Static per-role device configuration templates.
// ABOUTME: Opaque to the orchestrator; the DEVICE_ROLE marker is read by firmware.

use crate::types::Role;

/// Filename the configuration is written to on the device.
pub const CONFIG_FILENAME: &str = "device.cfg";

/// Marker key the device firmware reads to learn its role.
pub const DEVICE_ROLE_MARKER: &str = "DEVICE_ROLE";

const PRIMARY_CONFIG: &str = "\
# Written by perista. Do not edit on the device.
DEVICE_ROLE=PRIMARY
PAIR_MODE=HOST
AUDIO_CHANNEL=LEFT
ADVERTISE=1
";

const SECONDARY_CONFIG: &str = "\
# Written by perista. Do not edit on the device.
DEVICE_ROLE=SECONDARY
PAIR_MODE=CLIENT
AUDIO_CHANNEL=RIGHT
ADVERTISE=0
";

/// Select the configuration template for a role.
pub fn config_for_role(role: Role) -> &'static str {
    match role {
        Role::Primary => PRIMARY_CONFIG,
        Role::Secondary => SECONDARY_CONFIG,
    }
}

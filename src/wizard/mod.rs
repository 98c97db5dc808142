// ABOUTME: Wizard state machines for the firmware-update and therapy flows.
// ABOUTME: Hold step index, selections, and results; no deployment logic lives here.

mod firmware;
mod therapy;

pub use firmware::{FIRMWARE_MAX_STEP, FirmwareStep, FirmwareWizard};
pub use therapy::{THERAPY_MAX_STEP, TherapyStep, TherapyWizard};

// ABOUTME: Therapy profile loaded from YAML and applied to devices as-is.
// ABOUTME: The advanced payload is opaque to the orchestrator.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::SettingsError;

/// A named therapy configuration.
///
/// The orchestrator never interprets `advanced`; it is handed verbatim to
/// the backend's apply operation and ultimately to the device firmware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapyProfile {
    pub name: String,

    #[serde(default)]
    pub advanced: serde_json::Value,
}

impl TherapyProfile {
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        let profile: TherapyProfile = serde_yaml::from_str(yaml)?;
        if profile.name.is_empty() {
            return Err(SettingsError::Invalid(
                "therapy profile name cannot be empty".to_string(),
            ));
        }
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Err(SettingsError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }
}

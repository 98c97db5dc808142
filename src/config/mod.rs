// ABOUTME: Settings for perista.yml: throttle tuning, stage weights, volume labels.
// ABOUTME: Handles YAML parsing with defaults matching the shipped behavior.

mod profile;
mod templates;

pub use profile::TherapyProfile;
pub use templates::{CONFIG_FILENAME, DEVICE_ROLE_MARKER, config_for_role};

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::types::Role;

pub const SETTINGS_FILENAME: &str = "perista.yml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file not found at {0}")]
    NotFound(std::path::PathBuf),

    #[error("invalid settings: {0}")]
    Invalid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Tuning for the progress throttle.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ThrottleSettings {
    /// Minimum interval between coalesced forwards.
    #[serde(default = "default_min_interval", with = "humantime_serde")]
    pub min_interval: Duration,

    /// Progress delta (percentage points) that bypasses coalescing.
    #[serde(default = "default_min_change_percent")]
    pub min_change_percent: u8,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            min_interval: default_min_interval(),
            min_change_percent: default_min_change_percent(),
        }
    }
}

fn default_min_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_min_change_percent() -> u8 {
    1
}

/// Volume labels written during the rename step, keyed by role.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LabelSettings {
    #[serde(default = "default_primary_label")]
    pub primary: String,

    #[serde(default = "default_secondary_label")]
    pub secondary: String,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            primary: default_primary_label(),
            secondary: default_secondary_label(),
        }
    }
}

fn default_primary_label() -> String {
    "PRIMARY".to_string()
}

fn default_secondary_label() -> String {
    "SECONDARY".to_string()
}

/// Deployment settings, loaded from `perista.yml` or defaulted.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub throttle: ThrottleSettings,

    /// Fraction of the 0-100 per-device scale reserved for the copy stage.
    /// The remainder is headroom for configure and rename.
    #[serde(default = "default_copy_weight")]
    pub copy_weight: u8,

    #[serde(default)]
    pub labels: LabelSettings,
}

fn default_copy_weight() -> u8 {
    80
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            throttle: ThrottleSettings::default(),
            copy_weight: default_copy_weight(),
            labels: LabelSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Err(SettingsError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load from `perista.yml` in the given directory, falling back to
    /// defaults when the file does not exist.
    pub fn load_or_default(dir: &Path) -> Result<Self, SettingsError> {
        let path = dir.join(SETTINGS_FILENAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.copy_weight == 0 || self.copy_weight > 95 {
            return Err(SettingsError::Invalid(format!(
                "copy_weight must be in 1..=95, got {}",
                self.copy_weight
            )));
        }
        if self.throttle.min_change_percent > 100 {
            return Err(SettingsError::Invalid(format!(
                "throttle.min_change_percent must be in 0..=100, got {}",
                self.throttle.min_change_percent
            )));
        }
        Ok(())
    }

    /// Volume label for a role, used as the rename target.
    pub fn label_for(&self, role: Role) -> &str {
        match role {
            Role::Primary => &self.labels.primary,
            Role::Secondary => &self.labels.secondary,
        }
    }

    /// Template file contents for `perista init`.
    pub fn template() -> &'static str {
        "\
# perista deployment settings

throttle:
  # Minimum interval between coalesced progress forwards
  min_interval: 100ms
  # Progress delta (percentage points) that bypasses coalescing
  min_change_percent: 1

# Fraction of the per-device progress scale reserved for the copy stage
copy_weight: 80

# Volume labels written during the rename step
labels:
  primary: PRIMARY
  secondary: SECONDARY
"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_behavior() {
        let settings = Settings::default();
        assert_eq!(settings.throttle.min_interval, Duration::from_millis(100));
        assert_eq!(settings.throttle.min_change_percent, 1);
        assert_eq!(settings.copy_weight, 80);
        assert_eq!(settings.label_for(Role::Primary), "PRIMARY");
        assert_eq!(settings.label_for(Role::Secondary), "SECONDARY");
    }

    #[test]
    fn template_round_trips() {
        let settings = Settings::from_yaml(Settings::template()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn copy_weight_out_of_range_rejected() {
        let result = Settings::from_yaml("copy_weight: 100");
        assert!(matches!(result, Err(SettingsError::Invalid(_))));
    }
}

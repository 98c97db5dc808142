// ABOUTME: Device role assignment: primary or secondary of a paired set.
// ABOUTME: The role selects the config template and the default volume label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown role '{0}', expected 'primary' or 'secondary'")]
pub struct ParseRoleError(String);

/// Which half of a paired set a device is configured as.
///
/// At most one device in a batch should hold each role; the role decides
/// which configuration template is written during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Secondary,
}

impl Role {
    /// Stable uppercase token used in config templates and volume labels.
    pub fn as_token(&self) -> &'static str {
        match self {
            Role::Primary => "PRIMARY",
            Role::Secondary => "SECONDARY",
        }
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "primary" => Ok(Role::Primary),
            "secondary" => Ok(Role::Secondary),
            _ => Err(ParseRoleError(value.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("primary".parse::<Role>().unwrap(), Role::Primary);
        assert_eq!("SECONDARY".parse::<Role>().unwrap(), Role::Secondary);
    }

    #[test]
    fn rejects_unknown_role() {
        assert!("master".parse::<Role>().is_err());
    }
}

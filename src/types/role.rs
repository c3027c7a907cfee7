//! Operator role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Self-declared operator role, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Administrator,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Doctor, Role::Administrator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Administrator => "administrator",
        }
    }

    /// Greeting shown when a session starts.
    pub fn greeting(&self) -> &'static str {
        match self {
            Role::Doctor => "Hi Doctor, let's get to know about your patients",
            Role::Administrator => "Hi Admin, let's get to know about your patients",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(Role::Doctor),
            "administrator" => Ok(Role::Administrator),
            other => Err(format!(
                "unrecognized role '{}', expected one of: doctor, administrator",
                other
            )),
        }
    }
}

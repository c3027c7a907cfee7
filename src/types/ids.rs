//! Strongly-typed identifiers.
//!
//! All IDs are validated at construction time and implement common traits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a strongly-typed ID newtype wrapper.
///
/// Generates: struct, `as_str()`, Display, Serialize, Deserialize.
/// With the `uuid` flag it also generates `new()` (UUID v4) and `Default`.
macro_rules! define_id {
    ($name:ident, uuid) => {
        define_id!($name);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(SessionId, uuid);
define_id!(PatientId);

impl PatientId {
    /// Parse a patient identifier.
    ///
    /// Identifiers name files in the record and image stores, so only ASCII
    /// alphanumerics, `-` and `_` are accepted.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("patient_id cannot be empty".to_string());
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(format!("invalid patient_id '{}'", s));
        }
        Ok(Self(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_id_accepts_plain_ids() {
        assert_eq!(PatientId::parse("7").unwrap().as_str(), "7");
        assert_eq!(PatientId::parse(" A-12_b ").unwrap().as_str(), "A-12_b");
    }

    #[test]
    fn test_patient_id_rejects_paths() {
        assert!(PatientId::parse("").is_err());
        assert!(PatientId::parse("../etc/passwd").is_err());
        assert!(PatientId::parse("7/..").is_err());
        assert!(PatientId::parse("7 8").is_err());
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}

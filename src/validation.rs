//! Argument extraction and validation for tool calls.

use serde_json::{Map, Value};

use crate::types::{Error, PatientId, Result, Role};

/// Validate that a string is not empty.
pub fn validate_non_empty(s: &str, field: &str) -> Result<()> {
    if s.trim().is_empty() {
        return Err(Error::validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Required, non-empty string argument.
pub fn str_field(args: &Map<String, Value>, key: &str) -> Result<String> {
    let value = args
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::validation(format!("Missing required field: {}", key)))?;
    validate_non_empty(value, key)?;
    Ok(value.to_string())
}

/// Optional string argument; absent, null and non-string values read as empty.
pub fn optional_str_field(args: &Map<String, Value>, key: &str) -> String {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Raw role argument. `role` is canonical; `user_role` is accepted for older clients.
pub fn role_field(args: &Map<String, Value>) -> Result<String> {
    if args.contains_key("role") {
        str_field(args, "role")
    } else if args.contains_key("user_role") {
        str_field(args, "user_role")
    } else {
        Err(Error::validation("Missing required field: role"))
    }
}

/// Parse a raw role string.
pub fn parse_role(raw: &str) -> Result<Role> {
    raw.parse::<Role>().map_err(Error::validation)
}

/// Required patient identifier argument.
pub fn patient_id_field(args: &Map<String, Value>, key: &str) -> Result<PatientId> {
    let raw = str_field(args, key)?;
    PatientId::parse(&raw).map_err(Error::validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_str_field() {
        let a = args(json!({"query": "history", "blank": "  ", "n": 3}));
        assert_eq!(str_field(&a, "query").unwrap(), "history");
        assert!(str_field(&a, "blank").is_err());
        assert!(str_field(&a, "n").is_err());
        assert!(str_field(&a, "missing").unwrap_err().to_string().contains("missing"));
    }

    #[test]
    fn test_optional_str_field() {
        let a = args(json!({"patient_context": " 7 ", "other": null}));
        assert_eq!(optional_str_field(&a, "patient_context"), "7");
        assert_eq!(optional_str_field(&a, "other"), "");
        assert_eq!(optional_str_field(&a, "absent"), "");
    }

    #[test]
    fn test_role_field_accepts_alias() {
        assert_eq!(role_field(&args(json!({"role": "doctor"}))).unwrap(), "doctor");
        assert_eq!(
            role_field(&args(json!({"user_role": "administrator"}))).unwrap(),
            "administrator"
        );
        assert!(role_field(&args(json!({}))).is_err());
        assert!(parse_role("janitor").is_err());
    }

    #[test]
    fn test_patient_id_field() {
        let a = args(json!({"patient_id": "7", "bad": "../x"}));
        assert_eq!(patient_id_field(&a, "patient_id").unwrap().as_str(), "7");
        assert!(matches!(patient_id_field(&a, "bad"), Err(Error::Validation(_))));
    }
}

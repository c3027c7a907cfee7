//! Role-gated redaction of patient records.
//!
//! Pure transformation: no I/O, no logging. The input is never modified.

use serde_json::{Map, Value};

use crate::types::Role;

/// Fields masked for every role except `administrator`.
pub const SENSITIVE_FIELDS: [&str; 7] = [
    "name",
    "ssn",
    "address",
    "phone",
    "email",
    "policy_number",
    "date_of_birth",
];

/// Replacement for sensitive values that are not strings.
pub const MASK_SENTINEL: &str = "***MASKED***";

/// Redaction policy over a fixed set of sensitive field names.
#[derive(Debug, Clone)]
pub struct RedactionPolicy {
    sensitive_fields: Vec<String>,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            sensitive_fields: SENSITIVE_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl RedactionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` names a sensitive field (case-insensitive).
    pub fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.sensitive_fields.iter().any(|f| *f == key)
    }

    /// Redacted copy of `record` as seen by `role`.
    ///
    /// `administrator` sees the record unchanged. Every other role gets each
    /// top-level sensitive key masked; non-object records pass through.
    pub fn apply(&self, record: &Value, role: Role) -> Value {
        if role == Role::Administrator {
            return record.clone();
        }

        match record {
            Value::Object(fields) => {
                let masked: Map<String, Value> = fields
                    .iter()
                    .map(|(key, value)| {
                        let value = if self.is_sensitive(key) {
                            mask_value(value)
                        } else {
                            value.clone()
                        };
                        (key.clone(), value)
                    })
                    .collect();
                Value::Object(masked)
            }
            other => other.clone(),
        }
    }
}

/// Mask one value.
pub fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(mask_str(s)),
        _ => Value::String(MASK_SENTINEL.to_string()),
    }
}

/// Mask a string, keeping the first and last two characters of values
/// longer than four characters. Length is preserved.
pub fn mask_str(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    if len <= 4 {
        return "*".repeat(len);
    }

    let mut masked = String::with_capacity(s.len());
    masked.extend(&chars[..2]);
    masked.push_str(&"*".repeat(len - 4));
    masked.extend(&chars[len - 2..]);
    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_mask_short_and_long_strings() {
        assert_eq!(mask_str(""), "");
        assert_eq!(mask_str("ab"), "**");
        assert_eq!(mask_str("abcd"), "****");
        assert_eq!(mask_str("abcde"), "ab*de");
        assert_eq!(mask_str("12345678"), "12****78");
        assert_eq!(mask_str("Jane Doe"), "Ja****oe");
    }

    #[test]
    fn test_mask_counts_characters_not_bytes() {
        assert_eq!(mask_str("Zoë Müller"), "Zo******er");
    }

    #[test]
    fn test_non_string_values_use_sentinel() {
        assert_eq!(mask_value(&json!(123456789)), json!(MASK_SENTINEL));
        assert_eq!(mask_value(&json!({"street": "Main"})), json!(MASK_SENTINEL));
        assert_eq!(mask_value(&Value::Null), json!(MASK_SENTINEL));
    }

    #[test]
    fn test_doctor_view_is_masked() {
        let record = json!({
            "Name": "Jane Doe",
            "ssn": "123-45-6789",
            "phone": 5551234,
            "diagnosis": "asthma",
            "medications": ["albuterol"]
        });

        let masked = RedactionPolicy::new().apply(&record, Role::Doctor);
        assert_eq!(
            masked,
            json!({
                "Name": "Ja****oe",
                "ssn": "12*******89",
                "phone": MASK_SENTINEL,
                "diagnosis": "asthma",
                "medications": ["albuterol"]
            })
        );
        assert_eq!(record["Name"], "Jane Doe");
    }

    #[test]
    fn test_administrator_view_is_identity() {
        let record = json!({"name": "Jane Doe", "email": "jane@example.org"});
        assert_eq!(RedactionPolicy::new().apply(&record, Role::Administrator), record);
    }

    #[test]
    fn test_non_object_passes_through() {
        let policy = RedactionPolicy::new();
        assert_eq!(policy.apply(&json!(["name"]), Role::Doctor), json!(["name"]));
        assert_eq!(policy.apply(&json!("Jane"), Role::Doctor), json!("Jane"));
    }

    fn record_strategy() -> impl Strategy<Value = Map<String, Value>> {
        let sensitive = proptest::sample::subsequence(SENSITIVE_FIELDS.to_vec(), 0..=7);
        let clinical = proptest::collection::btree_map("[a-z]{3,8}_note", "[ -~]{0,12}", 0..5);
        (sensitive, proptest::collection::vec("[A-Za-z0-9]{1,16}", 7), clinical).prop_map(
            |(keys, values, clinical)| {
                let mut map = Map::new();
                for (key, value) in keys.into_iter().zip(values) {
                    map.insert(key.to_string(), Value::String(value));
                }
                for (key, value) in clinical {
                    map.insert(key, Value::String(value));
                }
                map
            },
        )
    }

    proptest! {
        #[test]
        fn prop_administrator_is_identity(fields in record_strategy()) {
            let record = Value::Object(fields);
            prop_assert_eq!(RedactionPolicy::new().apply(&record, Role::Administrator), record);
        }

        #[test]
        fn prop_doctor_masks_only_sensitive_fields(fields in record_strategy()) {
            let record = Value::Object(fields.clone());
            let masked = RedactionPolicy::new().apply(&record, Role::Doctor);
            let masked = masked.as_object().unwrap();

            prop_assert_eq!(masked.len(), fields.len());
            for (key, original) in &fields {
                let out = &masked[key];
                if SENSITIVE_FIELDS.contains(&key.as_str()) {
                    prop_assert_ne!(out, original);
                    let (o, m) = (original.as_str().unwrap(), out.as_str().unwrap());
                    prop_assert_eq!(o.chars().count(), m.chars().count());
                } else {
                    prop_assert_eq!(out, original);
                }
            }
        }
    }
}

//! Compliance enforcement: record redaction and the audit trail.

pub mod audit;
pub mod redaction;

pub use audit::{AuditEvent, AuditTrail, LogKind, PromptEvent, ViolationEvent};
pub use redaction::{RedactionPolicy, MASK_SENTINEL, SENSITIVE_FIELDS};

//! Core types for medgate.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (PatientId, SessionId)
//! - **Role**: The self-declared operator role driving redaction
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for transport, storage, audit and models

mod config;
mod errors;
mod ids;
mod role;

pub use config::{
    AuditConfig, Config, ImagingConfig, LogFormat, ModelConfig, ObservabilityConfig,
    ServerConfig, StorageConfig,
};
pub use errors::{Error, Result};
pub use ids::{PatientId, SessionId};
pub use role::Role;

//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for medgate.
#[derive(Error, Debug)]
pub enum Error {
    /// Dispatch-time caller error: no tool registered under this name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Missing or malformed argument.
    #[error("validation error: {0}")]
    Validation(String),

    /// Record or image absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// External process ran but exited unsuccessfully.
    #[error("external model failure: {0}")]
    ExternalModel(String),

    /// External process could not be started or did not finish in time.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Record/image I/O error.
    #[error("storage read failure: {0}")]
    StorageRead(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for conditions that are a normal, user-facing outcome.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::NotFound(_))
    }
}

// Convenience constructors
impl Error {
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn external_model(msg: impl Into<String>) -> Self {
        Self::ExternalModel(msg.into())
    }

    pub fn model_unavailable(msg: impl Into<String>) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    pub fn storage_read(msg: impl Into<String>) -> Self {
        Self::StorageRead(msg.into())
    }
}

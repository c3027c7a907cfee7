//! Configuration structures.
//!
//! Configuration is loaded from a JSON file; the binary overrides individual
//! settings from command-line flags and environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Transport configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Patient record and image locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Audit log configuration.
    #[serde(default)]
    pub audit: AuditConfig,

    /// External language model process.
    #[serde(default)]
    pub model: ModelConfig,

    /// External imaging classifier process.
    #[serde(default)]
    pub imaging: ImagingConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from a JSON file. Missing sections take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> crate::types::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name reported in the `initialize` handshake.
    pub name: String,

    /// Version reported in the `initialize` handshake.
    pub version: String,

    /// Maximum accepted size of one JSON-RPC message in bytes.
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "hipaa-medical-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            max_message_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Patient record and image locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `Patient_{id}.json` records.
    pub records_dir: PathBuf,

    /// Directory holding `Patient_{id}.png` images.
    pub images_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            records_dir: PathBuf::from("ehr"),
            images_dir: PathBuf::from("normalized_patients"),
        }
    }
}

/// On-disk layout of the audit logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// One JSON array per log, rewritten on every append.
    #[default]
    JsonArray,
    /// One JSON object per line, appended.
    JsonLines,
}

/// Audit log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Directory for the audit, prompt and violation logs.
    pub log_dir: PathBuf,

    /// File layout.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            format: LogFormat::JsonArray,
        }
    }
}

/// External language model process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Program followed by its arguments. The prompt is written to stdin.
    pub command: Vec<String>,

    /// Upper bound on one invocation.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "ollama".to_string(),
                "run".to_string(),
                "llama3.2:latest".to_string(),
            ],
            timeout: Duration::from_secs(120),
        }
    }
}

/// External imaging classifier process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagingConfig {
    /// Program followed by its arguments; the image path is appended.
    /// `None` leaves the imaging model unavailable.
    pub command: Option<Vec<String>>,

    /// Upper bound on one classification.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ImagingConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

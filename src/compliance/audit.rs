//! Append-only audit trail.
//!
//! Three independent logs (actions, prompt/response pairs, policy
//! violations), each a file under one directory. Writes to the same log are
//! serialized by a per-log mutex. A failed write is reported through
//! `tracing` and never returned to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::types::{AuditConfig, Error, LogFormat, Result};

/// Which log an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Audit,
    Prompt,
    Violation,
}

impl LogKind {
    pub const ALL: [LogKind; 3] = [LogKind::Audit, LogKind::Prompt, LogKind::Violation];

    fn stem(&self) -> &'static str {
        match self {
            LogKind::Audit => "audit_log",
            LogKind::Prompt => "prompt_log",
            LogKind::Violation => "violation_log",
        }
    }

    pub fn file_name(&self, format: LogFormat) -> String {
        match format {
            LogFormat::JsonArray => format!("{}.json", self.stem()),
            LogFormat::JsonLines => format!("{}.jsonl", self.stem()),
        }
    }
}

/// Who did what to which patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub user_role: String,
    pub action: String,
    pub patient_id: String,
    pub details: Value,
}

/// Query sent to the model and the reply it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptEvent {
    pub timestamp: DateTime<Utc>,
    pub user_role: String,
    pub prompt: String,
    pub response: String,
}

/// A rejected or suspicious request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationEvent {
    pub timestamp: DateTime<Utc>,
    pub user_role: String,
    pub violation_type: String,
    pub details: Value,
}

/// File-backed audit trail.
#[derive(Debug)]
pub struct AuditTrail {
    dir: PathBuf,
    format: LogFormat,
    audit_lock: Mutex<()>,
    prompt_lock: Mutex<()>,
    violation_lock: Mutex<()>,
}

impl AuditTrail {
    pub fn new(dir: impl Into<PathBuf>, format: LogFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
            audit_lock: Mutex::new(()),
            prompt_lock: Mutex::new(()),
            violation_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.log_dir.clone(), config.format)
    }

    pub fn path(&self, kind: LogKind) -> PathBuf {
        self.dir.join(kind.file_name(self.format))
    }

    fn lock(&self, kind: LogKind) -> &Mutex<()> {
        match kind {
            LogKind::Audit => &self.audit_lock,
            LogKind::Prompt => &self.prompt_lock,
            LogKind::Violation => &self.violation_lock,
        }
    }

    pub async fn log_audit(&self, role: &str, action: &str, patient_id: &str, details: Value) {
        let event = AuditEvent {
            timestamp: Utc::now(),
            user_role: role.to_string(),
            action: action.to_string(),
            patient_id: patient_id.to_string(),
            details,
        };
        self.record(LogKind::Audit, &event).await;
    }

    pub async fn log_prompt(&self, role: &str, prompt: &str, response: &str) {
        let event = PromptEvent {
            timestamp: Utc::now(),
            user_role: role.to_string(),
            prompt: prompt.to_string(),
            response: response.to_string(),
        };
        self.record(LogKind::Prompt, &event).await;
    }

    pub async fn log_violation(&self, role: &str, violation_type: &str, details: Value) {
        let event = ViolationEvent {
            timestamp: Utc::now(),
            user_role: role.to_string(),
            violation_type: violation_type.to_string(),
            details,
        };
        self.record(LogKind::Violation, &event).await;
    }

    async fn record<T: Serialize>(&self, kind: LogKind, event: &T) {
        let entry = match serde_json::to_value(event) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!(log = ?kind, error = %e, "Failed to encode log entry");
                return;
            }
        };
        self.append(kind, entry).await;
    }

    /// Append one entry to a log. Failures are logged, not returned.
    pub async fn append(&self, kind: LogKind, entry: Value) {
        let _guard = self.lock(kind).lock().await;
        if let Err(e) = self.write_entry(kind, &entry).await {
            tracing::error!(
                log = ?kind,
                path = %self.path(kind).display(),
                error = %e,
                "Failed to write log"
            );
        }
    }

    async fn write_entry(&self, kind: LogKind, entry: &Value) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(kind);

        match self.format {
            LogFormat::JsonArray => {
                let mut entries = load_or_quarantine(&path).await?;
                entries.push(entry.clone());
                let encoded = serde_json::to_vec_pretty(&entries)?;
                replace_file(&path, &encoded).await?;
            }
            LogFormat::JsonLines => {
                let mut line = serde_json::to_vec(entry)?;
                line.push(b'\n');
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await?;
                file.write_all(&line).await?;
                file.flush().await?;
            }
        }
        Ok(())
    }

    /// All entries of a log, oldest first. A missing file reads as empty.
    pub async fn entries(&self, kind: LogKind) -> Result<Vec<Value>> {
        let _guard = self.lock(kind).lock().await;
        let path = self.path(kind);
        match self.format {
            LogFormat::JsonArray => read_array(&path).await,
            LogFormat::JsonLines => {
                let raw = match tokio::fs::read_to_string(&path).await {
                    Ok(raw) => raw,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                    Err(e) => return Err(e.into()),
                };
                raw.lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(|line| serde_json::from_str(line).map_err(Into::into))
                    .collect()
            }
        }
    }

    /// Number of entries in a log.
    pub async fn count(&self, kind: LogKind) -> Result<usize> {
        Ok(self.entries(kind).await?.len())
    }
}

async fn read_array(path: &Path) -> Result<Vec<Value>> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(serde_json::from_slice(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Existing array entries. A log that no longer parses is moved aside to
/// `<name>.corrupt-<timestamp>` and a fresh array is started.
async fn load_or_quarantine(path: &Path) -> Result<Vec<Value>> {
    match read_array(path).await {
        Err(Error::Serialization(e)) => {
            let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
            let aside = sibling(path, &format!("corrupt-{}", stamp));
            tokio::fs::rename(path, &aside).await?;
            tracing::error!(
                path = %path.display(),
                moved_to = %aside.display(),
                error = %e,
                "Unreadable log moved aside"
            );
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Write `bytes` to a sibling temp file and rename it over `path`, so the
/// log on disk is always a complete old or new array.
async fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = sibling(path, "tmp");
    let written = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Convenience for building event details.
pub fn details(key: &str, value: impl Into<Value>) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(key.to_string(), value.into());
    Value::Object(map)
}

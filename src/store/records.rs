//! Patient record store.

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

use crate::types::{Error, PatientId, Result};

/// Read-only access to per-patient records.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// The record for `patient_id`, or `None` when absent or unreadable.
    async fn load(&self, patient_id: &PatientId) -> Option<Value>;
}

/// One `Patient_{id}.json` document per patient in a directory.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    dir: PathBuf,
}

impl FileRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, patient_id: &PatientId) -> PathBuf {
        self.dir.join(format!("Patient_{}.json", patient_id))
    }

    /// Load distinguishing absence (`Ok(None)`) from read failures.
    pub async fn try_load(&self, patient_id: &PatientId) -> Result<Option<Value>> {
        let path = self.path_for(patient_id);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::storage_read(format!("{}: {}", path.display(), e)));
            }
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| Error::storage_read(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn load(&self, patient_id: &PatientId) -> Option<Value> {
        match self.try_load(patient_id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(
                    patient_id = %patient_id,
                    error = %e,
                    "Failed to load patient data"
                );
                None
            }
        }
    }
}

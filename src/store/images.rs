//! Patient image store.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::types::PatientId;

/// A stored image. Consumers read it from `path` themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub path: PathBuf,
}

#[async_trait]
pub trait ImageStore: Send + Sync + std::fmt::Debug {
    /// The image for `patient_id`, or `None` when there is none.
    async fn resolve(&self, patient_id: &PatientId) -> Option<ImageArtifact>;
}

/// One `Patient_{id}.png` image per patient in a directory.
#[derive(Debug, Clone)]
pub struct FileImageStore {
    dir: PathBuf,
}

impl FileImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, patient_id: &PatientId) -> PathBuf {
        self.dir.join(format!("Patient_{}.png", patient_id))
    }
}

#[async_trait]
impl ImageStore for FileImageStore {
    async fn resolve(&self, patient_id: &PatientId) -> Option<ImageArtifact> {
        let path = self.path_for(patient_id);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(ImageArtifact { path }),
            Ok(_) => {
                tracing::error!(path = %path.display(), "Patient image path is not a file");
                None
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to stat patient image");
                None
            }
        }
    }
}

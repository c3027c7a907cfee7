//! Imaging classifier boundary.
//!
//! The classifier itself is a black box: it receives an image and returns a
//! probability per pathology label.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::model::process::{self, CommandSpec};
use crate::store::ImageArtifact;
use crate::types::{Error, ImagingConfig, Result};

/// Pathology label → probability in [0, 1], ordered by label.
pub type PathologyScores = BTreeMap<String, f64>;

#[async_trait]
pub trait ImagingModel: Send + Sync + std::fmt::Debug {
    /// Whether the model is loaded and can serve `infer`.
    fn is_ready(&self) -> bool;

    async fn infer(&self, image: &ImageArtifact) -> Result<PathologyScores>;
}

/// Placeholder used when no classifier is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnloadedImagingModel;

#[async_trait]
impl ImagingModel for UnloadedImagingModel {
    fn is_ready(&self) -> bool {
        false
    }

    async fn infer(&self, _image: &ImageArtifact) -> Result<PathologyScores> {
        Err(Error::model_unavailable("no imaging model configured"))
    }
}

/// Classifier run as an external command.
///
/// The image path is appended to the configured arguments; the command prints
/// a JSON object of label → probability on stdout.
#[derive(Debug, Clone)]
pub struct ProcessImagingModel {
    command: CommandSpec,
    timeout: Duration,
}

impl ProcessImagingModel {
    pub fn new(command: CommandSpec, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    /// Process-backed model when a command is configured, otherwise [`UnloadedImagingModel`].
    pub fn from_config(config: &ImagingConfig) -> Result<std::sync::Arc<dyn ImagingModel>> {
        match &config.command {
            Some(argv) => Ok(std::sync::Arc::new(Self::new(
                CommandSpec::from_argv(argv)?,
                config.timeout,
            ))),
            None => Ok(std::sync::Arc::new(UnloadedImagingModel)),
        }
    }
}

#[async_trait]
impl ImagingModel for ProcessImagingModel {
    fn is_ready(&self) -> bool {
        true
    }

    async fn infer(&self, image: &ImageArtifact) -> Result<PathologyScores> {
        let path = image.path.to_string_lossy().into_owned();
        let output = process::run(&self.command, &[path], None, self.timeout).await?;
        if !output.status.success() {
            return Err(Error::external_model(format!(
                "imaging model exited with {}: {}",
                output.status,
                output.stderr_text()
            )));
        }
        parse_scores(&output.stdout_text())
    }
}

/// Parse classifier output, rejecting non-numeric or out-of-range scores.
pub fn parse_scores(raw: &str) -> Result<PathologyScores> {
    let value: Value = serde_json::from_str(raw)?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::external_model("imaging model output is not a JSON object"))?;

    let mut scores = PathologyScores::new();
    for (label, score) in object {
        let score = score.as_f64().ok_or_else(|| {
            Error::external_model(format!("score for '{}' is not a number", label))
        })?;
        if !(0.0..=1.0).contains(&score) {
            return Err(Error::external_model(format!(
                "score for '{}' is outside [0, 1]: {}",
                label, score
            )));
        }
        scores.insert(label.clone(), score);
    }
    Ok(scores)
}

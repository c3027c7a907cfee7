//! External language model invocation.
//!
//! Each call launches a fresh process, writes the prompt to its stdin and
//! returns its stdout. Nothing is carried between calls and nothing is
//! retried.

use async_trait::async_trait;
use std::time::Duration;

use crate::model::process::{self, CommandSpec};
use crate::types::{Error, ModelConfig, Result};

/// Reply returned in place of model output whenever the model cannot be reached.
pub const UNAVAILABLE_MESSAGE: &str =
    "LLaMA model is currently unavailable. Please try again later.";

/// Prompt in, reply out. Implementations never fail: an unreachable model
/// yields [`UNAVAILABLE_MESSAGE`].
#[async_trait]
pub trait ModelInvoker: Send + Sync + std::fmt::Debug {
    async fn invoke(&self, prompt: &str) -> String;
}

/// Invoker backed by a command-line model such as `ollama run`.
#[derive(Debug, Clone)]
pub struct ProcessModelInvoker {
    command: CommandSpec,
    timeout: Duration,
}

impl ProcessModelInvoker {
    pub fn new(command: CommandSpec, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Ok(Self::new(CommandSpec::from_argv(&config.command)?, config.timeout))
    }

    /// Run the model once and report exactly what went wrong.
    ///
    /// Non-zero exit → `ExternalModel` carrying stderr; launch failure or
    /// timeout → `ModelUnavailable`.
    pub async fn try_invoke(&self, prompt: &str) -> Result<String> {
        let output =
            process::run(&self.command, &[], Some(prompt.as_bytes()), self.timeout).await?;

        if !output.status.success() {
            return Err(Error::external_model(format!(
                "'{}' exited with {}: {}",
                self.command,
                output.status,
                output.stderr_text()
            )));
        }
        Ok(output.stdout_text())
    }
}

#[async_trait]
impl ModelInvoker for ProcessModelInvoker {
    async fn invoke(&self, prompt: &str) -> String {
        match self.try_invoke(prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(command = %self.command, error = %e, "Language model unavailable");
                UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }
}

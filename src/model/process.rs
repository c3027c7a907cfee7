//! One-shot external process execution with a bounded wait.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::types::{Error, Result};

/// Program and fixed arguments of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Build from an argv-style list; the first element is the program.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::validation("command cannot be empty"))?;
        if program.trim().is_empty() {
            return Err(Error::validation("command program cannot be empty"));
        }
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Run `spec` with `extra_args` appended, feeding `input` on stdin.
///
/// Spawn failure and timeout both map to `ModelUnavailable`; the child is
/// killed when the wait is abandoned. A non-zero exit is *not* an error here;
/// callers inspect `status`.
pub async fn run(
    spec: &CommandSpec,
    extra_args: &[String],
    input: Option<&[u8]>,
    timeout: Duration,
) -> Result<ProcessOutput> {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .args(extra_args)
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
        Error::model_unavailable(format!("failed to start '{}': {}", spec.program, e))
    })?;

    // Feed stdin concurrently so a child that writes before reading cannot
    // deadlock against us.
    if let (Some(mut stdin), Some(input)) = (child.stdin.take(), input) {
        let input = input.to_vec();
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(&input).await {
                tracing::debug!(error = %e, "Child closed stdin early");
            }
        });
    }

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            Error::model_unavailable(format!(
                "'{}' did not finish within {}ms",
                spec.program,
                timeout.as_millis()
            ))
        })??;

    Ok(ProcessOutput {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_spec_from_argv() {
        let spec = CommandSpec::from_argv(&argv(&["ollama", "run", "llama3.2:latest"])).unwrap();
        assert_eq!(spec.program, "ollama");
        assert_eq!(spec.args, argv(&["run", "llama3.2:latest"]));
        assert_eq!(spec.to_string(), "ollama run llama3.2:latest");
        assert!(CommandSpec::from_argv(&[]).is_err());
        assert!(CommandSpec::from_argv(&argv(&[" "])).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_feeds_stdin() {
        let spec = CommandSpec::from_argv(&argv(&["cat"])).unwrap();
        let output = run(&spec, &[], Some(&b"hello\n"[..]), Duration::from_secs(5)).await.unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout_text(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_appends_extra_args() {
        let spec = CommandSpec::from_argv(&argv(&["echo", "scores"])).unwrap();
        let output = run(&spec, &argv(&["/tmp/x.png"]), None, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(output.stdout_text(), "scores /tmp/x.png");
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let spec = CommandSpec::from_argv(&argv(&["medgate-no-such-binary-xyz"])).unwrap();
        let err = run(&spec, &[], None, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let spec = CommandSpec::from_argv(&argv(&["sleep", "5"])).unwrap();
        let err = run(&spec, &[], None, Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(msg) if msg.contains("did not finish")));
    }
}

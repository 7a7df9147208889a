//! Builder for package-manager invocations.
//!
//! Backends describe the command they need (`carthage bootstrap ...`, `swift package
//! resolve ...`) as a [`ToolCommand`], which runs it with consistent logging, optional
//! timeout and error mapping.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::XcforgeError;

/// A single external tool invocation.
///
/// ```rust,no_run
/// use xcforge_cli::dependencies::command::ToolCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// ToolCommand::new("carthage", "/usr/local/bin/carthage")
///     .args(["bootstrap", "--platform", "iOS"])
///     .current_dir("/tmp/staging")
///     .execute_success()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    /// Tool name used in logs and errors.
    tool: String,
    program: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout_duration: Option<Duration>,
}

/// Captured output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct ToolCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolCommand {
    pub fn new(tool: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout_duration: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// The command line as a user would type it.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the command, failing with [`XcforgeError::ToolCommandFailed`] on a non-zero exit.
    pub async fn execute_success(self) -> Result<ToolCommandOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let command_line = self.display();
        tracing::debug!(target: "dependencies", "Executing command: {}", command_line);

        let output_future = cmd.output();
        let output = if let Some(duration) = self.timeout_duration {
            match timeout(duration, output_future).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        target: "dependencies",
                        "Command timed out after {} seconds: {}",
                        duration.as_secs(),
                        command_line
                    );
                    return Err(XcforgeError::ToolCommandFailed {
                        tool: self.tool,
                        status: format!("timed out after {} seconds", duration.as_secs()),
                    }
                    .into());
                }
            }
        } else {
            output_future.await
        }
        .with_context(|| format!("Failed to execute {command_line}"))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "dependencies",
                "Command failed with exit code: {:?}",
                output.status.code()
            );
            if !stderr.is_empty() {
                tracing::debug!(target: "dependencies", "Error: {}", stderr);
            }
            return Err(XcforgeError::ToolCommandFailed {
                tool: self.tool,
                status: output.status.to_string(),
            }
            .into());
        }

        if !stdout.trim().is_empty() {
            tracing::debug!(target: "dependencies", "{}", stdout.trim_end());
        }

        Ok(ToolCommandOutput {
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let command = ToolCommand::new("swift", "/usr/bin/swift")
            .args(["package", "resolve"])
            .arg("--verbose");
        assert_eq!(command.display(), "/usr/bin/swift package resolve --verbose");
        assert_eq!(command.get_args().len(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_success_captures_output() {
        let output =
            ToolCommand::new("sh", "sh").args(["-c", "echo resolved"]).execute_success().await.unwrap();
        assert_eq!(output.stdout.trim(), "resolved");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_tool_failure() {
        let error =
            ToolCommand::new("sh", "sh").args(["-c", "exit 3"]).execute_success().await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<XcforgeError>(),
            Some(XcforgeError::ToolCommandFailed { tool, .. }) if tool == "sh"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let error = ToolCommand::new("sh", "sh")
            .args(["-c", "sleep 5"])
            .with_timeout(Some(Duration::from_millis(100)))
            .execute_success()
            .await
            .unwrap_err();
        assert!(error.to_string().contains("timed out"));
    }
}

//! External command execution seam.
//!
//! All version-control and registry commands go through a [`CommandRunner`].
//! The orchestrator receives one at construction, so tests can substitute a
//! scripted runner without touching process state.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Failure of an external command.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The program could not be started.
    #[error("Failed to execute '{command}': {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("Command '{command}' failed{}: {stderr}", exit_suffix(.code))]
    Failed {
        /// Rendered command line
        command: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },
}

#[allow(clippy::ref_option)]
fn exit_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" with exit code {c}")).unwrap_or_default()
}

impl RunnerError {
    /// The rendered command line that failed.
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. } | Self::Failed { command, .. } => command,
        }
    }
}

/// Capability to run an external program and capture its standard output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, returning stdout on success.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Spawn`] if the program cannot be started and
    /// [`RunnerError::Failed`] if it exits with a non-zero status.
    async fn run(&self, program: &str, args: &[String]) -> Result<String, RunnerError>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, RunnerError> {
        (**self).run(program, args).await
    }
}

/// Render a command line for logs and error messages.
#[must_use]
pub fn render_command(program: &str, args: &[String]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            rendered.push('\'');
            rendered.push_str(arg);
            rendered.push('\'');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}

/// Runs commands as child processes in a fixed working directory.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    cwd: PathBuf,
}

impl SystemRunner {
    /// Create a runner executing in `cwd`.
    #[must_use]
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// The working directory commands run in.
    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, RunnerError> {
        let command = render_command(program, args);
        debug!(command = %command, cwd = %self.cwd.display(), "Running external command");

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RunnerError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RunnerError::Failed {
                command,
                code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

//! External process execution.
//!
//! Every git and npm invocation in the pipeline goes through the
//! [`ProcessRunner`] trait so that command sequences and fail policies can be
//! asserted in tests without spawning real processes.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PrkitError, Result};

// ---------------------------------------------------------------------------
// RunRequest / RunOutput
// ---------------------------------------------------------------------------

/// A single command invocation: what to run, where, and whether a nonzero
/// exit is fatal.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub directory: PathBuf,
    pub command: String,
    pub args: Vec<String>,
    pub fail_on_error: bool,
}

impl RunRequest {
    /// Build a fail-fast request. Use [`RunRequest::fail_on_error`] to make
    /// nonzero exits tolerated instead.
    pub fn new<I, S>(directory: &Path, command: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            directory: directory.to_path_buf(),
            command: command.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            fail_on_error: true,
        }
    }

    pub fn fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.fail_on_error = fail_on_error;
        self
    }

    /// The command line as a display string, e.g. `git checkout main`.
    pub fn rendered(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// Outcome of a tolerated command run. `output` is stdout alone on success,
/// combined stdout + stderr on failure.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunOutput {
    pub success: bool,
    pub output: String,
}

// ---------------------------------------------------------------------------
// ProcessRunner
// ---------------------------------------------------------------------------

pub trait ProcessRunner {
    fn run(&self, request: &RunRequest) -> Result<RunOutput>;
}

/// Production runner backed by `std::process::Command`.
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, request: &RunRequest) -> Result<RunOutput> {
        tracing::debug!(
            command = %request.rendered(),
            directory = %request.directory.display(),
            "running command"
        );
        let spawned = Command::new(&request.command)
            .args(&request.args)
            .current_dir(&request.directory)
            .output();

        let output = match spawned {
            Ok(output) => output,
            Err(error) => {
                tracing::error!(
                    "failed to run \"{}\" in {}: {error}",
                    request.rendered(),
                    request.directory.display()
                );
                if request.fail_on_error {
                    return Err(PrkitError::CommandFailed {
                        command: request.rendered(),
                        output: error.to_string(),
                    });
                }
                return Ok(RunOutput {
                    success: false,
                    output: error.to_string(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            return Ok(RunOutput {
                success: true,
                output: stdout.into_owned(),
            });
        }

        let combined = format!("{stdout}{stderr}");
        if request.fail_on_error {
            Err(PrkitError::CommandFailed {
                command: request.rendered(),
                output: combined,
            })
        } else {
            Ok(RunOutput {
                success: false,
                output: combined,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

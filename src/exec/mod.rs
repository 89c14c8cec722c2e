//! Execution of external engine scripts.
//!
//! The orchestrators never spawn processes themselves; they build an
//! [`ExecRequest`] and hand it to an [`Executor`]. The production executor is
//! [`ScriptExecutor`], tests substitute their own.

pub mod process;
pub mod script;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use process::{run_command, CommandSpec};
pub use script::ScriptExecutor;

/// Result of one external operation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub succeeded: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl OperationOutcome {
    pub fn from_exit(exit_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            succeeded: exit_code == 0,
            exit_code,
            stdout,
            stderr,
        }
    }

    /// Outcome for failures detected before a process could be started.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            exit_code: -1,
            stdout: String::new(),
            stderr: message.into(),
        }
    }

    /// Whatever the process printed, preferring stdout.
    pub fn output(&self) -> &str {
        let stdout = self.stdout.trim();
        if stdout.is_empty() {
            self.stderr.trim()
        } else {
            stdout
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecRequest {
    pub operation: PathBuf,
    pub args: Vec<String>,
    pub timeout: Duration,
    pub run_as: Option<String>,
    /// When false, output goes straight to the terminal and the outcome
    /// carries empty stdout/stderr.
    pub capture_output: bool,
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("operation timed out after {} s", .0.as_secs())]
    TimedOut(Duration),

    #[error("operation interrupted")]
    Interrupted,

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error while waiting for process: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Executor {
    fn execute(&self, request: &ExecRequest) -> Result<OperationOutcome, ExecError>;
}

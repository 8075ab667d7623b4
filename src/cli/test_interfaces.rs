//! Test runner I/O boundary interfaces
//!
//! This module defines the seams between the test runner and the outside world:
//! - Subprocess execution (`CommandRunner`): the compiler, the JS shell and the sixgill tools
//! - The error kinds a test case can end with (`CaseError`)
//!
//! `SystemRunner` is the real implementation. Tests substitute scripted runners so the run loop can be
//! exercised without a toolchain.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use hazard_outputs::OutputError;
use thiserror::Error;

/// Errors that end a single test case.
///
/// The variants split into two policies: [`CaseError::Assertion`] aborts the whole run, everything else is
/// recorded as a failed test and the run continues.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("command `{command}` failed with {status}")]
    Subprocess { command: String, status: String },

    #[error("assertion failed: {message}")]
    Assertion { message: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse '{}': {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: OutputError,
    },

    #[error("no test case named '{0}'")]
    Unknown(String),
}

impl CaseError {
    /// Whether this error aborts the remaining tests instead of only failing the current one.
    pub fn aborts_run(&self) -> bool {
        matches!(self, CaseError::Assertion { .. })
    }
}

// ============================================================================
// Subprocess Interface
// ============================================================================

/// A subprocess invocation: program, arguments, working directory and extra environment.
///
/// The working directory is always explicit; the harness never changes its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Arguments as (lossy) strings, for logging and assertions.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// What a finished subprocess left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human-readable exit status.
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "termination by signal".to_string(),
        }
    }
}

/// Run a subprocess to completion and capture its stdout.
///
/// Implementations block until the process exits; there is no timeout.
pub trait CommandRunner {
    /// Returns `Err` only when the process could not be started.
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput>;
}

// ============================================================================
// Default Implementation
// ============================================================================

/// Runs commands with `std::process::Command`. Stderr is inherited so tool diagnostics reach the console.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    pub verbose: bool,
}

impl SystemRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        if self.verbose {
            tracing::info!(cwd = ?spec.cwd, "Running {}", spec);
        } else {
            tracing::debug!(cwd = ?spec.cwd, "Running {}", spec);
        }

        let mut command = Command::new(&spec.program);
        command.args(&spec.args).stdin(Stdio::null()).stderr(Stdio::inherit());
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        let output = command.output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if self.verbose && !stdout.is_empty() {
            tracing::info!("{}", stdout.trim_end());
        }

        Ok(CommandOutput {
            code: output.status.code(),
            stdout,
        })
    }
}

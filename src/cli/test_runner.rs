//! Test runner implementation
//!
//! ## Run Protocol
//!
//! Tests run one at a time, in the order given. For each test the runner prints `START TEST <name>`, runs
//! the case, then prints `TEST-PASSED: <name>` or `TEST-FAILED: <name>`. Lines are flushed as they are
//! written so log scrapers see progress in real time.
//!
//! ## Failure Policy
//!
//! - A failing subprocess (or unreadable output, or an unknown test name) fails the test; the run goes on.
//! - A failed assertion fails the test and aborts the run (`HarnessError::Aborted`); no summary is printed.
//! - After a complete run, [`report`] turns any failures into one error listing every failed test.
//!
//! ## HarnessReporter Trait
//!
//! Output goes through the `HarnessReporter` trait so tests can capture the protocol lines.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::test_interfaces::{CaseError, CommandRunner, CommandSpec};
use super::{CliError, CliResult, ExitCode};
use crate::cases::CaseRegistry;
use crate::config::Config;
use crate::fixture::Fixture;

/// Extension of the sixgill databases purged from an output directory before each test.
pub const STALE_EXTENSION: &str = "xdb";

/// JS snippet that exits non-zero when the shell was built without ctypes.
pub const CTYPES_PROBE: &str = r#"if (!getBuildConfiguration()["has-ctypes"]) quit(1)"#;

/// Errors that stop the run as a whole.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("cannot run capability check `{command}`: {source}")]
    Precheck {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot prepare output directory '{}': {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("test {name} aborted the run: {source}")]
    Aborted {
        name: String,
        #[source]
        source: CaseError,
        /// Results recorded up to and including the aborting test
        results: ResultSet,
    },
}

// ============================================================================
// Result Set
// ============================================================================

/// Names of passed and failed tests, in execution order. A name is in at most one of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    passed: Vec<String>,
    failed: Vec<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pass; ignored if the name was already recorded.
    pub fn record_pass(&mut self, name: &str) {
        if !self.contains(name) {
            self.passed.push(name.to_string());
        }
    }

    /// Record a failure; ignored if the name was already recorded.
    pub fn record_fail(&mut self, name: &str) {
        if !self.contains(name) {
            self.failed.push(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.passed.iter().chain(&self.failed).any(|n| n == name)
    }

    pub fn passed(&self) -> &[String] {
        &self.passed
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    /// Number of tests that ran.
    pub fn executed(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }
}

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// How a single test ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
}

/// Trait for reporting test progress.
pub trait HarnessReporter {
    /// Called before a test runs
    fn on_test_start(&mut self, name: &str);

    /// Called when a test has passed or failed
    fn on_test_complete(&mut self, name: &str, outcome: TestOutcome);

    /// Called after a complete run in which every test passed
    fn on_run_complete(&mut self, results: &ResultSet);
}

/// Writes the run protocol to a stream, flushing after every line.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // Progress lines are best effort; a closed stdout must not fail the run.
        let _ = writeln!(self.out, "{}", text);
        let _ = self.out.flush();
    }
}

impl<W: Write> HarnessReporter for ConsoleReporter<W> {
    fn on_test_start(&mut self, name: &str) {
        self.line(&format!("START TEST {}", name));
    }

    fn on_test_complete(&mut self, name: &str, outcome: TestOutcome) {
        match outcome {
            TestOutcome::Passed => self.line(&format!("TEST-PASSED: {}", name)),
            TestOutcome::Failed => self.line(&format!("TEST-FAILED: {}", name)),
        }
    }

    fn on_run_complete(&mut self, results: &ResultSet) {
        self.line(&format!("All {} tests passed.", results.passed().len()));
    }
}

// ============================================================================
// Capability Check
// ============================================================================

/// Whether the JS shell can run the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Supported,
    /// The shell lacks ctypes; the suite must be skipped
    Unsupported,
}

/// Ask the JS shell whether it was built with ctypes.
///
/// ## Errors
///
/// Returns `HarnessError::Precheck` if the shell cannot be started at all.
pub fn check_capability(config: &Config, runner: &dyn CommandRunner) -> Result<Capability, HarnessError> {
    let spec = CommandSpec::new(&config.js).args(["-e", CTYPES_PROBE]);
    let output = runner.run(&spec).map_err(|source| HarnessError::Precheck {
        command: spec.to_string(),
        source,
    })?;
    if output.is_success() {
        Ok(Capability::Supported)
    } else {
        tracing::debug!(status = %output.status_text(), "capability probe failed");
        Ok(Capability::Unsupported)
    }
}

// ============================================================================
// Output Directories
// ============================================================================

/// Reduce a test identifier to its final path segment, so `t/hazards` and `hazards` name the same test.
///
/// Identifiers without a final segment (`..`, `/`) are returned unchanged.
pub fn normalize_test_name(id: &str) -> String {
    Path::new(id)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| id.to_string())
}

/// Normalize identifiers and drop repeated names, keeping first-occurrence order.
pub fn unique_test_names(ids: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let name = normalize_test_name(id);
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Create `dir` (and its parents) if needed, then delete the stale `*.xdb` files in it.
///
/// Other files in the directory are kept.
///
/// ## Errors
///
/// Returns `HarnessError::OutputDir` if the directory cannot be created or listed.
pub fn prepare_output_dir(dir: &Path) -> Result<(), HarnessError> {
    let dir_error = |source| HarnessError::OutputDir {
        path: dir.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(dir_error)?;

    for entry in fs::read_dir(dir).map_err(dir_error)? {
        let path = entry.map_err(dir_error)?.path();
        let is_stale = path.is_file() && path.extension().is_some_and(|ext| ext == STALE_EXTENSION);
        if is_stale {
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!("cannot remove stale database {}: {}", path.display(), e);
            }
        }
    }
    Ok(())
}

// ============================================================================
// Run Loop
// ============================================================================

/// Run the named tests in order.
///
/// ## Returns
///
/// The result set of a complete run. Failures are recorded, not returned; see [`report`].
///
/// ## Errors
///
/// - `HarnessError::OutputDir` if a test's output directory cannot be prepared.
/// - `HarnessError::Aborted` as soon as a test fails an assertion.
#[tracing::instrument(skip_all, fields(test_count = names.len()))]
pub fn run_tests(
    config: &Config,
    names: &[String],
    registry: &CaseRegistry,
    runner: &dyn CommandRunner,
    reporter: &mut dyn HarnessReporter,
) -> Result<ResultSet, HarnessError> {
    let outroot = config.output_root();
    let mut results = ResultSet::new();

    for name in unique_test_names(names) {
        // Unregistered names never touch the filesystem.
        let outcome = match registry.get(&name) {
            Some(case) => {
                let indir = config.test_root.join(&name);
                let outdir = outroot.join(&name);
                prepare_output_dir(&outdir)?;

                let fixture = Fixture::new(name.as_str(), indir, outdir, config, runner);
                reporter.on_test_start(&name);
                case.run(&fixture)
            }
            None => {
                reporter.on_test_start(&name);
                Err(CaseError::Unknown(name.clone()))
            }
        };

        match outcome {
            Ok(()) => {
                results.record_pass(&name);
                reporter.on_test_complete(&name, TestOutcome::Passed);
            }
            Err(error) => {
                tracing::error!(test = %name, "{}", error);
                results.record_fail(&name);
                reporter.on_test_complete(&name, TestOutcome::Failed);
                if error.aborts_run() {
                    return Err(HarnessError::Aborted {
                        name,
                        source: error,
                        results,
                    });
                }
            }
        }
    }

    Ok(results)
}

/// Turn the results of a complete run into an exit code.
///
/// ## Errors
///
/// Returns a failure naming every failed test (space-separated) when any test failed.
pub fn report(results: &ResultSet, reporter: &mut dyn HarnessReporter) -> CliResult<ExitCode> {
    if !results.all_passed() {
        return Err(CliError::failure(format!(
            "Failed tests: {}",
            results.failed().join(" ")
        )));
    }
    reporter.on_run_complete(results);
    Ok(ExitCode::SUCCESS)
}

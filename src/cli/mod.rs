//! CLI module for the hazard analysis test harness
//!
//! ## Usage
//!
//! `hazard-harness [OPTIONS] [TEST]...` runs the named tests (default: the whole built-in suite). Every
//! option falls back to an environment variable of the same purpose (`JS`, `SIXGILL`, `CC`, ...).
//!
//! ## Modules
//!
//! - `test_interfaces` - Subprocess seam and test error kinds
//! - `test_runner` - Capability check, run loop and reporting
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod test_interfaces;
pub mod test_runner;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::cases::CaseRegistry;
use crate::config::{Config, ConfigArgs, ConfigError, DEFAULT_TESTS, configure};
use crate::version::HARNESS_VERSION;
use test_interfaces::{CommandRunner, SystemRunner};
use test_runner::{Capability, ConsoleReporter, HarnessError, HarnessReporter};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The JS shell cannot run the analysis; neither a pass nor a failure
    pub const SKIP: ExitCode = ExitCode(77);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::failure(e.to_string())
    }
}

impl From<HarnessError> for CliError {
    fn from(e: HarnessError) -> Self {
        CliError::failure(format!("Error: {}", e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run the rooting hazard analysis tests
#[derive(Parser, Debug)]
#[command(name = "hazard-harness")]
#[command(version = HARNESS_VERSION)]
#[command(about = "Run the rooting hazard analysis tests", long_about = None)]
pub struct Cli {
    /// JS binary to run the tests with
    #[arg(long, env = "JS", value_name = "PATH")]
    pub js: Option<PathBuf>,

    /// Path to root of sixgill installation (default: <TEST_ROOT>/sixgill)
    #[arg(long, env = "SIXGILL", value_name = "DIR")]
    pub sixgill: Option<PathBuf>,

    /// Path to sixgill binary dir
    #[arg(long = "sixgill-bin", env = "SIXGILL_BIN", value_name = "DIR")]
    pub sixgill_bin: Option<PathBuf>,

    /// Full path to sixgill gcc plugin
    #[arg(long = "sixgill-plugin", env = "SIXGILL_PLUGIN", value_name = "PATH")]
    pub sixgill_plugin: Option<PathBuf>,

    /// Path to GCC installation dir
    #[arg(long, env = "GCCDIR", value_name = "DIR")]
    pub gccdir: Option<PathBuf>,

    /// Path to gcc
    #[arg(long, env = "CC", value_name = "PATH")]
    pub cc: Option<PathBuf>,

    /// Path to g++
    #[arg(long, env = "CXX", value_name = "PATH")]
    pub cxx: Option<PathBuf>,

    /// Directory holding the test fixtures (default: t)
    #[arg(long = "test-root", env = "HAZARD_TEST_ROOT", value_name = "DIR")]
    pub test_root: Option<PathBuf>,

    /// Display verbose output, including commands executed
    #[arg(short, long)]
    pub verbose: bool,

    /// Tests to run
    #[arg(value_name = "TEST", default_values_t = DEFAULT_TESTS.map(String::from))]
    pub tests: Vec<String>,
}

impl Cli {
    /// Settings for [`configure`].
    pub fn config_args(&self) -> ConfigArgs {
        ConfigArgs {
            js: self.js.clone(),
            sixgill: self.sixgill.clone(),
            sixgill_bin: self.sixgill_bin.clone(),
            sixgill_plugin: self.sixgill_plugin.clone(),
            gccdir: self.gccdir.clone(),
            cc: self.cc.clone(),
            cxx: self.cxx.clone(),
            test_root: self.test_root.clone(),
            verbose: self.verbose,
        }
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All other
/// functions return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Configure from the command line and run the suite with the real toolchain.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = configure(cli.config_args())?;
    let runner = SystemRunner::new(config.verbose);
    let registry = CaseRegistry::builtin();
    let mut reporter = ConsoleReporter::stdout();
    run_suite(&config, &cli.tests, &registry, &runner, &mut reporter)
}

/// Check the JS shell, run the tests and report.
///
/// ## Returns
///
/// - `ExitCode::SKIP` without running anything if the shell lacks ctypes.
/// - `ExitCode::SUCCESS` if every test passed.
///
/// ## Errors
///
/// A failure listing the failed tests, or the error that aborted the run.
pub fn run_suite(
    config: &Config,
    tests: &[String],
    registry: &CaseRegistry,
    runner: &dyn CommandRunner,
    reporter: &mut dyn HarnessReporter,
) -> CliResult<ExitCode> {
    if test_runner::check_capability(config, runner)? == Capability::Unsupported {
        tracing::warn!("{} lacks ctypes support; skipping hazard analysis tests", config.js.display());
        return Ok(ExitCode::SKIP);
    }

    let results = test_runner::run_tests(config, tests, registry, runner, reporter)?;
    test_runner::report(&results, reporter)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_tests() {
        let cli = Cli::try_parse_from(["hazard-harness", "--js", "/opt/js"]).unwrap();
        assert_eq!(cli.js, Some(PathBuf::from("/opt/js")));
        assert_eq!(cli.tests, DEFAULT_TESTS.to_vec());
    }

    #[test]
    fn test_cli_explicit_tests_keep_order() {
        let cli = Cli::try_parse_from(["hazard-harness", "-v", "graph", "t/hazards", "virtual"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.tests, vec!["graph", "t/hazards", "virtual"]);
    }

    #[test]
    fn test_cli_toolchain_flags() {
        let cli = Cli::try_parse_from([
            "hazard-harness",
            "--sixgill",
            "/sixgill",
            "--sixgill-bin",
            "/sixgill/bin",
            "--sixgill-plugin",
            "/xgill.so",
            "--gccdir",
            "/gcc",
            "--test-root",
            "/suite/t",
        ])
        .unwrap();
        let args = cli.config_args();
        assert_eq!(args.sixgill, Some(PathBuf::from("/sixgill")));
        assert_eq!(args.sixgill_bin, Some(PathBuf::from("/sixgill/bin")));
        assert_eq!(args.sixgill_plugin, Some(PathBuf::from("/xgill.so")));
        assert_eq!(args.gccdir, Some(PathBuf::from("/gcc")));
        assert_eq!(args.test_root, Some(PathBuf::from("/suite/t")));
    }

    #[test]
    fn test_config_error_is_a_failure() {
        let err = CliError::from(ConfigError::MissingJs);
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("--js"));
    }
}

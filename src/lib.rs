#![forbid(unsafe_code)]
//! Test harness for the GC rooting hazard analysis
//!
//! The harness compiles small C++ fixtures with the sixgill GCC plugin, drives the analysis phases through a
//! JS shell, and compares what the analysis wrote against expectations stored next to each fixture.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! ## Failure Policy
//!
//! A test case fails in one of two ways, and the harness treats them differently:
//!
//! - a subprocess (compiler, analysis phase, xdb tool) exits unsuccessfully: the test is recorded as failed
//!   and the run moves on to the next test;
//! - an expectation is violated ([`assert::equal`]): the test is recorded as failed and the whole run aborts.

pub mod analysis;
pub mod assert;
pub mod cases;
pub mod cli;
pub mod config;
pub mod fixture;
pub mod version;

pub use cases::{CaseRegistry, HarnessCase};
pub use cli::{CliError, CliResult, ExitCode, run_suite};
pub use cli::test_interfaces::{CaseError, CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use cli::test_runner::{
    Capability, ConsoleReporter, HarnessError, HarnessReporter, ResultSet, TestOutcome, check_capability, report,
    run_tests,
};
pub use config::{Config, ConfigArgs, ConfigError, configure};
pub use fixture::Fixture;

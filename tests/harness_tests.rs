//! Integration tests for the test harness run loop
//!
//! These drive `run_tests` / `run_suite` with scripted cases and a scripted command runner, so they need
//! neither a JS shell nor the sixgill toolchain.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use hazard_harness::{
    CaseError, CaseRegistry, CommandOutput, CommandRunner, CommandSpec, Config, ConfigArgs, ConsoleReporter,
    ExitCode, Fixture, HarnessCase, HarnessError, configure, report, run_suite, run_tests,
};

/// Program name that the scripted runner always fails.
const FAILING_TOOL: &str = "failing-tool";

/// Answers the ctypes probe with `probe_code`; fails `FAILING_TOOL`; everything else succeeds.
struct ScriptedRunner {
    js: PathBuf,
    probe_code: i32,
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        if spec.program == self.js {
            return Ok(CommandOutput {
                code: Some(self.probe_code),
                stdout: String::new(),
            });
        }
        if spec.program.ends_with(FAILING_TOOL) {
            return Ok(CommandOutput::failure(2));
        }
        Ok(CommandOutput::success(""))
    }
}

#[derive(Clone, Copy)]
enum Behavior {
    Pass,
    ToolFails,
    AssertionFails,
}

/// Records each execution as `(name, outdir)` and then behaves as told.
struct ScriptedCase {
    name: &'static str,
    behavior: Behavior,
    log: Rc<RefCell<Vec<(String, PathBuf)>>>,
}

impl HarnessCase for ScriptedCase {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, fixture: &Fixture<'_>) -> Result<(), CaseError> {
        self.log.borrow_mut().push((fixture.name.clone(), fixture.outdir.clone()));
        match self.behavior {
            Behavior::Pass => Ok(()),
            Behavior::ToolFails => {
                fixture.run(&fixture.command(FAILING_TOOL))?;
                Ok(())
            }
            Behavior::AssertionFails => hazard_harness::assert::equal(&1, &2),
        }
    }
}

struct Suite {
    _root: tempfile::TempDir,
    config: Config,
    registry: CaseRegistry,
    log: Rc<RefCell<Vec<(String, PathBuf)>>>,
}

impl Suite {
    fn new(cases: &[(&'static str, Behavior)]) -> Self {
        let root = tempfile::tempdir().unwrap();
        let config = configure(ConfigArgs {
            js: Some(PathBuf::from("/opt/js")),
            test_root: Some(root.path().join("t")),
            ..ConfigArgs::default()
        })
        .unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CaseRegistry::new();
        for &(name, behavior) in cases {
            registry.register(Box::new(ScriptedCase {
                name,
                behavior,
                log: Rc::clone(&log),
            }));
        }
        Self {
            _root: root,
            config,
            registry,
            log,
        }
    }

    fn runner(&self, probe_code: i32) -> ScriptedRunner {
        ScriptedRunner {
            js: self.config.js.clone(),
            probe_code,
        }
    }

    fn executed(&self) -> Vec<String> {
        self.log.borrow().iter().map(|(name, _)| name.clone()).collect()
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn six(behavior_of: impl Fn(usize) -> Behavior) -> Vec<(&'static str, Behavior)> {
    SIX.into_iter()
        .enumerate()
        .map(|(i, name)| (name, behavior_of(i + 1)))
        .collect()
}

const SIX: [&str; 6] = ["test1", "test2", "test3", "test4", "test5", "test6"];

#[test]
fn subprocess_failure_is_isolated() {
    let suite = Suite::new(&six(|i| if i == 3 { Behavior::ToolFails } else { Behavior::Pass }));
    let runner = suite.runner(0);
    let mut reporter = ConsoleReporter::new(Vec::new());

    let results = run_tests(&suite.config, &names(&SIX), &suite.registry, &runner, &mut reporter).unwrap();

    assert_eq!(suite.executed(), names(&SIX));
    assert_eq!(results.failed(), ["test3"]);
    assert_eq!(results.passed().len(), 5);
    assert_eq!(results.executed(), 6);

    let err = report(&results, &mut reporter).unwrap_err();
    assert_eq!(err.message, "Failed tests: test3");
    assert_eq!(err.exit_code, ExitCode::FAILURE);
}

#[test]
fn assertion_failure_aborts_the_run() {
    let suite = Suite::new(&six(|i| if i == 2 { Behavior::AssertionFails } else { Behavior::Pass }));
    let runner = suite.runner(0);
    let mut reporter = ConsoleReporter::new(Vec::new());

    let err = run_tests(&suite.config, &names(&SIX), &suite.registry, &runner, &mut reporter).unwrap_err();

    assert_eq!(suite.executed(), names(&["test1", "test2"]));
    match err {
        HarnessError::Aborted { name, source, results } => {
            assert_eq!(name, "test2");
            assert!(matches!(source, CaseError::Assertion { .. }));
            assert_eq!(results.passed(), ["test1"]);
            assert_eq!(results.failed(), ["test2"]);
        }
        other => panic!("expected abort, got {other}"),
    }

    let output = String::from_utf8(reporter.into_inner()).unwrap();
    insta::assert_snapshot!(output.trim_end(), @r"
    START TEST test1
    TEST-PASSED: test1
    START TEST test2
    TEST-FAILED: test2
    ");
}

#[test]
fn aborted_suite_reports_no_summary() {
    let suite = Suite::new(&[("test1", Behavior::AssertionFails)]);
    let runner = suite.runner(0);
    let mut reporter = ConsoleReporter::new(Vec::new());

    let err = run_suite(&suite.config, &names(&["test1"]), &suite.registry, &runner, &mut reporter).unwrap_err();

    assert_eq!(err.exit_code, ExitCode::FAILURE);
    assert!(err.message.contains("test test1 aborted the run"));
    let output = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(!output.contains("tests passed"));
}

#[test]
fn stale_databases_are_purged_before_each_test() {
    let suite = Suite::new(&[("hazards", Behavior::Pass)]);
    let outdir = suite.config.output_root().join("hazards");
    fs::create_dir_all(&outdir).unwrap();
    fs::write(outdir.join("src_body.xdb"), "stale").unwrap();
    fs::write(outdir.join("src_comp.xdb"), "stale").unwrap();
    fs::write(outdir.join("defaults.py"), "keep").unwrap();
    let runner = suite.runner(0);
    let mut reporter = ConsoleReporter::new(Vec::new());

    run_tests(&suite.config, &names(&["hazards"]), &suite.registry, &runner, &mut reporter).unwrap();

    assert!(!outdir.join("src_body.xdb").exists());
    assert!(!outdir.join("src_comp.xdb").exists());
    assert!(outdir.join("defaults.py").exists());
}

#[test]
fn path_and_basename_name_the_same_test() {
    let by_name = Suite::new(&[("graph", Behavior::Pass)]);
    let mut reporter = ConsoleReporter::new(Vec::new());
    let results = run_tests(
        &by_name.config,
        &names(&["graph"]),
        &by_name.registry,
        &by_name.runner(0),
        &mut reporter,
    )
    .unwrap();
    assert_eq!(results.passed(), ["graph"]);

    let log_by_name = by_name.log.borrow().clone();
    by_name.log.borrow_mut().clear();

    let results = run_tests(
        &by_name.config,
        &names(&["js/src/devtools/rootAnalysis/t/graph"]),
        &by_name.registry,
        &by_name.runner(0),
        &mut reporter,
    )
    .unwrap();
    assert_eq!(results.passed(), ["graph"]);
    assert_eq!(*by_name.log.borrow(), log_by_name);
    assert_eq!(log_by_name[0].1, by_name.config.output_root().join("graph"));
}

#[test]
fn duplicate_basenames_run_once() {
    let suite = Suite::new(&[("graph", Behavior::Pass)]);
    let mut reporter = ConsoleReporter::new(Vec::new());

    let results = run_tests(
        &suite.config,
        &names(&["a/graph", "graph", "b/graph"]),
        &suite.registry,
        &suite.runner(0),
        &mut reporter,
    )
    .unwrap();

    assert_eq!(suite.executed(), names(&["graph"]));
    assert_eq!(results.executed(), 1);
}

#[test]
fn unsupported_shell_skips_everything() {
    let suite = Suite::new(&six(|_| Behavior::Pass));
    let runner = suite.runner(1);
    let mut reporter = ConsoleReporter::new(Vec::new());

    let code = run_suite(&suite.config, &names(&SIX), &suite.registry, &runner, &mut reporter).unwrap();

    assert_eq!(code, ExitCode::SKIP);
    assert!(suite.executed().is_empty());
    assert!(reporter.into_inner().is_empty());
    assert!(!suite.config.output_root().exists());
}

#[test]
fn passing_suite_prints_count() {
    let suite = Suite::new(&[("graph", Behavior::Pass), ("virtual", Behavior::Pass)]);
    let runner = suite.runner(0);
    let mut reporter = ConsoleReporter::new(Vec::new());

    let code = run_suite(
        &suite.config,
        &names(&["virtual", "graph"]),
        &suite.registry,
        &runner,
        &mut reporter,
    )
    .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(suite.executed(), names(&["virtual", "graph"]));
    let output = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(output.ends_with("All 2 tests passed.\n"));
}

#[test]
fn unknown_test_fails_without_stopping_the_run() {
    let suite = Suite::new(&[("graph", Behavior::Pass)]);
    let mut reporter = ConsoleReporter::new(Vec::new());

    let results = run_tests(
        &suite.config,
        &names(&["nonexistent", "graph"]),
        &suite.registry,
        &suite.runner(0),
        &mut reporter,
    )
    .unwrap();

    assert_eq!(results.failed(), ["nonexistent"]);
    assert_eq!(results.passed(), ["graph"]);
    assert!(!suite.config.output_root().join("nonexistent").exists());
}

#[test]
fn output_directories_live_under_the_test_root() {
    let suite = Suite::new(&[("virtual", Behavior::Pass)]);
    let mut reporter = ConsoleReporter::new(Vec::new());

    run_tests(&suite.config, &names(&["virtual"]), &suite.registry, &suite.runner(0), &mut reporter).unwrap();

    let outdir = &suite.log.borrow()[0].1;
    assert!(outdir.is_dir());
    assert!(outdir.starts_with(suite.config.test_root.join("out")));
    assert_eq!(outdir.file_name(), Some(Path::new("virtual").as_os_str()));
}

/// A JS shell that cannot be started.
struct MissingShell;

impl CommandRunner for MissingShell {
    fn run(&self, _spec: &CommandSpec) -> io::Result<CommandOutput> {
        Err(io::Error::new(io::ErrorKind::NotFound, "No such file or directory"))
    }
}

#[test]
fn unstartable_shell_is_a_failure_not_a_skip() {
    let suite = Suite::new(&six(|_| Behavior::Pass));
    let mut reporter = ConsoleReporter::new(Vec::new());

    let err = run_suite(&suite.config, &names(&SIX), &suite.registry, &MissingShell, &mut reporter).unwrap_err();

    assert_eq!(err.exit_code, ExitCode::FAILURE);
    assert!(err.message.starts_with("Error: cannot run capability check"));
    assert!(suite.executed().is_empty());
    assert!(reporter.into_inner().is_empty());
    assert!(!suite.config.output_root().exists());
}

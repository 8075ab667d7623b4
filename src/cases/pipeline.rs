//! Declarative analysis test cases
//!
//! A [`PipelineCase`] compiles one source file from the input directory, runs the analysis up to a chosen
//! phase, then verifies a list of [`Check`]s against expectation files stored next to the source.
//!
//! ## Expectation formats
//!
//! Expectation files hold one entry per line; blank and `#` lines are ignored and order does not matter.
//!
//! - `Check::DbKeys`: substrings that must each appear in some database key
//! - `Check::FunctionList`: readable function names
//! - `Check::Hazards`: `<variable> in <function>`
//! - `Check::CallEdges`: `<caller> -> <callee>`

use std::collections::BTreeSet;

use crate::analysis::{GC_FUNCTIONS_LIST, Phase, SUPPRESSED_FUNCTIONS_LIST};
use crate::assert::equal;
use crate::cli::test_interfaces::CaseError;
use crate::fixture::Fixture;

use super::HarnessCase;

/// Source file compiled by every pipeline case.
pub const SOURCE_FILE: &str = "source.cpp";

/// A verification step run after the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    DbKeys { db: &'static str, expected: &'static str },
    FunctionList { output: &'static str, expected: &'static str },
    Hazards { expected: &'static str },
    CallEdges { expected: &'static str },
}

impl Check {
    /// Compare analysis output with the expectation file.
    ///
    /// ## Errors
    ///
    /// `CaseError::Assertion` on a mismatch; I/O, parse and tool errors otherwise.
    pub fn verify(&self, fixture: &Fixture<'_>) -> Result<(), CaseError> {
        match *self {
            Check::DbKeys { db, expected } => {
                let keys = fixture.db_keys(db)?;
                let missing: Vec<String> = fixture
                    .expected_lines(expected)?
                    .into_iter()
                    .filter(|needle| !keys.iter().any(|key| key.contains(needle.as_str())))
                    .collect();
                equal(&missing, &Vec::new())
            }
            Check::FunctionList { output, expected } => {
                let got: BTreeSet<String> = fixture.load_function_list(output)?.into_iter().collect();
                equal(&got, &expected_set(fixture, expected)?)
            }
            Check::Hazards { expected } => {
                let got: BTreeSet<String> = fixture
                    .load_hazards()?
                    .iter()
                    .map(|h| format!("{} in {}", h.variable, h.function_name()))
                    .collect();
                equal(&got, &expected_set(fixture, expected)?)
            }
            Check::CallEdges { expected } => {
                let got: BTreeSet<String> = fixture
                    .load_callgraph()?
                    .iter()
                    .map(|e| format!("{} -> {}", e.caller, e.callee))
                    .collect();
                equal(&got, &expected_set(fixture, expected)?)
            }
        }
    }
}

fn expected_set(fixture: &Fixture<'_>, file: &str) -> Result<BTreeSet<String>, CaseError> {
    Ok(fixture.expected_lines(file)?.into_iter().collect())
}

/// Compile, analyze, verify.
#[derive(Debug, Clone)]
pub struct PipelineCase {
    pub name: &'static str,
    pub compile_options: &'static [&'static str],
    /// Last analysis phase to run; `None` stops after compiling
    pub last_phase: Option<Phase>,
    pub checks: &'static [Check],
}

impl HarnessCase for PipelineCase {
    fn name(&self) -> &str {
        self.name
    }

    #[tracing::instrument(skip_all, fields(test = self.name))]
    fn run(&self, fixture: &Fixture<'_>) -> Result<(), CaseError> {
        fixture.compile(SOURCE_FILE, self.compile_options)?;
        if let Some(last) = self.last_phase {
            fixture.run_analysis(Phase::Callgraph, last)?;
        }
        for check in self.checks {
            check.verify(fixture)?;
        }
        Ok(())
    }
}

/// The analysis test suite.
pub static BUILTIN_CASES: &[PipelineCase] = &[
    PipelineCase {
        name: "sixgill-tree",
        compile_options: &[],
        last_phase: None,
        checks: &[Check::DbKeys {
            db: "src_body",
            expected: "expected_keys.txt",
        }],
    },
    PipelineCase {
        name: "suppression",
        compile_options: &[],
        last_phase: Some(Phase::GcFunctions),
        checks: &[Check::FunctionList {
            output: SUPPRESSED_FUNCTIONS_LIST,
            expected: "expected_suppressed.txt",
        }],
    },
    PipelineCase {
        name: "hazards",
        compile_options: &[],
        last_phase: Some(Phase::Hazards),
        checks: &[Check::Hazards {
            expected: "expected_hazards.txt",
        }],
    },
    PipelineCase {
        name: "exceptions",
        compile_options: &["-fexceptions"],
        last_phase: Some(Phase::Hazards),
        checks: &[Check::Hazards {
            expected: "expected_hazards.txt",
        }],
    },
    PipelineCase {
        name: "virtual",
        compile_options: &[],
        last_phase: Some(Phase::GcFunctions),
        checks: &[Check::FunctionList {
            output: GC_FUNCTIONS_LIST,
            expected: "expected_gc_functions.txt",
        }],
    },
    PipelineCase {
        name: "graph",
        compile_options: &[],
        last_phase: Some(Phase::Callgraph),
        checks: &[Check::CallEdges {
            expected: "expected_edges.txt",
        }],
    },
];

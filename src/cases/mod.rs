//! Test cases and the registry that names them
//!
//! Every test is a [`HarnessCase`]: a value with a name and a `run` operation over a [`Fixture`]. The run
//! loop looks cases up by name in a [`CaseRegistry`]; [`CaseRegistry::builtin`] holds the analysis suite.

pub mod pipeline;

use std::collections::BTreeMap;

use crate::cli::test_interfaces::CaseError;
use crate::fixture::Fixture;

pub use pipeline::{Check, PipelineCase};

/// A single named test.
pub trait HarnessCase {
    fn name(&self) -> &str;

    /// Run the test against its fixture.
    ///
    /// ## Errors
    ///
    /// Return `CaseError::Assertion` for violated expectations (aborts the run) and any other variant for
    /// failures that only fail this test.
    fn run(&self, fixture: &Fixture<'_>) -> Result<(), CaseError>;
}

/// Test cases keyed by name.
#[derive(Default)]
pub struct CaseRegistry {
    cases: BTreeMap<String, Box<dyn HarnessCase>>,
}

impl CaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in analysis suite.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for case in pipeline::BUILTIN_CASES {
            registry.register(Box::new(case.clone()));
        }
        registry
    }

    /// Add a case, replacing any existing case with the same name.
    pub fn register(&mut self, case: Box<dyn HarnessCase>) {
        self.cases.insert(case.name().to_string(), case);
    }

    pub fn get(&self, name: &str) -> Option<&dyn HarnessCase> {
        self.cases.get(name).map(|case| case.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cases.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

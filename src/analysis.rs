//! Analysis phases driven through the JS shell
//!
//! The hazard analysis runs as an ordered pipeline of JS scripts. Each phase reads the outputs of earlier
//! phases from the working directory and writes its own. A test picks a contiguous range of phases with
//! [`phase_range`].

use std::fmt;

/// Hazard report written from the stdout of the last phase.
pub const HAZARDS_FILE: &str = "rootingHazards.txt";
pub const CALLGRAPH_FILE: &str = "callgraph.txt";
pub const GC_FUNCTIONS_LIST: &str = "gcFunctions.lst";
pub const SUPPRESSED_FUNCTIONS_LIST: &str = "suppressedFunctions.lst";

/// One step of the analysis pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Callgraph,
    GcTypes,
    GcFunctions,
    Hazards,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Callgraph, Phase::GcTypes, Phase::GcFunctions, Phase::Hazards];

    /// Name used on analysis command lines (`--first gcTypes`).
    pub fn name(self) -> &'static str {
        match self {
            Phase::Callgraph => "callgraph",
            Phase::GcTypes => "gcTypes",
            Phase::GcFunctions => "gcFunctions",
            Phase::Hazards => "hazards",
        }
    }

    /// Script file, relative to the analysis directory.
    pub fn script(self) -> &'static str {
        match self {
            Phase::Callgraph => "computeCallgraph.js",
            Phase::GcTypes => "computeGCTypes.js",
            Phase::GcFunctions => "computeGCFunctions.js",
            Phase::Hazards => "analyzeRoots.js",
        }
    }

    /// File arguments passed to the script, relative to the output directory.
    pub fn args(self) -> &'static [&'static str] {
        match self {
            Phase::Callgraph => &[CALLGRAPH_FILE],
            Phase::GcTypes => &["gcTypes.txt", "typeInfo.txt"],
            Phase::GcFunctions => &[
                CALLGRAPH_FILE,
                "gcFunctions.txt",
                GC_FUNCTIONS_LIST,
                "gcEdges.txt",
                SUPPRESSED_FUNCTIONS_LIST,
            ],
            Phase::Hazards => &[
                GC_FUNCTIONS_LIST,
                "gcEdges.txt",
                SUPPRESSED_FUNCTIONS_LIST,
                "gcTypes.txt",
                "typeInfo.txt",
            ],
        }
    }

    /// File that receives the script's stdout, if the phase reports that way.
    pub fn stdout_file(self) -> Option<&'static str> {
        match self {
            Phase::Hazards => Some(HAZARDS_FILE),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Phases from `first` through `last`, inclusive, in pipeline order.
///
/// An inverted range (`first` after `last`) is empty.
pub fn phase_range(first: Phase, last: Phase) -> Vec<Phase> {
    Phase::ALL.into_iter().filter(|p| *p >= first && *p <= last).collect()
}

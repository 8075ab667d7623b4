//! Parse the text artifacts written by the rooting hazard analysis.
//!
//! The analysis phases leave plain-text reports in the output directory of each test. This crate turns those
//! reports into typed values so test cases can compare them against expectations.
//!
//! ## Notes
//!
//! - This is a pure parsing crate: **no IO**. Callers read the files and pass the contents in.
//! - Current scope: hazard reports (`rootingHazards.txt`), function lists (`gcFunctions.lst`,
//!   `suppressedFunctions.lst`) and callgraph edges (`callgraph.txt`).

pub mod callgraph;
pub mod errors;
pub mod functions;
pub mod hazards;

pub use callgraph::{CallEdge, parse_callgraph};
pub use errors::OutputError;
pub use functions::parse_function_list;
pub use hazards::{Hazard, parse_hazards};

/// Iterate the meaningful lines of a report: trimmed, non-blank, not `#` comments.
///
/// ## Returns
/// - An iterator of `(line_number, line)` pairs; line numbers are 1-based.
pub fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

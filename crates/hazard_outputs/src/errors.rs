//! Errors produced while parsing analysis reports.

use thiserror::Error;

/// A report line that does not have the shape its file format requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    #[error("line {line}: malformed hazard record: {text}")]
    MalformedHazard { line: usize, text: String },

    #[error("line {line}: malformed callgraph record: {text}")]
    MalformedEdge { line: usize, text: String },
}

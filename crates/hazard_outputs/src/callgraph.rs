//! Parse the callgraph (`callgraph.txt`).
//!
//! The file interns function names and then refers to them by id:
//!
//! ```text
//! #1 void caller()
//! #2 void callee()
//! D 1 2
//! ```
//!
//! `#<id> <name>` lines define names, `D <caller> <callee>` lines are direct call edges. Other record kinds
//! (field calls, suppression markers) are ignored.

use std::collections::HashMap;

use crate::errors::OutputError;
use crate::hazards::readable_name;

/// A direct call from one function to another, by readable name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
}

/// Parse the direct call edges of a callgraph.
///
/// ## Returns
/// - (`Vec<CallEdge>`): edges in file order with ids resolved to readable names.
///
/// ## Errors
/// - `OutputError::MalformedEdge` for an edge with a missing or non-numeric id, or one that refers to an id
///   that was never defined.
pub fn parse_callgraph(text: &str) -> Result<Vec<CallEdge>, OutputError> {
    let mut names: HashMap<u64, &str> = HashMap::new();
    let mut raw_edges: Vec<(usize, &str, u64, u64)> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let record = raw.trim();
        if let Some(def) = record.strip_prefix('#') {
            // Name definitions may appear after the edges that use them.
            if let Some((id, name)) = def.split_once(' ') {
                if let Ok(id) = id.parse::<u64>() {
                    names.insert(id, readable_name(name.trim()));
                }
            }
        } else if let Some(ids) = record.strip_prefix("D ") {
            let malformed = || OutputError::MalformedEdge {
                line,
                text: record.to_string(),
            };
            let mut parts = ids.split_whitespace();
            let caller = parts.next().and_then(|s| s.parse::<u64>().ok()).ok_or_else(malformed)?;
            let callee = parts.next().and_then(|s| s.parse::<u64>().ok()).ok_or_else(malformed)?;
            raw_edges.push((line, record, caller, callee));
        }
    }

    tracing::debug!(names = names.len(), edges = raw_edges.len(), "parsed callgraph");
    raw_edges
        .into_iter()
        .map(|(line, record, caller, callee)| {
            match (names.get(&caller), names.get(&callee)) {
                (Some(caller), Some(callee)) => Ok(CallEdge {
                    caller: (*caller).to_string(),
                    callee: (*callee).to_string(),
                }),
                _ => Err(OutputError::MalformedEdge {
                    line,
                    text: record.to_string(),
                }),
            }
        })
        .collect()
}

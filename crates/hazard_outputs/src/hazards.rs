//! Parse hazard reports (`rootingHazards.txt`).
//!
//! A hazard record has the shape:
//!
//! ```text
//! Function '<function>' has unrooted '<variable>' of type '<type>' live across GC call '<call>' at <location>
//! ```
//!
//! Every other line in the report (headers, explanations, blank lines) is ignored.

use crate::content_lines;
use crate::errors::OutputError;

const RECORD_PREFIX: &str = "Function '";
const VARIABLE_SEP: &str = "' has unrooted '";
const TYPE_SEP: &str = "' of type '";
const CALL_SEP: &str = "' live across GC call '";
const LOCATION_SEP: &str = "' at ";

/// One unrooted GC pointer that is live across a call that can GC.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Hazard {
    pub function: String,
    pub variable: String,
    pub ty: String,
    pub gc_call: String,
    pub location: String,
}

impl Hazard {
    /// The readable part of the enclosing function name.
    ///
    /// Names may be written as `<mangled>$<readable>`; only the readable half is returned in that case.
    pub fn function_name(&self) -> &str {
        readable_name(&self.function)
    }

    /// The readable part of the GC call name.
    pub fn gc_call_name(&self) -> &str {
        readable_name(&self.gc_call)
    }
}

/// Strip the mangled half of a `<mangled>$<readable>` pair.
pub fn readable_name(name: &str) -> &str {
    match name.split_once('$') {
        Some((_, readable)) => readable,
        None => name,
    }
}

/// Parse every hazard record in a report.
///
/// ## Parameters
/// - `text`: the full contents of a hazard report.
///
/// ## Returns
/// - (`Vec<Hazard>`): records in file order.
///
/// ## Errors
/// - `OutputError::MalformedHazard` when a line starts like a record but is missing one of its fields.
pub fn parse_hazards(text: &str) -> Result<Vec<Hazard>, OutputError> {
    let mut hazards = Vec::new();
    for (line, record) in content_lines(text) {
        let Some(rest) = record.strip_prefix(RECORD_PREFIX) else {
            continue;
        };
        let hazard = parse_record(rest).ok_or_else(|| OutputError::MalformedHazard {
            line,
            text: record.to_string(),
        })?;
        hazards.push(hazard);
    }
    tracing::debug!(count = hazards.len(), "parsed hazard report");
    Ok(hazards)
}

fn parse_record(rest: &str) -> Option<Hazard> {
    let (function, rest) = rest.split_once(VARIABLE_SEP)?;
    let (variable, rest) = rest.split_once(TYPE_SEP)?;
    let (ty, rest) = rest.split_once(CALL_SEP)?;
    // Call names can contain `' at ` only in pathological cases; take the last separator.
    let (gc_call, location) = rest.rsplit_once(LOCATION_SEP)?;

    Some(Hazard {
        function: function.to_string(),
        variable: variable.to_string(),
        ty: ty.to_string(),
        gc_call: gc_call.to_string(),
        location: location.trim().to_string(),
    })
}

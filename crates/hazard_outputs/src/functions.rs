//! Parse function lists (`gcFunctions.lst`, `suppressedFunctions.lst`).

use crate::content_lines;
use crate::hazards::readable_name;

/// Parse a function list into readable function names, in file order.
///
/// ## Notes
/// - `<mangled>$<readable>` entries keep only the readable half.
/// - Blank lines and `#` comments are skipped.
pub fn parse_function_list(text: &str) -> Vec<String> {
    content_lines(text)
        .map(|(_, line)| readable_name(line).to_string())
        .collect()
}

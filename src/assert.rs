//! Equality assertions for test cases
//!
//! A failed [`equal`] produces `CaseError::Assertion`, which aborts the whole run. Use it for expectations
//! about analysis results; tool failures are reported by the fixture as `CaseError::Subprocess`.

use std::fmt::Debug;

use crate::cli::test_interfaces::CaseError;

/// Check that `got` equals `expected`.
///
/// ## Errors
///
/// Returns `CaseError::Assertion` with both values rendered when they differ.
pub fn equal<T>(got: &T, expected: &T) -> Result<(), CaseError>
where
    T: PartialEq + Debug + ?Sized,
{
    if got == expected {
        Ok(())
    } else {
        Err(CaseError::Assertion {
            message: format!("Got '{:?}', expected '{:?}'", got, expected),
        })
    }
}

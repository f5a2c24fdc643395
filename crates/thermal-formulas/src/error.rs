//! Error types for formula evaluation.

use thiserror::Error;

/// Errors that can occur while evaluating a formula.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// Input grids have different numbers of points.
    #[error("length mismatch: {name} has {found} points, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    /// Integration interval ends before it begins.
    #[error("invalid time interval [{begin}, {end}]")]
    InvalidInterval { begin: f64, end: f64 },

    /// An input is outside the formula's domain.
    #[error("invalid input {name}: {reason}")]
    InvalidInput { name: &'static str, reason: String },

    /// The formula is not provided by this implementation.
    #[error("formula not available: {0}")]
    Unavailable(&'static str),
}

/// Result type for formula evaluation.
pub type Result<T> = std::result::Result<T, FormulaError>;

/// Check that every named grid has the length of the first one.
pub(crate) fn check_lengths(grids: &[(&'static str, &[f64])]) -> Result<usize> {
    let expected = grids.first().map(|(_, g)| g.len()).unwrap_or(0);
    for &(name, grid) in grids {
        if grid.len() != expected {
            return Err(FormulaError::LengthMismatch {
                name,
                expected,
                found: grid.len(),
            });
        }
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_lengths() {
        assert_eq!(check_lengths(&[("a", &[1.0, 2.0]), ("b", &[3.0, 4.0])]), Ok(2));
        assert_eq!(check_lengths(&[]), Ok(0));

        let err = check_lengths(&[("a", &[1.0, 2.0]), ("b", &[3.0])]).unwrap_err();
        assert_eq!(
            err,
            FormulaError::LengthMismatch {
                name: "b",
                expected: 2,
                found: 1
            }
        );
        assert!(err.to_string().contains("b has 1 points"));
    }
}

//! Feature Error Types

use thiserror::Error;

/// Errors during input validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of the documented domain
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// NaN or infinite input
    #[error("{field} value {value} is not a finite number")]
    NonFinite { field: &'static str, value: f64 },
}

/// Errors at the feature assembly boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    /// Column and value counts differ, or differ from the trained width
    #[error("Invalid feature vector shape: expected {expected} columns, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    /// A column is not where the trained order puts it
    #[error("Feature column {index} is `{actual}`, expected `{expected}`")]
    WrongOrder {
        index: usize,
        expected: String,
        actual: String,
    },
}

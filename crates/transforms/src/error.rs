//! Transform Error Types

use thiserror::Error;

/// Errors raised while applying a fitted transform
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Box-Cox is only defined for strictly positive input
    #[error("Box-Cox input must be positive, got {value} (lambda = {lambda})")]
    NonPositiveInput { value: f64, lambda: f64 },

    /// NaN or infinite value handed to a transform
    #[error("Non-finite input value: {0}")]
    NonFinite(f64),

    /// Fitted parameters are structurally unusable
    #[error("Invalid transform parameters: {0}")]
    InvalidParameters(String),
}

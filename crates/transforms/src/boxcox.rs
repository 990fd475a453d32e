//! Box-Cox Power Transform

use crate::error::TransformError;
use crate::FeatureTransform;
use serde::{Deserialize, Serialize};

/// Exponents this close to zero use the logarithmic branch
const LOG_BRANCH_EPSILON: f64 = 1e-19;

/// Box-Cox transform with a fitted exponent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxCox {
    pub lambda: f64,
}

impl BoxCox {
    /// Create a transform, rejecting a non-finite exponent
    pub fn new(lambda: f64) -> Result<Self, TransformError> {
        let transform = Self { lambda };
        transform.validate()?;
        Ok(transform)
    }

    /// Check the fitted exponent
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.lambda.is_finite() {
            Ok(())
        } else {
            Err(TransformError::InvalidParameters(format!(
                "lambda must be finite, got {}",
                self.lambda
            )))
        }
    }

    /// `(x^lambda - 1) / lambda`, or `ln(x)` when lambda is zero
    pub fn transform(&self, x: f64) -> Result<f64, TransformError> {
        if x.is_nan() || x.is_infinite() {
            return Err(TransformError::NonFinite(x));
        }
        self.validate()?;
        if x <= 0.0 {
            return Err(TransformError::NonPositiveInput {
                value: x,
                lambda: self.lambda,
            });
        }

        let log_x = x.ln();
        if self.lambda.abs() < LOG_BRANCH_EPSILON {
            Ok(log_x)
        } else {
            // expm1 keeps precision when lambda * ln(x) is small
            Ok((self.lambda * log_x).exp_m1() / self.lambda)
        }
    }

    /// Transform a batch; fails on the first non-positive element
    pub fn transform_batch(&self, values: &[f64]) -> Result<Vec<f64>, TransformError> {
        values.iter().map(|&x| self.transform(x)).collect()
    }
}

impl FeatureTransform for BoxCox {
    fn transform(&self, x: f64) -> Result<f64, TransformError> {
        BoxCox::transform(self, x)
    }

    fn describe(&self) -> String {
        format!("box-cox(lambda={})", self.lambda)
    }
}

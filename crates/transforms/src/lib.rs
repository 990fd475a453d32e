//! Feature Transforms
//!
//! Pre-fitted, per-feature normalizing transforms:
//! - Quantile transform (forward and inverse)
//! - Box-Cox power transform (forward only)
//!
//! Transforms are immutable after construction and can be shared freely
//! between threads.

mod boxcox;
mod error;
pub mod normal;
mod quantile;

pub use boxcox::BoxCox;
pub use error::TransformError;
pub use quantile::{OutputDistribution, QuantileTransform, BOUNDS_THRESHOLD};

/// Forward mapping of one raw scalar into normalized space
pub trait FeatureTransform: Send + Sync {
    /// Transform a single value
    fn transform(&self, x: f64) -> Result<f64, TransformError>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}

/// Mapping from normalized space back to physical units
pub trait InverseTransform: Send + Sync {
    /// Inverse-transform a single value
    fn inverse_transform(&self, y: f64) -> Result<f64, TransformError>;
}

/// Apply a fitted quantile transform to one value
pub fn normalize_quantile(artifact: &QuantileTransform, x: f64) -> Result<f64, TransformError> {
    artifact.transform(x)
}

/// Apply Box-Cox with exponent `lambda` to one strictly positive value
pub fn normalize_boxcox(lambda: f64, x: f64) -> Result<f64, TransformError> {
    BoxCox::new(lambda)?.transform(x)
}

/// Map one normalized value back through a fitted quantile transform
pub fn denormalize_quantile(artifact: &QuantileTransform, y: f64) -> Result<f64, TransformError> {
    artifact.inverse_transform(y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_functions_match_methods() {
        let qt = QuantileTransform::with_uniform_references(
            vec![1.0, 2.0, 4.0, 8.0],
            OutputDistribution::Normal,
        )
        .unwrap();
        let y = normalize_quantile(&qt, 3.0).unwrap();
        assert_eq!(y, qt.transform(3.0).unwrap());
        assert!((denormalize_quantile(&qt, y).unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_boxcox_formula() {
        assert_eq!(normalize_boxcox(0.0, 5.0).unwrap(), 5.0f64.ln());
        let expected = (5.0f64.powf(0.25) - 1.0) / 0.25;
        assert!((normalize_boxcox(0.25, 5.0).unwrap() - expected).abs() < 1e-12);
        assert!(normalize_boxcox(0.25, 0.0).is_err());
        assert!(normalize_boxcox(0.0, -1.0).is_err());
    }

    #[test]
    fn test_trait_objects() {
        let transforms: Vec<Box<dyn FeatureTransform>> = vec![
            Box::new(BoxCox::new(0.0).unwrap()),
            Box::new(
                QuantileTransform::with_uniform_references(
                    vec![0.0, 10.0],
                    OutputDistribution::Uniform,
                )
                .unwrap(),
            ),
        ];
        let out: Vec<f64> = transforms
            .iter()
            .map(|t| t.transform(1.0).unwrap())
            .collect();
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 0.1).abs() < 1e-12);
        assert!(transforms[0].describe().starts_with("box-cox"));
    }
}

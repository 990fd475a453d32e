//! Fitted Quantile Transform

use crate::error::TransformError;
use crate::normal;
use crate::{FeatureTransform, InverseTransform};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Margin used to detect values sitting on the fitted bounds (normal output)
pub const BOUNDS_THRESHOLD: f64 = 1e-7;

/// Target distribution of the forward transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputDistribution {
    /// Uniform on [0, 1]
    #[default]
    Uniform,
    /// Standard normal
    Normal,
}

/// Monotonic mapping between a feature's empirical distribution and a
/// reference distribution.
///
/// `quantiles[i]` is the feature value whose CDF position is `references[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileTransform {
    pub quantiles: Vec<f64>,
    pub references: Vec<f64>,
    #[serde(default)]
    pub output_distribution: OutputDistribution,
}

impl QuantileTransform {
    /// Create a transform from fitted landmarks, validating their shape
    pub fn new(
        quantiles: Vec<f64>,
        references: Vec<f64>,
        output_distribution: OutputDistribution,
    ) -> Result<Self, TransformError> {
        let transform = Self {
            quantiles,
            references,
            output_distribution,
        };
        transform.validate()?;
        Ok(transform)
    }

    /// Create a transform with evenly spaced references on [0, 1]
    pub fn with_uniform_references(
        quantiles: Vec<f64>,
        output_distribution: OutputDistribution,
    ) -> Result<Self, TransformError> {
        let n = quantiles.len();
        let references = (0..n)
            .map(|i| if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 })
            .collect();
        Self::new(quantiles, references, output_distribution)
    }

    /// Check that the landmarks describe a usable monotonic mapping
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.quantiles.len() < 2 {
            return Err(TransformError::InvalidParameters(format!(
                "need at least 2 quantiles, got {}",
                self.quantiles.len()
            )));
        }
        if self.quantiles.len() != self.references.len() {
            return Err(TransformError::InvalidParameters(format!(
                "{} quantiles but {} references",
                self.quantiles.len(),
                self.references.len()
            )));
        }
        if self.quantiles.iter().chain(&self.references).any(|v| !v.is_finite()) {
            return Err(TransformError::InvalidParameters(
                "landmarks must be finite".to_string(),
            ));
        }
        if !is_non_decreasing(&self.quantiles) {
            return Err(TransformError::InvalidParameters(
                "quantiles must be non-decreasing".to_string(),
            ));
        }
        if !is_non_decreasing(&self.references)
            || self.references[0] < 0.0
            || self.references[self.references.len() - 1] > 1.0
        {
            return Err(TransformError::InvalidParameters(
                "references must be non-decreasing within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of fitted landmarks
    pub fn n_quantiles(&self) -> usize {
        self.quantiles.len()
    }

    /// First and last landmark; fails on parameters that never went through
    /// [`validate`](Self::validate)
    fn bounds(&self) -> Result<(f64, f64), TransformError> {
        self.validate()?;
        Ok((self.quantiles[0], self.quantiles[self.quantiles.len() - 1]))
    }

    /// Map a raw value into the output distribution
    pub fn transform(&self, x: f64) -> Result<f64, TransformError> {
        if !x.is_finite() {
            return Err(TransformError::NonFinite(x));
        }

        let (lower_x, upper_x) = self.bounds()?;
        if x < lower_x || x > upper_x {
            debug!(
                "Value {} outside fitted range [{}, {}], saturating",
                x, lower_x, upper_x
            );
        }
        let (at_lower, at_upper) = match self.output_distribution {
            OutputDistribution::Normal => {
                (x - BOUNDS_THRESHOLD < lower_x, x + BOUNDS_THRESHOLD > upper_x)
            }
            OutputDistribution::Uniform => (x == lower_x, x == upper_x),
        };

        // Averaging the ascending and descending interpolations centres
        // values that land on repeated quantiles.
        let y = if at_lower {
            0.0
        } else if at_upper {
            1.0
        } else {
            let neg_q: Vec<f64> = self.quantiles.iter().rev().map(|q| -q).collect();
            let neg_r: Vec<f64> = self.references.iter().rev().map(|r| -r).collect();
            0.5 * (interp(x, &self.quantiles, &self.references) - interp(-x, &neg_q, &neg_r))
        };

        match self.output_distribution {
            OutputDistribution::Uniform => Ok(y),
            OutputDistribution::Normal => {
                let (clip_min, clip_max) = normal_clip_bounds();
                Ok(normal::ppf(y).clamp(clip_min, clip_max))
            }
        }
    }

    /// Map a value from the output distribution back to feature units
    pub fn inverse_transform(&self, y: f64) -> Result<f64, TransformError> {
        if !y.is_finite() {
            return Err(TransformError::NonFinite(y));
        }
        let (lower_y, upper_y) = self.bounds()?;

        let p = match self.output_distribution {
            OutputDistribution::Normal => normal::cdf(y),
            OutputDistribution::Uniform => y,
        };
        let (at_lower, at_upper) = match self.output_distribution {
            OutputDistribution::Normal => (p - BOUNDS_THRESHOLD < 0.0, p + BOUNDS_THRESHOLD > 1.0),
            OutputDistribution::Uniform => (p == 0.0, p == 1.0),
        };
        if at_lower || at_upper {
            debug!("Inverse input {} saturates at the fitted bounds", y);
        }

        if at_lower {
            Ok(lower_y)
        } else if at_upper {
            Ok(upper_y)
        } else {
            Ok(interp(p, &self.references, &self.quantiles))
        }
    }

    /// Forward-transform a batch; each element is independent
    pub fn transform_batch(&self, values: &[f64]) -> Result<Vec<f64>, TransformError> {
        values.iter().map(|&x| self.transform(x)).collect()
    }

    /// Inverse-transform a batch; each element is independent
    pub fn inverse_transform_batch(&self, values: &[f64]) -> Result<Vec<f64>, TransformError> {
        values.iter().map(|&y| self.inverse_transform(y)).collect()
    }
}

impl FeatureTransform for QuantileTransform {
    fn transform(&self, x: f64) -> Result<f64, TransformError> {
        QuantileTransform::transform(self, x)
    }

    fn describe(&self) -> String {
        format!(
            "quantile({} landmarks, {:?})",
            self.n_quantiles(),
            self.output_distribution
        )
    }
}

impl InverseTransform for QuantileTransform {
    fn inverse_transform(&self, y: f64) -> Result<f64, TransformError> {
        QuantileTransform::inverse_transform(self, y)
    }
}

/// Clip range applied to the normal output so bound values stay finite
fn normal_clip_bounds() -> (f64, f64) {
    let margin = BOUNDS_THRESHOLD - f64::EPSILON;
    (normal::ppf(margin), normal::ppf(1.0 - margin))
}

/// Piecewise-linear interpolation clamped to the end points.
///
/// `xp` must be non-decreasing. For runs of equal `xp` the last one wins.
fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len();
    let j = xp.partition_point(|&v| v <= x);
    if j == 0 {
        return fp[0];
    }
    if j == n {
        return fp[n - 1];
    }
    let i = j - 1;
    let dx = xp[j] - xp[i];
    if dx == 0.0 {
        return fp[i];
    }
    fp[i] + (x - xp[i]) * (fp[j] - fp[i]) / dx
}

fn is_non_decreasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uniform() -> QuantileTransform {
        QuantileTransform::with_uniform_references(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            OutputDistribution::Uniform,
        )
        .unwrap()
    }

    fn normal() -> QuantileTransform {
        QuantileTransform::with_uniform_references(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            OutputDistribution::Normal,
        )
        .unwrap()
    }

    #[test]
    fn test_uniform_interpolation() {
        let qt = uniform();
        assert!((qt.transform(1.5).unwrap() - 0.375).abs() < 1e-12);
        assert_eq!(qt.transform(0.0).unwrap(), 0.0);
        assert_eq!(qt.transform(4.0).unwrap(), 1.0);
    }

    #[test]
    fn test_uniform_clamps_outside_fit() {
        let qt = uniform();
        assert_eq!(qt.transform(-10.0).unwrap(), 0.0);
        assert_eq!(qt.transform(10.0).unwrap(), 1.0);
    }

    #[test]
    fn test_normal_median_maps_to_zero() {
        let qt = normal();
        assert!(qt.transform(2.0).unwrap().abs() < 1e-12);
        assert!(qt.transform(3.0).unwrap() > 0.0);
        assert!(qt.transform(1.0).unwrap() < 0.0);
    }

    #[test]
    fn test_normal_clips_at_bounds() {
        let qt = normal();
        let high = qt.transform(100.0).unwrap();
        let low = qt.transform(-100.0).unwrap();
        assert!(high > 5.19 && high < 5.2, "high = {high}");
        assert!((low + high).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_quantiles_average() {
        let qt = QuantileTransform::with_uniform_references(
            vec![0.0, 1.0, 1.0, 2.0],
            OutputDistribution::Uniform,
        )
        .unwrap();
        // references at 1.0 are 1/3 and 2/3
        assert!((qt.transform(1.0).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_uniform() {
        let qt = uniform();
        assert!((qt.inverse_transform(0.375).unwrap() - 1.5).abs() < 1e-12);
        assert_eq!(qt.inverse_transform(0.0).unwrap(), 0.0);
        assert_eq!(qt.inverse_transform(1.0).unwrap(), 4.0);
    }

    #[test]
    fn test_inverse_normal_saturates() {
        let qt = normal();
        assert_eq!(qt.inverse_transform(-9.0).unwrap(), 0.0);
        assert_eq!(qt.inverse_transform(9.0).unwrap(), 4.0);
        assert!((qt.inverse_transform(0.0).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_rejected() {
        let qt = normal();
        assert!(matches!(qt.transform(f64::NAN), Err(TransformError::NonFinite(_))));
        assert!(matches!(
            qt.inverse_transform(f64::INFINITY),
            Err(TransformError::NonFinite(_))
        ));
    }

    #[test]
    fn test_invalid_landmarks() {
        assert!(QuantileTransform::with_uniform_references(vec![1.0], OutputDistribution::Normal).is_err());
        assert!(QuantileTransform::with_uniform_references(vec![2.0, 1.0], OutputDistribution::Normal).is_err());
        assert!(QuantileTransform::new(vec![0.0, 1.0], vec![0.0], OutputDistribution::Uniform).is_err());
        assert!(QuantileTransform::new(vec![0.0, 1.0], vec![0.0, 1.5], OutputDistribution::Uniform).is_err());
    }

    #[test]
    fn test_deserialize_defaults_to_uniform() {
        let qt: QuantileTransform =
            serde_json::from_str(r#"{"quantiles":[0.0,1.0],"references":[0.0,1.0]}"#).unwrap();
        assert_eq!(qt.output_distribution, OutputDistribution::Uniform);
    }

    #[test]
    fn test_unvalidated_landmarks_are_errors() {
        let empty: QuantileTransform =
            serde_json::from_str(r#"{"quantiles":[],"references":[]}"#).unwrap();
        assert!(matches!(
            crate::normalize_quantile(&empty, 1.0),
            Err(TransformError::InvalidParameters(_))
        ));
        assert!(matches!(
            empty.inverse_transform(0.0),
            Err(TransformError::InvalidParameters(_))
        ));

        let short: QuantileTransform =
            serde_json::from_str(r#"{"quantiles":[0.0,1.0,2.0],"references":[0.0,1.0]}"#).unwrap();
        assert!(matches!(
            short.transform(1.5),
            Err(TransformError::InvalidParameters(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_normal_round_trip(x in 0.01f64..3.99) {
            let qt = QuantileTransform::with_uniform_references(
                vec![0.0, 0.5, 1.7, 2.2, 3.1, 4.0],
                OutputDistribution::Normal,
            ).unwrap();
            let back = qt.inverse_transform(qt.transform(x).unwrap()).unwrap();
            prop_assert!((back - x).abs() < 1e-8);
        }

        #[test]
        fn prop_uniform_round_trip(x in 0.0f64..=4.0) {
            let qt = uniform();
            let back = qt.inverse_transform(qt.transform(x).unwrap()).unwrap();
            prop_assert!((back - x).abs() < 1e-12);
        }

        #[test]
        fn prop_monotonic(a in -1.0f64..5.0, b in -1.0f64..5.0) {
            let qt = normal();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(qt.transform(lo).unwrap() <= qt.transform(hi).unwrap());
        }
    }
}

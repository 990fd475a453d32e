//! Stacking Regressor

use crate::learners::BaseLearner;
use crate::mlp::MetaLearner;
use crate::{InferenceError, Predictor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tsn_features::FeatureVector;

/// Base learner with the name it was trained under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEstimator {
    pub name: String,
    pub model: BaseLearner,
}

/// Two-layer stacked ensemble.
///
/// The meta learner sees the base outputs in estimator order, followed by the
/// raw feature row when `passthrough` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingRegressor {
    /// Trained column order
    pub feature_names: Vec<String>,
    pub estimators: Vec<NamedEstimator>,
    pub final_estimator: MetaLearner,
    #[serde(default)]
    pub passthrough: bool,
}

impl StackingRegressor {
    /// Number of input features
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Width of the meta learner's input
    pub fn n_meta_inputs(&self) -> usize {
        self.estimators.len() + if self.passthrough { self.n_features() } else { 0 }
    }

    /// Check every learner against the declared shapes
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.feature_names.is_empty() {
            return Err(InferenceError::InvalidModel("no feature names".to_string()));
        }
        if self.estimators.is_empty() {
            return Err(InferenceError::InvalidModel("no base estimators".to_string()));
        }
        for estimator in &self.estimators {
            estimator.model.validate(self.n_features()).map_err(|e| {
                InferenceError::InvalidModel(format!("estimator `{}`: {}", estimator.name, e))
            })?;
        }
        self.final_estimator
            .validate(self.n_meta_inputs())
            .map_err(|e| InferenceError::InvalidModel(format!("final estimator: {e}")))?;

        info!(
            "Stacking model: {} features, {} base learners, {} meta learner",
            self.n_features(),
            self.estimators.len(),
            self.final_estimator.kind()
        );
        Ok(())
    }

    /// First-layer outputs for one row, in estimator order
    pub fn base_predictions(&self, x: &[f64]) -> Result<Vec<f64>, InferenceError> {
        self.check_width(x.len())?;
        Ok(self
            .estimators
            .iter()
            .map(|e| e.model.predict_row(x))
            .collect())
    }

    /// Predict a raw row without column-name checks.
    ///
    /// Only the widths are checked; a permuted row silently yields a different
    /// prediction.
    pub fn predict_row(&self, x: &[f64]) -> Result<f64, InferenceError> {
        let mut meta_input = self.base_predictions(x)?;
        debug!("Base learner outputs: {:?}", meta_input);
        if self.passthrough {
            meta_input.extend_from_slice(x);
        }
        let expected = self.final_estimator.n_inputs();
        if meta_input.len() != expected {
            return Err(InferenceError::InvalidInputShape {
                expected,
                actual: meta_input.len(),
            });
        }

        let output = self.final_estimator.predict_row(&meta_input);
        if !output.is_finite() {
            return Err(InferenceError::NonFiniteOutput(output));
        }
        Ok(output)
    }

    fn check_width(&self, actual: usize) -> Result<(), InferenceError> {
        if actual != self.n_features() {
            return Err(InferenceError::InvalidInputShape {
                expected: self.n_features(),
                actual,
            });
        }
        Ok(())
    }
}

impl Predictor for StackingRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        self.check_width(features.len())?;
        for (index, (actual, expected)) in features
            .columns()
            .iter()
            .zip(&self.feature_names)
            .enumerate()
        {
            if actual != expected {
                return Err(InferenceError::ColumnMismatch {
                    index,
                    expected: expected.clone(),
                    actual: actual.clone(),
                });
            }
        }
        self.predict_row(features.values())
    }

    fn describe(&self) -> String {
        let names: Vec<&str> = self.estimators.iter().map(|e| e.name.as_str()).collect();
        format!(
            "stacking([{}] -> {})",
            names.join(", "),
            self.final_estimator.kind()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learners::LinearModel;
    use crate::mlp::{Activation, DenseLayer, MlpRegressor};
    use crate::tree::RegressionTree;
    use tsn_features::FEATURE_NAMES;

    fn names() -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
    }

    fn linear_stack(passthrough: bool) -> StackingRegressor {
        let meta_coefficients = if passthrough {
            vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        } else {
            vec![1.0, 1.0]
        };
        StackingRegressor {
            feature_names: names(),
            estimators: vec![
                NamedEstimator {
                    name: "weighted".to_string(),
                    model: BaseLearner::Linear(LinearModel {
                        coefficients: vec![1.0, 2.0, 3.0, 4.0, 5.0],
                        intercept: 0.0,
                    }),
                },
                NamedEstimator {
                    name: "stump".to_string(),
                    model: BaseLearner::DecisionTree(RegressionTree::stump(0, 0.0, -1.0, 1.0)),
                },
            ],
            final_estimator: MetaLearner::Linear(LinearModel {
                coefficients: meta_coefficients,
                intercept: 0.0,
            }),
            passthrough,
        }
    }

    fn vector(values: Vec<f64>) -> FeatureVector {
        FeatureVector::new(names(), values).unwrap()
    }

    #[test]
    fn test_stacked_prediction() {
        let model = linear_stack(false);
        model.validate().unwrap();
        // 1+4+9+16+25 = 55, stump(x0=1) = 1
        let y = model.predict(&vector(vec![1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        assert_eq!(y, 56.0);
    }

    #[test]
    fn test_passthrough_appends_features() {
        let model = linear_stack(true);
        model.validate().unwrap();
        assert_eq!(model.n_meta_inputs(), 7);
        // 55 + 1 + x[4]
        let y = model.predict_row(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(y, 61.0);
    }

    #[test]
    fn test_column_order_changes_prediction() {
        let model = linear_stack(false);
        let row = [1.0, 2.0, 3.0, 4.0, 5.0];
        let permuted = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert_ne!(
            model.predict_row(&row).unwrap(),
            model.predict_row(&permuted).unwrap()
        );
    }

    #[test]
    fn test_rejects_wrong_width_and_names() {
        let model = linear_stack(false);
        assert_eq!(
            model.predict_row(&[1.0, 2.0]),
            Err(InferenceError::InvalidInputShape { expected: 5, actual: 2 })
        );

        let mut columns = names();
        columns.swap(0, 1);
        let swapped = FeatureVector::new(columns, vec![0.0; 5]).unwrap();
        assert!(matches!(
            model.predict(&swapped),
            Err(InferenceError::ColumnMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_validate_meta_width() {
        let mut model = linear_stack(false);
        model.passthrough = true;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_meta_width_mismatch_is_an_error() {
        let mut model = linear_stack(false);
        model.passthrough = true;
        assert_eq!(
            model.predict_row(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            Err(InferenceError::InvalidInputShape { expected: 2, actual: 7 })
        );

        let output = DenseLayer::from_rows(vec![vec![1.0]], vec![0.0]).unwrap();
        model.final_estimator =
            MetaLearner::Mlp(MlpRegressor::new(Activation::Relu, vec![output]).unwrap());
        assert!(model.validate().is_err());
        assert!(matches!(
            model.predict(&vector(vec![0.0; 5])),
            Err(InferenceError::InvalidInputShape { expected: 1, actual: 7 })
        ));
    }

    #[test]
    fn test_non_finite_output() {
        let mut model = linear_stack(false);
        model.final_estimator = MetaLearner::Linear(LinearModel {
            coefficients: vec![1.0, 0.0],
            intercept: 0.0,
        });
        let y = model.predict_row(&[f64::INFINITY, 0.0, 0.0, 0.0, 0.0]);
        assert!(matches!(y, Err(InferenceError::NonFiniteOutput(_))));
    }

    #[test]
    fn test_deterministic() {
        let model = linear_stack(true);
        let v = vector(vec![0.3, -0.2, 1.1, 0.0, -4.0]);
        assert_eq!(model.predict(&v).unwrap(), model.predict(&v).unwrap());
    }

    #[test]
    fn test_describe_lists_estimators() {
        assert_eq!(linear_stack(false).describe(), "stacking([weighted, stump] -> linear)");
    }
}

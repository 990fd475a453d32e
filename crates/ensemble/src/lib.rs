//! Stacked Regression Ensemble
//!
//! Two-layer stacking: every base learner consumes the full feature row and
//! the meta learner consumes the base outputs. Models are immutable after
//! loading; inference is deterministic.

mod learners;
mod mlp;
mod stacking;
mod tree;

pub use learners::{BaseLearner, Kernel, KnnRegressor, KnnWeights, LinearModel, SupportVectorRegressor};
pub use mlp::{Activation, DenseLayer, MetaLearner, MlpRegressor};
pub use stacking::{NamedEstimator, StackingRegressor};
pub use tree::{GradientBoosting, RandomForest, RegressionTree, SplitRule};

use thiserror::Error;
use tsn_features::FeatureVector;

/// Errors during inference
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Feature column {index} is `{actual}`, model expects `{expected}`")]
    ColumnMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Model produced a non-finite output: {0}")]
    NonFiniteOutput(f64),
}

/// Pluggable regression capability: one feature row in, one scalar out
pub trait Predictor: Send + Sync {
    /// Predict a single row
    fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError>;

    /// Predict several rows; each row is independent
    fn predict_batch(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, InferenceError> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Short human-readable description for logs
    fn describe(&self) -> String {
        "predictor".to_string()
    }
}

//! First-Layer Base Learners

use crate::tree::{GradientBoosting, RandomForest, RegressionTree};
use crate::InferenceError;
use serde::{Deserialize, Serialize};

/// Linear model: `coefficients · x + intercept`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LinearModel {
    pub fn validate(&self, n_inputs: usize) -> Result<(), InferenceError> {
        if self.coefficients.len() != n_inputs {
            return Err(InferenceError::InvalidModel(format!(
                "linear model has {} coefficients for {} inputs",
                self.coefficients.len(),
                n_inputs
            )));
        }
        if self.coefficients.iter().any(|c| !c.is_finite()) || !self.intercept.is_finite() {
            return Err(InferenceError::InvalidModel(
                "linear model parameters must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn predict_row(&self, x: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(x)
            .map(|(c, v)| c * v)
            .sum::<f64>()
            + self.intercept
    }
}

/// Neighbour weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnnWeights {
    #[default]
    Uniform,
    Distance,
}

/// k-nearest-neighbours regressor over stored training rows (Euclidean)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnRegressor {
    pub points: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    pub k: usize,
    #[serde(default)]
    pub weights: KnnWeights,
}

impl KnnRegressor {
    pub fn validate(&self, n_inputs: usize) -> Result<(), InferenceError> {
        if self.points.len() != self.targets.len() {
            return Err(InferenceError::InvalidModel(format!(
                "knn has {} points but {} targets",
                self.points.len(),
                self.targets.len()
            )));
        }
        if self.k == 0 || self.k > self.points.len() {
            return Err(InferenceError::InvalidModel(format!(
                "knn k={} with {} stored points",
                self.k,
                self.points.len()
            )));
        }
        if self.points.iter().any(|p| p.len() != n_inputs) {
            return Err(InferenceError::InvalidModel(format!(
                "knn points must have {n_inputs} columns"
            )));
        }
        Ok(())
    }

    pub fn predict_row(&self, x: &[f64]) -> f64 {
        let mut neighbours: Vec<(f64, f64)> = self
            .points
            .iter()
            .zip(&self.targets)
            .map(|(p, &y)| (euclidean(p, x), y))
            .collect();
        // Stable sort keeps training order among equidistant points
        neighbours.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        neighbours.truncate(self.k);

        match self.weights {
            KnnWeights::Uniform => {
                neighbours.iter().map(|(_, y)| y).sum::<f64>() / neighbours.len() as f64
            }
            KnnWeights::Distance => {
                let exact: Vec<f64> = neighbours
                    .iter()
                    .filter(|(d, _)| *d == 0.0)
                    .map(|(_, y)| *y)
                    .collect();
                if !exact.is_empty() {
                    return exact.iter().sum::<f64>() / exact.len() as f64;
                }
                let (num, den) = neighbours
                    .iter()
                    .fold((0.0, 0.0), |(num, den), (d, y)| (num + y / d, den + 1.0 / d));
                num / den
            }
        }
    }
}

/// SVR kernel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
}

/// Support vector regressor in dual form:
/// `sum(dual_coef[i] * K(sv[i], x)) + intercept`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportVectorRegressor {
    pub support_vectors: Vec<Vec<f64>>,
    pub dual_coef: Vec<f64>,
    pub intercept: f64,
    pub kernel: Kernel,
}

impl SupportVectorRegressor {
    pub fn validate(&self, n_inputs: usize) -> Result<(), InferenceError> {
        if self.support_vectors.len() != self.dual_coef.len() {
            return Err(InferenceError::InvalidModel(format!(
                "svr has {} support vectors but {} dual coefficients",
                self.support_vectors.len(),
                self.dual_coef.len()
            )));
        }
        if self.support_vectors.iter().any(|sv| sv.len() != n_inputs) {
            return Err(InferenceError::InvalidModel(format!(
                "svr support vectors must have {n_inputs} columns"
            )));
        }
        if let Kernel::Rbf { gamma } = self.kernel {
            if !(gamma.is_finite() && gamma > 0.0) {
                return Err(InferenceError::InvalidModel(format!(
                    "rbf gamma must be positive, got {gamma}"
                )));
            }
        }
        Ok(())
    }

    pub fn predict_row(&self, x: &[f64]) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, coef)| coef * self.kernel_value(sv, x))
            .sum::<f64>()
            + self.intercept
    }

    fn kernel_value(&self, sv: &[f64], x: &[f64]) -> f64 {
        match self.kernel {
            Kernel::Linear => sv.iter().zip(x).map(|(a, b)| a * b).sum(),
            Kernel::Rbf { gamma } => {
                let d = euclidean(sv, x);
                (-gamma * d * d).exp()
            }
        }
    }
}

/// Any first-layer learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaseLearner {
    Linear(LinearModel),
    DecisionTree(RegressionTree),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
    Knn(KnnRegressor),
    Svr(SupportVectorRegressor),
}

impl BaseLearner {
    /// Check the learner against the feature width
    pub fn validate(&self, n_features: usize) -> Result<(), InferenceError> {
        match self {
            BaseLearner::Linear(m) => m.validate(n_features),
            BaseLearner::DecisionTree(m) => m.validate(n_features),
            BaseLearner::RandomForest(m) => m.validate(n_features),
            BaseLearner::GradientBoosting(m) => m.validate(n_features),
            BaseLearner::Knn(m) => m.validate(n_features),
            BaseLearner::Svr(m) => m.validate(n_features),
        }
    }

    /// Predict one row of `n_features` values
    pub fn predict_row(&self, x: &[f64]) -> f64 {
        match self {
            BaseLearner::Linear(m) => m.predict_row(x),
            BaseLearner::DecisionTree(m) => m.predict_row(x),
            BaseLearner::RandomForest(m) => m.predict_row(x),
            BaseLearner::GradientBoosting(m) => m.predict_row(x),
            BaseLearner::Knn(m) => m.predict_row(x),
            BaseLearner::Svr(m) => m.predict_row(x),
        }
    }

    /// Learner family name
    pub fn kind(&self) -> &'static str {
        match self {
            BaseLearner::Linear(_) => "linear",
            BaseLearner::DecisionTree(_) => "decision_tree",
            BaseLearner::RandomForest(_) => "random_forest",
            BaseLearner::GradientBoosting(_) => "gradient_boosting",
            BaseLearner::Knn(_) => "knn",
            BaseLearner::Svr(_) => "svr",
        }
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

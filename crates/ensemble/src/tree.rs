//! Regression Trees and Tree Ensembles

use crate::InferenceError;
use serde::{Deserialize, Serialize};

/// Marker for "no child" in the node arrays
pub const TREE_LEAF: i64 = -1;

/// Comparison used to route a sample to the left child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// `x <= threshold` goes left (scikit-learn)
    #[default]
    LessOrEqual,
    /// `x < threshold` goes left (XGBoost, LightGBM)
    LessThan,
}

impl SplitRule {
    fn goes_left(&self, x: f64, threshold: f64) -> bool {
        match self {
            SplitRule::LessOrEqual => x <= threshold,
            SplitRule::LessThan => x < threshold,
        }
    }
}

/// Binary regression tree in flat array form.
///
/// Node `i` is a leaf when `children_left[i] == -1`; otherwise it splits on
/// `feature[i]` at `threshold[i]`. Children always have larger indices than
/// their parent, so traversal terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
    #[serde(default)]
    pub split: SplitRule,
}

impl RegressionTree {
    /// Single-leaf tree
    pub fn constant(value: f64) -> Self {
        Self {
            children_left: vec![TREE_LEAF],
            children_right: vec![TREE_LEAF],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![value],
            split: SplitRule::default(),
        }
    }

    /// Depth-one tree
    pub fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Self {
        Self {
            children_left: vec![1, TREE_LEAF, TREE_LEAF],
            children_right: vec![2, TREE_LEAF, TREE_LEAF],
            feature: vec![feature as i64, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![0.0, left, right],
            split: SplitRule::default(),
        }
    }

    /// Check array shapes, child links and feature indices
    pub fn validate(&self, n_features: usize) -> Result<(), InferenceError> {
        let n = self.value.len();
        if n == 0 {
            return Err(InferenceError::InvalidModel("tree has no nodes".to_string()));
        }
        if self.children_left.len() != n
            || self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
        {
            return Err(InferenceError::InvalidModel(
                "tree node arrays differ in length".to_string(),
            ));
        }

        for node in 0..n {
            let left = self.children_left[node];
            let right = self.children_right[node];
            if left == TREE_LEAF {
                if right != TREE_LEAF {
                    return Err(InferenceError::InvalidModel(format!(
                        "node {node} has only a right child"
                    )));
                }
                if !self.value[node].is_finite() {
                    return Err(InferenceError::InvalidModel(format!(
                        "leaf {node} has a non-finite value"
                    )));
                }
                continue;
            }
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(InferenceError::InvalidModel(format!(
                        "node {node} links to invalid child {child}"
                    )));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(InferenceError::InvalidModel(format!(
                    "node {node} splits on feature {feature}, model has {n_features}"
                )));
            }
        }
        Ok(())
    }

    /// Route one row to its leaf value
    pub fn predict_row(&self, x: &[f64]) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left == TREE_LEAF {
                return self.value[node];
            }
            let feature = self.feature[node] as usize;
            node = if self.split.goes_left(x[feature], self.threshold[node]) {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

/// Averaged trees (random forest, extra trees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn validate(&self, n_features: usize) -> Result<(), InferenceError> {
        if self.trees.is_empty() {
            return Err(InferenceError::InvalidModel("forest has no trees".to_string()));
        }
        self.trees.iter().try_for_each(|t| t.validate(n_features))
    }

    pub fn predict_row(&self, x: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(x)).sum();
        sum / self.trees.len() as f64
    }
}

/// Additive boosted trees: `init + learning_rate * sum(tree(x))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    #[serde(default)]
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<RegressionTree>,
}

impl GradientBoosting {
    pub fn validate(&self, n_features: usize) -> Result<(), InferenceError> {
        if !self.init.is_finite() || !self.learning_rate.is_finite() {
            return Err(InferenceError::InvalidModel(
                "boosting init and learning rate must be finite".to_string(),
            ));
        }
        self.trees.iter().try_for_each(|t| t.validate(n_features))
    }

    pub fn predict_row(&self, x: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(x)).sum();
        self.init + self.learning_rate * sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level() -> RegressionTree {
        // x0 <= 0 ? (x1 <= 1 ? -1 : 1) : 5
        RegressionTree {
            children_left: vec![1, 2, -1, -1, -1],
            children_right: vec![4, 3, -1, -1, -1],
            feature: vec![0, 1, -2, -2, -2],
            threshold: vec![0.0, 1.0, -2.0, -2.0, -2.0],
            value: vec![0.0, 0.0, -1.0, 1.0, 5.0],
            split: SplitRule::LessOrEqual,
        }
    }

    #[test]
    fn test_tree_routing() {
        let tree = two_level();
        tree.validate(2).unwrap();
        assert_eq!(tree.predict_row(&[-1.0, 0.5]), -1.0);
        assert_eq!(tree.predict_row(&[-1.0, 2.0]), 1.0);
        assert_eq!(tree.predict_row(&[3.0, 0.0]), 5.0);
    }

    #[test]
    fn test_split_rule_on_threshold() {
        let mut tree = RegressionTree::stump(0, 1.0, 10.0, 20.0);
        assert_eq!(tree.predict_row(&[1.0]), 10.0);
        tree.split = SplitRule::LessThan;
        assert_eq!(tree.predict_row(&[1.0]), 20.0);
    }

    #[test]
    fn test_validate_rejects_cycles_and_bad_features() {
        let mut tree = two_level();
        tree.children_left[1] = 0;
        assert!(tree.validate(2).is_err());
        assert!(two_level().validate(1).is_err());
        let mut short = two_level();
        short.threshold.pop();
        assert!(short.validate(2).is_err());
    }

    #[test]
    fn test_forest_mean() {
        let forest = RandomForest {
            trees: vec![RegressionTree::constant(1.0), RegressionTree::constant(3.0)],
        };
        forest.validate(1).unwrap();
        assert_eq!(forest.predict_row(&[0.0]), 2.0);
    }

    #[test]
    fn test_boosting_sum() {
        let gb = GradientBoosting {
            init: 0.5,
            learning_rate: 0.1,
            trees: vec![
                RegressionTree::stump(0, 0.0, -1.0, 1.0),
                RegressionTree::stump(0, 0.0, -2.0, 2.0),
            ],
        };
        assert!((gb.predict_row(&[1.0]) - 0.8).abs() < 1e-12);
        assert!((gb.predict_row(&[-1.0]) - 0.2).abs() < 1e-12);
    }
}

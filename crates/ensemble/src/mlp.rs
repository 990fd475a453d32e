//! Second-Layer Meta Learners

use crate::learners::LinearModel;
use crate::InferenceError;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Hidden-layer activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Logistic,
    Identity,
}

impl Activation {
    fn apply(&self, values: &mut Array1<f64>) {
        match self {
            Activation::Relu => values.mapv_inplace(|v| v.max(0.0)),
            Activation::Tanh => values.mapv_inplace(f64::tanh),
            Activation::Logistic => values.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp())),
            Activation::Identity => {}
        }
    }
}

/// Fully connected layer; `weights` has shape (inputs, outputs)
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
}

impl DenseLayer {
    /// Build a layer from row-major weights, one row per input
    pub fn from_rows(rows: Vec<Vec<f64>>, bias: Vec<f64>) -> Result<Self, InferenceError> {
        let n_in = rows.len();
        let n_out = bias.len();
        if n_in == 0 || n_out == 0 {
            return Err(InferenceError::InvalidModel("empty dense layer".to_string()));
        }
        if rows.iter().any(|r| r.len() != n_out) {
            return Err(InferenceError::InvalidModel(format!(
                "dense layer rows must have {n_out} columns to match the bias"
            )));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        if flat.iter().chain(&bias).any(|v| !v.is_finite()) {
            return Err(InferenceError::InvalidModel(
                "dense layer parameters must be finite".to_string(),
            ));
        }
        let weights = Array2::from_shape_vec((n_in, n_out), flat)
            .map_err(|e| InferenceError::InvalidModel(format!("dense layer shape: {e}")))?;
        Ok(Self {
            weights,
            bias: Array1::from_vec(bias),
        })
    }

    pub fn n_inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_outputs(&self) -> usize {
        self.weights.ncols()
    }

    fn forward(&self, input: &Array1<f64>) -> Array1<f64> {
        input.dot(&self.weights) + &self.bias
    }
}

/// Serialized layer: row-major weights, one row per input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerParams {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

/// Serialized form of [`MlpRegressor`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpParams {
    #[serde(default)]
    pub activation: Activation,
    pub layers: Vec<LayerParams>,
}

/// Multi-layer perceptron regressor with an identity output layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MlpParams", into = "MlpParams")]
pub struct MlpRegressor {
    activation: Activation,
    layers: Vec<DenseLayer>,
}

impl MlpRegressor {
    /// Chain layers; adjacent widths must agree and the output must be scalar
    pub fn new(activation: Activation, layers: Vec<DenseLayer>) -> Result<Self, InferenceError> {
        let last = layers
            .last()
            .ok_or_else(|| InferenceError::InvalidModel("mlp has no layers".to_string()))?;
        if last.n_outputs() != 1 {
            return Err(InferenceError::InvalidModel(format!(
                "mlp output layer has {} units, expected 1",
                last.n_outputs()
            )));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].n_outputs() != pair[1].n_inputs() {
                return Err(InferenceError::InvalidModel(format!(
                    "mlp layer {} outputs {} but layer {} expects {}",
                    i,
                    pair[0].n_outputs(),
                    i + 1,
                    pair[1].n_inputs()
                )));
            }
        }
        Ok(Self { activation, layers })
    }

    /// Width of the input layer
    pub fn n_inputs(&self) -> usize {
        self.layers[0].n_inputs()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn predict_row(&self, x: &[f64]) -> f64 {
        let mut a = Array1::from_vec(x.to_vec());
        let hidden = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            a = layer.forward(&a);
            if i < hidden {
                self.activation.apply(&mut a);
            }
        }
        a[0]
    }
}

impl TryFrom<MlpParams> for MlpRegressor {
    type Error = InferenceError;

    fn try_from(params: MlpParams) -> Result<Self, Self::Error> {
        let layers = params
            .layers
            .into_iter()
            .map(|l| DenseLayer::from_rows(l.weights, l.bias))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(params.activation, layers)
    }
}

impl From<MlpRegressor> for MlpParams {
    fn from(mlp: MlpRegressor) -> Self {
        let layers = mlp
            .layers
            .into_iter()
            .map(|l| LayerParams {
                weights: l.weights.outer_iter().map(|row| row.to_vec()).collect(),
                bias: l.bias.to_vec(),
            })
            .collect();
        Self {
            activation: mlp.activation,
            layers,
        }
    }
}

/// Any second-layer learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetaLearner {
    Mlp(MlpRegressor),
    Linear(LinearModel),
}

impl MetaLearner {
    /// Check the learner against the number of stacked inputs
    pub fn validate(&self, n_inputs: usize) -> Result<(), InferenceError> {
        match self {
            MetaLearner::Mlp(m) if m.n_inputs() != n_inputs => Err(InferenceError::InvalidModel(
                format!("mlp expects {} inputs, stack provides {}", m.n_inputs(), n_inputs),
            )),
            MetaLearner::Mlp(_) => Ok(()),
            MetaLearner::Linear(m) => m.validate(n_inputs),
        }
    }

    /// Number of stacked inputs the learner was fitted on
    pub fn n_inputs(&self) -> usize {
        match self {
            MetaLearner::Mlp(m) => m.n_inputs(),
            MetaLearner::Linear(m) => m.coefficients.len(),
        }
    }

    pub fn predict_row(&self, x: &[f64]) -> f64 {
        match self {
            MetaLearner::Mlp(m) => m.predict_row(x),
            MetaLearner::Linear(m) => m.predict_row(x),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MetaLearner::Mlp(_) => "mlp",
            MetaLearner::Linear(_) => "linear",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_mlp(activation: Activation) -> MlpRegressor {
        // 2 -> 2 -> 1
        let hidden = DenseLayer::from_rows(vec![vec![1.0, -1.0], vec![1.0, 1.0]], vec![0.0, -1.0]).unwrap();
        let output = DenseLayer::from_rows(vec![vec![2.0], vec![3.0]], vec![0.5]).unwrap();
        MlpRegressor::new(activation, vec![hidden, output]).unwrap()
    }

    #[test]
    fn test_relu_forward() {
        let mlp = small_mlp(Activation::Relu);
        // hidden = [x0 + x1, -x0 + x1 - 1] = [3, 0] for (1, 2)
        assert!((mlp.predict_row(&[1.0, 2.0]) - 6.5).abs() < 1e-12);
        // hidden pre-activation [-2, -1] -> relu -> [0, 0]
        assert!((mlp.predict_row(&[-1.0, -1.0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_identity_forward() {
        let mlp = small_mlp(Activation::Identity);
        // hidden [-2, -1] -> 2 * -2 + 3 * -1 + 0.5
        assert!((mlp.predict_row(&[-1.0, -1.0]) + 6.5).abs() < 1e-12);
    }

    #[test]
    fn test_layer_shape_checks() {
        assert!(DenseLayer::from_rows(vec![vec![1.0, 2.0]], vec![0.0]).is_err());
        let a = DenseLayer::from_rows(vec![vec![1.0, 2.0]], vec![0.0, 0.0]).unwrap();
        let b = DenseLayer::from_rows(vec![vec![1.0]], vec![0.0]).unwrap();
        assert!(MlpRegressor::new(Activation::Relu, vec![a, b]).is_err());
        assert!(MlpRegressor::new(Activation::Relu, vec![]).is_err());
    }

    #[test]
    fn test_meta_deserialize_and_round_trip() {
        let json = r#"{
            "kind": "mlp",
            "activation": "tanh",
            "layers": [
                {"weights": [[1.0], [1.0]], "bias": [0.0]}
            ]
        }"#;
        let meta: MetaLearner = serde_json::from_str(json).unwrap();
        meta.validate(2).unwrap();
        assert!(meta.validate(3).is_err());
        assert_eq!(meta.n_inputs(), 2);
        assert_eq!(meta.predict_row(&[1.5, 2.0]), 3.5);

        let again: MetaLearner =
            serde_json::from_str(&serde_json::to_string(&meta).unwrap()).unwrap();
        assert_eq!(meta, again);
    }

    #[test]
    fn test_invalid_mlp_json_is_rejected() {
        let json = r#"{"kind": "mlp", "layers": [{"weights": [[1.0, 2.0]], "bias": [0.0]}]}"#;
        assert!(serde_json::from_str::<MetaLearner>(json).is_err());
    }
}

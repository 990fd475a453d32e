//! Loaded Artifact Bundle

use crate::ArtifactError;
use tsn_ensemble::{Predictor, StackingRegressor};
use tsn_features::FEATURE_NAMES;
use tsn_transforms::{BoxCox, QuantileTransform};

/// All pre-fitted artifacts, immutable once loaded
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub stack: StackingRegressor,
    pub qt_lcd: QuantileTransform,
    pub qt_gsa: QuantileTransform,
    pub qt_density: QuantileTransform,
    pub lambda_vf: BoxCox,
    pub lambda_ktoluene: BoxCox,
    pub qt_tsn: QuantileTransform,
}

impl ArtifactBundle {
    /// The stacking model must have been trained on the canonical columns
    pub fn check_feature_names(&self) -> Result<(), ArtifactError> {
        let matches = self.stack.feature_names.len() == FEATURE_NAMES.len()
            && self
                .stack
                .feature_names
                .iter()
                .zip(FEATURE_NAMES)
                .all(|(a, b)| a == b);
        if matches {
            Ok(())
        } else {
            Err(ArtifactError::Invalid {
                name: "stack",
                reason: format!(
                    "trained on columns {:?}, expected {:?}",
                    self.stack.feature_names, FEATURE_NAMES
                ),
            })
        }
    }

    /// One-line description for logs and health output
    pub fn summary(&self) -> String {
        format!(
            "{}; lambda_vf={}; lambda_kt={}",
            self.stack.describe(),
            self.lambda_vf.lambda,
            self.lambda_ktoluene.lambda
        )
    }
}

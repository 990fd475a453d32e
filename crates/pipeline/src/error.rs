//! Pipeline Error Types

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tsn_artifacts::ArtifactError;
use tsn_ensemble::InferenceError;
use tsn_features::AssemblyError;
use tsn_transforms::TransformError;

/// Failure category callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// An artifact could not be loaded or was never supplied
    ArtifactLoad,
    /// A transform received input outside its domain
    TransformDomain,
    /// The predictor rejected its input or failed internally
    PredictorInvocation,
    /// A visualization asset is absent
    AssetMissing,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ArtifactLoad => "artifact_load",
            ErrorKind::TransformDomain => "transform_domain",
            ErrorKind::PredictorInvocation => "predictor_invocation",
            ErrorKind::AssetMissing => "asset_missing",
        }
    }
}

/// Pipeline step at which a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalize,
    Assemble,
    Predict,
    Denormalize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Normalize => "normalization",
            Stage::Assemble => "assembly",
            Stage::Predict => "prediction",
            Stage::Denormalize => "de-normalization",
        })
    }
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Artifact `{0}` is not loaded")]
    ArtifactUnavailable(&'static str),

    #[error(transparent)]
    ArtifactLoad(#[from] ArtifactError),

    #[error("Cannot transform {target}: {source}")]
    TransformDomain {
        target: &'static str,
        #[source]
        source: TransformError,
    },

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    PredictorInvocation(#[from] InferenceError),

    #[error("Image not found: {}", .0.display())]
    AssetMissing(PathBuf),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::ArtifactUnavailable(_) | PipelineError::ArtifactLoad(_) => {
                ErrorKind::ArtifactLoad
            }
            PipelineError::TransformDomain { .. } => ErrorKind::TransformDomain,
            PipelineError::Assembly(_) | PipelineError::PredictorInvocation(_) => {
                ErrorKind::PredictorInvocation
            }
            PipelineError::AssetMissing(_) => ErrorKind::AssetMissing,
        }
    }
}

/// A failed run: where it stopped and why
#[derive(Debug, Error)]
#[error("Prediction error during {stage}: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

impl PipelineFailure {
    pub fn new(stage: Stage, error: impl Into<PipelineError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Single human-readable message for display
    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            PipelineError::ArtifactUnavailable("qt_TSN").kind(),
            ErrorKind::ArtifactLoad
        );
        let domain = PipelineError::TransformDomain {
            target: "Vf",
            source: TransformError::NonPositiveInput {
                value: 0.0,
                lambda: 1.42,
            },
        };
        assert_eq!(domain.kind(), ErrorKind::TransformDomain);
        let shape = PipelineError::from(AssemblyError::WrongLength {
            expected: 5,
            actual: 4,
        });
        assert_eq!(shape.kind(), ErrorKind::PredictorInvocation);
        assert_eq!(
            PipelineError::from(InferenceError::NonFiniteOutput(f64::NAN)).kind(),
            ErrorKind::PredictorInvocation
        );
    }

    #[test]
    fn test_failure_message() {
        let failure = PipelineFailure::new(Stage::Denormalize, PipelineError::ArtifactUnavailable("qt_TSN"));
        assert_eq!(
            failure.message(),
            "Prediction error during de-normalization: Artifact `qt_TSN` is not loaded"
        );
        assert_eq!(failure.kind(), ErrorKind::ArtifactLoad);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::PredictorInvocation).unwrap(),
            "\"predictor_invocation\""
        );
        assert_eq!(serde_json::to_string(&Stage::Denormalize).unwrap(), "\"denormalize\"");
    }
}

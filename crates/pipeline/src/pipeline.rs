//! Prediction Pipeline

use crate::error::{PipelineError, PipelineFailure, Stage};
use crate::report::{PredictionResult, TransformationTable};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tsn_artifacts::{ArtifactBundle, ArtifactKind};
use tsn_ensemble::Predictor;
use tsn_features::{Feature, FeatureAssembler, RawFeatureSet, TransformedFeatureSet, FEATURE_DIMENSION};
use tsn_transforms::{FeatureTransform, InverseTransform};

/// Progress of one prediction run.
///
/// `Complete` and `Failed` are terminal; advancing them is a no-op.
#[derive(Debug)]
pub enum PipelineState {
    Start(RawFeatureSet),
    Transformed {
        raw: RawFeatureSet,
        transformed: TransformedFeatureSet,
    },
    Predicted {
        output: f64,
    },
    Complete(PredictionResult),
    Failed(PipelineFailure),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Complete(_) | PipelineState::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Start(_) => "start",
            PipelineState::Transformed { .. } => "transformed",
            PipelineState::Predicted { .. } => "predicted",
            PipelineState::Complete(_) => "complete",
            PipelineState::Failed(_) => "failed",
        }
    }
}

/// Everything a caller may show after one run
#[derive(Debug)]
pub struct PredictionOutcome {
    /// Present once normalization succeeded, even if a later step failed
    pub transformation: Option<TransformationTable>,
    pub result: Result<PredictionResult, PipelineFailure>,
}

impl PredictionOutcome {
    pub fn is_complete(&self) -> bool {
        self.result.is_ok()
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.result.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&PipelineFailure> {
        self.result.as_ref().err()
    }
}

/// Normalize, assemble, predict and de-normalize one feature set.
///
/// Components are injected and shared read-only, so one pipeline can serve
/// any number of concurrent runs. A component that was never supplied fails
/// the run at the step that needs it.
#[derive(Clone, Default)]
pub struct PredictionPipeline {
    normalizers: [Option<Arc<dyn FeatureTransform>>; FEATURE_DIMENSION],
    predictor: Option<Arc<dyn Predictor>>,
    denormalizer: Option<Arc<dyn InverseTransform>>,
}

impl PredictionPipeline {
    /// Pipeline with no components
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline wired to a fully loaded artifact bundle
    pub fn from_bundle(bundle: ArtifactBundle) -> Self {
        info!("Building prediction pipeline: {}", bundle.summary());
        Self::new()
            .with_normalizer(Feature::Lcd, Arc::new(bundle.qt_lcd))
            .with_normalizer(Feature::Vf, Arc::new(bundle.lambda_vf))
            .with_normalizer(Feature::Gsa, Arc::new(bundle.qt_gsa))
            .with_normalizer(Feature::Density, Arc::new(bundle.qt_density))
            .with_normalizer(Feature::Ktoluene, Arc::new(bundle.lambda_ktoluene))
            .with_predictor(Arc::new(bundle.stack))
            .with_denormalizer(Arc::new(bundle.qt_tsn))
    }

    pub fn with_normalizer(mut self, feature: Feature, transform: Arc<dyn FeatureTransform>) -> Self {
        self.normalizers[feature.column()] = Some(transform);
        self
    }

    pub fn with_predictor(mut self, predictor: Arc<dyn Predictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn with_denormalizer(mut self, transform: Arc<dyn InverseTransform>) -> Self {
        self.denormalizer = Some(transform);
        self
    }

    /// Names of the artifacts not supplied
    pub fn missing_components(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = Feature::ALL
            .into_iter()
            .filter(|f| self.normalizers[f.column()].is_none())
            .map(|f| ArtifactKind::for_feature(f).name())
            .collect();
        if self.predictor.is_none() {
            missing.push(ArtifactKind::StackingModel.name());
        }
        if self.denormalizer.is_none() {
            missing.push(ArtifactKind::QuantileTsn.name());
        }
        missing
    }

    pub fn is_ready(&self) -> bool {
        self.missing_components().is_empty()
    }

    /// Description of the injected predictor, if any
    pub fn describe_predictor(&self) -> Option<String> {
        self.predictor.as_ref().map(|p| p.describe())
    }

    /// Apply the five normalizers
    pub fn normalize(&self, raw: &RawFeatureSet) -> Result<TransformedFeatureSet, PipelineError> {
        let mut transformed = TransformedFeatureSet::default();
        for feature in Feature::ALL {
            let transform = self.normalizers[feature.column()]
                .as_ref()
                .ok_or(PipelineError::ArtifactUnavailable(
                    ArtifactKind::for_feature(feature).name(),
                ))?;
            let x = raw.get(feature);
            let y = transform
                .transform(x)
                .map_err(|source| PipelineError::TransformDomain {
                    target: feature.name(),
                    source,
                })?;
            debug!("{} {} -> {} via {}", feature, x, y, transform.describe());
            transformed.set(feature, y);
        }
        Ok(transformed)
    }

    /// Assemble the model row and invoke the predictor
    pub fn predict(&self, transformed: &TransformedFeatureSet) -> Result<f64, PipelineFailure> {
        let vector = FeatureAssembler::assemble_checked(transformed)
            .map_err(|e| PipelineFailure::new(Stage::Assemble, e))?;
        let predictor = self.predictor.as_ref().ok_or_else(|| {
            PipelineFailure::new(
                Stage::Predict,
                PipelineError::ArtifactUnavailable(ArtifactKind::StackingModel.name()),
            )
        })?;
        let output = predictor
            .predict(&vector)
            .map_err(|e| PipelineFailure::new(Stage::Predict, e))?;
        debug!("Predictor output (normalized): {}", output);
        Ok(output)
    }

    /// Map a normalized model output back to TSN units
    pub fn denormalize(&self, output: f64) -> Result<f64, PipelineError> {
        let transform = self
            .denormalizer
            .as_ref()
            .ok_or(PipelineError::ArtifactUnavailable(ArtifactKind::QuantileTsn.name()))?;
        transform
            .inverse_transform(output)
            .map_err(|source| PipelineError::TransformDomain {
                target: "TSN",
                source,
            })
    }

    /// Move one step forward
    pub fn advance(&self, state: PipelineState) -> PipelineState {
        match state {
            PipelineState::Start(raw) => match self.normalize(&raw) {
                Ok(transformed) => PipelineState::Transformed { raw, transformed },
                Err(e) => PipelineState::Failed(PipelineFailure::new(Stage::Normalize, e)),
            },
            PipelineState::Transformed { transformed, .. } => match self.predict(&transformed) {
                Ok(output) => PipelineState::Predicted { output },
                Err(failure) => PipelineState::Failed(failure),
            },
            PipelineState::Predicted { output } => match self.denormalize(output) {
                Ok(original_value) => PipelineState::Complete(PredictionResult {
                    transformed_value: output,
                    original_value,
                }),
                Err(e) => PipelineState::Failed(PipelineFailure::new(Stage::Denormalize, e)),
            },
            terminal => terminal,
        }
    }

    /// Run one prediction to a terminal state
    pub fn run(&self, raw: &RawFeatureSet) -> PredictionOutcome {
        let mut state = PipelineState::Start(*raw);
        let mut transformation = None;

        let result = loop {
            state = match state {
                PipelineState::Complete(result) => {
                    info!("Prediction complete: {}", result);
                    break Ok(result);
                }
                PipelineState::Failed(failure) => {
                    warn!("{} ({})", failure, failure.kind().as_str());
                    break Err(failure);
                }
                pending => self.advance(pending),
            };
            debug!("Pipeline state: {}", state.name());
            if let PipelineState::Transformed { raw, transformed } = &state {
                transformation = Some(TransformationTable::new(raw, transformed));
            }
        };

        PredictionOutcome {
            transformation,
            result,
        }
    }
}

impl std::fmt::Debug for PredictionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionPipeline")
            .field("missing", &self.missing_components())
            .finish()
    }
}

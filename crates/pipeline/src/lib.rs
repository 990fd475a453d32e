//! TSN Prediction Pipeline
//!
//! Orchestrates one prediction:
//! 1. Normalize the five raw inputs (quantile / Box-Cox)
//! 2. Assemble them in trained column order
//! 3. Invoke the stacking predictor
//! 4. Inverse-transform the output into TSN units
//!
//! Per-request failures never escape the pipeline; they are returned as a
//! typed [`PipelineFailure`] with the stage that failed.

mod error;
mod pipeline;
mod report;
mod visualization;

pub use error::{ErrorKind, PipelineError, PipelineFailure, Stage};
pub use pipeline::{PipelineState, PredictionOutcome, PredictionPipeline};
pub use report::{PredictionResult, TransformationRow, TransformationTable};
pub use visualization::{
    AssetStatus, ShapVisualization, VisualizationCatalog, DEFAULT_URL_PREFIX, SHAP_VISUALIZATIONS,
};

use tsn_artifacts::ArtifactStore;

/// Load every artifact from `store` and wire a ready pipeline
pub fn load_pipeline(store: &ArtifactStore) -> Result<PredictionPipeline, PipelineError> {
    let bundle = store.load_bundle()?;
    Ok(PredictionPipeline::from_bundle(bundle))
}

//! Prediction Route

use axum::{extract::State, http::StatusCode, Json};
use metrics::{counter, histogram};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::SharedState;
use tsn_features::RawFeatureSet;
use tsn_pipeline::{ErrorKind, PipelineFailure, PredictionResult, Stage, TransformationTable};

/// Failure details for the caller to branch on
#[derive(Debug, Serialize)]
pub struct PredictionError {
    pub kind: ErrorKind,
    pub stage: Stage,
    pub message: String,
}

impl From<&PipelineFailure> for PredictionError {
    fn from(failure: &PipelineFailure) -> Self {
        Self {
            kind: failure.kind(),
            stage: failure.stage,
            message: failure.message(),
        }
    }
}

/// Response for the predict endpoint
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// `complete`, `failed` or `rejected`
    pub status: &'static str,
    pub input: RawFeatureSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<TransformationTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PredictionError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::TransformDomain => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run one prediction
pub async fn predict(
    State(state): State<SharedState>,
    Json(raw): Json<RawFeatureSet>,
) -> (StatusCode, Json<PredictResponse>) {
    debug!("Predict request: {:?}", raw);

    if let Some(validator) = &state.validator {
        let result = validator.validate(&raw);
        if !result.valid {
            let violations: Vec<String> = result.errors.iter().map(|e| e.to_string()).collect();
            warn!("Rejected prediction input: {}", violations.join("; "));
            counter!("tsn_predictions_total", "outcome" => "rejected").increment(1);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(PredictResponse {
                    status: "rejected",
                    input: raw,
                    transformation: None,
                    prediction: None,
                    error: None,
                    violations,
                }),
            );
        }
    }

    // Forest and kNN evaluation is CPU-bound; keep it off the async workers
    let pipeline = state.pipeline.clone();
    let started = Instant::now();
    let outcome = match tokio::task::spawn_blocking(move || pipeline.run(&raw)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Prediction task failed: {}", e);
            counter!("tsn_predictions_total", "outcome" => "failed").increment(1);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PredictResponse {
                    status: "failed",
                    input: raw,
                    transformation: None,
                    prediction: None,
                    error: None,
                    violations: Vec::new(),
                }),
            );
        }
    };
    histogram!("tsn_prediction_duration_seconds").record(started.elapsed().as_secs_f64());

    let (code, status, error) = match &outcome.result {
        Ok(_) => (StatusCode::OK, "complete", None),
        Err(failure) => (
            status_for(failure.kind()),
            "failed",
            Some(PredictionError::from(failure)),
        ),
    };
    counter!("tsn_predictions_total", "outcome" => status).increment(1);

    let prediction = outcome.prediction().copied();
    (
        code,
        Json(PredictResponse {
            status,
            input: raw,
            transformation: outcome.transformation,
            prediction,
            error,
            violations: Vec::new(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsn_pipeline::PipelineError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(ErrorKind::TransformDomain),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(ErrorKind::PredictorInvocation),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(ErrorKind::ArtifactLoad),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body() {
        let failure = PipelineFailure::new(Stage::Denormalize, PipelineError::ArtifactUnavailable("qt_TSN"));
        let body = serde_json::to_value(PredictionError::from(&failure)).unwrap();
        assert_eq!(body["kind"], "artifact_load");
        assert_eq!(body["stage"], "denormalize");
        assert!(body["message"].as_str().unwrap().contains("qt_TSN"));
    }
}

//! TSN Predictor API Server
//!
//! REST front-end for the prediction pipeline: feature catalogue, one-shot
//! prediction, SHAP images, health and Prometheus metrics.

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
mod routes;

pub use config::{AppConfig, LogFormat};

/// Route listing the SHAP sections; images live one level below
pub const VISUALIZATIONS_ROUTE: &str = "/api/v1/visualizations";

use tsn_artifacts::ArtifactStore;
use tsn_features::{ValidationConfig, Validator};
use tsn_pipeline::{load_pipeline, PredictionPipeline, VisualizationCatalog};

/// Startup errors of the host process
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("Failed to set tracing subscriber: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("Failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Application state shared across handlers.
///
/// Read-only after startup, so handlers share it without locking.
pub struct AppState {
    pub pipeline: PredictionPipeline,
    /// Present when inputs are range-checked before prediction
    pub validator: Option<Validator>,
    pub visualizations: VisualizationCatalog,
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state with input validation on
    pub fn new(pipeline: PredictionPipeline, asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            validator: Some(Validator::default()),
            visualizations: VisualizationCatalog::new(asset_dir)
                .with_url_prefix(VISUALIZATIONS_ROUTE),
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    /// Replace or disable input validation
    pub fn with_validation(mut self, config: Option<ValidationConfig>) -> Self {
        self.validator = config.map(Validator::new);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub type SharedState = Arc<AppState>;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: Option<String>,
    pub missing_artifacts: Vec<&'static str>,
    pub input_validation: bool,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/features", get(routes::features::get_features))
        .route("/api/v1/predict", post(routes::predict::predict))
        .route(
            VISUALIZATIONS_ROUTE,
            get(routes::visualizations::get_visualizations),
        )
        .route(
            "/api/v1/visualizations/:id",
            get(routes::visualizations::get_visualization_image),
        )
        .route("/metrics", get(metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let missing_artifacts = state.pipeline.missing_components();

    Json(HealthResponse {
        status: if missing_artifacts.is_empty() {
            "healthy"
        } else {
            "degraded"
        },
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: state.pipeline.describe_predictor(),
        missing_artifacts,
        input_validation: state.validator.is_some(),
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            "metrics recorder not installed\n".to_string(),
        ),
    }
}

/// Initialize logging
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), ApiError> {
    let level: Level = level
        .parse()
        .map_err(|_| ApiError::InvalidLogLevel(level.to_string()))?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> Result<PrometheusHandle, ApiError> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Load artifacts and run the server until it stops
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let store = ArtifactStore::with_names(&config.artifact_dir, config.artifacts.clone());
    let pipeline = load_pipeline(&store).with_context(|| {
        format!(
            "loading model artifacts from {}",
            config.artifact_dir.display()
        )
    })?;
    let metrics = install_metrics()?;

    let validation = config.validate_inputs.then(|| config.validation.clone());
    let state = AppState::new(pipeline, &config.asset_dir)
        .with_validation(validation)
        .with_metrics(metrics);

    let sections = state.visualizations.sections();
    let unavailable = sections.iter().filter(|s| !s.available).count();
    if unavailable > 0 {
        warn!(
            "{} of {} SHAP images are missing",
            unavailable,
            sections.len()
        );
    }

    let app = create_router(Arc::new(state));

    info!("Starting API server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

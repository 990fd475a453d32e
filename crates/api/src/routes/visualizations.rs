//! SHAP Visualization Routes

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::SharedState;
use tsn_pipeline::{AssetStatus, ErrorKind, VisualizationCatalog};

#[derive(Debug, Serialize)]
pub struct VisualizationsResponse {
    pub data: Vec<AssetStatus>,
    pub warnings: Vec<String>,
}

/// Body of a failed image request
#[derive(Debug, Serialize)]
pub struct ImageError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub warning: String,
}

/// List the SHAP sections; missing images become warnings
pub async fn get_visualizations(State(state): State<SharedState>) -> Json<VisualizationsResponse> {
    let data = state.visualizations.sections();
    let warnings = data.iter().filter_map(|s| s.warning.clone()).collect();
    Json(VisualizationsResponse { data, warnings })
}

/// Serve the PNG bytes of one section
pub async fn get_visualization_image(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    let Some(visualization) = VisualizationCatalog::find(&id) else {
        return image_error(
            StatusCode::NOT_FOUND,
            None,
            format!("Unknown visualization: {id}"),
        );
    };

    let path = match state.visualizations.resolve(visualization) {
        Ok(path) => path,
        Err(e) => {
            warn!("{}", e);
            return image_error(StatusCode::NOT_FOUND, Some(e.kind()), e.to_string());
        }
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            image_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                None,
                format!("Image could not be read: {}", visualization.file_name),
            )
        }
    }
}

fn image_error(status: StatusCode, kind: Option<ErrorKind>, warning: String) -> Response {
    (status, Json(ImageError { kind, warning })).into_response()
}

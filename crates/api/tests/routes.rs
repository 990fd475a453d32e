use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use tsn_api::{create_router, AppState};
use tsn_artifacts::ArtifactStore;
use tsn_pipeline::{load_pipeline, PredictionPipeline};

const ARTIFACTS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../artifacts");

fn demo_pipeline() -> PredictionPipeline {
    load_pipeline(&ArtifactStore::new(ARTIFACTS)).unwrap()
}

fn app_with(state: AppState) -> Router {
    create_router(Arc::new(state))
}

fn app() -> Router {
    app_with(AppState::new(demo_pipeline(), "/nonexistent/tsn/assets"))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(), get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["model"].as_str().unwrap().starts_with("stacking("));
    assert_eq!(body["missing_artifacts"], json!([]));
}

#[tokio::test]
async fn test_features_catalogue() {
    let (status, body) = send(app(), get("/api/v1/features")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 5);
    assert_eq!(body["data"][0]["name"], "LCD");
    assert_eq!(body["data"][1]["transform"], "box_cox");
    assert_eq!(body["data"][4]["default"], 0.013545);
}

#[tokio::test]
async fn test_predict_defaults() {
    let (status, body) = send(app(), post_json("/api/v1/predict", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "complete");
    assert_eq!(body["input"]["LCD"], 8.33);
    assert_eq!(body["transformation"]["rows"].as_array().unwrap().len(), 5);
    assert!(body["prediction"]["original_value"].as_f64().unwrap().is_finite());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_predict_rejects_out_of_domain() {
    let request = post_json("/api/v1/predict", json!({ "LCD": 50.0, "Vf": 0.1 }));
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["violations"].as_array().unwrap().len(), 2);
    assert!(body.get("transformation").is_none());
}

#[tokio::test]
async fn test_predict_rejects_misspelled_keys() {
    let request = post_json("/api/v1/predict", json!({ "lcd": 30.0, "gsa": 5000.0 }));
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("unknown field `lcd`"));
}

#[tokio::test]
async fn test_predict_domain_error_without_validation() {
    let state = AppState::new(demo_pipeline(), "/nonexistent").with_validation(None);
    let request = post_json("/api/v1/predict", json!({ "Vf": 0.0 }));
    let (status, body) = send(app_with(state), request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"]["kind"], "transform_domain");
    assert_eq!(body["error"]["stage"], "normalize");
    assert!(body.get("prediction").is_none());
}

#[tokio::test]
async fn test_predict_missing_component_is_server_error() {
    let state = AppState::new(PredictionPipeline::new(), "/nonexistent");
    let (status, body) = send(app_with(state), post_json("/api/v1/predict", json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["kind"], "artifact_load");
}

#[tokio::test]
async fn test_visualizations_warn_on_missing() {
    let (status, body) = send(app(), get("/api/v1/visualizations")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["warnings"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"][0]["available"], false);
    assert_eq!(body["data"][0]["url"], "/api/v1/visualizations/base-learners");
}

#[tokio::test]
async fn test_visualization_image_served() {
    let dir = std::env::temp_dir().join(format!("tsn-api-assets-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("summary_plot.png"), b"\x89PNG\r\n").unwrap();

    let app = app_with(AppState::new(demo_pipeline(), &dir));
    let response = app
        .clone()
        .oneshot(get("/api/v1/visualizations/base-learners"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"\x89PNG\r\n");

    let (status, body) = send(app, get("/api/v1/visualizations/overall")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "asset_missing");
    assert!(body["warning"].as_str().unwrap().starts_with("Image not found"));
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_unknown_visualization() {
    let (status, body) = send(app(), get("/api/v1/visualizations/summary_plot.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.get("kind").is_none());
    assert_eq!(body["warning"], "Unknown visualization: summary_plot.png");
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let response = app().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

//! Feature Catalogue Route

use axum::Json;
use serde::Serialize;
use tsn_features::{Feature, TransformKind};

/// One input feature as shown to the user
#[derive(Debug, Serialize)]
pub struct FeatureInfo {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub transform: TransformKind,
}

impl From<Feature> for FeatureInfo {
    fn from(feature: Feature) -> Self {
        let (min, max) = feature.domain();
        Self {
            name: feature.name(),
            min,
            max,
            default: feature.default_value(),
            transform: feature.transform_kind(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub data: Vec<FeatureInfo>,
    pub count: usize,
}

/// List the five model inputs in column order
pub async fn get_features() -> Json<FeaturesResponse> {
    let data: Vec<FeatureInfo> = Feature::ALL.into_iter().map(FeatureInfo::from).collect();
    Json(FeaturesResponse {
        count: data.len(),
        data,
    })
}

//! SHAP Visualization Assets
//!
//! The charts are produced offline; this module only locates them. A missing
//! image is a per-section warning and never affects prediction.

use crate::error::PipelineError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// URL prefix of the image listing unless the host overrides it
pub const DEFAULT_URL_PREFIX: &str = "/visualizations";

/// One precomputed SHAP chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShapVisualization {
    /// Stable identifier used in image URLs
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub file_name: &'static str,
}

pub const SHAP_VISUALIZATIONS: [ShapVisualization; 3] = [
    ShapVisualization {
        id: "base-learners",
        title: "1. Base Learners SHAP",
        description: "SHAP summary from base models (RandomForest, XGB, etc.)",
        file_name: "summary_plot.png",
    },
    ShapVisualization {
        id: "meta-learner",
        title: "2. Meta Learner SHAP",
        description: "SHAP for the meta-learner (Linear Regression)",
        file_name: "SHAP Contribution Analysis for the Meta-Learner in the Second Layer of Stacking Regressor.png",
    },
    ShapVisualization {
        id: "overall",
        title: "3. Overall SHAP",
        description: "Combined SHAP analysis for the whole stacking model",
        file_name: "Based on the overall feature contribution analysis of SHAP to the stacking model.png",
    },
];

/// Resolution of one section against the asset directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetStatus {
    #[serde(flatten)]
    pub visualization: ShapVisualization,
    /// Where clients fetch the image bytes
    pub url: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Directory holding the SHAP images
#[derive(Debug, Clone)]
pub struct VisualizationCatalog {
    root: PathBuf,
    url_prefix: String,
}

impl VisualizationCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
        }
    }

    /// Prefix the image URLs with the route the host serves them under
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Image URL of one section
    pub fn url(&self, visualization: &ShapVisualization) -> String {
        format!("{}/{}", self.url_prefix, visualization.id)
    }

    /// Path of an image, or `AssetMissing` when the file is absent
    pub fn resolve(&self, visualization: &ShapVisualization) -> Result<PathBuf, PipelineError> {
        let path = self.root.join(visualization.file_name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(PipelineError::AssetMissing(path))
        }
    }

    /// Status of every section; each missing image logs a warning
    pub fn sections(&self) -> Vec<AssetStatus> {
        SHAP_VISUALIZATIONS
            .iter()
            .map(|visualization| match self.resolve(visualization) {
                Ok(_) => AssetStatus {
                    visualization: *visualization,
                    url: self.url(visualization),
                    available: true,
                    warning: None,
                },
                Err(e) => {
                    warn!("{}", e);
                    AssetStatus {
                        visualization: *visualization,
                        url: self.url(visualization),
                        available: false,
                        warning: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }

    /// Find a section by its id
    pub fn find(id: &str) -> Option<&'static ShapVisualization> {
        SHAP_VISUALIZATIONS.iter().find(|v| v.id == id)
    }
}

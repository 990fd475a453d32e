//! Service configuration
//!
//! Layered: built-in defaults, then the optional `tsn-predictor.toml`
//! (or the file named by `TSN_CONFIG`), then `TSN_*` environment variables.
//! Nested keys use `__`, e.g. `TSN_ARTIFACTS__QT_TSN`.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tsn_artifacts::ArtifactNames;
use tsn_features::ValidationConfig;

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "tsn-predictor.toml";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address
    pub bind_addr: String,

    /// Directory holding the seven model artifacts
    pub artifact_dir: PathBuf,

    /// Directory holding the SHAP images
    pub asset_dir: PathBuf,

    /// Max tracing level (trace, debug, info, warn, error)
    pub log_level: String,

    pub log_format: LogFormat,

    /// Reject out-of-domain inputs before running the pipeline
    pub validate_inputs: bool,

    /// Per-feature domain used when `validate_inputs` is on
    pub validation: ValidationConfig,

    /// Artifact file names
    pub artifacts: ArtifactNames,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            artifact_dir: PathBuf::from("artifacts"),
            asset_dir: PathBuf::from("assets"),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            validate_inputs: true,
            validation: ValidationConfig::default(),
            artifacts: ArtifactNames::default(),
        }
    }
}

impl AppConfig {
    /// Load from `TSN_CONFIG` (or the default file) plus the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("TSN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load from a specific file (optional) plus the environment
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("TSN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

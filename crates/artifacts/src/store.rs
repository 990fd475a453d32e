//! Artifact Store

use crate::bundle::ArtifactBundle;
use crate::ArtifactError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tsn_ensemble::StackingRegressor;
use tsn_features::Feature;
use tsn_transforms::{BoxCox, QuantileTransform};

/// The seven artifacts a prediction needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    StackingModel,
    QuantileLcd,
    QuantileGsa,
    QuantileDensity,
    LambdaVf,
    LambdaKtoluene,
    QuantileTsn,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 7] = [
        ArtifactKind::StackingModel,
        ArtifactKind::QuantileLcd,
        ArtifactKind::QuantileGsa,
        ArtifactKind::QuantileDensity,
        ArtifactKind::LambdaVf,
        ArtifactKind::LambdaKtoluene,
        ArtifactKind::QuantileTsn,
    ];

    /// Logical artifact name
    pub fn name(&self) -> &'static str {
        match self {
            ArtifactKind::StackingModel => "stack",
            ArtifactKind::QuantileLcd => "qt_lcd",
            ArtifactKind::QuantileGsa => "qt_gsa",
            ArtifactKind::QuantileDensity => "qt_density",
            ArtifactKind::LambdaVf => "lambda_vf",
            ArtifactKind::LambdaKtoluene => "lambda_kt",
            ArtifactKind::QuantileTsn => "qt_TSN",
        }
    }

    /// Artifact holding the forward transform of an input feature
    pub fn for_feature(feature: Feature) -> ArtifactKind {
        match feature {
            Feature::Lcd => ArtifactKind::QuantileLcd,
            Feature::Vf => ArtifactKind::LambdaVf,
            Feature::Gsa => ArtifactKind::QuantileGsa,
            Feature::Density => ArtifactKind::QuantileDensity,
            Feature::Ktoluene => ArtifactKind::LambdaKtoluene,
        }
    }
}

/// File name of each artifact inside the artifact directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactNames {
    pub stacking_model: String,
    pub qt_lcd: String,
    pub qt_gsa: String,
    pub qt_density: String,
    pub lambda_vf: String,
    pub lambda_ktoluene: String,
    pub qt_tsn: String,
}

impl ArtifactNames {
    /// File name configured for an artifact
    pub fn file_name(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::StackingModel => &self.stacking_model,
            ArtifactKind::QuantileLcd => &self.qt_lcd,
            ArtifactKind::QuantileGsa => &self.qt_gsa,
            ArtifactKind::QuantileDensity => &self.qt_density,
            ArtifactKind::LambdaVf => &self.lambda_vf,
            ArtifactKind::LambdaKtoluene => &self.lambda_ktoluene,
            ArtifactKind::QuantileTsn => &self.qt_tsn,
        }
    }
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            stacking_model: "stacking_model.json".to_string(),
            qt_lcd: "qt_lcd.json".to_string(),
            qt_gsa: "qt_GSA.json".to_string(),
            qt_density: "qt_Density.json".to_string(),
            lambda_vf: "lambda_vf.json".to_string(),
            lambda_ktoluene: "lambda_Ktoluene.json".to_string(),
            qt_tsn: "qt_TSN.json".to_string(),
        }
    }
}

/// Directory-backed artifact store
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    names: ArtifactNames,
}

impl ArtifactStore {
    /// Store rooted at `root` using the default file names
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_names(root, ArtifactNames::default())
    }

    /// Store rooted at `root` with custom file names
    pub fn with_names(root: impl Into<PathBuf>, names: ArtifactNames) -> Self {
        Self {
            root: root.into(),
            names,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of an artifact
    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join(self.names.file_name(kind))
    }

    /// Artifacts whose files do not exist
    pub fn missing(&self) -> Vec<ArtifactKind> {
        ArtifactKind::ALL
            .into_iter()
            .filter(|&kind| !self.path(kind).is_file())
            .collect()
    }

    /// Read and parse one artifact
    pub fn read_json<T: DeserializeOwned>(&self, kind: ArtifactKind) -> Result<T, ArtifactError> {
        let path = self.path(kind);
        debug!("Reading artifact {} from {}", kind.name(), path.display());
        let text = std::fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
            name: kind.name(),
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ArtifactError::Parse {
            name: kind.name(),
            source,
        })
    }

    /// Load and validate a quantile transform
    pub fn load_quantile(&self, kind: ArtifactKind) -> Result<QuantileTransform, ArtifactError> {
        let transform: QuantileTransform = self.read_json(kind)?;
        transform.validate().map_err(|e| ArtifactError::Invalid {
            name: kind.name(),
            reason: e.to_string(),
        })?;
        Ok(transform)
    }

    /// Load and validate a Box-Cox exponent
    pub fn load_boxcox(&self, kind: ArtifactKind) -> Result<BoxCox, ArtifactError> {
        let transform: BoxCox = self.read_json(kind)?;
        transform.validate().map_err(|e| ArtifactError::Invalid {
            name: kind.name(),
            reason: e.to_string(),
        })?;
        Ok(transform)
    }

    /// Load and validate the stacking model
    pub fn load_stacking_model(&self) -> Result<StackingRegressor, ArtifactError> {
        let kind = ArtifactKind::StackingModel;
        let model: StackingRegressor = self.read_json(kind)?;
        model.validate().map_err(|e| ArtifactError::Invalid {
            name: kind.name(),
            reason: e.to_string(),
        })?;
        Ok(model)
    }

    /// Load all seven artifacts; the first failure aborts
    pub fn load_bundle(&self) -> Result<ArtifactBundle, ArtifactError> {
        info!("Loading model artifacts from {}", self.root.display());
        let bundle = ArtifactBundle {
            stack: self.load_stacking_model()?,
            qt_lcd: self.load_quantile(ArtifactKind::QuantileLcd)?,
            qt_gsa: self.load_quantile(ArtifactKind::QuantileGsa)?,
            qt_density: self.load_quantile(ArtifactKind::QuantileDensity)?,
            lambda_vf: self.load_boxcox(ArtifactKind::LambdaVf)?,
            lambda_ktoluene: self.load_boxcox(ArtifactKind::LambdaKtoluene)?,
            qt_tsn: self.load_quantile(ArtifactKind::QuantileTsn)?,
        };
        bundle.check_feature_names()?;
        info!("Loaded {} artifacts", ArtifactKind::ALL.len());
        Ok(bundle)
    }
}

//! Feature Catalogue and Feature Sets

use serde::{Deserialize, Serialize};

/// Number of model input features
pub const FEATURE_DIMENSION: usize = 5;

/// Column names in the order the ensemble was trained on
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = ["LCD", "Vf", "GSA", "Density", "Ktoluene"];

/// Normalizing transform family fitted for a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Quantile,
    BoxCox,
}

/// One physical input feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Largest cavity diameter (Å)
    #[serde(rename = "LCD")]
    Lcd,
    /// Void fraction
    #[serde(rename = "Vf")]
    Vf,
    /// Gravimetric surface area (m²/g)
    #[serde(rename = "GSA")]
    Gsa,
    /// Crystal density (g/cm³)
    #[serde(rename = "Density")]
    Density,
    /// Henry coefficient of toluene
    #[serde(rename = "Ktoluene")]
    Ktoluene,
}

impl Feature {
    /// All features, in trained column order
    pub const ALL: [Feature; FEATURE_DIMENSION] = [
        Feature::Lcd,
        Feature::Vf,
        Feature::Gsa,
        Feature::Density,
        Feature::Ktoluene,
    ];

    /// Column name used by the model
    pub fn name(&self) -> &'static str {
        FEATURE_NAMES[self.column()]
    }

    /// Position in the model input vector
    pub fn column(&self) -> usize {
        match self {
            Feature::Lcd => 0,
            Feature::Vf => 1,
            Feature::Gsa => 2,
            Feature::Density => 3,
            Feature::Ktoluene => 4,
        }
    }

    /// Documented valid closed interval
    pub fn domain(&self) -> (f64, f64) {
        match self {
            Feature::Lcd => (6.03338, 39.1106),
            Feature::Vf => (0.2574, 0.9182),
            Feature::Gsa => (204.912, 7061.42),
            Feature::Density => (0.237838, 2.86501),
            Feature::Ktoluene => (0.000027383, 28527.4),
        }
    }

    /// Documented default input
    pub fn default_value(&self) -> f64 {
        match self {
            Feature::Lcd => 8.33,
            Feature::Vf => 0.5726,
            Feature::Gsa => 701.884,
            Feature::Density => 1.51454,
            Feature::Ktoluene => 0.013545,
        }
    }

    /// Which transform family normalizes this feature
    pub fn transform_kind(&self) -> TransformKind {
        match self {
            Feature::Vf | Feature::Ktoluene => TransformKind::BoxCox,
            Feature::Lcd | Feature::Gsa | Feature::Density => TransformKind::Quantile,
        }
    }

    /// Look a feature up by its column name
    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Five raw physical inputs for one prediction.
///
/// Absent fields take the documented defaults; unknown keys are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawFeatureSet {
    #[serde(rename = "LCD")]
    pub lcd: f64,
    #[serde(rename = "Vf")]
    pub vf: f64,
    #[serde(rename = "GSA")]
    pub gsa: f64,
    #[serde(rename = "Density")]
    pub density: f64,
    #[serde(rename = "Ktoluene")]
    pub ktoluene: f64,
}

impl RawFeatureSet {
    /// Create a raw feature set
    pub fn new(lcd: f64, vf: f64, gsa: f64, density: f64, ktoluene: f64) -> Self {
        Self {
            lcd,
            vf,
            gsa,
            density,
            ktoluene,
        }
    }

    /// Value of one feature
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Lcd => self.lcd,
            Feature::Vf => self.vf,
            Feature::Gsa => self.gsa,
            Feature::Density => self.density,
            Feature::Ktoluene => self.ktoluene,
        }
    }

    /// Replace one feature's value
    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        match feature {
            Feature::Lcd => self.lcd = value,
            Feature::Vf => self.vf = value,
            Feature::Gsa => self.gsa = value,
            Feature::Density => self.density = value,
            Feature::Ktoluene => self.ktoluene = value,
        }
        self
    }
}

impl Default for RawFeatureSet {
    fn default() -> Self {
        Self::new(
            Feature::Lcd.default_value(),
            Feature::Vf.default_value(),
            Feature::Gsa.default_value(),
            Feature::Density.default_value(),
            Feature::Ktoluene.default_value(),
        )
    }
}

/// Five normalized features, indexed by trained column
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformedFeatureSet {
    values: [f64; FEATURE_DIMENSION],
}

impl TransformedFeatureSet {
    /// Build from per-feature values
    pub fn from_fn(mut f: impl FnMut(Feature) -> f64) -> Self {
        let mut values = [0.0; FEATURE_DIMENSION];
        for feature in Feature::ALL {
            values[feature.column()] = f(feature);
        }
        Self { values }
    }

    /// Normalized value of one feature
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.column()]
    }

    /// Set one feature's normalized value
    pub fn set(&mut self, feature: Feature, value: f64) {
        self.values[feature.column()] = value;
    }

    /// Values in trained column order
    pub fn as_array(&self) -> &[f64; FEATURE_DIMENSION] {
        &self.values
    }
}

/// Named, ordered model input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub(crate) columns: Vec<String>,
    pub(crate) values: Vec<f64>,
}

impl FeatureVector {
    /// Pair column names with values; lengths must agree
    pub fn new(columns: Vec<String>, values: Vec<f64>) -> Result<Self, crate::AssemblyError> {
        if columns.len() != values.len() {
            return Err(crate::AssemblyError::WrongLength {
                expected: columns.len(),
                actual: values.len(),
            });
        }
        Ok(Self { columns, values })
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values, aligned with `columns`
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

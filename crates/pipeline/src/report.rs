//! Prediction Output Types

use serde::{Deserialize, Serialize};
use std::fmt;
use tsn_features::{Feature, RawFeatureSet, TransformedFeatureSet};

/// One feature's original and normalized value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformationRow {
    pub feature: Feature,
    #[serde(rename = "original_value")]
    pub original: f64,
    #[serde(rename = "transformed_value")]
    pub transformed: f64,
}

/// Original vs transformed values for all five features, in column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationTable {
    pub rows: Vec<TransformationRow>,
}

impl TransformationTable {
    pub fn new(raw: &RawFeatureSet, transformed: &TransformedFeatureSet) -> Self {
        let rows = Feature::ALL
            .into_iter()
            .map(|feature| TransformationRow {
                feature,
                original: raw.get(feature),
                transformed: transformed.get(feature),
            })
            .collect();
        Self { rows }
    }

    pub fn row(&self, feature: Feature) -> Option<&TransformationRow> {
        self.rows.iter().find(|r| r.feature == feature)
    }

    /// Transformed values in column order
    pub fn transformed_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.transformed).collect()
    }
}

impl fmt::Display for TransformationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<10} {:>18} {:>18}", "Feature", "Original Value", "Transformed Value")?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<10} {:>18.6} {:>18.6}",
                row.feature.name(),
                row.original,
                row.transformed
            )?;
        }
        Ok(())
    }
}

/// Final prediction in both output scales
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Model output in normalized space
    pub transformed_value: f64,
    /// TSN in physical units
    pub original_value: f64,
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transformed TSN: {:.6}, Original TSN: {:.6}",
            self.transformed_value, self.original_value
        )
    }
}

//! Input Domain Validator
//!
//! Range checking for the input collaborator. The inference pipeline never
//! clamps or rejects on its own; callers opt into these checks.

use crate::error::ValidationError;
use crate::features::{Feature, RawFeatureSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// LCD valid range (Å)
    pub lcd_range: (f64, f64),
    /// Void fraction valid range
    pub vf_range: (f64, f64),
    /// GSA valid range (m²/g)
    pub gsa_range: (f64, f64),
    /// Density valid range (g/cm³)
    pub density_range: (f64, f64),
    /// Ktoluene valid range
    pub ktoluene_range: (f64, f64),
}

impl ValidationConfig {
    /// Range configured for one feature
    pub fn range(&self, feature: Feature) -> (f64, f64) {
        match feature {
            Feature::Lcd => self.lcd_range,
            Feature::Vf => self.vf_range,
            Feature::Gsa => self.gsa_range,
            Feature::Density => self.density_range,
            Feature::Ktoluene => self.ktoluene_range,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            lcd_range: Feature::Lcd.domain(),
            vf_range: Feature::Vf.domain(),
            gsa_range: Feature::Gsa.domain(),
            density_range: Feature::Density.domain(),
            ktoluene_range: Feature::Ktoluene.domain(),
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, fields_checked: usize) -> Self {
        Self {
            valid: false,
            errors,
            fields_checked,
        }
    }
}

/// Domain validator for raw feature sets
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a closed range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            Err(ValidationError::NonFinite { field, value })
        } else if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate one feature of a raw set
    pub fn validate_feature(&self, feature: Feature, value: f64) -> Result<(), ValidationError> {
        self.validate_range(feature.name(), value, self.config.range(feature))
    }

    /// Validate every feature, collecting all violations
    pub fn validate(&self, raw: &RawFeatureSet) -> ValidationResult {
        let errors: Vec<ValidationError> = Feature::ALL
            .iter()
            .filter_map(|&f| self.validate_feature(f, raw.get(f)).err())
            .collect();

        if errors.is_empty() {
            ValidationResult::valid(Feature::ALL.len())
        } else {
            debug!("Input validation failed with {} error(s)", errors.len());
            ValidationResult::invalid(errors, Feature::ALL.len())
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults_are_valid() {
        let result = Validator::default().validate(&RawFeatureSet::default());
        assert!(result.valid);
        assert_eq!(result.fields_checked, 5);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let validator = Validator::default();
        assert!(validator.validate_feature(Feature::Vf, 0.2574).is_ok());
        assert!(validator.validate_feature(Feature::Vf, 0.9182).is_ok());
        assert!(validator.validate_feature(Feature::Vf, 0.2573).is_err());
    }

    #[test]
    fn test_collects_every_violation() {
        let raw = RawFeatureSet::default()
            .with(Feature::Lcd, 1.0)
            .with(Feature::Ktoluene, -3.0);
        let result = Validator::default().validate(&raw);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
        assert!(matches!(
            result.errors[0],
            ValidationError::OutOfRange { field: "LCD", .. }
        ));
    }

    #[test]
    fn test_nan_is_reported() {
        let validator = Validator::default();
        assert!(matches!(
            validator.validate_feature(Feature::Gsa, f64::NAN),
            Err(ValidationError::NonFinite { field: "GSA", .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_in_domain_values_pass(t in 0.0f64..=1.0) {
            let validator = Validator::default();
            for feature in Feature::ALL {
                let (min, max) = feature.domain();
                let value = (min + t * (max - min)).clamp(min, max);
                prop_assert!(validator.validate_feature(feature, value).is_ok());
            }
        }
    }
}

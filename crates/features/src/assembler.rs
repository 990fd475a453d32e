//! Feature Vector Assembly

use crate::error::AssemblyError;
use crate::features::{FeatureVector, TransformedFeatureSet, FEATURE_DIMENSION, FEATURE_NAMES};
use tracing::debug;

/// Orders normalized features into the model's input row.
///
/// Purely structural: no value is changed. Column order is the only
/// invariant and is checked by [`FeatureAssembler::validate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureAssembler;

impl FeatureAssembler {
    /// Build `[LCD, Vf, GSA, Density, Ktoluene]`
    pub fn assemble(transformed: &TransformedFeatureSet) -> FeatureVector {
        let columns = FEATURE_NAMES.iter().map(|name| name.to_string()).collect();
        let values = transformed.as_array().to_vec();
        debug!("Assembled feature vector: {:?}", values);
        FeatureVector { columns, values }
    }

    /// Reject rows whose width or column order differs from training
    pub fn validate(vector: &FeatureVector) -> Result<(), AssemblyError> {
        if vector.len() != FEATURE_DIMENSION || vector.columns().len() != FEATURE_DIMENSION {
            return Err(AssemblyError::WrongLength {
                expected: FEATURE_DIMENSION,
                actual: vector.len(),
            });
        }
        for (index, (actual, expected)) in vector.columns().iter().zip(FEATURE_NAMES).enumerate() {
            if actual != expected {
                return Err(AssemblyError::WrongOrder {
                    index,
                    expected: expected.to_string(),
                    actual: actual.clone(),
                });
            }
        }
        Ok(())
    }

    /// Assemble and validate in one step
    pub fn assemble_checked(
        transformed: &TransformedFeatureSet,
    ) -> Result<FeatureVector, AssemblyError> {
        let vector = Self::assemble(transformed);
        Self::validate(&vector)?;
        Ok(vector)
    }
}

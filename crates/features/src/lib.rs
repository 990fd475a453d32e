//! TSN Feature Model
//!
//! The five physical input features, their documented domains, the
//! raw/normalized feature sets and the fixed-order model input row.

mod assembler;
mod error;
mod features;
mod validator;

pub use assembler::FeatureAssembler;
pub use error::{AssemblyError, ValidationError};
pub use features::{
    Feature, FeatureVector, RawFeatureSet, TransformKind, TransformedFeatureSet,
    FEATURE_DIMENSION, FEATURE_NAMES,
};
pub use validator::{ValidationConfig, ValidationResult, Validator};

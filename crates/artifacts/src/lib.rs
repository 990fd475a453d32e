//! Artifact Storage
//!
//! Resolves the seven pre-fitted artifacts by name, parses them and checks
//! their structure. Loading happens once at startup; the resulting bundle is
//! immutable.

mod bundle;
mod store;

pub use bundle::ArtifactBundle;
pub use store::{ArtifactKind, ArtifactNames, ArtifactStore};

use std::path::PathBuf;
use thiserror::Error;

/// Artifact loading errors (fatal at startup)
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact `{name}` could not be read from {}: {source}", .path.display())]
    Io {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Artifact `{name}` could not be parsed: {source}")]
    Parse {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Artifact `{name}` is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

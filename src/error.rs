//! Error types for the respawn engine.

use crate::types::WorldId;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RespawnError>;

#[derive(Debug, Error)]
pub enum RespawnError {
    #[error("invalid selector weight {0}: weights must be positive and finite")]
    InvalidWeight(f64),

    #[error("a template with identifier '{0}' is already registered")]
    DuplicateIdentifier(String),

    #[error("world '{0}' has no boss battle")]
    UnsupportedWorld(WorldId),

    #[error("no battle adapter supports host version '{0}'")]
    UnsupportedHostVersion(String),
}

/// A template definition that could not be turned into a [`crate::Template`].
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid template '{id}': {reason}")]
    Invalid { id: String, reason: String },
}

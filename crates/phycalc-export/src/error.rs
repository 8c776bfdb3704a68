//! Errors from the export layer.

use phycalc_model::ModelError;
use thiserror::Error;

/// Convenience alias for results within the export crate.
pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("model has no register map attached")]
    NoRegisterMap,

    #[error("field '{field}' value {value} does not fit {bit_width} bits")]
    FieldOverflow { field: String, value: i64, bit_width: u8 },

    #[error("field '{field}' holds a non-integer value '{value}'")]
    NotAnInteger { field: String, value: String },

    #[error("unknown output format '{0}', expected json, toml or text")]
    UnknownFormat(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization failed: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

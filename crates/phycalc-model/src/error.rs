//! Error types for the variable and model registry.

use std::path::PathBuf;

/// Errors from registering, reading or mutating model state.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("variable '{0}' is already registered")]
    DuplicateVariable(String),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("variable '{0}' is not forceable")]
    NotForceable(String),

    #[error("type mismatch on '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("unknown enum '{0}'")]
    UnknownEnum(String),

    #[error("enum '{enum_name}' member '{member}' is already defined as {existing}, cannot redefine as {requested}")]
    EnumMemberRedefined {
        enum_name: String,
        member: String,
        existing: i64,
        requested: i64,
    },

    #[error("'{member}' is not a member of enum '{enum_name}'")]
    UnknownEnumMember { enum_name: String, member: String },

    #[error("a PHY named '{0}' already exists in this model")]
    DuplicatePhyName(String),

    #[error("unknown PHY '{0}'")]
    UnknownPhy(String),

    #[error("stale PHY handle {0}")]
    StalePhyHandle(usize),

    #[error("register map parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("register map not found: {}", path.display())]
    RegisterMapNotFound { path: PathBuf },

    #[error("invalid register map: {detail}")]
    InvalidRegisterMap { detail: String },
}

//! Composition and input-loading errors.

use phycalc_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    /// `phy` names the PHY, or the profile for a profile-only calculation.
    #[error("'{input}' is not an input of the profile used by '{phy}'")]
    InvalidOverride { phy: String, input: String },

    #[error("PHY '{phy}' binds unknown input '{input}'")]
    UnknownInput { phy: String, input: String },

    #[error("'{phy}' is missing required inputs: {}", .inputs.join(", "))]
    MissingRequiredInput { phy: String, inputs: Vec<String> },

    #[error("invalid value '{value}' for '{input}': {reason}")]
    InvalidInputValue {
        input: String,
        value: String,
        reason: String,
    },

    #[error("expected NAME=VALUE, got '{0}'")]
    MalformedAssignment(String),

    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ComposeError {
    pub fn is_duplicate_phy(&self) -> bool {
        matches!(self, ComposeError::Model(ModelError::DuplicatePhyName(_)))
    }
}

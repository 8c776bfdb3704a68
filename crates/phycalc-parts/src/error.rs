//! Part family and configurator errors.

use phycalc_compose::ComposeError;
use phycalc_engine::EngineError;
use phycalc_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartsError {
    #[error("unknown part family '{0}'")]
    UnknownFamily(String),

    #[error("part family '{family}' has no revision '{revision}'")]
    UnknownRevision { family: String, revision: String },

    #[error("no PHY named or identified by '{0}'")]
    UnknownPhy(String),

    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    #[error("unknown target '{0}'")]
    UnknownTarget(String),

    #[error("PHY '{phy}' is not supported on target '{target}'")]
    PhyNotSupportedOnTarget { phy: String, target: String },

    #[error("unknown PHY group kind '{0}'")]
    UnknownGroupKind(String),

    #[error("invalid band table: {0}")]
    InvalidBandTable(String),

    #[error("failed to parse band table: {0}")]
    BandTableParse(#[from] toml::de::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Compose(#[from] ComposeError),
}

impl PartsError {
    /// True when a calculation unit rejected the PHY's configuration.
    pub fn is_domain(&self) -> bool {
        matches!(self, PartsError::Engine(e) if e.is_domain())
    }
}

pub type Result<T> = std::result::Result<T, PartsError>;

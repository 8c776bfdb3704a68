//! Engine and calculation-unit errors.

use indexmap::IndexMap;
use phycalc_model::ModelError;
use thiserror::Error;

/// Errors raised from inside a calculation unit.
#[derive(Debug, Error)]
pub enum CalcError {
    /// A unit detected an incompatible configuration.
    #[error("{0}")]
    Domain(String),

    /// A read of a variable that has no forced, computed or default value.
    #[error("variable '{0}' has no value")]
    Unset(String),

    #[error("negative value {value} not allowed for '{var}'")]
    NegativeValueNotAllowed { var: String, value: i64 },

    #[error("'{0}' is not a register field")]
    NotRegisterField(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl CalcError {
    pub fn domain(message: impl Into<String>) -> Self {
        CalcError::Domain(message.into())
    }
}

/// Errors that abort a whole engine run. The model is left untouched.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("dependency cycle between units: {}", .0.join(", "))]
    CyclicDependency(Vec<String>),

    #[error("unit '{unit}' read '{variable}' before any unit wrote it and it has no default")]
    UnsatisfiedDependency { variable: String, unit: String },

    #[error("calculation unit '{0}' is already registered")]
    DuplicateUnit(String),

    #[error("unit '{unit}' failed: {source}")]
    Unit {
        unit: String,
        #[source]
        source: CalcError,
        /// Which units had completed when this one failed.
        executed: IndexMap<String, bool>,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl EngineError {
    /// True for a unit-raised domain violation, as opposed to a structural
    /// failure of the build.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            EngineError::Unit {
                source: CalcError::Domain(_),
                ..
            }
        )
    }
}

//! Part families for phycalc.
//!
//! A [`Part`] bundles what it takes to configure one chip revision: the
//! register map, an ordered list of [`Calculator`]s, profiles and a PHY
//! library. The [`Configurator`] turns a PHY name into a calculated model,
//! one PHY at a time or as a parallel sweep, optionally for a [`Target`].

pub mod bands;
pub mod calculator;
pub mod configurator;
pub mod error;
pub mod part;
pub mod reference;
pub mod target;

pub use bands::{Band, BandTable};
pub use calculator::Calculator;
pub use configurator::{CalculatedPhy, CalculatedProfile, Configurator, SweepResult};
pub use error::{PartsError, Result};
pub use part::{Part, PhyFn, PhyRoutine};
pub use target::{GroupKind, Target};

/// Known part families.
pub fn families() -> &'static [&'static str] {
    &[reference::FAMILY]
}

/// Revisions available for `family`.
pub fn revisions(family: &str) -> Result<&'static [&'static str]> {
    match family {
        reference::FAMILY => Ok(reference::REVISIONS),
        other => Err(PartsError::UnknownFamily(other.to_string())),
    }
}

/// Build the part for `family` and `revision`.
pub fn load_part(family: &str, revision: &str) -> Result<Part> {
    match family {
        reference::FAMILY => reference::part(revision),
        other => Err(PartsError::UnknownFamily(other.to_string())),
    }
}

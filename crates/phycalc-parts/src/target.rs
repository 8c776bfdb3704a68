//! Build targets and PHY group kinds.
//!
//! A [`Target`] is the platform a configuration is built for: silicon, an
//! FPGA model, a simulator. It may run a last hook over every calculated
//! model, and PHYs opt out of it with a `-<tag>` tag.

use std::fmt;
use std::str::FromStr;

use phycalc_engine::{CalcContext, CalcError, CalcUnit};

use crate::error::PartsError;

/// Prefix of a PHY tag that excludes the PHY from a target.
pub const EXCLUDE_PREFIX: &str = "-";

#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub tag: String,
    pub description: String,
    calculate: Option<CalcUnit>,
}

impl Target {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            description: String::new(),
            calculate: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the hook run after the profile hook on every model calculated
    /// for this target.
    pub fn with_calculate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CalcContext<'_>) -> Result<(), CalcError> + Send + Sync + 'static,
    {
        let name = format!("target_calculate_{}", self.tag);
        self.calculate = Some(CalcUnit::new(name, hook));
        self
    }

    pub fn calculate_hook(&self) -> Option<&CalcUnit> {
        self.calculate.as_ref()
    }

    /// The tag that keeps a PHY off this target.
    pub fn exclude_tag(&self) -> String {
        format!("{EXCLUDE_PREFIX}{}", self.tag)
    }

    pub fn supports(&self, phy_tags: &[String]) -> bool {
        let exclude = self.exclude_tag();
        !phy_tags.iter().any(|t| *t == exclude)
    }
}

/// What a PHY group is for. A group may be several kinds at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Shipped to customers.
    Customer,
    /// Exercised by simulation regressions.
    SimTests,
    /// Offered in the configuration tool.
    Studio,
    /// Kept for bring-up only; not expected to calculate cleanly.
    NonFunctional,
}

impl GroupKind {
    pub const ALL: [GroupKind; 4] = [
        GroupKind::Customer,
        GroupKind::SimTests,
        GroupKind::Studio,
        GroupKind::NonFunctional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Customer => "customer",
            GroupKind::SimTests => "sim-tests",
            GroupKind::Studio => "studio",
            GroupKind::NonFunctional => "non-functional",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKind {
    type Err = PartsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PartsError::UnknownGroupKind(s.to_string()))
    }
}

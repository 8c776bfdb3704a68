//! Profiles: the input contract a PHY binds values to.

use indexmap::{IndexMap, IndexSet};
use phycalc_engine::{CalcContext, CalcError, CalcUnit};
use phycalc_model::Value;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputCategory {
    /// Must be bound by the PHY or the caller.
    Required,
    /// Has a usable default.
    Optional,
    /// Rarely changed tuning knob.
    Advanced,
}

/// One input of a profile, bound to a model variable of the same name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileInput {
    pub variable: String,
    pub category: InputCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ProfileInput {
    pub fn required(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            category: InputCategory::Required,
            default: None,
            deprecated: false,
            description: String::new(),
        }
    }

    pub fn optional(variable: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            category: InputCategory::Optional,
            default: Some(default.into()),
            ..Self::required(variable)
        }
    }

    pub fn advanced(variable: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            category: InputCategory::Advanced,
            ..Self::optional(variable, default)
        }
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Named set of inputs and overridable outputs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Profile {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    inputs: IndexMap<String, ProfileInput>,
    outputs: IndexSet<String>,
    /// Runs once after every calculation unit, for profile-wide fixups.
    #[serde(skip)]
    calculate: Option<CalcUnit>,
}

impl Profile {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Add or replace an input.
    pub fn with_input(mut self, input: ProfileInput) -> Self {
        self.inputs.insert(input.variable.clone(), input);
        self
    }

    pub fn with_output(mut self, variable: impl Into<String>) -> Self {
        self.outputs.insert(variable.into());
        self
    }

    /// Set the hook run after the calculation units of every PHY built on
    /// this profile.
    pub fn with_calculate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CalcContext<'_>) -> Result<(), CalcError> + Send + Sync + 'static,
    {
        let name = format!("profile_calculate_{}", self.name.to_lowercase());
        self.calculate = Some(CalcUnit::new(name, hook));
        self
    }

    pub fn calculate_hook(&self) -> Option<&CalcUnit> {
        self.calculate.as_ref()
    }

    pub fn input(&self, name: &str) -> Option<&ProfileInput> {
        self.inputs.get(name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &ProfileInput> {
        self.inputs.values()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(String::as_str)
    }

    pub fn is_output(&self, name: &str) -> bool {
        self.outputs.contains(name)
    }

    /// Non-deprecated required inputs, in declaration order.
    pub fn required_inputs(&self) -> impl Iterator<Item = &ProfileInput> {
        self.inputs
            .values()
            .filter(|i| i.category == InputCategory::Required && !i.deprecated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_declaration_order() {
        let p = Profile::new("Base", "Generic FSK profile")
            .with_input(ProfileInput::required("base_frequency_hz"))
            .with_input(ProfileInput::optional("preamble_length", 32i64))
            .with_input(ProfileInput::advanced("agc_settling_delay", 39i64))
            .with_input(ProfileInput::required("legacy_mode").deprecated())
            .with_output("SYNTH_FREQ_FREQ");

        let names: Vec<&str> = p.inputs().map(|i| i.variable.as_str()).collect();
        assert_eq!(
            names,
            vec!["base_frequency_hz", "preamble_length", "agc_settling_delay", "legacy_mode"]
        );
        let required: Vec<&str> = p.required_inputs().map(|i| i.variable.as_str()).collect();
        assert_eq!(required, vec!["base_frequency_hz"]);
        assert!(p.is_output("SYNTH_FREQ_FREQ"));
        assert_eq!(
            p.input("agc_settling_delay").map(|i| i.category),
            Some(InputCategory::Advanced)
        );
        assert!(p.calculate_hook().is_none());
    }

    #[test]
    fn calculate_hook_is_named_after_profile() {
        let p = Profile::new("Base", "").with_calculate(|_| Ok(()));
        assert_eq!(p.calculate_hook().map(CalcUnit::name), Some("profile_calculate_base"));
    }
}

//! Loading a PHY's profile inputs and output overrides into a model.

use indexmap::IndexMap;
use phycalc_engine::encode_negative;
use phycalc_model::{Diagnostic, Model, PhyHandle, Value, VarKind};
use tracing::{debug, warn};

use crate::error::ComposeError;
use crate::profile::Profile;

/// Force a PHY's inputs and overrides onto `model`.
///
/// Bindings are layered: profile defaults (deprecated inputs skipped),
/// then the PHY's own input bindings, then `optional_inputs` from the
/// caller. Every required input must end up bound. The result is forced
/// onto the input variables, then output overrides are forced too. An
/// override may target a profile output or any register field; a negative
/// register-field override is stored in two's complement.
pub fn load_phy(
    model: &mut Model,
    profile: &Profile,
    phy: PhyHandle,
    optional_inputs: &IndexMap<String, Value>,
) -> Result<(), ComposeError> {
    let record = model.phy(phy)?.clone();
    bind_inputs(model, profile, &record.name, &record.inputs, optional_inputs)?;

    for (name, value) in &record.overrides {
        if !profile.is_output(name) && model.get(name)?.bit_width().is_none() {
            return Err(ComposeError::InvalidOverride {
                phy: record.name.clone(),
                input: name.clone(),
            });
        }
        let value = encode_override(model, &record.name, name, value.clone())?;
        model.force(name, value)?;
    }
    Ok(())
}

/// Force profile defaults and `optional_inputs` onto `model` with no PHY
/// involved. Errors name the profile where they would name a PHY.
pub fn load_profile(
    model: &mut Model,
    profile: &Profile,
    optional_inputs: &IndexMap<String, Value>,
) -> Result<(), ComposeError> {
    bind_inputs(model, profile, &profile.name, &IndexMap::new(), optional_inputs)
}

fn bind_inputs(
    model: &mut Model,
    profile: &Profile,
    owner: &str,
    phy_inputs: &IndexMap<String, Value>,
    optional_inputs: &IndexMap<String, Value>,
) -> Result<(), ComposeError> {
    let mut bindings: IndexMap<String, Value> = IndexMap::new();
    for input in profile.inputs() {
        if input.deprecated {
            continue;
        }
        if let Some(default) = &input.default {
            bindings.insert(input.variable.clone(), default.clone());
        }
    }

    for (name, value) in phy_inputs {
        let Some(input) = profile.input(name) else {
            return Err(ComposeError::UnknownInput {
                phy: owner.to_string(),
                input: name.clone(),
            });
        };
        if input.deprecated {
            let diagnostic = Diagnostic::warning(format!("PHY binds deprecated input '{name}'"))
                .on_variable(name.clone());
            warn!(phy = owner, input = %name, "PHY binds deprecated input");
            model.push_diagnostic(diagnostic);
        }
        bindings.insert(name.clone(), value.clone());
    }

    for (name, value) in optional_inputs {
        if profile.input(name).is_none() {
            return Err(ComposeError::InvalidOverride {
                phy: owner.to_string(),
                input: name.clone(),
            });
        }
        bindings.insert(name.clone(), value.clone());
    }

    let missing: Vec<String> = profile
        .required_inputs()
        .filter(|i| !bindings.contains_key(&i.variable))
        .map(|i| i.variable.clone())
        .collect();
    if !missing.is_empty() {
        return Err(ComposeError::MissingRequiredInput {
            phy: owner.to_string(),
            inputs: missing,
        });
    }

    for (name, value) in bindings {
        let value = resolve_enum_name(model, &name, value)?;
        debug!(input = %name, value = %value, "binding input");
        model.force(&name, value)?;
    }
    Ok(())
}

/// Enum inputs may name a member instead of giving its value.
fn resolve_enum_name(model: &Model, name: &str, value: Value) -> Result<Value, ComposeError> {
    let var = model.get(name)?;
    if var.kind() != VarKind::Enum {
        return Ok(value);
    }
    let token = match value {
        Value::Text(token) => token,
        other => return Ok(other),
    };
    let enum_name = var.enum_name().unwrap_or_default();
    let def = model.enum_def(enum_name)?;
    def.resolve(&token)
        .map(Value::Int)
        .ok_or_else(|| ComposeError::InvalidInputValue {
            input: name.to_string(),
            value: token,
            reason: format!("not a member of {enum_name}"),
        })
}

fn encode_override(model: &mut Model, phy: &str, name: &str, value: Value) -> Result<Value, ComposeError> {
    let Some(width) = model.get(name)?.bit_width() else {
        return Ok(value);
    };
    let v = match value {
        Value::Int(v) if v < 0 => v,
        other => return Ok(other),
    };
    let min = -(1i64 << u32::from(width.max(1) - 1).min(62));
    if v < min {
        return Err(ComposeError::InvalidInputValue {
            input: name.to_string(),
            value: v.to_string(),
            reason: format!("below {min}, the smallest {width}-bit two's complement value"),
        });
    }
    let encoded = encode_negative(v, width, true);
    warn!(phy, field = name, value = v, encoded, "negative override stored as two's complement");
    model.push_diagnostic(
        Diagnostic::warning(format!(
            "negative override {v} converted to two's complement {encoded}"
        ))
        .on_variable(name),
    );
    Ok(Value::Int(encoded))
}

/// Parse a command-line or config value: booleans, integers (decimal or
/// `0x` hex), floats, comma-separated integer lists, else text.
pub fn parse_input_value(raw: &str) -> Value {
    let raw = raw.trim();
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Some(v) = parse_int(raw) {
        return Value::Int(v);
    }
    if let Ok(v) = raw.parse::<f64>() {
        return Value::Float(v);
    }
    if raw.contains(',') {
        let items: Option<Vec<i64>> = raw.split(',').map(|s| parse_int(s.trim())).collect();
        if let Some(items) = items {
            return Value::IntArray(items);
        }
    }
    Value::Text(raw.to_string())
}

fn parse_int(raw: &str) -> Option<i64> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return i64::from_str_radix(&hex.replace('_', ""), 16).ok();
    }
    raw.replace('_', "").parse::<i64>().ok()
}

/// Split `NAME=VALUE` into a binding.
pub fn parse_assignment(raw: &str) -> Result<(String, Value), ComposeError> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| ComposeError::MalformedAssignment(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ComposeError::MalformedAssignment(raw.to_string()));
    }
    Ok((name.to_string(), parse_input_value(value)))
}

//! Snapshot of a calculated model in the shape firmware consumes.
//!
//! Three views are taken from the same model:
//! - register fields keyed by `PERIPHERAL.REGISTER.FIELD`, each a value or
//!   `DontCare` plus where the value came from
//! - software outputs by variable name
//! - packed 32-bit register words with a care mask

use std::collections::BTreeMap;

use indexmap::IndexMap;
use phycalc_model::{Diagnostic, Model, Phy, Value, VarFormat, VarRole, Variable};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::{ExportError, Result};

/// Where an exported field value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldOrigin {
    Computed,
    Forced,
    Reset,
}

/// A register field value, or `DontCare` for a field the configuration
/// leaves unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Value(u64),
    DontCare,
}

impl FieldValue {
    pub fn value(self) -> Option<u64> {
        match self {
            FieldValue::Value(v) => Some(v),
            FieldValue::DontCare => None,
        }
    }

    pub fn is_do_not_care(self) -> bool {
        self == FieldValue::DontCare
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Value(v) => serializer.serialize_u64(*v),
            FieldValue::DontCare => serializer.serialize_str("DontCare"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedField {
    pub value: FieldValue,
    pub origin: FieldOrigin,
    /// Value the field holds in the packed register word.
    pub raw: u64,
    #[serde(skip)]
    pub hex: bool,
}

/// One 32-bit register after packing all its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegisterWord {
    pub address: u32,
    pub value: u32,
    /// Bits owned by fields that are not don't-care.
    pub care_mask: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhyExport {
    /// PHY name, or the profile name for a profile-only calculation.
    pub phy: String,
    /// Empty for a profile-only calculation.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub guid: String,
    pub part: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_to: Option<String>,
    pub fields: IndexMap<String, ExportedField>,
    pub outputs: IndexMap<String, Value>,
    pub registers: Vec<RegisterWord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl PhyExport {
    /// Export `phy` from the finished `model`.
    pub fn from_model(model: &Model, phy: &Phy) -> Result<Self> {
        let mut export = Self::snapshot(model, &phy.name)?;
        export.guid = phy.guid.clone();
        export.points_to = phy.points_to.clone();
        Ok(export)
    }

    /// Export a model calculated from `profile` alone.
    pub fn from_profile(model: &Model, profile: &str) -> Result<Self> {
        Self::snapshot(model, profile)
    }

    fn snapshot(model: &Model, name: &str) -> Result<Self> {
        let fields = export_fields(model)?;
        let registers = pack_registers(model, &fields)?;
        debug!(name, fields = fields.len(), "model exported");
        Ok(Self {
            phy: name.to_string(),
            guid: String::new(),
            part: model.part_name(),
            points_to: None,
            fields,
            outputs: software_outputs(model),
            registers,
            diagnostics: model.diagnostics().to_vec(),
        })
    }

    pub fn field(&self, key: &str) -> Option<&ExportedField> {
        self.fields.get(key)
    }

    pub fn register(&self, address: u32) -> Option<&RegisterWord> {
        self.registers.iter().find(|r| r.address == address)
    }

    /// Copy without don't-care fields. Register words are unchanged.
    pub fn without_do_not_care(&self) -> Self {
        let mut export = self.clone();
        export.fields.retain(|_, f| !f.value.is_do_not_care());
        export
    }
}

/// Register-field export in register map order.
pub fn export_fields(model: &Model) -> Result<IndexMap<String, ExportedField>> {
    let map = model.register_map().ok_or(ExportError::NoRegisterMap)?;
    let mut fields = IndexMap::with_capacity(map.len());
    for (key, info) in map.fields() {
        let var = model.get(&phycalc_model::field_key_to_var_name(key))?;
        let (raw, origin) = match (var.forced_value(), var.computed_value()) {
            (Some(v), _) => (field_bits(key, var, v)?, FieldOrigin::Forced),
            (None, Some(v)) => (field_bits(key, var, v)?, FieldOrigin::Computed),
            (None, None) => (info.reset, FieldOrigin::Reset),
        };
        if raw > info.max_value() {
            return Err(ExportError::FieldOverflow {
                field: key.to_string(),
                value: raw as i64,
                bit_width: info.bit_width,
            });
        }
        // A don't-care field is packed with its reset value.
        let (value, raw) = if var.is_do_not_care() && !var.is_forced() {
            (FieldValue::DontCare, info.reset)
        } else {
            (FieldValue::Value(raw), raw)
        };
        fields.insert(
            key.to_string(),
            ExportedField {
                value,
                origin,
                raw,
                hex: var.format() == VarFormat::Hex,
            },
        );
    }
    Ok(fields)
}

fn field_bits(key: &str, var: &Variable, value: &Value) -> Result<u64> {
    let v = value.as_int().ok_or_else(|| ExportError::NotAnInteger {
        field: key.to_string(),
        value: value.to_string(),
    })?;
    u64::try_from(v).map_err(|_| ExportError::FieldOverflow {
        field: key.to_string(),
        value: v,
        bit_width: var.bit_width().unwrap_or(0),
    })
}

/// Software outputs that hold a value, in registration order.
pub fn software_outputs(model: &Model) -> IndexMap<String, Value> {
    let mut outputs = IndexMap::new();
    for var in model.variables().filter(|v| v.role() == VarRole::SoftwareOutput) {
        match var.effective_value() {
            Some(value) => {
                outputs.insert(var.name().to_string(), value.clone());
            }
            None => debug!(output = var.name(), "software output has no value, skipped"),
        }
    }
    outputs
}

/// Pack exported fields into register words, ordered by address.
pub fn pack_registers(model: &Model, fields: &IndexMap<String, ExportedField>) -> Result<Vec<RegisterWord>> {
    let map = model.register_map().ok_or(ExportError::NoRegisterMap)?;
    let mut words: BTreeMap<u32, (u64, u64)> = BTreeMap::new();
    for (key, info) in map.fields() {
        let Some(field) = fields.get(key) else {
            continue;
        };
        let (value, care) = words.entry(info.address).or_default();
        *value |= (field.raw << info.bit_offset) & info.mask();
        if !field.value.is_do_not_care() {
            *care |= info.mask();
        }
    }
    Ok(words
        .into_iter()
        .map(|(address, (value, care))| RegisterWord {
            address,
            value: (value & 0xFFFF_FFFF) as u32,
            care_mask: (care & 0xFFFF_FFFF) as u32,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use phycalc_model::{FieldInfo, RegisterMap, VariableSpec};

    use super::*;

    fn field(address: u32, bit_offset: u8, bit_width: u8, reset: u64) -> FieldInfo {
        FieldInfo {
            address,
            bit_offset,
            bit_width,
            access: Default::default(),
            reset,
            description: None,
        }
    }

    fn model() -> Model {
        let map = RegisterMap::new("test")
            .with_field("P.CTRL.MODE", field(0x100, 0, 4, 3))
            .with_field("P.CTRL.GAIN", field(0x100, 8, 8, 0x7F))
            .with_field("P.CTRL.EN", field(0x100, 31, 1, 0))
            .with_field("P.DATA.WORD", field(0x104, 0, 16, 0));
        let mut model = Model::new("test", "A0");
        model.register_fields(&Arc::new(map)).unwrap();
        model
            .register(VariableSpec::float("rate_actual").role(VarRole::SoftwareOutput))
            .unwrap();
        model
            .register(VariableSpec::int("unset_output").role(VarRole::SoftwareOutput))
            .unwrap();
        model
    }

    #[test]
    fn origins_and_packing() {
        let mut model = model();
        model.set_computed("P_CTRL_MODE", 5i64).unwrap();
        model.force("P_CTRL_EN", 1i64).unwrap();
        model.set_computed("P_DATA_WORD", 0xBEEFi64).unwrap();
        model.mark_do_not_care("P_CTRL_GAIN", true).unwrap();

        let fields = export_fields(&model).unwrap();
        assert_eq!(fields["P.CTRL.MODE"].origin, FieldOrigin::Computed);
        assert_eq!(fields["P.CTRL.MODE"].value, FieldValue::Value(5));
        assert_eq!(fields["P.CTRL.EN"].origin, FieldOrigin::Forced);
        assert_eq!(fields["P.CTRL.GAIN"].origin, FieldOrigin::Reset);
        assert_eq!(fields["P.CTRL.GAIN"].value, FieldValue::DontCare);

        let words = pack_registers(&model, &fields).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].address, 0x100);
        assert_eq!(words[0].value, 0x8000_7F05);
        assert_eq!(words[0].care_mask, 0x8000_000F);
        assert_eq!(words[1].value, 0xBEEF);
        assert_eq!(words[1].care_mask, 0xFFFF);
    }

    #[test]
    fn overflow_is_reported() {
        let mut model = model();
        model.set_computed("P_CTRL_MODE", 16i64).unwrap();
        let err = export_fields(&model).unwrap_err();
        assert!(matches!(
            err,
            ExportError::FieldOverflow { ref field, value: 16, bit_width: 4 } if field == "P.CTRL.MODE"
        ));

        let mut model = self::model();
        model.set_computed("P_CTRL_GAIN", -1i64).unwrap();
        assert!(matches!(export_fields(&model), Err(ExportError::FieldOverflow { .. })));
    }

    #[test]
    fn outputs_skip_unset() {
        let mut model = model();
        model.set_computed("rate_actual", 99.5).unwrap();
        let outputs = software_outputs(&model);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs["rate_actual"], Value::Float(99.5));
    }

    #[test]
    fn profile_export_has_no_guid() {
        let mut model = model();
        model.set_computed("rate_actual", 12.5).unwrap();
        let export = PhyExport::from_profile(&model, "Base").unwrap();
        assert_eq!(export.phy, "Base");
        assert!(export.guid.is_empty());
        assert!(export.points_to.is_none());
        assert_eq!(export.outputs["rate_actual"], Value::Float(12.5));

        let json = serde_json::to_value(&export).unwrap();
        assert!(json.get("guid").is_none());
    }

    #[test]
    fn model_without_register_map() {
        let model = Model::new("test", "A0");
        assert!(matches!(export_fields(&model), Err(ExportError::NoRegisterMap)));
    }
}

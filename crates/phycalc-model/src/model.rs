//! The model: an insertion-ordered pool of variables plus PHY records.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::diagnostics::Diagnostic;
use crate::enums::{EnumDef, EnumMember};
use crate::error::ModelError;
use crate::phy::{Phy, PhyHandle};
use crate::regmap::{field_key_to_var_name, RegisterMap};
use crate::value::{Value, VarKind};
use crate::variable::{Variable, VariableSpec};

/// Position of a variable in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VariableHandle(usize);

impl VariableHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Configuration state for one chip family and revision.
///
/// A model is owned by exactly one build. Cloning is how the engine gets a
/// working copy it can throw away on failure; the register map is shared
/// between clones through its `Arc`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Model {
    family: String,
    revision: String,
    variables: IndexMap<String, Variable>,
    enums: IndexMap<String, EnumDef>,
    phys: Vec<Phy>,
    #[serde(skip)]
    register_map: Option<Arc<RegisterMap>>,
    diagnostics: Vec<Diagnostic>,
    calc_order: Vec<String>,
    unit_execution: IndexMap<String, bool>,
}

impl Model {
    pub fn new(family: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            revision: revision.into(),
            ..Self::default()
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// `family-revision`, e.g. `reference-B0`.
    pub fn part_name(&self) -> String {
        format!("{}-{}", self.family, self.revision)
    }

    // --- variables ---

    /// Register a new variable.
    ///
    /// Enumerated variables must name an enum that is already defined, and a
    /// declared default must be a legal value for the variable.
    pub fn register(&mut self, spec: VariableSpec) -> Result<VariableHandle, ModelError> {
        if self.variables.contains_key(&spec.name) {
            return Err(ModelError::DuplicateVariable(spec.name));
        }
        if let Some(enum_name) = &spec.enum_name {
            if !self.enums.contains_key(enum_name) {
                return Err(ModelError::UnknownEnum(enum_name.clone()));
            }
        }
        let mut var = Variable::from_spec(spec);
        if let Some(default) = var.default_value().cloned() {
            let checked = self.check_value_for(&var, default)?;
            var.set_default(Some(checked));
        }
        let (index, _) = self.variables.insert_full(var.name().to_string(), var);
        Ok(VariableHandle(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Variable, ModelError> {
        self.variables
            .get(name)
            .ok_or_else(|| ModelError::UnknownVariable(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Variable, ModelError> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| ModelError::UnknownVariable(name.to_string()))
    }

    pub fn handle(&self, name: &str) -> Option<VariableHandle> {
        self.variables.get_index_of(name).map(VariableHandle)
    }

    pub fn variable(&self, handle: VariableHandle) -> Option<&Variable> {
        self.variables.get_index(handle.0).map(|(_, v)| v)
    }

    /// All variables in registration order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Type-check `value` against the named variable and convert it to the
    /// variable's storage form.
    pub fn check_value(&self, name: &str, value: Value) -> Result<Value, ModelError> {
        let var = self.get(name)?;
        self.check_value_for(var, value)
    }

    fn check_value_for(&self, var: &Variable, value: Value) -> Result<Value, ModelError> {
        let found = value.type_name();
        let coerced = value
            .coerce(var.kind(), var.shape())
            .ok_or_else(|| ModelError::TypeMismatch {
                name: var.name().to_string(),
                expected: var.kind().to_string(),
                found: found.to_string(),
            })?;

        if var.kind() == VarKind::Enum {
            if let Some(enum_name) = var.enum_name() {
                let def = self.enum_def(enum_name)?;
                let members: Vec<i64> = match &coerced {
                    Value::Int(v) => vec![*v],
                    Value::IntArray(items) => items.clone(),
                    _ => Vec::new(),
                };
                for member in members {
                    if !def.contains_value(member) {
                        return Err(ModelError::UnknownEnumMember {
                            enum_name: enum_name.to_string(),
                            member: member.to_string(),
                        });
                    }
                }
            }
        }
        Ok(coerced)
    }

    /// Force a value; the engine will never overwrite it.
    pub fn force(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let value = self.check_value(name, value.into())?;
        let var = self.get_mut(name)?;
        if !var.is_forceable() {
            return Err(ModelError::NotForceable(name.to_string()));
        }
        var.set_forced(Some(value));
        Ok(())
    }

    pub fn clear_forced(&mut self, name: &str) -> Result<(), ModelError> {
        self.get_mut(name)?.set_forced(None);
        Ok(())
    }

    /// Store a computed value. Returns `false` if the variable is forced and
    /// the write was skipped.
    pub fn set_computed(&mut self, name: &str, value: impl Into<Value>) -> Result<bool, ModelError> {
        let value = self.check_value(name, value.into())?;
        Ok(self.get_mut(name)?.set_computed(value))
    }

    /// Replace the hardware default (reset or profile default) value.
    pub fn set_default(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let value = self.check_value(name, value.into())?;
        self.get_mut(name)?.set_default(Some(value));
        Ok(())
    }

    pub fn mark_do_not_care(&mut self, name: &str, flag: bool) -> Result<(), ModelError> {
        self.get_mut(name)?.set_do_not_care(flag);
        Ok(())
    }

    /// The value a reader would see: forced, then computed, then default.
    pub fn value(&self, name: &str) -> Result<Option<&Value>, ModelError> {
        Ok(self.get(name)?.effective_value())
    }

    // --- enums ---

    /// Define an enum or append members to an existing one.
    ///
    /// Re-adding a member with the same value is a no-op; giving an existing
    /// member a different value fails and leaves the enum unchanged.
    pub fn define_enum(
        &mut self,
        name: &str,
        description: &str,
        members: impl IntoIterator<Item = EnumMember>,
    ) -> Result<(), ModelError> {
        let members: Vec<EnumMember> = members.into_iter().collect();
        if let Some(existing) = self.enums.get(name) {
            for m in &members {
                if let Some(prev) = existing.member(&m.name) {
                    if prev.value != m.value {
                        return Err(ModelError::EnumMemberRedefined {
                            enum_name: name.to_string(),
                            member: m.name.clone(),
                            existing: prev.value,
                            requested: m.value,
                        });
                    }
                }
            }
        }

        let def = self
            .enums
            .entry(name.to_string())
            .or_insert_with(|| EnumDef::new(name, description));
        for m in members {
            if def.member(&m.name).is_none() {
                def.push(m);
            }
        }
        Ok(())
    }

    pub fn enum_def(&self, name: &str) -> Result<&EnumDef, ModelError> {
        self.enums
            .get(name)
            .ok_or_else(|| ModelError::UnknownEnum(name.to_string()))
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDef> {
        self.enums.values()
    }

    // --- register metadata ---

    /// Attach the part's register table and register one field variable per
    /// entry, with the reset value as default.
    pub fn register_fields(&mut self, map: &Arc<RegisterMap>) -> Result<Vec<VariableHandle>, ModelError> {
        let mut handles = Vec::with_capacity(map.len());
        for (key, info) in map.fields() {
            let mut spec = VariableSpec::field(field_key_to_var_name(key), info.bit_width)
                .default_value(Value::Int(info.reset as i64))
                .field_key(key);
            if let Some(desc) = &info.description {
                spec = spec.describe(desc.clone());
            }
            handles.push(self.register(spec)?);
        }
        self.register_map = Some(Arc::clone(map));
        Ok(handles)
    }

    pub fn register_map(&self) -> Option<&Arc<RegisterMap>> {
        self.register_map.as_ref()
    }

    // --- PHYs ---

    pub fn add_phy(&mut self, phy: Phy) -> Result<PhyHandle, ModelError> {
        if self.phy_by_name(&phy.name).is_some() {
            return Err(ModelError::DuplicatePhyName(phy.name));
        }
        self.phys.push(phy);
        Ok(PhyHandle(self.phys.len() - 1))
    }

    pub fn phy(&self, handle: PhyHandle) -> Result<&Phy, ModelError> {
        self.phys
            .get(handle.0)
            .ok_or(ModelError::StalePhyHandle(handle.0))
    }

    pub fn phy_mut(&mut self, handle: PhyHandle) -> Result<&mut Phy, ModelError> {
        self.phys
            .get_mut(handle.0)
            .ok_or(ModelError::StalePhyHandle(handle.0))
    }

    pub fn phy_by_name(&self, name: &str) -> Option<&Phy> {
        self.phys.iter().find(|p| p.name == name)
    }

    pub fn phy_by_guid(&self, guid: &str) -> Option<&Phy> {
        self.phys.iter().find(|p| p.guid.eq_ignore_ascii_case(guid))
    }

    pub fn phy_handle(&self, name: &str) -> Option<PhyHandle> {
        self.phys.iter().position(|p| p.name == name).map(PhyHandle)
    }

    pub fn phys(&self) -> &[Phy] {
        &self.phys
    }

    /// Remove the most recently added PHY. Only the last PHY can be rolled
    /// back so that every other handle stays valid.
    pub fn rollback_phy(&mut self, handle: PhyHandle) -> Result<Phy, ModelError> {
        if handle.0 + 1 != self.phys.len() {
            return Err(ModelError::StalePhyHandle(handle.0));
        }
        self.phys.pop().ok_or(ModelError::StalePhyHandle(handle.0))
    }

    // --- build results ---

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn set_calc_order(&mut self, order: Vec<String>) {
        self.calc_order = order;
    }

    /// Unit names in the order the last successful run executed them.
    pub fn calc_order(&self) -> &[String] {
        &self.calc_order
    }

    pub fn set_unit_execution(&mut self, record: IndexMap<String, bool>) {
        self.unit_execution = record;
    }

    /// Whether each unit ran to completion, in unit registration order.
    /// Empty until a run has finished.
    pub fn unit_execution(&self) -> &IndexMap<String, bool> {
        &self.unit_execution
    }
}

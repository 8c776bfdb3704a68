//! Model variables and their registration specs.

use serde::{Deserialize, Serialize};

use crate::value::{Shape, Value, VarFormat, VarKind};

/// What a variable is used for. Drives export and profile handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VarRole {
    /// Intermediate value shared between calculation units.
    #[default]
    Internal,
    /// Bound from a profile input before the engine runs.
    ProfileInput,
    /// Exported to firmware by name (not a register).
    SoftwareOutput,
    /// Backed by a `PERIPHERAL.REGISTER.FIELD` entry of the register map.
    RegisterField,
}

/// Registration parameters for a new variable.
#[derive(Debug, Clone)]
pub struct VariableSpec {
    pub(crate) name: String,
    pub(crate) kind: VarKind,
    pub(crate) format: VarFormat,
    pub(crate) shape: Shape,
    pub(crate) role: VarRole,
    pub(crate) forceable: bool,
    pub(crate) enum_name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) default: Option<Value>,
    pub(crate) field_key: Option<String>,
}

impl VariableSpec {
    /// Start a spec for a forceable, internal, decimal scalar.
    pub fn new(name: impl Into<String>, kind: VarKind) -> Self {
        Self {
            name: name.into(),
            kind,
            format: VarFormat::Decimal,
            shape: Shape::Scalar,
            role: VarRole::Internal,
            forceable: true,
            enum_name: None,
            description: None,
            default: None,
            field_key: None,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, VarKind::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, VarKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, VarKind::Bool)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, VarKind::Text)
    }

    /// Enumerated variable bound to a previously defined enum.
    pub fn enumerated(name: impl Into<String>, enum_name: impl Into<String>) -> Self {
        let mut spec = Self::new(name, VarKind::Enum);
        spec.enum_name = Some(enum_name.into());
        spec
    }

    pub fn field(name: impl Into<String>, bit_width: u8) -> Self {
        let mut spec = Self::new(name, VarKind::RegField { bit_width });
        spec.role = VarRole::RegisterField;
        spec.format = VarFormat::Hex;
        spec
    }

    pub fn format(mut self, format: VarFormat) -> Self {
        self.format = format;
        self
    }

    pub fn array(mut self) -> Self {
        self.shape = Shape::Array;
        self
    }

    pub fn role(mut self, role: VarRole) -> Self {
        self.role = role;
        self
    }

    pub fn not_forceable(mut self) -> Self {
        self.forceable = false;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub(crate) fn field_key(mut self, key: impl Into<String>) -> Self {
        self.field_key = Some(key.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A named, typed slot in the model.
///
/// `forced` always wins over `computed`; the engine never overwrites a forced
/// value. `default` is the hardware reset value (or profile default) and is
/// only consulted when neither is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    name: String,
    kind: VarKind,
    format: VarFormat,
    shape: Shape,
    role: VarRole,
    forceable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    enum_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_key: Option<String>,
    computed: Option<Value>,
    forced: Option<Value>,
    default: Option<Value>,
    do_not_care: bool,
    accessed: bool,
}

impl Variable {
    pub(crate) fn from_spec(spec: VariableSpec) -> Self {
        Self {
            name: spec.name,
            kind: spec.kind,
            format: spec.format,
            shape: spec.shape,
            role: spec.role,
            forceable: spec.forceable,
            enum_name: spec.enum_name,
            description: spec.description,
            field_key: spec.field_key,
            computed: None,
            forced: None,
            default: spec.default,
            do_not_care: false,
            accessed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VarKind {
        self.kind
    }

    pub fn format(&self) -> VarFormat {
        self.format
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn role(&self) -> VarRole {
        self.role
    }

    pub fn is_forceable(&self) -> bool {
        self.forceable
    }

    pub fn enum_name(&self) -> Option<&str> {
        self.enum_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// `PERIPHERAL.REGISTER.FIELD` key for register-field variables.
    pub fn field_key(&self) -> Option<&str> {
        self.field_key.as_deref()
    }

    pub fn bit_width(&self) -> Option<u8> {
        self.kind.bit_width()
    }

    pub fn computed_value(&self) -> Option<&Value> {
        self.computed.as_ref()
    }

    pub fn forced_value(&self) -> Option<&Value> {
        self.forced.as_ref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_forced(&self) -> bool {
        self.forced.is_some()
    }

    pub fn is_do_not_care(&self) -> bool {
        self.do_not_care
    }

    pub fn is_accessed(&self) -> bool {
        self.accessed
    }

    /// Forced value if present, otherwise the computed value.
    pub fn value(&self) -> Option<&Value> {
        self.forced.as_ref().or(self.computed.as_ref())
    }

    /// [`Variable::value`] falling back to the default.
    pub fn effective_value(&self) -> Option<&Value> {
        self.value().or(self.default.as_ref())
    }

    pub(crate) fn set_computed(&mut self, value: Value) -> bool {
        self.accessed = true;
        if self.forced.is_some() {
            return false;
        }
        self.computed = Some(value);
        true
    }

    pub(crate) fn set_forced(&mut self, value: Option<Value>) {
        self.forced = value;
    }

    pub(crate) fn set_do_not_care(&mut self, flag: bool) {
        self.accessed = true;
        self.do_not_care = flag;
    }

    pub(crate) fn set_default(&mut self, value: Option<Value>) {
        self.default = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_wins_over_computed() {
        let mut v = Variable::from_spec(VariableSpec::int("bitrate"));
        assert!(v.set_computed(Value::Int(100)));
        v.set_forced(Some(Value::Int(250)));
        assert!(!v.set_computed(Value::Int(500)));
        assert_eq!(v.value(), Some(&Value::Int(250)));
        assert_eq!(v.computed_value(), Some(&Value::Int(100)));
    }

    #[test]
    fn effective_value_falls_back_to_default() {
        let v = Variable::from_spec(VariableSpec::field("MODEM_CTRL0_MODFORMAT", 3).default_value(2i64));
        assert!(v.value().is_none());
        assert_eq!(v.effective_value(), Some(&Value::Int(2)));
        assert!(!v.is_accessed());
    }

    #[test]
    fn field_spec_defaults() {
        let v = Variable::from_spec(VariableSpec::field("FRC_CTRL_BITORDER", 1));
        assert_eq!(v.role(), VarRole::RegisterField);
        assert_eq!(v.bit_width(), Some(1));
        assert_eq!(v.format(), VarFormat::Hex);
        assert!(v.is_forceable());
    }

    #[test]
    fn write_marks_accessed_even_when_forced() {
        let mut v = Variable::from_spec(VariableSpec::int("x"));
        v.set_forced(Some(Value::Int(1)));
        v.set_computed(Value::Int(2));
        assert!(v.is_accessed());
    }
}

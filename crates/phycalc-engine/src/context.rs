//! The view of the model a calculation unit runs against.

use indexmap::IndexSet;
use phycalc_model::{Diagnostic, Model, Value};
use tracing::{debug, warn};

use crate::error::CalcError;
use crate::write::{resolve_write, WritePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Discovery: unset reads yield placeholders, nothing is reported.
    Probe,
    Execute,
}

/// Variables a unit touched during one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Access {
    pub reads: IndexSet<String>,
    pub writes: IndexSet<String>,
    /// Reads that found no value at all. Not merged between runs.
    pub unset_reads: IndexSet<String>,
}

impl Access {
    /// A read after the unit's own write is internal and not a dependency.
    pub(crate) fn record_read(&mut self, name: &str) {
        if !self.writes.contains(name) {
            self.reads.insert(name.to_string());
        }
    }

    pub(crate) fn record_write(&mut self, name: &str) {
        self.writes.insert(name.to_string());
    }

    /// Merge reads and writes of `other`; returns true if anything was new.
    pub(crate) fn merge(&mut self, other: &Access) -> bool {
        let before = (self.reads.len(), self.writes.len());
        self.reads.extend(other.reads.iter().cloned());
        self.writes.extend(other.writes.iter().cloned());
        before != (self.reads.len(), self.writes.len())
    }
}

/// Handle given to a calculation unit.
///
/// Every read and write goes through here so the engine can record the
/// unit's access set. Forced variables are never overwritten.
pub struct CalcContext<'a> {
    model: &'a mut Model,
    unit: &'a str,
    mode: Mode,
    access: Access,
}

impl<'a> CalcContext<'a> {
    pub(crate) fn new(model: &'a mut Model, unit: &'a str, mode: Mode) -> Self {
        Self {
            model,
            unit,
            mode,
            access: Access::default(),
        }
    }

    pub(crate) fn into_access(self) -> Access {
        self.access
    }

    pub fn unit_name(&self) -> &str {
        self.unit
    }

    /// True while the engine is discovering dependencies. Values read in a
    /// probe may be placeholders.
    pub fn is_probe(&self) -> bool {
        self.mode == Mode::Probe
    }

    /// Read a variable, or `None` if it has no value yet.
    ///
    /// Probes never see placeholders through this call.
    pub fn try_get(&mut self, name: &str) -> Result<Option<Value>, CalcError> {
        let var = self.model.get(name)?;
        let value = var.effective_value().cloned();
        self.access.record_read(name);
        if value.is_none() {
            self.access.unset_reads.insert(name.to_string());
        }
        Ok(value)
    }

    /// Read a variable that must have a value.
    pub fn get(&mut self, name: &str) -> Result<Value, CalcError> {
        if let Some(value) = self.try_get(name)? {
            return Ok(value);
        }
        match self.mode {
            Mode::Probe => {
                let var = self.model.get(name)?;
                Ok(var.kind().placeholder(var.shape()))
            }
            Mode::Execute => Err(CalcError::Unset(name.to_string())),
        }
    }

    pub fn get_int(&mut self, name: &str) -> Result<i64, CalcError> {
        let value = self.get(name)?;
        value.as_int().ok_or_else(|| mismatch(name, "int", &value))
    }

    pub fn get_float(&mut self, name: &str) -> Result<f64, CalcError> {
        let value = self.get(name)?;
        value.as_float().ok_or_else(|| mismatch(name, "float", &value))
    }

    pub fn get_bool(&mut self, name: &str) -> Result<bool, CalcError> {
        let value = self.get(name)?;
        value.as_bool().ok_or_else(|| mismatch(name, "bool", &value))
    }

    /// Integer value of an enumerated variable.
    pub fn get_enum(&mut self, name: &str) -> Result<i64, CalcError> {
        self.get_int(name)
    }

    pub fn get_text(&mut self, name: &str) -> Result<String, CalcError> {
        let value = self.get(name)?;
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| mismatch(name, "text", &value))
    }

    pub fn get_int_array(&mut self, name: &str) -> Result<Vec<i64>, CalcError> {
        let value = self.get(name)?;
        value
            .as_int_array()
            .map(<[i64]>::to_vec)
            .ok_or_else(|| mismatch(name, "int[]", &value))
    }

    pub fn get_float_array(&mut self, name: &str) -> Result<Vec<f64>, CalcError> {
        let value = self.get(name)?;
        match value {
            Value::FloatArray(items) => Ok(items),
            Value::IntArray(items) => Ok(items.into_iter().map(|i| i as f64).collect()),
            other => Err(mismatch(name, "float[]", &other)),
        }
    }

    /// Value of `member` in enum `enum_name`. Not a variable read.
    pub fn enum_value(&self, enum_name: &str, member: &str) -> Result<i64, CalcError> {
        let def = self.model.enum_def(enum_name)?;
        def.member(member).map(|m| m.value).ok_or_else(|| {
            CalcError::Model(phycalc_model::ModelError::UnknownEnumMember {
                enum_name: enum_name.to_string(),
                member: member.to_string(),
            })
        })
    }

    /// Store a computed value. A forced variable keeps its forced value.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), CalcError> {
        self.access.record_write(name);
        if !self.model.set_computed(name, value)? {
            debug!(unit = self.unit, variable = name, "skipped write to forced variable");
        }
        Ok(())
    }

    /// Write a register field under `policy`.
    ///
    /// Fails with `UnknownVariable` for an unregistered name and
    /// `NotRegisterField` for a variable without a bit width. A forced
    /// field is left exactly as it is.
    pub fn write_register(
        &mut self,
        name: &str,
        value: Option<i64>,
        policy: &WritePolicy,
    ) -> Result<(), CalcError> {
        let var = self.model.get(name)?;
        let bit_width = var
            .bit_width()
            .ok_or_else(|| CalcError::NotRegisterField(name.to_string()))?;
        let forced = var.is_forced();
        let default = var.default_value().and_then(Value::as_int);
        self.access.record_write(name);
        if forced {
            debug!(unit = self.unit, variable = name, "skipped write to forced field");
            return Ok(());
        }

        let outcome = resolve_write(name, bit_width, value, default, policy)?;

        if let Some(v) = outcome.value {
            self.model.set_computed(name, v)?;
        }
        if outcome.do_not_care {
            self.model.mark_do_not_care(name, true)?;
        } else if outcome.value.is_some() && self.model.get(name)?.is_do_not_care() {
            self.model.mark_do_not_care(name, false)?;
        }
        for diagnostic in outcome.corrections {
            self.report(diagnostic);
        }
        Ok(())
    }

    /// Plain field write: no limits, negatives rejected.
    pub fn write_field(&mut self, name: &str, value: i64) -> Result<(), CalcError> {
        self.write_register(name, Some(value), &WritePolicy::default())
    }

    pub fn write_field_with(
        &mut self,
        name: &str,
        value: i64,
        policy: &WritePolicy,
    ) -> Result<(), CalcError> {
        self.write_register(name, Some(value), policy)
    }

    /// Record a soft correction against `variable`.
    pub fn warn(&mut self, variable: Option<&str>, message: impl Into<String>) {
        let mut diagnostic = Diagnostic::warning(message);
        if let Some(var) = variable {
            diagnostic = diagnostic.on_variable(var);
        }
        self.report(diagnostic);
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if self.mode == Mode::Probe {
            return;
        }
        let diagnostic = diagnostic.in_unit(self.unit);
        match diagnostic.severity {
            phycalc_model::Severity::Warning => warn!(
                unit = self.unit,
                variable = diagnostic.variable.as_deref().unwrap_or(""),
                "{}",
                diagnostic.message
            ),
            phycalc_model::Severity::Info => debug!(
                unit = self.unit,
                variable = diagnostic.variable.as_deref().unwrap_or(""),
                "{}",
                diagnostic.message
            ),
        }
        self.model.push_diagnostic(diagnostic);
    }
}

fn mismatch(name: &str, expected: &str, found: &Value) -> CalcError {
    CalcError::Model(phycalc_model::ModelError::TypeMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        found: found.type_name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use phycalc_model::{EnumMember, VariableSpec};

    fn model() -> Model {
        let mut m = Model::new("test", "A0");
        m.register(VariableSpec::int("bitrate")).unwrap();
        m.register(VariableSpec::float("deviation")).unwrap();
        m.register(VariableSpec::field("MODEM_CTRL0_GAIN", 8).default_value(0x10i64))
            .unwrap();
        m.register(VariableSpec::int("plain")).unwrap();
        m
    }

    #[test]
    fn probe_reads_yield_placeholders() {
        let mut m = model();
        let mut ctx = CalcContext::new(&mut m, "calc_x", Mode::Probe);
        assert_eq!(ctx.get_int("bitrate").unwrap(), 1);
        assert_eq!(ctx.get_float("deviation").unwrap(), 1.0);
        assert_eq!(ctx.get_int("MODEM_CTRL0_GAIN").unwrap(), 0x10);
        let access = ctx.into_access();
        assert_eq!(access.reads.len(), 3);
        assert_eq!(access.unset_reads.len(), 2);
    }

    #[test]
    fn execute_read_of_unset_fails() {
        let mut m = model();
        let mut ctx = CalcContext::new(&mut m, "calc_x", Mode::Execute);
        let err = ctx.get_int("bitrate").unwrap_err();
        assert!(matches!(err, CalcError::Unset(ref n) if n == "bitrate"));
    }

    #[test]
    fn read_after_own_write_is_not_a_dependency() {
        let mut m = model();
        let mut ctx = CalcContext::new(&mut m, "calc_x", Mode::Execute);
        ctx.set("bitrate", 100_000i64).unwrap();
        assert_eq!(ctx.get_int("bitrate").unwrap(), 100_000);
        let access = ctx.into_access();
        assert!(access.reads.is_empty());
        assert!(access.writes.contains("bitrate"));
    }

    #[test]
    fn forced_field_untouched_by_write() {
        let mut m = model();
        m.force("MODEM_CTRL0_GAIN", 3i64).unwrap();
        let mut ctx = CalcContext::new(&mut m, "calc_x", Mode::Execute);
        ctx.write_register("MODEM_CTRL0_GAIN", Some(300), &WritePolicy::new().limit_upper(255))
            .unwrap();
        assert!(ctx.into_access().writes.contains("MODEM_CTRL0_GAIN"));
        assert_eq!(m.value("MODEM_CTRL0_GAIN").unwrap(), Some(&Value::Int(3)));
        assert!(m.diagnostics().is_empty());
    }

    #[test]
    fn limited_write_records_diagnostic() {
        let mut m = model();
        let mut ctx = CalcContext::new(&mut m, "calc_agc", Mode::Execute);
        ctx.write_register("MODEM_CTRL0_GAIN", Some(300), &WritePolicy::new().limit_upper(255))
            .unwrap();
        assert_eq!(m.value("MODEM_CTRL0_GAIN").unwrap(), Some(&Value::Int(255)));
        assert_eq!(m.diagnostics().len(), 1);
        assert_eq!(m.diagnostics()[0].unit.as_deref(), Some("calc_agc"));
    }

    #[test]
    fn probe_does_not_report() {
        let mut m = model();
        let mut ctx = CalcContext::new(&mut m, "calc_agc", Mode::Probe);
        ctx.write_register("MODEM_CTRL0_GAIN", Some(300), &WritePolicy::new().limit_upper(255))
            .unwrap();
        assert!(m.diagnostics().is_empty());
    }

    #[test]
    fn non_field_write_rejected() {
        let mut m = model();
        let mut ctx = CalcContext::new(&mut m, "calc_x", Mode::Execute);
        let err = ctx.write_field("plain", 1).unwrap_err();
        assert!(matches!(err, CalcError::NotRegisterField(_)));
        let err = ctx.write_field("MISSING_FIELD", 1).unwrap_err();
        assert!(matches!(
            err,
            CalcError::Model(phycalc_model::ModelError::UnknownVariable(_))
        ));
    }

    #[test]
    fn value_write_clears_earlier_do_not_care() {
        let mut m = model();
        let mut ctx = CalcContext::new(&mut m, "calc_x", Mode::Execute);
        ctx.write_register("MODEM_CTRL0_GAIN", None, &WritePolicy::new().do_not_care())
            .unwrap();
        ctx.write_field("MODEM_CTRL0_GAIN", 5).unwrap();
        let var = m.get("MODEM_CTRL0_GAIN").unwrap();
        assert!(!var.is_do_not_care());
        assert_eq!(var.value(), Some(&Value::Int(5)));
    }

    #[test]
    fn enum_member_lookup() {
        let mut m = model();
        m.define_enum("ModulationEnum", "", vec![EnumMember::new("FSK2", 0, "")])
            .unwrap();
        let ctx = CalcContext::new(&mut m, "calc_x", Mode::Execute);
        assert_eq!(ctx.enum_value("ModulationEnum", "FSK2").unwrap(), 0);
        assert!(ctx.enum_value("ModulationEnum", "ASK").is_err());
    }
}

//! Calculation units.

use std::fmt;
use std::sync::Arc;

use crate::context::CalcContext;
use crate::error::CalcError;

/// Signature of a calculation routine.
pub type CalcFn = dyn Fn(&mut CalcContext<'_>) -> Result<(), CalcError> + Send + Sync;

/// A named routine that reads and writes model variables.
///
/// Units declare no dependencies; the engine discovers them by probing.
/// Read/write hints are merged into whatever the probe observes, for
/// accesses that only happen on branches a probe run will not take.
#[derive(Clone)]
pub struct CalcUnit {
    name: String,
    func: Arc<CalcFn>,
    read_hints: Vec<String>,
    write_hints: Vec<String>,
}

impl CalcUnit {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut CalcContext<'_>) -> Result<(), CalcError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            read_hints: Vec::new(),
            write_hints: Vec::new(),
        }
    }

    pub fn reads<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.read_hints.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn writes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write_hints.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read_hints(&self) -> &[String] {
        &self.read_hints
    }

    pub fn write_hints(&self) -> &[String] {
        &self.write_hints
    }

    pub(crate) fn call(&self, ctx: &mut CalcContext<'_>) -> Result<(), CalcError> {
        (self.func)(ctx)
    }
}

impl fmt::Debug for CalcUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalcUnit")
            .field("name", &self.name)
            .field("read_hints", &self.read_hints)
            .field("write_hints", &self.write_hints)
            .finish_non_exhaustive()
    }
}

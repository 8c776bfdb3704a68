//! The calculator seam between part families and the engine.

use std::fmt;

use phycalc_engine::CalcUnit;
use phycalc_model::{Model, ModelError};

/// A group of related calculation units and the variables they own.
///
/// Object-safe so a part can hold its calculators as `Box<dyn Calculator>`.
/// Calculators are registered in order and a later calculator may write a
/// variable an earlier one also writes; the later write wins.
pub trait Calculator: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Register the enums and variables this calculator owns.
    fn build_variables(&self, model: &mut Model) -> Result<(), ModelError>;

    /// Units contributed to the engine, in registration order.
    fn units(&self) -> Vec<CalcUnit>;
}

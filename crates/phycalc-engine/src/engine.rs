//! Runs calculation units against a model in dependency order.

use std::collections::HashSet;

use indexmap::IndexMap;
use phycalc_model::Model;
use tracing::{debug, info};

use crate::context::{Access, CalcContext, Mode};
use crate::error::{CalcError, EngineError};
use crate::schedule::{dependency_edges, topological_order, violates, Schedule};
use crate::unit::CalcUnit;

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Unit names in execution order.
    pub order: Vec<String>,
    /// Executions needed before the order settled.
    pub passes: usize,
    pub diagnostics: usize,
    /// Every unit in registration order, true once it ran to completion.
    pub executed: IndexMap<String, bool>,
}

/// An ordered set of calculation units. Registration order matters: it
/// breaks ties between independent units and decides which co-writer of a
/// variable runs last.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    units: Vec<CalcUnit>,
}

struct Execution {
    model: Model,
    observed: Vec<Access>,
    /// Units of the order that returned `Ok`.
    completed: usize,
    failure: Option<(usize, CalcError)>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_units(units: impl IntoIterator<Item = CalcUnit>) -> Result<Self, EngineError> {
        let mut engine = Self::new();
        for unit in units {
            engine.add_unit(unit)?;
        }
        Ok(engine)
    }

    pub fn add_unit(&mut self, unit: CalcUnit) -> Result<(), EngineError> {
        if self.units.iter().any(|u| u.name() == unit.name()) {
            return Err(EngineError::DuplicateUnit(unit.name().to_string()));
        }
        self.units.push(unit);
        Ok(())
    }

    pub fn units(&self) -> &[CalcUnit] {
        &self.units
    }

    /// The order a run would start with, from probing alone.
    pub fn plan(&self, model: &Model) -> Result<Schedule, EngineError> {
        let forced = forced_names(model);
        let access = self.discover(model);
        let edges = dependency_edges(&access, &forced);
        let order = topological_order(&self.units, &edges)?;
        Ok(Schedule {
            order: self.names(&order),
            edges: edges
                .iter()
                .map(|&(a, b)| (self.units[a].name().to_string(), self.units[b].name().to_string()))
                .collect(),
        })
    }

    /// Run every unit exactly once, in dependency order.
    ///
    /// Dependencies start from a probe of each unit and are refined from
    /// what each real execution touches: if a unit turns out to read a
    /// variable produced later in the order, the schedule is rebuilt and
    /// the run repeated from the original model. Every retry adds at least
    /// one access, so this terminates.
    ///
    /// On success the model is replaced by the finished copy; on error it
    /// is left exactly as it was.
    pub fn run(&self, model: &mut Model) -> Result<RunReport, EngineError> {
        let forced = forced_names(model);
        let mut access = self.discover(model);
        let mut passes = 0;

        loop {
            passes += 1;
            let edges = dependency_edges(&access, &forced);
            let order = topological_order(&self.units, &edges)?;
            debug!(pass = passes, order = ?self.names(&order), "executing schedule");

            let execution = self.execute(model, &order);

            let mut changed = false;
            for (known, seen) in access.iter_mut().zip(&execution.observed) {
                changed |= known.merge(seen);
            }
            if let Some((failed, CalcError::Unset(_))) = &execution.failure {
                // A producer's probe may have failed before it wrote anything;
                // probe what has not run yet, in order, on the partial result.
                let mut scratch = execution.model.clone();
                let pending = order.iter().skip_while(|&&i| i != *failed).skip(1);
                for &idx in pending {
                    let seen = self.probe(&self.units[idx], &mut scratch);
                    changed |= access[idx].merge(&seen);
                }
            }
            let stale = changed && violates(&order, &dependency_edges(&access, &forced));
            if stale {
                debug!(pass = passes, "observed accesses contradict the order, rescheduling");
                continue;
            }

            let executed = self.execution_record(&order[..execution.completed]);
            match execution.failure {
                None => {
                    let names = self.names(&order);
                    let mut finished = execution.model;
                    finished.set_calc_order(names.clone());
                    finished.set_unit_execution(executed.clone());
                    let diagnostics = finished.diagnostics().len();
                    *model = finished;
                    info!(units = self.units.len(), passes, diagnostics, "calculation complete");
                    return Ok(RunReport {
                        order: names,
                        passes,
                        diagnostics,
                        executed,
                    });
                }
                Some((idx, CalcError::Unset(variable))) => {
                    return Err(EngineError::UnsatisfiedDependency {
                        variable,
                        unit: self.units[idx].name().to_string(),
                    });
                }
                Some((idx, source)) => {
                    return Err(EngineError::Unit {
                        unit: self.units[idx].name().to_string(),
                        source,
                        executed,
                    });
                }
            }
        }
    }

    fn discover(&self, model: &Model) -> Vec<Access> {
        self.units
            .iter()
            .map(|unit| self.probe(unit, &mut model.clone()))
            .collect()
    }

    /// Run `unit` in probe mode against `scratch` and record what it
    /// touches, plus its hints.
    fn probe(&self, unit: &CalcUnit, scratch: &mut Model) -> Access {
        let mut ctx = CalcContext::new(scratch, unit.name(), Mode::Probe);
        if let Err(err) = unit.call(&mut ctx) {
            debug!(unit = unit.name(), error = %err, "probe error ignored");
        }
        let mut access = ctx.into_access();
        access.reads.extend(unit.read_hints().iter().cloned());
        access.writes.extend(unit.write_hints().iter().cloned());
        access
    }

    fn execute(&self, model: &Model, order: &[usize]) -> Execution {
        let mut work = model.clone();
        let mut observed = vec![Access::default(); self.units.len()];
        for (completed, &idx) in order.iter().enumerate() {
            let unit = &self.units[idx];
            let mut ctx = CalcContext::new(&mut work, unit.name(), Mode::Execute);
            let result = unit.call(&mut ctx);
            observed[idx] = ctx.into_access();
            if let Err(err) = result {
                return Execution {
                    model: work,
                    observed,
                    completed,
                    failure: Some((idx, err)),
                };
            }
        }
        Execution {
            model: work,
            observed,
            completed: order.len(),
            failure: None,
        }
    }

    fn execution_record(&self, completed: &[usize]) -> IndexMap<String, bool> {
        let done: HashSet<usize> = completed.iter().copied().collect();
        self.units
            .iter()
            .enumerate()
            .map(|(idx, unit)| (unit.name().to_string(), done.contains(&idx)))
            .collect()
    }

    fn names(&self, order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| self.units[i].name().to_string()).collect()
    }
}

fn forced_names(model: &Model) -> HashSet<String> {
    model
        .variables()
        .filter(|v| v.is_forced())
        .map(|v| v.name().to_string())
        .collect()
}

/// Run `units` once against `model`.
pub fn run(units: &[CalcUnit], model: &mut Model) -> Result<RunReport, EngineError> {
    Engine::with_units(units.iter().cloned())?.run(model)
}

/// Run `hooks` once each, in the order given, against a finished model.
///
/// No dependencies are inferred: a hook sees whatever the calculation left
/// behind. As with [`Engine::run`], the model is only replaced when every
/// hook succeeds.
pub fn run_hooks(hooks: &[CalcUnit], model: &mut Model) -> Result<(), EngineError> {
    let mut work = model.clone();
    for (completed, hook) in hooks.iter().enumerate() {
        let mut ctx = CalcContext::new(&mut work, hook.name(), Mode::Execute);
        match hook.call(&mut ctx) {
            Ok(()) => debug!(hook = hook.name(), "hook complete"),
            Err(CalcError::Unset(variable)) => {
                return Err(EngineError::UnsatisfiedDependency {
                    variable,
                    unit: hook.name().to_string(),
                })
            }
            Err(source) => {
                return Err(EngineError::Unit {
                    unit: hook.name().to_string(),
                    source,
                    executed: hooks
                        .iter()
                        .enumerate()
                        .map(|(idx, h)| (h.name().to_string(), idx < completed))
                        .collect(),
                })
            }
        }
    }
    *model = work;
    Ok(())
}

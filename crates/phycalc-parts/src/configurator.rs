//! End-to-end PHY calculation for one part.

use indexmap::IndexMap;
use phycalc_compose::{load_phy, load_profile, BuildContext, Profile};
use phycalc_engine::{run_hooks, CalcUnit, Engine, RunReport};
use phycalc_model::{Model, Phy, PhyHandle, Value};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{PartsError, Result};
use crate::part::{Part, PhyRoutine};
use crate::target::{GroupKind, Target};

/// A finished PHY: its record, the calculated model and the run summary.
#[derive(Debug)]
pub struct CalculatedPhy {
    pub phy: Phy,
    pub model: Model,
    pub report: RunReport,
}

/// A profile calculated with no PHY, from its defaults and caller inputs.
#[derive(Debug)]
pub struct CalculatedProfile {
    pub profile: String,
    pub model: Model,
    pub report: RunReport,
}

/// Outcome of one PHY in a sweep.
#[derive(Debug)]
pub struct SweepResult {
    pub phy: String,
    pub outcome: Result<CalculatedPhy>,
}

#[derive(Debug)]
pub struct Configurator {
    part: Part,
    engine: Engine,
    default_inputs: IndexMap<String, Value>,
    target: Option<Target>,
}

impl Configurator {
    pub fn new(part: Part) -> Result<Self> {
        let engine = part.engine()?;
        Ok(Self {
            part,
            engine,
            default_inputs: IndexMap::new(),
            target: None,
        })
    }

    pub fn for_part(family: &str, revision: &str) -> Result<Self> {
        Self::new(crate::load_part(family, revision)?)
    }

    /// Optional inputs applied to every PHY whose profile has them, below
    /// the inputs passed to [`Configurator::calculate_phy`].
    pub fn with_default_inputs(mut self, inputs: IndexMap<String, Value>) -> Self {
        self.default_inputs = inputs;
        self
    }

    /// Calculate for `target`: PHYs that exclude it are refused and its
    /// hook runs last on every model.
    pub fn with_target(mut self, name_or_tag: &str) -> Result<Self> {
        self.target = Some(self.part.target(name_or_tag)?.clone());
        Ok(self)
    }

    pub fn part(&self) -> &Part {
        &self.part
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn phy_names(&self) -> Vec<&str> {
        self.part.phys().iter().map(|r| r.name).collect()
    }

    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for routine in self.part.phys() {
            if !groups.contains(&routine.group) {
                groups.push(routine.group);
            }
        }
        groups
    }

    pub fn phys_in_group(&self, group: &str) -> Vec<&str> {
        self.part
            .phys()
            .iter()
            .filter(|r| r.group == group)
            .map(|r| r.name)
            .collect()
    }

    /// Groups that have `kind`, in library order.
    pub fn groups_of_kind(&self, kind: GroupKind) -> Vec<&str> {
        self.groups()
            .into_iter()
            .filter(|g| self.part.group_kinds(g).contains(&kind))
            .collect()
    }

    pub fn phys_of_kind(&self, kind: GroupKind) -> Vec<&str> {
        self.part
            .phys()
            .iter()
            .filter(|r| self.part.group_kinds(r.group).contains(&kind))
            .map(|r| r.name)
            .collect()
    }

    /// Whether the PHY may be calculated for the configured target. Every
    /// PHY is supported when no target is set.
    pub fn supports_phy(&self, name_or_guid: &str) -> Result<bool> {
        match &self.target {
            Some(target) => Ok(target.supports(&self.describe(name_or_guid)?.tags)),
            None => Ok(true),
        }
    }

    fn routine(&self, name_or_guid: &str) -> Result<&PhyRoutine> {
        self.part
            .find_phy(name_or_guid)
            .ok_or_else(|| PartsError::UnknownPhy(name_or_guid.to_string()))
    }

    fn define(&self, routine: &PhyRoutine) -> Result<(Model, PhyHandle)> {
        let mut model = self.part.new_model()?;
        let mut ctx = BuildContext::new();
        let handle = (routine.define)(&mut ctx, &mut model)?;
        Ok((model, handle))
    }

    /// The PHY record a routine defines, without calculating it.
    pub fn describe(&self, name_or_guid: &str) -> Result<Phy> {
        let routine = self.routine(name_or_guid)?;
        let (model, handle) = self.define(routine)?;
        Ok(model.phy(handle)?.clone())
    }

    /// Define, load and calculate one PHY in a fresh model.
    pub fn calculate_phy(
        &self,
        name_or_guid: &str,
        optional_inputs: &IndexMap<String, Value>,
    ) -> Result<CalculatedPhy> {
        let routine = self.routine(name_or_guid)?;
        let (mut model, handle) = self.define(routine)?;
        let record = model.phy(handle)?;
        if let Some(target) = &self.target {
            if !target.supports(&record.tags) {
                return Err(PartsError::PhyNotSupportedOnTarget {
                    phy: record.name.clone(),
                    target: target.name.clone(),
                });
            }
        }
        let profile = self.part.profile(&record.profile)?;

        let inputs = self.merge_inputs(profile, routine.name, optional_inputs);
        load_phy(&mut model, profile, handle, &inputs)?;
        let report = self.engine.run(&mut model)?;
        self.run_hooks(profile, &mut model)?;
        let phy = model.phy(handle)?.clone();
        info!(
            phy = %phy.name,
            passes = report.passes,
            diagnostics = report.diagnostics,
            "PHY calculated"
        );
        Ok(CalculatedPhy { phy, model, report })
    }

    /// Calculate a profile on its own: its defaults plus `optional_inputs`,
    /// no PHY. Required inputs must come from `optional_inputs`.
    pub fn calculate_profile(
        &self,
        profile_name: &str,
        optional_inputs: &IndexMap<String, Value>,
    ) -> Result<CalculatedProfile> {
        let profile = self.part.profile(profile_name)?;
        let mut model = self.part.new_model()?;
        let inputs = self.merge_inputs(profile, &profile.name, optional_inputs);
        load_profile(&mut model, profile, &inputs)?;
        let report = self.engine.run(&mut model)?;
        self.run_hooks(profile, &mut model)?;
        info!(
            profile = %profile.name,
            passes = report.passes,
            diagnostics = report.diagnostics,
            "profile calculated"
        );
        Ok(CalculatedProfile {
            profile: profile.name.clone(),
            model,
            report,
        })
    }

    /// Configurator defaults the profile accepts, under `optional_inputs`.
    fn merge_inputs(
        &self,
        profile: &Profile,
        owner: &str,
        optional_inputs: &IndexMap<String, Value>,
    ) -> IndexMap<String, Value> {
        let mut inputs = IndexMap::new();
        for (name, value) in &self.default_inputs {
            if profile.input(name).is_some() {
                inputs.insert(name.clone(), value.clone());
            } else {
                debug!(owner, input = %name, "default input not in profile, skipped");
            }
        }
        inputs.extend(optional_inputs.iter().map(|(k, v)| (k.clone(), v.clone())));
        inputs
    }

    /// Profile hook, then target hook, after the calculation units.
    fn run_hooks(&self, profile: &Profile, model: &mut Model) -> Result<()> {
        let hooks: Vec<CalcUnit> = profile
            .calculate_hook()
            .into_iter()
            .chain(self.target.as_ref().and_then(Target::calculate_hook))
            .cloned()
            .collect();
        if !hooks.is_empty() {
            run_hooks(&hooks, model)?;
        }
        Ok(())
    }

    /// Calculate several PHYs in parallel, each in its own model. Results
    /// come back in the order of `names`; one PHY failing does not stop
    /// the others.
    pub fn sweep(&self, names: &[&str]) -> Vec<SweepResult> {
        let no_inputs = IndexMap::new();
        names
            .par_iter()
            .map(|name| {
                let outcome = self.calculate_phy(name, &no_inputs);
                if let Err(err) = &outcome {
                    warn!(phy = %name, error = %err, "PHY failed");
                }
                SweepResult {
                    phy: name.to_string(),
                    outcome,
                }
            })
            .collect()
    }

    /// PHYs a full sweep calculates: those the target supports, outside
    /// non-functional groups.
    pub fn sweepable_phys(&self) -> Vec<&str> {
        self.part
            .phys()
            .iter()
            .filter(|r| !self.part.group_kinds(r.group).contains(&GroupKind::NonFunctional))
            .map(|r| r.name)
            .filter(|name| match self.supports_phy(name) {
                Ok(supported) => supported,
                // kept so the sweep reports the failure
                Err(_) => true,
            })
            .collect()
    }

    pub fn sweep_all(&self) -> Vec<SweepResult> {
        self.sweep(&self.sweepable_phys())
    }
}

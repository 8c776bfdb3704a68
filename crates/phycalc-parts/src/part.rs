//! A chip part: one family revision with its register map, calculators,
//! profiles and PHY library.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use phycalc_compose::{BuildContext, ComposeError, Profile};
use phycalc_engine::Engine;
use phycalc_model::{phy_guid, Model, PhyHandle, RegisterMap};
use tracing::debug;

use crate::calculator::Calculator;
use crate::error::{PartsError, Result};
use crate::target::{GroupKind, Target};

/// Signature of a PHY definition routine.
pub type PhyFn = fn(&mut BuildContext, &mut Model) -> std::result::Result<PhyHandle, ComposeError>;

/// A named entry of a part's PHY library.
///
/// `name` is the name of the PHY the routine produces when run on its own,
/// which is also what its GUID is derived from.
#[derive(Clone, Copy)]
pub struct PhyRoutine {
    pub name: &'static str,
    pub group: &'static str,
    pub define: PhyFn,
}

impl PhyRoutine {
    pub const fn new(name: &'static str, group: &'static str, define: PhyFn) -> Self {
        Self { name, group, define }
    }

    pub fn guid(&self) -> String {
        phy_guid(self.name)
    }
}

impl fmt::Debug for PhyRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhyRoutine")
            .field("name", &self.name)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Part {
    family: String,
    revision: String,
    register_map: Arc<RegisterMap>,
    calculators: Vec<Box<dyn Calculator>>,
    profiles: IndexMap<String, Profile>,
    phys: Vec<PhyRoutine>,
    targets: IndexMap<String, Target>,
    group_kinds: IndexMap<String, Vec<GroupKind>>,
}

impl Part {
    pub fn new(family: impl Into<String>, revision: impl Into<String>, register_map: Arc<RegisterMap>) -> Self {
        Self {
            family: family.into(),
            revision: revision.into(),
            register_map,
            calculators: Vec::new(),
            profiles: IndexMap::new(),
            phys: Vec::new(),
            targets: IndexMap::new(),
            group_kinds: IndexMap::new(),
        }
    }

    /// Append a calculator; its units run after, and win over, those of
    /// calculators registered earlier.
    pub fn register_calculator(&mut self, calculator: Box<dyn Calculator>) {
        self.calculators.push(calculator);
    }

    pub fn register_profile(&mut self, profile: Profile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn register_phy(&mut self, routine: PhyRoutine) {
        self.phys.push(routine);
    }

    pub fn register_target(&mut self, target: Target) {
        self.targets.insert(target.name.clone(), target);
    }

    /// Record what a PHY group is for; replaces earlier kinds of `group`.
    pub fn classify_group(&mut self, group: &str, kinds: &[GroupKind]) {
        self.group_kinds.insert(group.to_string(), kinds.to_vec());
    }

    /// Kinds of `group`; empty when it was never classified.
    pub fn group_kinds(&self, group: &str) -> &[GroupKind] {
        self.group_kinds.get(group).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn part_name(&self) -> String {
        format!("{}-{}", self.family, self.revision)
    }

    pub fn register_map(&self) -> &Arc<RegisterMap> {
        &self.register_map
    }

    pub fn calculators(&self) -> &[Box<dyn Calculator>] {
        &self.calculators
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| PartsError::UnknownProfile(name.to_string()))
    }

    pub fn phys(&self) -> &[PhyRoutine] {
        &self.phys
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    /// Look a target up by name or tag, ignoring case.
    pub fn target(&self, name_or_tag: &str) -> Result<&Target> {
        self.targets
            .values()
            .find(|t| t.name.eq_ignore_ascii_case(name_or_tag) || t.tag.eq_ignore_ascii_case(name_or_tag))
            .ok_or_else(|| PartsError::UnknownTarget(name_or_tag.to_string()))
    }

    /// Look a PHY up by exact name, then by GUID (case-insensitive).
    pub fn find_phy(&self, name_or_guid: &str) -> Option<&PhyRoutine> {
        self.phys
            .iter()
            .find(|r| r.name == name_or_guid)
            .or_else(|| self.phys.iter().find(|r| r.guid().eq_ignore_ascii_case(name_or_guid)))
    }

    /// A fresh model with every register field and calculator variable
    /// registered and nothing bound.
    pub fn new_model(&self) -> Result<Model> {
        let mut model = Model::new(&self.family, &self.revision);
        model.register_fields(&self.register_map)?;
        for calculator in &self.calculators {
            calculator.build_variables(&mut model)?;
        }
        debug!(part = %self.part_name(), variables = model.variable_count(), "model built");
        Ok(model)
    }

    /// An engine loaded with every calculator's units, in calculator order.
    pub fn engine(&self) -> Result<Engine> {
        let mut engine = Engine::new();
        for calculator in &self.calculators {
            for unit in calculator.units() {
                engine.add_unit(unit)?;
            }
        }
        Ok(engine)
    }
}

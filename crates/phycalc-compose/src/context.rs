//! Build context: the explicit stack of PHYs under construction.
//!
//! A PHY routine that runs with nothing on the stack creates a new PHY. A
//! routine invoked while another is active gets the outer PHY back and
//! mutates it, which is how shared base routines (a common frame format,
//! say) extend whichever PHY called them.

use phycalc_model::{Model, Phy, PhyHandle, PRODUCTION_MARKER};
use tracing::{debug, info};

use crate::error::ComposeError;

/// One active PHY routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub routine: String,
    pub phy: PhyHandle,
}

/// Metadata a PHY routine declares about itself.
#[derive(Debug, Clone, Default)]
pub struct PhyDef {
    /// Routine identity; also the PHY name unless `name` is given.
    pub routine: String,
    pub name: Option<String>,
    pub profile: String,
    pub group: String,
    pub readable_name: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
}

impl PhyDef {
    pub fn new(routine: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            routine: routine.into(),
            profile: profile.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn readable(mut self, readable_name: impl Into<String>) -> Self {
        self.readable_name = Some(readable_name.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Stack of PHY routines currently running, outermost first.
#[derive(Debug, Default)]
pub struct BuildContext {
    stack: Vec<Frame>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_building(&self) -> bool {
        !self.stack.is_empty()
    }

    /// PHY of the innermost active routine.
    pub fn active(&self) -> Option<PhyHandle> {
        self.stack.last().map(|f| f.phy)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.stack
    }

    /// Return the PHY `routine` should build into.
    ///
    /// With no active build a new PHY is created, named `explicit_name` or
    /// `routine`; a name clash fails with `DuplicatePhyName`. With an active
    /// build the outer PHY is returned unchanged, apart from the production
    /// rule: a production PHY points to the nested routine whose name is
    /// its own name without the marker. Other nested routines, such as
    /// shared frame formats, never become the alias target.
    pub fn begin_or_reuse_phy(
        &self,
        model: &mut Model,
        routine: &str,
        explicit_name: Option<&str>,
        profile: &str,
    ) -> Result<PhyHandle, ComposeError> {
        if let Some(outer) = self.active() {
            let phy = model.phy_mut(outer)?;
            if phy.points_to.is_none() && phy.design_name().as_deref() == Some(routine) {
                debug!(phy = %phy.name, points_to = routine, "production PHY aliased");
                phy.points_to = Some(routine.to_string());
            }
            debug!(phy = %phy.name, routine, depth = self.depth(), "reusing active PHY");
            return Ok(outer);
        }

        let name = explicit_name.unwrap_or(routine);
        let mut phy = Phy::new(name, profile);
        if name.contains(PRODUCTION_MARKER) && name != routine {
            phy.points_to = Some(routine.to_string());
        }
        let handle = model.add_phy(phy)?;
        debug!(phy = name, routine, "created PHY");
        Ok(handle)
    }

    /// Run a PHY routine body inside this context.
    ///
    /// The outermost call creates the PHY, applies the definition's metadata
    /// and freezes the PHY once `body` returns. If the outermost body fails
    /// the new PHY is removed again, so a failed definition leaves no trace
    /// in the model.
    pub fn define<F>(&mut self, model: &mut Model, def: &PhyDef, body: F) -> Result<PhyHandle, ComposeError>
    where
        F: FnOnce(&mut BuildContext, &mut Model, PhyHandle) -> Result<(), ComposeError>,
    {
        let outermost = !self.is_building();
        let handle = self.begin_or_reuse_phy(model, &def.routine, def.name.as_deref(), &def.profile)?;

        if outermost {
            let phy = model.phy_mut(handle)?;
            phy.group = def.group.clone();
            if let Some(readable) = &def.readable_name {
                phy.readable_name = readable.clone();
            }
            phy.description = def.description.clone();
            for tag in &def.tags {
                phy.add_tag(tag.clone());
            }
        }

        self.stack.push(Frame {
            routine: def.routine.clone(),
            phy: handle,
        });
        let result = body(self, model, handle);
        self.stack.pop();

        match result {
            Ok(()) => {
                if outermost {
                    let phy = model.phy_mut(handle)?;
                    phy.frozen = true;
                    info!(phy = %phy.name, inputs = phy.inputs.len(), "PHY defined");
                }
                Ok(handle)
            }
            Err(err) => {
                if outermost {
                    model.rollback_phy(handle)?;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common_frame(ctx: &mut BuildContext, model: &mut Model) -> Result<PhyHandle, ComposeError> {
        ctx.define(model, &PhyDef::new("PHY_Common_Frame", "Base"), |_, model, phy| {
            model.phy_mut(phy)?.set_input("preamble_length", 32i64);
            Ok(())
        })
    }

    fn outer(ctx: &mut BuildContext, model: &mut Model, name: Option<&str>) -> Result<PhyHandle, ComposeError> {
        let mut def = PhyDef::new("PHY_Outer", "Base").group("Test").tag("fsk");
        if let Some(name) = name {
            def = def.named(name);
        }
        ctx.define(model, &def, |ctx, model, phy| {
            model.phy_mut(phy)?.set_input("bitrate", 100_000i64);
            let nested = common_frame(ctx, model)?;
            assert_eq!(nested, phy);
            Ok(())
        })
    }

    #[test]
    fn nested_routine_extends_outer_phy() {
        let mut model = Model::new("test", "A0");
        let mut ctx = BuildContext::new();
        let handle = outer(&mut ctx, &mut model, None).unwrap();

        assert_eq!(model.phys().len(), 1);
        let phy = model.phy(handle).unwrap();
        assert_eq!(phy.name, "PHY_Outer");
        assert_eq!(phy.group, "Test");
        assert!(phy.frozen);
        assert!(phy.inputs.contains_key("bitrate"));
        assert!(phy.inputs.contains_key("preamble_length"));
        assert!(phy.points_to.is_none());
        assert!(!ctx.is_building());
    }

    #[test]
    fn standalone_nested_routine_makes_its_own_phy() {
        let mut model = Model::new("test", "A0");
        let mut ctx = BuildContext::new();
        common_frame(&mut ctx, &mut model).unwrap();
        outer(&mut ctx, &mut model, None).unwrap();
        let names: Vec<&str> = model.phys().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["PHY_Common_Frame", "PHY_Outer"]);
    }

    #[test]
    fn duplicate_phy_name_rejected() {
        let mut model = Model::new("test", "A0");
        let mut ctx = BuildContext::new();
        outer(&mut ctx, &mut model, None).unwrap();
        let err = outer(&mut ctx, &mut model, None).unwrap_err();
        assert!(err.is_duplicate_phy());
        assert_eq!(model.phys().len(), 1);
        assert!(!ctx.is_building());
    }

    #[test]
    fn explicit_name_overrides_routine() {
        let mut model = Model::new("test", "A0");
        let mut ctx = BuildContext::new();
        let h = outer(&mut ctx, &mut model, Some("PHY_Custom")).unwrap();
        let phy = model.phy(h).unwrap();
        assert_eq!(phy.name, "PHY_Custom");
        assert!(phy.points_to.is_none());
    }

    #[test]
    fn production_name_points_to_routine() {
        let mut model = Model::new("test", "A0");
        let mut ctx = BuildContext::new();
        let h = outer(&mut ctx, &mut model, Some("PHY_Outer_prod")).unwrap();
        assert_eq!(model.phy(h).unwrap().points_to.as_deref(), Some("PHY_Outer"));
    }

    #[test]
    fn production_routine_points_to_nested_design_phy() {
        let mut model = Model::new("test", "A0");
        let mut ctx = BuildContext::new();
        let def = PhyDef::new("PHY_Outer_prod", "Base");
        let h = ctx
            .define(&mut model, &def, |ctx, model, _| {
                outer(ctx, model, None)?;
                Ok(())
            })
            .unwrap();
        let phy = model.phy(h).unwrap();
        assert_eq!(phy.name, "PHY_Outer_prod");
        assert_eq!(phy.points_to.as_deref(), Some("PHY_Outer"));
        assert_eq!(model.phys().len(), 1);
    }

    #[test]
    fn production_alias_skips_shared_frame_routine() {
        let mut model = Model::new("test", "A0");
        let mut ctx = BuildContext::new();
        let def = PhyDef::new("PHY_Outer_prod", "Base");
        let h = ctx
            .define(&mut model, &def, |ctx, model, _| {
                common_frame(ctx, model)?;
                outer(ctx, model, None)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(model.phy(h).unwrap().points_to.as_deref(), Some("PHY_Outer"));
    }

    #[test]
    fn production_phy_without_design_routine_has_no_alias() {
        let mut model = Model::new("test", "A0");
        let mut ctx = BuildContext::new();
        let def = PhyDef::new("PHY_Lab_prod", "Base");
        let h = ctx
            .define(&mut model, &def, |ctx, model, _| {
                common_frame(ctx, model)?;
                Ok(())
            })
            .unwrap();
        assert!(model.phy(h).unwrap().points_to.is_none());
    }

    #[test]
    fn failed_definition_rolls_back() {
        let mut model = Model::new("test", "A0");
        let mut ctx = BuildContext::new();
        let def = PhyDef::new("PHY_Broken", "Base");
        let err = ctx
            .define(&mut model, &def, |_, _, _| {
                Err(ComposeError::UnknownProfile("Missing".into()))
            })
            .unwrap_err();
        assert!(matches!(err, ComposeError::UnknownProfile(_)));
        assert!(model.phys().is_empty());
        assert_eq!(ctx.depth(), 0);
    }
}

//! The reference transceiver family.
//!
//! Revision A0 carries the common calculators. B0 adds a digital mixer
//! field to the register map and layers [`CalcRevisionB0`] after the common
//! calculators, so its writes win where both write the same field.

pub mod agc;
pub mod demodulator;
pub mod enums;
pub mod frame;
pub mod modulator;
pub mod phys;
pub mod profiles;
pub mod revision_b0;
pub mod synth;
pub mod targets;

use std::sync::Arc;

use phycalc_engine::{CalcContext, CalcError, WritePolicy};
use phycalc_model::{Model, ModelError, RegisterMap, VarRole, VariableSpec};

use crate::bands::BandTable;
use crate::error::{PartsError, Result};
use crate::part::Part;
use crate::target::GroupKind;

pub use agc::CalcAgc;
pub use demodulator::CalcDemodulator;
pub use enums::{BitEndian, Modulation, ShapingFilter, SymbolEncoding};
pub use frame::CalcFrame;
pub use modulator::CalcModulator;
pub use revision_b0::CalcRevisionB0;
pub use synth::CalcSynth;

pub const FAMILY: &str = "reference";
pub const REVISIONS: &[&str] = &["A0", "B0"];

const REGMAP_A0: &str = include_str!("../../data/reference-A0.regmap.toml");
const REGMAP_B0: &str = include_str!("../../data/reference-B0.regmap.toml");
const BANDS: &str = include_str!("../../data/reference-bands.toml");

/// Build a revision of the reference family. Revision names are
/// case-insensitive.
pub fn part(revision: &str) -> Result<Part> {
    let (revision, regmap) = match revision.to_ascii_uppercase().as_str() {
        "A0" => ("A0", REGMAP_A0),
        "B0" => ("B0", REGMAP_B0),
        _ => {
            return Err(PartsError::UnknownRevision {
                family: FAMILY.to_string(),
                revision: revision.to_string(),
            })
        }
    };
    let register_map = Arc::new(RegisterMap::from_toml_str(regmap)?);
    let bands = Arc::new(BandTable::from_toml_str(BANDS)?);

    let mut part = Part::new(FAMILY, revision, register_map);
    part.register_calculator(Box::new(CalcModulator));
    part.register_calculator(Box::new(CalcDemodulator));
    part.register_calculator(Box::new(CalcSynth::new(bands)));
    part.register_calculator(Box::new(CalcFrame));
    part.register_calculator(Box::new(CalcAgc));
    if revision == "B0" {
        part.register_calculator(Box::new(CalcRevisionB0));
    }
    part.register_profile(profiles::base_profile());
    for routine in phys::LIBRARY {
        part.register_phy(*routine);
    }
    part.classify_group(phys::GROUP_BASE, &[GroupKind::Customer, GroupKind::Studio]);
    part.classify_group(
        phys::GROUP_IEEE802154,
        &[GroupKind::Customer, GroupKind::Studio, GroupKind::SimTests],
    );
    part.register_target(targets::ic_target());
    part.register_target(targets::fpga_target());
    Ok(part)
}

// --- helpers shared by the calculators ---

fn input(spec: VariableSpec) -> VariableSpec {
    spec.role(VarRole::ProfileInput)
}

fn register_all(model: &mut Model, specs: impl IntoIterator<Item = VariableSpec>) -> std::result::Result<(), ModelError> {
    for spec in specs {
        model.register(spec)?;
    }
    Ok(())
}

/// Policy for a field the configuration leaves unused.
fn unused_field() -> WritePolicy {
    WritePolicy::new().use_default().do_not_care()
}

fn read_enum<T>(ctx: &mut CalcContext<'_>, name: &str, from_value: fn(i64) -> Option<T>) -> std::result::Result<T, CalcError> {
    let value = ctx.get_enum(name)?;
    from_value(value).ok_or_else(|| CalcError::domain(format!("unsupported {name} value {value}")))
}

fn modulation(ctx: &mut CalcContext<'_>) -> std::result::Result<Modulation, CalcError> {
    read_enum(ctx, "modulation_type", Modulation::from_value)
}

fn symbol_encoding(ctx: &mut CalcContext<'_>) -> std::result::Result<SymbolEncoding, CalcError> {
    read_enum(ctx, "symbol_encoding", SymbolEncoding::from_value)
}

fn shaping_filter(ctx: &mut CalcContext<'_>) -> std::result::Result<ShapingFilter, CalcError> {
    read_enum(ctx, "shaping_filter", ShapingFilter::from_value)
}

fn bit_endian(ctx: &mut CalcContext<'_>) -> std::result::Result<BitEndian, CalcError> {
    read_enum(ctx, "frame_bitendian", BitEndian::from_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phycalc_engine::Engine;
    use phycalc_model::Value;

    #[test]
    fn revisions_load() {
        let a0 = part("A0").unwrap();
        let b0 = part("b0").unwrap();
        assert_eq!(a0.part_name(), "reference-A0");
        assert_eq!(b0.revision(), "B0");
        assert_eq!(b0.register_map().len(), a0.register_map().len() + 1);
        assert_eq!(b0.calculators().len(), a0.calculators().len() + 1);
        assert!(matches!(part("C1"), Err(PartsError::UnknownRevision { .. })));
    }

    #[test]
    fn targets_and_group_kinds() {
        let part = part("A0").unwrap();
        let names: Vec<&str> = part.targets().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![targets::TARGET_IC, targets::TARGET_FPGA]);
        assert_eq!(part.target("fpga").unwrap().name, targets::TARGET_FPGA);
        assert!(matches!(part.target("asic"), Err(PartsError::UnknownTarget(_))));
        assert!(part.group_kinds(phys::GROUP_IEEE802154).contains(&GroupKind::SimTests));
        assert!(!part.group_kinds(phys::GROUP_BASE).contains(&GroupKind::SimTests));
        assert!(part.group_kinds("Unclassified").is_empty());
    }

    #[test]
    fn library_groups_match_definitions() {
        let part = part("A0").unwrap();
        for routine in part.phys() {
            let mut model = part.new_model().unwrap();
            let mut ctx = phycalc_compose::BuildContext::new();
            let handle = (routine.define)(&mut ctx, &mut model).unwrap();
            let phy = model.phy(handle).unwrap();
            assert_eq!(phy.name, routine.name);
            assert_eq!(phy.group, routine.group);
            assert!(part.profile(&phy.profile).is_ok());
        }
    }

    #[test]
    fn shaping_gain_is_fixed_when_bypassed() {
        let part = part("A0").unwrap();
        let mut model = part.new_model().unwrap();
        model.force("shaping_filter_mode", 0i64).unwrap();
        for (field, v) in modulator::SHAPING_COEFFS.iter().zip([9i64, 200, 3, 77]) {
            model.force(field, v).unwrap();
        }
        let unit = part
            .engine()
            .unwrap()
            .units()
            .iter()
            .find(|u| u.name() == "calc_shaping_filter_gain_actual")
            .cloned()
            .unwrap();
        Engine::with_units([unit]).unwrap().run(&mut model).unwrap();
        assert_eq!(
            model.value("shaping_filter_gain_actual").unwrap(),
            Some(&Value::Int(modulator::UNSHAPED_GAIN))
        );
    }
}

//! Revision B0 deltas. Registered after the common calculators so its
//! writes win.

use phycalc_engine::{CalcUnit, WritePolicy};
use phycalc_model::{Model, ModelError};

use super::agc::write_power_target;
use crate::calculator::Calculator;

/// B0's LNA has this much more gain than A0's.
const B0_EXTRA_LNA_GAIN_DB: i64 = 2;

/// Width of the digital mixer frequency word.
const DIGMIX_BITS: u32 = 20;

#[derive(Debug, Default)]
pub struct CalcRevisionB0;

impl Calculator for CalcRevisionB0 {
    fn name(&self) -> &str {
        "revision_b0"
    }

    fn build_variables(&self, _model: &mut Model) -> Result<(), ModelError> {
        Ok(())
    }

    fn units(&self) -> Vec<CalcUnit> {
        vec![calc_agc_power_target_b0(), calc_digmix_freq()]
    }
}

fn calc_agc_power_target_b0() -> CalcUnit {
    CalcUnit::new("calc_agc_power_target_b0", |ctx| {
        let target = ctx.get_int("agc_power_target")?;
        write_power_target(ctx, target - B0_EXTRA_LNA_GAIN_DB)
    })
}

fn calc_digmix_freq() -> CalcUnit {
    CalcUnit::new("calc_digmix_freq", |ctx| {
        let if_hz = ctx.get_int("if_frequency_hz")?;
        let xtal = ctx.get_int("xtal_frequency_hz")?.max(1);
        let word = (if_hz as f64 * f64::from(1u32 << DIGMIX_BITS) / xtal as f64).round() as i64;
        ctx.write_register("MODEM_DIGMIX_DIGMIXFREQ", Some(word), &WritePolicy::new().saturate())
    })
}

//! Automatic gain control.

use phycalc_engine::{CalcContext, CalcError, CalcUnit, WritePolicy};
use phycalc_model::{Model, ModelError, VariableSpec};

use super::{input, register_all};
use crate::calculator::Calculator;

/// Range of the signed 8-bit power target, in dBm.
const PWRTARGET_MIN_DBM: i64 = -128;
const PWRTARGET_MAX_DBM: i64 = 127;

#[derive(Debug, Default)]
pub struct CalcAgc;

impl Calculator for CalcAgc {
    fn name(&self) -> &str {
        "agc"
    }

    fn build_variables(&self, model: &mut Model) -> Result<(), ModelError> {
        register_all(
            model,
            [
                input(VariableSpec::int("agc_power_target")).describe("Target input power in dBm"),
                input(VariableSpec::int("rssi_period")).describe("RSSI averaging period, log2 of symbols"),
                input(VariableSpec::boolean("agc_fast_loop")).describe("Superseded by the step limit"),
            ],
        )
    }

    fn units(&self) -> Vec<CalcUnit> {
        vec![calc_agc_power_target(), calc_agc_rssi_period(), calc_agc_loop_step()]
    }
}

fn calc_agc_power_target() -> CalcUnit {
    CalcUnit::new("calc_agc_power_target", |ctx| {
        let target = ctx.get_int("agc_power_target")?;
        write_power_target(ctx, target)
    })
}

/// Write a power target in dBm as a two's complement byte.
pub(crate) fn write_power_target(ctx: &mut CalcContext<'_>, target_dbm: i64) -> Result<(), CalcError> {
    let clamped = target_dbm.clamp(PWRTARGET_MIN_DBM, PWRTARGET_MAX_DBM);
    if clamped != target_dbm {
        ctx.warn(
            Some("AGC_CTRL0_PWRTARGET"),
            format!("power target {target_dbm} dBm clamped to {clamped} dBm"),
        );
    }
    ctx.write_register(
        "AGC_CTRL0_PWRTARGET",
        Some(clamped),
        &WritePolicy::new().allow_negative(),
    )
}

fn calc_agc_rssi_period() -> CalcUnit {
    CalcUnit::new("calc_agc_rssi_period", |ctx| {
        let period = ctx.get_int("rssi_period")?;
        ctx.write_register(
            "AGC_CTRL1_RSSIPERIOD",
            Some(period),
            &WritePolicy::new().limits(1, 15),
        )
    })
}

/// Faster links need a faster gain loop.
fn calc_agc_loop_step() -> CalcUnit {
    CalcUnit::new("calc_agc_loop_step", |ctx| {
        let baud = ctx.get_int("baudrate")?;
        let step = match baud {
            b if b >= 1_000_000 => 16,
            b if b >= 250_000 => 8,
            _ => 4,
        };
        ctx.write_register(
            "AGC_GAINSTEPLIM_CFLOOPSTEPMAX",
            Some(step),
            &WritePolicy::new().saturate(),
        )
    })
}

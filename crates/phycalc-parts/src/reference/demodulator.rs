//! Demodulator: frequency gain of the FSK discriminator.

use phycalc_engine::{CalcError, CalcUnit};
use phycalc_model::{Model, ModelError, VariableSpec};

use super::enums::Modulation;
use super::{input, modulation, register_all, unused_field};
use crate::calculator::Calculator;

/// Receive oversampling ratio relative to the baud rate.
const DEMOD_OSR: i64 = 8;

#[derive(Debug, Default)]
pub struct CalcDemodulator;

impl Calculator for CalcDemodulator {
    fn name(&self) -> &str {
        "demodulator"
    }

    fn build_variables(&self, model: &mut Model) -> Result<(), ModelError> {
        register_all(
            model,
            [
                input(VariableSpec::int("freq_offset_hz")).describe("Expected carrier offset in Hz"),
                VariableSpec::int("demod_rate"),
                VariableSpec::float("freq_gain"),
                VariableSpec::float("freq_gain_actual"),
            ],
        )
    }

    fn units(&self) -> Vec<CalcUnit> {
        vec![
            calc_demod_rate(),
            calc_freq_gain_target(),
            calc_freq_gain_reg(),
            calc_freq_gain_actual(),
        ]
    }
}

fn calc_demod_rate() -> CalcUnit {
    CalcUnit::new("calc_demod_rate", |ctx| {
        let baud = ctx.get_int("baudrate")?;
        ctx.set("demod_rate", baud * DEMOD_OSR)
    })
}

/// Gain that maps the expected frequency swing onto the discriminator
/// range. Zero for modulations without a frequency swing.
fn calc_freq_gain_target() -> CalcUnit {
    CalcUnit::new("calc_freq_gain_target", |ctx| {
        let modulation = modulation(ctx)?;
        if !modulation.is_fsk() {
            return ctx.set("freq_gain", 0.0);
        }
        let demod_rate = ctx.get_int("demod_rate")? as f64;
        let deviation = ctx.get_int("deviation")? as f64;
        let offset = ctx.get_int("freq_offset_hz")? as f64;
        let swing = match modulation {
            Modulation::Fsk4 => 3.0 * deviation + offset,
            _ => deviation + offset,
        };
        if swing <= 0.0 {
            return Err(CalcError::domain(format!(
                "{} needs a positive deviation",
                modulation.member_name()
            )));
        }
        ctx.set("freq_gain", demod_rate / (4.0 * swing / 2.0))
    })
    .writes(["freq_gain"])
}

fn calc_freq_gain_reg() -> CalcUnit {
    CalcUnit::new("calc_freq_gain_reg", |ctx| {
        let target = ctx.get_float("freq_gain")?;
        if target <= 0.0 {
            ctx.write_register("MODEM_MODINDEX_FREQGAINM", None, &unused_field())?;
            return ctx.write_register("MODEM_MODINDEX_FREQGAINE", None, &unused_field());
        }
        let (m, e) = freq_gain_search(target);
        ctx.write_field("MODEM_MODINDEX_FREQGAINM", m)?;
        ctx.write_field("MODEM_MODINDEX_FREQGAINE", e)
    })
}

fn calc_freq_gain_actual() -> CalcUnit {
    CalcUnit::new("calc_freq_gain_actual", |ctx| {
        let m = ctx.get_int("MODEM_MODINDEX_FREQGAINM")?;
        let e = ctx.get_int("MODEM_MODINDEX_FREQGAINE")?;
        ctx.set("freq_gain_actual", freq_gain(m, e))
    })
}

fn freq_gain(m: i64, e: i64) -> f64 {
    m as f64 * 4.0 / f64::from(1u32 << e.clamp(0, 7))
}

/// Mantissa 1..=7 and exponent 0..=7 minimizing `|target - m * 2^(2 - e)|`;
/// the first minimum found wins.
pub(crate) fn freq_gain_search(target: f64) -> (i64, i64) {
    let mut best = (1, 0);
    let mut best_err = f64::INFINITY;
    for m in 1..=7 {
        for e in 0..=7 {
            let err = (target - freq_gain(m, e)).abs();
            if err < best_err {
                best = (m, e);
                best_err = err;
            }
        }
    }
    best
}

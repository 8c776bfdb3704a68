//! Synthesizer: band selection, resolution, LO and IF frequencies, channel
//! spacing.

use std::sync::Arc;

use phycalc_engine::{CalcError, CalcUnit, WritePolicy};
use phycalc_model::{Model, ModelError, VarRole, VariableSpec};

use super::enums::Modulation;
use super::{input, modulation, register_all};
use crate::bands::BandTable;
use crate::calculator::Calculator;

/// Fractional bits of the synthesizer divider.
const SYNTH_FRAC_BITS: u32 = 19;

const IF_FREQUENCY_HZ: i64 = 400_000;
const IF_FREQUENCY_OQPSK_HZ: i64 = 1_370_000;

#[derive(Debug)]
pub struct CalcSynth {
    bands: Arc<BandTable>,
}

impl CalcSynth {
    pub fn new(bands: Arc<BandTable>) -> Self {
        Self { bands }
    }
}

impl Calculator for CalcSynth {
    fn name(&self) -> &str {
        "synth"
    }

    fn build_variables(&self, model: &mut Model) -> Result<(), ModelError> {
        register_all(
            model,
            [
                input(VariableSpec::int("base_frequency_hz")).describe("Channel 0 center frequency in Hz"),
                input(VariableSpec::int("channel_spacing_hz")),
                input(VariableSpec::int("xtal_frequency_hz")),
                VariableSpec::int("lo_div"),
                VariableSpec::float("synth_res").describe("RF frequency step of one synthesizer LSB, in Hz"),
                VariableSpec::int("if_frequency_hz"),
                VariableSpec::text("rf_band").role(VarRole::SoftwareOutput),
                VariableSpec::int("synth_freq_actual_hz").role(VarRole::SoftwareOutput),
                VariableSpec::int("channel_spacing_actual_hz").role(VarRole::SoftwareOutput),
                VariableSpec::int("synth_freq_error_hz")
                    .role(VarRole::SoftwareOutput)
                    .describe("Synthesized minus requested channel 0 frequency, in Hz"),
            ],
        )
    }

    fn units(&self) -> Vec<CalcUnit> {
        vec![
            calc_rf_band(Arc::clone(&self.bands)),
            calc_synth_res(),
            calc_if_frequency(),
            calc_synth_freq_reg(),
            calc_synth_freq_actual(),
            calc_channel_spacing_reg(),
        ]
    }
}

fn calc_rf_band(bands: Arc<BandTable>) -> CalcUnit {
    CalcUnit::new("calc_rf_band", move |ctx| {
        let freq = ctx.get_int("base_frequency_hz")?;
        let band = bands
            .find(freq)
            .ok_or_else(|| CalcError::domain(format!("{freq} Hz is outside every supported band")))?;
        ctx.set("lo_div", band.lo_div)?;
        ctx.set("rf_band", band.name.as_str())?;
        ctx.write_field("SYNTH_DIVCTRL_LODIVFREQCTRL", band.lo_div)
    })
    .writes(["lo_div", "rf_band", "SYNTH_DIVCTRL_LODIVFREQCTRL"])
}

fn calc_synth_res() -> CalcUnit {
    CalcUnit::new("calc_synth_res", |ctx| {
        let xtal = ctx.get_int("xtal_frequency_hz")?;
        let lo_div = ctx.get_int("lo_div")?;
        if xtal <= 0 {
            return Err(CalcError::domain(format!("crystal frequency must be positive, got {xtal}")));
        }
        let res = xtal as f64 / (f64::from(1u32 << SYNTH_FRAC_BITS) * lo_div.max(1) as f64);
        ctx.set("synth_res", res)
    })
    .writes(["synth_res"])
}

fn calc_if_frequency() -> CalcUnit {
    CalcUnit::new("calc_if_frequency", |ctx| {
        let if_hz = match modulation(ctx)? {
            Modulation::Oqpsk => IF_FREQUENCY_OQPSK_HZ,
            _ => IF_FREQUENCY_HZ,
        };
        let res = ctx.get_float("synth_res")?;
        ctx.set("if_frequency_hz", if_hz)?;
        ctx.write_register(
            "SYNTH_IFFREQ_IFFREQ",
            Some(steps(if_hz as f64, res)),
            &WritePolicy::new().saturate(),
        )?;
        ctx.write_field("SYNTH_IFFREQ_LOSIDE", 1)
    })
}

/// The LO sits one IF below the channel (low-side injection).
fn calc_synth_freq_reg() -> CalcUnit {
    CalcUnit::new("calc_synth_freq_reg", |ctx| {
        let base = ctx.get_int("base_frequency_hz")?;
        let if_hz = ctx.get_int("if_frequency_hz")?;
        let res = ctx.get_float("synth_res")?;
        ctx.write_register(
            "SYNTH_FREQ_FREQ",
            Some(steps((base - if_hz) as f64, res)),
            &WritePolicy::new().saturate(),
        )
    })
}

fn calc_synth_freq_actual() -> CalcUnit {
    CalcUnit::new("calc_synth_freq_actual", |ctx| {
        let reg = ctx.get_int("SYNTH_FREQ_FREQ")?;
        let res = ctx.get_float("synth_res")?;
        let if_hz = ctx.get_int("if_frequency_hz")?;
        ctx.set("synth_freq_actual_hz", (reg as f64 * res).round() as i64 + if_hz)
    })
}

fn calc_channel_spacing_reg() -> CalcUnit {
    CalcUnit::new("calc_channel_spacing_reg", |ctx| {
        let spacing = ctx.get_int("channel_spacing_hz")?;
        let res = ctx.get_float("synth_res")?;
        ctx.write_register(
            "SYNTH_CHSP_CHSP",
            Some(steps(spacing as f64, res)),
            &WritePolicy::new().saturate(),
        )?;
        let chsp = ctx.get_int("SYNTH_CHSP_CHSP")?;
        ctx.set("channel_spacing_actual_hz", (chsp as f64 * res).round() as i64)
    })
}

/// `hz` in whole synthesizer steps of `res` Hz.
fn steps(hz: f64, res: f64) -> i64 {
    if res <= 0.0 {
        return 0;
    }
    (hz / res).round() as i64
}

//! Modulator: data rates, modulation format, symbol coding, TX shaping and
//! deviation.

use std::f64::consts::{LN_2, PI};

use phycalc_engine::{CalcContext, CalcError, CalcUnit, WritePolicy};
use phycalc_model::{Model, ModelError, VarFormat, VarRole, VariableSpec};

use super::enums::{define_enums, Modulation, ShapingFilter, SymbolEncoding};
use super::{input, modulation, register_all, shaping_filter, symbol_encoding, unused_field};
use crate::calculator::Calculator;

pub(crate) const SHAPING_COEFFS: [&str; 4] = [
    "MODEM_SHAPING0_COEFF0",
    "MODEM_SHAPING0_COEFF1",
    "MODEM_SHAPING0_COEFF2",
    "MODEM_SHAPING0_COEFF3",
];

/// Gain of the bypassed shaping filter.
pub const UNSHAPED_GAIN: i64 = 127;

#[derive(Debug, Default)]
pub struct CalcModulator;

impl Calculator for CalcModulator {
    fn name(&self) -> &str {
        "modulator"
    }

    fn build_variables(&self, model: &mut Model) -> Result<(), ModelError> {
        define_enums(model)?;
        register_all(
            model,
            [
                input(VariableSpec::enumerated("modulation_type", Modulation::MODEL_NAME)),
                input(VariableSpec::enumerated("symbol_encoding", SymbolEncoding::MODEL_NAME)),
                input(VariableSpec::int("bitrate")).describe("Net data rate in bit/s"),
                input(VariableSpec::int("deviation")).describe("FSK frequency deviation in Hz"),
                input(VariableSpec::enumerated("shaping_filter", ShapingFilter::MODEL_NAME)),
                input(VariableSpec::float("shaping_filter_param")).describe("Gaussian BT or raised-cosine roll-off"),
                input(VariableSpec::boolean("fec_enabled")),
                input(VariableSpec::int("dsss_spreading_factor")),
                input(VariableSpec::int("dsss_chipping_code").format(VarFormat::Hex)),
                input(VariableSpec::int("dsss_len")).describe("Chipping code length in chips"),
                VariableSpec::int("bitrate_gross").describe("Bit rate after line coding and FEC"),
                VariableSpec::int("baudrate"),
                VariableSpec::text("mod_format_actual"),
                VariableSpec::int("shaping_filter_mode"),
                VariableSpec::int("shaping_filter_gain_actual"),
                VariableSpec::float("modulation_index"),
                VariableSpec::float("tx_baud_rate_actual").role(VarRole::SoftwareOutput),
            ],
        )
    }

    fn units(&self) -> Vec<CalcUnit> {
        vec![
            calc_bitrate_gross(),
            calc_baudrate(),
            calc_mod_type_reg(),
            calc_mod_format_actual(),
            calc_coding_reg(),
            calc_shaping_filter_mode(),
            calc_shaping_filter_coeffs(),
            calc_shaping_filter_gain_actual(),
            calc_txbr_reg(),
            calc_tx_baud_rate_actual(),
            calc_modindex_reg(),
        ]
    }
}

fn calc_bitrate_gross() -> CalcUnit {
    CalcUnit::new("calc_bitrate_gross", |ctx| {
        let bitrate = ctx.get_int("bitrate")?;
        if bitrate <= 0 {
            return Err(CalcError::domain(format!("bitrate must be positive, got {bitrate}")));
        }
        let mut gross = bitrate;
        if symbol_encoding(ctx)? == SymbolEncoding::Manchester {
            gross *= 2;
        }
        if ctx.get_bool("fec_enabled")? {
            gross *= 2;
        }
        ctx.set("bitrate_gross", gross)
    })
    .writes(["bitrate_gross"])
}

fn calc_baudrate() -> CalcUnit {
    CalcUnit::new("calc_baudrate", |ctx| {
        let modulation = modulation(ctx)?;
        let mut baud = ctx.get_int("bitrate_gross")? as f64;
        if modulation == Modulation::Fsk4 {
            baud /= 2.0;
        }
        if symbol_encoding(ctx)? == SymbolEncoding::Dsss {
            let factor = ctx.get_int("dsss_spreading_factor")?;
            if factor <= 0 {
                return Err(CalcError::domain(
                    "DSSS coding needs a positive dsss_spreading_factor",
                ));
            }
            baud *= factor as f64;
        }
        ctx.set("baudrate", baud.round() as i64)
    })
    .writes(["baudrate"])
}

fn calc_mod_type_reg() -> CalcUnit {
    CalcUnit::new("calc_mod_type_reg", |ctx| {
        let format = match modulation(ctx)? {
            Modulation::Fsk2 | Modulation::Msk => 0,
            Modulation::Fsk4 => 1,
            Modulation::Bpsk => 2,
            Modulation::Dbpsk => 3,
            Modulation::Oqpsk => 4,
            Modulation::Ook | Modulation::Ask => 6,
        };
        ctx.write_field("MODEM_CTRL0_MODFORMAT", format)
    })
}

fn calc_mod_format_actual() -> CalcUnit {
    CalcUnit::new("calc_mod_format_actual", |ctx| {
        let name = match ctx.get_int("MODEM_CTRL0_MODFORMAT")? {
            0 => "FSK2",
            1 => "FSK4",
            2 => "BPSK",
            3 => "DBPSK",
            4 => "OQPSK",
            6 => "OOK",
            _ => "reserved",
        };
        ctx.set("mod_format_actual", name)
    })
}

fn calc_coding_reg() -> CalcUnit {
    CalcUnit::new("calc_coding_reg", |ctx| {
        let encoding = symbol_encoding(ctx)?;
        let coding = match encoding {
            SymbolEncoding::Nrz => 0,
            SymbolEncoding::Manchester => 1,
            SymbolEncoding::Dsss => 2,
        };
        ctx.write_field("MODEM_CTRL0_CODING", coding)?;

        if encoding == SymbolEncoding::Dsss {
            let len = ctx.get_int("dsss_len")?;
            if !(1..=32).contains(&len) {
                return Err(CalcError::domain(format!(
                    "dsss_len must be 1 to 32 chips, got {len}"
                )));
            }
            let code = ctx.get_int("dsss_chipping_code")?;
            ctx.write_field("MODEM_DSSS0_DSSS0", code)?;
            ctx.write_field("MODEM_CTRL0_DSSSLEN", len - 1)
        } else {
            ctx.write_register("MODEM_DSSS0_DSSS0", None, &unused_field())?;
            ctx.write_register("MODEM_CTRL0_DSSSLEN", None, &unused_field())
        }
    })
    .writes(["MODEM_CTRL0_CODING", "MODEM_DSSS0_DSSS0", "MODEM_CTRL0_DSSSLEN"])
}

fn calc_shaping_filter_mode() -> CalcUnit {
    CalcUnit::new("calc_shaping_filter_mode", |ctx| {
        let mode = shaping_filter(ctx)?.mode();
        ctx.set("shaping_filter_mode", mode)?;
        ctx.write_field("MODEM_CTRL0_SHAPING", mode)
    })
}

fn calc_shaping_filter_coeffs() -> CalcUnit {
    CalcUnit::new("calc_shaping_filter_coeffs", |ctx| {
        let taps = match shaping_filter(ctx)? {
            ShapingFilter::None => None,
            ShapingFilter::Gaussian => {
                let bt = ctx.get_float("shaping_filter_param")?;
                if bt <= 0.0 {
                    return Err(CalcError::domain(format!("Gaussian BT must be positive, got {bt}")));
                }
                Some(gaussian_taps(bt))
            }
            ShapingFilter::RaisedCosine => {
                let rolloff = ctx.get_float("shaping_filter_param")?;
                if !(0.0..=1.0).contains(&rolloff) {
                    return Err(CalcError::domain(format!(
                        "raised-cosine roll-off must be within 0..1, got {rolloff}"
                    )));
                }
                Some(raised_cosine_taps(rolloff))
            }
            ShapingFilter::CustomOqpsk => Some(half_sine_taps()),
        };

        match taps {
            Some(taps) => {
                for (field, tap) in SHAPING_COEFFS.iter().zip(taps) {
                    ctx.write_register(field, Some(tap), &WritePolicy::new().saturate())?;
                }
            }
            None => {
                for field in SHAPING_COEFFS {
                    ctx.write_register(field, None, &unused_field())?;
                }
            }
        }
        Ok(())
    })
    .writes(SHAPING_COEFFS)
}

/// Overall gain of the symmetric seven-tap shaping filter. A bypassed
/// filter (mode 0) has a fixed gain and its coefficients are not read.
fn calc_shaping_filter_gain_actual() -> CalcUnit {
    CalcUnit::new("calc_shaping_filter_gain_actual", |ctx| {
        let gain = if ctx.get_int("shaping_filter_mode")? == 0 {
            UNSHAPED_GAIN
        } else {
            let mut taps = [0i64; 4];
            for (tap, field) in taps.iter_mut().zip(SHAPING_COEFFS) {
                *tap = ctx.get_int(field)?;
            }
            2 * (taps[0] + taps[1] + taps[2]) + taps[3]
        };
        ctx.set("shaping_filter_gain_actual", gain)
    })
}

fn calc_txbr_reg() -> CalcUnit {
    CalcUnit::new("calc_txbr_reg", |ctx| {
        let baud = ctx.get_int("baudrate")?;
        let xtal = ctx.get_int("xtal_frequency_hz")?;
        if baud <= 0 {
            return Err(CalcError::domain(format!("baud rate must be positive, got {baud}")));
        }
        let (num, den) = txbr_ratio(xtal as f64 / (8.0 * baud as f64));
        ctx.write_register("MODEM_TXBR_TXBRNUM", Some(num), &WritePolicy::new().saturate())?;
        ctx.write_field("MODEM_TXBR_TXBRDEN", den)
    })
    .writes(["MODEM_TXBR_TXBRNUM", "MODEM_TXBR_TXBRDEN"])
}

fn calc_tx_baud_rate_actual() -> CalcUnit {
    CalcUnit::new("calc_tx_baud_rate_actual", |ctx| {
        let num = ctx.get_int("MODEM_TXBR_TXBRNUM")?;
        let den = ctx.get_int("MODEM_TXBR_TXBRDEN")?;
        let xtal = ctx.get_int("xtal_frequency_hz")?;
        let actual = if num == 0 {
            0.0
        } else {
            xtal as f64 * den as f64 / (8.0 * num as f64)
        };
        ctx.set("tx_baud_rate_actual", actual)
    })
}

fn calc_modindex_reg() -> CalcUnit {
    CalcUnit::new("calc_modindex_reg", |ctx| {
        if !modulation(ctx)?.is_fsk() {
            ctx.write_register("MODEM_MODINDEX_MODINDEXM", None, &unused_field())?;
            ctx.write_register("MODEM_MODINDEX_MODINDEXE", None, &unused_field())?;
            return ctx.set("modulation_index", 0.0);
        }
        let deviation = ctx.get_int("deviation")?;
        let baud = ctx.get_int("baudrate")?;
        let res = ctx.get_float("synth_res")?;
        let steps = if res > 0.0 { deviation as f64 / res } else { 0.0 };
        let (m, e) = mantissa_exponent(ctx, steps);
        ctx.write_field("MODEM_MODINDEX_MODINDEXM", m)?;
        ctx.write_field("MODEM_MODINDEX_MODINDEXE", e)?;
        let index = if baud > 0 { 2.0 * deviation as f64 / baud as f64 } else { 0.0 };
        ctx.set("modulation_index", index)
    })
}

/// Split `steps` into a 5-bit mantissa and 5-bit exponent.
fn mantissa_exponent(ctx: &mut CalcContext<'_>, steps: f64) -> (i64, i64) {
    for e in 0..32 {
        let m = (steps / f64::from(1u32 << e)).round() as i64;
        if m <= 31 {
            return (m.max(0), e);
        }
    }
    ctx.warn(
        Some("MODEM_MODINDEX_MODINDEXM"),
        format!("deviation of {steps:.0} synthesizer steps saturated"),
    );
    (31, 31)
}

/// Best `num/den` approximation of `ratio` with a 16-bit numerator and
/// 8-bit denominator. Ties go to the smaller denominator.
pub(crate) fn txbr_ratio(ratio: f64) -> (i64, i64) {
    let mut best = ((ratio.round() as i64).max(1), 1);
    let mut best_err = (best.0 as f64 - ratio).abs();
    for den in 2..=255i64 {
        let num = (ratio * den as f64).round() as i64;
        if num > 0xFFFF {
            break;
        }
        let err = (num as f64 / den as f64 - ratio).abs();
        if err < best_err {
            best = (num, den);
            best_err = err;
        }
    }
    best
}

/// Tap times, in symbols, of the four stored coefficients. The last one is
/// the center tap.
fn tap_times() -> impl Iterator<Item = f64> {
    (0..4).map(|i| (f64::from(i) - 3.0) * 0.25)
}

fn scale_taps(values: impl Iterator<Item = f64>) -> [i64; 4] {
    let mut taps = [0i64; 4];
    for (tap, v) in taps.iter_mut().zip(values) {
        *tap = (127.0 * v).round() as i64;
    }
    taps
}

pub(crate) fn gaussian_taps(bt: f64) -> [i64; 4] {
    let sigma = LN_2.sqrt() / (2.0 * PI * bt);
    scale_taps(tap_times().map(|t| (-(t * t) / (2.0 * sigma * sigma)).exp()))
}

pub(crate) fn raised_cosine_taps(rolloff: f64) -> [i64; 4] {
    scale_taps(tap_times().map(|t| {
        if t == 0.0 {
            return 1.0;
        }
        let sinc = (PI * t).sin() / (PI * t);
        let denom = 1.0 - (2.0 * rolloff * t).powi(2);
        if denom.abs() < 1e-9 {
            PI / 4.0 * sinc
        } else {
            sinc * (PI * rolloff * t).cos() / denom
        }
    }))
}

pub(crate) fn half_sine_taps() -> [i64; 4] {
    scale_taps((1..=4).map(|i| (PI / 2.0 * f64::from(i) / 4.0).sin()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txbr_ratio_exact_cases() {
        assert_eq!(txbr_ratio(48.0), (48, 1));
        assert_eq!(txbr_ratio(2.4), (12, 5));
        assert_eq!(txbr_ratio(62.5), (125, 2));
    }

    #[test]
    fn txbr_ratio_huge_keeps_unit_denominator() {
        let (num, den) = txbr_ratio(4_800_000.0);
        assert_eq!(den, 1);
        assert_eq!(num, 4_800_000);
    }

    #[test]
    fn shaping_taps() {
        assert_eq!(gaussian_taps(0.5), [2, 21, 81, 127]);
        assert_eq!(half_sine_taps(), [49, 90, 117, 127]);
        let rc = raised_cosine_taps(0.5);
        assert_eq!(rc[3], 127);
        assert!(rc[0] < rc[1] && rc[1] < rc[2]);
    }
}

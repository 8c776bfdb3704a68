//! Frame format: preamble, sync word, bit order and FEC.

use phycalc_engine::{CalcError, CalcUnit, WritePolicy};
use phycalc_model::{Model, ModelError, VarFormat, VariableSpec};

use super::enums::BitEndian;
use super::{bit_endian, input, register_all};
use crate::calculator::Calculator;

#[derive(Debug, Default)]
pub struct CalcFrame;

impl Calculator for CalcFrame {
    fn name(&self) -> &str {
        "frame"
    }

    fn build_variables(&self, model: &mut Model) -> Result<(), ModelError> {
        register_all(
            model,
            [
                input(VariableSpec::int("preamble_length")).describe("Preamble length in bits"),
                input(VariableSpec::int("preamble_pattern").format(VarFormat::Hex)),
                input(VariableSpec::int("preamble_pattern_len")),
                input(VariableSpec::int("syncword_0").format(VarFormat::Hex)),
                input(VariableSpec::int("syncword_length")),
                input(VariableSpec::enumerated("frame_bitendian", BitEndian::MODEL_NAME)),
            ],
        )
    }

    fn units(&self) -> Vec<CalcUnit> {
        vec![
            calc_preamble_regs(),
            calc_syncword_regs(),
            calc_frame_bitorder(),
            calc_fec_reg(),
        ]
    }
}

fn calc_preamble_regs() -> CalcUnit {
    CalcUnit::new("calc_preamble_regs", |ctx| {
        let length = ctx.get_int("preamble_length")?;
        let pattern = ctx.get_int("preamble_pattern")?;
        let pattern_len = ctx.get_int("preamble_pattern_len")?;
        if !(1..=4).contains(&pattern_len) {
            return Err(CalcError::domain(format!(
                "preamble_pattern_len must be 1 to 4 bits, got {pattern_len}"
            )));
        }
        if length % pattern_len != 0 {
            return Err(CalcError::domain(format!(
                "preamble length {length} is not a whole number of {pattern_len}-bit patterns"
            )));
        }
        if !(0..1 << pattern_len).contains(&pattern) {
            return Err(CalcError::domain(format!(
                "preamble pattern 0x{pattern:X} does not fit in {pattern_len} bits"
            )));
        }
        ctx.write_field("MODEM_PRE_BASE", pattern)?;
        ctx.write_field("MODEM_PRE_BASEBITS", pattern_len - 1)?;
        ctx.write_register(
            "MODEM_PRE_TXBASES",
            Some(length / pattern_len),
            &WritePolicy::new().saturate(),
        )
    })
    .writes(["MODEM_PRE_BASE", "MODEM_PRE_BASEBITS", "MODEM_PRE_TXBASES"])
}

/// The modem shifts the sync word out LSB first; an MSB-first frame has
/// it stored bit-reversed.
fn calc_syncword_regs() -> CalcUnit {
    CalcUnit::new("calc_syncword_regs", |ctx| {
        let word = ctx.get_int("syncword_0")?;
        let length = ctx.get_int("syncword_length")?;
        if !(2..=32).contains(&length) {
            return Err(CalcError::domain(format!(
                "syncword_length must be 2 to 32 bits, got {length}"
            )));
        }
        let word = word & ((1i64 << length) - 1);
        let stored = match bit_endian(ctx)? {
            BitEndian::LsbFirst => word,
            BitEndian::MsbFirst => reverse_bits(word, length),
        };
        ctx.write_field("MODEM_SYNC0_SYNC0", stored)?;
        ctx.write_field("MODEM_CTRL1_SYNCBITS", length - 1)
    })
    .writes(["MODEM_SYNC0_SYNC0", "MODEM_CTRL1_SYNCBITS"])
}

fn calc_frame_bitorder() -> CalcUnit {
    CalcUnit::new("calc_frame_bitorder", |ctx| {
        let order = bit_endian(ctx)?;
        ctx.write_field("FRC_CTRL_BITORDER", order.value())
    })
}

fn calc_fec_reg() -> CalcUnit {
    CalcUnit::new("calc_fec_reg", |ctx| {
        let mode = i64::from(ctx.get_bool("fec_enabled")?);
        ctx.write_field("FRC_FECCTRL_CONVMODE", mode)
    })
}

pub(crate) fn reverse_bits(value: i64, width: i64) -> i64 {
    (0..width).fold(0, |acc, i| acc | (((value >> i) & 1) << (width - 1 - i)))
}

//! Build targets of the reference family.

use phycalc_engine::{CalcContext, CalcError};

use crate::target::Target;

pub const TARGET_IC: &str = "IC";
pub const TARGET_FPGA: &str = "FPGA";

pub fn ic_target() -> Target {
    Target::new(TARGET_IC, "ic").describe("Production silicon")
}

pub fn fpga_target() -> Target {
    Target::new(TARGET_FPGA, "fpga")
        .describe("FPGA emulation of the digital modem")
        .with_calculate(fpga_calculate)
}

/// The emulated front end has no gain control loop.
fn fpga_calculate(ctx: &mut CalcContext<'_>) -> Result<(), CalcError> {
    ctx.write_field("AGC_CTRL0_MODE", 1)
}

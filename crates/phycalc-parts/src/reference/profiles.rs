//! Profiles of the reference family.

use phycalc_compose::{Profile, ProfileInput};
use phycalc_engine::{CalcContext, CalcError};

use super::enums::{BitEndian, ShapingFilter, SymbolEncoding};

pub const PROFILE_BASE: &str = "Base";

/// Reports how far the synthesizer lands from the requested frequency once
/// every calculator has run.
fn base_profile_calculate(ctx: &mut CalcContext<'_>) -> Result<(), CalcError> {
    let requested = ctx.get_int("base_frequency_hz")?;
    let actual = ctx.get_int("synth_freq_actual_hz")?;
    ctx.set("synth_freq_error_hz", actual - requested)
}

pub fn base_profile() -> Profile {
    Profile::new(PROFILE_BASE, "General purpose packet PHYs")
        .with_input(ProfileInput::required("base_frequency_hz").describe("Channel 0 center frequency"))
        .with_input(ProfileInput::required("channel_spacing_hz"))
        .with_input(ProfileInput::required("bitrate"))
        .with_input(ProfileInput::required("modulation_type"))
        .with_input(ProfileInput::optional("deviation", 0i64))
        .with_input(ProfileInput::optional("symbol_encoding", SymbolEncoding::Nrz.value()))
        .with_input(ProfileInput::optional("shaping_filter", ShapingFilter::Gaussian.value()))
        .with_input(ProfileInput::optional("shaping_filter_param", 0.5))
        .with_input(ProfileInput::optional("fec_enabled", false))
        .with_input(ProfileInput::optional("preamble_length", 40i64))
        .with_input(ProfileInput::optional("preamble_pattern", 0b10i64))
        .with_input(ProfileInput::optional("preamble_pattern_len", 2i64))
        .with_input(ProfileInput::optional("syncword_0", 0xF68Di64))
        .with_input(ProfileInput::optional("syncword_length", 16i64))
        .with_input(ProfileInput::optional("frame_bitendian", BitEndian::LsbFirst.value()))
        .with_input(ProfileInput::advanced("xtal_frequency_hz", 38_400_000i64))
        .with_input(ProfileInput::advanced("freq_offset_hz", 0i64))
        .with_input(ProfileInput::advanced("dsss_spreading_factor", 0i64))
        .with_input(ProfileInput::advanced("dsss_chipping_code", 0i64))
        .with_input(ProfileInput::advanced("dsss_len", 0i64))
        .with_input(ProfileInput::advanced("agc_power_target", -8i64))
        .with_input(ProfileInput::advanced("rssi_period", 3i64))
        .with_input(
            ProfileInput::optional("agc_fast_loop", false)
                .deprecated()
                .describe("Ignored; the loop step follows the baud rate"),
        )
        .with_output("tx_baud_rate_actual")
        .with_output("rf_band")
        .with_output("synth_freq_actual_hz")
        .with_output("channel_spacing_actual_hz")
        .with_calculate(base_profile_calculate)
}

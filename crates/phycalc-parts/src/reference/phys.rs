//! PHY library of the reference family.

use phycalc_compose::{BuildContext, ComposeError, PhyDef};
use phycalc_model::{Model, PhyHandle};

use super::profiles::PROFILE_BASE;
use crate::part::PhyRoutine;

pub const GROUP_BASE: &str = "Base";
pub const GROUP_IEEE802154: &str = "IEEE802154";

type PhyResult = Result<PhyHandle, ComposeError>;

pub const LIBRARY: &[PhyRoutine] = &[
    PhyRoutine::new("PHY_Base_2FSK_100kbps", GROUP_BASE, phy_base_2fsk_100kbps),
    PhyRoutine::new("PHY_Base_4FSK_200kbps", GROUP_BASE, phy_base_4fsk_200kbps),
    PhyRoutine::new("PHY_Base_2FSK_Manchester_38p4kbps", GROUP_BASE, phy_base_2fsk_manchester_38p4kbps),
    PhyRoutine::new("PHY_Base_OOK_4p8kbps", GROUP_BASE, phy_base_ook_4p8kbps),
    PhyRoutine::new("PHY_Base_2FSK_169MHz_2p4kbps", GROUP_BASE, phy_base_2fsk_169mhz_2p4kbps),
    PhyRoutine::new("PHY_IEEE802154_2p4GHz", GROUP_IEEE802154, phy_ieee802154_2p4ghz),
    PhyRoutine::new("PHY_IEEE802154_2p4GHz_prod", GROUP_IEEE802154, phy_ieee802154_2p4ghz_prod),
];

/// Preamble and sync word shared by the FSK PHYs. Run on its own it makes
/// a PHY of its own; nested, it extends the caller's.
pub fn frame_common_fsk(ctx: &mut BuildContext, model: &mut Model) -> PhyResult {
    let def = PhyDef::new("PHY_Frame_Common_FSK", PROFILE_BASE);
    ctx.define(model, &def, |_, model, phy| {
        model
            .phy_mut(phy)?
            .set_input("preamble_length", 40i64)
            .set_input("preamble_pattern", 0b10i64)
            .set_input("preamble_pattern_len", 2i64)
            .set_input("syncword_0", 0xF68Di64)
            .set_input("syncword_length", 16i64);
        Ok(())
    })
}

pub fn phy_base_2fsk_100kbps(ctx: &mut BuildContext, model: &mut Model) -> PhyResult {
    let def = PhyDef::new("PHY_Base_2FSK_100kbps", PROFILE_BASE)
        .group(GROUP_BASE)
        .readable("2FSK 100 kbps, 915 MHz")
        .tag("fsk");
    ctx.define(model, &def, |ctx, model, phy| {
        model
            .phy_mut(phy)?
            .set_input("base_frequency_hz", 915_000_000i64)
            .set_input("channel_spacing_hz", 400_000i64)
            .set_input("bitrate", 100_000i64)
            .set_input("deviation", 50_000i64)
            .set_input("modulation_type", "FSK2");
        frame_common_fsk(ctx, model)?;
        Ok(())
    })
}

pub fn phy_base_4fsk_200kbps(ctx: &mut BuildContext, model: &mut Model) -> PhyResult {
    let def = PhyDef::new("PHY_Base_4FSK_200kbps", PROFILE_BASE)
        .group(GROUP_BASE)
        .readable("4FSK 200 kbps, 915 MHz")
        .tag("fsk");
    ctx.define(model, &def, |ctx, model, phy| {
        model
            .phy_mut(phy)?
            .set_input("base_frequency_hz", 915_000_000i64)
            .set_input("channel_spacing_hz", 600_000i64)
            .set_input("bitrate", 200_000i64)
            .set_input("deviation", 33_300i64)
            .set_input("modulation_type", "FSK4");
        frame_common_fsk(ctx, model)?;
        Ok(())
    })
}

pub fn phy_base_2fsk_manchester_38p4kbps(ctx: &mut BuildContext, model: &mut Model) -> PhyResult {
    let def = PhyDef::new("PHY_Base_2FSK_Manchester_38p4kbps", PROFILE_BASE)
        .group(GROUP_BASE)
        .readable("2FSK 38.4 kbps Manchester, 868 MHz")
        .tag("fsk");
    ctx.define(model, &def, |ctx, model, phy| {
        frame_common_fsk(ctx, model)?;
        model
            .phy_mut(phy)?
            .set_input("base_frequency_hz", 868_300_000i64)
            .set_input("channel_spacing_hz", 200_000i64)
            .set_input("bitrate", 38_400i64)
            .set_input("deviation", 20_000i64)
            .set_input("modulation_type", "FSK2")
            .set_input("symbol_encoding", "Manchester")
            .set_input("frame_bitendian", "MSB_FIRST");
        Ok(())
    })
}

pub fn phy_base_ook_4p8kbps(ctx: &mut BuildContext, model: &mut Model) -> PhyResult {
    let def = PhyDef::new("PHY_Base_OOK_4p8kbps", PROFILE_BASE)
        .group(GROUP_BASE)
        .readable("OOK 4.8 kbps, 433.92 MHz");
    ctx.define(model, &def, |_, model, phy| {
        model
            .phy_mut(phy)?
            .set_input("base_frequency_hz", 433_920_000i64)
            .set_input("channel_spacing_hz", 200_000i64)
            .set_input("bitrate", 4_800i64)
            .set_input("modulation_type", "OOK")
            .set_input("shaping_filter", "NONE")
            .set_input("preamble_length", 32i64);
        Ok(())
    })
}

pub fn phy_base_2fsk_169mhz_2p4kbps(ctx: &mut BuildContext, model: &mut Model) -> PhyResult {
    let def = PhyDef::new("PHY_Base_2FSK_169MHz_2p4kbps", PROFILE_BASE)
        .group(GROUP_BASE)
        .readable("2FSK 2.4 kbps with FEC, 169 MHz")
        .tag("fsk")
        .tag("fec")
        .tag("-fpga");
    ctx.define(model, &def, |ctx, model, phy| {
        model
            .phy_mut(phy)?
            .set_input("base_frequency_hz", 169_406_250i64)
            .set_input("channel_spacing_hz", 12_500i64)
            .set_input("bitrate", 2_400i64)
            .set_input("deviation", 2_400i64)
            .set_input("modulation_type", "FSK2")
            .set_input("fec_enabled", true)
            .set_input("shaping_filter", "Raised_Cosine")
            .set_input("shaping_filter_param", 0.5);
        frame_common_fsk(ctx, model)?;
        Ok(())
    })
}

/// IEEE 802.15.4 SHR: eight zero symbols then the 0xA7 delimiter.
pub fn frame_ieee802154(ctx: &mut BuildContext, model: &mut Model) -> PhyResult {
    let def = PhyDef::new("PHY_IEEE802154_Frame", PROFILE_BASE);
    ctx.define(model, &def, |_, model, phy| {
        model
            .phy_mut(phy)?
            .set_input("preamble_length", 32i64)
            .set_input("preamble_pattern", 0i64)
            .set_input("preamble_pattern_len", 4i64)
            .set_input("syncword_0", 0xA7i64)
            .set_input("syncword_length", 8i64);
        Ok(())
    })
}

pub fn phy_ieee802154_2p4ghz(ctx: &mut BuildContext, model: &mut Model) -> PhyResult {
    let def = PhyDef::new("PHY_IEEE802154_2p4GHz", PROFILE_BASE)
        .group(GROUP_IEEE802154)
        .readable("IEEE 802.15.4 O-QPSK 250 kbps, 2.4 GHz")
        .describe("Channel 11 at 2405 MHz, 5 MHz spacing");
    ctx.define(model, &def, |ctx, model, phy| {
        model
            .phy_mut(phy)?
            .set_input("base_frequency_hz", 2_405_000_000i64)
            .set_input("channel_spacing_hz", 5_000_000i64)
            .set_input("bitrate", 250_000i64)
            .set_input("modulation_type", "OQPSK")
            .set_input("symbol_encoding", "DSSS")
            .set_input("dsss_spreading_factor", 8i64)
            .set_input("dsss_chipping_code", 0x744A_C39Bi64)
            .set_input("dsss_len", 32i64)
            .set_input("shaping_filter", "Custom_OQPSK");
        frame_ieee802154(ctx, model)?;
        Ok(())
    })
}

/// Production variant: the design PHY plus a lower AGC target.
pub fn phy_ieee802154_2p4ghz_prod(ctx: &mut BuildContext, model: &mut Model) -> PhyResult {
    let def = PhyDef::new("PHY_IEEE802154_2p4GHz_prod", PROFILE_BASE)
        .group(GROUP_IEEE802154)
        .readable("IEEE 802.15.4 2.4 GHz (production)")
        .tag("prod");
    ctx.define(model, &def, |ctx, model, phy| {
        phy_ieee802154_2p4ghz(ctx, model)?;
        model.phy_mut(phy)?.set_override("AGC_CTRL0_PWRTARGET", -12i64);
        Ok(())
    })
}

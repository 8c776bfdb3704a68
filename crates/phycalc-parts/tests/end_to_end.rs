//! End-to-end PHY calculations on the reference family.

use indexmap::IndexMap;
use phycalc_compose::{BuildContext, ComposeError, PhyDef};
use phycalc_engine::EngineError;
use phycalc_model::{phy_guid, Model, PhyHandle, Severity, Value};
use phycalc_parts::reference::profiles::PROFILE_BASE;
use phycalc_parts::{load_part, CalculatedPhy, Configurator, PartsError, PhyRoutine};

fn configurator(revision: &str) -> Configurator {
    Configurator::for_part("reference", revision).unwrap()
}

fn calc(c: &Configurator, name: &str) -> CalculatedPhy {
    c.calculate_phy(name, &IndexMap::new()).unwrap()
}

fn int(model: &Model, name: &str) -> i64 {
    model.value(name).unwrap().and_then(Value::as_int).unwrap()
}

fn float(model: &Model, name: &str) -> f64 {
    model.value(name).unwrap().and_then(Value::as_float).unwrap()
}

fn dnc(model: &Model, name: &str) -> bool {
    model.get(name).unwrap().is_do_not_care()
}

#[test]
fn whole_library_calculates_on_every_revision() {
    for revision in ["A0", "B0"] {
        let c = configurator(revision);
        let results = c.sweep_all();
        assert_eq!(results.len(), c.phy_names().len());
        for result in results {
            if let Err(err) = &result.outcome {
                panic!("{revision} {}: {err}", result.phy);
            }
        }
    }
}

#[test]
fn fsk_100kbps_registers() {
    let c = configurator("A0");
    let calc = calc(&c, "PHY_Base_2FSK_100kbps");
    let m = &calc.model;

    assert_eq!(int(m, "MODEM_CTRL0_MODFORMAT"), 0);
    assert_eq!(int(m, "MODEM_CTRL0_CODING"), 0);
    assert_eq!(int(m, "MODEM_CTRL0_SHAPING"), 1);
    assert_eq!(int(m, "MODEM_TXBR_TXBRNUM"), 48);
    assert_eq!(int(m, "MODEM_TXBR_TXBRDEN"), 1);
    assert_eq!(float(m, "tx_baud_rate_actual"), 100_000.0);
    assert_eq!(int(m, "MODEM_MODINDEX_MODINDEXM"), 21);
    assert_eq!(int(m, "MODEM_MODINDEX_MODINDEXE"), 6);
    assert_eq!(int(m, "MODEM_MODINDEX_FREQGAINM"), 2);
    assert_eq!(int(m, "MODEM_MODINDEX_FREQGAINE"), 0);
    assert_eq!(float(m, "freq_gain_actual"), 8.0);
    assert_eq!(int(m, "shaping_filter_gain_actual"), 2 * (2 + 21 + 81) + 127);

    assert_eq!(int(m, "SYNTH_DIVCTRL_LODIVFREQCTRL"), 2);
    assert_eq!(int(m, "SYNTH_FREQ_FREQ"), 24_974_677);
    assert_eq!(int(m, "SYNTH_IFFREQ_IFFREQ"), 10_923);
    assert_eq!(int(m, "SYNTH_CHSP_CHSP"), 10_923);
    assert_eq!(int(m, "channel_spacing_actual_hz"), 400_012);
    assert_eq!(int(m, "synth_freq_actual_hz"), 914_999_988);
    assert_eq!(int(m, "synth_freq_error_hz"), -12);
    assert_eq!(m.value("rf_band").unwrap(), Some(&Value::Text("868-915MHz".into())));

    assert_eq!(int(m, "MODEM_PRE_BASE"), 0b10);
    assert_eq!(int(m, "MODEM_PRE_BASEBITS"), 1);
    assert_eq!(int(m, "MODEM_PRE_TXBASES"), 20);
    assert_eq!(int(m, "MODEM_SYNC0_SYNC0"), 0xF68D);
    assert_eq!(int(m, "MODEM_CTRL1_SYNCBITS"), 15);

    assert_eq!(int(m, "AGC_CTRL0_PWRTARGET"), 248);
    assert_eq!(int(m, "AGC_GAINSTEPLIM_CFLOOPSTEPMAX"), 4);

    // DSSS is unused: fields stay at reset and are marked don't-care
    assert!(dnc(m, "MODEM_DSSS0_DSSS0"));
    assert!(dnc(m, "MODEM_CTRL0_DSSSLEN"));
    assert!(!dnc(m, "MODEM_CTRL0_MODFORMAT"));
}

#[test]
fn producers_run_before_consumers() {
    let calc = calc(&configurator("A0"), "PHY_Base_2FSK_100kbps");
    let order = &calc.report.order;
    let pos = |unit: &str| order.iter().position(|u| u == unit).unwrap();
    assert!(pos("calc_bitrate_gross") < pos("calc_baudrate"));
    assert!(pos("calc_baudrate") < pos("calc_txbr_reg"));
    assert!(pos("calc_txbr_reg") < pos("calc_tx_baud_rate_actual"));
    assert!(pos("calc_rf_band") < pos("calc_synth_res"));
    assert!(pos("calc_synth_res") < pos("calc_modindex_reg"));
    assert!(pos("calc_freq_gain_target") < pos("calc_freq_gain_reg"));
    assert_eq!(calc.model.calc_order(), order.as_slice());
}

#[test]
fn repeated_runs_are_identical() {
    let c = configurator("B0");
    let a = calc(&c, "PHY_IEEE802154_2p4GHz");
    let b = calc(&c, "PHY_IEEE802154_2p4GHz");
    assert_eq!(a.report.order, b.report.order);
    for var in a.model.variables() {
        assert_eq!(var.value(), b.model.get(var.name()).unwrap().value(), "{}", var.name());
    }
}

#[test]
fn ieee802154_registers() {
    let c = configurator("B0");
    let m = calc(&c, "PHY_IEEE802154_2p4GHz").model;

    assert_eq!(int(&m, "baudrate"), 2_000_000);
    assert_eq!(int(&m, "MODEM_CTRL0_MODFORMAT"), 4);
    assert_eq!(int(&m, "MODEM_CTRL0_CODING"), 2);
    assert_eq!(int(&m, "MODEM_DSSS0_DSSS0"), 0x744A_C39B);
    assert_eq!(int(&m, "MODEM_CTRL0_DSSSLEN"), 31);
    assert_eq!(int(&m, "MODEM_TXBR_TXBRNUM"), 12);
    assert_eq!(int(&m, "MODEM_TXBR_TXBRDEN"), 5);
    assert_eq!(int(&m, "SYNTH_FREQ_FREQ"), 32_817_562);
    assert_eq!(int(&m, "SYNTH_IFFREQ_IFFREQ"), 18_705);
    assert_eq!(int(&m, "SYNTH_CHSP_CHSP"), 68_267);
    assert_eq!(int(&m, "MODEM_DIGMIX_DIGMIXFREQ"), 37_410);
    assert_eq!(int(&m, "MODEM_PRE_TXBASES"), 8);
    assert_eq!(int(&m, "MODEM_SYNC0_SYNC0"), 0xA7);
    assert_eq!(int(&m, "AGC_GAINSTEPLIM_CFLOOPSTEPMAX"), 16);
    assert_eq!(int(&m, "shaping_filter_gain_actual"), 2 * (49 + 90 + 117) + 127);
    // no frequency swing: discriminator gain unused
    assert!(dnc(&m, "MODEM_MODINDEX_FREQGAINM"));
    assert!(dnc(&m, "MODEM_MODINDEX_MODINDEXM"));
}

#[test]
fn manchester_msb_first_reverses_sync_word() {
    let m = calc(&configurator("A0"), "PHY_Base_2FSK_Manchester_38p4kbps").model;
    assert_eq!(int(&m, "bitrate_gross"), 76_800);
    assert_eq!(int(&m, "MODEM_CTRL0_CODING"), 1);
    assert_eq!(int(&m, "MODEM_SYNC0_SYNC0"), 0xB16F);
    assert_eq!(int(&m, "FRC_CTRL_BITORDER"), 1);
    assert_eq!((int(&m, "MODEM_TXBR_TXBRNUM"), int(&m, "MODEM_TXBR_TXBRDEN")), (125, 2));
}

#[test]
fn bypassed_shaping_filter_has_fixed_gain() {
    let m = calc(&configurator("A0"), "PHY_Base_OOK_4p8kbps").model;
    assert_eq!(int(&m, "MODEM_CTRL0_SHAPING"), 0);
    assert_eq!(int(&m, "shaping_filter_gain_actual"), 127);
    for coeff in ["MODEM_SHAPING0_COEFF0", "MODEM_SHAPING0_COEFF3"] {
        assert!(dnc(&m, coeff));
    }
    assert_eq!(int(&m, "MODEM_CTRL0_MODFORMAT"), 6);
}

#[test]
fn revision_layer_wins_over_common_calculator() {
    let a0 = calc(&configurator("A0"), "PHY_IEEE802154_2p4GHz").model;
    let b0 = calc(&configurator("B0"), "PHY_IEEE802154_2p4GHz").model;
    assert_eq!(int(&a0, "AGC_CTRL0_PWRTARGET"), 248); // -8 dBm
    assert_eq!(int(&b0, "AGC_CTRL0_PWRTARGET"), 246); // -10 dBm
    assert!(!a0.contains("MODEM_DIGMIX_DIGMIXFREQ"));
}

#[test]
fn production_phy_aliases_design_phy() {
    let c = configurator("B0");
    let calc = calc(&c, "PHY_IEEE802154_2p4GHz_prod");
    assert_eq!(calc.phy.name, "PHY_IEEE802154_2p4GHz_prod");
    assert_eq!(calc.phy.points_to.as_deref(), Some("PHY_IEEE802154_2p4GHz"));
    assert_eq!(calc.model.phys().len(), 1);

    // -12 dBm override stored as two's complement, forced over B0's write
    let target = calc.model.get("AGC_CTRL0_PWRTARGET").unwrap();
    assert_eq!(target.forced_value(), Some(&Value::Int(244)));
    assert!(calc
        .model
        .diagnostics()
        .iter()
        .any(|d| d.severity == Severity::Warning && d.variable.as_deref() == Some("AGC_CTRL0_PWRTARGET")));
}

#[test]
fn nested_frame_routine_extends_outer_phy() {
    let phy = configurator("A0").describe("PHY_Base_2FSK_100kbps").unwrap();
    assert_eq!(phy.name, "PHY_Base_2FSK_100kbps");
    assert_eq!(phy.inputs.get("preamble_length"), Some(&Value::Int(40)));
    assert_eq!(phy.inputs.get("bitrate"), Some(&Value::Int(100_000)));
    assert!(phy.points_to.is_none());
}

#[test]
fn lookup_by_guid() {
    let c = configurator("A0");
    let guid = phy_guid("PHY_Base_OOK_4p8kbps").to_uppercase();
    let calc = c.calculate_phy(&guid, &IndexMap::new()).unwrap();
    assert_eq!(calc.phy.name, "PHY_Base_OOK_4p8kbps");
    assert_eq!(calc.phy.guid, phy_guid("PHY_Base_OOK_4p8kbps"));
}

#[test]
fn caller_inputs_override_phy_bindings() {
    let c = configurator("A0");
    let mut inputs = IndexMap::new();
    inputs.insert("bitrate".to_string(), Value::Int(50_000));
    let m = c.calculate_phy("PHY_Base_2FSK_100kbps", &inputs).unwrap().model;
    assert_eq!(int(&m, "MODEM_TXBR_TXBRNUM"), 96);

    inputs.insert("no_such_input".to_string(), Value::Int(1));
    let err = c.calculate_phy("PHY_Base_2FSK_100kbps", &inputs).unwrap_err();
    assert!(matches!(
        err,
        PartsError::Compose(ComposeError::InvalidOverride { ref input, .. }) if input == "no_such_input"
    ));
}

// --- custom PHYs exercising failure and correction paths ---

fn phy_out_of_band(ctx: &mut BuildContext, model: &mut Model) -> Result<PhyHandle, ComposeError> {
    ctx.define(model, &PhyDef::new("PHY_Test_OutOfBand", PROFILE_BASE).group("Test"), |_, model, phy| {
        model
            .phy_mut(phy)?
            .set_input("base_frequency_hz", 1_500_000_000i64)
            .set_input("channel_spacing_hz", 100_000i64)
            .set_input("bitrate", 10_000i64)
            .set_input("deviation", 5_000i64)
            .set_input("modulation_type", "FSK2");
        Ok(())
    })
}

fn phy_no_bitrate(ctx: &mut BuildContext, model: &mut Model) -> Result<PhyHandle, ComposeError> {
    ctx.define(model, &PhyDef::new("PHY_Test_NoBitrate", PROFILE_BASE).group("Test"), |_, model, phy| {
        model
            .phy_mut(phy)?
            .set_input("base_frequency_hz", 915_000_000i64)
            .set_input("channel_spacing_hz", 100_000i64)
            .set_input("modulation_type", "FSK2");
        Ok(())
    })
}

fn phy_corrections(ctx: &mut BuildContext, model: &mut Model) -> Result<PhyHandle, ComposeError> {
    ctx.define(model, &PhyDef::new("PHY_Test_Corrections", PROFILE_BASE).group("Test"), |_, model, phy| {
        model
            .phy_mut(phy)?
            .set_input("base_frequency_hz", 915_000_000i64)
            .set_input("channel_spacing_hz", 400_000i64)
            .set_input("bitrate", 100_000i64)
            .set_input("deviation", 50_000i64)
            .set_input("modulation_type", "FSK2")
            .set_input("rssi_period", 40i64)
            .set_input("agc_fast_loop", true)
            .set_override("SYNTH_CHSP_CHSP", 1234i64);
        Ok(())
    })
}

fn test_configurator() -> Configurator {
    let mut part = load_part("reference", "A0").unwrap();
    part.register_phy(PhyRoutine::new("PHY_Test_OutOfBand", "Test", phy_out_of_band));
    part.register_phy(PhyRoutine::new("PHY_Test_NoBitrate", "Test", phy_no_bitrate));
    part.register_phy(PhyRoutine::new("PHY_Test_Corrections", "Test", phy_corrections));
    Configurator::new(part).unwrap()
}

#[test]
fn domain_failure_is_isolated_in_sweep() {
    let c = test_configurator();
    let results = c.sweep(&["PHY_Base_2FSK_100kbps", "PHY_Test_OutOfBand", "PHY_Base_OOK_4p8kbps"]);
    let names: Vec<&str> = results.iter().map(|r| r.phy.as_str()).collect();
    assert_eq!(names, vec!["PHY_Base_2FSK_100kbps", "PHY_Test_OutOfBand", "PHY_Base_OOK_4p8kbps"]);

    assert!(results[0].outcome.is_ok());
    assert!(results[2].outcome.is_ok());
    let err = results[1].outcome.as_ref().unwrap_err();
    assert!(err.is_domain());
    assert!(matches!(err, PartsError::Engine(EngineError::Unit { unit, .. }) if unit == "calc_rf_band"));
}

#[test]
fn missing_required_input_reported() {
    let err = test_configurator()
        .calculate_phy("PHY_Test_NoBitrate", &IndexMap::new())
        .unwrap_err();
    assert!(matches!(
        err,
        PartsError::Compose(ComposeError::MissingRequiredInput { ref inputs, .. }) if inputs == &vec!["bitrate".to_string()]
    ));
}

#[test]
fn soft_corrections_and_forced_fields() {
    let calc = test_configurator()
        .calculate_phy("PHY_Test_Corrections", &IndexMap::new())
        .unwrap();
    let m = &calc.model;

    // limited write: 40 clamped into 1..=15 with one warning
    assert_eq!(int(m, "AGC_CTRL1_RSSIPERIOD"), 15);
    let rssi_warnings = m
        .diagnostics()
        .iter()
        .filter(|d| d.variable.as_deref() == Some("AGC_CTRL1_RSSIPERIOD"))
        .count();
    assert_eq!(rssi_warnings, 1);

    // deprecated input still bound, with a warning
    assert!(m
        .diagnostics()
        .iter()
        .any(|d| d.variable.as_deref() == Some("agc_fast_loop")));

    // forced field survives and feeds the derived output
    assert_eq!(int(m, "SYNTH_CHSP_CHSP"), 1234);
    assert_eq!(int(m, "channel_spacing_actual_hz"), 45_190);
    assert_eq!(calc.report.diagnostics, m.diagnostics().len());
}

#[test]
fn every_unit_recorded_as_executed() {
    let c = configurator("B0");
    let calc = calc(&c, "PHY_IEEE802154_2p4GHz");
    let engine = c.part().engine().unwrap();
    let units: Vec<&str> = engine.units().iter().map(|u| u.name()).collect();
    let recorded: Vec<&str> = calc.report.executed.keys().map(String::as_str).collect();
    assert_eq!(recorded, units);
    assert!(calc.report.executed.values().all(|ran| *ran));
    assert_eq!(calc.model.unit_execution(), &calc.report.executed);
}

#[test]
fn fpga_target_excludes_tagged_phy_and_fixes_gain() {
    let c = configurator("A0").with_target("FPGA").unwrap();
    let err = c
        .calculate_phy("PHY_Base_2FSK_169MHz_2p4kbps", &IndexMap::new())
        .unwrap_err();
    assert!(matches!(err, PartsError::PhyNotSupportedOnTarget { .. }));

    let calc = calc(&c, "PHY_IEEE802154_2p4GHz_prod");
    assert_eq!(int(&calc.model, "AGC_CTRL0_MODE"), 1);
    let error = int(&calc.model, "synth_freq_error_hz");
    assert_eq!(error, int(&calc.model, "synth_freq_actual_hz") - 2_405_000_000);
}

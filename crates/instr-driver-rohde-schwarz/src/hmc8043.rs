//! Rohde & Schwarz HMC8043 Three-Channel Power Supply
//!
//! SCPI over USB-VCP or LAN, `\n` terminated. Most settings apply to the
//! channel selected with `select_output` / `select_channel`; the instrument
//! holds that selection, so it is never tracked here.
//!
//! # Example
//!
//! ```rust,ignore
//! psu.set("select_channel", 2)?;
//! psu.set("voltage", 5.0)?;
//! psu.set("current", 0.1)?;
//! psu.set("output_channel", "ON")?;
//! psu.set("output_master", "ON")?;
//! ```

use instr_core::prelude::*;

/// Maximum programmable voltage per channel.
pub const MAX_VOLTAGE: f64 = 32.05;

/// Current range per channel.
pub const MIN_CURRENT: f64 = 5e-4;
/// Current range per channel.
pub const MAX_CURRENT: f64 = 3.0;

/// Command table of the HMC8043.
pub fn registry() -> Result<ParameterRegistry, RegistrationError> {
    let mut r = ParameterRegistry::new();

    r.register(ParameterSpec::new("identity").label("Identity").get_cmd("*IDN?"))?;
    r.register(ParameterSpec::new("reset").label("Reset").set_cmd("*RST"))?;

    // Channel selection by keyword; `INST:SEL?` answers with the bare number
    r.register(
        ParameterSpec::new("select_output")
            .label("Output")
            .get_with(|s| {
                let resp = s.query("INST:SEL?")?;
                let resp = resp.trim();
                Ok(match resp {
                    "1" | "2" | "3" => format!("OUT{}", resp),
                    other => other.to_string(),
                })
            })
            .set_cmd("INST:SEL {val}")
            .val_mapping([("out1", "OUT1"), ("out2", "OUT2"), ("out3", "OUT3")]),
    )?;

    // Channel selection by number, interchangeable with select_output
    r.register(
        ParameterSpec::new("select_channel")
            .label("Channel")
            .get_cmd("INST:NSEL?")
            .set_cmd("INST:NSEL {val}")
            .validator(Validator::one_of([1, 2, 3]))
            .parser(ResponseParser::Int),
    )?;

    r.register(
        ParameterSpec::new("voltage")
            .label("Voltage")
            .unit("V")
            .get_cmd("VOLT?")
            .set_cmd("VOLT {val}")
            .validator(Validator::numbers(0.0, MAX_VOLTAGE))
            .parser(ResponseParser::Float),
    )?;
    r.register(
        ParameterSpec::new("voltage_step")
            .label("Voltage Step")
            .unit("V")
            .get_cmd("VOLT:STEP?")
            .set_cmd("VOLT:STEP {val}")
            .validator(Validator::numbers(1e-3, MAX_VOLTAGE))
            .parser(ResponseParser::Float),
    )?;
    r.register(
        ParameterSpec::new("current")
            .label("Current")
            .unit("A")
            .get_cmd("CURR?")
            .set_cmd("CURR {val}")
            .validator(Validator::numbers(MIN_CURRENT, MAX_CURRENT))
            .parser(ResponseParser::Float),
    )?;
    r.register(
        ParameterSpec::new("current_step")
            .label("Current Step")
            .unit("A")
            .get_cmd("CURR:STEP?")
            .set_cmd("CURR:STEP {val}")
            .validator(Validator::numbers(MIN_CURRENT, MAX_CURRENT))
            .parser(ResponseParser::Float),
    )?;

    for (name, label, cmd) in [
        ("output", "Output Status", "OUTP"),
        ("output_channel", "Output Channel", "OUTP:CHAN"),
        ("output_master", "Output Master", "OUTP:MAST"),
    ] {
        r.register(
            ParameterSpec::new(name)
                .label(label)
                .get_with(getters::bool_state(format!("{}?", cmd)))
                .set_cmd(format!("{} {{val}}", cmd))
                .mapping(ValueMapping::on_off()),
        )?;
    }

    r.register_function(
        FunctionSpec::new("apply", "APPL {0},{1}")
            .arg(Validator::numbers(1e-3, MAX_VOLTAGE))
            .arg(Validator::numbers(MIN_CURRENT, MAX_CURRENT))
            .doc("Set voltage and current of the selected channel"),
    )?;
    r.register_function(
        FunctionSpec::new("voltage_up", "VOLT UP").doc("Raise voltage by one step"),
    )?;
    r.register_function(
        FunctionSpec::new("voltage_down", "VOLT DOWN").doc("Lower voltage by one step"),
    )?;
    r.register_function(
        FunctionSpec::new("current_up", "CURR UP").doc("Raise current by one step"),
    )?;
    r.register_function(
        FunctionSpec::new("current_down", "CURR DOWN").doc("Lower current by one step"),
    )?;

    Ok(r)
}

// =============================================================================
// Hmc8043Factory - InstrumentFactory implementation
// =============================================================================

/// Factory for HMC8043 instances.
pub struct Hmc8043Factory;

impl InstrumentFactory for Hmc8043Factory {
    fn driver_type(&self) -> &'static str {
        "hmc8043"
    }

    fn name(&self) -> &'static str {
        "Rohde & Schwarz HMC8043 Power Supply"
    }

    fn build_registry(&self) -> Result<ParameterRegistry, RegistrationError> {
        registry()
    }
}

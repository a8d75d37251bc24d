//! Rohde & Schwarz HMF2550 50 MHz Arbitrary Function Generator
//!
//! SCPI, `\n` terminated. Shape parameters (`square_*`, `ramp_*`,
//! `pulse_*`) only take effect while the matching `function` is active.

use instr_core::prelude::*;

/// `(name, label, unit, command root, min, max)` of every numeric setting.
const NUMERIC: &[(&str, &str, &str, &str, f64, f64)] = &[
    ("frequency", "Frequency", "Hz", "FREQ", 1e-5, 1e7),
    ("period", "Period", "s", "PER", 2e-8, 1e5),
    ("voltage", "Voltage", "V", "VOLT", 1e-2, 20.0),
    ("voltage_high", "Voltage High", "V", "VOLT:HIGH", -10.0, 10.0),
    ("voltage_low", "Voltage Low", "V", "VOLT:LOW", -10.0, 10.0),
    ("voltage_offset", "Voltage Offset", "V", "VOLT:OFFS", -10.0, 10.0),
    ("square_duty_cycle", "Square Duty Cycle", "%", "FUNC:SQU:DCYC", 20.0, 80.0),
    ("square_width_high", "Square Width High", "s", "FUNC:SQU:WIDT:HIGH", 1e-8, 8e4),
    ("square_width_low", "Square Width Low", "s", "FUNC:SQU:WIDT:LOW", 1e-8, 8e4),
    ("ramp_time_rise", "Ramp Rise Time", "s", "FUNC:RAMP:TIME:RISE", 8e-9, 1e5),
    ("ramp_time_fall", "Ramp Fall Time", "s", "FUNC:RAMP:TIME:FALL", 8e-9, 1e5),
    ("pulse_duty_cycle", "Pulse Duty Cycle", "%", "FUNC:PULS:DCYC", 0.1, 99.9),
    ("pulse_width_high", "Pulse Width High", "s", "FUNC:PULS:WIDT:HIGH", 2e-8, 1e5),
    ("pulse_width_low", "Pulse Width Low", "s", "FUNC:PULS:WIDT:LOW", 2e-8, 1e5),
    ("pulse_edge_time", "Pulse Edge Time", "s", "FUNC:PULS:ETIM", 8e-9, 5e-7),
];

fn mapped<const N: usize>(
    name: &str,
    label: &str,
    cmd: &str,
    pairs: [(&str, &str); N],
) -> ParameterSpec {
    ParameterSpec::new(name)
        .label(label)
        .get_cmd(format!("{}?", cmd))
        .set_cmd(format!("{} {{val}}", cmd))
        .val_mapping(pairs)
}

/// Command table of the HMF2550.
pub fn registry() -> Result<ParameterRegistry, RegistrationError> {
    let mut r = ParameterRegistry::new();

    r.register(mapped(
        "function",
        "Function Type",
        "FUNC",
        [
            ("sine", "SIN"),
            ("square", "SQU"),
            ("ramp", "RAMP"),
            ("pulse", "PULS"),
            ("arbitrary", "ARB"),
        ],
    ))?;
    r.register(mapped("output", "Output Status", "OUTP", [("ON", "ON"), ("OFF", "OFF")]))?;
    r.register(mapped(
        "output_load",
        "Output Load",
        "OUTP:LOAD",
        [("terminated", "TERM"), ("infinity", "INF")],
    ))?;
    r.register(mapped(
        "output_polarity",
        "Output Polarity",
        "OUTP:POL",
        [("normal", "NORM"), ("inverted", "INV")],
    ))?;
    r.register(mapped(
        "voltage_unit",
        "Voltage Unit",
        "VOLT:UNIT",
        [("dBm", "DBM"), ("V", "VOLT")],
    ))?;

    for &(name, label, unit, cmd, min, max) in NUMERIC {
        r.register(
            ParameterSpec::new(name)
                .label(label)
                .unit(unit)
                .get_cmd(format!("{}?", cmd))
                .set_cmd(format!("{} {{val}}", cmd))
                .validator(Validator::numbers(min, max))
                .parser(ResponseParser::Float),
        )?;
    }

    r.register(mapped(
        "waveform",
        "Waveform Type",
        "FUNC:ARB",
        [
            ("sine", "SIN"),
            ("square", "SQU"),
            ("pramp", "PRAM"),
            ("nramp", "NRAM"),
            ("triangle", "TRI"),
            ("wnoise", "WNO"),
            ("pnoise", "PNO"),
            ("cardinal", "CARD"),
            ("exprise", "EXPR"),
            ("expfall", "EXPF"),
            ("ram", "RAM"),
        ],
    ))?;

    Ok(r)
}

// =============================================================================
// Hmf2550Factory - InstrumentFactory implementation
// =============================================================================

/// Factory for HMF2550 instances.
pub struct Hmf2550Factory;

impl InstrumentFactory for Hmf2550Factory {
    fn driver_type(&self) -> &'static str {
        "hmf2550"
    }

    fn name(&self) -> &'static str {
        "Rohde & Schwarz HMF2550 Function Generator"
    }

    fn build_registry(&self) -> Result<ParameterRegistry, RegistrationError> {
        registry()
    }
}

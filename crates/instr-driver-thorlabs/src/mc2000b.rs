//! Thorlabs MC2000B Optical Chopper
//!
//! ASCII protocol over USB-CDC at 115200 8N1. Commands end with `\r`; the
//! controller echoes each command, prints its answer and finishes with a
//! `>` prompt:
//!
//! ```text
//! freq?\r500\r>
//! ```
//!
//! The registry below is written against the payload only. The
//! [`ResponseFraming::EchoPrompt`] default returned by
//! [`Mc2000bFactory::connection`] strips echo and prompt, and discards the
//! echo that follows every write.

use instr_core::prelude::*;
use std::time::Duration;

/// Prompt printed after every exchange.
pub const PROMPT: &str = ">";

/// Internal reference frequency range in Hz.
pub const FREQUENCY_RANGE: (f64, f64) = (20.0, 1000.0);

/// Blade models and the index the controller uses for them.
pub const BLADES: [(&str, &str); 14] = [
    ("MC1F2", "1"),
    ("MC1F10", "2"),
    ("MC1F30", "3"),
    ("MC1F60", "4"),
    ("MC1F100", "5"),
    ("MC1F10HP", "6"),
    ("MC1F2P10", "7"),
    ("MC1F6P10", "8"),
    ("MC1F10A", "9"),
    ("MC2F330", "10"),
    ("MC2F47", "11"),
    ("MC2F57F", "12"),
    ("MC2F860", "13"),
    ("MC2F5360", "14"),
];

/// Command table of the MC2000B.
pub fn registry() -> Result<ParameterRegistry, RegistrationError> {
    let mut r = ParameterRegistry::new();

    r.register(ParameterSpec::new("identity").label("Identity").get_cmd("id?"))?;
    r.register(
        ParameterSpec::new("commands")
            .label("Commands")
            .get_cmd("?"),
    )?;

    r.register(
        ParameterSpec::new("frequency")
            .label("Frequency")
            .unit("Hz")
            .get_cmd("freq?")
            .set_cmd("freq={val}")
            .validator(Validator::numbers(FREQUENCY_RANGE.0, FREQUENCY_RANGE.1))
            .parser(ResponseParser::Float),
    )?;
    r.register(
        ParameterSpec::new("enable")
            .label("Enable")
            .get_cmd("enable?")
            .set_cmd("enable={val}")
            .val_mapping([("ON", "1"), ("OFF", "0")]),
    )?;
    r.register(
        ParameterSpec::new("blade")
            .label("Blade")
            .get_cmd("blade?")
            .set_cmd("blade={val}")
            .val_mapping(BLADES),
    )?;
    r.register(
        ParameterSpec::new("phase")
            .label("Phase")
            .unit("deg")
            .get_cmd("phase?")
            .set_cmd("phase={val}")
            .validator(Validator::numbers(0.0, 360.0))
            .parser(ResponseParser::Float),
    )?;
    r.register(
        ParameterSpec::new("refin")
            .label("Reference Input")
            .get_cmd("ref?")
            .set_cmd("ref={val}")
            .val_mapping([
                ("int-outer", "0"),
                ("int-inner", "1"),
                ("ext-outer", "2"),
                ("ext-inner", "3"),
            ]),
    )?;

    Ok(r)
}

// =============================================================================
// Mc2000bFactory - InstrumentFactory implementation
// =============================================================================

/// Factory for MC2000B instances.
pub struct Mc2000bFactory;

impl InstrumentFactory for Mc2000bFactory {
    fn driver_type(&self) -> &'static str {
        "mc2000b"
    }

    fn name(&self) -> &'static str {
        "Thorlabs MC2000B Optical Chopper"
    }

    fn connection(&self) -> ConnectionDefaults {
        ConnectionDefaults {
            terminators: Terminators::new("\r", PROMPT),
            serial: SerialSettings::with_baud(115_200),
            framing: ResponseFraming::EchoPrompt {
                prompt: PROMPT.to_string(),
            },
            timeout: Duration::from_secs(5),
            ..ConnectionDefaults::default()
        }
    }

    fn build_registry(&self) -> Result<ParameterRegistry, RegistrationError> {
        registry()
    }
}

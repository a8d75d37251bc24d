//! Thorlabs MCLS Four-Channel Laser Diode Source
//!
//! ASCII protocol over USB-CDC at 115200 8N1, `\r` terminated. The
//! controller echoes each command on its own line and answers on the next
//! one, which [`ResponseFraming::EchoLine`] handles.
//!
//! Each channel drives a different diode, so the current limit depends on
//! the selected channel. Setting `current` reads `channel` back from the
//! controller first and rejects values above that channel's limit.

use instr_core::prelude::*;
use std::time::Duration;

/// Maximum drive current in mA of channels 1 to 4.
pub const MAX_CURRENTS: [f64; 4] = [38.3, 97.8, 51.5, 21.6];

/// Current limit in mA of `channel`, if it exists.
pub fn max_current(channel: i64) -> Option<f64> {
    usize::try_from(channel)
        .ok()
        .and_then(|c| c.checked_sub(1))
        .and_then(|i| MAX_CURRENTS.get(i).copied())
}

fn highest_limit() -> f64 {
    MAX_CURRENTS.iter().copied().fold(0.0, f64::max)
}

/// Checks `value` against the limit of the channel the controller reports.
fn set_current(session: &mut Session<'_>, value: &Value, token: &str) -> Result<(), SetError> {
    let channel = session.get("channel").map_err(|e| SetError::Dependency {
        name: "current".to_string(),
        source: Box::new(e),
    })?;
    let reject = |reason: String| SetError::InvalidValue {
        name: "current".to_string(),
        value: value.to_string(),
        reason,
    };

    let limit = channel
        .as_i64()
        .and_then(max_current)
        .ok_or_else(|| reject(format!("no current limit known for channel {}", channel)))?;
    let requested = value
        .as_f64()
        .ok_or_else(|| reject("expected a number".to_string()))?;
    if requested > limit {
        tracing::warn!(channel = %channel, limit, requested, "current above channel limit");
        return Err(reject(format!(
            "exceeds maximum {} mA of channel {}",
            limit, channel
        )));
    }

    session.send(&format!("current={}", token))?;
    Ok(())
}

/// Command table of the MCLS.
pub fn registry() -> Result<ParameterRegistry, RegistrationError> {
    let mut r = ParameterRegistry::new();

    r.register(ParameterSpec::new("identity").label("Identity").get_cmd("id?"))?;

    r.register(
        ParameterSpec::new("channel")
            .label("Channel")
            .get_cmd("channel?")
            .set_cmd("channel={val}")
            .validator(Validator::ints(1, MAX_CURRENTS.len() as i64))
            .parser(ResponseParser::Int),
    )?;
    r.register(
        ParameterSpec::new("target")
            .label("Target Temperature")
            .unit("°C")
            .get_cmd("target?")
            .set_cmd("target={val}")
            .validator(Validator::numbers(20.0, 30.0))
            .parser(ResponseParser::Float),
    )?;
    r.register(
        ParameterSpec::new("temp")
            .label("Temperature")
            .unit("°C")
            .get_cmd("temp?")
            .parser(ResponseParser::Float),
    )?;
    r.register(
        ParameterSpec::new("current")
            .label("Current")
            .unit("mA")
            .get_cmd("current?")
            .set_with(set_current)
            .validator(Validator::numbers(0.0, highest_limit()))
            .parser(ResponseParser::Float),
    )?;
    r.register(
        ParameterSpec::new("power")
            .label("Power")
            .unit("mW")
            .get_cmd("power?")
            .parser(ResponseParser::Float),
    )?;
    r.register(
        ParameterSpec::new("enable")
            .label("Enable")
            .get_cmd("enable?")
            .set_cmd("enable={val}")
            .validator(Validator::one_of([0, 1]))
            .parser(ResponseParser::Int),
    )?;
    r.register(
        ParameterSpec::new("system")
            .label("System")
            .get_cmd("system?")
            .set_cmd("system={val}")
            .validator(Validator::one_of([0, 1]))
            .parser(ResponseParser::Int),
    )?;
    r.register(ParameterSpec::new("specs").label("Specs").get_cmd("specs?"))?;
    r.register(
        ParameterSpec::new("step")
            .label("Step")
            .get_cmd("step?")
            .set_cmd("step={val}")
            .validator(Validator::numbers(0.0, f64::INFINITY))
            .parser(ResponseParser::Float),
    )?;
    r.register(ParameterSpec::new("save").label("Save").set_cmd("save"))?;
    r.register(
        ParameterSpec::new("statword")
            .label("Status Word")
            .get_cmd("statword"),
    )?;

    Ok(r)
}

// =============================================================================
// MclsFactory - InstrumentFactory implementation
// =============================================================================

/// Factory for MCLS instances.
pub struct MclsFactory;

impl InstrumentFactory for MclsFactory {
    fn driver_type(&self) -> &'static str {
        "mcls"
    }

    fn name(&self) -> &'static str {
        "Thorlabs MCLS Laser Diode Source"
    }

    fn connection(&self) -> ConnectionDefaults {
        ConnectionDefaults {
            terminators: Terminators::symmetric("\r"),
            serial: SerialSettings::with_baud(115_200),
            framing: ResponseFraming::EchoLine,
            timeout: Duration::from_secs(5),
            ..ConnectionDefaults::default()
        }
    }

    fn build_registry(&self) -> Result<ParameterRegistry, RegistrationError> {
        registry()
    }
}

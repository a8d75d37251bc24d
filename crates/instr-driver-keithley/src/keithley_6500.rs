//! Keithley DMM6500 6½-Digit Multimeter
//!
//! SCPI, `\n` terminated. Only the SCPI command set is supported; the
//! factory refuses instruments running the TSP language.
//!
//! Measurement settings such as `nplc` or `range` live under the active
//! measurement function (`VOLT:DC:NPLC`, `RES:RANG`, ...). Those parameters
//! read `mode` from the instrument on every access and address the
//! function it reports, so a mode change on the front panel is honored.
//!
//! ## Options
//!
//! ```toml
//! [devices.options]
//! reset_device = true   # send *RST before configuring the data format
//! ```

use anyhow::{Context, Result};
use instr_core::parser::strip_quotes;
use instr_core::prelude::*;
use serde::Deserialize;

/// Longest delay accepted by the timers and the scan interval.
pub const MAX_TIMER_DELAY: f64 = 999_999.999;

/// Driver options from the device's `options` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Keithley6500Options {
    /// Reset the instrument during initialization.
    pub reset_device: bool,
}

impl Keithley6500Options {
    /// Parse options, rejecting unknown keys.
    pub fn from_table(options: &toml::Table) -> Result<Self> {
        toml::Value::Table(options.clone())
            .try_into()
            .context("Invalid Keithley 6500 options")
    }
}

/// Lowercase wire token of the active measurement function, e.g. `volt:dc`.
fn active_function(session: &mut Session<'_>) -> Result<String, GetError> {
    Ok(session.get_wire("mode")?.to_lowercase())
}

/// Parameter addressed under the active measurement function.
fn mode_param(name: &'static str, suffix: &'static str) -> ParameterSpec {
    ParameterSpec::new(name)
        .get_with(move |s| {
            let function = active_function(s)?;
            Ok(s.query(&format!("{}:{}?", function, suffix))?)
        })
        .set_with(move |s, _value, token| {
            let function = active_function(s).map_err(|e| SetError::Dependency {
                name: name.to_string(),
                source: Box::new(e),
            })?;
            s.send(&format!("{}:{} {}", function, suffix, token))?;
            Ok(())
        })
}

/// Averaging filter type; the instrument answers with `MOV`/`REP`.
fn parse_filter_type(raw: &str) -> Result<Value, String> {
    let s = strip_quotes(raw).to_lowercase();
    Ok(Value::Text(match s.as_str() {
        "mov" => "moving".to_string(),
        "rep" => "repeat".to_string(),
        _ => s,
    }))
}

/// Command table of the DMM6500.
pub fn registry() -> Result<ParameterRegistry, RegistrationError> {
    let mut r = ParameterRegistry::new();

    r.register(ParameterSpec::new("identity").label("Identity").get_cmd("*IDN?"))?;

    r.register(
        ParameterSpec::new("mode")
            .label("Measurement Function")
            .get_with(|s| Ok(strip_quotes(&s.query("SENS:FUNC?")?).to_string()))
            .set_cmd("SENS:FUNC '{val}'")
            .val_mapping([
                ("ac current", "CURR:AC"),
                ("dc current", "CURR:DC"),
                ("ac voltage", "VOLT:AC"),
                ("dc voltage", "VOLT:DC"),
                ("2w resistance", "RES"),
                ("4w resistance", "FRES"),
                ("temperature", "TEMP"),
                ("frequency", "FREQ"),
            ]),
    )?;

    r.register(
        mode_param("nplc", "NPLC")
            .label("Integration Time")
            .unit("PLC")
            .validator(Validator::numbers(0.01, 10.0))
            .parser(ResponseParser::Float),
    )?;
    // Valid ranges differ per measurement function
    r.register(
        mode_param("range", "RANG")
            .label("Range")
            .validator(Validator::numbers(f64::NEG_INFINITY, f64::INFINITY))
            .parser(ResponseParser::Float),
    )?;
    r.register(
        mode_param("auto_range_enabled", "RANG:AUTO")
            .label("Auto Range")
            .validator(Validator::Bool)
            .parser(ResponseParser::Bool),
    )?;
    r.register(
        mode_param("averaging_type", "AVER:TCON")
            .label("Averaging Filter")
            .validator(Validator::one_of(["moving", "repeat"]))
            .parser(ResponseParser::custom(parse_filter_type)),
    )?;
    r.register(
        mode_param("averaging_count", "AVER:COUN")
            .label("Averaging Count")
            .validator(Validator::ints(1, 100))
            .parser(ResponseParser::Int),
    )?;
    r.register(
        mode_param("averaging_enabled", "AVER:STAT")
            .label("Averaging")
            .validator(Validator::Bool)
            .parser(ResponseParser::Bool),
    )?;

    r.register(
        ParameterSpec::new("digits")
            .label("Display Digits")
            .get_cmd("DISP:VOLT:DC:DIG?")
            .set_cmd("DISP:VOLT:DC:DIG {val}")
            .validator(Validator::ints(4, 7))
            .parser(ResponseParser::Int),
    )?;

    // Off blanks the display; Blackout also turns off indicators and key lights
    r.register(
        ParameterSpec::new("display_backlight")
            .label("Display Backlight")
            .get_cmd("DISP:LIGH:STAT?")
            .set_cmd("DISP:LIGH:STAT {val}")
            .val_mapping([
                ("On 100", "ON100"),
                ("On 75", "ON75"),
                ("On 50", "ON50"),
                ("On 25", "ON25"),
                ("Off", "OFF"),
                ("Blackout", "BLACkout"),
            ]),
    )?;

    r.register(
        ParameterSpec::new("trigger_count")
            .label("Scan Count")
            .get_cmd("ROUT:SCAN:COUN:SCAN?")
            .set_cmd("ROUT:SCAN:COUN:SCAN {val}")
            .validator(Validator::MultiType(vec![
                Validator::ints(1, 9999),
                Validator::one_of(["inf", "default", "minimum", "maximum"]),
            ]))
            .parser(ResponseParser::Int),
    )?;

    for n in 1..=4 {
        r.register(
            ParameterSpec::new(format!("trigger{}_delay", n))
                .label(format!("Timer {} Delay", n))
                .unit("s")
                .get_cmd(format!("TRIG:TIM{}:DEL?", n))
                .set_cmd(format!("TRIG:TIM{}:DEL {{val}}", n))
                .validator(Validator::numbers(0.0, MAX_TIMER_DELAY))
                .parser(ResponseParser::Float),
        )?;
        r.register(
            ParameterSpec::new(format!("trigger{}_source", n))
                .label(format!("Timer {} Source", n))
                .get_cmd(format!("TRIG:TIM{}:STAR:STIM?", n))
                .set_cmd(format!("TRIG:TIM{}:STAR:STIM {{val}}", n))
                .val_mapping([
                    ("immediate", "NONE"),
                    ("timer1", "TIM1"),
                    ("timer2", "TIM2"),
                    ("timer3", "TIM3"),
                    ("timer4", "TIM4"),
                    ("notify1", "NOT1"),
                    ("notify2", "NOT2"),
                    ("notify3", "NOT3"),
                    ("front-panel", "DISP"),
                    ("bus", "COMM"),
                    ("external", "EXT"),
                ]),
        )?;
    }

    // Interval between scans; the instrument default is 0
    r.register(
        ParameterSpec::new("trigger_timer")
            .label("Scan Interval")
            .unit("s")
            .get_cmd("ROUT:SCAN:INT?")
            .set_cmd("ROUT:SCAN:INT {val}")
            .validator(Validator::numbers(0.0, MAX_TIMER_DELAY))
            .parser(ResponseParser::Float),
    )?;

    r.register(
        ParameterSpec::new("amplitude")
            .label("Reading")
            .unit("a.u.")
            .get_cmd("READ?")
            .parser(ResponseParser::Float),
    )?;

    r.register_function(FunctionSpec::new("reset", "*RST").doc("Reset the instrument"))?;

    Ok(r)
}

// =============================================================================
// Keithley6500Factory - InstrumentFactory implementation
// =============================================================================

/// Factory for DMM6500 instances.
pub struct Keithley6500Factory;

impl InstrumentFactory for Keithley6500Factory {
    fn driver_type(&self) -> &'static str {
        "keithley_6500"
    }

    fn name(&self) -> &'static str {
        "Keithley DMM6500 Multimeter"
    }

    fn validate(&self, options: &toml::Table) -> Result<()> {
        Keithley6500Options::from_table(options).map(|_| ())
    }

    fn build_registry(&self) -> Result<ParameterRegistry, RegistrationError> {
        registry()
    }

    fn initialize(&self, session: &mut Session<'_>, options: &toml::Table) -> Result<()> {
        let options = Keithley6500Options::from_table(options)?;

        let language = session
            .query("*LANG?")
            .context("Failed to query command set")?;
        let language = language.trim();
        if language != "SCPI" {
            anyhow::bail!(
                "Driver is only compatible with the 'SCPI' command set, not '{}'",
                language
            );
        }

        if options.reset_device {
            tracing::info!("Resetting Keithley 6500");
            session.send("*RST").context("Failed to reset")?;
        }
        session
            .send("FORM:DATA ASCII")
            .context("Failed to select ASCII data format")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(src: &str) -> toml::Table {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn test_registry_builds() {
        let r = registry().unwrap();
        // identity, mode, 6 mode-dependent, digits, backlight, trigger_count,
        // 4 x (delay, source), trigger_timer, amplitude
        assert_eq!(r.len(), 21);
        assert_eq!(r.function_names().collect::<Vec<_>>(), ["reset"]);
    }

    #[test]
    fn test_filter_type_parser() {
        assert_eq!(parse_filter_type("MOV\n").unwrap(), Value::from("moving"));
        assert_eq!(parse_filter_type("\"REP\"").unwrap(), Value::from("repeat"));
        assert_eq!(parse_filter_type("other").unwrap(), Value::from("other"));
    }

    #[test]
    fn test_mode_strips_quotes() {
        let r = registry().unwrap();
        let mut mock = MockTransport::with_responses(["\"VOLT:DC\""]);
        assert_eq!(r.get("mode", &mut mock).unwrap(), Value::from("dc voltage"));
    }

    #[test]
    fn test_options() {
        assert_eq!(
            Keithley6500Options::from_table(&toml::Table::new()).unwrap(),
            Keithley6500Options::default()
        );
        assert!(
            Keithley6500Options::from_table(&options("reset_device = true"))
                .unwrap()
                .reset_device
        );
        assert!(Keithley6500Factory
            .validate(&options("reset = true"))
            .is_err());
    }

    #[test]
    fn test_initialize_sequence() {
        let r = registry().unwrap();
        let mut mock = MockTransport::with_responses(["SCPI"]);
        let factory = Keithley6500Factory;
        {
            let mut session = r.session(&mut mock);
            factory
                .initialize(&mut session, &options("reset_device = true"))
                .unwrap();
        }
        assert_eq!(mock.queries(), ["*LANG?"]);
        assert_eq!(mock.sent(), ["*RST", "FORM:DATA ASCII"]);
    }

    #[test]
    fn test_initialize_rejects_tsp() {
        let r = registry().unwrap();
        let mut mock = MockTransport::with_responses(["TSP"]);
        let mut session = r.session(&mut mock);
        let err = Keithley6500Factory
            .initialize(&mut session, &toml::Table::new())
            .unwrap_err();
        assert!(err.to_string().contains("'TSP'"));
    }
}

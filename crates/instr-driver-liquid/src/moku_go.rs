//! Liquid Instruments Moku:Go
//!
//! Multi-instrument device reached over its SCPI socket, `\n` terminated.
//! Parameters are grouped by the embedded instrument they address:
//! oscilloscope (`OSC:`), waveform generator (`WGEN:`), spectrum analyzer
//! (`SPEC:`), data acquisition (`DATA:`) and trigger (`TRIG:`).

use instr_core::prelude::*;

fn float_param(name: &str, label: &str, unit: &str, cmd: &str, min: f64, max: f64) -> ParameterSpec {
    ParameterSpec::new(name)
        .label(label)
        .unit(unit)
        .get_cmd(format!("{}?", cmd))
        .set_cmd(format!("{} {{val}}", cmd))
        .validator(Validator::numbers(min, max))
        .parser(ResponseParser::Float)
}

fn keyword_param<const N: usize>(name: &str, label: &str, cmd: &str, keywords: [&str; N]) -> ParameterSpec {
    ParameterSpec::new(name)
        .label(label)
        .get_cmd(format!("{}?", cmd))
        .set_cmd(format!("{} {{val}}", cmd))
        .val_mapping(keywords.map(|k| (k, k)))
}

/// Command table of the Moku:Go.
pub fn registry() -> Result<ParameterRegistry, RegistrationError> {
    let mut r = ParameterRegistry::new();

    r.register(ParameterSpec::new("identity").label("Identity").get_cmd("*IDN?"))?;
    r.register(ParameterSpec::new("reset").label("Reset").set_cmd("*RST"))?;
    r.register(ParameterSpec::new("clear").label("Clear").set_cmd("*CLS"))?;

    // Oscilloscope
    r.register(float_param(
        "oscilloscope_range",
        "Timebase Range",
        "s",
        "OSC:TIMEBASE:RANGE",
        1e-3,
        1e9,
    ))?;
    r.register(
        ParameterSpec::new("oscilloscope_data")
            .label("Oscilloscope Data")
            .get_cmd("OSC:DATA?")
            .parser(ResponseParser::Float),
    )?;
    r.register(float_param(
        "ch1_scale",
        "Channel 1 Scale",
        "V/div",
        "OSC:CH1:SCAL",
        1e-3,
        1e9,
    ))?;
    r.register(keyword_param(
        "oscilloscope_mode",
        "Oscilloscope Trigger Mode",
        "OSC:TRIG:MODE",
        ["AUTO", "NORMAL", "SINGLE"],
    ))?;

    // Waveform generator
    r.register(keyword_param(
        "wgen_function",
        "Waveform",
        "WGEN:FUNC",
        ["SINE", "SQUARE"],
    ))?;
    r.register(float_param("wgen_frequency", "Frequency", "Hz", "WGEN:FREQ", 1e-3, 2e7))?;
    r.register(float_param("wgen_voltage", "Amplitude", "V", "WGEN:VOLT", 1e-3, 10.0))?;
    r.register(
        ParameterSpec::new("wgen_output")
            .label("Output")
            .set_cmd("WGEN:OUTP {val}")
            .mapping(ValueMapping::on_off()),
    )?;

    // Spectrum analyzer
    r.register(float_param("spectrum_span", "Span", "Hz", "SPEC:FREQ:SPAN", 1.0, 3e7))?;
    r.register(float_param("spectrum_center", "Center Frequency", "Hz", "SPEC:FREQ:CENT", 0.0, 3e7))?;
    r.register(
        ParameterSpec::new("spectrum_amplitude_scale")
            .label("Amplitude Scale")
            .get_cmd("SPEC:AMPL:SCAL?")
            .set_cmd("SPEC:AMPL:SCAL {val}")
            .validator(Validator::numbers(1e-3, 1e9))
            .parser(ResponseParser::Float),
    )?;
    r.register(
        ParameterSpec::new("spectrum_data")
            .label("Spectrum Data")
            .get_cmd("SPEC:DATA?"),
    )?;

    // Data acquisition
    r.register(
        ParameterSpec::new("acquisition_status")
            .label("Acquisition Status")
            .get_cmd("DATA:ACQ:STAT?")
            .parser(ResponseParser::Text),
    )?;
    r.register(
        ParameterSpec::new("acquired_data")
            .label("Acquired Data")
            .get_cmd("DATA:TRANSFER?"),
    )?;
    r.register_function(
        FunctionSpec::new("acquisition_start", "DATA:ACQ:START").doc("Start data acquisition"),
    )?;
    r.register_function(
        FunctionSpec::new("acquisition_stop", "DATA:ACQ:STOP").doc("Stop data acquisition"),
    )?;

    // Trigger
    r.register(keyword_param(
        "trigger_mode",
        "Trigger Mode",
        "TRIG:MODE",
        ["AUTO", "NORMAL", "SINGLE"],
    ))?;
    r.register(keyword_param(
        "trigger_source",
        "Trigger Source",
        "TRIG:SOURCE",
        ["CH1", "CH2", "EXT"],
    ))?;
    r.register(float_param("trigger_level", "Trigger Level", "V", "TRIG:LEVEL", -5.0, 5.0))?;
    r.register(keyword_param(
        "trigger_slope",
        "Trigger Slope",
        "TRIG:SLOPE",
        ["RISE", "FALL"],
    ))?;

    Ok(r)
}

// =============================================================================
// MokuGoFactory - InstrumentFactory implementation
// =============================================================================

/// Factory for Moku:Go instances.
pub struct MokuGoFactory;

impl InstrumentFactory for MokuGoFactory {
    fn driver_type(&self) -> &'static str {
        "moku_go"
    }

    fn name(&self) -> &'static str {
        "Liquid Instruments Moku:Go"
    }

    fn build_registry(&self) -> Result<ParameterRegistry, RegistrationError> {
        registry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builds() {
        let r = registry().unwrap();
        assert_eq!(r.len(), 21);
        assert_eq!(r.function_names().count(), 2);
    }

    #[test]
    fn test_keyword_parameters() {
        let r = registry().unwrap();
        let mut mock = MockTransport::with_responses(["EXT", "HOLD"]);
        r.set("trigger_source", "CH2", &mut mock).unwrap();
        assert!(r.set("trigger_source", "ch2", &mut mock).is_err());
        assert_eq!(r.get("trigger_source", &mut mock).unwrap(), Value::from("EXT"));
        assert!(r.get("oscilloscope_mode", &mut mock).is_err());
        assert_eq!(mock.sent(), ["TRIG:SOURCE CH2"]);
    }

    #[test]
    fn test_reset_ignores_value() {
        let r = registry().unwrap();
        let mut mock = MockTransport::new();
        r.set("reset", true, &mut mock).unwrap();
        r.set("clear", 0, &mut mock).unwrap();
        assert_eq!(mock.sent(), ["*RST", "*CLS"]);
    }

    #[test]
    fn test_output_is_write_only() {
        let r = registry().unwrap();
        let mut mock = MockTransport::new();
        r.set("wgen_output", "ON", &mut mock).unwrap();
        assert!(matches!(
            r.get("wgen_output", &mut mock),
            Err(GetError::NotReadable(_))
        ));
        assert_eq!(mock.sent(), ["WGEN:OUTP ON"]);
    }
}

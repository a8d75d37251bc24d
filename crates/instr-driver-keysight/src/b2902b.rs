//! Keysight B2902B Dual-Channel Source/Measure Unit
//!
//! SCPI, `\n` terminated. Channel-specific parameters carry an `_A` or `_B`
//! suffix and address `SOUR1`/`SENS1` or `SOUR2`/`SENS2` respectively.
//! Auto-range limits (`*_limit_*`) only apply while `autorange` is `ON`.

use instr_core::prelude::*;

/// Output channels as `(suffix, SCPI channel number)`.
pub const CHANNELS: [(&str, u8); 2] = [("A", 1), ("B", 2)];

/// Source current range of either channel.
pub const MAX_SOURCE_CURRENT: f64 = 3.0;

/// Source voltage range of either channel.
pub const MAX_SOURCE_VOLTAGE: f64 = 20.0;

fn float_param(name: String, label: String, unit: &str, cmd: String, min: f64, max: f64) -> ParameterSpec {
    ParameterSpec::new(name)
        .label(label)
        .unit(unit)
        .get_cmd(format!("{}?", cmd))
        .set_cmd(format!("{} {{val}}", cmd))
        .validator(Validator::numbers(min, max))
        .parser(ResponseParser::Float)
}

fn on_off(name: impl Into<String>, label: &str, query: String, set: String) -> ParameterSpec {
    ParameterSpec::new(name)
        .label(label)
        .get_with(getters::bool_state(query))
        .set_cmd(set)
        .mapping(ValueMapping::on_off())
}

/// Command table of the B2902B.
pub fn registry() -> Result<ParameterRegistry, RegistrationError> {
    let mut r = ParameterRegistry::new();

    r.register(ParameterSpec::new("identity").label("Identity").get_cmd("*IDN?"))?;
    r.register(ParameterSpec::new("reset").label("Reset").set_cmd("*RST"))?;

    for (ch, n) in CHANNELS {
        r.register(on_off(
            format!("output_{}", ch),
            &format!("Output{}Channel", ch),
            format!("OUTP{}?", n),
            format!(":OUTP{} {{val}}", n),
        ))?;
    }

    r.register(
        ParameterSpec::new("output_mode")
            .label("OutputMode")
            .get_cmd(":OUTP:FUNC:MODE?")
            .set_cmd(":OUTP:FUNC:MODE {val}")
            .val_mapping([("CURR", "CURR"), ("VOLT", "VOLT")]),
    )?;
    r.register(on_off(
        "waittime_status",
        "WaitTimeStatus",
        "SOUR:WAIT?".into(),
        ":SOUR:WAIT {val}".into(),
    ))?;
    r.register(float_param(
        "waittime".into(),
        "WaitTime".into(),
        "s",
        "SOUR:WAIT:OFFS".into(),
        1e-3,
        10.0,
    ))?;
    r.register(on_off(
        "autorange",
        "AutoRange",
        "SOUR:VOLT:RANG:AUTO?".into(),
        ":SOUR:VOLT:RANG:AUTO {val}".into(),
    ))?;

    // Voltage sourcing and sensing
    for (ch, n) in CHANNELS {
        r.register(float_param(
            format!("voltage_range_{}", ch),
            format!("VoltageRange{}", ch),
            "V",
            format!("SOUR{}:VOLT:RANG", n),
            0.2,
            200.0,
        ))?;
        r.register(float_param(
            format!("voltage_source_{}", ch),
            format!("Voltage{}", ch),
            "V",
            format!("SOUR{}:VOLT", n),
            -MAX_SOURCE_VOLTAGE,
            MAX_SOURCE_VOLTAGE,
        ))?;
        r.register(float_param(
            format!("voltage_limit_{}", ch),
            format!("VoltageLimit{}", ch),
            "V",
            format!("SENS{}:VOLT:RANG:AUTO:LLIM", n),
            0.2,
            200.0,
        ))?;
        r.register(float_param(
            format!("voltage_compliance_{}", ch),
            format!("VoltageCompliance{}", ch),
            "V",
            format!("SENS{}:VOLT:PROT", n),
            1e-6,
            2.0,
        ))?;
    }

    // Current sourcing and sensing
    for (ch, n) in CHANNELS {
        r.register(float_param(
            format!("current_range_{}", ch),
            format!("CurrentRange{}", ch),
            "A",
            format!("SOUR{}:CURR:RANG", n),
            1e-9,
            MAX_SOURCE_CURRENT,
        ))?;
        r.register(float_param(
            format!("current_source_{}", ch),
            format!("Current{}", ch),
            "A",
            format!("SOUR{}:CURR", n),
            -MAX_SOURCE_CURRENT,
            MAX_SOURCE_CURRENT,
        ))?;
        r.register(float_param(
            format!("current_limit_{}", ch),
            format!("CurrentLimit{}", ch),
            "A",
            format!("SENS{}:CURR:RANG:AUTO:LLIM", n),
            1e-6,
            2.0,
        ))?;
        r.register(float_param(
            format!("current_compliance_{}", ch),
            format!("CurrentCompliance{}", ch),
            "A",
            format!("SENS{}:CURR:PROT", n),
            1e-8,
            1.0,
        ))?;
    }

    // Spot measurements, read-only
    for (ch, n) in CHANNELS {
        r.register(
            ParameterSpec::new(format!("current_measure_{}", ch))
                .label(format!("Current{}", ch))
                .unit("A")
                .get_cmd(format!("MEAS:CURR? (@{})", n))
                .parser(ResponseParser::Float),
        )?;
        r.register(
            ParameterSpec::new(format!("voltage_measure_{}", ch))
                .label(format!("Voltage{}", ch))
                .unit("V")
                .get_cmd(format!("MEAS:VOLT? (@{})", n))
                .parser(ResponseParser::Float),
        )?;
    }

    Ok(r)
}

// =============================================================================
// B2902bFactory - InstrumentFactory implementation
// =============================================================================

/// Factory for B2902B instances.
pub struct B2902bFactory;

impl InstrumentFactory for B2902bFactory {
    fn driver_type(&self) -> &'static str {
        "b2902b"
    }

    fn name(&self) -> &'static str {
        "Keysight B2902B Source/Measure Unit"
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
        // 2 common + 2 outputs + 4 global + 2 x (4 voltage + 4 current + 2 measure)
        assert_eq!(r.len(), 28);
    }

    #[test]
    fn test_current_source_symmetric_range() {
        let r = registry().unwrap();
        let mut mock = MockTransport::new();
        for ch in ["A", "B"] {
            let name = format!("current_source_{}", ch);
            r.set(&name, -3.0, &mut mock).unwrap();
            assert!(r.set(&name, -3.5, &mut mock).is_err());
        }
        assert_eq!(mock.sent(), ["SOUR1:CURR -3", "SOUR2:CURR -3"]);
    }

    #[test]
    fn test_measure_is_read_only() {
        let r = registry().unwrap();
        let mut mock = MockTransport::with_responses(["+1.000000E-03"]);
        assert_eq!(
            r.get("current_measure_B", &mut mock).unwrap(),
            Value::Float(1e-3)
        );
        assert_eq!(mock.queries(), ["MEAS:CURR? (@2)"]);
        assert!(matches!(
            r.set("current_measure_B", 1.0, &mut mock),
            Err(SetError::NotSettable(_))
        ));
    }
}

//! B2902B command table driven through a scripted transport.

#![allow(clippy::unwrap_used)]

use instr_core::prelude::*;
use instr_driver_keysight::b2902b;

fn smu(mock: &MockTransport) -> Instrument<MockTransport> {
    Instrument::new("smu", b2902b::registry().unwrap(), mock.clone())
}

#[test]
fn source_voltage_on_channel_a() {
    let mock = MockTransport::new();
    let mut inst = smu(&mock);

    inst.set("output_mode", "VOLT").unwrap();
    inst.set("voltage_range_A", 20.0).unwrap();
    inst.set("voltage_source_A", -1.25).unwrap();
    inst.set("current_compliance_A", 1e-3).unwrap();
    inst.set("output_A", "ON").unwrap();

    assert_eq!(
        mock.sent(),
        [
            ":OUTP:FUNC:MODE VOLT",
            "SOUR1:VOLT:RANG 20",
            "SOUR1:VOLT -1.25",
            "SENS1:CURR:PROT 0.001",
            ":OUTP1 ON",
        ]
    );
}

#[test]
fn rejected_values_send_nothing() {
    let mock = MockTransport::new();
    let mut inst = smu(&mock);

    assert!(inst.set("voltage_source_B", 20.5).is_err());
    assert!(inst.set("waittime", 0.0).is_err());
    assert!(inst.set("output_mode", "RES").is_err());
    assert!(inst.set("current_compliance_B", 2.0).is_err());
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn state_getters_translate_numeric_responses() {
    let mock = MockTransport::new();
    mock.respond_to("OUTP2?", "1");
    mock.respond_to("SOUR:WAIT?", "0");
    mock.respond_to("SOUR:VOLT:RANG:AUTO?", "1");
    let mut inst = smu(&mock);

    assert_eq!(inst.get("output_B").unwrap(), Value::from("ON"));
    assert_eq!(inst.get("waittime_status").unwrap(), Value::from("OFF"));
    assert_eq!(inst.get("autorange").unwrap(), Value::from("ON"));
}

#[test]
fn snapshot_covers_readable_parameters() {
    let mock = MockTransport::new();
    mock.respond_to("*IDN?", "Keysight Technologies,B2902B,MY00000001,5.0.2020.1234");
    let mut inst = smu(&mock);

    let snapshot = inst.snapshot();
    assert!(!snapshot.contains_key("reset"));
    assert!(snapshot.contains_key("voltage_measure_A"));
    assert!(matches!(
        snapshot.get("identity"),
        Some(Reading::Value(Value::Text(idn))) if idn.starts_with("Keysight")
    ));
}

//! Behavioral properties of the parameter registry, exercised through a
//! scripted transport.

#![allow(clippy::unwrap_used)]

use instr_core::prelude::*;
use instr_core::transport::Exchange;

fn on_off_param(name: &str) -> ParameterSpec {
    ParameterSpec::new(name)
        .get_cmd("STAT?")
        .set_cmd("STAT {val}")
        .val_mapping([("ON", "1"), ("OFF", "0")])
}

fn ranged(name: &str, min: f64, max: f64) -> ParameterSpec {
    ParameterSpec::new(name)
        .get_cmd("LEV?")
        .set_cmd("LEV {val}")
        .validator(Validator::numbers(min, max))
        .parser(ResponseParser::Float)
}

#[test]
fn boolean_mapping_set_and_get() {
    let mut reg = ParameterRegistry::new();
    reg.register(on_off_param("p")).unwrap();

    let mut mock = MockTransport::with_responses(["1", "0", "2"]);
    reg.set("p", "ON", &mut mock).unwrap();
    reg.set("p", "OFF", &mut mock).unwrap();
    assert_eq!(mock.sent(), ["STAT 1", "STAT 0"]);

    assert_eq!(reg.get("p", &mut mock).unwrap(), Value::from("ON"));
    assert_eq!(reg.get("p", &mut mock).unwrap(), Value::from("OFF"));
    match reg.get("p", &mut mock) {
        Err(GetError::UnmappedResponse { name, response }) => {
            assert_eq!(name, "p");
            assert_eq!(response, "2");
        }
        other => panic!("expected UnmappedResponse, got {:?}", other),
    }
}

#[test]
fn unmapped_logical_value_sends_nothing() {
    let mut reg = ParameterRegistry::new();
    reg.register(on_off_param("p")).unwrap();
    let mut mock = MockTransport::new();

    assert!(matches!(
        reg.set("p", "MAYBE", &mut mock),
        Err(SetError::InvalidValue { .. })
    ));
    assert!(matches!(
        reg.set("p", true, &mut mock),
        Err(SetError::InvalidValue { .. })
    ));
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn range_boundaries_and_no_io_on_rejection() {
    let ranges = [(0.0, 32.05), (5e-4, 3.0), (-10.0, 10.0), (1e-5, 1e7)];
    for (min, max) in ranges {
        let mut reg = ParameterRegistry::new();
        reg.register(ranged("p", min, max)).unwrap();

        let mut mock = MockTransport::new();
        reg.set("p", min, &mut mock).unwrap();
        reg.set("p", max, &mut mock).unwrap();
        assert_eq!(mock.call_count(), 2);

        let reject = MockTransport::new();
        let mut handle = reject.clone();
        let eps = (max - min).abs() * 1e-6;
        for bad in [min - eps, max + eps] {
            assert!(matches!(
                reg.set("p", bad, &mut handle),
                Err(SetError::InvalidValue { .. })
            ));
        }
        assert_eq!(reject.call_count(), 0, "range [{}, {}]", min, max);
    }
}

#[test]
fn get_is_never_cached() {
    let mut reg = ParameterRegistry::new();
    reg.register(ranged("p", 0.0, 1.0)).unwrap();

    let mut mock = MockTransport::new();
    mock.respond_to("LEV?", "0.5");
    let first = reg.get("p", &mut mock).unwrap();
    let second = reg.get("p", &mut mock).unwrap();
    assert_eq!(first, second);
    assert_eq!(mock.exchanges(), vec![
        Exchange::Query("LEV?".into()),
        Exchange::Query("LEV?".into()),
    ]);
}

#[test]
fn mapping_round_trip() {
    let mapping = ValueMapping::new([
        ("immediate", "NONE"),
        ("timer1", "TIM1"),
        ("notify1", "NOT1"),
        ("front-panel", "DISP"),
        ("bus", "COMM"),
        ("external", "EXT"),
    ])
    .unwrap();
    for v in mapping.logical_values() {
        let wire = mapping.to_wire(v).unwrap();
        assert_eq!(mapping.from_wire(wire), Some(v));
    }
}

#[test]
fn duplicate_registration_keeps_original() {
    let mut reg = ParameterRegistry::new();
    reg.register(ranged("voltage", 0.0, 32.05)).unwrap();

    let replacement = ParameterSpec::new("voltage")
        .get_cmd("OTHER?")
        .set_cmd("OTHER {val}");
    assert_eq!(
        reg.register(replacement).unwrap_err(),
        RegistrationError::DuplicateName("voltage".into())
    );

    let mut mock = MockTransport::with_responses(["1.5"]);
    assert_eq!(reg.get("voltage", &mut mock).unwrap(), Value::Float(1.5));
    assert!(reg.set("voltage", 40.0, &mut mock).is_err());
    reg.set("voltage", 2.0, &mut mock).unwrap();
    assert_eq!(mock.queries(), ["LEV?"]);
    assert_eq!(mock.sent(), ["LEV 2"]);
}

#[test]
fn power_supply_voltage_scenario() {
    let mut reg = ParameterRegistry::new();
    reg.register(
        ParameterSpec::new("voltage")
            .unit("V")
            .get_cmd("VOLT?")
            .set_cmd("VOLT {val}")
            .validator(Validator::numbers(0.0, 32.05))
            .parser(ResponseParser::Float),
    )
    .unwrap();

    let mut mock = MockTransport::with_responses(["15.000"]);
    reg.set("voltage", 32.05, &mut mock).unwrap();
    assert_eq!(mock.sent(), ["VOLT 32.05"]);

    assert!(matches!(
        reg.set("voltage", 32.06, &mut mock),
        Err(SetError::InvalidValue { .. })
    ));
    assert_eq!(mock.sent(), ["VOLT 32.05"]);

    assert_eq!(reg.get("voltage", &mut mock).unwrap(), Value::Float(15.0));
}

#[test]
fn output_custom_getter_scenario() {
    let mut reg = ParameterRegistry::new();
    reg.register(
        ParameterSpec::new("output")
            .get_with(getters::bool_state("OUTP?"))
            .set_cmd("OUTP {val}")
            .mapping(ValueMapping::on_off()),
    )
    .unwrap();

    let mut mock = MockTransport::with_responses(["1", "0", "3"]);
    assert_eq!(reg.get("output", &mut mock).unwrap(), Value::from("ON"));
    assert_eq!(reg.get("output", &mut mock).unwrap(), Value::from("OFF"));
    assert!(matches!(
        reg.get("output", &mut mock),
        Err(GetError::UnmappedResponse { .. })
    ));
    assert_eq!(mock.queries(), ["OUTP?", "OUTP?", "OUTP?"]);

    reg.set("output", "ON", &mut mock).unwrap();
    assert_eq!(mock.sent(), ["OUTP ON"]);
}

#[test]
fn transport_errors_pass_through() {
    let mut reg = ParameterRegistry::new();
    reg.register(ranged("p", 0.0, 1.0)).unwrap();
    let mut mock = MockTransport::new();
    assert!(matches!(
        reg.get("p", &mut mock),
        Err(GetError::Transport(TransportError::NoResponse(cmd))) if cmd == "LEV?"
    ));
}

#[test]
fn functions_validate_arguments_before_sending() {
    let mut reg = ParameterRegistry::new();
    reg.register_function(
        FunctionSpec::new("apply", "APPL {0},{1}")
            .arg(Validator::numbers(1e-3, 32.05))
            .arg(Validator::numbers(5e-4, 3.0)),
    )
    .unwrap();
    reg.register_function(FunctionSpec::new("voltage_up", "VOLT UP"))
        .unwrap();

    let mut mock = MockTransport::new();
    reg.call("apply", &[Value::Float(5.0), Value::Float(0.1)], &mut mock)
        .unwrap();
    reg.call("voltage_up", &[], &mut mock).unwrap();
    assert_eq!(mock.sent(), ["APPL 5,0.1", "VOLT UP"]);

    assert!(matches!(
        reg.call("apply", &[Value::Float(5.0)], &mut mock),
        Err(CallError::ArgumentCount { expected: 2, got: 1, .. })
    ));
    assert!(matches!(
        reg.call("apply", &[Value::Float(5.0), Value::Float(4.0)], &mut mock),
        Err(CallError::InvalidArgument { index: 1, .. })
    ));
    assert!(matches!(
        reg.call("nope", &[], &mut mock),
        Err(CallError::UnknownFunction(_))
    ));
    assert_eq!(mock.sent().len(), 2);
}

#[test]
fn parameter_and_function_names_share_namespace() {
    let mut reg = ParameterRegistry::new();
    reg.register(ParameterSpec::new("reset").set_cmd("*RST")).unwrap();
    assert_eq!(
        reg.register_function(FunctionSpec::new("reset", "*RST"))
            .unwrap_err(),
        RegistrationError::DuplicateName("reset".into())
    );
}

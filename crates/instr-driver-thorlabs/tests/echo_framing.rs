//! Thorlabs command tables over framed transports, as the factories
//! configure them for real serial links.

#![allow(clippy::unwrap_used)]

use instr_core::framing::FramedTransport;
use instr_core::prelude::*;
use instr_core::transport::LineTransport;
use instr_driver_thorlabs::{mc2000b, mcls, Mc2000bFactory, MclsFactory};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

/// In-memory serial line. Each terminated write releases the next reply.
struct SerialLine {
    replies: VecDeque<Vec<u8>>,
    readable: VecDeque<u8>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl SerialLine {
    fn new(replies: &[&str]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let line = Self {
            replies: replies.iter().map(|r| r.as_bytes().to_vec()).collect(),
            readable: VecDeque::new(),
            written: written.clone(),
        };
        (line, written)
    }
}

impl Read for SerialLine {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.readable.len());
        for (slot, byte) in buf.iter_mut().zip(self.readable.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for SerialLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(buf);
        if buf.ends_with(b"\r") {
            if let Some(reply) = self.replies.pop_front() {
                self.readable.extend(reply);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn framed(mock: &MockTransport, factory: &dyn InstrumentFactory) -> FramedTransport<MockTransport> {
    FramedTransport::new(mock.clone(), factory.connection().framing)
}

#[test]
fn chopper_payload_between_echo_and_prompt() {
    let mock = MockTransport::with_responses([
        "freq?\r500\r",
        "> blade?\r7\r",
        "freq=600\r",
    ]);
    let mut chopper = Instrument::new(
        "chopper",
        mc2000b::registry().unwrap(),
        framed(&mock, &Mc2000bFactory),
    );

    assert_eq!(chopper.get("frequency").unwrap(), Value::Float(500.0));
    assert_eq!(chopper.get("blade").unwrap(), Value::from("MC1F2P10"));
    chopper.set("frequency", 600).unwrap();

    assert_eq!(mock.queries(), ["freq?", "blade?", "freq=600"]);
    assert_eq!(mock.remaining(), 0);
}

#[test]
fn chopper_over_line_transport() {
    let (line, written) = SerialLine::new(&["freq?\r500\r>", "freq=600\r>"]);
    let defaults = Mc2000bFactory.connection();
    assert_eq!(defaults.terminators, Terminators::new("\r", ">"));

    let transport = FramedTransport::new(
        LineTransport::new(line, defaults.terminators),
        defaults.framing,
    );
    let mut chopper = Instrument::new("chopper", mc2000b::registry().unwrap(), transport);

    assert_eq!(chopper.get("frequency").unwrap(), Value::Float(500.0));
    chopper.set("frequency", 600).unwrap();

    assert_eq!(written.lock().unwrap().as_slice(), b"freq?\rfreq=600\r");
}

#[test]
fn chopper_response_without_echo_is_rejected() {
    let mock = MockTransport::with_responses(["500\r"]);
    let mut chopper = Instrument::new(
        "chopper",
        mc2000b::registry().unwrap(),
        framed(&mock, &Mc2000bFactory),
    );

    assert!(matches!(
        chopper.get("frequency"),
        Err(GetError::Transport(TransportError::Framing { .. }))
    ));
}

#[test]
fn laser_current_checks_channel_through_echo() {
    let mock = MockTransport::with_responses([
        "channel?",
        "1",
        "current=30",
        "channel?",
        "1",
    ]);
    let mut laser = Instrument::new("laser", mcls::registry().unwrap(), framed(&mock, &MclsFactory));

    laser.set("current", 30.0).unwrap();
    assert!(matches!(
        laser.set("current", 40.0),
        Err(SetError::InvalidValue { .. })
    ));
    assert_eq!(mock.queries(), ["channel?", "current=30", "channel?"]);
    assert_eq!(mock.remaining(), 0);
}

#[test]
fn laser_wrong_echo_is_rejected() {
    let mock = MockTransport::with_responses(["CMD_NOT_DEFINED"]);
    let mut laser = Instrument::new("laser", mcls::registry().unwrap(), framed(&mock, &MclsFactory));

    assert!(matches!(
        laser.get("power"),
        Err(GetError::Transport(TransportError::Framing { .. }))
    ));
}

//! `instr-core`
//!
//! Parameter registry, transports and driver traits for SCPI/ASCII
//! laboratory instruments.
//!
//! Every instrument setting (voltage, output state, frequency, mode) is a
//! named [`ParameterSpec`] translating between a typed logical [`Value`] and
//! a textual wire command. One [`ParameterRegistry`] per instrument
//! interprets those specs against a blocking [`Transport`].
//!
//! ## Layers
//!
//! - **Conversion** (pure): [`Validator`], [`ValueMapping`], [`ResponseParser`],
//!   [`CommandTemplate`]
//! - **Registry**: [`ParameterRegistry`] and [`Session`], validate before write,
//!   no caching on read
//! - **Transport**: [`transport::LineTransport`], [`transport::TcpTransport`],
//!   `SerialTransport` (feature `serial`), [`transport::MockTransport`],
//!   plus [`framing::FramedTransport`] for echoing devices
//! - **Drivers**: [`driver::InstrumentFactory`] per model,
//!   [`driver::DriverRegistry`] to open configured devices
//!
//! ## Example
//!
//! ```rust
//! use instr_core::prelude::*;
//!
//! let mut registry = ParameterRegistry::new();
//! registry
//!     .register(
//!         ParameterSpec::new("voltage")
//!             .unit("V")
//!             .get_cmd("VOLT?")
//!             .set_cmd("VOLT {val}")
//!             .validator(Validator::numbers(0.0, 32.05))
//!             .parser(ResponseParser::Float),
//!     )
//!     .unwrap();
//!
//! let mock = MockTransport::with_responses(["15.000"]);
//! let mut psu = Instrument::new("psu", registry, mock.clone());
//! psu.set("voltage", 32.05).unwrap();
//! assert!(psu.set("voltage", 32.06).is_err());
//! assert_eq!(psu.get("voltage").unwrap(), Value::Float(15.0));
//! assert_eq!(mock.sent(), ["VOLT 32.05"]);
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod framing;
pub mod function;
pub mod instrument;
pub mod mapping;
pub mod parameter;
pub mod parser;
pub mod registry;
pub mod template;
pub mod transport;
pub mod validator;
pub mod value;

pub use error::{CallError, GetError, RegistrationError, SetError, TransportError};
pub use function::FunctionSpec;
pub use instrument::{Instrument, Reading};
pub use mapping::ValueMapping;
pub use parameter::{getters, GetStrategy, ParameterSpec, SetStrategy};
pub use parser::ResponseParser;
pub use registry::{FunctionInfo, ParameterInfo, ParameterRegistry, Session};
pub use template::CommandTemplate;
pub use transport::Transport;
pub use validator::Validator;
pub use value::Value;

/// Everything a driver crate needs to declare a command table.
pub mod prelude {
    pub use crate::driver::{ConnectionDefaults, InstrumentFactory};
    pub use crate::error::{CallError, GetError, RegistrationError, SetError, TransportError};
    pub use crate::framing::ResponseFraming;
    pub use crate::function::FunctionSpec;
    pub use crate::instrument::{Instrument, Reading};
    pub use crate::mapping::ValueMapping;
    pub use crate::parameter::{getters, ParameterSpec};
    pub use crate::parser::ResponseParser;
    pub use crate::registry::{ParameterRegistry, Session};
    pub use crate::transport::{MockTransport, SerialSettings, Terminators, Transport};
    pub use crate::validator::Validator;
    pub use crate::value::Value;
}

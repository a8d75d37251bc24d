//! # labinstr
//!
//! Application library behind the `labinstr` command-line tool. The
//! instrument model lives in `instr-core` and the drivers in the
//! `instr-driver-*` crates; this crate adds what an application needs on
//! top of them.
//!
//! ## Crate Structure
//!
//! - **`config`**: `AppConfig`, loaded with Figment from a TOML file plus
//!   `LABINSTR_` environment overrides, and validated against the linked
//!   drivers.
//! - **`logging`**: `tracing-subscriber` setup (`RUST_LOG` or the configured
//!   level, pretty or JSON output).

pub mod config;
pub mod logging;

pub use config::{AppConfig, ConfigError};
pub use instr_core;
pub use instr_drivers;

//! CLI Entry Point for labinstr
//!
//! Reads and writes instrument parameters of configured devices.
//!
//! # Usage
//!
//! ```bash
//! labinstr drivers
//! labinstr params hmc8043
//! labinstr --config lab.toml set psu voltage 5.0
//! labinstr get psu voltage
//! labinstr call psu apply 5.0 0.1
//! labinstr --json snapshot psu
//! labinstr --dry-run set psu output ON
//! ```

// Global allocator (Microsoft Rust Guidelines: M-MIMALLOC-APPS)
#[cfg(not(test))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use instr_core::driver::DriverRegistry;
use instr_core::transport::{DynTransport, Exchange, MockTransport};
use instr_core::{CallError, GetError, Instrument, Reading, SetError, TransportError, Value};
use labinstr::config::{AppConfig, DEFAULT_CONFIG_PATH};
use labinstr::logging::{self, LogFormat};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "labinstr")]
#[command(about = "Read and write SCPI/ASCII laboratory instrument parameters", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print the wire commands instead of talking to the instrument
    #[arg(long, global = true)]
    dry_run: bool,

    /// JSON output and JSON log events
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List linked drivers
    Drivers,

    /// List the parameters and functions of a driver
    Params {
        /// Driver type, e.g. hmc8043
        driver: String,
    },

    /// Read a parameter
    Get {
        /// Device id from the configuration
        device: String,
        /// Parameter name
        param: String,
    },

    /// Write a parameter
    Set {
        /// Device id from the configuration
        device: String,
        /// Parameter name
        param: String,
        /// Logical value (number, true/false, or text)
        value: String,
    },

    /// Invoke an instrument function
    Call {
        /// Device id from the configuration
        device: String,
        /// Function name
        function: String,
        /// Arguments
        args: Vec<String>,
    },

    /// Read every readable parameter
    Snapshot {
        /// Device id from the configuration
        device: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    instr_drivers::link_drivers();
    let drivers = instr_drivers::registry();
    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };

    match &cli.command {
        Commands::Drivers => {
            logging::init("warn", format)?;
            list_drivers(&drivers, cli.json)
        }
        Commands::Params { driver } => {
            logging::init("warn", format)?;
            list_params(&drivers, driver, cli.json)
        }
        Commands::Get { device, .. }
        | Commands::Set { device, .. }
        | Commands::Call { device, .. }
        | Commands::Snapshot { device } => {
            let config = AppConfig::load(&cli.config)?;
            logging::init(&config.log_level, format)?;
            config.validate(&drivers)?;
            let device = device.clone();
            run_device_command(&cli, &drivers, &config, &device)
        }
    }
}

fn list_drivers(drivers: &DriverRegistry, json: bool) -> Result<()> {
    let info = drivers.factory_info();
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        for f in info {
            println!("{:<16} {}", f.driver_type, f.name);
        }
    }
    Ok(())
}

fn list_params(drivers: &DriverRegistry, driver: &str, json: bool) -> Result<()> {
    let registry = drivers.build_registry(driver)?;
    let params = registry.describe();
    let functions = registry.describe_functions();

    if json {
        let out = json!({ "driver": driver, "parameters": params, "functions": functions });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for p in params {
        let access = match (p.readable, p.settable) {
            (true, true) => "rw",
            (true, false) => "r",
            (false, true) => "w",
            (false, false) => "-",
        };
        println!(
            "{:<24} {:<3} {:<6} {}",
            p.name,
            access,
            p.unit.as_deref().unwrap_or(""),
            p.domain.as_deref().unwrap_or("")
        );
    }
    for f in functions {
        println!(
            "{:<24} fn  {:<6} {}",
            f.name,
            "",
            f.doc.as_deref().unwrap_or(&f.command)
        );
    }
    Ok(())
}

fn run_device_command(
    cli: &Cli,
    drivers: &DriverRegistry,
    config: &AppConfig,
    id: &str,
) -> Result<()> {
    let device = config
        .device(id)
        .with_context(|| format!("No device '{}' in {}", id, cli.config.display()))?;

    if cli.dry_run {
        return dry_run(cli, drivers, &device.driver, id);
    }

    let mut instrument = drivers.open(device)?;
    execute(&cli.command, &mut instrument, cli.json)
}

/// Run the command against a recording transport and print the exchanges.
fn dry_run(cli: &Cli, drivers: &DriverRegistry, driver: &str, id: &str) -> Result<()> {
    let registry = drivers.build_registry(driver)?;
    let mock = MockTransport::new();
    let transport: DynTransport = Box::new(mock.clone());
    let mut instrument = Instrument::new(id, registry, transport);

    // Queries have no answer without an instrument; the attempt is what counts
    if let Err(e) = execute(&cli.command, &mut instrument, cli.json) {
        if !is_unanswered(&e) {
            return Err(e);
        }
        tracing::debug!("dry run: {:#}", e);
    }

    let exchanges: Vec<String> = mock
        .exchanges()
        .into_iter()
        .filter_map(|x| match x {
            Exchange::Send(cmd) => Some(format!("send  {}", cmd)),
            Exchange::Query(cmd) => Some(format!("query {}", cmd)),
            Exchange::Receive | Exchange::Clear => None,
        })
        .collect();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&json!({ "dry_run": exchanges }))?);
    } else {
        for line in exchanges {
            println!("{}", line);
        }
    }
    Ok(())
}

/// True if `e` only reports that the recording transport had nothing to answer.
fn is_unanswered(e: &anyhow::Error) -> bool {
    let transport = if let Some(GetError::Transport(t)) = e.downcast_ref::<GetError>() {
        t
    } else if let Some(SetError::Transport(t)) = e.downcast_ref::<SetError>() {
        t
    } else if let Some(CallError::Transport(t)) = e.downcast_ref::<CallError>() {
        t
    } else {
        return false;
    };
    matches!(transport, TransportError::NoResponse(_))
}

fn execute(command: &Commands, instrument: &mut Instrument<DynTransport>, json: bool) -> Result<()> {
    match command {
        Commands::Get { param, .. } => {
            let value = instrument.get(param)?;
            print_value(instrument.name(), param, &value, json)?;
        }
        Commands::Set { param, value, .. } => {
            let value = Value::infer(value);
            instrument.set(param, value.clone())?;
            tracing::info!(device = %instrument.name(), parameter = %param, value = %value, "Set");
        }
        Commands::Call { function, args, .. } => {
            let args: Vec<Value> = args.iter().map(|a| Value::infer(a)).collect();
            instrument.call(function, &args)?;
            tracing::info!(device = %instrument.name(), function = %function, "Called");
        }
        Commands::Snapshot { .. } => {
            let snapshot = instrument.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                for (name, reading) in snapshot {
                    match reading {
                        Reading::Value(v) => println!("{:<24} {}", name, v),
                        Reading::Error(e) => println!("{:<24} <error: {}>", name, e),
                    }
                }
            }
        }
        Commands::Drivers | Commands::Params { .. } => {}
    }
    Ok(())
}

fn print_value(device: &str, param: &str, value: &Value, json: bool) -> Result<()> {
    if json {
        let out = json!({ "device": device, "parameter": param, "value": value });
        println!("{}", serde_json::to_string(&out)?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

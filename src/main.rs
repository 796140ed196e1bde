//! si5351ctl - Si5351A clock generator control
//!
//! Drives a Si5351A over I2C: brings the chip up, locks PLLA to the
//! crystal, programs the CLK0-CLK2 MultiSynth outputs and gates them.
//!
//! # Architecture
//!
//! All chip logic lives in `si5351-core` behind the `Device` facade.
//! This binary only resolves configuration, opens a session through
//! `si5351-session` and maps subcommands onto facade calls. The
//! interactive menu (`repl`) is a second front-end over the same facade.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use si5351_core::config::DeviceConfig;
use si5351_core::retry::RetryPolicy;
use si5351_session::{open_device, BoxedTransport, Device};

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Plan { frequency } => commands::cmd_plan(&config, frequency),
        Commands::ListTransports => {
            commands::list_transports();
            Ok(())
        }
        Commands::Init => commands::cmd_init(&mut open(&cli.transport, config)?),
        Commands::Set { channel, frequency } => {
            commands::cmd_set(&mut open(&cli.transport, config)?, channel, frequency)
        }
        Commands::On { channel } => commands::cmd_on(&mut open(&cli.transport, config)?, channel),
        Commands::Off { channel } => {
            commands::cmd_off(&mut open(&cli.transport, config)?, channel)
        }
        Commands::Read { register } => {
            commands::cmd_read(&mut open(&cli.transport, config)?, register)
        }
        Commands::Status => commands::cmd_status(&mut open(&cli.transport, config)?),
        Commands::Shutdown => commands::cmd_shutdown(&mut open(&cli.transport, config)?),
        #[cfg(feature = "repl")]
        Commands::Repl => commands::repl::cmd_repl(&mut open(&cli.transport, config)?),
    }
}

/// Defaults, then the config file, then explicit flags
///
/// Transport string options are applied last, when the session opens.
fn load_config(cli: &Cli) -> Result<DeviceConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = DeviceConfig::from_toml_file(path)?;
            log::info!("Loaded configuration from {:?}", path);
            config
        }
        None => DeviceConfig::default(),
    };

    if let Some(bus) = cli.bus {
        config = config.with_bus(bus);
    }
    if let Some(address) = cli.address {
        config = config.with_address(address);
    }
    if let Some(load) = cli.crystal_load {
        config = config.with_crystal_load(load);
    }
    if let Some(drive) = cli.drive {
        config = config.with_drive_strength(drive);
    }
    if let Some(retries) = cli.retries {
        config = config.with_retry(RetryPolicy::new(retries, config.retry.backoff_ms));
    }
    Ok(config)
}

fn open(
    transport: &str,
    config: DeviceConfig,
) -> Result<Device<BoxedTransport>, Box<dyn std::error::Error>> {
    Ok(open_device(transport, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use si5351_core::config::{CrystalLoad, DriveStrength};

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "si5351ctl",
            "--bus",
            "2",
            "--address",
            "0x61",
            "--crystal-load",
            "6",
            "--drive",
            "2mA",
            "--retries",
            "7",
            "status",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.bus, 2);
        assert_eq!(config.address, 0x61);
        assert_eq!(config.crystal_load, CrystalLoad::Pf6);
        assert_eq!(config.drive, DriveStrength::Ma2);
        assert_eq!(config.retry, RetryPolicy::new(7, 50));
    }

    #[test]
    fn test_no_flags_keep_defaults() {
        let cli = Cli::parse_from(["si5351ctl", "status"]);
        assert_eq!(load_config(&cli).unwrap(), DeviceConfig::default());
    }
}

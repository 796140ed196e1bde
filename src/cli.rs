//! CLI argument parsing

use clap::{Parser, Subcommand};
use si5351_core::config::{parse_number, CrystalLoad, DriveStrength};
use si5351_core::registers::ChannelId;
use si5351_session::parse::{
    parse_channel, parse_crystal_load, parse_drive_strength, parse_frequency, parse_register,
};
use std::path::PathBuf;

/// Parse a hex or decimal byte
fn parse_u8(s: &str) -> Result<u8, String> {
    let value = parse_number(s)?;
    u8::try_from(value).map_err(|_| format!("value {} does not fit in a byte", value))
}

/// Generate dynamic help text for the transport argument
fn transport_help() -> String {
    format!(
        "Transport to use, with optional key=value options [available: {}]",
        si5351_session::transport_names_short()
    )
}

#[derive(Parser)]
#[command(name = "si5351ctl")]
#[command(author, version, about = "Si5351A clock generator control", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short, long, global = true, default_value = "linux_i2c", help = transport_help())]
    pub transport: String,

    /// I2C bus number (/dev/i2c-N)
    #[arg(long, global = true)]
    pub bus: Option<u8>,

    /// 7-bit device address (hex or decimal)
    #[arg(long, global = true, value_parser = parse_u8)]
    pub address: Option<u8>,

    /// Crystal load capacitance in pF (6, 8 or 10)
    #[arg(long, global = true, value_parser = parse_crystal_load)]
    pub crystal_load: Option<CrystalLoad>,

    /// Output drive strength in mA (2, 4, 6 or 8)
    #[arg(long, global = true, value_parser = parse_drive_strength)]
    pub drive: Option<DriveStrength>,

    /// Attempts per register transaction
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub retries: Option<u32>,

    /// Device configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the chip and lock PLLA
    Init,

    /// Program an output frequency and enable the output
    Set {
        /// Output (0-2 or CLK0-CLK2)
        #[arg(value_parser = parse_channel)]
        channel: ChannelId,

        /// Frequency in Hz (k and M suffixes accepted, e.g. 7.1M)
        #[arg(value_parser = parse_frequency)]
        frequency: u32,
    },

    /// Enable an output
    On {
        /// Output (0-2 or CLK0-CLK2)
        #[arg(value_parser = parse_channel)]
        channel: ChannelId,
    },

    /// Disable an output
    Off {
        /// Output (0-2 or CLK0-CLK2)
        #[arg(value_parser = parse_channel)]
        channel: ChannelId,
    },

    /// Read a register
    Read {
        /// Register address (hex or decimal)
        #[arg(value_parser = parse_register)]
        register: u8,
    },

    /// Show the status register and output states
    Status,

    /// Show divider settings for a frequency without touching the device
    Plan {
        /// Frequency in Hz (k and M suffixes accepted)
        #[arg(value_parser = parse_frequency)]
        frequency: u32,
    },

    /// Disable and power down all outputs and reset the PLLs
    #[command(alias = "exit")]
    Shutdown,

    /// List available transports
    ListTransports,

    /// Interactive menu
    #[cfg(feature = "repl")]
    Repl,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_u8() {
        assert_eq!(parse_u8("0x60"), Ok(0x60));
        assert_eq!(parse_u8("96"), Ok(0x60));
        assert!(parse_u8("0x100").is_err());
        assert!(parse_u8("x").is_err());
    }

    #[test]
    fn test_electrical_flags() {
        let cli = Cli::parse_from([
            "si5351ctl",
            "status",
            "--crystal-load",
            "8pF",
            "--drive",
            "4",
            "--retries",
            "3",
        ]);
        assert_eq!(cli.crystal_load, Some(CrystalLoad::Pf8));
        assert_eq!(cli.drive, Some(DriveStrength::Ma4));
        assert_eq!(cli.retries, Some(3));
        assert!(Cli::try_parse_from(["si5351ctl", "status", "--retries", "0"]).is_err());
        assert!(Cli::try_parse_from(["si5351ctl", "status", "--drive", "5"]).is_err());
    }

    #[test]
    fn test_set_arguments() {
        let cli = Cli::parse_from(["si5351ctl", "-t", "dummy", "set", "clk1", "7.1M"]);
        assert_eq!(cli.transport, "dummy");
        match cli.command {
            Commands::Set { channel, frequency } => {
                assert_eq!(channel, ChannelId::CLK1);
                assert_eq!(frequency, 7_100_000);
            }
            _ => panic!("expected set"),
        }
    }

    #[test]
    fn test_exit_alias_and_globals() {
        let cli = Cli::parse_from(["si5351ctl", "exit", "--address", "0x61", "-vv"]);
        assert!(matches!(cli.command, Commands::Shutdown));
        assert_eq!(cli.address, Some(0x61));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.transport, "linux_i2c");
    }

    #[test]
    fn test_rejects_bad_channel() {
        assert!(Cli::try_parse_from(["si5351ctl", "on", "3"]).is_err());
    }
}

//! Interactive menu for driving a Si5351A
//!
//! This crate provides a small line-oriented menu over an open
//! [`Device`]. Each line is one command; results and errors are printed
//! and the loop continues. Device errors never end the session.
//!
//! # Example Session
//!
//! ```text
//! si5351> init
//! Si5351A initialized, PLLA locked
//! si5351> set 0 10M
//! CLK0 set to 10000000 Hz
//! si5351> read 0x10
//! Register 0x10 = 0x4F
//! si5351> exit
//! Reset complete, all outputs disabled
//! ```

mod command;
mod error;
pub mod helper;

pub use command::{MenuCommand, COMMANDS};
pub use error::ReplError;

use crate::helper::MenuHelper;
use colored::Colorize;
use directories::ProjectDirs;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use si5351_core::device::{Device, DeviceState};
use si5351_core::transport::I2cTransport;
use si5351_session::report;
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Whether the menu keeps running after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Leave,
}

fn banner() -> String {
    format!("=== Si5351A clock generator ({}) ===", VERSION)
        .bright_yellow()
        .bold()
        .to_string()
}

/// Get the history file path
fn history_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "si5351ctl") {
        let mut path = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&path).ok();
        path.push("menu_history");
        path
    } else {
        PathBuf::from(".si5351ctl_history")
    }
}

fn print_help() {
    println!("Commands:");
    for (name, args, description) in COMMANDS {
        let usage = format!("{} {}", name, args);
        println!("  {:20} - {}", usage.trim_end().bright_cyan(), description);
    }
}

fn error(message: impl std::fmt::Display) {
    eprintln!("{}: {}", "Error".bright_red().bold(), message);
}

/// Execute one command against the device
///
/// Device errors are printed; only `exit` and `quit` end the loop.
pub fn execute<T: I2cTransport>(device: &mut Device<T>, command: MenuCommand) -> Flow {
    match command {
        MenuCommand::Init => match device.init() {
            Ok(DeviceState::Locked) => println!("Si5351A initialized, PLLA locked"),
            Ok(state) => error(format_args!("Initialization failed: {}", state)),
            Err(e) => error(format_args!("Initialization failed: {}", e)),
        },
        MenuCommand::Set { channel, freq_hz } => match device.set_frequency(channel, freq_hz) {
            Ok(plan) => {
                let output_hz = device.synthesizer().output_hz(&plan);
                println!("{}", report::set_line(channel, freq_hz, output_hz));
            }
            Err(e) => error(e),
        },
        MenuCommand::On(channel) => match device.enable(channel) {
            Ok(()) => println!("{} enabled", channel),
            Err(e) => error(e),
        },
        MenuCommand::Off(channel) => match device.disable(channel) {
            Ok(()) => println!("{} disabled", channel),
            Err(e) => error(e),
        },
        MenuCommand::Read(register) => match device.read(register as u32) {
            Ok(value) => println!("Register 0x{:02X} = 0x{:02X}", register, value),
            Err(e) => error(e),
        },
        MenuCommand::Status => match device.status() {
            Ok(status) => {
                let outputs = device.output_states().ok();
                for line in report::status_lines(status, outputs) {
                    println!("{}", line);
                }
            }
            Err(e) => error(e),
        },
        MenuCommand::Plan(freq_hz) => match device.synthesizer().plan(freq_hz) {
            Ok(plan) => {
                let output_hz = device.synthesizer().output_hz(&plan);
                for line in report::plan_lines(freq_hz, &plan, output_hz) {
                    println!("{}", line);
                }
            }
            Err(e) => error(e),
        },
        MenuCommand::Help => print_help(),
        MenuCommand::Exit => {
            println!("Resetting Si5351A and disabling all outputs...");
            match device.shutdown() {
                Ok(()) => println!("Reset complete, all outputs disabled"),
                Err(e) => error(format_args!("{} (check the I2C connection)", e)),
            }
            return Flow::Leave;
        }
        MenuCommand::Quit => return Flow::Leave,
    }
    Flow::Continue
}

/// Run the menu until `exit`, `quit` or end of input
///
/// End of input (Ctrl-D) behaves like `exit`.
pub fn run_repl<T: I2cTransport>(device: &mut Device<T>) -> Result<(), ReplError> {
    let mut rl = Editor::<MenuHelper, FileHistory>::new()?;
    rl.set_helper(Some(MenuHelper));
    rl.set_auto_add_history(false);

    let history_path = history_path();
    if rl.load_history(&history_path).is_err() {
        log::debug!("No menu history at {}", history_path.display());
    }

    println!("{}", banner());
    print_help();
    println!();

    let prompt = format!("{} ", "si5351>".bright_green().bold());

    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let command = match MenuCommand::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        error(e);
                        continue;
                    }
                };
                let _ = rl.add_history_entry(line.trim());

                if execute(device, command) == Flow::Leave {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                execute(device, MenuCommand::Exit);
                break;
            }
            Err(err) => {
                if let Err(e) = rl.save_history(&history_path) {
                    log::warn!("Failed to save history: {}", e);
                }
                return Err(err.into());
            }
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        eprintln!(
            "{}: Failed to save history: {}",
            "Warning".bright_yellow(),
            e
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use si5351_core::config::DeviceConfig;
    use si5351_core::registers::ChannelId;
    use si5351_dummy::DummyChip;

    #[test]
    fn test_execute_session() {
        let mut chip = DummyChip::new_default();
        let mut device = Device::new(&mut chip, DeviceConfig::default()).unwrap();

        assert_eq!(execute(&mut device, MenuCommand::Init), Flow::Continue);
        assert_eq!(device.state(), DeviceState::Locked);
        let set = MenuCommand::Set {
            channel: ChannelId::CLK0,
            freq_hz: 10_000_000,
        };
        assert_eq!(execute(&mut device, set), Flow::Continue);
        assert_eq!(execute(&mut device, MenuCommand::Exit), Flow::Leave);
        assert_eq!(device.state(), DeviceState::Reset);
        drop(device);

        assert_eq!(chip.register(0x03), 0xFF);
        assert_eq!(chip.register(0x10), 0x80);
    }

    #[test]
    fn test_errors_do_not_end_the_session() {
        let mut chip = DummyChip::new_default();
        chip.fail_next(100);
        let mut device = Device::new(&mut chip, DeviceConfig::default()).unwrap();
        assert_eq!(execute(&mut device, MenuCommand::Status), Flow::Continue);
        assert_eq!(
            execute(&mut device, MenuCommand::Plan(1_000)),
            Flow::Continue
        );
    }

    #[test]
    fn test_quit_leaves_device_alone() {
        let mut chip = DummyChip::new_default();
        let mut device = Device::new(&mut chip, DeviceConfig::default()).unwrap();
        assert_eq!(execute(&mut device, MenuCommand::Quit), Flow::Leave);
        drop(device);
        assert!(chip.transactions().is_empty());
    }
}

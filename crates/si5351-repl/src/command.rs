//! Menu command parsing

use crate::error::ReplError;
use si5351_core::registers::ChannelId;
use si5351_session::parse::{parse_channel, parse_frequency, parse_register};

/// Command words with their argument syntax, in help order
pub const COMMANDS: &[(&str, &str, &str)] = &[
    ("init", "", "Initialize the Si5351A and lock PLLA"),
    ("set", "<clk> <freq>", "Program CLK0-CLK2 (e.g. set 0 10000000, set 1 7.1M)"),
    ("on", "<clk>", "Enable an output"),
    ("off", "<clk>", "Disable an output"),
    ("read", "<reg>", "Read a register (e.g. read 0, read 0xB7)"),
    ("status", "", "Show the status register and output states"),
    ("plan", "<freq>", "Show divider settings without touching the device"),
    ("help", "", "Show this list"),
    ("exit", "", "Reset the device, disable all outputs and leave"),
    ("quit", "", "Leave without touching the device"),
];

/// One parsed menu line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Init,
    Set { channel: ChannelId, freq_hz: u32 },
    On(ChannelId),
    Off(ChannelId),
    Read(u8),
    Status,
    Plan(u32),
    Help,
    Exit,
    Quit,
}

fn usage(word: &str) -> ReplError {
    let args = COMMANDS
        .iter()
        .find(|(name, _, _)| *name == word)
        .map(|(_, args, _)| *args)
        .unwrap_or("");
    ReplError::InvalidCommand(format!("Usage: {} {}", word, args).trim_end().to_string())
}

impl MenuCommand {
    /// Parse a non-empty input line
    ///
    /// Words are case-insensitive. Returns `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, ReplError> {
        let lowered = line.trim().to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        let Some((&word, args)) = words.split_first() else {
            return Ok(None);
        };

        let invalid = |e: String| ReplError::InvalidCommand(e);
        let command = match (word, args) {
            ("init", []) => Self::Init,
            ("set", [clk, freq]) => Self::Set {
                channel: parse_channel(clk).map_err(invalid)?,
                freq_hz: parse_frequency(freq).map_err(invalid)?,
            },
            ("on", [clk]) => Self::On(parse_channel(clk).map_err(invalid)?),
            ("off", [clk]) => Self::Off(parse_channel(clk).map_err(invalid)?),
            ("read", [reg]) => Self::Read(parse_register(reg).map_err(invalid)?),
            ("status", []) => Self::Status,
            ("plan", [freq]) => Self::Plan(parse_frequency(freq).map_err(invalid)?),
            ("help" | "?", []) => Self::Help,
            ("exit", []) => Self::Exit,
            ("quit" | "q", []) => Self::Quit,
            (word, _) if COMMANDS.iter().any(|(name, _, _)| *name == word) => {
                return Err(usage(word))
            }
            (word, _) => {
                return Err(ReplError::InvalidCommand(format!(
                    "Unknown command: {} (type help)",
                    word
                )))
            }
        };
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> MenuCommand {
        MenuCommand::parse(line).unwrap().unwrap()
    }

    fn error(line: &str) -> String {
        MenuCommand::parse(line).unwrap_err().to_string()
    }

    #[test]
    fn test_simple_words() {
        assert_eq!(parse("init"), MenuCommand::Init);
        assert_eq!(parse("  STATUS "), MenuCommand::Status);
        assert_eq!(parse("exit"), MenuCommand::Exit);
        assert_eq!(parse("quit"), MenuCommand::Quit);
        assert_eq!(parse("?"), MenuCommand::Help);
    }

    #[test]
    fn test_blank_line() {
        assert!(MenuCommand::parse("   ").unwrap().is_none());
    }

    #[test]
    fn test_set() {
        assert_eq!(
            parse("set 0 1000000"),
            MenuCommand::Set {
                channel: ChannelId::CLK0,
                freq_hz: 1_000_000
            }
        );
        assert_eq!(
            parse("set CLK2 7.1M"),
            MenuCommand::Set {
                channel: ChannelId::CLK2,
                freq_hz: 7_100_000
            }
        );
    }

    #[test]
    fn test_outputs_and_registers() {
        assert_eq!(parse("on 1"), MenuCommand::On(ChannelId::CLK1));
        assert_eq!(parse("off clk2"), MenuCommand::Off(ChannelId::CLK2));
        assert_eq!(parse("read 0"), MenuCommand::Read(0));
        assert_eq!(parse("read 0xb7"), MenuCommand::Read(0xB7));
        assert_eq!(parse("plan 100k"), MenuCommand::Plan(100_000));
    }

    #[test]
    fn test_errors() {
        assert_eq!(error("set 0"), "Usage: set <clk> <freq>");
        assert_eq!(error("status now"), "Usage: status");
        assert!(error("on 3").contains("CLK3"));
        assert!(error("read 300").contains("300"));
        assert_eq!(error("frobnicate"), "Unknown command: frobnicate (type help)");
    }
}

//! Argument parsing shared by the command line and the menu

use si5351_core::config::{parse_number, CrystalLoad, DriveStrength};
use si5351_core::registers::{ChannelId, RegisterAddress};

/// Parse an output name: `0`-`2` or `clk0`-`clk2`
pub fn parse_channel(s: &str) -> Result<ChannelId, String> {
    let s = s.trim();
    let digits = s
        .strip_prefix("clk")
        .or_else(|| s.strip_prefix("CLK"))
        .unwrap_or(s);
    let n: u32 = digits
        .parse()
        .map_err(|_| format!("invalid output '{}' (expected 0-2 or CLK0-CLK2)", s))?;
    ChannelId::new(n).map_err(|e| e.to_string())
}

/// Parse a register number, decimal or `0x` hex
pub fn parse_register(s: &str) -> Result<u8, String> {
    let n = parse_number(s)?;
    RegisterAddress::new(n)
        .map(|r| r.get())
        .map_err(|e| e.to_string())
}

/// Parse a crystal load capacitance: `6`, `8` or `10`, optionally with `pF`
pub fn parse_crystal_load(s: &str) -> Result<CrystalLoad, String> {
    let s = s.trim();
    let digits = s
        .strip_suffix("pF")
        .or_else(|| s.strip_suffix("pf"))
        .unwrap_or(s);
    digits
        .parse()
        .ok()
        .and_then(CrystalLoad::from_pf)
        .ok_or_else(|| format!("invalid crystal load '{}' (expected 6, 8 or 10 pF)", s))
}

/// Parse an output drive strength: `2`, `4`, `6` or `8`, optionally with `mA`
pub fn parse_drive_strength(s: &str) -> Result<DriveStrength, String> {
    let s = s.trim();
    let digits = s
        .strip_suffix("mA")
        .or_else(|| s.strip_suffix("ma"))
        .unwrap_or(s);
    digits
        .parse()
        .ok()
        .and_then(DriveStrength::from_ma)
        .ok_or_else(|| format!("invalid drive strength '{}' (expected 2, 4, 6 or 8 mA)", s))
}

/// Parse a frequency in Hz
///
/// Accepts plain integers and `k`/`M` suffixes with an optional decimal
/// part, e.g. `7100000`, `7.1M`, `32.768k`, `25MHz`. The result must be a
/// whole number of hertz; range checks are left to the synthesizer.
pub fn parse_frequency(s: &str) -> Result<u32, String> {
    let trimmed = s.trim();
    let body = trimmed
        .strip_suffix("Hz")
        .or_else(|| trimmed.strip_suffix("hz"))
        .unwrap_or(trimmed);

    let (number, scale) = match body.char_indices().last() {
        Some((i, 'k' | 'K')) => (&body[..i], 1_000u64),
        Some((i, 'm' | 'M')) => (&body[..i], 1_000_000u64),
        _ => (body, 1u64),
    };

    let invalid = || format!("invalid frequency '{}'", trimmed);
    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let parse = |digits: &str| -> Result<u64, String> {
        if digits.is_empty() {
            Ok(0)
        } else {
            digits.parse::<u64>().map_err(|_| invalid())
        }
    };
    let whole_hz = parse(whole)?.checked_mul(scale).ok_or_else(invalid)?;

    let frac_hz = if frac.is_empty() {
        0
    } else {
        let denominator = 10u64.checked_pow(frac.len() as u32).ok_or_else(invalid)?;
        let numerator = parse(frac)?.checked_mul(scale).ok_or_else(invalid)?;
        if numerator % denominator != 0 {
            return Err(format!("frequency '{}' is not a whole number of Hz", trimmed));
        }
        numerator / denominator
    };

    u32::try_from(whole_hz + frac_hz).map_err(|_| format!("frequency '{}' too large", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel() {
        assert_eq!(parse_channel("0"), Ok(ChannelId::CLK0));
        assert_eq!(parse_channel("clk2"), Ok(ChannelId::CLK2));
        assert_eq!(parse_channel("CLK1"), Ok(ChannelId::CLK1));
        assert!(parse_channel("3").is_err());
        assert!(parse_channel("clk").is_err());
        assert!(parse_channel("-1").is_err());
    }

    #[test]
    fn test_parse_register() {
        assert_eq!(parse_register("0"), Ok(0));
        assert_eq!(parse_register("177"), Ok(0xB1));
        assert_eq!(parse_register("0xB7"), Ok(0xB7));
        assert!(parse_register("256").is_err());
        assert!(parse_register("reg").is_err());
    }

    #[test]
    fn test_parse_electrical_settings() {
        assert_eq!(parse_crystal_load("8"), Ok(CrystalLoad::Pf8));
        assert_eq!(parse_crystal_load("6pF"), Ok(CrystalLoad::Pf6));
        assert!(parse_crystal_load("7").is_err());
        assert_eq!(parse_drive_strength("4mA"), Ok(DriveStrength::Ma4));
        assert_eq!(parse_drive_strength("2"), Ok(DriveStrength::Ma2));
        assert!(parse_drive_strength("10").is_err());
        assert!(parse_drive_strength("strong").is_err());
    }

    #[test]
    fn test_parse_frequency() {
        assert_eq!(parse_frequency("7000000"), Ok(7_000_000));
        assert_eq!(parse_frequency("7.1M"), Ok(7_100_000));
        assert_eq!(parse_frequency("25MHz"), Ok(25_000_000));
        assert_eq!(parse_frequency("32.768k"), Ok(32_768));
        assert_eq!(parse_frequency("100k"), Ok(100_000));
        assert_eq!(parse_frequency("2500"), Ok(2_500));
    }

    #[test]
    fn test_parse_frequency_rejects() {
        assert!(parse_frequency("").is_err());
        assert!(parse_frequency("k").is_err());
        assert!(parse_frequency("1.5").is_err());
        assert!(parse_frequency("1.2345k").is_err());
        assert!(parse_frequency("5000M").is_err());
        assert!(parse_frequency("ten").is_err());
        assert!(parse_frequency("-5").is_err());
    }
}

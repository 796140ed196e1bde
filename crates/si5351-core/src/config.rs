//! Device configuration
//!
//! A [`DeviceConfig`] is built once, validated, and then handed to the
//! [`Device`](crate::device::Device) which passes it down to every layer.
//! There is no global state.
//!
//! With the `std` feature a configuration can also be loaded from TOML:
//!
//! ```toml
//! bus = 1
//! address = "0x60"
//! xtal_hz = 25000000
//! vco_hz = 800000000
//! retries = 5
//! backoff_ms = 50
//! crystal_load_pf = 10
//! drive_ma = 8
//! ```

use crate::error::{Error, Result};
use crate::registers::ClockControl;
use crate::retry::RetryPolicy;

/// Default Linux I2C bus number
pub const DEFAULT_BUS: u8 = 1;
/// Default 7-bit chip address
pub const DEFAULT_ADDRESS: u8 = 0x60;
/// Default crystal frequency (25 MHz)
pub const DEFAULT_XTAL_HZ: u32 = 25_000_000;
/// Default PLLA VCO frequency (800 MHz)
pub const DEFAULT_VCO_HZ: u32 = 800_000_000;

/// PLLA feedback multiplier (800 MHz / 25 MHz)
pub const PLL_MULTIPLIER: u32 = 32;
/// Lowest VCO frequency the PLL can run at
pub const VCO_MIN_HZ: u32 = 600_000_000;
/// Highest VCO frequency the PLL can run at
pub const VCO_MAX_HZ: u32 = 900_000_000;

/// Crystal internal load capacitance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrystalLoad {
    /// 6 pF
    Pf6,
    /// 8 pF
    Pf8,
    /// 10 pF
    #[default]
    Pf10,
}

impl CrystalLoad {
    /// Value for the crystal load register (0xB7), reserved bits included
    pub const fn register_value(self) -> u8 {
        match self {
            Self::Pf6 => 0x52,
            Self::Pf8 => 0x92,
            Self::Pf10 => 0xD2,
        }
    }

    /// Look up a load by its capacitance in picofarads
    pub fn from_pf(pf: u32) -> Option<Self> {
        match pf {
            6 => Some(Self::Pf6),
            8 => Some(Self::Pf8),
            10 => Some(Self::Pf10),
            _ => None,
        }
    }
}

/// Output driver strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveStrength {
    /// 2 mA
    Ma2,
    /// 4 mA
    Ma4,
    /// 6 mA
    Ma6,
    /// 8 mA
    #[default]
    Ma8,
}

impl DriveStrength {
    /// Drive strength field of the CLK control register
    pub const fn bits(self) -> ClockControl {
        ClockControl::from_bits_retain(match self {
            Self::Ma2 => 0,
            Self::Ma4 => 1,
            Self::Ma6 => 2,
            Self::Ma8 => 3,
        })
    }

    /// Look up a drive strength by its current in milliamps
    pub fn from_ma(ma: u32) -> Option<Self> {
        match ma {
            2 => Some(Self::Ma2),
            4 => Some(Self::Ma4),
            6 => Some(Self::Ma6),
            8 => Some(Self::Ma8),
            _ => None,
        }
    }
}

/// Fixed parameters of one Si5351A on one bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Bus identifier (Linux: the N in /dev/i2c-N)
    pub bus: u8,
    /// 7-bit chip address
    pub address: u8,
    /// Crystal frequency in Hz
    pub xtal_hz: u32,
    /// PLLA VCO frequency in Hz
    pub vco_hz: u32,
    /// Budget for each register transaction
    pub retry: RetryPolicy,
    /// Crystal load capacitance
    pub crystal_load: CrystalLoad,
    /// Output drive strength for every channel
    pub drive: DriveStrength,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            bus: DEFAULT_BUS,
            address: DEFAULT_ADDRESS,
            xtal_hz: DEFAULT_XTAL_HZ,
            vco_hz: DEFAULT_VCO_HZ,
            retry: RetryPolicy::default(),
            crystal_load: CrystalLoad::default(),
            drive: DriveStrength::default(),
        }
    }
}

impl DeviceConfig {
    /// Set the bus identifier
    pub fn with_bus(mut self, bus: u8) -> Self {
        self.bus = bus;
        self
    }

    /// Set the chip address
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Set the register transaction retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the crystal load capacitance
    pub fn with_crystal_load(mut self, load: CrystalLoad) -> Self {
        self.crystal_load = load;
        self
    }

    /// Set the output drive strength
    pub fn with_drive_strength(mut self, drive: DriveStrength) -> Self {
        self.drive = drive;
        self
    }

    /// Integer PLLA feedback multiplier (VCO / crystal)
    pub fn pll_multiplier(&self) -> Option<u32> {
        if self.xtal_hz == 0 || self.vco_hz % self.xtal_hz != 0 {
            return None;
        }
        Some(self.vco_hz / self.xtal_hz)
    }

    /// Check that the configuration describes something the chip can do
    pub fn validate(&self) -> Result<()> {
        if self.address > 0x7F {
            log::error!("Chip address 0x{:02X} is not a 7-bit address", self.address);
            return Err(Error::InvalidConfig);
        }
        if !(VCO_MIN_HZ..=VCO_MAX_HZ).contains(&self.vco_hz) {
            log::error!(
                "VCO {} Hz outside the PLL range ({}-{} Hz)",
                self.vco_hz,
                VCO_MIN_HZ,
                VCO_MAX_HZ
            );
            return Err(Error::InvalidConfig);
        }
        match self.pll_multiplier() {
            Some(PLL_MULTIPLIER) => Ok(()),
            Some(mult) => {
                log::error!(
                    "PLL multiplier {} not supported (VCO must be {} x crystal)",
                    mult,
                    PLL_MULTIPLIER
                );
                Err(Error::InvalidConfig)
            }
            None => {
                log::error!(
                    "VCO {} Hz is not an integer multiple of the {} Hz crystal",
                    self.vco_hz,
                    self.xtal_hz
                );
                Err(Error::InvalidConfig)
            }
        }
    }
}

/// PLLA integer-mode feedback divider encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllConfig {
    /// MSNA_P1
    pub p1: u32,
    /// MSNA_P2
    pub p2: u32,
    /// MSNA_P3
    pub p3: u32,
}

impl PllConfig {
    /// Encoding for an integer multiplier
    pub const fn integer(multiplier: u32) -> Self {
        Self {
            p1: 128 * multiplier - 512,
            p2: 0,
            p3: 1,
        }
    }

    /// Derive the encoding from a validated configuration
    pub fn from_config(config: &DeviceConfig) -> Result<Self> {
        config.validate()?;
        config
            .pll_multiplier()
            .map(Self::integer)
            .ok_or(Error::InvalidConfig)
    }

    /// Register bytes for addresses 26-33
    pub fn registers(&self) -> [u8; 8] {
        crate::registers::pack_divider(self.p1, self.p2, self.p3, 0, false)
    }
}

#[cfg(feature = "std")]
mod file {
    use super::{CrystalLoad, DeviceConfig, DriveStrength};
    use crate::retry::RetryPolicy;
    use std::format;
    use std::path::Path;
    use std::string::String;

    /// Errors loading a configuration file
    #[derive(Debug, thiserror::Error)]
    pub enum ConfigFileError {
        /// File could not be read
        #[error("Failed to read {path}: {source}")]
        Read {
            /// File path
            path: String,
            /// Underlying error
            #[source]
            source: std::io::Error,
        },
        /// TOML syntax or type error
        #[error("Invalid configuration: {0}")]
        Parse(#[from] toml::de::Error),
        /// A value is syntactically fine but not accepted
        #[error("Invalid value for {key}: {value}")]
        InvalidValue {
            /// Key name
            key: &'static str,
            /// Offending value
            value: String,
        },
    }

    #[derive(Debug, Default, serde::Deserialize)]
    #[serde(deny_unknown_fields)]
    struct TomlConfig {
        #[serde(default, deserialize_with = "deserialize_opt_number")]
        bus: Option<u32>,
        #[serde(default, deserialize_with = "deserialize_opt_number")]
        address: Option<u32>,
        #[serde(default, deserialize_with = "deserialize_opt_number")]
        xtal_hz: Option<u32>,
        #[serde(default, deserialize_with = "deserialize_opt_number")]
        vco_hz: Option<u32>,
        retries: Option<u32>,
        backoff_ms: Option<u32>,
        crystal_load_pf: Option<u32>,
        drive_ma: Option<u32>,
    }

    /// Deserialize a u32 that can be hex ("0x...") or decimal
    fn deserialize_opt_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::Deserialize;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum HexOrInt {
            Int(u32),
            Str(String),
        }

        match Option::<HexOrInt>::deserialize(deserializer)? {
            None => Ok(None),
            Some(HexOrInt::Int(n)) => Ok(Some(n)),
            Some(HexOrInt::Str(s)) => parse_number(&s).map(Some).map_err(serde::de::Error::custom),
        }
    }

    /// Parse a number that can be hex (0x...) or decimal
    pub fn parse_number(s: &str) -> Result<u32, String> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e))
        } else {
            s.parse().map_err(|e| format!("invalid number: {}", e))
        }
    }

    fn byte(key: &'static str, value: u32) -> Result<u8, ConfigFileError> {
        u8::try_from(value).map_err(|_| ConfigFileError::InvalidValue {
            key,
            value: format!("{}", value),
        })
    }

    impl DeviceConfig {
        /// Apply the keys of a TOML document on top of `self`
        pub fn merge_toml_str(mut self, s: &str) -> Result<Self, ConfigFileError> {
            let file: TomlConfig = toml::from_str(s)?;

            if let Some(bus) = file.bus {
                self.bus = byte("bus", bus)?;
            }
            if let Some(address) = file.address {
                self.address = byte("address", address)?;
            }
            if let Some(xtal_hz) = file.xtal_hz {
                self.xtal_hz = xtal_hz;
            }
            if let Some(vco_hz) = file.vco_hz {
                self.vco_hz = vco_hz;
            }
            if file.retries.is_some() || file.backoff_ms.is_some() {
                self.retry = RetryPolicy::new(
                    file.retries.unwrap_or(self.retry.attempts),
                    file.backoff_ms.unwrap_or(self.retry.backoff_ms),
                );
            }
            if let Some(pf) = file.crystal_load_pf {
                self.crystal_load =
                    CrystalLoad::from_pf(pf).ok_or_else(|| ConfigFileError::InvalidValue {
                        key: "crystal_load_pf",
                        value: format!("{}", pf),
                    })?;
            }
            if let Some(ma) = file.drive_ma {
                self.drive = DriveStrength::from_ma(ma).ok_or_else(|| {
                    ConfigFileError::InvalidValue {
                        key: "drive_ma",
                        value: format!("{}", ma),
                    }
                })?;
            }

            Ok(self)
        }

        /// Parse a TOML document over the defaults
        pub fn from_toml_str(s: &str) -> Result<Self, ConfigFileError> {
            Self::default().merge_toml_str(s)
        }

        /// Load a TOML file over the defaults
        pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path).map_err(|e| ConfigFileError::Read {
                path: format!("{}", path.display()),
                source: e,
            })?;
            Self::from_toml_str(&content)
        }
    }
}

#[cfg(feature = "std")]
pub use file::{parse_number, ConfigFileError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pll_config() {
        let config = DeviceConfig::default();
        assert_eq!(config.pll_multiplier(), Some(32));
        let pll = PllConfig::from_config(&config).unwrap();
        assert_eq!(pll, PllConfig { p1: 3584, p2: 0, p3: 1 });
        assert_eq!(pll.registers(), [0x00, 0x01, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_non_integer_multiplier_rejected() {
        let config = DeviceConfig {
            vco_hz: 810_000_001,
            ..DeviceConfig::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidConfig));
    }

    #[test]
    fn test_only_multiplier_32_accepted() {
        // 900 MHz is a valid VCO, but 36 x 25 MHz is not the fixed multiplier
        let config = DeviceConfig {
            vco_hz: 900_000_000,
            ..DeviceConfig::default()
        };
        assert_eq!(config.pll_multiplier(), Some(36));
        assert_eq!(config.validate(), Err(Error::InvalidConfig));

        // 27 MHz crystal x 32 = 864 MHz
        let config = DeviceConfig {
            xtal_hz: 27_000_000,
            vco_hz: 864_000_000,
            ..DeviceConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_vco_outside_pll_range_rejected() {
        // 32 x 11.71875 MHz, multiplier fine but VCO too low
        let config = DeviceConfig {
            xtal_hz: 11_718_750,
            vco_hz: 375_000_000,
            ..DeviceConfig::default()
        };
        assert_eq!(config.pll_multiplier(), Some(32));
        assert_eq!(config.validate(), Err(Error::InvalidConfig));

        let config = DeviceConfig {
            xtal_hz: 30_000_000,
            vco_hz: 960_000_000,
            ..DeviceConfig::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidConfig));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_toml_vco_is_validated() {
        let config = DeviceConfig::from_toml_str("vco_hz = 900000000").unwrap();
        assert_eq!(config.validate(), Err(Error::InvalidConfig));
    }

    #[test]
    fn test_address_must_be_7_bit() {
        let config = DeviceConfig::default().with_address(0xC0);
        assert_eq!(config.validate(), Err(Error::InvalidConfig));
    }

    #[test]
    fn test_drive_strength_bits() {
        assert_eq!(DriveStrength::Ma8.bits().bits(), 0x03);
        assert_eq!(DriveStrength::from_ma(4), Some(DriveStrength::Ma4));
        assert_eq!(DriveStrength::from_ma(5), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_toml_overrides_defaults() {
        let config = DeviceConfig::from_toml_str(
            r#"
            bus = 3
            address = "0x61"
            retries = 2
            crystal_load_pf = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.bus, 3);
        assert_eq!(config.address, 0x61);
        assert_eq!(config.retry, RetryPolicy::new(2, 50));
        assert_eq!(config.crystal_load, CrystalLoad::Pf8);
        assert_eq!(config.vco_hz, DEFAULT_VCO_HZ);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_toml_rejects_bad_values() {
        assert!(DeviceConfig::from_toml_str("drive_ma = 5").is_err());
        assert!(DeviceConfig::from_toml_str("address = 300").is_err());
        assert!(DeviceConfig::from_toml_str("unknown = 1").is_err());
    }
}

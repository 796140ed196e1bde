//! Transport registry
//!
//! Maps transport names to constructors, with feature-gated inclusion and
//! generated help text.

use crate::error::{Result, SessionError};
use si5351_core::config::{parse_number, DeviceConfig};
use si5351_core::device::Device;
use si5351_core::transport::I2cTransport;
use std::collections::HashMap;

/// Type-erased transport backing a session's [`Device`]
pub type BoxedTransport = Box<dyn I2cTransport + Send>;

/// Information about a transport
pub struct TransportInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Short description including accepted options
    pub description: &'static str,
}

/// Transports enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_transports() -> Vec<TransportInfo> {
    let mut transports = Vec::new();

    #[cfg(feature = "linux-i2c")]
    transports.push(TransportInfo {
        name: "linux_i2c",
        aliases: &["linux-i2c", "i2c-dev"],
        description: "Linux i2c-dev adapter (dev=/dev/i2c-N or bus=N, addr=<0xNN>)",
    });

    #[cfg(feature = "dummy")]
    transports.push(TransportInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory Si5351A emulator (sys_init_reads=N, lock_polls=N, addr=<0xNN>)",
    });

    transports
}

/// Help text listing the available transports
pub fn transport_help() -> String {
    let transports = available_transports();

    if transports.is_empty() {
        return "No transports available (recompile with transport features enabled)".to_string();
    }

    let mut help = String::from("Available transports:\n");
    for t in &transports {
        help.push_str(&format!("  {:12} - {}\n", t.name, t.description));
        if !t.aliases.is_empty() {
            help.push_str(&format!("  {:12}   aliases: {}\n", "", t.aliases.join(", ")));
        }
    }
    help
}

/// Short list of transport names for CLI help
pub fn transport_names_short() -> String {
    let names: Vec<&str> = available_transports().iter().map(|t| t.name).collect();
    names.join(", ")
}

/// Parsed transport string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportParams {
    /// Transport name as given
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl TransportParams {
    #[cfg(any(feature = "dummy", feature = "linux-i2c"))]
    fn options(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    fn number(&self, key: &str) -> Result<Option<u32>> {
        self.params
            .get(key)
            .map(|v| {
                parse_number(v)
                    .map_err(|e| SessionError::InvalidParameter(format!("{}: {}", key, e)))
            })
            .transpose()
    }

    /// Apply `bus=` and `addr=` on top of `config`
    pub fn apply_to(&self, mut config: DeviceConfig) -> Result<DeviceConfig> {
        if let Some(bus) = self.number("bus")? {
            let bus = u8::try_from(bus)
                .map_err(|_| SessionError::InvalidParameter(format!("bus {} out of range", bus)))?;
            config = config.with_bus(bus);
        }
        if let Some(address) = self.number("addr")? {
            let address = u8::try_from(address).map_err(|_| {
                SessionError::InvalidParameter(format!("address 0x{:X} out of range", address))
            })?;
            config = config.with_address(address);
        }
        Ok(config)
    }
}

/// Parse a transport string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_transport_params(s: &str) -> Result<TransportParams> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    if name.is_empty() {
        return Err(SessionError::InvalidParameter(
            "empty transport name".to_string(),
        ));
    }

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            match opt.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    params.insert(key.to_string(), value.to_string());
                }
                _ => {
                    return Err(SessionError::InvalidParameter(format!(
                        "'{}' (expected key=value)",
                        opt
                    )))
                }
            }
        }
    }

    Ok(TransportParams {
        name: name.to_string(),
        params,
    })
}

/// Open the transport named by `params`
///
/// `config` must already have the transport options applied.
pub fn open_transport(params: &TransportParams, config: &DeviceConfig) -> Result<BoxedTransport> {
    match params.name.as_str() {
        #[cfg(feature = "linux-i2c")]
        "linux_i2c" | "linux-i2c" | "i2c-dev" => open_linux_i2c(params, config),

        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(params, config),

        _ => {
            let _ = config;
            Err(SessionError::UnknownTransport(
                params.name.clone(),
                transport_names_short(),
            ))
        }
    }
}

/// Open a transport and return a [`Device`] that answered a presence check
///
/// The check is a single read of the status register with no retries.
/// The device is returned uninitialized.
///
/// # Example
/// ```ignore
/// let mut device = open_device("dummy", DeviceConfig::default())?;
/// device.init()?;
/// ```
pub fn open_device(transport: &str, config: DeviceConfig) -> Result<Device<BoxedTransport>> {
    let params = parse_transport_params(transport)?;
    let config = params.apply_to(config)?;
    let transport = open_transport(&params, &config)?;
    let name = transport.name();

    let mut device = Device::new(transport, config).map_err(SessionError::Config)?;
    let status = device
        .probe()
        .map_err(|source| SessionError::NotDetected {
            address: config.address,
            transport: name,
            source,
        })?;

    log::info!(
        "Si5351A detected at 0x{:02X} via {} (status 0x{:02X}, revision {})",
        config.address,
        name,
        status.bits(),
        status.revision()
    );
    Ok(device)
}

#[cfg(feature = "linux-i2c")]
fn open_linux_i2c(params: &TransportParams, config: &DeviceConfig) -> Result<BoxedTransport> {
    log::info!("Opening Linux I2C adapter...");

    let i2c = si5351_linux_i2c::open_linux_i2c(&params.options(), config.bus).map_err(|e| {
        SessionError::Open {
            transport: "linux_i2c",
            source: Box::new(e),
        }
    })?;
    Ok(Box::new(i2c))
}

#[cfg(feature = "dummy")]
fn open_dummy(params: &TransportParams, config: &DeviceConfig) -> Result<BoxedTransport> {
    use si5351_dummy::{DummyChip, DummyConfig};

    let defaults = DummyConfig::default();
    let dummy = DummyConfig {
        address: config.address,
        sys_init_reads: params.number("sys_init_reads")?.or(defaults.sys_init_reads),
        lock_polls: params.number("lock_polls")?.or(defaults.lock_polls),
        ..defaults
    };
    for key in params.options().into_iter().map(|(k, _)| k) {
        if !matches!(key, "sys_init_reads" | "lock_polls" | "addr" | "bus") {
            log::warn!("dummy: Unknown option: {}", key);
        }
    }

    log::info!("Opening dummy Si5351A emulator");
    Ok(Box::new(DummyChip::new(dummy)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only() {
        let params = parse_transport_params("dummy").unwrap();
        assert_eq!(params.name, "dummy");
        assert!(params.params.is_empty());
    }

    #[test]
    fn test_parse_with_options() {
        let params = parse_transport_params("linux_i2c:bus=2,addr=0x61").unwrap();
        assert_eq!(params.name, "linux_i2c");
        assert_eq!(params.params.get("bus").map(String::as_str), Some("2"));
        assert_eq!(params.params.get("addr").map(String::as_str), Some("0x61"));
    }

    #[test]
    fn test_parse_rejects_bare_option() {
        assert!(matches!(
            parse_transport_params("linux_i2c:bus"),
            Err(SessionError::InvalidParameter(_))
        ));
        assert!(parse_transport_params(":bus=1").is_err());
    }

    #[test]
    fn test_options_override_config() {
        let params = parse_transport_params("linux_i2c:bus=3,addr=0x62").unwrap();
        let config = params
            .apply_to(DeviceConfig::default().with_bus(1).with_address(0x60))
            .unwrap();
        assert_eq!(config.bus, 3);
        assert_eq!(config.address, 0x62);
    }

    #[test]
    fn test_bad_option_value() {
        let params = parse_transport_params("dummy:addr=0x1FF").unwrap();
        assert!(params.apply_to(DeviceConfig::default()).is_err());
        let params = parse_transport_params("dummy:bus=one").unwrap();
        assert!(params.apply_to(DeviceConfig::default()).is_err());
    }

    #[test]
    fn test_unknown_transport() {
        let err = open_device("ch341a", DeviceConfig::default()).err();
        assert!(matches!(err, Some(SessionError::UnknownTransport(..))));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_device() {
        use si5351_core::device::DeviceState;

        let mut device = open_device("dummy", DeviceConfig::default()).unwrap();
        assert_eq!(device.state(), DeviceState::Uninitialized);
        assert_eq!(device.init().unwrap(), DeviceState::Locked);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_follows_address_override() {
        let device = open_device("dummy:addr=0x61", DeviceConfig::default()).unwrap();
        assert_eq!(device.config().address, 0x61);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_lock_failure_option() {
        use si5351_core::device::DeviceState;
        use si5351_core::init::InitFailure;

        let mut device = open_device("dummy:sys_init_reads=500", DeviceConfig::default()).unwrap();
        assert_eq!(
            device.init().unwrap(),
            DeviceState::InitFailed(InitFailure::SysInitTimeout)
        );
    }
}

//! Linux I2C device implementation
//!
//! This module provides the `LinuxI2c` struct that implements the
//! `I2cTransport` trait using Linux's i2c-dev interface.

use crate::error::{LinuxI2cError, Result};

use si5351_core::error::{Error as CoreError, Result as CoreResult};
use si5351_core::transport::{Delay, I2cTransport};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

/// i2c-dev ioctl constants
mod ioctl {
    use nix::{ioctl_read_bad, ioctl_write_ptr_bad};

    /// Get the adapter functionality mask
    const I2C_FUNCS: u16 = 0x0705;
    /// Combined read/write transfer
    const I2C_RDWR: u16 = 0x0707;

    /// Adapter supports plain I2C messages
    pub const I2C_FUNC_I2C: libc::c_ulong = 0x0000_0001;

    /// Message flag: read from the slave
    pub const I2C_M_RD: u16 = 0x0001;

    /// Kernel `struct i2c_msg`
    #[repr(C)]
    pub struct I2cMsg {
        pub addr: u16,
        pub flags: u16,
        pub len: u16,
        pub buf: *mut u8,
    }

    /// Kernel `struct i2c_rdwr_ioctl_data`
    #[repr(C)]
    pub struct I2cRdwrIoctlData {
        pub msgs: *mut I2cMsg,
        pub nmsgs: u32,
    }

    ioctl_read_bad!(i2c_funcs, I2C_FUNCS, libc::c_ulong);
    ioctl_write_ptr_bad!(i2c_rdwr, I2C_RDWR, I2cRdwrIoctlData);
}

use ioctl::{I2cMsg, I2cRdwrIoctlData};

/// Configuration for opening a Linux I2C adapter
#[derive(Debug, Clone)]
pub struct LinuxI2cConfig {
    /// Device path (e.g., "/dev/i2c-1")
    pub device: String,
}

impl LinuxI2cConfig {
    /// Create a configuration for a device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }

    /// Create a configuration for `/dev/i2c-<bus>`
    pub fn for_bus(bus: u8) -> Self {
        Self::new(format!("/dev/i2c-{}", bus))
    }
}

/// Linux I2C adapter using the i2c-dev interface
pub struct LinuxI2c {
    file: File,
    path: String,
}

impl LinuxI2c {
    /// Open an adapter and check it can do combined transfers
    pub fn open(config: &LinuxI2cConfig) -> Result<Self> {
        log::debug!("linux_i2c: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxI2cError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let mut funcs: libc::c_ulong = 0;
        unsafe {
            ioctl::i2c_funcs(file.as_raw_fd(), &mut funcs).map_err(|e| {
                LinuxI2cError::FuncsFailed {
                    path: config.device.clone(),
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }
        if funcs & ioctl::I2C_FUNC_I2C == 0 {
            return Err(LinuxI2cError::Unsupported(config.device.clone()));
        }

        log::info!("linux_i2c: Opened {}", config.device);

        Ok(Self {
            file,
            path: config.device.clone(),
        })
    }

    fn transfer(&mut self, msgs: &mut [I2cMsg]) -> CoreResult<()> {
        let data = I2cRdwrIoctlData {
            msgs: msgs.as_mut_ptr(),
            nmsgs: msgs.len() as u32,
        };
        // Buffers referenced by msgs outlive the call
        let ret = unsafe { ioctl::i2c_rdwr(self.file.as_raw_fd(), &data) };
        match ret {
            Ok(_) => Ok(()),
            Err(e) => {
                log::trace!("linux_i2c: I2C_RDWR on {} failed: {}", self.path, e);
                Err(CoreError::Io)
            }
        }
    }
}

impl Delay for LinuxI2c {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

impl I2cTransport for LinuxI2c {
    fn name(&self) -> &'static str {
        "linux_i2c"
    }

    fn write_byte(&mut self, device: u8, register: u8, value: u8) -> CoreResult<()> {
        let mut buf = [register, value];
        let mut msgs = [I2cMsg {
            addr: device as u16,
            flags: 0,
            len: buf.len() as u16,
            buf: buf.as_mut_ptr(),
        }];
        self.transfer(&mut msgs)
    }

    fn read_byte(&mut self, device: u8, register: u8) -> CoreResult<u8> {
        let mut reg = [register];
        let mut value = [0u8];
        let mut msgs = [
            I2cMsg {
                addr: device as u16,
                flags: 0,
                len: 1,
                buf: reg.as_mut_ptr(),
            },
            I2cMsg {
                addr: device as u16,
                flags: ioctl::I2C_M_RD,
                len: 1,
                buf: value.as_mut_ptr(),
            },
        ];
        self.transfer(&mut msgs)?;
        Ok(value[0])
    }
}

/// Parse transport options from a list of key-value pairs
///
/// Keys other than `dev` and `bus` are left to the caller.
pub fn parse_options(options: &[(&str, &str)], default_bus: u8) -> Result<LinuxI2cConfig> {
    let mut device: Option<String> = None;

    for (key, value) in options {
        match *key {
            "dev" => {
                if value.is_empty() {
                    return Err(LinuxI2cError::InvalidParameter(
                        "dev= needs a device path".into(),
                    ));
                }
                device = Some(value.to_string());
            }
            "bus" => {
                let bus: u8 = value.parse().map_err(|_| {
                    LinuxI2cError::InvalidParameter(format!("Invalid bus value: {}", value))
                })?;
                device = Some(LinuxI2cConfig::for_bus(bus).device);
            }
            _ => {}
        }
    }

    Ok(device
        .map(LinuxI2cConfig::new)
        .unwrap_or_else(|| LinuxI2cConfig::for_bus(default_bus)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bus() {
        let config = parse_options(&[], 1).unwrap();
        assert_eq!(config.device, "/dev/i2c-1");
    }

    #[test]
    fn test_bus_option() {
        let config = parse_options(&[("bus", "3")], 1).unwrap();
        assert_eq!(config.device, "/dev/i2c-3");
    }

    #[test]
    fn test_dev_option() {
        let config = parse_options(&[("dev", "/dev/i2c-7"), ("addr", "0x61")], 1).unwrap();
        assert_eq!(config.device, "/dev/i2c-7");
    }

    #[test]
    fn test_invalid_bus() {
        assert!(matches!(
            parse_options(&[("bus", "x")], 1),
            Err(LinuxI2cError::InvalidParameter(_))
        ));
        assert!(parse_options(&[("bus", "256")], 1).is_err());
    }

    #[test]
    fn test_open_missing_device() {
        let err = LinuxI2c::open(&LinuxI2cConfig::new("/nonexistent/i2c-9")).err();
        assert!(matches!(err, Some(LinuxI2cError::OpenFailed { .. })));
    }
}

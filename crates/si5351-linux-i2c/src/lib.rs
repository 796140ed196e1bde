//! si5351-linux-i2c - Linux i2c-dev transport
//!
//! This crate talks to a Si5351A through the `/dev/i2c-N` character
//! device interface.
//!
//! # Overview
//!
//! Each register access is a single `I2C_RDWR` ioctl: a write is one
//! two-byte message (register, value); a read is a one-byte write of the
//! register followed by a one-byte read, joined by a repeated start.
//!
//! # Example
//!
//! ```no_run
//! use si5351_linux_i2c::{LinuxI2c, LinuxI2cConfig};
//! use si5351_core::transport::I2cTransport;
//!
//! let mut i2c = LinuxI2c::open(&LinuxI2cConfig::for_bus(1))?;
//! let status = i2c.read_byte(0x60, 0x00)?;
//! println!("status: 0x{:02X}", status);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with si5351ctl
//!
//! ```bash
//! # Bus 1 at the default address
//! si5351ctl -t linux_i2c status
//!
//! # Explicit device node
//! si5351ctl -t linux_i2c:dev=/dev/i2c-3 init
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with i2c-dev support (`CONFIG_I2C_CHARDEV`)
//! - Read/write access to `/dev/i2c-N`, usually via the `i2c` group

pub mod device;
pub mod error;

pub use device::{parse_options, LinuxI2c, LinuxI2cConfig};
pub use error::{LinuxI2cError, Result};

/// Open an i2c-dev adapter from transport options
///
/// # Options
///
/// - `dev=/dev/i2c-N` - device node
/// - `bus=N` - shorthand for `dev=/dev/i2c-N`
///
/// Without either, `default_bus` is used.
pub fn open_linux_i2c(options: &[(&str, &str)], default_bus: u8) -> Result<LinuxI2c> {
    let config = parse_options(options, default_bus)?;
    LinuxI2c::open(&config)
}

//! Byte transport trait definitions
//!
//! The driver never touches the I2C controller directly. Front-ends hand
//! it something implementing [`I2cTransport`]: the Linux `i2c-dev`
//! backend, the in-memory emulator used in tests, or anything else that
//! can move single register bytes.

use crate::error::Result;

/// Blocking delay source
///
/// Every poll interval and retry backoff in the driver goes through this
/// trait, so simulated transports can skip the actual sleeping.
pub trait Delay {
    /// Block the calling thread for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

/// Single-byte register transport
///
/// Implementations issue exactly one bus transaction per call and do not
/// retry; retry and verification policy lives in
/// [`RegisterBus`](crate::bus::RegisterBus). A failed transaction is
/// reported as [`Error::Io`](crate::Error::Io).
pub trait I2cTransport: Delay {
    /// Short transport name used in log messages
    fn name(&self) -> &'static str;

    /// Write `value` to `register` of the device at 7-bit `device` address
    fn write_byte(&mut self, device: u8, register: u8, value: u8) -> Result<()>;

    /// Read `register` of the device at 7-bit `device` address
    fn read_byte(&mut self, device: u8, register: u8) -> Result<u8>;
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

impl<T: I2cTransport + ?Sized> I2cTransport for &mut T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn write_byte(&mut self, device: u8, register: u8, value: u8) -> Result<()> {
        (**self).write_byte(device, register, value)
    }

    fn read_byte(&mut self, device: u8, register: u8) -> Result<u8> {
        (**self).read_byte(device, register)
    }
}

#[cfg(feature = "std")]
impl<T: Delay + ?Sized> Delay for std::boxed::Box<T> {
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

#[cfg(feature = "std")]
impl<T: I2cTransport + ?Sized> I2cTransport for std::boxed::Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn write_byte(&mut self, device: u8, register: u8, value: u8) -> Result<()> {
        (**self).write_byte(device, register, value)
    }

    fn read_byte(&mut self, device: u8, register: u8) -> Result<u8> {
        (**self).read_byte(device, register)
    }
}

//! si5351-core - Core driver library for the Si5351A clock generator
//!
//! This crate contains everything needed to bring a Si5351A out of reset,
//! lock PLLA to the crystal reference and program the three MultiSynth
//! outputs. It is `no_std` compatible; the byte transport is supplied by
//! the caller through the [`transport::I2cTransport`] trait.
//!
//! # Features
//!
//! - `std` - Enable standard library support (error trait impls, TOML
//!   configuration files)
//!
//! # Layers
//!
//! - [`bus::RegisterBus`] - retrying, write-verifying register access
//! - [`synth::FrequencySynthesizer`] - target frequency to divider encoding
//! - [`init::DeviceInitializer`] - bring-up and PLL lock state machine
//! - [`output::OutputController`] - divider programming and output gating
//! - [`device::Device`] - the facade front-ends talk to
//!
//! # Example
//!
//! ```ignore
//! use si5351_core::{config::DeviceConfig, device::Device, registers::ChannelId};
//!
//! fn bring_up<T: si5351_core::transport::I2cTransport>(transport: T) -> si5351_core::Result<()> {
//!     let mut device = Device::new(transport, DeviceConfig::default())?;
//!     device.init()?;
//!     device.set_frequency(ChannelId::CLK0, 10_000_000)?;
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod bus;
pub mod config;
pub mod device;
pub mod error;
pub mod init;
pub mod output;
pub mod registers;
pub mod retry;
pub mod synth;
pub mod transport;

#[cfg(test)]
mod mock;

pub use error::{Error, RangeError, Result};

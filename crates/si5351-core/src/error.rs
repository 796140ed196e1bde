//! Error types for si5351-core
//!
//! This module provides a no_std compatible error type that is shared by
//! every layer of the driver.

use core::fmt;

/// Caller-input validation failures
///
/// These are reported before any bus traffic is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// Requested output frequency is outside 2.5 kHz - 200 MHz
    FrequencyOutOfBounds(u32),
    /// Frequency is in bounds but no R-divider/MultiSynth combination reaches it
    UnreachableFrequency(u32),
    /// Output channel is not one of CLK0-CLK2
    InvalidChannel(u32),
    /// Register address does not fit in a byte
    InvalidRegister(u32),
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// A single transport transaction failed (NACK, bus fault)
    Io,
    /// Transport faults persisted for the whole retry budget
    Comm {
        /// Register being accessed
        register: u8,
    },
    /// A verified write never read back the written value
    Verification {
        /// Register being written
        register: u8,
        /// Value that was written
        expected: u8,
        /// Value read back on the last attempt
        actual: u8,
    },

    // Initialization errors
    /// SYS_INIT never cleared during bring-up
    InitTimeout,
    /// PLLA did not lock after all recovery attempts
    PllLockTimeout,

    // Caller errors
    /// Argument validation failed
    Range(RangeError),
    /// Device configuration is not usable
    InvalidConfig,

    /// A best-effort shutdown step failed
    Shutdown {
        /// First register that could not be written
        register: u8,
    },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrequencyOutOfBounds(hz) => {
                write!(f, "frequency {} Hz out of range (2.5 kHz - 200 MHz)", hz)
            }
            Self::UnreachableFrequency(hz) => {
                write!(f, "frequency {} Hz cannot be reached with the available dividers", hz)
            }
            Self::InvalidChannel(ch) => write!(f, "invalid output CLK{} (expected 0-2)", ch),
            Self::InvalidRegister(reg) => write!(f, "invalid register {} (expected 0-255)", reg),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "I2C transaction failed"),
            Self::Comm { register } => {
                write!(f, "I2C communication failed at register 0x{:02X}", register)
            }
            Self::Verification {
                register,
                expected,
                actual,
            } => write!(
                f,
                "write verification failed at register 0x{:02X}: wrote 0x{:02X}, read 0x{:02X}",
                register, expected, actual
            ),
            Self::InitTimeout => write!(f, "device initialization timed out (SYS_INIT=1)"),
            Self::PllLockTimeout => write!(f, "PLLA did not lock"),
            Self::Range(e) => write!(f, "{}", e),
            Self::InvalidConfig => write!(f, "invalid device configuration"),
            Self::Shutdown { register } => {
                write!(f, "shutdown failed at register 0x{:02X}", register)
            }
        }
    }
}

impl From<RangeError> for Error {
    fn from(e: RangeError) -> Self {
        Self::Range(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RangeError {}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

//! Session errors

use thiserror::Error;

/// Errors while setting up a device session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Transport string names nothing compiled in
    #[error("Unknown transport: {0} (available: {1})")]
    UnknownTransport(String, String),

    /// Malformed `key=value` list or value
    #[error("Invalid transport parameter: {0}")]
    InvalidParameter(String),

    /// The transport could not be opened
    #[error("Failed to open {transport}: {source}")]
    Open {
        transport: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration rejected by the driver
    #[error("Invalid device configuration: {0}")]
    Config(#[source] si5351_core::Error),

    /// Nothing answered at the device address
    #[error("No Si5351A detected at 0x{address:02X} via {transport}: {source}")]
    NotDetected {
        address: u8,
        transport: &'static str,
        #[source]
        source: si5351_core::Error,
    },
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

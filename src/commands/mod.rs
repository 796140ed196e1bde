//! CLI command implementations
//!
//! Each command opens nothing itself: `main` resolves the configuration
//! and opens the device session, and the functions here drive the
//! [`Device`](si5351_core::device::Device) facade and print results.

mod device;
mod list;
#[cfg(feature = "repl")]
pub mod repl;

pub use device::{
    cmd_init, cmd_off, cmd_on, cmd_plan, cmd_read, cmd_set, cmd_shutdown, cmd_status,
};
pub use list::list_transports;

/// Result type shared by the command implementations
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

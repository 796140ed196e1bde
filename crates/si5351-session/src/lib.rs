//! si5351-session - Transport registry and device sessions
//!
//! Front-ends name a transport with a string such as `linux_i2c:bus=1` or
//! `dummy`. This crate parses that string, opens the transport, checks
//! that a chip answers, and hands back a [`Device`] ready for use. The
//! concrete transport type is erased behind [`BoxedTransport`].

mod error;
pub mod parse;
mod registry;
pub mod report;

pub use error::{Result, SessionError};
pub use registry::{
    available_transports, open_device, open_transport, parse_transport_params,
    transport_help, transport_names_short, BoxedTransport, TransportInfo, TransportParams,
};

pub use si5351_core::device::Device;

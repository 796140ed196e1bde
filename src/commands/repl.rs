//! Interactive menu command

use super::CmdResult;
use si5351_core::device::Device;
use si5351_core::transport::I2cTransport;

/// Run the interactive menu on an open device
pub fn cmd_repl<T: I2cTransport>(device: &mut Device<T>) -> CmdResult {
    si5351_repl::run_repl(device)?;
    Ok(())
}

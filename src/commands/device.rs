//! Commands that talk to the chip

use super::CmdResult;
use indicatif::{ProgressBar, ProgressStyle};
use si5351_core::config::DeviceConfig;
use si5351_core::device::{Device, DeviceState};
use si5351_core::registers::ChannelId;
use si5351_core::synth::FrequencySynthesizer;
use si5351_core::transport::I2cTransport;
use si5351_session::report;
use std::time::Duration;

fn spinner(message: &'static str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Bring the chip up and lock PLLA
pub fn cmd_init<T: I2cTransport>(device: &mut Device<T>) -> CmdResult {
    let pb = spinner("Initializing Si5351A...")?;
    let result = device.init();
    pb.finish_and_clear();

    match result? {
        DeviceState::Locked => {
            println!("Si5351A initialized, PLLA locked");
            Ok(())
        }
        state => Err(format!("Initialization failed: {}", state).into()),
    }
}

/// Program an output
pub fn cmd_set<T: I2cTransport>(
    device: &mut Device<T>,
    channel: ChannelId,
    freq_hz: u32,
) -> CmdResult {
    device.resume()?;
    let plan = device.set_frequency(channel, freq_hz)?;
    let output_hz = device.synthesizer().output_hz(&plan);
    for line in report::plan_lines(freq_hz, &plan, output_hz) {
        log::debug!("{}", line);
    }
    println!("{}", report::set_line(channel, freq_hz, output_hz));
    Ok(())
}

/// Enable an output
pub fn cmd_on<T: I2cTransport>(device: &mut Device<T>, channel: ChannelId) -> CmdResult {
    device.resume()?;
    device.enable(channel)?;
    println!("{} enabled", channel);
    Ok(())
}

/// Disable an output
pub fn cmd_off<T: I2cTransport>(device: &mut Device<T>, channel: ChannelId) -> CmdResult {
    device.disable(channel)?;
    println!("{} disabled", channel);
    Ok(())
}

/// Read one register
pub fn cmd_read<T: I2cTransport>(device: &mut Device<T>, register: u8) -> CmdResult {
    let value = device.read(register as u32)?;
    println!("Register 0x{:02X} = 0x{:02X}", register, value);
    Ok(())
}

/// Decode the status register and output states
pub fn cmd_status<T: I2cTransport>(device: &mut Device<T>) -> CmdResult {
    let status = device.status()?;
    let outputs = device.output_states()?;
    for line in report::status_lines(status, Some(outputs)) {
        println!("{}", line);
    }
    Ok(())
}

/// Show the divider plan for a frequency
pub fn cmd_plan(config: &DeviceConfig, freq_hz: u32) -> CmdResult {
    config.validate()?;
    let synth = FrequencySynthesizer::from_config(config);
    let plan = synth.plan(freq_hz)?;
    for line in report::plan_lines(freq_hz, &plan, synth.output_hz(&plan)) {
        println!("{}", line);
    }
    Ok(())
}

/// Power everything down
pub fn cmd_shutdown<T: I2cTransport>(device: &mut Device<T>) -> CmdResult {
    let pb = spinner("Resetting Si5351A and disabling all outputs...")?;
    let result = device.shutdown();
    pb.finish_and_clear();

    result?;
    println!("Reset complete, all outputs disabled");
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use si5351_session::open_device;

    #[test]
    fn test_commands_against_dummy() {
        let mut device = open_device("dummy", DeviceConfig::default()).unwrap();
        cmd_init(&mut device).unwrap();
        cmd_set(&mut device, ChannelId::CLK0, 10_000_000).unwrap();
        cmd_set(&mut device, ChannelId::CLK1, 175_000_000).unwrap();
        cmd_off(&mut device, ChannelId::CLK0).unwrap();
        cmd_on(&mut device, ChannelId::CLK0).unwrap();
        cmd_read(&mut device, 0x10).unwrap();
        cmd_status(&mut device).unwrap();
        cmd_shutdown(&mut device).unwrap();
        assert_eq!(device.state(), DeviceState::Reset);
    }

    #[test]
    fn test_init_failure_is_an_error() {
        let mut device = open_device("dummy:lock_polls=1000", DeviceConfig::default()).unwrap();
        assert!(cmd_init(&mut device).is_err());
    }

    #[test]
    fn test_plan_needs_no_device() {
        assert!(cmd_plan(&DeviceConfig::default(), 7_000_000).is_ok());
        assert!(cmd_plan(&DeviceConfig::default(), 1_000).is_err());
    }
}

//! Output programming and gating

use crate::bus::RegisterBus;
use crate::config::DriveStrength;
use crate::error::{Error, Result};
use crate::registers::{self, ChannelId, ClockControl, OutputDisable, PllReset};
use crate::synth::MultisynthPlan;
use crate::transport::{Delay, I2cTransport};

/// Settle time after a PLL reset pulse, in milliseconds
pub const PLL_SETTLE_MS: u32 = 100;

/// Per-channel divider, control and enable handling
pub struct OutputController<'a, T> {
    bus: &'a mut RegisterBus<T>,
    drive: DriveStrength,
}

impl<'a, T: I2cTransport> OutputController<'a, T> {
    /// Controller working through `bus`
    pub fn new(bus: &'a mut RegisterBus<T>, drive: DriveStrength) -> Self {
        Self { bus, drive }
    }

    /// CLK control value for a plan: powered up, PLLA, MultiSynth source
    pub fn control_value(&self, plan: &MultisynthPlan) -> u8 {
        let mut control = ClockControl::SRC_MULTISYNTH | self.drive.bits();
        if plan.integer_mode {
            control |= ClockControl::INTEGER_MODE;
        }
        control.bits()
    }

    /// Program a channel and switch it on
    ///
    /// Writes the eight divider bytes, the control register, clears the
    /// channel's disable bit and pulses the PLLA reset so the new divider
    /// starts cleanly. Stops at the first write that fails.
    pub fn apply(&mut self, channel: ChannelId, plan: &MultisynthPlan) -> Result<()> {
        let base = channel.multisynth_base();
        for (offset, value) in plan.registers().into_iter().enumerate() {
            self.bus.write(base + offset as u8, value)?;
        }

        let control = self.control_value(plan);
        self.bus.write(channel.control_register(), control)?;

        self.enable(channel)?;

        self.bus.write_best_effort(registers::PLL_RESET, PllReset::PLLA.bits());
        self.bus.delay_ms(PLL_SETTLE_MS);
        Ok(())
    }

    /// Clear the channel's disable bit, leaving other outputs alone
    pub fn enable(&mut self, channel: ChannelId) -> Result<()> {
        let bit = channel.disable_bit().bits();
        self.bus.update(registers::OUTPUT_ENABLE, |v| v & !bit)?;
        log::debug!("{} output enabled", channel);
        Ok(())
    }

    /// Set the channel's disable bit, leaving other outputs alone
    pub fn disable(&mut self, channel: ChannelId) -> Result<()> {
        let bit = channel.disable_bit().bits();
        self.bus.update(registers::OUTPUT_ENABLE, |v| v | bit)?;
        log::debug!("{} output disabled", channel);
        Ok(())
    }

    /// Read the output enable register
    pub fn states(&mut self) -> Result<OutputDisable> {
        self.bus
            .read(registers::OUTPUT_ENABLE)
            .map(OutputDisable::from_bits_retain)
    }

    /// Turn everything off
    ///
    /// Disables all outputs, powers down every CLK driver, resets both
    /// PLLs and clears the sticky interrupt bits. Every step is attempted
    /// even if an earlier one failed; nothing is rolled back. The first
    /// failed register is reported as [`Error::Shutdown`].
    pub fn shutdown_all(&mut self) -> Result<()> {
        let mut first_failure: Option<u8> = None;
        let mut note = |register: u8, result: Result<()>| {
            if let Err(e) = result {
                log::warn!("Shutdown step at register 0x{:02X} failed: {}", register, e);
                first_failure.get_or_insert(register);
            }
        };

        note(
            registers::OUTPUT_ENABLE,
            self.bus.write(registers::OUTPUT_ENABLE, 0xFF),
        );
        for register in registers::CLK_CONTROL_BASE..=registers::CLK_CONTROL_LAST {
            note(
                register,
                self.bus.write(register, ClockControl::POWER_DOWN.bits()),
            );
        }

        self.bus.write_best_effort(registers::PLL_RESET, PllReset::all().bits());
        self.bus.delay_ms(PLL_SETTLE_MS);

        note(
            registers::INTERRUPT_STATUS,
            self.bus.write(registers::INTERRUPT_STATUS, 0x00),
        );

        match first_failure {
            None => Ok(()),
            Some(register) => Err(Error::Shutdown { register }),
        }
    }
}

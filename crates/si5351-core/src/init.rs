//! Two-stage bring-up
//!
//! Stage 1 waits for the chip's internal startup (SYS_INIT) to finish,
//! then writes the fixed configuration: outputs off, crystal load, unused
//! inputs powered down, crystal selected as PLLA reference, PLLA feedback
//! divider in integer mode, and a PLLA soft reset.
//!
//! Stage 2 polls for PLLA lock. A round that ends without lock re-applies
//! the crystal load and pulses the PLL reset again before the next round.

use crate::bus::RegisterBus;
use crate::config::{DeviceConfig, PllConfig};
use crate::error::{Error, Result};
use crate::registers::{self, DeviceStatus, PllReset};
use crate::retry::{Attempt, RetryPolicy};
use crate::transport::{Delay, I2cTransport};

/// Why initialization ended without a locked PLL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitFailure {
    /// SYS_INIT never cleared
    SysInitTimeout,
    /// PLLA never reported lock
    PllLockTimeout,
    /// A register transaction failed
    Bus(Error),
}

impl core::fmt::Display for InitFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SysInitTimeout => write!(f, "{}", Error::InitTimeout),
            Self::PllLockTimeout => write!(f, "{}", Error::PllLockTimeout),
            Self::Bus(e) => write!(f, "{}", e),
        }
    }
}

/// Poll budgets of the bring-up state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitTiming {
    /// Status polls waiting for SYS_INIT to clear
    pub sys_init: RetryPolicy,
    /// Status polls per lock round
    pub lock: RetryPolicy,
    /// Number of lock rounds, each followed by a recovery if unlocked
    pub lock_rounds: u32,
    /// Settle time after a PLL reset pulse, in milliseconds
    pub pll_settle_ms: u32,
}

impl Default for InitTiming {
    fn default() -> Self {
        Self {
            sys_init: RetryPolicy::new(100, 50),
            lock: RetryPolicy::new(50, 50),
            lock_rounds: 3,
            pll_settle_ms: 100,
        }
    }
}

/// Bring-up state machine
pub struct DeviceInitializer {
    config: DeviceConfig,
    pll: PllConfig,
    timing: InitTiming,
}

impl DeviceInitializer {
    /// Initializer for a configuration
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        Ok(Self {
            config: *config,
            pll: PllConfig::from_config(config)?,
            timing: InitTiming::default(),
        })
    }

    /// Override the poll budgets
    pub fn with_timing(mut self, timing: InitTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Run both stages
    ///
    /// Returns [`Error::InitTimeout`] or [`Error::PllLockTimeout`] when a
    /// poll budget runs out, and bus errors as they come.
    pub fn run<T: I2cTransport>(&self, bus: &mut RegisterBus<T>) -> Result<()> {
        self.wait_for_sys_init(bus)?;
        log::debug!("SYS_INIT cleared, configuring");
        self.configure(bus)?;
        self.wait_for_lock(bus)
    }

    fn wait_for_sys_init<T: I2cTransport>(&self, bus: &mut RegisterBus<T>) -> Result<()> {
        self.timing.sys_init.run(bus, |bus, attempt| {
            match bus.read(registers::DEVICE_STATUS) {
                Ok(raw) if DeviceStatus::from_raw(raw).is_ready() => Attempt::Done(()),
                Ok(raw) => {
                    log::debug!("SYS_INIT still set (status 0x{:02X}, poll {})", raw, attempt);
                    Attempt::Retry(Error::InitTimeout)
                }
                // The chip may NAK while it is still starting up
                Err(e) => {
                    log::debug!("Status read failed during startup (poll {}): {}", attempt, e);
                    Attempt::Retry(Error::InitTimeout)
                }
            }
        })
    }

    fn configure<T: I2cTransport>(&self, bus: &mut RegisterBus<T>) -> Result<()> {
        bus.write(registers::DEVICE_CONFIG, registers::DEVICE_CONFIG_VALUE)?;
        bus.write(registers::INTERRUPT_STATUS, 0x00)?;
        bus.write(registers::SPREAD_SPECTRUM, 0x00)?;
        bus.write(registers::OUTPUT_ENABLE, 0xFF)?;
        bus.write(registers::CRYSTAL_LOAD, self.config.crystal_load.register_value())?;

        for (register, value) in registers::INPUT_POWER_DOWN {
            bus.write(register, value)?;
        }

        bus.write(registers::PLL_INPUT_SOURCE, 0x00)?;
        bus.write(registers::PLLA_SOURCE, registers::PLLA_SOURCE_XTAL)?;

        for (offset, value) in self.pll.registers().into_iter().enumerate() {
            bus.write(registers::PLLA_BASE + offset as u8, value)?;
        }
        log::debug!(
            "PLLA programmed: P1={} P2={} P3={}",
            self.pll.p1,
            self.pll.p2,
            self.pll.p3
        );

        self.reset_pll(bus);
        Ok(())
    }

    fn wait_for_lock<T: I2cTransport>(&self, bus: &mut RegisterBus<T>) -> Result<()> {
        for round in 1..=self.timing.lock_rounds {
            let locked = self.timing.lock.run(bus, |bus, attempt| {
                match bus.read(registers::DEVICE_STATUS) {
                    Ok(raw) if DeviceStatus::from_raw(raw).is_pll_a_locked() => Attempt::Done(()),
                    Ok(raw) => {
                        log::trace!("PLLA not locked (status 0x{:02X}, poll {})", raw, attempt);
                        Attempt::Retry(Error::PllLockTimeout)
                    }
                    Err(e) => Attempt::Fail(e),
                }
            });

            match locked {
                Ok(()) => {
                    log::info!("PLLA locked");
                    return Ok(());
                }
                Err(Error::PllLockTimeout) => {
                    log::warn!(
                        "PLLA not locked after round {}/{}, re-applying crystal load",
                        round,
                        self.timing.lock_rounds
                    );
                    bus.write(registers::CRYSTAL_LOAD, self.config.crystal_load.register_value())?;
                    self.reset_pll(bus);
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::PllLockTimeout)
    }

    fn reset_pll<T: I2cTransport>(&self, bus: &mut RegisterBus<T>) {
        bus.write_best_effort(registers::PLL_RESET, PllReset::PLLA.bits());
        bus.delay_ms(self.timing.pll_settle_ms);
    }
}

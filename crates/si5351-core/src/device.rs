//! Device facade
//!
//! [`Device`] owns the register bus for one chip and exposes the
//! operations front-ends call: `init`, `set_frequency`, `enable`,
//! `disable`, `read`, `status` and `shutdown`. Apart from the lifecycle
//! state it keeps nothing in memory; output state is always read back
//! from the chip.

use crate::bus::RegisterBus;
use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::init::{DeviceInitializer, InitFailure, InitTiming};
use crate::output::OutputController;
use crate::registers::{self, ChannelId, DeviceStatus, OutputDisable, RegisterAddress};
use crate::synth::{FrequencySynthesizer, MultisynthPlan};
use crate::transport::I2cTransport;

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Nothing done yet in this session
    Uninitialized,
    /// `init` is running
    Initializing,
    /// PLLA locked, outputs can be programmed
    Locked,
    /// `init` gave up
    InitFailed(InitFailure),
    /// `shutdown` ran; `init` is needed again
    Reset,
}

impl core::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initializing => write!(f, "initializing"),
            Self::Locked => write!(f, "locked"),
            Self::InitFailed(reason) => write!(f, "init failed: {}", reason),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// Per-output state read from the output enable register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputStates(OutputDisable);

impl OutputStates {
    /// Whether `channel` is enabled
    pub fn is_enabled(&self, channel: ChannelId) -> bool {
        !self.0.contains(channel.disable_bit())
    }

    /// Raw register value
    pub fn raw(&self) -> u8 {
        self.0.bits()
    }
}

/// One Si5351A on one transport
pub struct Device<T> {
    bus: RegisterBus<T>,
    config: DeviceConfig,
    synth: FrequencySynthesizer,
    timing: InitTiming,
    state: DeviceState,
}

impl<T: I2cTransport> Device<T> {
    /// Create a driver for the chip described by `config`
    pub fn new(transport: T, config: DeviceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            bus: RegisterBus::new(transport, config.address, config.retry),
            synth: FrequencySynthesizer::from_config(&config),
            config,
            timing: InitTiming::default(),
            state: DeviceState::Uninitialized,
        })
    }

    /// Override the bring-up poll budgets
    pub fn with_init_timing(mut self, timing: InitTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Configuration this device was created with
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Frequency planner for this device's VCO
    pub fn synthesizer(&self) -> &FrequencySynthesizer {
        &self.synth
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        self.bus.transport()
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        self.bus.transport_mut()
    }

    /// Check that something answers at the chip address
    ///
    /// A single status read without retries.
    pub fn probe(&mut self) -> Result<DeviceStatus> {
        self.bus
            .probe(registers::DEVICE_STATUS)
            .map(DeviceStatus::from_raw)
    }

    /// Bring the chip up and lock PLLA
    ///
    /// Poll timeouts are not errors: they end in
    /// [`DeviceState::InitFailed`] and are returned as `Ok`. Register
    /// transaction failures are returned as `Err` and also leave the
    /// device in `InitFailed`.
    pub fn init(&mut self) -> Result<DeviceState> {
        let initializer = DeviceInitializer::new(&self.config)?.with_timing(self.timing);

        self.state = DeviceState::Initializing;
        log::info!(
            "Initializing Si5351A at 0x{:02X} on {}",
            self.config.address,
            self.bus.transport().name()
        );
        let result = initializer.run(&mut self.bus);

        self.state = match result {
            Ok(()) => DeviceState::Locked,
            Err(Error::InitTimeout) => DeviceState::InitFailed(InitFailure::SysInitTimeout),
            Err(Error::PllLockTimeout) => DeviceState::InitFailed(InitFailure::PllLockTimeout),
            Err(e) => {
                self.state = DeviceState::InitFailed(InitFailure::Bus(e));
                return Err(e);
            }
        };

        match self.state {
            DeviceState::Locked => log::info!("Si5351A initialized"),
            state => log::error!("Si5351A {}", state),
        }
        Ok(self.state)
    }

    /// Pick up a chip brought up by an earlier session
    ///
    /// Reads the status register once. If PLLA reports lock the state
    /// becomes [`DeviceState::Locked`]; otherwise it is left unchanged.
    pub fn resume(&mut self) -> Result<DeviceState> {
        let status = self.status()?;
        if status.is_pll_a_locked() && self.state != DeviceState::Locked {
            log::debug!("PLLA already locked, resuming");
            self.state = DeviceState::Locked;
        }
        Ok(self.state)
    }

    /// Program `channel` to `freq_hz` and enable it
    ///
    /// Input is validated before any bus traffic. Returns the plan that
    /// was written.
    pub fn set_frequency(&mut self, channel: ChannelId, freq_hz: u32) -> Result<MultisynthPlan> {
        let plan = self.synth.plan(freq_hz)?;
        self.warn_if_not_locked("set_frequency");
        self.outputs().apply(channel, &plan)?;
        log::info!("{} set to {} Hz", channel, freq_hz);
        Ok(plan)
    }

    /// Enable an output
    pub fn enable(&mut self, channel: ChannelId) -> Result<()> {
        self.warn_if_not_locked("enable");
        self.outputs().enable(channel)
    }

    /// Disable an output
    pub fn disable(&mut self, channel: ChannelId) -> Result<()> {
        self.outputs().disable(channel)
    }

    /// Read any register
    pub fn read(&mut self, register: u32) -> Result<u8> {
        let register = RegisterAddress::new(register)?;
        self.bus.read(register.get())
    }

    /// Read and decode the status register
    pub fn status(&mut self) -> Result<DeviceStatus> {
        self.bus
            .read(registers::DEVICE_STATUS)
            .map(DeviceStatus::from_raw)
    }

    /// Read which outputs are enabled
    pub fn output_states(&mut self) -> Result<OutputStates> {
        self.outputs().states().map(OutputStates)
    }

    /// Disable and power down everything
    ///
    /// The state moves to [`DeviceState::Reset`] even when a step fails,
    /// since part of the sequence has already been applied.
    pub fn shutdown(&mut self) -> Result<()> {
        log::info!("Resetting Si5351A and disabling all outputs");
        let result = self.outputs().shutdown_all();
        self.state = DeviceState::Reset;
        result
    }

    fn outputs(&mut self) -> OutputController<'_, T> {
        OutputController::new(&mut self.bus, self.config.drive)
    }

    fn warn_if_not_locked(&self, operation: &str) {
        if self.state != DeviceState::Locked {
            log::warn!("{} while device is {}", operation, self.state);
        }
    }
}

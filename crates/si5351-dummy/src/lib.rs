//! si5351-dummy - In-memory Si5351A emulator for testing
//!
//! This crate provides a transport that emulates the Si5351A register
//! file. It's useful for testing the driver and the front-ends without
//! real hardware: startup and PLL lock take a configurable number of
//! status polls, transport faults and read-back corruption can be
//! injected, and every transaction is logged.

use si5351_core::error::{Error, Result};
use si5351_core::registers::{self, DeviceStatus, PllReset};
use si5351_core::transport::{Delay, I2cTransport};

/// Configuration for the dummy chip
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// 7-bit address the chip answers at
    pub address: u8,
    /// Status reads before SYS_INIT clears (`None`: never)
    pub sys_init_reads: Option<u32>,
    /// Status reads after a PLLA reset before lock is reported (`None`: never)
    pub lock_polls: Option<u32>,
    /// Revision ID reported in the status register
    pub revision: u8,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            address: 0x60,
            sys_init_reads: Some(2),
            lock_polls: Some(1),
            revision: 0,
        }
    }
}

/// One transport call seen by the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    /// Register read and the value returned
    Read { register: u8, value: u8 },
    /// Register write
    Write { register: u8, value: u8 },
    /// Delay request
    Delay { ms: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PllState {
    /// No reset pulse since power-up
    Idle,
    /// Reset pulsed, this many status polls until lock
    Settling(u32),
    Locked,
}

/// Emulated Si5351A
pub struct DummyChip {
    config: DummyConfig,
    regs: [u8; 256],
    sys_init_left: Option<u32>,
    pll: PllState,
    fail_next: u32,
    corrupt: Option<(u8, u32)>,
    log: Vec<Transaction>,
}

impl DummyChip {
    /// Create a dummy chip with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            sys_init_left: config.sys_init_reads,
            config,
            regs: [0; 256],
            pll: PllState::Idle,
            fail_next: 0,
            corrupt: None,
            log: Vec::new(),
        }
    }

    /// Create a dummy chip that starts up and locks promptly
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Fail the next `count` transport calls with [`Error::Io`]
    pub fn fail_next(&mut self, count: u32) {
        self.fail_next = count;
    }

    /// Return the inverted value for the next `count` reads of `register`
    pub fn corrupt_readback(&mut self, register: u8, count: u32) {
        self.corrupt = Some((register, count));
    }

    /// Current register contents, write-only registers included
    pub fn register(&self, register: u8) -> u8 {
        self.regs[register as usize]
    }

    /// Whether the emulated PLLA is locked
    pub fn is_locked(&self) -> bool {
        self.pll == PllState::Locked
    }

    /// Every transaction so far
    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    /// Forget the transaction log
    pub fn clear_transactions(&mut self) {
        self.log.clear();
    }

    /// Values written to `register`, in order
    pub fn writes_to(&self, register: u8) -> Vec<u8> {
        self.log
            .iter()
            .filter_map(|t| match *t {
                Transaction::Write { register: r, value } if r == register => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Number of reads of `register`
    pub fn reads_of(&self, register: u8) -> usize {
        self.log
            .iter()
            .filter(|t| matches!(t, Transaction::Read { register: r, .. } if *r == register))
            .count()
    }

    /// Total delay requested, in milliseconds
    pub fn delayed_ms(&self) -> u64 {
        self.log
            .iter()
            .map(|t| match *t {
                Transaction::Delay { ms } => ms as u64,
                _ => 0,
            })
            .sum()
    }

    fn check(&mut self, device: u8) -> Result<()> {
        if device != self.config.address {
            log::trace!("dummy: no ACK at 0x{:02X}", device);
            return Err(Error::Io);
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            log::trace!("dummy: injected fault");
            return Err(Error::Io);
        }
        Ok(())
    }

    fn status(&mut self) -> u8 {
        let mut status = DeviceStatus::from_raw(self.config.revision & DeviceStatus::REVID.bits());

        match self.sys_init_left {
            Some(0) => {}
            Some(n) => {
                self.sys_init_left = Some(n - 1);
                status |= DeviceStatus::SYS_INIT;
            }
            None => status |= DeviceStatus::SYS_INIT,
        }

        match self.pll {
            PllState::Locked => {}
            PllState::Settling(0) => self.pll = PllState::Locked,
            PllState::Settling(n) => {
                self.pll = PllState::Settling(n - 1);
                status |= DeviceStatus::LOL_A;
            }
            PllState::Idle => status |= DeviceStatus::LOL_A,
        }

        status.bits()
    }

    fn on_write(&mut self, register: u8, value: u8) {
        if register == registers::PLL_RESET && value & PllReset::PLLA.bits() != 0 {
            self.pll = match self.config.lock_polls {
                Some(n) => PllState::Settling(n),
                None => PllState::Idle,
            };
        }
    }
}

impl Delay for DummyChip {
    fn delay_ms(&mut self, ms: u32) {
        self.log.push(Transaction::Delay { ms });
    }
}

impl I2cTransport for DummyChip {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn write_byte(&mut self, device: u8, register: u8, value: u8) -> Result<()> {
        self.check(device)?;
        self.log.push(Transaction::Write { register, value });
        if register != registers::DEVICE_STATUS {
            self.regs[register as usize] = value;
        }
        self.on_write(register, value);
        Ok(())
    }

    fn read_byte(&mut self, device: u8, register: u8) -> Result<u8> {
        self.check(device)?;

        let value = if register == registers::DEVICE_STATUS {
            self.status()
        } else if registers::is_write_only(register) {
            0
        } else {
            let value = self.regs[register as usize];
            match self.corrupt {
                Some((r, n)) if r == register && n > 0 => {
                    self.corrupt = Some((r, n - 1));
                    !value
                }
                _ => value,
            }
        };

        self.log.push(Transaction::Read { register, value });
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use si5351_core::config::DeviceConfig;
    use si5351_core::device::{Device, DeviceState};
    use si5351_core::init::InitFailure;
    use si5351_core::registers::ChannelId;

    fn device(chip: &mut DummyChip) -> Device<&mut DummyChip> {
        Device::new(chip, DeviceConfig::default()).unwrap()
    }

    #[test]
    fn test_status_sequence() {
        let mut chip = DummyChip::new_default();
        assert_eq!(chip.read_byte(0x60, 0x00).unwrap(), 0xA0);
        assert_eq!(chip.read_byte(0x60, 0x00).unwrap(), 0xA0);
        assert_eq!(chip.read_byte(0x60, 0x00).unwrap(), 0x20);

        chip.write_byte(0x60, 0xB1, 0x20).unwrap();
        assert_eq!(chip.read_byte(0x60, 0x00).unwrap(), 0x20);
        assert_eq!(chip.read_byte(0x60, 0x00).unwrap(), 0x00);
        assert!(chip.is_locked());
    }

    #[test]
    fn test_wrong_address_is_nak() {
        let mut chip = DummyChip::new_default();
        assert_eq!(chip.read_byte(0x61, 0x00), Err(Error::Io));
        assert!(chip.transactions().is_empty());
    }

    #[test]
    fn test_init_locks() {
        let mut chip = DummyChip::new_default();
        let mut dev = device(&mut chip);
        assert_eq!(dev.init(), Ok(DeviceState::Locked));
        drop(dev);

        assert!(chip.is_locked());
        assert_eq!(chip.register(0x02), 0x18);
        assert_eq!(chip.register(0x03), 0xFF);
        assert_eq!(chip.register(0xB7), 0xD2);
        assert_eq!(chip.register(0xBB), 0x50);
        assert_eq!(chip.register(0x0F), 0x00);
        assert_eq!(chip.register(22), 0xC0);
        // PLLA = 32 * 25 MHz, integer mode
        assert_eq!(chip.register(26 + 1), 0x01);
        assert_eq!(chip.register(26 + 3), 0x0E);
        assert_eq!(chip.writes_to(0xB1), [0x20]);
    }

    #[test]
    fn test_init_sys_init_timeout() {
        let mut chip = DummyChip::new(DummyConfig {
            sys_init_reads: None,
            ..DummyConfig::default()
        });
        let mut dev = device(&mut chip);
        assert_eq!(
            dev.init(),
            Ok(DeviceState::InitFailed(InitFailure::SysInitTimeout))
        );
        drop(dev);

        assert_eq!(chip.reads_of(0x00), 100);
        assert_eq!(chip.writes_to(0x02), Vec::<u8>::new());
    }

    #[test]
    fn test_init_lock_timeout_retries_recovery() {
        let mut chip = DummyChip::new(DummyConfig {
            lock_polls: None,
            ..DummyConfig::default()
        });
        let mut dev = device(&mut chip);
        assert_eq!(
            dev.init(),
            Ok(DeviceState::InitFailed(InitFailure::PllLockTimeout))
        );
        drop(dev);

        // Initial pulse plus one recovery per failed round
        assert_eq!(chip.writes_to(0xB1), [0x20; 4]);
        assert_eq!(chip.writes_to(0xB7), [0xD2; 4]);
    }

    #[test]
    fn test_set_frequency_programs_channel() {
        let mut chip = DummyChip::new_default();
        let mut dev = device(&mut chip);
        dev.init().unwrap();
        dev.set_frequency(ChannelId::CLK1, 25_000_000).unwrap();
        drop(dev);

        let base = 42 + 8;
        let divider: Vec<u8> = (base..base + 8).map(|r| chip.register(r)).collect();
        assert_eq!(divider, [0x00, 0x01, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(chip.register(17), 0x4F);
        assert_eq!(chip.register(0x03), 0xFD);
    }

    #[test]
    fn test_write_only_registers_are_not_read_back() {
        let mut chip = DummyChip::new_default();
        let mut dev = device(&mut chip);
        dev.init().unwrap();
        drop(dev);

        for register in [0x01, 0xB1, 0xBB] {
            assert!(!chip.writes_to(register).is_empty());
            assert_eq!(chip.reads_of(register), 0);
        }
        assert_eq!(chip.reads_of(0x02), 1);
    }

    #[test]
    fn test_verification_retry_recovers() {
        let mut chip = DummyChip::new_default();
        chip.write_byte(0x60, 0x03, 0xFF).unwrap();
        chip.corrupt_readback(0x10, 2);
        chip.clear_transactions();

        let mut dev = device(&mut chip);
        dev.set_frequency(ChannelId::CLK0, 10_000_000).unwrap();
        drop(dev);

        assert_eq!(chip.writes_to(0x10).len(), 3);
        assert_eq!(chip.register(0x10), 0x4F);
    }

    #[test]
    fn test_verification_failure_is_reported() {
        let mut chip = DummyChip::new_default();
        chip.corrupt_readback(0x03, 10);
        let mut dev = device(&mut chip);
        let err = dev.shutdown().unwrap_err();
        assert_eq!(err, Error::Shutdown { register: 0x03 });
        assert_eq!(dev.state(), DeviceState::Reset);
    }

    #[test]
    fn test_shutdown_powers_everything_down() {
        let mut chip = DummyChip::new_default();
        let mut dev = device(&mut chip);
        dev.init().unwrap();
        dev.set_frequency(ChannelId::CLK0, 7_000_000).unwrap();
        dev.shutdown().unwrap();
        drop(dev);

        assert_eq!(chip.register(0x03), 0xFF);
        for r in 16..=23 {
            assert_eq!(chip.register(r), 0x80);
        }
        assert_eq!(chip.register(0x01), 0x00);
        assert_eq!(chip.writes_to(0xB1).last(), Some(&0xA0));
    }

    #[test]
    fn test_io_faults_are_retried() {
        let mut chip = DummyChip::new_default();
        chip.write_byte(0x60, 0x2A, 0x5A).unwrap();
        chip.fail_next(4);
        let mut dev = device(&mut chip);
        assert_eq!(dev.read(0x2A), Ok(0x5A));
        drop(dev);
        assert_eq!(chip.delayed_ms(), 4 * 50);
    }

    #[test]
    fn test_io_faults_exhaust_retries() {
        let mut chip = DummyChip::new_default();
        chip.fail_next(5);
        let mut dev = device(&mut chip);
        assert_eq!(dev.read(0x2A), Err(Error::Comm { register: 0x2A }));
    }
}

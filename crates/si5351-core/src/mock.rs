//! Scripted transport for unit tests

use crate::error::{Error, Result};
use crate::registers::DEVICE_STATUS;
use crate::transport::{Delay, I2cTransport};
use std::collections::VecDeque;
use std::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Write(u8, u8),
    Read(u8),
}

/// Register file with a scripted status register and fault injection
pub struct MockTransport {
    regs: [u8; 256],
    /// Values returned by successive status reads; the last one sticks
    status: VecDeque<u8>,
    ops: Vec<Op>,
    fail_next: u32,
    corrupt: Option<(u8, u32)>,
    slept_ms: u32,
    attempts: u32,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            regs: [0; 256],
            status: VecDeque::new(),
            ops: Vec::new(),
            fail_next: 0,
            corrupt: None,
            slept_ms: 0,
            attempts: 0,
        }
    }

    pub fn script_status(&mut self, values: &[u8]) {
        self.status = values.iter().copied().collect();
    }

    pub fn fail_next(&mut self, count: u32) {
        self.fail_next = count;
    }

    pub fn corrupt_readback(&mut self, register: u8, count: u32) {
        self.corrupt = Some((register, count));
    }

    pub fn set_register(&mut self, register: u8, value: u8) {
        self.regs[register as usize] = value;
    }

    pub fn register(&self, register: u8) -> u8 {
        self.regs[register as usize]
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn writes(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::Write(..))).count()
    }

    pub fn writes_to(&self, register: u8) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                Op::Write(r, v) if r == register => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn slept_ms(&self) -> u32 {
        self.slept_ms
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn fault(&mut self) -> bool {
        self.attempts += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            true
        } else {
            false
        }
    }
}

impl Delay for MockTransport {
    fn delay_ms(&mut self, ms: u32) {
        self.slept_ms += ms;
    }
}

impl I2cTransport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn write_byte(&mut self, _device: u8, register: u8, value: u8) -> Result<()> {
        if self.fault() {
            return Err(Error::Io);
        }
        self.ops.push(Op::Write(register, value));
        self.regs[register as usize] = value;
        Ok(())
    }

    fn read_byte(&mut self, _device: u8, register: u8) -> Result<u8> {
        if self.fault() {
            return Err(Error::Io);
        }
        self.ops.push(Op::Read(register));

        if register == DEVICE_STATUS {
            let value = if self.status.len() > 1 {
                self.status.pop_front()
            } else {
                self.status.front().copied()
            };
            return Ok(value.unwrap_or(self.regs[0]));
        }

        let value = self.regs[register as usize];
        match self.corrupt {
            Some((r, n)) if r == register && n > 0 => {
                self.corrupt = Some((r, n - 1));
                Ok(value ^ 0xFF)
            }
            _ => Ok(value),
        }
    }
}

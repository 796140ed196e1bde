//! Si5351A register map
//!
//! Only the registers the driver touches are listed. Addresses and bit
//! layouts follow the Si5351A/B/C-B datasheet and AN619.

use crate::error::RangeError;
use bitflags::bitflags;

/// Device status
pub const DEVICE_STATUS: u8 = 0x00;
/// Interrupt status sticky bits (write-only from the driver's point of view)
pub const INTERRUPT_STATUS: u8 = 0x01;
/// Interrupt status mask / device configuration
pub const DEVICE_CONFIG: u8 = 0x02;
/// Output enable control, bit n = 1 disables CLKn
pub const OUTPUT_ENABLE: u8 = 0x03;
/// PLL input source select
pub const PLL_INPUT_SOURCE: u8 = 0x0F;
/// CLK0 control, CLKn control lives at `CLK_CONTROL_BASE + n`
pub const CLK_CONTROL_BASE: u8 = 16;
/// Last CLK control register (CLK7)
pub const CLK_CONTROL_LAST: u8 = 23;
/// First PLLA feedback MultiSynth register
pub const PLLA_BASE: u8 = 26;
/// First MultiSynth0 register, MSn lives at `MULTISYNTH_BASE + 8 * n`
pub const MULTISYNTH_BASE: u8 = 42;
/// Spread spectrum / fanout control
pub const SPREAD_SPECTRUM: u8 = 149;
/// PLL soft reset (write-only)
pub const PLL_RESET: u8 = 0xB1;
/// Crystal internal load capacitance
pub const CRYSTAL_LOAD: u8 = 0xB7;
/// PLLA source select (write-only)
pub const PLLA_SOURCE: u8 = 0xBB;

/// Value written to [`DEVICE_CONFIG`] during bring-up
pub const DEVICE_CONFIG_VALUE: u8 = 0x18;
/// Value written to [`PLLA_SOURCE`] to feed PLLA from the crystal
pub const PLLA_SOURCE_XTAL: u8 = 0x50;

/// Power-down values for the unused clock inputs and outputs
pub const INPUT_POWER_DOWN: [(u8, u8); 5] = [
    (19, 0x80),
    (20, 0x80),
    (21, 0x80),
    (22, 0xC0),
    (23, 0x80),
];

/// Registers that must never be read back after a write
///
/// Reading these either returns unrelated data or disturbs chip state.
pub const WRITE_ONLY: [u8; 3] = [INTERRUPT_STATUS, PLL_RESET, PLLA_SOURCE];

/// Check whether a register is excluded from write verification
pub fn is_write_only(register: u8) -> bool {
    WRITE_ONLY.contains(&register)
}

bitflags! {
    /// Device status register (0x00)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceStatus: u8 {
        /// System initialization in progress
        const SYS_INIT  = 0x80;
        /// PLLB loss of lock
        const LOL_B     = 0x40;
        /// PLLA loss of lock
        const LOL_A     = 0x20;
        /// Loss of CLKIN signal
        const LOS_CLKIN = 0x10;
        /// Loss of crystal signal
        const LOS_XTAL  = 0x08;
        /// Revision ID
        const REVID     = 0x03;

        /// Bits that must be clear for PLLA to count as locked
        const PLLA_UNLOCKED = Self::SYS_INIT.bits() | Self::LOL_A.bits();
    }
}

impl DeviceStatus {
    /// Decode a raw status byte
    pub const fn from_raw(raw: u8) -> Self {
        Self::from_bits_retain(raw)
    }

    /// True once the internal startup sequence has finished
    pub fn is_ready(&self) -> bool {
        !self.contains(Self::SYS_INIT)
    }

    /// True when PLLA reports lock
    pub fn is_pll_a_locked(&self) -> bool {
        !self.intersects(Self::PLLA_UNLOCKED)
    }

    /// Silicon revision
    pub fn revision(&self) -> u8 {
        (*self & Self::REVID).bits()
    }
}

bitflags! {
    /// Output enable control register (0x03)
    ///
    /// A set bit disables the corresponding output.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OutputDisable: u8 {
        /// Disable CLK0
        const CLK0 = 1 << 0;
        /// Disable CLK1
        const CLK1 = 1 << 1;
        /// Disable CLK2
        const CLK2 = 1 << 2;
        // CLK3-CLK7 do not exist on the 10-pin Si5351A but the bits are real
        const _ = !0;
    }
}

bitflags! {
    /// CLKn control register (16-23)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClockControl: u8 {
        /// Power down the output driver
        const POWER_DOWN     = 0x80;
        /// MultiSynth integer mode
        const INTEGER_MODE   = 0x40;
        /// Use PLLB instead of PLLA
        const PLLB_SOURCE    = 0x20;
        /// Invert the output
        const INVERT         = 0x10;
        /// Select the channel's own MultiSynth as output source
        const SRC_MULTISYNTH = 0x0C;
        /// Output drive strength field
        const DRIVE          = 0x03;
    }
}

bitflags! {
    /// PLL soft reset register (0xB1)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PllReset: u8 {
        /// Reset PLLB
        const PLLB = 0x80;
        /// Reset PLLA
        const PLLA = 0x20;
    }
}

/// One of the three Si5351A outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(u8);

impl ChannelId {
    /// CLK0
    pub const CLK0: Self = Self(0);
    /// CLK1
    pub const CLK1: Self = Self(1);
    /// CLK2
    pub const CLK2: Self = Self(2);

    /// All outputs in order
    pub const ALL: [Self; 3] = [Self::CLK0, Self::CLK1, Self::CLK2];

    /// Validate a channel number
    pub fn new(channel: u32) -> Result<Self, RangeError> {
        match channel {
            0..=2 => Ok(Self(channel as u8)),
            _ => Err(RangeError::InvalidChannel(channel)),
        }
    }

    /// First of the eight MultiSynth divider registers
    pub const fn multisynth_base(self) -> u8 {
        MULTISYNTH_BASE + 8 * self.0
    }

    /// CLK control register
    pub const fn control_register(self) -> u8 {
        CLK_CONTROL_BASE + self.0
    }

    /// This channel's disable bit in [`OUTPUT_ENABLE`]
    pub const fn disable_bit(self) -> OutputDisable {
        OutputDisable::from_bits_retain(1 << self.0)
    }
}

impl TryFrom<u32> for ChannelId {
    type Error = RangeError;

    fn try_from(channel: u32) -> Result<Self, Self::Error> {
        Self::new(channel)
    }
}

impl core::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CLK{}", self.0)
    }
}

/// Validated register address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegisterAddress(u8);

impl RegisterAddress {
    /// Validate a register number coming from user input
    pub fn new(register: u32) -> Result<Self, RangeError> {
        u8::try_from(register)
            .map(Self)
            .map_err(|_| RangeError::InvalidRegister(register))
    }

    /// Raw address
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for RegisterAddress {
    fn from(register: u8) -> Self {
        Self(register)
    }
}

/// Pack a MultiSynth P1/P2/P3 triple into its eight register bytes
///
/// Layout (offsets from the block base):
///
/// | Offset | Contents |
/// |---|---|
/// | 0 | P3\[15:8\] |
/// | 1 | P3\[7:0\] |
/// | 2 | R_DIV\[2:0\] << 4, DIVBY4\[1:0\] << 2, P1\[17:16\] |
/// | 3 | P1\[15:8\] |
/// | 4 | P1\[7:0\] |
/// | 5 | P3\[19:16\] << 4, P2\[19:16\] |
/// | 6 | P2\[15:8\] |
/// | 7 | P2\[7:0\] |
///
/// The PLL feedback dividers use the same layout with `r_div_code` and
/// `divide_by_4` left at zero.
pub fn pack_divider(p1: u32, p2: u32, p3: u32, r_div_code: u8, divide_by_4: bool) -> [u8; 8] {
    let divby4: u8 = if divide_by_4 { 0x03 } else { 0x00 };
    [
        (p3 >> 8) as u8,
        p3 as u8,
        ((r_div_code & 0x07) << 4) | (divby4 << 2) | ((p1 >> 16) as u8 & 0x03),
        (p1 >> 8) as u8,
        p1 as u8,
        (((p3 >> 16) as u8 & 0x0F) << 4) | ((p2 >> 16) as u8 & 0x0F),
        (p2 >> 8) as u8,
        p2 as u8,
    ]
}

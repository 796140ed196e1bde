//! Output frequency synthesis
//!
//! Converts a target output frequency into the MultiSynth register
//! encoding. The output path is
//!
//! ```text
//! f_out = f_vco / (a + b/c) / R
//! ```
//!
//! where `a + b/c` is the fractional MultiSynth divider and `R` the
//! power-of-two output divider. The divider is packed into the datasheet's
//! P1/P2/P3 fields:
//!
//! ```text
//! P1 = 128·a + floor(128·b/c) − 512
//! P2 = 128·b − c·floor(128·b/c)
//! P3 = c
//! ```
//!
//! All arithmetic is done in integers, so a plan is a pure function of the
//! VCO and the requested frequency.

use crate::config::{DeviceConfig, DEFAULT_VCO_HZ};
use crate::error::RangeError;
use crate::registers::pack_divider;

/// Lowest accepted output frequency
pub const MIN_FREQUENCY_HZ: u32 = 2_500;
/// Highest accepted output frequency
pub const MAX_FREQUENCY_HZ: u32 = 200_000_000;
/// Below this the R divider is searched
pub const R_DIVIDER_THRESHOLD_HZ: u32 = 500_000;
/// Above this the fixed divide-by-4 path is used
pub const DIVIDE_BY_4_THRESHOLD_HZ: u32 = 150_000_000;
/// Fixed fractional denominator (2^20 - 1)
pub const FRACTION_DENOMINATOR: u32 = 1_048_575;
/// Smallest MultiSynth ratio accepted by the R divider search
pub const MULTISYNTH_MIN_RATIO: u64 = 8;
/// Largest MultiSynth ratio accepted by the R divider search
pub const MULTISYNTH_MAX_RATIO: u64 = 2048;

const P1_MAX: u64 = (1 << 18) - 1;

/// Fractional divider `a + b/c`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divider {
    /// Integer part
    pub a: u32,
    /// Fraction numerator
    pub b: u32,
    /// Fraction denominator
    pub c: u32,
}

/// Register-level settings for one output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultisynthPlan {
    /// Output R divider (1, 2, 4, ... 128)
    pub r_divider: u8,
    /// log2 of `r_divider`, as written to R_DIV
    pub r_div_code: u8,
    /// MultiSynth divider before packing
    pub divider: Divider,
    /// MSx_P1 (18 bits)
    pub p1: u32,
    /// MSx_P2 (20 bits)
    pub p2: u32,
    /// MSx_P3 (20 bits)
    pub p3: u32,
    /// Fixed divide-by-4 path (outputs above 150 MHz)
    pub divide_by_4: bool,
    /// MultiSynth integer mode bit of the CLK control register
    pub integer_mode: bool,
}

impl MultisynthPlan {
    fn divide_by_4() -> Self {
        Self {
            r_divider: 1,
            r_div_code: 0,
            divider: Divider { a: 4, b: 0, c: 1 },
            p1: 0,
            p2: 0,
            p3: 1,
            divide_by_4: true,
            integer_mode: true,
        }
    }

    /// The eight MultiSynth register bytes, starting at the block base
    pub fn registers(&self) -> [u8; 8] {
        pack_divider(self.p1, self.p2, self.p3, self.r_div_code, self.divide_by_4)
    }
}

/// Frequency planner for a fixed VCO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencySynthesizer {
    vco_hz: u32,
}

impl Default for FrequencySynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_VCO_HZ)
    }
}

impl FrequencySynthesizer {
    /// Planner for the given VCO frequency
    pub const fn new(vco_hz: u32) -> Self {
        Self { vco_hz }
    }

    /// Planner for a device configuration
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::new(config.vco_hz)
    }

    /// Compute the register settings for `freq_hz`
    pub fn plan(&self, freq_hz: u32) -> Result<MultisynthPlan, RangeError> {
        if !(MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&freq_hz) {
            return Err(RangeError::FrequencyOutOfBounds(freq_hz));
        }

        if freq_hz > DIVIDE_BY_4_THRESHOLD_HZ {
            // The fixed path outputs VCO / 4, which must itself be in band
            let output = self.vco_hz / 4;
            if !(DIVIDE_BY_4_THRESHOLD_HZ + 1..=MAX_FREQUENCY_HZ).contains(&output) {
                return Err(RangeError::UnreachableFrequency(freq_hz));
            }
            return Ok(MultisynthPlan::divide_by_4());
        }

        let r_div_code = if freq_hz < R_DIVIDER_THRESHOLD_HZ {
            self.select_r_divider(freq_hz)?
        } else {
            0
        };
        let r_divider = 1u8 << r_div_code;

        let vco = self.vco_hz as u64;
        let scaled = freq_hz as u64 * r_divider as u64;
        let a = vco / scaled;
        let remainder = vco % scaled;

        let b = remainder * FRACTION_DENOMINATOR as u64 / scaled;
        let c = if b == 0 { 1 } else { FRACTION_DENOMINATOR as u64 };

        let fraction = 128 * b / c;
        let p1 = (128 * a + fraction)
            .checked_sub(512)
            .filter(|p1| *p1 <= P1_MAX)
            .ok_or(RangeError::UnreachableFrequency(freq_hz))?;
        let p2 = 128 * b - c * fraction;

        // Odd integer ratios distort the duty cycle, keep those fractional
        let integer_mode = b == 0 && a % 2 == 0;

        let plan = MultisynthPlan {
            r_divider,
            r_div_code,
            divider: Divider {
                a: a as u32,
                b: b as u32,
                c: c as u32,
            },
            p1: p1 as u32,
            p2: p2 as u32,
            p3: c as u32,
            divide_by_4: false,
            integer_mode,
        };

        log::debug!(
            "plan {} Hz: {} + {}/{} R={} -> P1={} P2={} P3={} int={}",
            freq_hz,
            plan.divider.a,
            plan.divider.b,
            plan.divider.c,
            plan.r_divider,
            plan.p1,
            plan.p2,
            plan.p3,
            plan.integer_mode
        );

        Ok(plan)
    }

    /// Frequency the chip actually produces for `plan`
    ///
    /// Equal to the request on the fractional path up to rounding of
    /// `b/c`; on the divide-by-4 path it is always VCO / 4.
    pub fn output_hz(&self, plan: &MultisynthPlan) -> u32 {
        let d = plan.divider;
        let ratio_num = d.a as u64 * d.c as u64 + d.b as u64;
        let denominator = ratio_num * plan.r_divider as u64;
        if denominator == 0 {
            return 0;
        }
        let numerator = self.vco_hz as u64 * d.c as u64;
        ((numerator + denominator / 2) / denominator) as u32
    }

    /// Smallest R divider bringing the MultiSynth ratio into range
    fn select_r_divider(&self, freq_hz: u32) -> Result<u8, RangeError> {
        let vco = self.vco_hz as u64;
        (0u8..=7)
            .find(|code| {
                let scaled = freq_hz as u64 * (1u64 << code);
                vco >= MULTISYNTH_MIN_RATIO * scaled && vco <= MULTISYNTH_MAX_RATIO * scaled
            })
            .ok_or(RangeError::UnreachableFrequency(freq_hz))
    }
}

/// Plan `freq_hz` for the default 800 MHz VCO
pub fn plan(freq_hz: u32) -> Result<MultisynthPlan, RangeError> {
    FrequencySynthesizer::default().plan(freq_hz)
}

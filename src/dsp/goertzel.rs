//! Single-bin Goertzel power estimator.
//!
//! Per sample, with `x` the 16-bit input scaled by 1/32768:
//!
//! ```text
//! s2 = x + coeff·s1 − s0;  s0 = s1;  s1 = s2
//! ```
//!
//! and after the block `power = s1² + s0² − coeff·s1·s0`. No square root is
//! taken, and `coeff` is `cos(ω)` itself: deployed thresholds are calibrated
//! against exactly this quantity.

use core::f32::consts::PI;

/// Divisor mapping an i16 sample onto [-1, 1).
pub const NORMALIZATION: f32 = 32768.0;

/// `cos(2π · target / effective_rate)`, evaluated in f64 from f32 inputs.
pub fn coefficient(target_frequency: f32, effective_sample_rate: f32) -> f32 {
    let ratio = target_frequency / effective_sample_rate;
    libm::cos(2.0 * PI as f64 * ratio as f64) as f32
}

/// Goertzel accumulators for one block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Goertzel {
    coeff: f32,
    s0: f32,
    s1: f32,
}

impl Goertzel {
    pub const fn new(coeff: f32) -> Self {
        Self {
            coeff,
            s0: 0.0,
            s1: 0.0,
        }
    }

    #[inline]
    pub fn coeff(&self) -> f32 {
        self.coeff
    }

    /// Zero the accumulators. Called at the start of every block.
    #[inline]
    pub fn reset(&mut self) {
        self.s0 = 0.0;
        self.s1 = 0.0;
    }

    #[inline]
    pub fn push(&mut self, sample: i16) {
        let x = sample as f32 / NORMALIZATION;
        let s2 = x + self.coeff * self.s1 - self.s0;
        self.s0 = self.s1;
        self.s1 = s2;
    }

    /// Power of the samples pushed since the last reset.
    #[inline]
    pub fn power(&self) -> f32 {
        self.s1 * self.s1 + self.s0 * self.s0 - self.coeff * self.s1 * self.s0
    }

    /// Reset, consume a whole block, and return its power.
    pub fn block_power<I>(&mut self, samples: I) -> f32
    where
        I: IntoIterator<Item = i16>,
    {
        self.reset();
        for s in samples {
            self.push(s);
        }
        self.power()
    }
}

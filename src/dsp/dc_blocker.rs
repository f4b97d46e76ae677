//! DC blocking filter.
//!
//! `y[n] = x[n] - x[n-1] + trunc(0.995 · y[n-1])`, in integer state with an
//! f32 multiply. State persists across blocks for the whole session.

/// Pole of the high-pass. Not configurable.
pub const BLOCKING_FACTOR: f32 = 0.995;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DcBlocker {
    previous_sample: i32,
    previous_output: i32,
}

impl DcBlocker {
    pub const fn new() -> Self {
        Self {
            previous_sample: 0,
            previous_output: 0,
        }
    }

    /// Filter one decimated sample and return the full-width output.
    ///
    /// The scaled feedback term is converted with `as i32`, which rounds
    /// toward zero. Constant input therefore decays to exactly zero from
    /// either sign.
    #[inline]
    pub fn process(&mut self, sample: i32) -> i32 {
        let scaled_previous = (BLOCKING_FACTOR * self.previous_output as f32) as i32;
        let output = sample - self.previous_sample + scaled_previous;

        self.previous_output = output;
        self.previous_sample = sample;
        output
    }

    /// Filter one sample and truncate to the 16-bit value used downstream.
    ///
    /// Truncation keeps the low 16 bits (wraps), it does not clamp.
    #[inline]
    pub fn process_i16(&mut self, sample: i32) -> i16 {
        self.process(sample) as i16
    }

    /// Zero the state. Only at session start.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn previous_sample(&self) -> i32 {
        self.previous_sample
    }

    #[inline]
    pub fn previous_output(&self) -> i32 {
        self.previous_output
    }
}

//! Exponential smoothing of block power and the tone decision.

/// `smoothed = factor·power + (1 − factor)·previous`, decision
/// `smoothed >= threshold`. No hysteresis beyond the smoothing itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerSmoother {
    factor: f32,
    threshold: f32,
    previous_power: f32,
}

impl PowerSmoother {
    /// `factor` in [0, 1]; larger weights the newest block more.
    pub const fn new(factor: f32, threshold: f32) -> Self {
        Self {
            factor,
            threshold,
            previous_power: 0.0,
        }
    }

    /// Fold one block's power in; returns the smoothed power.
    #[inline]
    pub fn update(&mut self, power: f32) -> f32 {
        let smoothed = self.factor * power + (1.0 - self.factor) * self.previous_power;
        self.previous_power = smoothed;
        smoothed
    }

    /// Update and threshold in one step.
    #[inline]
    pub fn decide(&mut self, power: f32) -> (f32, bool) {
        let smoothed = self.update(power);
        (smoothed, smoothed >= self.threshold)
    }

    #[inline]
    pub fn previous_power(&self) -> f32 {
        self.previous_power
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Zero the carried power. Only at session start.
    #[inline]
    pub fn reset(&mut self) {
        self.previous_power = 0.0;
    }
}

//! Named recording sample rates and the ADC settings that produce them.

use super::error::ConfigError;
use super::record::ConfigRecord;

/// ADC timing settings for one nominal output sample rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleRatePreset {
    /// Nominal rate after decimation, Hz.
    pub nominal_rate: u32,
    pub clock_divider: u8,
    pub acquisition_cycles: u8,
    pub oversample_rate: u8,
    pub sample_rate: u32,
    pub sample_rate_divider: u8,
}

const fn preset(nominal_rate: u32, sample_rate: u32, sample_rate_divider: u8) -> SampleRatePreset {
    SampleRatePreset {
        nominal_rate,
        clock_divider: 4,
        acquisition_cycles: 16,
        oversample_rate: 1,
        sample_rate,
        sample_rate_divider,
    }
}

/// Rates offered by the configuration tool.
///
/// The 8, 16 and 32 kHz dividers (48, 24, 12) do not divide a 1024-sample
/// block, so a detector session refuses them.
pub const PRESETS: [SampleRatePreset; 8] = [
    preset(8_000, 384_000, 48),
    preset(16_000, 384_000, 24),
    preset(32_000, 384_000, 12),
    preset(48_000, 384_000, 8),
    preset(96_000, 384_000, 4),
    preset(192_000, 384_000, 2),
    preset(256_000, 256_000, 1),
    preset(384_000, 384_000, 1),
];

/// Look up the preset for a nominal sample rate.
pub fn find_preset(nominal_rate: u32) -> Option<&'static SampleRatePreset> {
    PRESETS.iter().find(|p| p.nominal_rate == nominal_rate)
}

impl ConfigRecord {
    /// Copy of `self` with the ADC timing fields taken from the preset for
    /// `nominal_rate`. Gain, indicator and detection fields are kept.
    pub fn with_preset(&self, nominal_rate: u32) -> Result<Self, ConfigError> {
        let p = find_preset(nominal_rate).ok_or(ConfigError::UnknownPreset)?;
        Ok(Self {
            clock_divider: p.clock_divider,
            acquisition_cycles: p.acquisition_cycles,
            oversample_rate: p.oversample_rate,
            sample_rate: p.sample_rate,
            sample_rate_divider: p.sample_rate_divider,
            ..*self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_hit_nominal_rate() {
        for p in PRESETS.iter() {
            assert_eq!(p.sample_rate / p.sample_rate_divider as u32, p.nominal_rate);
        }
    }

    #[test]
    fn test_with_preset_keeps_detection() {
        let base = ConfigRecord::DEFAULT_DETECTOR;
        let r = base.with_preset(96_000).unwrap();
        assert_eq!(r.sample_rate_divider, 4);
        assert_eq!(r.detection, base.detection);
        assert_eq!(r.gain, base.gain);
    }

    #[test]
    fn test_unknown_preset() {
        assert_eq!(
            ConfigRecord::DEFAULT_DETECTOR.with_preset(44_100),
            Err(ConfigError::UnknownPreset)
        );
    }
}

//! Module: config
//!
//! Purpose: Session configuration for the detector.
//!
//! Architecture:
//! - `record`: packed wire record shared with the configuration transport
//! - `presets`: named sample rates and their ADC timing settings
//! - `packet`: application packets that carry the record and device info
//! - `DetectorConfig`: parameters derived once at session start, immutable
//!   for the rest of the session
//!
//! Safety: Safe. Pure data, no interior mutability.

pub mod error;
pub mod packet;
pub mod presets;
pub mod record;

pub use error::ConfigError;
pub use packet::{
    encode_device_info, handle_set_config, DeviceInfo, MSG_GET_INFO, MSG_SET_CONFIG, PACKET_LEN,
};
pub use presets::{find_preset, SampleRatePreset, PRESETS};
pub use record::{
    ConfigRecord, DetectionFields, Variant, DETECTOR_RECORD_LEN, MAX_GAIN, MAX_OVERSAMPLING,
    STREAMING_RECORD_LEN,
};

use crate::dsp::{decimator, goertzel};

/// Goertzel detection parameters for one session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GoertzelParams {
    pub target_frequency: u32,
    /// `cos(2π · target / effective_sample_rate)`.
    pub coeff: f32,
    pub threshold: f32,
    pub smoothing_factor: f32,
}

/// Parameters derived from a `ConfigRecord` when a session starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorConfig {
    pub variant: Variant,
    /// Raw samples per block.
    pub block_len: usize,
    /// Decimation factor.
    pub sample_rate_divider: usize,
    /// Right shift applied to each decimated sum.
    pub bits_to_shift: u8,
    /// Raw rate divided by the decimation factor, Hz.
    pub effective_sample_rate: f32,
    /// `None` for the streaming variant.
    pub goertzel: Option<GoertzelParams>,
}

impl DetectorConfig {
    /// Validate `record` against a block of `block_len` raw samples and derive
    /// the session parameters.
    pub fn from_record(record: &ConfigRecord, block_len: usize) -> Result<Self, ConfigError> {
        record.validate()?;

        if !block_len.is_power_of_two() {
            return Err(ConfigError::BlockLengthNotPowerOfTwo);
        }
        let divider = record.sample_rate_divider as usize;
        if block_len % divider != 0 {
            return Err(ConfigError::DividerDoesNotDivideBlock);
        }

        let bits_to_shift = decimator::bits_to_shift(record.oversample_rate, record.sample_rate_divider);
        let effective_sample_rate = record.sample_rate as f32 / record.sample_rate_divider as f32;

        // Any target is accepted; cos() folds targets above half the rate
        let goertzel = record.detection.map(|d| GoertzelParams {
            target_frequency: d.target_frequency,
            coeff: goertzel::coefficient(d.target_frequency as f32, effective_sample_rate),
            threshold: d.threshold,
            smoothing_factor: d.smoothing_factor,
        });

        Ok(Self {
            variant: record.variant(),
            block_len,
            sample_rate_divider: divider,
            bits_to_shift,
            effective_sample_rate,
            goertzel,
        })
    }

    /// Decimated samples produced per block.
    #[inline]
    pub fn decimated_len(&self) -> usize {
        self.block_len / self.sample_rate_divider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_detector_derivation() {
        let cfg = DetectorConfig::from_record(&ConfigRecord::DEFAULT_DETECTOR, 1024).unwrap();
        assert_eq!(cfg.variant, Variant::Detector);
        assert_eq!(cfg.bits_to_shift, 0);
        assert_eq!(cfg.effective_sample_rate, 48_000.0);
        assert_eq!(cfg.decimated_len(), 128);

        let g = cfg.goertzel.unwrap();
        assert!((g.coeff - 0.983).abs() < 1e-3, "coeff = {}", g.coeff);
    }

    #[test]
    fn test_streaming_has_no_goertzel() {
        let cfg = DetectorConfig::from_record(&ConfigRecord::DEFAULT_STREAMING, 1024).unwrap();
        assert_eq!(cfg.variant, Variant::Streaming);
        assert!(cfg.goertzel.is_none());
    }

    #[test]
    fn test_block_checks() {
        let r = ConfigRecord::DEFAULT_DETECTOR;
        assert_eq!(
            DetectorConfig::from_record(&r, 1000),
            Err(ConfigError::BlockLengthNotPowerOfTwo)
        );

        let r = r.with_preset(8_000).unwrap();
        assert_eq!(
            DetectorConfig::from_record(&r, 1024),
            Err(ConfigError::DividerDoesNotDivideBlock)
        );
    }

    #[test]
    fn test_high_target_accepted() {
        let mut r = ConfigRecord::DEFAULT_DETECTOR;
        r.detection.as_mut().unwrap().target_frequency = 30_000;
        let cfg = DetectorConfig::from_record(&r, 1024).unwrap();

        // 30 kHz at 48 kHz folds onto 18 kHz
        let folded = goertzel::coefficient(18_000.0, 48_000.0);
        let coeff = cfg.goertzel.unwrap().coeff;
        assert!((coeff - folded).abs() < 1e-5, "coeff = {}", coeff);
    }
}

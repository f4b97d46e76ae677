//! Packed configuration record exchanged with the configuration transport.
//!
//! Layout (no padding, multi-byte fields little-endian):
//!
//! ```text
//! off  len  field
//!   0    1  gain
//!   1    1  clock_divider
//!   2    1  acquisition_cycles
//!   3    1  oversample_rate
//!   4    4  sample_rate           u32
//!   8    1  sample_rate_divider
//!   9    1  enable_indicator      0 / 1
//! ---- Detector variant only ----
//!  10    4  target_frequency      u32
//!  14    4  threshold             f32
//!  18    4  smoothing_factor      f32
//! ```
//!
//! This layout is a compatibility boundary: it must not change.

use super::error::ConfigError;

/// Highest accepted gain setting.
pub const MAX_GAIN: u8 = 4;

/// Upper bound on `oversample_rate * sample_rate_divider`.
pub const MAX_OVERSAMPLING: u32 = 4096;

/// Record length of the pass-through streaming variant.
pub const STREAMING_RECORD_LEN: usize = 10;

/// Record length of the detecting variant.
pub const DETECTOR_RECORD_LEN: usize = 22;

/// Firmware variant, which decides the record layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Decimate, DC-block and run the Goertzel detector; publish decisions.
    Detector,
    /// Decimate and DC-block only; publish the filtered sample stream.
    Streaming,
}

impl Variant {
    #[inline]
    pub const fn record_len(self) -> usize {
        match self {
            Variant::Detector => DETECTOR_RECORD_LEN,
            Variant::Streaming => STREAMING_RECORD_LEN,
        }
    }
}

/// Fields present only in the detecting variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionFields {
    /// Frequency to detect, Hz.
    pub target_frequency: u32,
    /// Decision threshold on smoothed Goertzel power.
    pub threshold: f32,
    /// Weight of the newest block's power, in [0, 1].
    pub smoothing_factor: f32,
}

/// Session configuration record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfigRecord {
    pub gain: u8,
    pub clock_divider: u8,
    pub acquisition_cycles: u8,
    pub oversample_rate: u8,
    /// Raw ADC sample rate, Hz.
    pub sample_rate: u32,
    /// Decimation factor.
    pub sample_rate_divider: u8,
    pub enable_indicator: bool,
    pub detection: Option<DetectionFields>,
}

impl ConfigRecord {
    /// Factory defaults of the detecting firmware.
    pub const DEFAULT_DETECTOR: ConfigRecord = ConfigRecord {
        gain: 2,
        clock_divider: 4,
        acquisition_cycles: 16,
        oversample_rate: 1,
        sample_rate: 384_000,
        sample_rate_divider: 8,
        enable_indicator: true,
        detection: Some(DetectionFields {
            target_frequency: 1400,
            threshold: 1000.0,
            smoothing_factor: 0.99,
        }),
    };

    /// Factory defaults of the streaming firmware.
    pub const DEFAULT_STREAMING: ConfigRecord = ConfigRecord {
        gain: 2,
        clock_divider: 4,
        acquisition_cycles: 16,
        oversample_rate: 1,
        sample_rate: 384_000,
        sample_rate_divider: 8,
        enable_indicator: false,
        detection: None,
    };

    /// Defaults for the given variant.
    pub const fn default_for(variant: Variant) -> Self {
        match variant {
            Variant::Detector => Self::DEFAULT_DETECTOR,
            Variant::Streaming => Self::DEFAULT_STREAMING,
        }
    }

    /// Variant implied by the presence of detection fields.
    #[inline]
    pub fn variant(&self) -> Variant {
        if self.detection.is_some() {
            Variant::Detector
        } else {
            Variant::Streaming
        }
    }

    /// Field range checks. Block-length compatibility is checked when a
    /// session derives its `DetectorConfig`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gain > MAX_GAIN {
            return Err(ConfigError::InvalidGain);
        }
        if self.oversample_rate == 0 {
            return Err(ConfigError::InvalidOversampleRate);
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if self.sample_rate_divider == 0 {
            return Err(ConfigError::InvalidDivider);
        }
        if self.oversampling() > MAX_OVERSAMPLING {
            return Err(ConfigError::OversamplingTooHigh);
        }

        if let Some(d) = &self.detection {
            if d.target_frequency == 0 {
                return Err(ConfigError::InvalidTargetFrequency);
            }
            if !d.threshold.is_finite() {
                return Err(ConfigError::InvalidThreshold);
            }
            if !(0.0..=1.0).contains(&d.smoothing_factor) {
                // NaN fails `contains` too
                return Err(ConfigError::InvalidSmoothingFactor);
            }
        }

        Ok(())
    }

    /// `oversample_rate * sample_rate_divider`.
    #[inline]
    pub fn oversampling(&self) -> u32 {
        self.oversample_rate as u32 * self.sample_rate_divider as u32
    }

    /// Serialize into `out`. Returns bytes written.
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, ConfigError> {
        let len = self.variant().record_len();
        if out.len() < len {
            return Err(ConfigError::OutputTooSmall);
        }

        out[0] = self.gain;
        out[1] = self.clock_divider;
        out[2] = self.acquisition_cycles;
        out[3] = self.oversample_rate;
        out[4..8].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[8] = self.sample_rate_divider;
        out[9] = self.enable_indicator as u8;

        if let Some(d) = &self.detection {
            out[10..14].copy_from_slice(&d.target_frequency.to_le_bytes());
            out[14..18].copy_from_slice(&d.threshold.to_le_bytes());
            out[18..22].copy_from_slice(&d.smoothing_factor.to_le_bytes());
        }

        Ok(len)
    }

    /// Parse and validate a record of the given variant from the start of
    /// `bytes`. Trailing bytes (transport padding) are ignored.
    pub fn decode(bytes: &[u8], variant: Variant) -> Result<Self, ConfigError> {
        if bytes.len() < variant.record_len() {
            return Err(ConfigError::RecordTooShort);
        }

        let enable_indicator = match bytes[9] {
            0 => false,
            1 => true,
            _ => return Err(ConfigError::InvalidFlag),
        };

        let detection = match variant {
            Variant::Detector => Some(DetectionFields {
                target_frequency: read_u32(bytes, 10),
                threshold: f32::from_bits(read_u32(bytes, 14)),
                smoothing_factor: f32::from_bits(read_u32(bytes, 18)),
            }),
            Variant::Streaming => None,
        };

        let record = Self {
            gain: bytes[0],
            clock_divider: bytes[1],
            acquisition_cycles: bytes[2],
            oversample_rate: bytes[3],
            sample_rate: read_u32(bytes, 4),
            sample_rate_divider: bytes[8],
            enable_indicator,
            detection,
        };

        record.validate()?;
        Ok(record)
    }
}

#[inline]
fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

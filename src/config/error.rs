//! Configuration error types

/// Reason a configuration record or packet was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// C01: Record shorter than its variant's layout
    RecordTooShort,
    /// C02: Gain outside 0..=4
    InvalidGain,
    /// C03: Oversample rate is zero
    InvalidOversampleRate,
    /// C04: Sample rate is zero
    InvalidSampleRate,
    /// C05: Sample rate divider is zero
    InvalidDivider,
    /// C06: oversample_rate * sample_rate_divider above MAX_OVERSAMPLING
    OversamplingTooHigh,
    /// C07: Boolean byte other than 0 or 1
    InvalidFlag,
    /// C08: Target frequency is zero
    InvalidTargetFrequency,
    /// C09: Threshold is NaN or infinite
    InvalidThreshold,
    /// C10: Smoothing factor outside [0, 1]
    InvalidSmoothingFactor,
    /// C11: Block length is not a power of two
    BlockLengthNotPowerOfTwo,
    /// C12: Divider does not divide the block length
    DividerDoesNotDivideBlock,
    /// C13: No preset for the requested sample rate
    UnknownPreset,
    /// C14: Packet message type not understood
    UnknownMessageType,
    /// C15: Output buffer too small for the encoding
    OutputTooSmall,
}

impl ConfigError {
    /// Numeric code, stored as fault data.
    pub fn number(&self) -> u32 {
        match self {
            Self::RecordTooShort => 1,
            Self::InvalidGain => 2,
            Self::InvalidOversampleRate => 3,
            Self::InvalidSampleRate => 4,
            Self::InvalidDivider => 5,
            Self::OversamplingTooHigh => 6,
            Self::InvalidFlag => 7,
            Self::InvalidTargetFrequency => 8,
            Self::InvalidThreshold => 9,
            Self::InvalidSmoothingFactor => 10,
            Self::BlockLengthNotPowerOfTwo => 11,
            Self::DividerDoesNotDivideBlock => 12,
            Self::UnknownPreset => 13,
            Self::UnknownMessageType => 14,
            Self::OutputTooSmall => 15,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::RecordTooShort => "C01",
            Self::InvalidGain => "C02",
            Self::InvalidOversampleRate => "C03",
            Self::InvalidSampleRate => "C04",
            Self::InvalidDivider => "C05",
            Self::OversamplingTooHigh => "C06",
            Self::InvalidFlag => "C07",
            Self::InvalidTargetFrequency => "C08",
            Self::InvalidThreshold => "C09",
            Self::InvalidSmoothingFactor => "C10",
            Self::BlockLengthNotPowerOfTwo => "C11",
            Self::DividerDoesNotDivideBlock => "C12",
            Self::UnknownPreset => "C13",
            Self::UnknownMessageType => "C14",
            Self::OutputTooSmall => "C15",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::RecordTooShort => "record too short",
            Self::InvalidGain => "gain out of range",
            Self::InvalidOversampleRate => "oversample rate must be non-zero",
            Self::InvalidSampleRate => "sample rate must be non-zero",
            Self::InvalidDivider => "sample rate divider must be non-zero",
            Self::OversamplingTooHigh => "oversampling product too high",
            Self::InvalidFlag => "flag byte must be 0 or 1",
            Self::InvalidTargetFrequency => "target frequency must be non-zero",
            Self::InvalidThreshold => "threshold must be finite",
            Self::InvalidSmoothingFactor => "smoothing factor must be in [0, 1]",
            Self::BlockLengthNotPowerOfTwo => "block length not a power of two",
            Self::DividerDoesNotDivideBlock => "divider does not divide block length",
            Self::UnknownPreset => "unknown sample rate preset",
            Self::UnknownMessageType => "unknown message type",
            Self::OutputTooSmall => "output buffer too small",
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

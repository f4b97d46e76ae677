//! # AcousticToneDetector
//!
//! Narrow-band tone detector for a microphone sampled by ADC + DMA.
//!
//! ## Architecture
//!
//! One block-ready event per completed DMA transfer drives the whole chain:
//!
//! ```text
//! DoubleBuffer ──▶ Decimator ──▶ DcBlocker ──┬──▶ Goertzel ──▶ PowerSmoother ──▶ decision
//!                                            └──▶ SampleRing (streaming variant)
//! ```
//!
//! - Each block is processed to completion inside the event, no allocation
//! - Configuration is derived once per session and immutable afterwards
//! - Interrupt context talks to the main loop only through atomics:
//!   [`FaultState`], [`LogStream`], [`CancelToken`], [`DecisionCell`]

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod dma;
pub mod dsp;
pub mod fault;
pub mod logging;
pub mod pipeline;
pub mod sample_ring;

pub use config::{ConfigError, ConfigRecord, DetectorConfig, Variant};
pub use dma::{BufferError, BufferId, DoubleBuffer, BLOCK_LEN};
pub use fault::{FaultCode, FaultState};
pub use logging::LogStream;
pub use pipeline::{
    BlockOutcome, BlockSummary, CancelToken, DecisionCell, Detector, PipelineError, PipelineSink,
    PipelineState,
};
pub use sample_ring::SampleRing;

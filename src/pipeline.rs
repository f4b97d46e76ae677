//! Block pipeline controller.
//!
//! Driven by one block-ready event per completed DMA transfer:
//!
//! ```text
//!            start(record)                      cancel / stop / fault
//!   Idle ─────────────────────▶ Running ─────────────────────────────▶ Idle
//!                                  │ ▲
//!                   block ready    │ │  decimate → DC block → Goertzel → smooth
//!                                  └─┘  publish decision (or sample stream)
//! ```
//!
//! # Rules
//!
//! - One call processes exactly one block to completion. No allocation, no
//!   locks, no waiting.
//! - Cancellation is polled before a block is touched, never mid-block.
//! - Filter state lives for the session; Goertzel accumulators for one block.
//! - A bad buffer handoff is fatal: fault latched, session ended, no retry.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::{ConfigError, ConfigRecord, DetectorConfig, Variant};
use crate::dma::{BufferError, BufferId, DoubleBuffer, BLOCK_LEN};
use crate::dsp::{DcBlocker, Decimator, Goertzel, PowerSmoother};
use crate::fault::{FaultCode, FaultState};
use crate::logging::LogStream;
use crate::{isr_debug, isr_error, isr_info};

/// Outputs of the pipeline, called from interrupt context.
pub trait PipelineSink {
    /// Once per processed block (detector variant). `true` = indicator on.
    fn on_decision(&mut self, _tone_present: bool) {}

    /// Once per decimated, DC-blocked sample, in order (streaming variant).
    fn on_filtered_sample(&mut self, _sample: i16) {}
}

/// Discards all outputs.
impl PipelineSink for () {}

/// Latest decision, readable from the main loop.
pub struct DecisionCell {
    tone_present: AtomicBool,
    updates: AtomicU32,
}

impl DecisionCell {
    pub const fn new() -> Self {
        Self {
            tone_present: AtomicBool::new(false),
            updates: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.tone_present.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, tone_present: bool) {
        self.tone_present.store(tone_present, Ordering::Release);
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of decisions published since boot.
    #[inline]
    pub fn updates(&self) -> u32 {
        self.updates.load(Ordering::Relaxed)
    }
}

impl Default for DecisionCell {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineSink for &DecisionCell {
    #[inline]
    fn on_decision(&mut self, tone_present: bool) {
        self.set(tone_present);
    }
}

/// Cooperative cancellation flag, set asynchronously (e.g. by the switch
/// interrupt) and polled at block start.
pub struct CancelToken {
    requested: AtomicBool,
}

impl CancelToken {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    #[inline]
    pub fn clear(&self) {
        self.requested.store(false, Ordering::Release);
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineError {
    /// Session start refused the record.
    Config(ConfigError),
    /// Buffer handoff contract violated.
    Buffer(BufferError),
    /// `start` while a session is active.
    AlreadyRunning,
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Config(e)
    }
}

impl From<BufferError> for PipelineError {
    fn from(e: BufferError) -> Self {
        PipelineError::Buffer(e)
    }
}

impl core::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PipelineError::Config(e) => write!(f, "config rejected: {}", e),
            PipelineError::Buffer(e) => write!(f, "buffer handoff: {}", e),
            PipelineError::AlreadyRunning => write!(f, "session already running"),
        }
    }
}

/// What one block produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockSummary {
    /// Decimated samples produced.
    pub samples: usize,
    /// Last DC-blocked sample of the block.
    pub last_filtered: i16,
    /// Raw Goertzel power (detector variant).
    pub power: Option<f32>,
    /// Power after smoothing (detector variant).
    pub smoothed_power: Option<f32>,
    /// Published decision (detector variant).
    pub decision: Option<bool>,
}

/// Result of a block-ready event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlockOutcome {
    /// No session active; the block was handed back unread.
    Idle,
    /// Cancellation observed; session ended, block handed back unread.
    Cancelled,
    Processed(BlockSummary),
}

/// Detection stage of a session.
#[derive(Clone, Copy, Debug)]
struct Detection {
    goertzel: Goertzel,
    smoother: PowerSmoother,
    last_decision: bool,
}

/// Per-session state. Kept after the session ends so it can be inspected.
#[derive(Clone, Copy, Debug)]
struct Session {
    config: DetectorConfig,
    decimator: Decimator,
    dc: DcBlocker,
    detection: Option<Detection>,
}

impl Session {
    fn new(config: DetectorConfig) -> Self {
        let detection = config.goertzel.map(|g| Detection {
            goertzel: Goertzel::new(g.coeff),
            smoother: PowerSmoother::new(g.smoothing_factor, g.threshold),
            last_decision: false,
        });

        Self {
            config,
            decimator: Decimator::new(config.sample_rate_divider, config.bits_to_shift),
            dc: DcBlocker::new(),
            detection,
        }
    }

    fn process<S: PipelineSink>(&mut self, block: &[i16], sink: &mut S) -> BlockSummary {
        let mut samples = 0;
        let mut last_filtered = 0i16;

        match &mut self.detection {
            Some(det) => {
                det.goertzel.reset();
                for s in self.decimator.decimate(block) {
                    let y = self.dc.process_i16(s);
                    det.goertzel.push(y);
                    last_filtered = y;
                    samples += 1;
                }

                let power = det.goertzel.power();
                let (smoothed, decision) = det.smoother.decide(power);
                sink.on_decision(decision);

                BlockSummary {
                    samples,
                    last_filtered,
                    power: Some(power),
                    smoothed_power: Some(smoothed),
                    decision: Some(decision),
                }
            }
            None => {
                for s in self.decimator.decimate(block) {
                    let y = self.dc.process_i16(s);
                    sink.on_filtered_sample(y);
                    last_filtered = y;
                    samples += 1;
                }

                BlockSummary {
                    samples,
                    last_filtered,
                    power: None,
                    smoothed_power: None,
                    decision: None,
                }
            }
        }
    }
}

/// Block pipeline controller for blocks of `N` raw samples.
pub struct Detector<'a, const N: usize = BLOCK_LEN> {
    log: &'a LogStream,
    fault: &'a FaultState,
    cancel: &'a CancelToken,
    state: PipelineState,
    session: Option<Session>,
    blocks: u32,
}

impl<'a, const N: usize> Detector<'a, N> {
    pub fn new(log: &'a LogStream, fault: &'a FaultState, cancel: &'a CancelToken) -> Self {
        Self {
            log,
            fault,
            cancel,
            state: PipelineState::Idle,
            session: None,
            blocks: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Configuration of the current (or last) session.
    #[inline]
    pub fn config(&self) -> Option<&DetectorConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    /// Blocks processed in the current (or last) session.
    #[inline]
    pub fn blocks_processed(&self) -> u32 {
        self.blocks
    }

    /// DC blocker state of the current (or last) session.
    #[inline]
    pub fn filter_state(&self) -> Option<DcBlocker> {
        self.session.as_ref().map(|s| s.dc)
    }

    /// Smoothed power carried between blocks (detector variant).
    #[inline]
    pub fn previous_power(&self) -> Option<f32> {
        self.session
            .as_ref()
            .and_then(|s| s.detection.as_ref())
            .map(|d| d.smoother.previous_power())
    }

    /// Idle → Running. Derives the session configuration, zeroes filter and
    /// smoother state, and clears any stale cancellation request.
    ///
    /// A refused record latches `FaultCode::ConfigRejected` and the
    /// controller stays idle.
    pub fn start(&mut self, record: &ConfigRecord) -> Result<&DetectorConfig, PipelineError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning);
        }

        let config = match DetectorConfig::from_record(record, N) {
            Ok(c) => c,
            Err(e) => {
                self.fault.set(FaultCode::ConfigRejected, e.number());
                isr_error!(self.log, self.blocks, "config rejected: {}", e);
                return Err(e.into());
            }
        };

        self.cancel.clear();
        self.blocks = 0;
        self.state = PipelineState::Running;

        match config.goertzel {
            Some(g) => isr_info!(
                self.log,
                0,
                "detector start div={} shift={} fs={} f0={} coeff={:.5}",
                config.sample_rate_divider,
                config.bits_to_shift,
                config.effective_sample_rate,
                g.target_frequency,
                g.coeff
            ),
            None => isr_info!(
                self.log,
                0,
                "stream start div={} shift={} fs={}",
                config.sample_rate_divider,
                config.bits_to_shift,
                config.effective_sample_rate
            ),
        }

        let session = self.session.insert(Session::new(config));
        Ok(&session.config)
    }

    /// Running → Idle without a cancellation request.
    pub fn stop(&mut self) {
        if self.state == PipelineState::Running {
            self.state = PipelineState::Idle;
            isr_info!(self.log, self.blocks, "session stopped after {} blocks", self.blocks);
        }
    }

    /// Handle a block-ready event whose identifier comes straight from the
    /// transfer mechanism. Unknown identifiers are fatal.
    pub fn on_block_ready_raw<S: PipelineSink>(
        &mut self,
        raw_id: u8,
        buffers: &mut DoubleBuffer<N>,
        sink: &mut S,
    ) -> Result<BlockOutcome, PipelineError> {
        match BufferId::try_from(raw_id) {
            Ok(id) => self.on_block_ready(id, buffers, sink),
            Err(e) => Err(self.abort(FaultCode::InvalidBufferId, raw_id as u32, e)),
        }
    }

    /// Handle one block-ready event.
    pub fn on_block_ready<S: PipelineSink>(
        &mut self,
        id: BufferId,
        buffers: &mut DoubleBuffer<N>,
        sink: &mut S,
    ) -> Result<BlockOutcome, PipelineError> {
        if self.state != PipelineState::Running {
            buffers.release(id);
            return Ok(BlockOutcome::Idle);
        }

        if self.cancel.is_requested() {
            self.state = PipelineState::Idle;
            buffers.release(id);
            isr_info!(self.log, self.blocks, "cancelled after {} blocks", self.blocks);
            return Ok(BlockOutcome::Cancelled);
        }

        let block = match buffers.acquire_for_processing(id) {
            Ok(b) => b,
            Err(e) => return Err(self.abort(FaultCode::BufferNotReady, id.index() as u32, e)),
        };

        let Some(session) = self.session.as_mut() else {
            // Running always has a session
            self.state = PipelineState::Idle;
            return Ok(BlockOutcome::Idle);
        };

        let previous = session.detection.map(|d| d.last_decision);
        let summary = session.process(block.samples(), sink);
        drop(block);

        if let (Some(det), Some(decision)) = (session.detection.as_mut(), summary.decision) {
            det.last_decision = decision;
            if previous != Some(decision) {
                isr_debug!(
                    self.log,
                    self.blocks,
                    "tone {} power={:.3}",
                    if decision { "on" } else { "off" },
                    summary.smoothed_power.unwrap_or(0.0)
                );
            }
        }

        self.blocks = self.blocks.wrapping_add(1);
        Ok(BlockOutcome::Processed(summary))
    }

    /// Latch a fatal fault and end the session.
    fn abort(&mut self, code: FaultCode, data: u32, e: BufferError) -> PipelineError {
        self.fault.set(code, data);
        self.state = PipelineState::Idle;
        isr_error!(self.log, self.blocks, "fault {:?}: {}", code, e);
        PipelineError::Buffer(e)
    }

    /// Variant of the current (or last) session.
    #[inline]
    pub fn variant(&self) -> Option<Variant> {
        self.config().map(|c| c.variant)
    }
}

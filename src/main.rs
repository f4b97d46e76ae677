//! AcousticToneDetector - Main entry point
//!
//! Runs the block pipeline against a synthetic microphone: a burst of tone
//! near the detector's resonance, then silence, then a cancellation. Block
//! events are raised the way the DMA completion interrupt raises them,
//! alternating between the two buffers.
//!
//! On target, the ADC/DMA driver replaces `SyntheticMic` and calls
//! `Detector::on_block_ready_raw` from its completion callback.

use std::f32::consts::PI;

use acoustic_tone_detector::{
    logging::{format_entry, LogEntry},
    BlockOutcome, BufferId, CancelToken, ConfigRecord, DecisionCell, Detector, DoubleBuffer,
    FaultState, LogStream, BLOCK_LEN,
};

static FAULT_STATE: FaultState = FaultState::new();
static LOG_STREAM: LogStream = LogStream::new();
static CANCEL: CancelToken = CancelToken::new();
static DECISION: DecisionCell = DecisionCell::new();

/// Tone frequency where the default detector responds most strongly.
const TONE_HZ: f32 = 8073.0;
const TONE_AMPLITUDE: f32 = 2500.0;
/// Microphone bias the DC blocker has to remove.
const MIC_BIAS: f32 = 512.0;

const TONE_BLOCKS: u32 = 40;
const SILENT_BLOCKS: u32 = 40;

/// Sine source standing in for the ADC.
struct SyntheticMic {
    sample_rate: f32,
    phase: f32,
}

impl SyntheticMic {
    fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
        }
    }

    fn fill(&mut self, block: &mut [i16], tone: bool) {
        let step = 2.0 * PI * TONE_HZ / self.sample_rate;
        for s in block.iter_mut() {
            let v = if tone {
                MIC_BIAS + TONE_AMPLITUDE * self.phase.sin()
            } else {
                MIC_BIAS
            };
            *s = v as i16;
            self.phase = (self.phase + step) % (2.0 * PI);
        }
    }
}

fn drain_logs() {
    let mut line = [0u8; 128];
    while let Some(entry) = LOG_STREAM.drain() {
        print_entry(&entry, &mut line);
    }
    let dropped = LOG_STREAM.dropped();
    if dropped > 0 {
        println!("[log] {} messages dropped", dropped);
        LOG_STREAM.reset_dropped();
    }
}

fn print_entry(entry: &LogEntry, line: &mut [u8]) {
    let n = format_entry(entry, line);
    print!("{}", String::from_utf8_lossy(&line[..n]));
}

fn main() {
    #[cfg(target_os = "espidf")]
    esp_idf_svc::sys::link_patches();

    println!("{}", env!("VERSION_STRING"));

    let record = ConfigRecord::DEFAULT_DETECTOR;
    let mut detector = Detector::<BLOCK_LEN>::new(&LOG_STREAM, &FAULT_STATE, &CANCEL);

    if let Err(e) = detector.start(&record) {
        drain_logs();
        println!("session not started: {}", e);
        return;
    }
    drain_logs();

    let mut mic = SyntheticMic::new(record.sample_rate as f32);
    let mut buffers = Box::new(DoubleBuffer::<BLOCK_LEN>::new());
    let mut id = BufferId::Primary;
    let mut sink = &DECISION;

    for n in 0..TONE_BLOCKS + SILENT_BLOCKS + 1 {
        if n == TONE_BLOCKS + SILENT_BLOCKS {
            // Switch interrupt
            CANCEL.request();
        }

        match buffers.fill_slot(id) {
            Ok(slot) => mic.fill(slot, n < TONE_BLOCKS),
            Err(e) => {
                println!("dma: {}", e);
                break;
            }
        }
        if let Err(e) = buffers.complete(id) {
            println!("dma: {}", e);
            break;
        }

        match detector.on_block_ready_raw(id as u8, &mut buffers, &mut sink) {
            Ok(BlockOutcome::Processed(summary)) => {
                if n % 10 == 0 {
                    println!(
                        "block {:3}: power={:.3} smoothed={:.3} tone={}",
                        n,
                        summary.power.unwrap_or(0.0),
                        summary.smoothed_power.unwrap_or(0.0),
                        DECISION.get()
                    );
                }
            }
            Ok(BlockOutcome::Cancelled) | Ok(BlockOutcome::Idle) => {
                drain_logs();
                break;
            }
            Err(e) => {
                drain_logs();
                println!("pipeline fault: {} ({:?})", e, FAULT_STATE.snapshot());
                break;
            }
        }

        drain_logs();
        id = id.other();
    }

    println!(
        "{} blocks, {} decisions, state {:?}",
        detector.blocks_processed(),
        DECISION.updates(),
        detector.state()
    );
}

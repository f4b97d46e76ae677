//! Interrupt-safe logging for the detection pipeline.
//!
//! ```text
//! DMA interrupt            LogStream            Main loop
//! ─────────────            ─────────            ─────────
//!
//! isr_info!() ─────────▶ [L0][L1][L2] ───────▶ console / UART
//! non-blocking           lock-free ring         blocking ok
//! ```
//!
//! The interrupt handler is the only producer and the main loop the only
//! consumer. Push never blocks: when the ring is full the message is dropped
//! and counted. Entries are stamped with the session block sequence number,
//! the only clock the pipeline has.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Log ring size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Block sequence number within the session when the entry was written.
    pub block_seq: u32,
    pub level: LogLevel,
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: LogEntry = LogEntry {
        block_seq: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text, or a placeholder if truncation split a UTF-8 sequence.
    pub fn message(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Lock-free SPSC log ring.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: one producer (interrupt context) owns the slot at write_idx until
// it publishes it with a Release store; one consumer owns the slot at
// read_idx until it advances read_idx. The slots never overlap.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push an entry. Returns `false` if the ring was full and the message
    /// was dropped. Messages longer than `MAX_MSG_LEN` are truncated.
    #[inline]
    pub fn push(&self, block_seq: u32, level: LogLevel, msg: &[u8]) -> bool {
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let idx = (write as usize) & Self::MASK;

        // SAFETY: single producer; the consumer does not touch this slot
        // until write_idx is published below.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.block_seq = block_seq;
            entry.level = level;
            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
            entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);
        }

        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Take the oldest entry, if any.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;

        // SAFETY: single consumer; slot was published by the producer.
        let entry = unsafe { (*self.entries.get())[idx] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    #[inline]
    pub fn has_entries(&self) -> bool {
        self.pending() != 0
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-buffer `core::fmt::Write` sink. Output past the end is discarded.
struct BufWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl core::fmt::Write for BufWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_write = bytes.len().min(remaining);
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Format a message into a buffer. Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Render an entry as `[block] LEVEL: message\n` for a console or UART drain.
pub fn format_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    format_to_buffer(
        buf,
        format_args!(
            "[{:8}] {}: {}\n",
            entry.block_seq,
            entry.level.as_str(),
            entry.message()
        ),
    )
}

/// Interrupt-safe log macro.
///
/// ```ignore
/// isr_log!(LogLevel::Info, self.log, self.blocks, "divider={}", divider);
/// ```
#[macro_export]
macro_rules! isr_log {
    ($level:expr, $stream:expr, $block:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($block, $level, &buf[..len]);
    }};
}

#[macro_export]
macro_rules! isr_error {
    ($stream:expr, $block:expr, $($arg:tt)*) => {
        $crate::isr_log!($crate::logging::LogLevel::Error, $stream, $block, $($arg)*)
    };
}

#[macro_export]
macro_rules! isr_warn {
    ($stream:expr, $block:expr, $($arg:tt)*) => {
        $crate::isr_log!($crate::logging::LogLevel::Warn, $stream, $block, $($arg)*)
    };
}

#[macro_export]
macro_rules! isr_info {
    ($stream:expr, $block:expr, $($arg:tt)*) => {
        $crate::isr_log!($crate::logging::LogLevel::Info, $stream, $block, $($arg)*)
    };
}

#[macro_export]
macro_rules! isr_debug {
    ($stream:expr, $block:expr, $($arg:tt)*) => {
        $crate::isr_log!($crate::logging::LogLevel::Debug, $stream, $block, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::<16>::new();

        assert!(stream.push(3, LogLevel::Info, b"session started"));
        assert!(stream.has_entries());
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.block_seq, 3);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message(), "session started");
        assert!(!stream.has_entries());
    }

    #[test]
    fn test_log_stream_full_drops() {
        let stream = LogStream::<4>::new();

        for i in 0..4 {
            assert!(stream.push(i, LogLevel::Debug, b"x"));
        }
        assert!(!stream.push(4, LogLevel::Debug, b"y"));
        assert_eq!(stream.dropped(), 1);

        stream.drain();
        assert!(stream.push(5, LogLevel::Debug, b"z"));

        stream.reset_dropped();
        assert_eq!(stream.dropped(), 0);
    }

    #[test]
    fn test_long_message_truncated() {
        let stream = LogStream::<4>::new();
        let long = [b'a'; MAX_MSG_LEN + 20];
        stream.push(0, LogLevel::Warn, &long);
        let entry = stream.drain().unwrap();
        assert_eq!(entry.len as usize, MAX_MSG_LEN);
    }

    #[test]
    fn test_macro_formats_into_stream() {
        let stream = LogStream::<8>::new();
        crate::isr_warn!(stream, 12, "power={:.1}", 2.5f32);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.message(), "power=2.5");
    }

    #[test]
    fn test_format_entry() {
        let stream = LogStream::<8>::new();
        stream.push(42, LogLevel::Error, b"bad buffer");
        let entry = stream.drain().unwrap();

        let mut buf = [0u8; 64];
        let len = format_entry(&entry, &mut buf);
        assert_eq!(&buf[..len], b"[      42] ERROR: bad buffer\n");
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn test_producer_consumer_threads() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::<64>::new());
        let producer = {
            let stream = Arc::clone(&stream);
            thread::spawn(move || {
                for i in 0..200u32 {
                    while !stream.push(i, LogLevel::Info, b"block") {
                        thread::yield_now();
                    }
                }
            })
        };

        let mut seen = 0u32;
        while seen < 200 {
            if let Some(entry) = stream.drain() {
                assert_eq!(entry.block_seq, seen);
                seen += 1;
            } else {
                thread::yield_now();
            }
        }
        producer.join().unwrap();
    }
}

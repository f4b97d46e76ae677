//! Fault state for the detection pipeline.
//!
//! Every failure the core can observe is a configuration or collaborator
//! contract violation. None of them is retried: the session ends, the fault
//! is latched here, and the main loop decides what the indicator shows.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Fault codes indicating why the pipeline stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// Block-ready event carried an identifier that is neither buffer.
    /// Data: the raw identifier.
    InvalidBufferId = 1,

    /// Block-ready event named a buffer the transfer mechanism never
    /// handed over. Data: the buffer index.
    BufferNotReady = 2,

    /// Session start refused the configuration record.
    /// Data: numeric configuration error code.
    ConfigRejected = 3,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::InvalidBufferId,
            2 => FaultCode::BufferNotReady,
            3 => FaultCode::ConfigRejected,
            _ => FaultCode::None,
        }
    }
}

/// Latched fault shared between interrupt context and the main loop.
///
/// ```ignore
/// static FAULT: FaultState = FaultState::new();
///
/// // In the DMA interrupt:
/// if let Err(e) = detector.on_block_ready_raw(raw_id, &mut buffers, &mut sink) {
///     // detector has already latched FAULT and gone idle
/// }
///
/// // In main loop:
/// if FAULT.is_active() {
///     indicator_off();
/// }
/// ```
pub struct FaultState {
    active: AtomicBool,
    code: AtomicU8,
    /// Meaning depends on `code`.
    data: AtomicU32,
    /// Total fault count since boot (never cleared).
    count: AtomicU32,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Latch a fault. Code and data are published before the active flag.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Only meaningful while `is_active()`.
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Clear the active flag. The counter is kept for diagnostics.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_latch_and_clear() {
        let fault = FaultState::new();
        assert!(!fault.is_active());
        assert_eq!(fault.code(), FaultCode::None);

        fault.set(FaultCode::InvalidBufferId, 7);

        let snap = fault.snapshot();
        assert!(snap.active);
        assert_eq!(snap.code, FaultCode::InvalidBufferId);
        assert_eq!(snap.data, 7);
        assert_eq!(snap.count, 1);

        fault.clear();
        assert!(!fault.is_active());
        assert_eq!(fault.count(), 1);
    }

    #[test]
    fn test_fault_code_from_u8_unknown() {
        assert_eq!(FaultCode::from_u8(3), FaultCode::ConfigRejected);
        assert_eq!(FaultCode::from_u8(200), FaultCode::None);
    }
}

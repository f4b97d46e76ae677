//! Lock-free ring of filtered samples for the streaming transport.
//!
//! SPSC: the DMA interrupt pushes DC-blocked samples, the transport task
//! drains them into packets. A full ring drops the new sample and counts it;
//! already queued samples are never overwritten under the reader.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::pipeline::PipelineSink;

/// Default capacity: two blocks at the default 8x decimation.
pub const DEFAULT_RING_SIZE: usize = 256;

pub struct SampleRing<const N: usize = DEFAULT_RING_SIZE> {
    buffer: UnsafeCell<[i16; N]>,
    write_idx: AtomicUsize,
    read_idx: AtomicUsize,
    dropped: AtomicU32,
}

// SAFETY: single producer writes only the slot at write_idx before
// publishing it; single consumer reads only slots below write_idx and
// frees them by advancing read_idx.
unsafe impl<const N: usize> Sync for SampleRing<N> {}
unsafe impl<const N: usize> Send for SampleRing<N> {}

impl<const N: usize> SampleRing<N> {
    pub const fn new() -> Self {
        const { assert!(N.is_power_of_two(), "Ring size must be power of 2") };

        Self {
            buffer: UnsafeCell::new([0i16; N]),
            write_idx: AtomicUsize::new(0),
            read_idx: AtomicUsize::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Producer side. Returns `false` if the ring was full.
    #[inline]
    pub fn push(&self, sample: i16) -> bool {
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // SAFETY: slot at `write` is not visible to the consumer yet
        unsafe {
            (*self.buffer.get())[write & (N - 1)] = sample;
        }
        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Consumer side.
    #[inline]
    pub fn pop(&self) -> Option<i16> {
        let write = self.write_idx.load(Ordering::Acquire);
        let read = self.read_idx.load(Ordering::Relaxed);

        if write == read {
            return None;
        }

        // SAFETY: slot was published by the producer and is not rewritten
        // until read_idx moves past it
        let sample = unsafe { (*self.buffer.get())[read & (N - 1)] };
        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(sample)
    }

    /// Fill `output` from the ring, zero-padding on underrun. Returns the
    /// number of real samples copied.
    #[inline]
    pub fn read_into(&self, output: &mut [i16]) -> usize {
        let mut count = 0;

        for slot in output.iter_mut() {
            match self.pop() {
                Some(s) => {
                    *slot = s;
                    count += 1;
                }
                None => *slot = 0,
            }
        }

        count
    }

    #[inline]
    pub fn len(&self) -> usize {
        let write = self.write_idx.load(Ordering::Acquire);
        let read = self.read_idx.load(Ordering::Acquire);
        write.wrapping_sub(read).min(N)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn available(&self) -> usize {
        N - self.len()
    }

    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Consumer side: discard everything queued.
    #[inline]
    pub fn clear(&self) {
        let write = self.write_idx.load(Ordering::Acquire);
        self.read_idx.store(write, Ordering::Release);
    }
}

impl<const N: usize> Default for SampleRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PipelineSink for &SampleRing<N> {
    #[inline]
    fn on_filtered_sample(&mut self, sample: i16) {
        self.push(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_ring_drops_newest() {
        let ring = SampleRing::<4>::new();
        for s in 1..=4 {
            assert!(ring.push(s));
        }
        assert!(!ring.push(5));
        assert_eq!(ring.dropped(), 1);

        assert_eq!(ring.pop(), Some(1));
        assert!(ring.push(6));
        let mut out = [0i16; 4];
        assert_eq!(ring.read_into(&mut out), 4);
        assert_eq!(out, [2, 3, 4, 6]);
    }

    #[test]
    fn test_sink_pushes_samples() {
        let ring = SampleRing::<8>::new();
        let mut sink = &ring;
        sink.on_filtered_sample(-7);
        sink.on_decision(true);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.pop(), Some(-7));
        assert!(ring.is_empty());
    }

    #[test]
    fn test_clear_frees_space() {
        let ring = SampleRing::<8>::new();
        for s in 0..5 {
            ring.push(s);
        }
        assert_eq!(ring.available(), 3);

        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.available(), 8);
        assert_eq!(ring.pop(), None);
    }
}

//! Ping-pong sample buffers shared with the DMA transfer mechanism.
//!
//! Each slot is owned by exactly one side at a time:
//!
//! ```text
//!            fill_slot()                 acquire_for_processing()
//! Hardware ──────────────▶ complete() ──▶ Ready ──────────────▶ Pipeline
//!    ▲                                                              │
//!    └──────────────────────── release() / guard drop ◀─────────────┘
//! ```
//!
//! The pipeline only sees a slot through a [`BlockGuard`], which borrows the
//! pair mutably, so the hardware side cannot be handed the same slot while a
//! block is being processed.

use core::ops::Deref;

/// Raw samples per DMA transfer.
pub const BLOCK_LEN: usize = 1024;

/// Identifier carried by the block-ready event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BufferId {
    Primary = 0,
    Secondary = 1,
}

impl BufferId {
    /// Map the collaborator's raw identifier; anything but 0 or 1 is invalid.
    #[inline]
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Primary),
            1 => Some(Self::Secondary),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The other slot of the pair.
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }
}

impl TryFrom<u8> for BufferId {
    type Error = BufferError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::from_raw(raw).ok_or(BufferError::InvalidId(raw))
    }
}

/// Current owner of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotOwner {
    /// Being filled (or queued to be filled) by the transfer mechanism.
    Hardware,
    /// Transfer complete, waiting for the pipeline.
    Ready,
    /// Being read by the pipeline.
    Pipeline,
}

/// Buffer handoff contract violations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// Identifier is neither buffer.
    InvalidId(u8),
    /// Pipeline asked for a slot the transfer has not completed.
    NotReady(BufferId),
    /// Hardware side touched a slot it does not own.
    NotOwnedByHardware(BufferId),
}

impl BufferError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "B01",
            Self::NotReady(_) => "B02",
            Self::NotOwnedByHardware(_) => "B03",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "invalid buffer identifier",
            Self::NotReady(_) => "buffer not ready",
            Self::NotOwnedByHardware(_) => "buffer not owned by hardware",
        }
    }
}

impl core::fmt::Display for BufferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidId(raw) => write!(f, "{}: {} ({})", self.code(), self.message(), raw),
            Self::NotReady(id) | Self::NotOwnedByHardware(id) => {
                write!(f, "{}: {} ({:?})", self.code(), self.message(), id)
            }
        }
    }
}

/// Two fixed-size sample blocks with explicit ownership.
pub struct DoubleBuffer<const N: usize = BLOCK_LEN> {
    slots: [[i16; N]; 2],
    owner: [SlotOwner; 2],
}

impl<const N: usize> DoubleBuffer<N> {
    pub const fn new() -> Self {
        const { assert!(N.is_power_of_two(), "Block length must be power of 2") };

        Self {
            slots: [[0; N]; 2],
            owner: [SlotOwner::Hardware; 2],
        }
    }

    #[inline]
    pub const fn block_len(&self) -> usize {
        N
    }

    #[inline]
    pub fn owner(&self, id: BufferId) -> SlotOwner {
        self.owner[id.index()]
    }

    /// Hardware side: the slot to write into.
    pub fn fill_slot(&mut self, id: BufferId) -> Result<&mut [i16; N], BufferError> {
        if self.owner[id.index()] != SlotOwner::Hardware {
            return Err(BufferError::NotOwnedByHardware(id));
        }
        Ok(&mut self.slots[id.index()])
    }

    /// Hardware side: transfer into `id` finished, hand it to the pipeline.
    pub fn complete(&mut self, id: BufferId) -> Result<(), BufferError> {
        if self.owner[id.index()] != SlotOwner::Hardware {
            return Err(BufferError::NotOwnedByHardware(id));
        }
        self.owner[id.index()] = SlotOwner::Ready;
        Ok(())
    }

    /// Pipeline side: borrow a completed block. The slot returns to the
    /// hardware when the guard is dropped.
    pub fn acquire_for_processing(&mut self, id: BufferId) -> Result<BlockGuard<'_, N>, BufferError> {
        if self.owner[id.index()] != SlotOwner::Ready {
            return Err(BufferError::NotReady(id));
        }
        self.owner[id.index()] = SlotOwner::Pipeline;
        Ok(BlockGuard { buffer: self, id })
    }

    /// Return a slot to the hardware without processing it.
    #[inline]
    pub fn release(&mut self, id: BufferId) {
        self.owner[id.index()] = SlotOwner::Hardware;
    }

    /// Both slots back to the hardware. Contents are left as they are.
    pub fn reset(&mut self) {
        self.owner = [SlotOwner::Hardware; 2];
    }
}

impl<const N: usize> Default for DoubleBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive read access to one completed block.
pub struct BlockGuard<'b, const N: usize> {
    buffer: &'b mut DoubleBuffer<N>,
    id: BufferId,
}

impl<const N: usize> BlockGuard<'_, N> {
    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    #[inline]
    pub fn samples(&self) -> &[i16; N] {
        &self.buffer.slots[self.id.index()]
    }

    /// Explicit release; same as dropping the guard.
    #[inline]
    pub fn release(self) {}
}

impl<const N: usize> Deref for BlockGuard<'_, N> {
    type Target = [i16; N];

    fn deref(&self) -> &Self::Target {
        self.samples()
    }
}

impl<const N: usize> Drop for BlockGuard<'_, N> {
    fn drop(&mut self) {
        self.buffer.release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_id_from_raw() {
        assert_eq!(BufferId::from_raw(0), Some(BufferId::Primary));
        assert_eq!(BufferId::from_raw(1), Some(BufferId::Secondary));
        assert_eq!(BufferId::from_raw(2), None);
        assert_eq!(BufferId::try_from(9u8), Err(BufferError::InvalidId(9)));
        assert_eq!(BufferId::Primary.other(), BufferId::Secondary);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let mut buf = DoubleBuffer::<8>::new();
        buf.fill_slot(BufferId::Primary).unwrap()[0] = 42;
        buf.complete(BufferId::Primary).unwrap();

        {
            let guard = buf.acquire_for_processing(BufferId::Primary).unwrap();
            assert_eq!(guard[0], 42);
            assert_eq!(guard.id(), BufferId::Primary);
        }

        assert_eq!(buf.owner(BufferId::Primary), SlotOwner::Hardware);
    }

    #[test]
    fn test_acquire_requires_ready() {
        let mut buf = DoubleBuffer::<8>::new();
        assert_eq!(
            buf.acquire_for_processing(BufferId::Secondary).err(),
            Some(BufferError::NotReady(BufferId::Secondary))
        );
    }
}

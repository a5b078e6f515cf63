//! Transfer buffers and flush completion tracking

use portable_atomic::{AtomicBool, AtomicU8, Ordering};

use crate::error::Error;

/// Caller-supplied transfer buffers
pub enum Buffers<'a> {
    /// Render and flush from one buffer, waiting for every transfer
    Single(&'a mut [u8]),
    /// Render into one buffer while the other is being transferred
    Double(&'a mut [u8], &'a mut [u8]),
}

/// Transfer state of one buffer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    Idle,
    Busy,
}

/// Flush completion signal shared with the transfer-complete interrupt
///
/// Usually placed in a `static` so the interrupt handler can reach it:
///
/// ```
/// use tessera_core::screen::FlushSignal;
///
/// static FLUSH: FlushSignal = FlushSignal::new();
///
/// // In the DMA-complete interrupt
/// FLUSH.complete();
/// ```
#[derive(Debug)]
pub struct FlushSignal {
    busy: [AtomicBool; 2],
    /// Slot handed to the flush target most recently
    last: AtomicU8,
}

impl Default for FlushSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl FlushSignal {
    pub const fn new() -> Self {
        Self {
            busy: [AtomicBool::new(false), AtomicBool::new(false)],
            last: AtomicU8::new(0),
        }
    }

    /// Mark the most recently flushed buffer as idle
    pub fn complete(&self) {
        let slot = self.last.load(Ordering::Acquire) as usize & 1;
        self.busy[slot].store(false, Ordering::Release);
    }

    /// Current state of a buffer slot
    pub fn state(&self, slot: usize) -> SlotState {
        if self.is_busy(slot) {
            SlotState::Busy
        } else {
            SlotState::Idle
        }
    }

    pub(crate) fn is_busy(&self, slot: usize) -> bool {
        self.busy[slot & 1].load(Ordering::Acquire)
    }

    /// Mark `slot` busy before its transfer starts
    pub(crate) fn begin(&self, slot: usize) {
        let slot = slot & 1;
        self.busy[slot].store(true, Ordering::Release);
        self.last.store(slot as u8, Ordering::Release);
    }
}

/// Buffer arena indexed by slot
pub(crate) struct BufferSlots<'a> {
    slots: heapless::Vec<&'a mut [u8], 2>,
    /// Usable bytes in every slot
    capacity: usize,
    /// Slot the next chunk is rendered into
    write: usize,
}

impl<'a> BufferSlots<'a> {
    /// Take over the buffers, limiting each to `size` bytes (0 = no limit)
    pub(crate) fn new(buffers: Buffers<'a>, size: usize) -> Result<Self, Error> {
        let mut slots = heapless::Vec::new();
        match buffers {
            Buffers::Single(buffer) => {
                let _ = slots.push(buffer);
            }
            Buffers::Double(first, second) => {
                let _ = slots.push(first);
                let _ = slots.push(second);
            }
        }

        let smallest = slots.iter().map(|s| s.len()).min().unwrap_or(0);
        let capacity = match size {
            0 => smallest,
            size if size <= smallest => size,
            _ => return Err(Error::OutOfMemory),
        };
        if capacity == 0 {
            return Err(Error::OutOfMemory);
        }

        Ok(Self {
            slots,
            capacity,
            write: 0,
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn is_double(&self) -> bool {
        self.slots.len() == 2
    }

    pub(crate) fn write_index(&self) -> usize {
        self.write
    }

    pub(crate) fn other_index(&self) -> usize {
        (self.write + 1) % self.slots.len()
    }

    /// Switch rendering to the other slot
    pub(crate) fn swap(&mut self) {
        self.write = self.other_index();
    }

    pub(crate) fn get(&self, slot: usize) -> &[u8] {
        &self.slots[slot][..self.capacity]
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> &mut [u8] {
        &mut self.slots[slot][..self.capacity]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_completes_last_flushed_slot() {
        let signal = FlushSignal::new();
        signal.begin(1);
        assert_eq!(signal.state(1), SlotState::Busy);
        assert_eq!(signal.state(0), SlotState::Idle);
        signal.complete();
        assert_eq!(signal.state(1), SlotState::Idle);
    }

    #[test]
    fn test_slots_swap_only_when_double() {
        let mut a = [0u8; 8];
        let mut b = [0u8; 8];
        let mut double = BufferSlots::new(Buffers::Double(&mut a, &mut b), 0).unwrap();
        assert_eq!(double.other_index(), 1);
        double.swap();
        assert_eq!(double.write_index(), 1);

        let mut c = [0u8; 8];
        let mut single = BufferSlots::new(Buffers::Single(&mut c), 0).unwrap();
        single.swap();
        assert_eq!(single.write_index(), 0);
    }

    #[test]
    fn test_capacity_limits() {
        let mut a = [0u8; 16];
        let mut b = [0u8; 8];
        let slots = BufferSlots::new(Buffers::Double(&mut a, &mut b), 0).unwrap();
        assert_eq!(slots.capacity(), 8);
        assert_eq!(slots.get(0).len(), 8);

        let mut c = [0u8; 16];
        assert_eq!(
            BufferSlots::new(Buffers::Single(&mut c), 32).err(),
            Some(Error::OutOfMemory)
        );
        let mut d = [0u8; 0];
        assert_eq!(
            BufferSlots::new(Buffers::Single(&mut d), 0).err(),
            Some(Error::OutOfMemory)
        );
    }
}

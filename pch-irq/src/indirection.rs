//! # Indirection Table
//!
//! Maps a line to one bit of the cross-core notification word. Lines
//! without a slot are always handled on the delivering core.
//!
//! ```text
//!   line ──► slot ──► notification bit (NOTIFY_BIT_BASE + slot)
//!   bit  ──► slot ──► line            (receive path on the target core)
//! ```
//!
//! Mutation is serialized by the table's lock. Lookups from the dispatch
//! path do not take the lock, so a line can be mid-dispatch while its slot
//! is released; the notified core then finds no line for the bit and drops
//! the notification.

use core::fmt;
use core::sync::atomic::{AtomicU16, AtomicU8, Ordering};

use spin::Mutex;
use static_assertions::const_assert;

use crate::line::{IrqLine, NR_LINES};

// ============================================================================
// Constants
// ============================================================================

/// Number of indirection slots
pub const NOTIFY_SLOTS: usize = 24;

/// Notification bit carried by slot 0; lower bits belong to the SMP layer
pub const NOTIFY_BIT_BASE: u32 = 8;

const_assert!(NOTIFY_BIT_BASE as usize + NOTIFY_SLOTS <= u32::BITS as usize);

const UNASSIGNED: u8 = u8::MAX;
const NO_LINE: u16 = u16::MAX;

// ============================================================================
// Slot
// ============================================================================

/// Indirection slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct IndirectionSlot(u8);

impl IndirectionSlot {
    /// Slot from an index
    #[inline]
    pub const fn new(index: usize) -> Option<Self> {
        if index < NOTIFY_SLOTS {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Slot index
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Notification bit position for this slot
    #[inline]
    pub const fn bit(self) -> u32 {
        NOTIFY_BIT_BASE + self.0 as u32
    }

    /// Slot carried by a notification bit
    #[inline]
    pub const fn from_bit(bit: u32) -> Option<Self> {
        if bit < NOTIFY_BIT_BASE {
            return None;
        }
        Self::new((bit - NOTIFY_BIT_BASE) as usize)
    }
}

// ============================================================================
// Table
// ============================================================================

/// Fixed pool of indirection slots
pub struct IndirectionTable {
    line_to_slot: [AtomicU8; NR_LINES],
    slot_to_line: [AtomicU16; NOTIFY_SLOTS],
    lock: Mutex<()>,
}

impl IndirectionTable {
    /// Create a table with every line unassigned
    pub const fn new() -> Self {
        Self {
            line_to_slot: [const { AtomicU8::new(UNASSIGNED) }; NR_LINES],
            slot_to_line: [const { AtomicU16::new(NO_LINE) }; NOTIFY_SLOTS],
            lock: Mutex::new(()),
        }
    }

    /// Slot assigned to `line`, if any
    #[inline]
    pub fn lookup(&self, line: IrqLine) -> Option<IndirectionSlot> {
        let slot = self.line_to_slot.get(line.index())?.load(Ordering::Acquire);
        if slot == UNASSIGNED {
            None
        } else {
            Some(IndirectionSlot(slot))
        }
    }

    /// Line owning `slot`, if any
    #[inline]
    pub fn line_of(&self, slot: IndirectionSlot) -> Option<IrqLine> {
        let line = self.slot_to_line[slot.index()].load(Ordering::Acquire);
        if line == NO_LINE {
            None
        } else {
            Some(IrqLine::from_raw(line))
        }
    }

    /// Assign the lowest free slot to `line`
    ///
    /// Returns the existing slot if the line already has one, or `None` if
    /// the line is out of range or the pool is full.
    pub fn assign(&self, line: IrqLine) -> Option<IndirectionSlot> {
        let entry = self.line_to_slot.get(line.index())?;
        let _guard = self.lock.lock();

        if let Some(slot) = self.lookup(line) {
            return Some(slot);
        }

        let Some(index) = self
            .slot_to_line
            .iter()
            .position(|owner| owner.load(Ordering::Relaxed) == NO_LINE)
        else {
            log::warn!("PCH: no free notification slot for IRQ{}, handling locally", line);
            return None;
        };

        // Publish the reverse map first so a notified core can resolve the bit.
        self.slot_to_line[index].store(line.raw(), Ordering::Release);
        entry.store(index as u8, Ordering::Release);

        log::debug!("PCH: IRQ{} assigned notification slot {}", line, index);
        Some(IndirectionSlot(index as u8))
    }

    /// Release the slot held by `line`
    pub fn release(&self, line: IrqLine) -> Option<IndirectionSlot> {
        let entry = self.line_to_slot.get(line.index())?;
        let _guard = self.lock.lock();

        let slot = self.lookup(line)?;
        entry.store(UNASSIGNED, Ordering::Release);
        self.slot_to_line[slot.index()].store(NO_LINE, Ordering::Release);

        log::debug!("PCH: IRQ{} released notification slot {}", line, slot.index());
        Some(slot)
    }

    /// Unassign every line
    pub fn reset(&self) {
        let _guard = self.lock.lock();
        for entry in &self.line_to_slot {
            entry.store(UNASSIGNED, Ordering::Release);
        }
        for owner in &self.slot_to_line {
            owner.store(NO_LINE, Ordering::Release);
        }
    }

    /// Number of assigned slots
    pub fn assigned(&self) -> usize {
        self.slot_to_line
            .iter()
            .filter(|owner| owner.load(Ordering::Relaxed) != NO_LINE)
            .count()
    }
}

impl fmt::Debug for IndirectionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndirectionTable")
            .field("assigned", &self.assigned())
            .field("capacity", &NOTIFY_SLOTS)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_lowest_free_slot() {
        let table = IndirectionTable::new();
        let a = IrqLine::from_raw(80);
        let b = IrqLine::from_raw(84);

        assert_eq!(table.assign(a), IndirectionSlot::new(0));
        assert_eq!(table.assign(b), IndirectionSlot::new(1));
        assert_eq!(table.assign(a), IndirectionSlot::new(0));
        assert_eq!(table.assigned(), 2);

        table.release(a);
        assert_eq!(table.lookup(a), None);
        let c = IrqLine::from_raw(20);
        assert_eq!(table.assign(c), IndirectionSlot::new(0));
    }

    #[test]
    fn test_reverse_map() {
        let table = IndirectionTable::new();
        let line = IrqLine::from_raw(81);
        let slot = table.assign(line).expect("slot");
        assert_eq!(IndirectionSlot::from_bit(slot.bit()), Some(slot));
        assert_eq!(table.line_of(slot), Some(line));

        table.release(line);
        assert_eq!(table.line_of(slot), None);
    }

    #[test]
    fn test_pool_exhaustion_leaves_line_unassigned() {
        let table = IndirectionTable::new();
        for n in 0..NOTIFY_SLOTS {
            assert!(table.assign(IrqLine::from_raw(100 + n as u16)).is_some());
        }
        let extra = IrqLine::from_raw(200);
        assert_eq!(table.assign(extra), None);
        assert_eq!(table.lookup(extra), None);
    }

    #[test]
    fn test_release_unassigned_is_noop() {
        let table = IndirectionTable::new();
        assert_eq!(table.release(IrqLine::from_raw(90)), None);
        assert_eq!(table.release(IrqLine::from_raw(4000)), None);
    }

    #[test]
    fn test_bits_below_base_are_not_slots() {
        assert_eq!(IndirectionSlot::from_bit(0), None);
        assert_eq!(IndirectionSlot::from_bit(NOTIFY_BIT_BASE - 1), None);
        assert_eq!(
            IndirectionSlot::from_bit(NOTIFY_BIT_BASE + NOTIFY_SLOTS as u32),
            None
        );
    }

    #[test]
    fn test_reset() {
        let table = IndirectionTable::new();
        table.assign(IrqLine::from_raw(70));
        table.reset();
        assert_eq!(table.assigned(), 0);
    }
}

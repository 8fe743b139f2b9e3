//! # Dispatch Statistics

use core::sync::atomic::{AtomicU64, Ordering};

/// Dispatch counters
#[derive(Debug)]
pub struct IrqStats {
    local: AtomicU64,
    forwarded: AtomicU64,
    spurious: AtomicU64,
    empty_affinity: AtomicU64,
}

/// Point-in-time copy of [`IrqStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IrqStatsSnapshot {
    /// Lines handled on the delivering core
    pub local: u64,
    /// Lines forwarded to another core
    pub forwarded: u64,
    /// Reserved vectors reported as spurious
    pub spurious: u64,
    /// Local fallbacks because no active core was eligible
    pub empty_affinity: u64,
}

impl IrqStats {
    /// Zeroed counters
    pub const fn new() -> Self {
        Self {
            local: AtomicU64::new(0),
            forwarded: AtomicU64::new(0),
            spurious: AtomicU64::new(0),
            empty_affinity: AtomicU64::new(0),
        }
    }

    pub(crate) fn count_local(&self) {
        self.local.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_spurious(&self) {
        self.spurious.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_empty_affinity(&self) {
        self.empty_affinity.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters
    pub fn snapshot(&self) -> IrqStatsSnapshot {
        IrqStatsSnapshot {
            local: self.local.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            spurious: self.spurious.load(Ordering::Relaxed),
            empty_affinity: self.empty_affinity.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [&self.local, &self.forwarded, &self.spurious, &self.empty_affinity] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

//! # Affinity Router
//!
//! Round-robin core selection over a line's effective affinity (its
//! affinity intersected with the active cores).
//!
//! Each line keeps a cursor holding the core it was last sent to. Only the
//! dispatching context writes a cursor, and the hardware delivers an
//! assertion to exactly one core at a time, so cursors are plain relaxed
//! atomics without a lock.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::cpumask::{CpuMask, MAX_CPUS};
use crate::line::{IrqLine, NR_LINES};

const NO_CORE: u8 = u8::MAX;

/// Per-line round-robin core selection
pub struct AffinityRouter {
    cursors: [AtomicU8; NR_LINES],
}

impl AffinityRouter {
    /// Create a router with every cursor before the first core
    pub const fn new() -> Self {
        Self {
            cursors: [const { AtomicU8::new(NO_CORE) }; NR_LINES],
        }
    }

    /// Core `line` was last routed to
    pub fn cursor(&self, line: IrqLine) -> Option<usize> {
        let core = self.cursors.get(line.index())?.load(Ordering::Relaxed);
        if core == NO_CORE {
            None
        } else {
            Some(core as usize)
        }
    }

    /// Place the cursor of `line`; `None` restarts from the first core
    pub fn set_cursor(&self, line: IrqLine, core: Option<usize>) {
        if let Some(cursor) = self.cursors.get(line.index()) {
            let raw = match core {
                Some(c) if c < MAX_CPUS => c as u8,
                _ => NO_CORE,
            };
            cursor.store(raw, Ordering::Relaxed);
        }
    }

    /// Pick the next core for `line`
    ///
    /// Advances the cursor to the first core of `affinity & active` strictly
    /// after the previous cursor, wrapping to the first eligible core. Returns
    /// `None`, leaving the cursor untouched, when no active core is eligible.
    pub fn select(&self, line: IrqLine, affinity: CpuMask, active: CpuMask) -> Option<usize> {
        let eligible = affinity & active;
        let cursor = self.cursors.get(line.index())?;

        let previous = match cursor.load(Ordering::Relaxed) {
            NO_CORE => None,
            core => Some(core as usize),
        };
        let core = eligible.next(previous).or_else(|| eligible.first())?;

        cursor.store(core as u8, Ordering::Relaxed);
        Some(core)
    }

    /// Reset every cursor
    pub fn reset(&self) {
        for cursor in &self.cursors {
            cursor.store(NO_CORE, Ordering::Relaxed);
        }
    }
}

impl fmt::Debug for AffinityRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffinityRouter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: IrqLine = IrqLine::from_raw(80);

    #[test]
    fn test_round_robin_cycles_in_order() {
        let router = AffinityRouter::new();
        let cores = CpuMask::from_cpus(&[0, 1, 2]);

        let picks: Vec<_> = (0..10)
            .map(|_| router.select(LINE, cores, cores).expect("core"))
            .collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_skips_inactive_cores() {
        let router = AffinityRouter::new();
        let affinity = CpuMask::from_cpus(&[1, 2, 3]);
        let active = CpuMask::from_cpus(&[0, 1, 3]);

        assert_eq!(router.select(LINE, affinity, active), Some(1));
        assert_eq!(router.select(LINE, affinity, active), Some(3));
        assert_eq!(router.select(LINE, affinity, active), Some(1));
    }

    #[test]
    fn test_empty_intersection_keeps_cursor() {
        let router = AffinityRouter::new();
        router.set_cursor(LINE, Some(2));

        let picked = router.select(LINE, CpuMask::single(5), CpuMask::from_cpus(&[0, 1]));
        assert_eq!(picked, None);
        assert_eq!(router.cursor(LINE), Some(2));
    }

    #[test]
    fn test_explicit_cursor_start() {
        let router = AffinityRouter::new();
        let cores = CpuMask::from_cpus(&[0, 1]);

        router.set_cursor(LINE, Some(1));
        assert_eq!(router.select(LINE, cores, cores), Some(0));

        router.set_cursor(LINE, None);
        assert_eq!(router.select(LINE, cores, cores), Some(0));
        assert_eq!(router.cursor(LINE), Some(0));
    }

    #[test]
    fn test_lines_have_independent_cursors() {
        let router = AffinityRouter::new();
        let other = IrqLine::from_raw(81);
        let cores = CpuMask::from_cpus(&[0, 1]);

        assert_eq!(router.select(LINE, cores, cores), Some(0));
        assert_eq!(router.select(LINE, cores, cores), Some(1));
        assert_eq!(router.select(other, cores, cores), Some(0));
    }
}

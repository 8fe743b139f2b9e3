//! # CPU Masks
//!
//! Fixed-width core sets used for affinity and the active-core set.

use core::fmt;
use core::ops::{BitAnd, BitOr};

/// Maximum number of cores
pub const MAX_CPUS: usize = 64;

/// Set of core identifiers
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct CpuMask(u64);

impl CpuMask {
    /// Empty mask (no cores)
    pub const fn empty() -> Self {
        Self(0)
    }

    /// All cores
    pub const fn all() -> Self {
        Self(u64::MAX)
    }

    /// Create from a raw bit pattern
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Single core
    pub const fn single(cpu: usize) -> Self {
        if cpu < MAX_CPUS {
            Self(1 << cpu)
        } else {
            Self(0)
        }
    }

    /// Build a mask from a list of cores
    pub fn from_cpus(cpus: &[usize]) -> Self {
        let mut mask = Self::empty();
        for &cpu in cpus {
            mask.set(cpu);
        }
        mask
    }

    /// Raw bits
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Add a core
    pub fn set(&mut self, cpu: usize) {
        if cpu < MAX_CPUS {
            self.0 |= 1 << cpu;
        }
    }

    /// Remove a core
    pub fn clear(&mut self, cpu: usize) {
        if cpu < MAX_CPUS {
            self.0 &= !(1 << cpu);
        }
    }

    /// Check membership
    pub const fn contains(self, cpu: usize) -> bool {
        cpu < MAX_CPUS && (self.0 >> cpu) & 1 != 0
    }

    /// Check if empty
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of cores in the mask
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Lowest core in the mask
    pub const fn first(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    /// Lowest core strictly after `cpu`; `None` starts from the beginning
    pub const fn next(self, cpu: Option<usize>) -> Option<usize> {
        let rest = match cpu {
            None => self.0,
            Some(c) if c + 1 >= MAX_CPUS => 0,
            Some(c) => self.0 & (u64::MAX << (c + 1)),
        };
        if rest == 0 {
            None
        } else {
            Some(rest.trailing_zeros() as usize)
        }
    }

    /// Iterate cores in ascending order
    pub fn iter(self) -> impl Iterator<Item = usize> {
        let mut bits = self.0;
        core::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let cpu = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(cpu)
        })
    }
}

impl BitAnd for CpuMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for CpuMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for CpuMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_wraps_to_none() {
        let mask = CpuMask::from_cpus(&[1, 3, 5]);
        assert_eq!(mask.next(None), Some(1));
        assert_eq!(mask.next(Some(1)), Some(3));
        assert_eq!(mask.next(Some(2)), Some(3));
        assert_eq!(mask.next(Some(5)), None);
        assert_eq!(mask.next(Some(63)), None);
    }

    #[test]
    fn test_intersection() {
        let a = CpuMask::from_cpus(&[0, 1, 2]);
        let b = CpuMask::from_cpus(&[2, 3]);
        assert_eq!((a & b).iter().collect::<Vec<_>>(), vec![2]);
        assert!((a & CpuMask::single(7)).is_empty());
    }

    #[test]
    fn test_out_of_range_cpu_ignored() {
        let mut mask = CpuMask::empty();
        mask.set(MAX_CPUS);
        assert!(mask.is_empty());
        assert!(!mask.contains(MAX_CPUS));
        assert!(CpuMask::single(MAX_CPUS).is_empty());
    }
}

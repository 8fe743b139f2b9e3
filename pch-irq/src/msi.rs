//! # Message Signaled Interrupts
//!
//! MSI vectors arrive on the HT bus and are latched in 32-bit pending
//! vector groups. A device raises vector `v` by posting a write of `v` to
//! the fixed HT interrupt target address.
//!
//! ```text
//! ┌────────┐   write(0x2FF0_0000, v)   ┌───────────────┐   group v/32   ┌──────┐
//! │ Device ├──────────────────────────►│ HT vector regs├───────────────►│ Core │
//! └────────┘                           └───────────────┘   bit   v%32   └──────┘
//! ```

use core::fmt;
use core::ops::Range;

use static_assertions::const_assert;

use crate::line::{IrqLine, NR_LINES};

// =============================================================================
// Constants
// =============================================================================

/// MSI target address (high 32 bits)
pub const MSI_TARGET_ADDRESS_HI: u32 = 0x0;

/// MSI target address (low 32 bits)
pub const MSI_TARGET_ADDRESS_LO: u32 = 0x2FF0_0000;

/// Vectors per pending-vector group
pub const VECTORS_PER_GROUP: usize = 32;

/// Maximum number of vector groups
pub const MAX_MSI_GROUPS: usize = 8;

/// Vectors reserved for non-device use; never dispatched
pub const RESERVED_VECTORS: Range<usize> = 0..8;

const_assert!(MAX_MSI_GROUPS * VECTORS_PER_GROUP <= NR_LINES);

/// Absolute vector number for a bit of a group
#[inline]
pub const fn group_vector(group: usize, bit: u32) -> usize {
    group * VECTORS_PER_GROUP + bit as usize
}

/// Check if a vector falls in the reserved range
#[inline]
pub const fn is_reserved_vector(vector: usize) -> bool {
    vector >= RESERVED_VECTORS.start && vector < RESERVED_VECTORS.end
}

// =============================================================================
// MSI Message
// =============================================================================

/// Routing message programmed into a device's MSI capability
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MsiMessage {
    /// Message address (high 32 bits)
    pub address_hi: u32,
    /// Message address (low 32 bits)
    pub address_lo: u32,
    /// Message data (the vector)
    pub data: u32,
}

impl MsiMessage {
    /// Message raising `line` at the fixed HT target address
    #[inline]
    pub const fn for_vector(line: IrqLine) -> Self {
        Self {
            address_hi: MSI_TARGET_ADDRESS_HI,
            address_lo: MSI_TARGET_ADDRESS_LO,
            data: line.raw() as u32,
        }
    }

    /// Full 64-bit message address
    #[inline]
    pub const fn address(&self) -> u64 {
        ((self.address_hi as u64) << 32) | self.address_lo as u64
    }
}

impl fmt::Debug for MsiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MsiMessage")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("data", &self.data)
            .finish()
    }
}

//! # Interrupt Lines
//!
//! Line numbering for the bridge interrupt controller.
//!
//! ```text
//! 0        16                    64                   128                 256
//! +--------+---------------------+--------------------+-------------------+
//! | legacy |  dynamic MSI        |   bridge-native    |  dynamic MSI      |
//! | (LPC)  |  vectors            |   (PCH) lines      |  vectors          |
//! +--------+---------------------+--------------------+-------------------+
//! ```
//!
//! In edge-vector mode every bridge-native line is converted to the HT
//! vector with the same number, so the vector space and the line space
//! coincide.

use core::fmt;

use static_assertions::const_assert;

// ============================================================================
// Line Space
// ============================================================================

/// Total number of interrupt lines managed by the controller
pub const NR_LINES: usize = 256;

/// Number of legacy (LPC) lines, toggled in the LPC enable register
pub const LEGACY_LINES: usize = 16;

/// First bridge-native line
pub const PCH_IRQ_BASE: usize = 64;

/// Number of bridge-native lines (one per bit of the 64-bit mask register)
pub const PCH_LINES: usize = 64;

/// One past the last bridge-native line
pub const PCH_LAST_IRQ: usize = PCH_IRQ_BASE + PCH_LINES;

/// First line number handed out for dynamically allocated MSI vectors
pub const MSI_IRQ_BASE: usize = 16;

/// Bit of the bridge mask register carrying the LPC cascade
pub const LPC_OFFSET: u32 = 19;

const_assert!(PCH_LAST_IRQ <= NR_LINES);
const_assert!(LEGACY_LINES <= MSI_IRQ_BASE);
const_assert!((LPC_OFFSET as usize) < PCH_LINES);

// ============================================================================
// Line Identifier
// ============================================================================

/// Interrupt line number
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct IrqLine(u16);

/// Line category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCategory {
    /// LPC line below [`LEGACY_LINES`]
    Legacy,
    /// Line of the bridge's own status/mask bank
    BridgeNative,
    /// Dynamically issued message-signaled vector
    MessageSignaled,
}

impl IrqLine {
    /// The LPC cascade line
    pub const LPC_CASCADE: Self = Self::from_pch_bit(LPC_OFFSET);

    /// Create a line, checking it against the line space
    #[inline]
    pub const fn new(line: usize) -> Option<Self> {
        if line < NR_LINES {
            Some(Self(line as u16))
        } else {
            None
        }
    }

    /// Create a line from a raw number without range checking
    #[inline]
    pub const fn from_raw(line: u16) -> Self {
        Self(line)
    }

    /// Bridge-native line for a bit of the bridge mask/status registers
    #[inline]
    pub const fn from_pch_bit(bit: u32) -> Self {
        Self((PCH_IRQ_BASE + bit as usize) as u16)
    }

    /// Line number as an index
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw line number
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Category of this line
    pub const fn category(self) -> LineCategory {
        let n = self.0 as usize;
        if n < LEGACY_LINES {
            LineCategory::Legacy
        } else if n >= PCH_IRQ_BASE && n < PCH_LAST_IRQ {
            LineCategory::BridgeNative
        } else {
            LineCategory::MessageSignaled
        }
    }

    /// Whether this line lives in the LPC enable register
    #[inline]
    pub const fn is_legacy(self) -> bool {
        (self.0 as usize) < LEGACY_LINES
    }

    /// Bit in the bridge mask/status registers, for bridge-native lines
    #[inline]
    pub const fn pch_bit(self) -> Option<u32> {
        let n = self.0 as usize;
        if n >= PCH_IRQ_BASE && n < PCH_LAST_IRQ {
            Some((n - PCH_IRQ_BASE) as u32)
        } else {
            None
        }
    }
}

impl fmt::Debug for IrqLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IRQ{}", self.0)
    }
}

impl fmt::Display for IrqLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Known Bridge Lines
// ============================================================================

/// Bridge-native lines of the LS7A bridge
pub mod ls7a {
    use super::IrqLine;

    /// Ethernet controller 0
    pub const GMAC0: IrqLine = IrqLine::from_pch_bit(12);
    /// Ethernet controller 1
    pub const GMAC1: IrqLine = IrqLine::from_pch_bit(14);
    /// SATA controller 0
    pub const SATA0: IrqLine = IrqLine::from_pch_bit(16);
    /// SATA controller 1
    pub const SATA1: IrqLine = IrqLine::from_pch_bit(17);
    /// SATA controller 2
    pub const SATA2: IrqLine = IrqLine::from_pch_bit(18);
    /// LPC cascade
    pub const LPC: IrqLine = IrqLine::LPC_CASCADE;
    /// PCIe F0 port 0
    pub const PCIE_F0_PORT0: IrqLine = IrqLine::from_pch_bit(32);
    /// PCIe F0 port 1
    pub const PCIE_F0_PORT1: IrqLine = IrqLine::from_pch_bit(33);
    /// PCIe F0 port 2
    pub const PCIE_F0_PORT2: IrqLine = IrqLine::from_pch_bit(34);
    /// PCIe F0 port 3
    pub const PCIE_F0_PORT3: IrqLine = IrqLine::from_pch_bit(35);
    /// PCIe F1 port 0
    pub const PCIE_F1_PORT0: IrqLine = IrqLine::from_pch_bit(36);
    /// PCIe F1 port 1
    pub const PCIE_F1_PORT1: IrqLine = IrqLine::from_pch_bit(37);
    /// PCIe H port, low half
    pub const PCIE_H_LO: IrqLine = IrqLine::from_pch_bit(38);
    /// PCIe H port, high half
    pub const PCIE_H_HI: IrqLine = IrqLine::from_pch_bit(39);
    /// PCIe G0 port, low half
    pub const PCIE_G0_LO: IrqLine = IrqLine::from_pch_bit(40);
    /// PCIe G0 port, high half
    pub const PCIE_G0_HI: IrqLine = IrqLine::from_pch_bit(41);
    /// PCIe G1 port, low half
    pub const PCIE_G1_LO: IrqLine = IrqLine::from_pch_bit(42);
    /// PCIe G1 port, high half
    pub const PCIE_G1_HI: IrqLine = IrqLine::from_pch_bit(43);
    /// USB EHCI controller 0
    pub const EHCI0: IrqLine = IrqLine::from_pch_bit(49);
    /// USB OHCI controller 0
    pub const OHCI0: IrqLine = IrqLine::from_pch_bit(50);
    /// USB EHCI controller 1
    pub const EHCI1: IrqLine = IrqLine::from_pch_bit(51);
    /// USB OHCI controller 1
    pub const OHCI1: IrqLine = IrqLine::from_pch_bit(52);

    /// Lines balanced across cores in level mode
    pub const FORWARDED_LINES: &[IrqLine] = &[
        SATA0,
        SATA1,
        SATA2,
        GMAC0,
        GMAC1,
        PCIE_F0_PORT0,
        PCIE_F0_PORT1,
        PCIE_F0_PORT2,
        PCIE_F0_PORT3,
        PCIE_F1_PORT0,
        PCIE_F1_PORT1,
        PCIE_G0_LO,
        PCIE_G0_HI,
        PCIE_G1_LO,
        PCIE_G1_HI,
        PCIE_H_LO,
        PCIE_H_HI,
        EHCI0,
        EHCI1,
        OHCI0,
        OHCI1,
    ];
}

//! # Register Bank
//!
//! Typed access to the bridge, LPC, interrupt-router and HT vector registers.
//!
//! ## Memory Map
//!
//! ```text
//! +----------------+--------+-------+------------------------------------+
//! | Block          | Offset | Width | Register                           |
//! +----------------+--------+-------+------------------------------------+
//! | Bridge (PCH)   | 0x020  | 64    | Interrupt mask                     |
//! |                | 0x040  | 64    | HT-MSI conversion enable           |
//! |                | 0x060  | 64    | Edge/level mode                    |
//! |                | 0x080  | 64    | Interrupt clear (W1C)              |
//! |                | 0x100  | 8*64  | Route entry per line               |
//! |                | 0x200  | 8*64  | HT-MSI vector per line             |
//! |                | 0x3A0  | 64    | Interrupt status                   |
//! | LPC            | 0x000  | 32    | Control                            |
//! |                | 0x004  | 32    | Enable                             |
//! |                | 0x008  | 32    | Status                             |
//! |                | 0x00C  | 32    | Clear                              |
//! | Router         | 0x000  | 8*32  | Route entry per router input       |
//! |                | 0x020  | 32    | Input status                       |
//! |                | 0x024  | 32    | Input enable                       |
//! |                | 0x028  | 32    | Input enable set                   |
//! | HT vectors     | 0x080  | 32*8  | Pending vector group (W1C)         |
//! |                | 0x0A0  | 32*8  | Vector group enable                |
//! +----------------+--------+-------+------------------------------------+
//! ```
//!
//! The controller logic only talks to [`RegisterBank`], so tests substitute
//! an in-memory bank for [`MmioBank`].

use core::ptr::{read_volatile, write_volatile};

use bitflags::bitflags;

// ============================================================================
// Register Offsets
// ============================================================================

/// Bridge register offsets
pub mod pch {
    /// Interrupt mask register
    pub const INT_MASK: usize = 0x020;
    /// HT-MSI conversion enable register
    pub const INT_HTMSI_EN: usize = 0x040;
    /// Edge/level mode register
    pub const INT_EDGE: usize = 0x060;
    /// Interrupt clear register
    pub const INT_CLEAR: usize = 0x080;
    /// Route entry table (one byte per line)
    pub const INT_ROUTE_ENTRY: usize = 0x100;
    /// HT-MSI vector table (one byte per line)
    pub const INT_HTMSI_VEC: usize = 0x200;
    /// Interrupt status register
    pub const INT_STATUS: usize = 0x3A0;
}

/// LPC controller register offsets
pub mod lpc {
    /// Control
    pub const INT_CTL: usize = 0x00;
    /// Enable
    pub const INT_ENA: usize = 0x04;
    /// Status
    pub const INT_STS: usize = 0x08;
    /// Clear
    pub const INT_CLR: usize = 0x0C;
}

/// Interrupt router register offsets
pub mod router {
    /// Route entry table (one byte per router input)
    pub const ENTRY: usize = 0x00;
    /// Input enable
    pub const INTEN: usize = 0x24;
    /// Input enable set
    pub const INTENSET: usize = 0x28;

    /// Router input for system interrupt 0
    pub const SYS_INT0: u8 = 0;
    /// Router input for UART0
    pub const UART0: u8 = 10;
    /// Router input for UART1
    pub const UART1: u8 = 15;
    /// Router input for HT vector group 0
    pub const HT1_BASE: u8 = 16;
}

/// HT vector register offsets
pub mod ht {
    /// Pending vector groups (32 bits each)
    pub const INT_VECTOR: usize = 0x80;
    /// Vector group enables (32 bits each)
    pub const INTN_EN: usize = 0xA0;
}

/// Register value written to an LPC control register to enable it
pub const LPC_CTL_ENABLE: u64 = 0x8000_0000;

/// Mask covering the LPC status bits
pub const LPC_STATUS_BITS: u64 = 0x3_FFFF;

// ============================================================================
// Router Inputs
// ============================================================================

bitflags! {
    /// Interrupt router input enable bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RouterInputs: u32 {
        /// System interrupt 0 (bridge output in level mode)
        const SYS_INT0 = 1 << router::SYS_INT0;
        /// UART0
        const UART0 = 1 << router::UART0;
        /// UART1
        const UART1 = 1 << router::UART1;
        /// HT vector groups 0-15
        const HT1_ALL = 0xFFFF << router::HT1_BASE;
    }
}

/// Cores a router entry can name (one node)
pub const ROUTER_CORES: usize = 4;

/// Router entry value routing an input to `pin` of `core`
///
/// `core` must be below [`ROUTER_CORES`]; higher cores alias onto the node.
#[inline]
pub const fn route_core_pin(core: usize, pin: u8) -> u8 {
    (1u8 << (core % ROUTER_CORES)) | (1u8 << ((pin & 0x3) + 4))
}

// ============================================================================
// Named Registers
// ============================================================================

/// Register access width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// 8-bit
    Byte,
    /// 32-bit
    Word,
    /// 64-bit
    Quad,
}

impl Width {
    /// All-ones value for this width
    pub const fn mask(self) -> u64 {
        match self {
            Width::Byte => 0xFF,
            Width::Word => 0xFFFF_FFFF,
            Width::Quad => u64::MAX,
        }
    }
}

/// Named controller register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    /// Bridge interrupt mask (1 = masked)
    IntMask,
    /// Bridge HT-MSI conversion enable
    HtMsiEnable,
    /// Bridge edge/level mode
    IntEdge,
    /// Bridge interrupt clear (W1C)
    IntClear,
    /// Bridge interrupt status
    IntStatus,
    /// Bridge route entry for a bridge line bit
    RouteEntry(u8),
    /// Bridge HT-MSI vector for a bridge line bit
    HtMsiVector(u8),
    /// LPC control
    LpcIntCtl,
    /// LPC enable (1 = enabled)
    LpcIntEnable,
    /// LPC status
    LpcIntStatus,
    /// LPC clear
    LpcIntClear,
    /// Router entry for a router input
    RouterEntry(u8),
    /// Router input enable
    RouterIntEn,
    /// Router input enable set
    RouterIntEnSet,
    /// HT pending vector group (W1C)
    HtIntVector(u8),
    /// HT vector group enable
    HtIntEnable(u8),
}

impl Reg {
    /// Access width of the register
    pub const fn width(self) -> Width {
        match self {
            Reg::IntMask | Reg::HtMsiEnable | Reg::IntEdge | Reg::IntClear | Reg::IntStatus => {
                Width::Quad
            },
            Reg::RouteEntry(_) | Reg::HtMsiVector(_) | Reg::RouterEntry(_) => Width::Byte,
            Reg::LpcIntCtl
            | Reg::LpcIntEnable
            | Reg::LpcIntStatus
            | Reg::LpcIntClear
            | Reg::RouterIntEn
            | Reg::RouterIntEnSet
            | Reg::HtIntVector(_)
            | Reg::HtIntEnable(_) => Width::Word,
        }
    }
}

// ============================================================================
// Register Bank Interface
// ============================================================================

/// Ordered register access
///
/// Implementations must not reorder accesses: a read-modify-write issued by
/// the controller reaches the hardware in program order.
pub trait RegisterBank {
    /// Read a register, zero-extended to 64 bits
    fn read(&self, reg: Reg) -> u64;

    /// Write a register, truncated to its width
    fn write(&self, reg: Reg, value: u64);
}

impl<B: RegisterBank + ?Sized> RegisterBank for &B {
    #[inline]
    fn read(&self, reg: Reg) -> u64 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&self, reg: Reg, value: u64) {
        (**self).write(reg, value);
    }
}

// ============================================================================
// MMIO Register Bank
// ============================================================================

/// Virtual base addresses of the register blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterLayout {
    /// Bridge register block
    pub pch_base: usize,
    /// LPC controller block
    pub lpc_base: usize,
    /// Interrupt router block
    pub router_base: usize,
    /// HT vector block
    pub ht_base: usize,
}

impl RegisterLayout {
    /// LS7A bridge on a Loongson-3 host (physical addresses)
    pub const LS7A: Self = Self {
        pch_base: 0x1000_0000,
        lpc_base: 0x1000_2000,
        router_base: 0x3FF0_1400,
        ht_base: 0x0EFD_FB00_0000,
    };

    /// Offset every block by `offset` (e.g. an uncached window)
    pub const fn offset_by(self, offset: usize) -> Self {
        Self {
            pch_base: self.pch_base + offset,
            lpc_base: self.lpc_base + offset,
            router_base: self.router_base + offset,
            ht_base: self.ht_base + offset,
        }
    }

    /// Address of a register
    pub const fn address(&self, reg: Reg) -> usize {
        match reg {
            Reg::IntMask => self.pch_base + pch::INT_MASK,
            Reg::HtMsiEnable => self.pch_base + pch::INT_HTMSI_EN,
            Reg::IntEdge => self.pch_base + pch::INT_EDGE,
            Reg::IntClear => self.pch_base + pch::INT_CLEAR,
            Reg::IntStatus => self.pch_base + pch::INT_STATUS,
            Reg::RouteEntry(bit) => self.pch_base + pch::INT_ROUTE_ENTRY + bit as usize,
            Reg::HtMsiVector(bit) => self.pch_base + pch::INT_HTMSI_VEC + bit as usize,
            Reg::LpcIntCtl => self.lpc_base + lpc::INT_CTL,
            Reg::LpcIntEnable => self.lpc_base + lpc::INT_ENA,
            Reg::LpcIntStatus => self.lpc_base + lpc::INT_STS,
            Reg::LpcIntClear => self.lpc_base + lpc::INT_CLR,
            Reg::RouterEntry(input) => self.router_base + router::ENTRY + input as usize,
            Reg::RouterIntEn => self.router_base + router::INTEN,
            Reg::RouterIntEnSet => self.router_base + router::INTENSET,
            Reg::HtIntVector(group) => self.ht_base + ht::INT_VECTOR + group as usize * 4,
            Reg::HtIntEnable(group) => self.ht_base + ht::INTN_EN + group as usize * 4,
        }
    }
}

/// Memory-mapped register bank
#[derive(Debug)]
pub struct MmioBank {
    layout: RegisterLayout,
}

impl MmioBank {
    /// Create a bank over mapped register blocks
    ///
    /// # Safety
    /// Every block in `layout` must be mapped uncached and stay mapped for
    /// the lifetime of the bank.
    pub const unsafe fn new(layout: RegisterLayout) -> Self {
        Self { layout }
    }

    /// Register layout of this bank
    pub const fn layout(&self) -> &RegisterLayout {
        &self.layout
    }
}

impl RegisterBank for MmioBank {
    fn read(&self, reg: Reg) -> u64 {
        let addr = self.layout.address(reg);
        // SAFETY: the constructor guarantees the register blocks are mapped.
        unsafe {
            match reg.width() {
                Width::Byte => read_volatile(addr as *const u8) as u64,
                Width::Word => read_volatile(addr as *const u32) as u64,
                Width::Quad => read_volatile(addr as *const u64),
            }
        }
    }

    fn write(&self, reg: Reg, value: u64) {
        let addr = self.layout.address(reg);
        // SAFETY: the constructor guarantees the register blocks are mapped.
        unsafe {
            match reg.width() {
                Width::Byte => write_volatile(addr as *mut u8, value as u8),
                Width::Word => write_volatile(addr as *mut u32, value as u32),
                Width::Quad => write_volatile(addr as *mut u64, value),
            }
        }
    }
}

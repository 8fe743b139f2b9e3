//! # Interrupt Dispatch
//!
//! Entry points run in interrupt context on the delivering core.
//!
//! ## Bridge-Native Path (level mode)
//!
//! ```text
//!  ┌─────────── mask lock ───────────┐
//!  │ mask    = read(INT_MASK)        │
//!  │ pending = read(INT_STATUS)      │
//!  │ write(INT_MASK, mask | pending) │
//!  └─────────────────────────────────┘
//!            │
//!            ▼  for each pending bit, ascending
//!   slot? ──no──► local handler
//!     │yes
//!   affinity ∩ active empty? ──yes──► local handler
//!     │no
//!   next core (round-robin) == boot core? ──yes──► local handler
//!     │no
//!   notify(core, slot bit)
//! ```
//!
//! Lines stay masked after dispatch; the handler's completion path unmasks.
//!
//! ## MSI Group Path (edge-vector mode)
//!
//! Each 32-bit pending group is read and the same value written back,
//! clearing exactly the bits read. Bits arriving after the read stay
//! pending for the next pass.

use crate::config::DeliveryMode;
use crate::controller::PchIrq;
use crate::error::IrqResult;
use crate::indirection::IndirectionSlot;
use crate::line::IrqLine;
use crate::msi::{group_vector, is_reserved_vector};
use crate::regs::{Reg, RegisterBank, LPC_STATUS_BITS};

// ============================================================================
// Dispatch Results
// ============================================================================

/// Where a line was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Handled on the delivering core
    Local(LocalReason),
    /// Forwarded to another core
    Forwarded {
        /// Target core
        core: usize,
        /// Notification bit raised on the target
        bit: u32,
    },
}

/// Why a line was handled locally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalReason {
    /// No indirection slot
    Unassigned,
    /// No active core in the line's affinity
    EmptyAffinity,
    /// Round-robin selected the boot core
    BootCore,
}

/// Outcome of one dispatch pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchSummary {
    /// Lines handled on the delivering core
    pub local: u32,
    /// Lines forwarded to another core
    pub forwarded: u32,
    /// Reserved vectors reported as spurious
    pub spurious: u32,
}

impl DispatchSummary {
    /// Total lines routed (spurious vectors excluded)
    pub const fn routed(&self) -> u32 {
        self.local + self.forwarded
    }

    fn record(&mut self, route: Route) {
        match route {
            Route::Local(_) => self.local += 1,
            Route::Forwarded { .. } => self.forwarded += 1,
        }
    }
}

/// Result of a cascade handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    /// Nothing was pending
    None,
    /// At least one line was handled
    Handled,
}

/// Set bits of `bits`, lowest first
fn set_bits(mut bits: u64) -> impl Iterator<Item = u32> {
    core::iter::from_fn(move || {
        if bits == 0 {
            return None;
        }
        let bit = bits.trailing_zeros();
        bits &= bits - 1;
        Some(bit)
    })
}

// ============================================================================
// Dispatchers
// ============================================================================

impl<B: RegisterBank> PchIrq<'_, B> {
    /// Run the dispatcher selected by the delivery mode
    pub fn handle_irq(&self) -> IrqResult<DispatchSummary> {
        self.ensure_initialized()?;
        Ok(match self.config.delivery {
            DeliveryMode::EdgeVector => self.dispatch_msi(),
            DeliveryMode::Level => self.dispatch_pch(),
        })
    }

    /// Dispatch the bridge-native lines pending in the status register
    pub fn dispatch_pch(&self) -> DispatchSummary {
        let pending = {
            let _guard = self.mask_lock.lock(self.platform.local_irq);
            let mask = self.bank.read(Reg::IntMask);
            let status = self.bank.read(Reg::IntStatus);
            self.bank.write(Reg::IntMask, mask | status);
            status
        };

        let mut summary = DispatchSummary::default();
        for bit in set_bits(pending) {
            summary.record(self.route_line(IrqLine::from_pch_bit(bit)));
        }
        summary
    }

    /// Acknowledge and dispatch every HT vector group
    pub fn dispatch_msi(&self) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for group in 0..self.config.msi_groups {
            let reg = Reg::HtIntVector(group as u8);
            let pending = self.bank.read(reg) & 0xFFFF_FFFF;
            self.bank.write(reg, pending);

            for bit in set_bits(pending) {
                let vector = group_vector(group, bit);
                if is_reserved_vector(vector) {
                    log::error!("spurious interrupt: IRQ{}", vector);
                    self.stats.count_spurious();
                    summary.spurious += 1;
                    continue;
                }
                summary.record(self.route_line(IrqLine::from_raw(vector as u16)));
            }
        }

        summary
    }

    /// Cascade handler for the legacy lines behind the LPC controller
    ///
    /// LPC bit `n` is dispatched as line `n`. Bits 16 and 17 therefore land
    /// on line numbers shared with the first MSI vectors (`MSI_IRQ_BASE`).
    pub fn dispatch_lpc(&self) -> IrqReturn {
        let pending = self.bank.read(Reg::LpcIntEnable)
            & self.bank.read(Reg::LpcIntStatus)
            & LPC_STATUS_BITS;
        if pending == 0 {
            return IrqReturn::None;
        }

        for bit in set_bits(pending) {
            self.run_local(IrqLine::from_raw(bit as u16));
        }
        IrqReturn::Handled
    }

    /// Handle notification bits received from another core
    ///
    /// Runs on the target core. Returns the number of lines handled; bits
    /// whose slot was released in the meantime are dropped.
    pub fn service_notification(&self, bits: u32) -> usize {
        let mut handled = 0;
        for bit in set_bits(bits as u64) {
            let line = IndirectionSlot::from_bit(bit).and_then(|slot| self.indirection.line_of(slot));
            match line {
                Some(line) => {
                    self.platform.handler.dispatch(line);
                    handled += 1;
                },
                None => log::debug!("PCH: dropping notification bit {} without a line", bit),
            }
        }
        handled
    }

    // ========================================================================
    // Per-Line Routing
    // ========================================================================

    /// Decide where `line` is serviced and send it there
    pub(crate) fn route_line(&self, line: IrqLine) -> Route {
        let route = self.decide(line);

        #[cfg(feature = "debug")]
        log::trace!("PCH: {:?} -> {:?}", line, route);

        match route {
            Route::Local(reason) => {
                if reason == LocalReason::EmptyAffinity {
                    self.stats.count_empty_affinity();
                }
                self.run_local(line);
            },
            Route::Forwarded { core, bit } => {
                self.platform.notifier.send(core, bit);
                self.stats.count_forwarded();
            },
        }
        route
    }

    fn decide(&self, line: IrqLine) -> Route {
        let Some(slot) = self.indirection.lookup(line) else {
            return Route::Local(LocalReason::Unassigned);
        };

        let affinity = self.platform.affinity.affinity_of(line);
        let active = self.platform.affinity.active_cores();
        let Some(core) = self.router.select(line, affinity, active) else {
            return Route::Local(LocalReason::EmptyAffinity);
        };

        if core == self.config.boot_core {
            Route::Local(LocalReason::BootCore)
        } else {
            Route::Forwarded {
                core,
                bit: slot.bit(),
            }
        }
    }

    fn run_local(&self, line: IrqLine) {
        self.platform.handler.dispatch(line);
        self.stats.count_local();
    }
}

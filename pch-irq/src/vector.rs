//! # MSI Vector Allocator
//!
//! Hands out message-signaled vectors from the descriptor registry's id
//! space, bounded by `32 * msi_groups`, and gives each vector an
//! indirection slot so the MSI dispatcher can balance it across cores.

use crate::config::DeliveryMode;
use crate::controller::PchIrq;
use crate::error::{IrqError, IrqResult};
use crate::indirection::IndirectionSlot;
use crate::line::{IrqLine, MSI_IRQ_BASE};
use crate::msi::MsiMessage;
use crate::regs::RegisterBank;

/// A successfully allocated vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorAllocation {
    /// Allocated line id (equals the vector number)
    pub line: IrqLine,
    /// Notification slot, `None` when the pool was full
    pub slot: Option<IndirectionSlot>,
    /// Message written to the device
    pub message: MsiMessage,
}

impl<B: RegisterBank> PchIrq<'_, B> {
    /// Allocate an MSI vector and program the device with its message
    ///
    /// On failure no id stays reserved.
    pub fn allocate_vector(&self) -> IrqResult<VectorAllocation> {
        self.ensure_initialized()?;
        if self.config.delivery != DeliveryMode::EdgeVector {
            return Err(IrqError::InvalidConfig);
        }

        let registry = self.platform.registry;
        let Some(line) = registry.allocate(MSI_IRQ_BASE) else {
            log::warn!("PCH: descriptor registry exhausted");
            return Err(IrqError::ResourceExhausted);
        };

        if line.index() >= self.config.max_vectors() {
            registry.free(line);
            log::warn!(
                "PCH: IRQ{} beyond the {} configured vectors",
                line,
                self.config.max_vectors()
            );
            return Err(IrqError::ResourceExhausted);
        }

        let slot = self.indirection.assign(line);
        registry.bind_msi(line);

        let message = MsiMessage::for_vector(line);
        self.platform.transport.write_routing_message(line, message);

        log::debug!("PCH: allocated MSI vector IRQ{}", line);
        Ok(VectorAllocation {
            line,
            slot,
            message,
        })
    }

    /// Release a vector returned by [`PchIrq::allocate_vector`]
    ///
    /// Freeing a vector that is not allocated is a caller error.
    pub fn free_vector(&self, line: IrqLine) {
        self.platform.registry.free(line);
        self.indirection.release(line);
        log::debug!("PCH: freed MSI vector IRQ{}", line);
    }
}

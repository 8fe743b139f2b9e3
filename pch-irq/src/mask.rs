//! # Masking Controller
//!
//! Per-line enable/disable, effective before the call returns.
//!
//! - Legacy lines (below 16) live in the LPC enable register and are
//!   toggled with only local interrupts disabled. That register is only
//!   touched from the delivering core's own path.
//! - Bridge-native lines live in the 64-bit mask register shared by every
//!   core and by the dispatcher, and are toggled under the mask spin lock.

use crate::controller::PchIrq;
use crate::error::{IrqError, IrqResult};
use crate::line::IrqLine;
use crate::regs::{Reg, RegisterBank};
use crate::sync::LocalIrqGuard;

impl<B: RegisterBank> PchIrq<'_, B> {
    /// Disable delivery of `line`
    pub fn mask(&self, line: IrqLine) -> IrqResult<()> {
        if line.is_legacy() {
            let _irq = LocalIrqGuard::new(self.platform.local_irq);
            let enabled = self.bank.read(Reg::LpcIntEnable);
            self.bank
                .write(Reg::LpcIntEnable, enabled & !(1 << line.index()));
            return Ok(());
        }

        let bit = line.pch_bit().ok_or(IrqError::InvalidLine)?;
        let _guard = self.mask_lock.lock(self.platform.local_irq);
        let mask = self.bank.read(Reg::IntMask);
        self.bank.write(Reg::IntMask, mask | (1 << bit));
        Ok(())
    }

    /// Enable delivery of `line`
    ///
    /// With MSI delivery the bridge latches edges, so the line's pending
    /// bit is cleared first to avoid an immediate spurious re-entry.
    pub fn unmask(&self, line: IrqLine) -> IrqResult<()> {
        if line.is_legacy() {
            let _irq = LocalIrqGuard::new(self.platform.local_irq);
            let enabled = self.bank.read(Reg::LpcIntEnable);
            self.bank
                .write(Reg::LpcIntEnable, enabled | (1 << line.index()));
            return Ok(());
        }

        let bit = line.pch_bit().ok_or(IrqError::InvalidLine)?;
        let _guard = self.mask_lock.lock(self.platform.local_irq);
        if self.config.msi_enabled() {
            self.bank.write(Reg::IntClear, 1 << bit);
        }
        let mask = self.bank.read(Reg::IntMask);
        self.bank.write(Reg::IntMask, mask & !(1 << bit));
        Ok(())
    }

    /// Check whether `line` is currently disabled
    pub fn is_masked(&self, line: IrqLine) -> IrqResult<bool> {
        if line.is_legacy() {
            let enabled = self.bank.read(Reg::LpcIntEnable);
            return Ok(enabled & (1 << line.index()) == 0);
        }

        let bit = line.pch_bit().ok_or(IrqError::InvalidLine)?;
        Ok(self.bank.read(Reg::IntMask) & (1 << bit) != 0)
    }
}

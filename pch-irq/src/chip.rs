//! # Interrupt Chips
//!
//! The mask/unmask/set-affinity capabilities the descriptor layer binds to
//! each line. Bridge-native and legacy lines use [`PchChip`]; dynamically
//! allocated MSI vectors use [`MsiChip`].

use core::fmt;

use crate::controller::PchIrq;
use crate::cpumask::CpuMask;
use crate::error::IrqResult;
use crate::line::{IrqLine, LineCategory};
use crate::regs::RegisterBank;

/// Line control operations
pub trait IrqChip {
    /// Chip name
    fn name(&self) -> &'static str;

    /// Disable delivery of `line`
    fn mask(&self, line: IrqLine) -> IrqResult<()>;

    /// Enable delivery of `line`
    fn unmask(&self, line: IrqLine) -> IrqResult<()>;

    /// Change the cores eligible to service `line`
    fn set_affinity(&self, line: IrqLine, mask: CpuMask) -> IrqResult<CpuMask>;
}

// ============================================================================
// Bridge Chip
// ============================================================================

/// Chip for legacy and bridge-native lines
pub struct PchChip<'c, 'a, B: RegisterBank> {
    pch: &'c PchIrq<'a, B>,
}

impl<B: RegisterBank> IrqChip for PchChip<'_, '_, B> {
    fn name(&self) -> &'static str {
        "LS7A"
    }

    fn mask(&self, line: IrqLine) -> IrqResult<()> {
        self.pch.mask(line)
    }

    fn unmask(&self, line: IrqLine) -> IrqResult<()> {
        self.pch.unmask(line)
    }

    fn set_affinity(&self, line: IrqLine, mask: CpuMask) -> IrqResult<CpuMask> {
        self.pch.set_affinity(line, mask)
    }
}

impl<B: RegisterBank> fmt::Debug for PchChip<'_, '_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PchChip").finish_non_exhaustive()
    }
}

// ============================================================================
// MSI Chip
// ============================================================================

/// Chip for dynamically allocated MSI vectors, masked at the device
pub struct MsiChip<'c, 'a, B: RegisterBank> {
    pch: &'c PchIrq<'a, B>,
}

impl<B: RegisterBank> IrqChip for MsiChip<'_, '_, B> {
    fn name(&self) -> &'static str {
        "LS7A-MSI"
    }

    fn mask(&self, line: IrqLine) -> IrqResult<()> {
        self.pch.platform.transport.mask(line);
        Ok(())
    }

    fn unmask(&self, line: IrqLine) -> IrqResult<()> {
        self.pch.platform.transport.unmask(line);
        Ok(())
    }

    fn set_affinity(&self, line: IrqLine, mask: CpuMask) -> IrqResult<CpuMask> {
        self.pch.set_affinity(line, mask)
    }
}

impl<B: RegisterBank> fmt::Debug for MsiChip<'_, '_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MsiChip").finish_non_exhaustive()
    }
}

// ============================================================================
// Chip Selection
// ============================================================================

impl<'a, B: RegisterBank> PchIrq<'a, B> {
    /// Chip for legacy and bridge-native lines
    pub fn pch_chip(&self) -> PchChip<'_, 'a, B> {
        PchChip { pch: self }
    }

    /// Chip for MSI vectors
    pub fn msi_chip(&self) -> MsiChip<'_, 'a, B> {
        MsiChip { pch: self }
    }

    /// Run `f` with the chip that controls `line`
    pub fn with_chip<R>(&self, line: IrqLine, f: impl FnOnce(&dyn IrqChip) -> R) -> R {
        match line.category() {
            LineCategory::Legacy | LineCategory::BridgeNative => f(&self.pch_chip()),
            LineCategory::MessageSignaled => f(&self.msi_chip()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeliveryMode, PchConfig};
    use crate::regs::Reg;
    use crate::testing::Fakes;

    #[test]
    fn test_chip_selection() {
        let fakes = Fakes::new();
        let pch = fakes.controller(PchConfig::ls7a(DeliveryMode::EdgeVector));

        assert_eq!(pch.with_chip(IrqLine::from_raw(4), |chip| chip.name()), "LS7A");
        assert_eq!(pch.with_chip(IrqLine::from_raw(90), |chip| chip.name()), "LS7A");
        assert_eq!(pch.with_chip(IrqLine::from_raw(20), |chip| chip.name()), "LS7A-MSI");
        assert_eq!(pch.with_chip(IrqLine::from_raw(200), |chip| chip.name()), "LS7A-MSI");
    }

    #[test]
    fn test_msi_chip_masks_at_device() {
        let fakes = Fakes::new();
        let pch = fakes.controller(PchConfig::ls7a(DeliveryMode::EdgeVector));
        let vector = IrqLine::from_raw(130);

        pch.msi_chip().mask(vector).expect("mask");
        assert!(fakes.transport.is_masked(vector));
        pch.msi_chip().unmask(vector).expect("unmask");
        assert!(!fakes.transport.is_masked(vector));
        assert_eq!(fakes.bank.get(Reg::IntMask), 0);
    }

    #[test]
    fn test_pch_chip_uses_mask_register() {
        let fakes = Fakes::new();
        let pch = fakes.controller(PchConfig::ls7a(DeliveryMode::Level));

        pch.with_chip(IrqLine::from_pch_bit(5), |chip| chip.mask(IrqLine::from_pch_bit(5)))
            .expect("mask");
        assert_eq!(fakes.bank.get(Reg::IntMask), 1 << 5);
    }

    #[test]
    fn test_chips_share_affinity_path() {
        let fakes = Fakes::new();
        fakes.affinity.set_active(CpuMask::from_cpus(&[0, 1, 2]));
        let pch = fakes.controller(PchConfig::ls7a(DeliveryMode::EdgeVector));
        let vector = IrqLine::from_raw(140);

        let effective = pch
            .msi_chip()
            .set_affinity(vector, CpuMask::from_cpus(&[2, 5]))
            .expect("affinity");
        assert_eq!(effective, CpuMask::single(2));
        assert_eq!(fakes.affinity.stored(vector), Some(CpuMask::single(2)));
    }
}

//! # Controller Configuration
//!
//! Fixed at initialization; the delivery mode is never changed at runtime.

use crate::error::{IrqError, IrqResult};
use crate::line::{ls7a, IrqLine, LineCategory};
use crate::msi::{MAX_MSI_GROUPS, VECTORS_PER_GROUP};
use crate::regs::ROUTER_CORES;

/// How bridge interrupts reach the cores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Bridge lines are converted to HT MSI vectors (MSI enabled)
    EdgeVector,
    /// Bridge lines share one level-triggered delivery pin
    Level,
}

/// Bridge interrupt controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PchConfig {
    /// Core receiving all routed interrupts
    pub boot_core: usize,
    /// Delivery mode
    pub delivery: DeliveryMode,
    /// Number of HT vector groups in use
    pub msi_groups: usize,
    /// Bridge lines given an indirection slot in level mode
    pub forwarded_lines: &'static [IrqLine],
}

impl PchConfig {
    /// Default LS7A configuration for the given delivery mode
    pub const fn ls7a(delivery: DeliveryMode) -> Self {
        Self {
            boot_core: 0,
            delivery,
            msi_groups: MAX_MSI_GROUPS,
            forwarded_lines: ls7a::FORWARDED_LINES,
        }
    }

    /// Set the boot core
    pub const fn with_boot_core(mut self, core: usize) -> Self {
        self.boot_core = core;
        self
    }

    /// Set the number of vector groups
    pub const fn with_msi_groups(mut self, groups: usize) -> Self {
        self.msi_groups = groups;
        self
    }

    /// Set the forwarded line list
    pub const fn with_forwarded_lines(mut self, lines: &'static [IrqLine]) -> Self {
        self.forwarded_lines = lines;
        self
    }

    /// Whether MSI delivery is enabled
    #[inline]
    pub const fn msi_enabled(&self) -> bool {
        matches!(self.delivery, DeliveryMode::EdgeVector)
    }

    /// One past the highest vector the allocator may hand out
    #[inline]
    pub const fn max_vectors(&self) -> usize {
        self.msi_groups * VECTORS_PER_GROUP
    }

    /// Check the configuration
    pub fn validate(&self) -> IrqResult<()> {
        if self.boot_core >= ROUTER_CORES {
            return Err(IrqError::InvalidConfig);
        }
        if self.msi_groups == 0 || self.msi_groups > MAX_MSI_GROUPS {
            return Err(IrqError::InvalidConfig);
        }
        if self
            .forwarded_lines
            .iter()
            .any(|line| line.category() != LineCategory::BridgeNative)
        {
            return Err(IrqError::InvalidConfig);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ls7a_defaults_are_valid() {
        let config = PchConfig::ls7a(DeliveryMode::Level);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.max_vectors(), 256);
        assert!(!config.msi_enabled());
        assert!(PchConfig::ls7a(DeliveryMode::EdgeVector).msi_enabled());
    }

    #[test]
    fn test_rejects_bad_groups() {
        let config = PchConfig::ls7a(DeliveryMode::EdgeVector);
        assert_eq!(config.with_msi_groups(0).validate(), Err(IrqError::InvalidConfig));
        assert_eq!(config.with_msi_groups(9).validate(), Err(IrqError::InvalidConfig));
        assert_eq!(config.with_msi_groups(2).max_vectors(), 64);
    }

    #[test]
    fn test_rejects_non_bridge_forwarded_line() {
        static LINES: [IrqLine; 1] = [IrqLine::from_raw(3)];
        let config = PchConfig::ls7a(DeliveryMode::Level).with_forwarded_lines(&LINES);
        assert_eq!(config.validate(), Err(IrqError::InvalidConfig));
    }

    #[test]
    fn test_rejects_bad_boot_core() {
        let config = PchConfig::ls7a(DeliveryMode::Level);
        assert_eq!(config.with_boot_core(3).validate(), Ok(()));
        assert_eq!(config.with_boot_core(4).validate(), Err(IrqError::InvalidConfig));
        assert_eq!(config.with_boot_core(5).validate(), Err(IrqError::InvalidConfig));
        assert_eq!(config.with_boot_core(64).validate(), Err(IrqError::InvalidConfig));
    }
}

//! # Error Types
//!
//! Errors surfaced by the bridge interrupt controller. Routing-policy
//! outcomes (spurious vectors, empty affinity) are not errors; they are
//! absorbed by the dispatcher and counted in [`crate::stats::IrqStats`].

use core::fmt;

/// Result alias for controller operations
pub type IrqResult<T> = Result<T, IrqError>;

/// Interrupt controller error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqError {
    /// Vector id range exhausted or beyond the configured maximum
    ResourceExhausted,
    /// Line number outside the controller's line space
    InvalidLine,
    /// Requested affinity has no active core
    InvalidAffinity,
    /// Configuration value out of range
    InvalidConfig,
    /// Controller used before initialization
    NotInitialized,
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrqError::ResourceExhausted => write!(f, "Interrupt vector space exhausted"),
            IrqError::InvalidLine => write!(f, "Invalid interrupt line"),
            IrqError::InvalidAffinity => write!(f, "Affinity contains no active core"),
            IrqError::InvalidConfig => write!(f, "Invalid controller configuration"),
            IrqError::NotInitialized => write!(f, "Interrupt controller not initialized"),
        }
    }
}

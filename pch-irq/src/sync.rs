//! # Interrupt-Safe Locking
//!
//! Two disciplines protect controller state:
//!
//! - [`LocalIrqGuard`]: disables interrupts on the calling core only. Used
//!   for the LPC enable register, which is touched from the delivering
//!   core's own path.
//! - [`IrqSpinLock`]: disables local interrupts, then spins on a
//!   [`spin::Mutex`]. Used for the shared bridge mask register.
//!
//! Neither ever sleeps. A guard must never be held across a blocking call.

use core::fmt;
use core::ops::{Deref, DerefMut};

use spin::{Mutex, MutexGuard};

// ============================================================================
// Local Interrupt Control
// ============================================================================

/// Control of the calling core's interrupt-enable state
pub trait LocalIrq {
    /// Disable interrupts on this core, returning whether they were enabled
    fn disable(&self) -> bool;

    /// Re-enable interrupts on this core
    fn enable(&self);
}

/// RAII guard for the local interrupt state
///
/// Disables interrupts when created, restores the previous state when dropped.
pub struct LocalIrqGuard<'a> {
    local: &'a dyn LocalIrq,
    was_enabled: bool,
}

impl<'a> LocalIrqGuard<'a> {
    /// Disable local interrupts until the guard is dropped
    pub fn new(local: &'a dyn LocalIrq) -> Self {
        Self {
            was_enabled: local.disable(),
            local,
        }
    }
}

impl Drop for LocalIrqGuard<'_> {
    fn drop(&mut self) {
        if self.was_enabled {
            self.local.enable();
        }
    }
}

impl fmt::Debug for LocalIrqGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalIrqGuard")
            .field("was_enabled", &self.was_enabled)
            .finish()
    }
}

// ============================================================================
// Interrupt-Safe Spin Lock
// ============================================================================

/// Spin lock that also disables local interrupts while held
pub struct IrqSpinLock<T> {
    inner: Mutex<T>,
}

impl<T> IrqSpinLock<T> {
    /// Create a new lock
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Disable local interrupts and acquire the lock
    pub fn lock<'a>(&'a self, local: &'a dyn LocalIrq) -> IrqSpinLockGuard<'a, T> {
        let irq = LocalIrqGuard::new(local);
        let guard = self.inner.lock();
        IrqSpinLockGuard { guard, _irq: irq }
    }

    /// Check whether the lock is currently held
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

impl<T> fmt::Debug for IrqSpinLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqSpinLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// Guard of an [`IrqSpinLock`]
///
/// Fields drop in declaration order: the lock is released before local
/// interrupts are restored.
pub struct IrqSpinLockGuard<'a, T> {
    guard: MutexGuard<'a, T>,
    _irq: LocalIrqGuard<'a>,
}

impl<T> Deref for IrqSpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for IrqSpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> fmt::Debug for IrqSpinLockGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqSpinLockGuard").finish_non_exhaustive()
    }
}

//! # Bridge Interrupt Controller
//!
//! [`PchIrq`] is the single context owned by the interrupt subsystem. It
//! holds the register bank, the configuration, the platform collaborators
//! and every table the components share. The components live in their own
//! modules as `impl` blocks on this type:
//!
//! | Component               | Module                    |
//! |-------------------------|---------------------------|
//! | Masking Controller      | [`crate::mask`]           |
//! | Interrupt chips         | [`crate::chip`]           |
//! | Dispatchers             | [`crate::dispatch`]       |
//! | Vector Allocator        | [`crate::vector`]         |
//! | Initialization          | [`crate::init`]           |

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::affinity::AffinityRouter;
use crate::config::PchConfig;
use crate::cpumask::CpuMask;
use crate::error::{IrqError, IrqResult};
use crate::indirection::IndirectionTable;
use crate::line::IrqLine;
use crate::platform::Platform;
use crate::regs::RegisterBank;
use crate::stats::IrqStats;
use crate::sync::IrqSpinLock;

/// Bridge interrupt controller context
pub struct PchIrq<'a, B: RegisterBank> {
    pub(crate) bank: B,
    pub(crate) config: PchConfig,
    pub(crate) platform: Platform<'a>,
    /// Serializes every read-modify-write of the shared bridge mask register
    pub(crate) mask_lock: IrqSpinLock<()>,
    pub(crate) indirection: IndirectionTable,
    pub(crate) router: AffinityRouter,
    pub(crate) stats: IrqStats,
    pub(crate) initialized: AtomicBool,
}

impl<'a, B: RegisterBank> PchIrq<'a, B> {
    /// Create a controller; hardware is untouched until [`PchIrq::init`]
    pub fn new(bank: B, config: PchConfig, platform: Platform<'a>) -> IrqResult<Self> {
        config.validate()?;
        Ok(Self {
            bank,
            config,
            platform,
            mask_lock: IrqSpinLock::new(()),
            indirection: IndirectionTable::new(),
            router: AffinityRouter::new(),
            stats: IrqStats::new(),
            initialized: AtomicBool::new(false),
        })
    }

    /// Controller configuration
    pub fn config(&self) -> &PchConfig {
        &self.config
    }

    /// Register bank
    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Indirection table
    pub fn indirection(&self) -> &IndirectionTable {
        &self.indirection
    }

    /// Affinity router
    pub fn router(&self) -> &AffinityRouter {
        &self.router
    }

    /// Dispatch statistics
    pub fn stats(&self) -> &IrqStats {
        &self.stats
    }

    /// Whether [`PchIrq::init`] has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub(crate) fn ensure_initialized(&self) -> IrqResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(IrqError::NotInitialized)
        }
    }

    /// Change the affinity of `line`
    ///
    /// The request is narrowed to the active cores and handed to the
    /// affinity collaborator. Returns the effective affinity.
    pub fn set_affinity(&self, line: IrqLine, mask: CpuMask) -> IrqResult<CpuMask> {
        IrqLine::new(line.index()).ok_or(IrqError::InvalidLine)?;

        let effective = mask & self.platform.affinity.active_cores();
        if effective.is_empty() {
            return Err(IrqError::InvalidAffinity);
        }

        self.platform.affinity.set_affinity(line, effective);
        Ok(effective)
    }
}

impl<B: RegisterBank> fmt::Debug for PchIrq<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PchIrq")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .field("indirection", &self.indirection)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

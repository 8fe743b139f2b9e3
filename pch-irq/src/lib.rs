//! # Helix PCH Interrupt Controller
//!
//! Interrupt distribution for the LS7A chipset bridge on Loongson-3 hosts.
//!
//! The bridge multiplexes legacy, bridge-native and message-signaled lines
//! onto a few delivery pins of one boot core. This crate decides, per
//! pending line, whether the boot core services it or forwards it to
//! another core with a cross-core notification.
//!
//! ## Line Space
//!
//! ```text
//!   0        16                 64                128             256
//!   ├────────┼──────────────────┼──────────────────┼───────────────┤
//!   │ legacy │   MSI vectors    │  bridge-native   │  MSI vectors  │
//!   │  (LPC) │                  │ (64-bit mask reg)│               │
//!   └────────┴──────────────────┴──────────────────┴───────────────┘
//! ```
//!
//! ## Components
//!
//! - [`mask`]: per-line mask/unmask
//! - [`dispatch`]: bridge-native and MSI group dispatchers
//! - [`affinity`]: round-robin core selection
//! - [`indirection`]: line to notification-bit mapping
//! - [`vector`]: MSI vector allocation
//! - [`init`]: hardware bring-up
//!
//! All state lives in one [`PchIrq`] context; hardware is reached only
//! through a [`RegisterBank`] and the kernel only through [`Platform`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod affinity;
pub mod chip;
pub mod config;
pub mod controller;
pub mod cpumask;
pub mod dispatch;
pub mod error;
pub mod indirection;
pub mod init;
pub mod line;
pub mod mask;
pub mod msi;
pub mod platform;
pub mod regs;
pub mod stats;
pub mod sync;
pub mod vector;

#[cfg(test)]
mod testing;

pub use affinity::AffinityRouter;
pub use chip::{IrqChip, MsiChip, PchChip};
pub use config::{DeliveryMode, PchConfig};
pub use controller::PchIrq;
pub use cpumask::CpuMask;
pub use dispatch::{DispatchSummary, IrqReturn, LocalReason, Route};
pub use error::{IrqError, IrqResult};
pub use indirection::{IndirectionSlot, IndirectionTable};
pub use line::{IrqLine, LineCategory};
pub use msi::MsiMessage;
pub use platform::{
    AffinityResolver, CrossCoreNotifier, DescriptorRegistry, LocalHandler, MessageTransport,
    Platform,
};
pub use regs::{MmioBank, Reg, RegisterBank, RegisterLayout};
pub use stats::{IrqStats, IrqStatsSnapshot};
pub use sync::{IrqSpinLock, LocalIrq, LocalIrqGuard};
pub use vector::VectorAllocation;

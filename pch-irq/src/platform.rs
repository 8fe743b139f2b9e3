//! # Platform Collaborators
//!
//! Interfaces this controller requires from the rest of the kernel: the
//! interrupt descriptor registry, topology/affinity configuration,
//! inter-processor notification, handler invocation and the PCI MSI layer.

use core::fmt;

use crate::cpumask::CpuMask;
use crate::line::IrqLine;
use crate::msi::MsiMessage;
use crate::sync::LocalIrq;

/// Owner of the global interrupt descriptor id space
pub trait DescriptorRegistry {
    /// Reserve the lowest free id at or above `from`
    fn allocate(&self, from: usize) -> Option<IrqLine>;

    /// Release an id
    fn free(&self, line: IrqLine);

    /// Bind a newly allocated MSI vector to its descriptor
    fn bind_msi(&self, line: IrqLine);
}

/// Source of topology and affinity configuration
pub trait AffinityResolver {
    /// Cores currently online and accepting interrupts
    fn active_cores(&self) -> CpuMask;

    /// Cores eligible to service `line`
    fn affinity_of(&self, line: IrqLine) -> CpuMask;

    /// Record a new affinity for `line`
    fn set_affinity(&self, line: IrqLine, mask: CpuMask);
}

/// One-way notification to another core
pub trait CrossCoreNotifier {
    /// Raise notification bit `bit` on `core`
    fn send(&self, core: usize, bit: u32);
}

/// Invokes the handler registered for a line on the current core
pub trait LocalHandler {
    /// Run the handler for `line`
    fn dispatch(&self, line: IrqLine);
}

/// PCI MSI transport for dynamically allocated vectors
pub trait MessageTransport {
    /// Program the device with the routing message for `line`
    fn write_routing_message(&self, line: IrqLine, msg: MsiMessage);

    /// Mask the vector at the device
    fn mask(&self, line: IrqLine);

    /// Unmask the vector at the device
    fn unmask(&self, line: IrqLine);
}

/// Bundle of platform collaborators
#[derive(Clone, Copy)]
pub struct Platform<'a> {
    /// Descriptor id space
    pub registry: &'a dyn DescriptorRegistry,
    /// Topology and affinity
    pub affinity: &'a dyn AffinityResolver,
    /// Cross-core notification
    pub notifier: &'a dyn CrossCoreNotifier,
    /// Local handler invocation
    pub handler: &'a dyn LocalHandler,
    /// MSI transport
    pub transport: &'a dyn MessageTransport,
    /// Local interrupt control
    pub local_irq: &'a dyn LocalIrq,
}

impl fmt::Debug for Platform<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}

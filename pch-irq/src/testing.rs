//! # Test Doubles
//!
//! In-memory register bank and recording collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::config::PchConfig;
use crate::controller::PchIrq;
use crate::cpumask::CpuMask;
use crate::line::{IrqLine, NR_LINES};
use crate::msi::MsiMessage;
use crate::platform::{
    AffinityResolver, CrossCoreNotifier, DescriptorRegistry, LocalHandler, MessageTransport,
    Platform,
};
use crate::regs::{Reg, RegisterBank};
use crate::sync::LocalIrq;

// ============================================================================
// Register Bank
// ============================================================================

#[derive(Default)]
struct BankState {
    regs: HashMap<Reg, u64>,
    writes: Vec<(Reg, u64)>,
    inject: HashMap<Reg, u64>,
}

/// Register bank backed by memory
///
/// Clones share state. Writes follow the hardware side effects the
/// controller relies on:
/// - HT vector groups are write-1-to-clear
/// - the bridge and LPC clear registers clear the matching status bits
/// - the router enable-set register ORs into the enable register
#[derive(Clone, Default)]
pub struct FakeBank {
    state: Rc<RefCell<BankState>>,
}

impl FakeBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, without side effects
    pub fn get(&self, reg: Reg) -> u64 {
        self.state.borrow().regs.get(&reg).copied().unwrap_or(0)
    }

    /// Store a value as the hardware would latch it
    pub fn set(&self, reg: Reg, value: u64) {
        self.state
            .borrow_mut()
            .regs
            .insert(reg, value & reg.width().mask());
    }

    /// Every write issued through [`RegisterBank::write`], in order
    pub fn writes(&self) -> Vec<(Reg, u64)> {
        self.state.borrow().writes.clone()
    }

    /// Raise `bits` in `reg` right after its next read
    pub fn inject_after_read(&self, reg: Reg, bits: u64) {
        self.state.borrow_mut().inject.insert(reg, bits);
    }

    fn update(state: &mut BankState, reg: Reg, f: impl FnOnce(u64) -> u64) {
        let value = state.regs.get(&reg).copied().unwrap_or(0);
        state.regs.insert(reg, f(value) & reg.width().mask());
    }
}

impl RegisterBank for FakeBank {
    fn read(&self, reg: Reg) -> u64 {
        let mut state = self.state.borrow_mut();
        let value = state.regs.get(&reg).copied().unwrap_or(0);
        if let Some(bits) = state.inject.remove(&reg) {
            Self::update(&mut state, reg, |v| v | bits);
        }
        value
    }

    fn write(&self, reg: Reg, value: u64) {
        let mut state = self.state.borrow_mut();
        let value = value & reg.width().mask();
        state.writes.push((reg, value));

        match reg {
            Reg::HtIntVector(_) => Self::update(&mut state, reg, |v| v & !value),
            Reg::IntClear => Self::update(&mut state, Reg::IntStatus, |v| v & !value),
            Reg::LpcIntClear => Self::update(&mut state, Reg::LpcIntStatus, |v| v & !value),
            Reg::RouterIntEnSet => Self::update(&mut state, Reg::RouterIntEn, |v| v | value),
            _ => {
                state.regs.insert(reg, value);
            },
        }
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Records handler invocations and the mask register seen by each
pub struct RecordingHandler {
    bank: FakeBank,
    calls: RefCell<Vec<(IrqLine, u64)>>,
}

impl RecordingHandler {
    pub fn new(bank: FakeBank) -> Self {
        Self {
            bank,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn lines(&self) -> Vec<IrqLine> {
        self.calls.borrow().iter().map(|&(line, _)| line).collect()
    }

    pub fn masks_seen(&self) -> Vec<u64> {
        self.calls.borrow().iter().map(|&(_, mask)| mask).collect()
    }
}

impl LocalHandler for RecordingHandler {
    fn dispatch(&self, line: IrqLine) {
        let mask = self.bank.get(Reg::IntMask);
        self.calls.borrow_mut().push((line, mask));
    }
}

/// Records cross-core notifications
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<(usize, u32)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(usize, u32)> {
        self.sent.borrow().clone()
    }
}

impl CrossCoreNotifier for RecordingNotifier {
    fn send(&self, core: usize, bit: u32) {
        self.sent.borrow_mut().push((core, bit));
    }
}

/// Fixed topology with per-line affinity overrides
pub struct StaticAffinity {
    active: Cell<CpuMask>,
    default: Cell<CpuMask>,
    lines: RefCell<HashMap<IrqLine, CpuMask>>,
}

impl StaticAffinity {
    /// Core 0 active, every line eligible everywhere
    pub fn new() -> Self {
        Self {
            active: Cell::new(CpuMask::single(0)),
            default: Cell::new(CpuMask::all()),
            lines: RefCell::new(HashMap::new()),
        }
    }

    pub fn set_active(&self, mask: CpuMask) {
        self.active.set(mask);
    }

    pub fn set_default(&self, mask: CpuMask) {
        self.default.set(mask);
    }

    pub fn set_affinity_for(&self, line: IrqLine, mask: CpuMask) {
        self.lines.borrow_mut().insert(line, mask);
    }

    /// Affinity recorded for `line`, if any
    pub fn stored(&self, line: IrqLine) -> Option<CpuMask> {
        self.lines.borrow().get(&line).copied()
    }
}

impl AffinityResolver for StaticAffinity {
    fn active_cores(&self) -> CpuMask {
        self.active.get()
    }

    fn affinity_of(&self, line: IrqLine) -> CpuMask {
        self.stored(line).unwrap_or_else(|| self.default.get())
    }

    fn set_affinity(&self, line: IrqLine, mask: CpuMask) {
        self.set_affinity_for(line, mask);
    }
}

/// Lowest-free-id registry
pub struct SeqRegistry {
    limit: Cell<usize>,
    used: RefCell<BTreeSet<u16>>,
    bound: RefCell<Vec<IrqLine>>,
}

impl SeqRegistry {
    pub fn new() -> Self {
        Self {
            limit: Cell::new(NR_LINES),
            used: RefCell::new(BTreeSet::new()),
            bound: RefCell::new(Vec::new()),
        }
    }

    /// Ids at or above `limit` are never handed out
    pub fn set_limit(&self, limit: usize) {
        self.limit.set(limit);
    }

    /// Number of ids in use
    pub fn allocated(&self) -> usize {
        self.used.borrow().len()
    }

    /// Lines bound as MSI vectors, in order
    pub fn bound(&self) -> Vec<IrqLine> {
        self.bound.borrow().clone()
    }
}

impl DescriptorRegistry for SeqRegistry {
    fn allocate(&self, from: usize) -> Option<IrqLine> {
        let mut used = self.used.borrow_mut();
        let id = (from..self.limit.get()).find(|&id| !used.contains(&(id as u16)))?;
        used.insert(id as u16);
        Some(IrqLine::from_raw(id as u16))
    }

    fn free(&self, line: IrqLine) {
        self.used.borrow_mut().remove(&line.raw());
    }

    fn bind_msi(&self, line: IrqLine) {
        self.bound.borrow_mut().push(line);
    }
}

/// Records routing messages and device-side masking
#[derive(Default)]
pub struct RecordingTransport {
    messages: RefCell<Vec<(IrqLine, MsiMessage)>>,
    masked: RefCell<BTreeSet<IrqLine>>,
}

impl RecordingTransport {
    pub fn messages(&self) -> Vec<(IrqLine, MsiMessage)> {
        self.messages.borrow().clone()
    }

    pub fn is_masked(&self, line: IrqLine) -> bool {
        self.masked.borrow().contains(&line)
    }
}

impl MessageTransport for RecordingTransport {
    fn write_routing_message(&self, line: IrqLine, msg: MsiMessage) {
        self.messages.borrow_mut().push((line, msg));
    }

    fn mask(&self, line: IrqLine) {
        self.masked.borrow_mut().insert(line);
    }

    fn unmask(&self, line: IrqLine) {
        self.masked.borrow_mut().remove(&line);
    }
}

/// Local interrupt flag
pub struct FakeLocalIrq {
    enabled: Cell<bool>,
}

impl FakeLocalIrq {
    /// Starts with interrupts enabled
    pub fn new() -> Self {
        Self {
            enabled: Cell::new(true),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl LocalIrq for FakeLocalIrq {
    fn disable(&self) -> bool {
        self.enabled.replace(false)
    }

    fn enable(&self) {
        self.enabled.set(true);
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// Every double a controller needs
pub struct Fakes {
    pub bank: FakeBank,
    pub handler: RecordingHandler,
    pub notifier: RecordingNotifier,
    pub affinity: StaticAffinity,
    pub registry: SeqRegistry,
    pub transport: RecordingTransport,
    pub local_irq: FakeLocalIrq,
}

impl Fakes {
    pub fn new() -> Self {
        let bank = FakeBank::new();
        Self {
            handler: RecordingHandler::new(bank.clone()),
            bank,
            notifier: RecordingNotifier::default(),
            affinity: StaticAffinity::new(),
            registry: SeqRegistry::new(),
            transport: RecordingTransport::default(),
            local_irq: FakeLocalIrq::new(),
        }
    }

    pub fn platform(&self) -> Platform<'_> {
        Platform {
            registry: &self.registry,
            affinity: &self.affinity,
            notifier: &self.notifier,
            handler: &self.handler,
            transport: &self.transport,
            local_irq: &self.local_irq,
        }
    }

    /// Controller over a clone of the bank; init is left to the test
    pub fn controller(&self, config: PchConfig) -> PchIrq<'_, FakeBank> {
        PchIrq::new(self.bank.clone(), config, self.platform()).expect("valid config")
    }
}

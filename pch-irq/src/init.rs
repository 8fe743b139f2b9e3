//! # Initialization
//!
//! Programs the router, bridge and LPC blocks for the configured delivery
//! mode. The mode is chosen once here and never changes afterwards.
//!
//! ```text
//!   UART0/UART1 ─────────────────────────────► boot core, pin 0
//!   bridge lines ──► bridge output 1
//!     edge-vector: ──► HT vector = line id ──► HT groups ──► boot core, pin 1
//!     level:       ──► system input 0 ───────────────────► boot core, pin 1
//! ```

use core::sync::atomic::Ordering;

use crate::config::DeliveryMode;
use crate::controller::PchIrq;
use crate::error::IrqResult;
use crate::line::{LPC_OFFSET, PCH_IRQ_BASE, PCH_LINES};
use crate::regs::{
    route_core_pin, router, Reg, RegisterBank, RouterInputs, LPC_CTL_ENABLE, LPC_STATUS_BITS,
};

/// Delivery pin for the console UARTs
const UART_PIN: u8 = 0;

/// Delivery pin for bridge interrupts
const BRIDGE_PIN: u8 = 1;

/// Bridge output every line is routed to
const BRIDGE_OUTPUT: u64 = 1;

impl<B: RegisterBank> PchIrq<'_, B> {
    /// Program the hardware and reset the routing tables
    pub fn init(&self) -> IrqResult<()> {
        let boot = self.config.boot_core;

        self.bank
            .write(Reg::RouterEntry(router::UART0), route_core_pin(boot, UART_PIN) as u64);
        self.bank
            .write(Reg::RouterEntry(router::UART1), route_core_pin(boot, UART_PIN) as u64);
        self.enable_router_inputs(RouterInputs::UART0 | RouterInputs::UART1);

        for bit in 0..PCH_LINES as u8 {
            self.bank.write(Reg::RouteEntry(bit), BRIDGE_OUTPUT);
        }

        match self.config.delivery {
            DeliveryMode::EdgeVector => self.init_edge_vector(),
            DeliveryMode::Level => self.init_level(),
        }

        self.bank.write(Reg::IntEdge, 0);
        self.bank.write(Reg::IntStatus, 0);
        {
            let _guard = self.mask_lock.lock(self.platform.local_irq);
            self.bank.write(Reg::IntMask, !(1u64 << LPC_OFFSET));
        }
        self.bank.write(Reg::IntClear, u64::MAX);

        self.bank.write(Reg::LpcIntCtl, LPC_CTL_ENABLE);
        self.bank.write(Reg::LpcIntClear, LPC_STATUS_BITS);

        self.indirection.reset();
        self.router.reset();
        if self.config.delivery == DeliveryMode::Level {
            for &line in self.config.forwarded_lines {
                self.indirection.assign(line);
            }
        }

        self.initialized.store(true, Ordering::Release);
        log::info!(
            "PCH: {:?} delivery on core {}, {} vector groups, {} forwarded lines",
            self.config.delivery,
            boot,
            self.config.msi_groups,
            self.indirection.assigned()
        );
        Ok(())
    }

    fn init_edge_vector(&self) {
        let boot = self.config.boot_core;
        for group in 0..self.config.msi_groups as u8 {
            self.bank.write(
                Reg::RouterEntry(router::HT1_BASE + group),
                route_core_pin(boot, BRIDGE_PIN) as u64,
            );
            self.bank.write(Reg::HtIntEnable(group), 0xFFFF_FFFF);
        }
        self.enable_router_inputs(RouterInputs::HT1_ALL);

        for bit in 0..PCH_LINES as u8 {
            self.bank
                .write(Reg::HtMsiVector(bit), (PCH_IRQ_BASE as u64) + bit as u64);
        }
        self.bank.write(Reg::HtMsiEnable, u64::MAX);
    }

    fn init_level(&self) {
        self.bank.write(
            Reg::RouterEntry(router::SYS_INT0),
            route_core_pin(self.config.boot_core, BRIDGE_PIN) as u64,
        );
        self.enable_router_inputs(RouterInputs::SYS_INT0);
    }

    fn enable_router_inputs(&self, inputs: RouterInputs) {
        let enabled = self.bank.read(Reg::RouterIntEn);
        self.bank
            .write(Reg::RouterIntEnSet, enabled | inputs.bits() as u64);
    }
}

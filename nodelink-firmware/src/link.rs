//! UART0 interrupt wiring
//!
//! The bridge and the PL011 FIFO it services live in a single static
//! slot. RX is unmasked inside the same critical section that fills the
//! slot, so the handler never sees it empty with a source pending.

use core::cell::RefCell;

use embassy_rp::interrupt::typelevel::{Handler, UART0_IRQ};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use nodelink_core::link::UartBridge;
use nodelink_hal_rp2040::Pl011Fifo;

/// RX ring capacity; holds a full `ATI` answer plus unsolicited codes
pub const RX_SIZE: usize = 256;
/// TX ring capacity; a command line or one payload
pub const TX_SIZE: usize = 128;

pub type Bridge = UartBridge<'static, RX_SIZE, TX_SIZE>;

static BRIDGE: Mutex<CriticalSectionRawMutex, RefCell<Option<(Bridge, Pl011Fifo)>>> =
    Mutex::new(RefCell::new(None));

/// Install the bridge and unmask RX
pub fn install(bridge: Bridge, fifo: Pl011Fifo) {
    BRIDGE.lock(|slot| {
        let mut slot = slot.borrow_mut();
        let (bridge, fifo) = slot.insert((bridge, fifo));
        bridge.start(fifo);
    });
}

/// UART0 handler servicing the installed bridge
pub struct UartIrq;

impl Handler<UART0_IRQ> for UartIrq {
    unsafe fn on_interrupt() {
        BRIDGE.lock(|slot| {
            if let Some((bridge, fifo)) = slot.borrow_mut().as_mut() {
                bridge.on_interrupt(fifo);
            }
        });
    }
}

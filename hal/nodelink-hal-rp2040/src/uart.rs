//! PL011 UART FIFO access
//!
//! The peripheral is configured (pins, baud rate, frame format) through
//! embassy-rp's blocking driver. After that, [`Pl011Fifo`] owns the data
//! register and is moved into the interrupt handler, while
//! [`Pl011TxInterrupt`] stays in the foreground to re-arm transmission.
//!
//! Interrupt sources used:
//! - RXIM: receive FIFO at or above its trigger level
//! - RTIM: receive timeout, fires for a short tail below the trigger
//! - TXIM: transmit FIFO at or below its trigger level

use embassy_rp::interrupt::{self, Interrupt, InterruptExt};
use embassy_rp::pac;
use embassy_rp::uart::{self as rp_uart, Blocking, Uart};
use nodelink_hal::uart::{DataBits, Parity, StopBits, TxInterrupt, UartConfig, UartFifo};

/// Receive FIFO trigger at 1/2 full
const RX_TRIGGER_HALF: u8 = 0b010;
/// Transmit FIFO trigger at 1/8 full
const TX_TRIGGER_EIGHTH: u8 = 0b000;

/// All interrupt clear bits in UARTICR
const ICR_ALL: u32 = 0x7FF;

/// Translate a board-independent UART configuration
pub fn embassy_config(config: &UartConfig) -> rp_uart::Config {
    let mut cfg = rp_uart::Config::default();
    cfg.baudrate = config.baudrate;
    cfg.data_bits = match config.data_bits {
        DataBits::Seven => rp_uart::DataBits::DataBits7,
        DataBits::Eight => rp_uart::DataBits::DataBits8,
    };
    cfg.parity = match config.parity {
        Parity::None => rp_uart::Parity::ParityNone,
        Parity::Even => rp_uart::Parity::ParityEven,
        Parity::Odd => rp_uart::Parity::ParityOdd,
    };
    cfg.stop_bits = match config.stop_bits {
        StopBits::One => rp_uart::StopBits::STOP1,
        StopBits::Two => rp_uart::StopBits::STOP2,
    };
    cfg
}

/// Interrupt-side PL011 FIFO
pub struct Pl011Fifo {
    regs: pac::uart::Uart,
    // Keeps the pins and peripheral configured
    _uart: Uart<'static, Blocking>,
}

/// Foreground handle re-arming the TX interrupt
#[derive(Clone, Copy)]
pub struct Pl011TxInterrupt {
    regs: pac::uart::Uart,
    irq: Interrupt,
}

impl Pl011Fifo {
    /// Take over UART0 from a configured blocking driver
    ///
    /// Interrupt sources start masked and the NVIC line is enabled; the
    /// bridge's `start` unmasks RX.
    pub fn uart0(uart: Uart<'static, Blocking>) -> (Self, Pl011TxInterrupt) {
        Self::take(uart, pac::UART0, interrupt::UART0_IRQ)
    }

    fn take(
        uart: Uart<'static, Blocking>,
        regs: pac::uart::Uart,
        irq: Interrupt,
    ) -> (Self, Pl011TxInterrupt) {
        critical_section::with(|_| {
            regs.uartimsc().write(|w| w.0 = 0);
        });
        regs.uartifls().write(|w| {
            w.set_rxiflsel(RX_TRIGGER_HALF);
            w.set_txiflsel(TX_TRIGGER_EIGHTH);
        });
        regs.uarticr().write(|w| w.0 = ICR_ALL);

        irq.unpend();
        // SAFETY: the handler bound to this interrupt only touches the
        // FIFO through the bridge slot, which is filled before RX is
        // unmasked.
        unsafe { irq.enable() };

        (Self { regs, _uart: uart }, Pl011TxInterrupt { regs, irq })
    }

    fn set_mask(&mut self, f: impl FnOnce(&mut pac::uart::regs::Uartimsc)) {
        critical_section::with(|_| self.regs.uartimsc().modify(f));
    }
}

impl UartFifo for Pl011Fifo {
    fn rx_ready(&self) -> bool {
        !self.regs.uartfr().read().rxfe()
    }

    fn tx_ready(&self) -> bool {
        self.regs.uartimsc().read().txim() && !self.regs.uartfr().read().txff()
    }

    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        while n < buf.len() && !self.regs.uartfr().read().rxfe() {
            // Framing/parity/overrun flags ride along in the upper bits
            buf[n] = self.regs.uartdr().read().data();
            n += 1;
        }
        n
    }

    fn write_bytes(&mut self, data: &[u8]) -> usize {
        let mut n = 0;
        while n < data.len() && !self.regs.uartfr().read().txff() {
            let byte = data[n];
            self.regs.uartdr().write(|w| w.set_data(byte));
            n += 1;
        }
        n
    }

    fn set_rx_interrupt(&mut self, enabled: bool) {
        self.set_mask(|w| {
            w.set_rxim(enabled);
            w.set_rtim(enabled);
        });
    }

    fn set_tx_interrupt(&mut self, enabled: bool) {
        self.set_mask(|w| w.set_txim(enabled));
    }
}

impl TxInterrupt for Pl011TxInterrupt {
    fn enable_tx_interrupt(&mut self) {
        critical_section::with(|_| {
            self.regs.uartimsc().modify(|w| w.set_txim(true));
        });
        // TXIM only fires on a FIFO level crossing; an idle, empty FIFO
        // never crosses, so run the handler once by hand.
        self.irq.pend();
    }
}

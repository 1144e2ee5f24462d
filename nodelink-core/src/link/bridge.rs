//! UART interrupt bridge
//!
//! Moves bytes between the hardware FIFO and the two ring buffers. This is
//! the body of the UART interrupt handler: it never waits, never
//! allocates, and handles at most one scratch buffer per direction per
//! invocation.
//!
//! ```text
//!   UART RX FIFO ──► scratch ──► RX ring (Producer) ──► transport
//!   UART TX FIFO ◄── scratch ◄── TX ring (Consumer) ◄── transport
//! ```

use nodelink_hal::uart::UartFifo;

use super::stats::LinkStats;
use crate::buffer::{Consumer, Producer};

/// Bytes moved per direction per interrupt
pub const SCRATCH_SIZE: usize = 32;

/// Interrupt-side owner of the RX producer and TX consumer
pub struct UartBridge<'a, const RX: usize, const TX: usize> {
    rx: Producer<'a, RX>,
    tx: Consumer<'a, TX>,
    stats: &'a LinkStats,
}

impl<'a, const RX: usize, const TX: usize> UartBridge<'a, RX, TX> {
    /// Create a bridge from the interrupt-side ring halves
    pub fn new(rx: Producer<'a, RX>, tx: Consumer<'a, TX>, stats: &'a LinkStats) -> Self {
        Self { rx, tx, stats }
    }

    /// Enable the receive path; call once before unmasking the interrupt
    pub fn start<U: UartFifo>(&mut self, uart: &mut U) {
        uart.set_tx_interrupt(false);
        uart.set_rx_interrupt(true);
    }

    /// Service one UART interrupt
    pub fn on_interrupt<U: UartFifo>(&mut self, uart: &mut U) {
        self.stats.record_interrupt();

        if uart.rx_ready() {
            self.service_rx(uart);
        }
        if uart.tx_ready() {
            self.service_tx(uart);
        }
    }

    fn service_rx<U: UartFifo>(&mut self, uart: &mut U) {
        let mut scratch = [0u8; SCRATCH_SIZE];

        // With the ring full the FIFO is drained anyway and the bytes are
        // dropped, otherwise the RX interrupt would re-fire immediately.
        let space = self.rx.space_remaining();
        let want = if space == 0 {
            SCRATCH_SIZE
        } else {
            space.min(SCRATCH_SIZE)
        };

        let read = uart.read_available(&mut scratch[..want]);
        let accepted = self.rx.put(&scratch[..read]);
        self.stats.record_rx(accepted, read - accepted);
    }

    fn service_tx<U: UartFifo>(&mut self, uart: &mut U) {
        let mut scratch = [0u8; SCRATCH_SIZE];

        let queued = self.tx.peek(&mut scratch);
        if queued == 0 {
            uart.set_tx_interrupt(false);
            return;
        }

        // Only what the FIFO accepted leaves the ring
        let sent = uart.write_bytes(&scratch[..queued]);
        self.tx.consume(sent);
        self.stats.record_tx(sent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RingBuffer;
    use crate::testing::FakeUart;
    use core::cell::Cell;

    #[test]
    fn test_rx_moves_bytes_into_ring() {
        let mut rx_ring = RingBuffer::<16>::new();
        let mut tx_ring = RingBuffer::<16>::new();
        let stats = LinkStats::new();
        let tx_irq = Cell::new(false);
        let (rx_prod, mut rx_cons) = rx_ring.split();
        let (_tx_prod, tx_cons) = tx_ring.split();
        let mut bridge = UartBridge::new(rx_prod, tx_cons, &stats);

        let mut uart = FakeUart::new(&tx_irq, 16);
        uart.inject(b"\r\nOK\r\n");
        bridge.on_interrupt(&mut uart);

        let mut out = [0u8; 16];
        let n = rx_cons.get(&mut out);
        assert_eq!(&out[..n], b"\r\nOK\r\n");
        assert_eq!(stats.snapshot().rx_bytes, 6);
        assert_eq!(stats.rx_dropped(), 0);
    }

    #[test]
    fn test_rx_reads_at_most_scratch_per_interrupt() {
        let mut rx_ring = RingBuffer::<128>::new();
        let mut tx_ring = RingBuffer::<16>::new();
        let stats = LinkStats::new();
        let tx_irq = Cell::new(false);
        let (rx_prod, rx_cons) = rx_ring.split();
        let (_tx_prod, tx_cons) = tx_ring.split();
        let mut bridge = UartBridge::new(rx_prod, tx_cons, &stats);

        let mut uart = FakeUart::new(&tx_irq, 16);
        uart.inject(&[b'x'; SCRATCH_SIZE + 5]);
        bridge.on_interrupt(&mut uart);
        assert_eq!(rx_cons.len(), SCRATCH_SIZE);
        assert_eq!(uart.rx_pending(), 5);

        bridge.on_interrupt(&mut uart);
        assert_eq!(rx_cons.len(), SCRATCH_SIZE + 5);
    }

    #[test]
    fn test_rx_overrun_drops_and_counts() {
        let mut rx_ring = RingBuffer::<4>::new();
        let mut tx_ring = RingBuffer::<4>::new();
        let stats = LinkStats::new();
        let tx_irq = Cell::new(false);
        let (rx_prod, mut rx_cons) = rx_ring.split();
        let (_tx_prod, tx_cons) = tx_ring.split();
        let mut bridge = UartBridge::new(rx_prod, tx_cons, &stats);

        let mut uart = FakeUart::new(&tx_irq, 16);
        uart.inject(b"ABCDEFG");

        // Ring takes what fits, leaving the rest in the FIFO
        bridge.on_interrupt(&mut uart);
        assert_eq!(rx_cons.len(), 4);
        assert_eq!(stats.rx_dropped(), 0);

        // Ring full: FIFO drained, bytes dropped and counted
        bridge.on_interrupt(&mut uart);
        assert_eq!(uart.rx_pending(), 0);
        assert_eq!(stats.rx_dropped(), 3);

        let mut out = [0u8; 8];
        let n = rx_cons.get(&mut out);
        assert_eq!(&out[..n], b"ABCD");
    }

    #[test]
    fn test_tx_drains_ring_then_disables_interrupt() {
        let mut rx_ring = RingBuffer::<16>::new();
        let mut tx_ring = RingBuffer::<16>::new();
        let stats = LinkStats::new();
        let tx_irq = Cell::new(false);
        let (rx_prod, _rx_cons) = rx_ring.split();
        let (mut tx_prod, tx_cons) = tx_ring.split();
        let mut bridge = UartBridge::new(rx_prod, tx_cons, &stats);

        let mut uart = FakeUart::new(&tx_irq, 16);
        tx_prod.put(b"AT+GMI\r");
        tx_irq.set(true);

        bridge.on_interrupt(&mut uart);
        assert_eq!(uart.wire(), b"AT+GMI\r");
        assert!(tx_prod.is_empty());
        assert!(tx_irq.get());

        // Next TX-ready with nothing queued turns the source off
        bridge.on_interrupt(&mut uart);
        assert!(!tx_irq.get());
        assert_eq!(stats.snapshot().tx_bytes, 7);
    }

    #[test]
    fn test_tx_keeps_what_fifo_refused() {
        let mut rx_ring = RingBuffer::<16>::new();
        let mut tx_ring = RingBuffer::<16>::new();
        let stats = LinkStats::new();
        let tx_irq = Cell::new(true);
        let (rx_prod, _rx_cons) = rx_ring.split();
        let (mut tx_prod, tx_cons) = tx_ring.split();
        let mut bridge = UartBridge::new(rx_prod, tx_cons, &stats);

        // FIFO accepts 3 bytes per interrupt
        let mut uart = FakeUart::new(&tx_irq, 3);
        tx_prod.put(b"ATI\r\n");

        bridge.on_interrupt(&mut uart);
        assert_eq!(uart.wire(), b"ATI");
        assert_eq!(tx_prod.len(), 2);

        bridge.on_interrupt(&mut uart);
        assert_eq!(uart.wire(), b"ATI\r\n");
        assert!(tx_prod.is_empty());
    }

    #[test]
    fn test_start_arms_rx_only() {
        let mut rx_ring = RingBuffer::<4>::new();
        let mut tx_ring = RingBuffer::<4>::new();
        let stats = LinkStats::new();
        let tx_irq = Cell::new(true);
        let (rx_prod, _rx_cons) = rx_ring.split();
        let (_tx_prod, tx_cons) = tx_ring.split();
        let mut bridge = UartBridge::new(rx_prod, tx_cons, &stats);

        let mut uart = FakeUart::new(&tx_irq, 16);
        bridge.start(&mut uart);
        assert!(uart.rx_interrupt_enabled());
        assert!(!tx_irq.get());
    }
}

//! Synchronous AT command transport
//!
//! Turns the two interrupt-fed rings into a request/response call. One
//! transaction runs at a time:
//!
//! 1. [`AtTransport::begin`] flushes stale RX bytes, queues the command
//!    and arms the TX interrupt.
//! 2. [`AtTransport::poll`] drains RX into the caller's buffer and checks
//!    for the terminator, a full buffer, or the deadline.
//! 3. The first terminal outcome is returned and the transport is idle
//!    again.
//!
//! [`AtTransport::send_command`] runs both steps, pausing one poll
//! interval between polls.

use core::task::Poll;

use nodelink_hal::uart::TxInterrupt;
use nodelink_protocol::Terminator;

use super::state::{TransportEvent, TransportState};
use crate::buffer::{Consumer, Producer};
use crate::traits::{Clock, ModemReady};

/// Default pause between polls in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;

/// Errors returned to the caller of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// A transaction is already in flight
    Busy,
    /// The command does not fit in the TX ring; nothing was queued
    CommandTooLarge,
    /// No terminator before the deadline
    Timeout,
    /// `poll` called with no transaction in flight
    NotStarted,
}

/// Transport settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Pause between polls in milliseconds
    pub poll_interval_ms: u32,
    /// Terminator used when a command does not supply its own
    pub terminator: Terminator,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            terminator: Terminator::final_result(),
        }
    }
}

struct Transaction {
    terminator: Terminator,
    deadline_ms: u64,
    received: usize,
}

/// AT command transport over a pair of ring buffer halves
///
/// Owns the RX consumer and TX producer; the interrupt-side halves belong
/// to the [`UartBridge`](crate::link::UartBridge).
pub struct AtTransport<'a, const RX: usize, const TX: usize, I, C> {
    rx: Consumer<'a, RX>,
    tx: Producer<'a, TX>,
    irq: I,
    clock: C,
    poll_interval_ms: u32,
    terminator: Terminator,
    state: TransportState,
    active: Option<Transaction>,
    flushed: usize,
}

impl<'a, const RX: usize, const TX: usize, I, C> AtTransport<'a, RX, TX, I, C>
where
    I: TxInterrupt,
    C: Clock,
{
    /// Create a transport for a booted modem
    pub fn new(
        rx: Consumer<'a, RX>,
        tx: Producer<'a, TX>,
        irq: I,
        clock: C,
        config: TransportConfig,
        _ready: ModemReady,
    ) -> Self {
        Self {
            rx,
            tx,
            irq,
            clock,
            poll_interval_ms: config.poll_interval_ms.max(1),
            terminator: config.terminator,
            state: TransportState::Idle,
            active: None,
            flushed: 0,
        }
    }

    /// Current transaction state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Check if a transaction is in flight
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Default terminator
    pub fn terminator(&self) -> &Terminator {
        &self.terminator
    }

    /// Replace the default terminator for subsequent commands
    pub fn set_terminator(&mut self, terminator: Terminator) {
        self.terminator = terminator;
    }

    /// Pause between polls in milliseconds
    pub fn poll_interval_ms(&self) -> u32 {
        self.poll_interval_ms
    }

    /// Stale RX bytes discarded when the last transaction started
    pub fn flushed_on_entry(&self) -> usize {
        self.flushed
    }

    /// Start a transaction with the default terminator
    pub fn begin(&mut self, cmd: &[u8], timeout_ms: u32) -> Result<(), TransportError> {
        let terminator = self.terminator.clone();
        self.begin_with(cmd, timeout_ms, terminator)
    }

    /// Start a transaction with its own terminator
    ///
    /// An empty `cmd` queues nothing and only listens, which is how
    /// unsolicited result codes such as `RDY` are awaited.
    pub fn begin_with(
        &mut self,
        cmd: &[u8],
        timeout_ms: u32,
        terminator: Terminator,
    ) -> Result<(), TransportError> {
        if self.state != TransportState::Idle {
            return Err(TransportError::Busy);
        }
        // All or nothing: we are the only producer, so the check holds
        if cmd.len() > self.tx.space_remaining() {
            return Err(TransportError::CommandTooLarge);
        }

        self.flushed = self.rx.clear();

        if !cmd.is_empty() {
            self.tx.put(cmd);
            self.irq.enable_tx_interrupt();
        }

        let now = self.clock.now_ms();
        self.active = Some(Transaction {
            terminator,
            deadline_ms: now + timeout_ms as u64,
            received: 0,
        });
        self.state = self.state.transition(TransportEvent::Submitted);
        Ok(())
    }

    /// Advance the transaction in flight
    ///
    /// `response` must be the same buffer on every poll of one
    /// transaction; its length is the response capacity. Returns the
    /// response length on success: up to and including the terminator,
    /// or `response.len()` when the buffer filled first. Bytes that
    /// arrived after the terminator stay in the RX ring and are flushed
    /// when the next transaction begins.
    pub fn poll(&mut self, response: &mut [u8]) -> Poll<Result<usize, TransportError>> {
        let Some(txn) = self.active.as_mut() else {
            return Poll::Ready(Err(TransportError::NotStarted));
        };

        if self.state == TransportState::Sending && self.tx.is_empty() {
            self.state = self.state.transition(TransportEvent::TxDrained);
        }

        let before = txn.received.min(response.len());
        let peeked = self.rx.peek(&mut response[before..]);
        let found = txn.terminator.find(&response[..before + peeked], before);
        // Only take bytes up to the terminator; the tail stays queued
        let kept = found.unwrap_or(before + peeked);
        self.rx.consume(kept.saturating_sub(before));
        txn.received = kept;

        let outcome = if let Some(end) = found {
            Some((TransportEvent::TerminatorSeen, Ok(end)))
        } else if txn.received == response.len() {
            Some((TransportEvent::CapacityReached, Ok(txn.received)))
        } else if self.clock.now_ms() >= txn.deadline_ms {
            Some((TransportEvent::DeadlineElapsed, Err(TransportError::Timeout)))
        } else {
            None
        };

        match outcome {
            Some((event, result)) => {
                self.state = self.state.transition(event);
                self.finish();
                Poll::Ready(result)
            }
            None => Poll::Pending,
        }
    }

    fn finish(&mut self) {
        self.active = None;
        self.state = self.state.transition(TransportEvent::Finished);
    }

    /// Send a command and wait for its response
    pub fn send_command(
        &mut self,
        cmd: &[u8],
        response: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, TransportError> {
        self.begin(cmd, timeout_ms)?;
        self.wait(response)
    }

    /// Send a command with its own terminator and wait for its response
    pub fn send_command_with(
        &mut self,
        cmd: &[u8],
        response: &mut [u8],
        timeout_ms: u32,
        terminator: Terminator,
    ) -> Result<usize, TransportError> {
        self.begin_with(cmd, timeout_ms, terminator)?;
        self.wait(response)
    }

    fn wait(&mut self, response: &mut [u8]) -> Result<usize, TransportError> {
        loop {
            match self.poll(response) {
                Poll::Ready(result) => return result,
                Poll::Pending => self.clock.pause(self.poll_interval_ms),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RingBuffer;
    use crate::link::{LinkStats, UartBridge};
    use crate::testing::{FakeUart, SimClock, SimTxIrq};
    use core::cell::Cell;

    type SimTransport<'a, const RX: usize, const TX: usize> =
        AtTransport<'a, RX, TX, SimTxIrq<'a>, SimClock<'a, RX, TX>>;

    /// Build rings, bridge, simulated modem and transport, then run `f`
    fn with_sim<const RX: usize, const TX: usize>(
        f: impl FnOnce(&mut SimTransport<'_, RX, TX>, &SimClock<'_, RX, TX>),
    ) {
        let mut rx_ring = RingBuffer::<RX>::new();
        let mut tx_ring = RingBuffer::<TX>::new();
        let stats = LinkStats::new();
        let tx_armed = Cell::new(false);

        let (rx_prod, rx_cons) = rx_ring.split();
        let (tx_prod, tx_cons) = tx_ring.split();
        let bridge = UartBridge::new(rx_prod, tx_cons, &stats);
        let clock = SimClock::new(bridge, FakeUart::new(&tx_armed, 16), &stats);

        let mut transport = AtTransport::new(
            rx_cons,
            tx_prod,
            SimTxIrq(&tx_armed),
            clock.clone(),
            TransportConfig::default(),
            ModemReady::assume_booted(),
        );
        f(&mut transport, &clock);
    }

    #[test]
    fn test_ati_round_trip() {
        with_sim::<256, 64>(|t, sim| {
            sim.reply(&[(3, b"ATI\r\r\nQuectel\r\nBG96\r\n\r\nOK\r\n")]);

            let mut rsp = [0u8; 64];
            let n = t.send_command(b"ATI\r", &mut rsp, 1000).unwrap();
            assert_eq!(&rsp[..n], b"ATI\r\r\nQuectel\r\nBG96\r\n\r\nOK\r\n");
            assert_eq!(sim.wire(), b"ATI\r");
            assert_eq!(t.state(), TransportState::Idle);
        });
    }

    #[test]
    fn test_sentinel_fills_small_buffer_exactly() {
        with_sim::<64, 32>(|t, sim| {
            sim.reply(&[(2, b"OK\r\nEND")]);

            let mut rsp = [0u8; 8];
            let end = Terminator::sentinel(b"END").unwrap();
            let n = t.send_command_with(b"AT\r", &mut rsp, 500, end).unwrap();
            assert_eq!(n, 7);
            assert_eq!(&rsp[..n], b"OK\r\nEND");
        });
    }

    #[test]
    fn test_terminator_at_capacity_boundary() {
        with_sim::<64, 32>(|t, sim| {
            sim.reply(&[(2, b"\r\nOK\r\n")]);

            let mut rsp = [0u8; 6];
            let n = t.send_command(b"AT\r", &mut rsp, 500).unwrap();
            assert_eq!(n, 6);
            assert_eq!(&rsp, b"\r\nOK\r\n");
        });
    }

    #[test]
    fn test_truncated_response() {
        with_sim::<64, 32>(|t, sim| {
            sim.reply(&[(2, b"\r\nQuectel\r\nBG96\r\n\r\nOK\r\n")]);

            let mut rsp = [0u8; 10];
            let n = t.send_command(b"ATI\r", &mut rsp, 500).unwrap();
            assert_eq!(n, rsp.len());
            assert_eq!(&rsp, b"\r\nQuectel\r");
        });
    }

    #[test]
    fn test_partial_arrivals_accumulate() {
        with_sim::<64, 32>(|t, sim| {
            sim.reply(&[
                (5, b"\r\n+CSQ: 1"),
                (40, b"8,99\r\n\r\nO"),
                (95, b"K\r\n"),
            ]);

            let mut rsp = [0u8; 64];
            let n = t.send_command(b"AT+CSQ\r", &mut rsp, 1000).unwrap();
            assert_eq!(&rsp[..n], b"\r\n+CSQ: 18,99\r\n\r\nOK\r\n");
            assert!(sim.now() >= 96);
        });
    }

    #[test]
    fn test_timeout_within_one_poll_interval() {
        with_sim::<64, 32>(|t, sim| {
            sim.silent();

            let start = sim.now();
            let mut rsp = [0u8; 32];
            let result = t.send_command(b"AT+COPS?\r", &mut rsp, 300);
            assert_eq!(result, Err(TransportError::Timeout));

            let elapsed = sim.now() - start;
            assert!(elapsed >= 300);
            assert!(elapsed <= 300 + t.poll_interval_ms() as u64);
            assert_eq!(t.state(), TransportState::Idle);
        });
    }

    #[test]
    fn test_late_bytes_flushed_on_next_entry() {
        with_sim::<64, 32>(|t, sim| {
            // First answer shows up only after the caller gave up
            sim.reply(&[(200, b"\r\nlate\r\n")]);
            sim.reply(&[(2, b"\r\nOK\r\n")]);

            let mut rsp = [0u8; 32];
            assert_eq!(
                t.send_command(b"AT+A\r", &mut rsp, 50),
                Err(TransportError::Timeout)
            );
            sim.advance(300);

            let n = t.send_command(b"AT+B\r", &mut rsp, 500).unwrap();
            assert_eq!(t.flushed_on_entry(), 8);
            assert_eq!(&rsp[..n], b"\r\nOK\r\n");
        });
    }

    #[test]
    fn test_tail_after_terminator_counted_as_flushed() {
        with_sim::<64, 32>(|t, sim| {
            sim.reply(&[(2, b"\r\nOK\r\n+URC: 1\r\n")]);
            sim.reply(&[(2, b"\r\nOK\r\n")]);

            let mut rsp = [0u8; 32];
            let n = t.send_command(b"AT+A\r", &mut rsp, 500).unwrap();
            assert_eq!(&rsp[..n], b"\r\nOK\r\n");

            let n = t.send_command(b"AT+B\r", &mut rsp, 500).unwrap();
            assert_eq!(t.flushed_on_entry(), 9);
            assert_eq!(&rsp[..n], b"\r\nOK\r\n");
        });
    }

    #[test]
    fn test_busy_while_in_flight() {
        with_sim::<64, 32>(|t, sim| {
            sim.reply(&[(20, b"\r\nOK\r\n")]);

            t.begin(b"AT\r", 500).unwrap();
            assert!(t.is_busy());
            assert_eq!(t.begin(b"ATI\r", 500), Err(TransportError::Busy));

            let mut rsp = [0u8; 16];
            assert_eq!(
                t.send_command(b"ATI\r", &mut rsp, 500),
                Err(TransportError::Busy)
            );

            // The rejected commands never reached the wire
            sim.advance(5);
            assert_eq!(sim.wire(), b"AT\r");

            let mut polls = 0;
            let n = loop {
                match t.poll(&mut rsp) {
                    Poll::Ready(result) => break result.unwrap(),
                    Poll::Pending => {
                        polls += 1;
                        sim.advance(5);
                    }
                }
            };
            assert!(polls > 1);
            assert_eq!(&rsp[..n], b"\r\nOK\r\n");
            assert!(!t.is_busy());
        });
    }

    #[test]
    fn test_state_progression() {
        with_sim::<64, 32>(|t, sim| {
            sim.reply(&[(50, b"\r\nOK\r\n")]);

            let mut rsp = [0u8; 16];
            t.begin(b"AT\r", 500).unwrap();
            assert_eq!(t.state(), TransportState::Sending);

            sim.advance(2);
            assert!(t.poll(&mut rsp).is_pending());
            assert_eq!(t.state(), TransportState::AwaitingResponse);
        });
    }

    #[test]
    fn test_command_too_large_queues_nothing() {
        with_sim::<64, 8>(|t, sim| {
            let mut rsp = [0u8; 16];
            assert_eq!(
                t.send_command(b"AT+QIOPEN=1\r", &mut rsp, 100),
                Err(TransportError::CommandTooLarge)
            );
            assert_eq!(t.state(), TransportState::Idle);

            sim.advance(10);
            assert!(sim.wire().is_empty());
        });
    }

    #[test]
    fn test_poll_without_transaction() {
        with_sim::<16, 16>(|t, _sim| {
            let mut rsp = [0u8; 4];
            assert_eq!(t.poll(&mut rsp), Poll::Ready(Err(TransportError::NotStarted)));
        });
    }

    #[test]
    fn test_listen_only_for_urc() {
        with_sim::<64, 32>(|t, sim| {
            sim.emit_at(30, b"\r\nRDY\r\n");

            let mut rsp = [0u8; 16];
            let rdy = Terminator::empty().with_line(b"RDY").unwrap();
            let n = t.send_command_with(b"", &mut rsp, 500, rdy).unwrap();
            assert_eq!(&rsp[..n], b"\r\nRDY\r\n");
            assert!(sim.wire().is_empty());
        });
    }

    #[test]
    fn test_default_terminator_override() {
        with_sim::<64, 32>(|t, sim| {
            sim.reply(&[(2, b"\r\n> ")]);

            t.set_terminator(Terminator::prompt());
            let mut rsp = [0u8; 16];
            let n = t.send_command(b"AT+QISEND=0,4\r", &mut rsp, 500).unwrap();
            assert_eq!(&rsp[..n], b"\r\n> ");
        });
    }

    #[test]
    fn test_stats_track_both_directions() {
        with_sim::<64, 32>(|t, sim| {
            sim.reply(&[(2, b"\r\nOK\r\n")]);

            let mut rsp = [0u8; 16];
            t.send_command(b"AT\r", &mut rsp, 500).unwrap();
            let stats = sim.stats();
            assert_eq!(stats.tx_bytes, 3);
            assert_eq!(stats.rx_bytes, 6);
            assert_eq!(stats.rx_dropped, 0);
        });
    }
}

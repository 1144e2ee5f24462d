//! Host-side stand-ins for the UART, the modem and the clock
//!
//! [`SimClock`] owns a simulated link: a [`FakeUart`], the
//! [`UartBridge`] servicing it, and a scripted modem answering each
//! command line with timed reply chunks. Advancing the clock runs the
//! bridge once per simulated millisecond.

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use nodelink_hal::uart::{TxInterrupt, UartFifo};

use crate::link::{LinkSnapshot, LinkStats, UartBridge};
use crate::traits::Clock;

/// In-memory UART FIFO pair
pub struct FakeUart<'a> {
    tx_armed: &'a Cell<bool>,
    rx_irq: bool,
    rx_fifo: VecDeque<u8>,
    wire: Vec<u8>,
    tx_room: usize,
}

impl<'a> FakeUart<'a> {
    /// `tx_room` bytes are accepted per `write_bytes` call
    pub fn new(tx_armed: &'a Cell<bool>, tx_room: usize) -> Self {
        Self {
            tx_armed,
            rx_irq: false,
            rx_fifo: VecDeque::new(),
            wire: Vec::new(),
            tx_room,
        }
    }

    /// Bytes arriving from the modem
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx_fifo.extend(bytes.iter().copied());
    }

    pub fn rx_pending(&self) -> usize {
        self.rx_fifo.len()
    }

    /// Everything transmitted so far
    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    pub fn rx_interrupt_enabled(&self) -> bool {
        self.rx_irq
    }
}

impl UartFifo for FakeUart<'_> {
    fn rx_ready(&self) -> bool {
        !self.rx_fifo.is_empty()
    }

    fn tx_ready(&self) -> bool {
        self.tx_armed.get()
    }

    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        while n < buf.len() {
            match self.rx_fifo.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    fn write_bytes(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.tx_room);
        self.wire.extend_from_slice(&data[..n]);
        n
    }

    fn set_rx_interrupt(&mut self, enabled: bool) {
        self.rx_irq = enabled;
    }

    fn set_tx_interrupt(&mut self, enabled: bool) {
        self.tx_armed.set(enabled);
    }
}

/// Foreground TX interrupt handle sharing the flag with a [`FakeUart`]
pub struct SimTxIrq<'a>(pub &'a Cell<bool>);

impl TxInterrupt for SimTxIrq<'_> {
    fn enable_tx_interrupt(&mut self) {
        self.0.set(true);
    }
}

struct SimLink<'a, const RX: usize, const TX: usize> {
    now: u64,
    bridge: UartBridge<'a, RX, TX>,
    uart: FakeUart<'a>,
    stats: &'a LinkStats,
    /// One reply per command line, in order
    replies: VecDeque<Vec<(u64, Vec<u8>)>>,
    /// Bytes due from the modem at a given time
    scheduled: Vec<(u64, Vec<u8>)>,
    lines_seen: usize,
}

impl<const RX: usize, const TX: usize> SimLink<'_, RX, TX> {
    fn tick(&mut self) {
        self.now += 1;

        let now = self.now;
        let mut due = Vec::new();
        self.scheduled.retain(|(at, bytes)| {
            if *at <= now {
                due.push((*at, bytes.clone()));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, _)| *at);
        for (_, bytes) in due {
            self.uart.inject(&bytes);
        }

        for _ in 0..8 {
            if !self.uart.rx_ready() && !self.uart.tx_ready() {
                break;
            }
            self.bridge.on_interrupt(&mut self.uart);
        }

        let lines = self.uart.wire().iter().filter(|&&b| b == b'\r').count();
        while self.lines_seen < lines {
            self.lines_seen += 1;
            if let Some(chunks) = self.replies.pop_front() {
                for (delay, bytes) in chunks {
                    self.scheduled.push((now + delay, bytes));
                }
            }
        }
    }
}

/// Simulated clock driving a simulated modem link
pub struct SimClock<'a, const RX: usize, const TX: usize> {
    link: Rc<RefCell<SimLink<'a, RX, TX>>>,
}

impl<const RX: usize, const TX: usize> Clone for SimClock<'_, RX, TX> {
    fn clone(&self) -> Self {
        Self {
            link: Rc::clone(&self.link),
        }
    }
}

impl<'a, const RX: usize, const TX: usize> SimClock<'a, RX, TX> {
    pub fn new(bridge: UartBridge<'a, RX, TX>, uart: FakeUart<'a>, stats: &'a LinkStats) -> Self {
        let mut link = SimLink {
            now: 0,
            bridge,
            uart,
            stats,
            replies: VecDeque::new(),
            scheduled: Vec::new(),
            lines_seen: 0,
        };
        link.bridge.start(&mut link.uart);
        Self {
            link: Rc::new(RefCell::new(link)),
        }
    }

    /// Script the answer to the next command line as `(delay_ms, bytes)`
    /// chunks relative to the moment the line's `\r` is transmitted
    pub fn reply(&self, chunks: &[(u64, &[u8])]) {
        let chunks = chunks.iter().map(|(d, b)| (*d, b.to_vec())).collect();
        self.link.borrow_mut().replies.push_back(chunks);
    }

    /// Command line that gets no answer at all
    pub fn silent(&self) {
        self.link.borrow_mut().replies.push_back(Vec::new());
    }

    /// Unsolicited bytes at an absolute time
    pub fn emit_at(&self, at: u64, bytes: &[u8]) {
        self.link.borrow_mut().scheduled.push((at, bytes.to_vec()));
    }

    pub fn advance(&self, ms: u64) {
        let mut link = self.link.borrow_mut();
        for _ in 0..ms {
            link.tick();
        }
    }

    pub fn now(&self) -> u64 {
        self.link.borrow().now
    }

    pub fn wire(&self) -> Vec<u8> {
        self.link.borrow().uart.wire().to_vec()
    }

    pub fn stats(&self) -> LinkSnapshot {
        self.link.borrow().stats.snapshot()
    }
}

impl<const RX: usize, const TX: usize> Clock for SimClock<'_, RX, TX> {
    fn now_ms(&mut self) -> u64 {
        self.now()
    }

    fn pause(&mut self, ms: u32) {
        self.advance(ms as u64);
    }
}

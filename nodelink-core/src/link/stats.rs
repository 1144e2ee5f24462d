//! Link counters
//!
//! Written from interrupt context, read from the foreground. Counters
//! only ever grow (wrapping at `u32::MAX`); callers compare snapshots.

use portable_atomic::{AtomicU32, Ordering};

/// Counters maintained by the UART bridge
#[derive(Debug, Default)]
pub struct LinkStats {
    interrupts: AtomicU32,
    rx_bytes: AtomicU32,
    tx_bytes: AtomicU32,
    rx_dropped: AtomicU32,
}

/// Point-in-time copy of [`LinkStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkSnapshot {
    /// Bridge invocations
    pub interrupts: u32,
    /// Bytes moved from the hardware into the RX ring
    pub rx_bytes: u32,
    /// Bytes moved from the TX ring into the hardware
    pub tx_bytes: u32,
    /// Bytes read from the hardware but lost because the RX ring was full
    pub rx_dropped: u32,
}

impl LinkStats {
    /// All counters at zero
    pub const fn new() -> Self {
        Self {
            interrupts: AtomicU32::new(0),
            rx_bytes: AtomicU32::new(0),
            tx_bytes: AtomicU32::new(0),
            rx_dropped: AtomicU32::new(0),
        }
    }

    pub(crate) fn record_interrupt(&self) {
        self.interrupts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rx(&self, accepted: usize, dropped: usize) {
        self.rx_bytes.fetch_add(accepted as u32, Ordering::Relaxed);
        if dropped > 0 {
            self.rx_dropped.fetch_add(dropped as u32, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_tx(&self, sent: usize) {
        self.tx_bytes.fetch_add(sent as u32, Ordering::Relaxed);
    }

    /// Bytes dropped on RX overrun so far
    pub fn rx_dropped(&self) -> u32 {
        self.rx_dropped.load(Ordering::Relaxed)
    }

    /// Copy all counters
    pub fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            interrupts: self.interrupts.load(Ordering::Relaxed),
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
            tx_bytes: self.tx_bytes.load(Ordering::Relaxed),
            rx_dropped: self.rx_dropped.load(Ordering::Relaxed),
        }
    }
}

impl LinkSnapshot {
    /// Counter growth since an earlier snapshot
    pub fn since(&self, earlier: &LinkSnapshot) -> LinkSnapshot {
        LinkSnapshot {
            interrupts: self.interrupts.wrapping_sub(earlier.interrupts),
            rx_bytes: self.rx_bytes.wrapping_sub(earlier.rx_bytes),
            tx_bytes: self.tx_bytes.wrapping_sub(earlier.tx_bytes),
            rx_dropped: self.rx_dropped.wrapping_sub(earlier.rx_dropped),
        }
    }
}

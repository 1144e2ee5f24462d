//! UART abstractions for interrupt-driven transports
//!
//! The UART is split by execution context rather than by direction:
//!
//! - [`UartFifo`] is owned by the interrupt handler. It is the only way
//!   to touch the hardware FIFO once the peripheral is configured.
//! - [`TxInterrupt`] is owned by foreground code. It can only re-arm the
//!   TX-ready interrupt after queueing bytes, nothing else.

/// Hardware FIFO access from interrupt context
///
/// Every method must return without waiting on the line.
pub trait UartFifo {
    /// Check if the receive FIFO holds at least one byte
    fn rx_ready(&self) -> bool;

    /// Check if the TX-ready interrupt is armed and the transmit FIFO
    /// can accept at least one byte
    fn tx_ready(&self) -> bool;

    /// Move bytes out of the receive FIFO
    ///
    /// Reads until `buf` is full or the FIFO is empty, and returns the
    /// number of bytes read.
    fn read_available(&mut self, buf: &mut [u8]) -> usize;

    /// Move bytes into the transmit FIFO
    ///
    /// Writes until `data` is exhausted or the FIFO is full, and returns
    /// the number of bytes accepted.
    fn write_bytes(&mut self, data: &[u8]) -> usize;

    /// Enable or disable the RX-ready interrupt source
    fn set_rx_interrupt(&mut self, enabled: bool);

    /// Enable or disable the TX-ready interrupt source
    fn set_tx_interrupt(&mut self, enabled: bool);
}

/// Foreground handle for the TX-ready interrupt
pub trait TxInterrupt {
    /// Arm the TX-ready interrupt so queued bytes start draining
    ///
    /// Implementations must make sure the interrupt fires at least once
    /// even if the transmit FIFO is already empty.
    fn enable_tx_interrupt(&mut self);
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

//! Interrupt side of the UART link

pub mod bridge;
pub mod stats;

pub use bridge::{UartBridge, SCRATCH_SIZE};
pub use stats::{LinkSnapshot, LinkStats};

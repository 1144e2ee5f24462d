//! Nodelink Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that chip-specific HALs
//! implement. The transport and drivers only ever see these traits, which
//! keeps them testable on the host against simulated peripherals.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (nodelink-firmware)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  nodelink-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ nodelink-hal- │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::ControlLine`] - Digital outputs
//! - [`uart::UartFifo`] - Interrupt-side access to the UART hardware FIFO
//! - [`uart::TxInterrupt`] - Foreground control of the TX-ready interrupt
//! - [`i2c::I2cBus`] - I2C bus operations
//! - [`adc::AdcReader`] - Single ADC channel sampling

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod gpio;
pub mod i2c;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use adc::AdcReader;
pub use gpio::{ControlLine, OutputPin, Polarity};
pub use i2c::I2cBus;
pub use uart::{TxInterrupt, UartConfig, UartFifo};

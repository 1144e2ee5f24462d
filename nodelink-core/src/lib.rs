//! Board-agnostic core of the Nodelink firmware
//!
//! This crate contains everything between the UART FIFO and the
//! application that does not depend on a specific chip:
//!
//! - Lock-free SPSC byte rings
//! - The UART interrupt bridge and its counters
//! - The AT command transport and its state machine
//! - Sensor, battery, modem power and clock traits
//! - Node configuration types and the `node.toml` parser

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod buffer;
pub mod config;
pub mod link;
pub mod traits;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

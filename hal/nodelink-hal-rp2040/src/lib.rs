//! RP2040-specific HAL for the sensor node firmware
//!
//! This crate provides RP2040 implementations of the shared
//! `nodelink-hal` traits, plus RP2040-specific functionality:
//!
//! - Board pin split and config-driven GPIO allocation
//! - PL011 register-level FIFO access for the UART interrupt bridge
//! - GPIO output, blocking I2C and ADC channel adapters

#![no_std]

pub mod adc;
pub mod gpio;
pub mod i2c;
pub mod pins;
pub mod uart;

pub use adc::RpAdcChannel;
pub use gpio::RpOutput;
pub use i2c::RpI2c;
pub use pins::{Board, PinBank, PinError};
pub use uart::{Pl011Fifo, Pl011TxInterrupt};

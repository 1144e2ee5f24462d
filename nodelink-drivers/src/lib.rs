//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in nodelink-core for the devices on a Nodelink board:
//!
//! - Temperature/humidity sensor (Sensirion SHTC3)
//! - Battery gauge from an ADC divider tap
//! - Modem power sequencing (Quectel BG96)

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod modem;
pub mod sensor;

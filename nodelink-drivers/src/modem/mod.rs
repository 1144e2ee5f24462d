//! Modem power sequencers

pub mod bg96;

pub use bg96::{Bg96Pins, Bg96Power, Bg96Timing, PowerError};

//! Byte buffers shared between interrupt and foreground context

pub mod ring;

pub use ring::{Consumer, Producer, RingBuffer};

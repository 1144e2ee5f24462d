//! AT Command Wire Protocol
//!
//! This crate defines the bytes exchanged between the node and its
//! cellular modem, independent of how they are moved over the UART.
//!
//! # Protocol Overview
//!
//! Commands are ASCII lines terminated by a carriage return:
//! ```text
//! AT+GMI<CR>
//! ```
//!
//! Responses are a sequence of CR/LF delimited lines that end with a
//! final result code. The byte pattern that marks the end of a response
//! varies between commands and modem firmware revisions, so it is a
//! value ([`Terminator`]) rather than a constant:
//! ```text
//! <CR><LF>Quectel<CR><LF><CR><LF>OK<CR><LF>
//!                                ^^^^^^^^^^ final_result()
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod command;
pub mod identity;
pub mod payload;
pub mod response;
pub mod socket;
pub mod terminator;

pub use command::{AtCommand, CommandError, MAX_COMMAND_LEN};
pub use identity::{IdentityField, ModemIdentity};
pub use payload::{encode_payload, Encoded, PayloadFormat, Reading};
pub use response::{FinalResult, Response};
pub use socket::OpenError;
pub use terminator::{Terminator, TerminatorError, MAX_PATTERNS, MAX_PATTERN_LEN};

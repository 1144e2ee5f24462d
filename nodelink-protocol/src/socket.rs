//! TCP socket commands (Quectel `AT+QI*` set)
//!
//! Opening a socket is acknowledged twice: `OK` when the request is
//! accepted, then an unsolicited `+QIOPEN: <connect_id>,<err>` once the
//! connection is up or has failed. [`open_terminator`] waits for the
//! second one.

use core::fmt::Write;

use heapless::String;

use crate::command::{AtCommand, CommandError, MAX_COMMAND_LEN};
use crate::response::Response;
use crate::terminator::{Terminator, TerminatorError};

/// Outcome of a socket open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenError {
    /// No `+QIOPEN` line for this connection
    Missing,
    /// Modem reported an error code (e.g. 563 socket in use)
    Code(u16),
}

/// `AT+QIACT=<context_id>`: activate the PDP context
pub fn activate_context(context_id: u8) -> Result<AtCommand, CommandError> {
    AtCommand::set("+QIACT", format_args!("{}", context_id))
}

/// `AT+QIOPEN=<ctx>,<id>,"TCP","<host>",<port>,0,1`: open a TCP client
/// socket in direct push mode
pub fn open_tcp(
    context_id: u8,
    connect_id: u8,
    host: &str,
    port: u16,
) -> Result<AtCommand, CommandError> {
    if host.contains('"') {
        return Err(CommandError::InvalidByte);
    }
    let mut args: String<MAX_COMMAND_LEN> = String::new();
    write!(
        args,
        "{},{},\"TCP\",\"{}\",{},0,1",
        context_id, connect_id, host, port
    )
    .map_err(|_| CommandError::TooLong)?;
    AtCommand::set("+QIOPEN", format_args!("{}", args))
}

/// `AT+QISEND=<id>,<len>`: announce a payload; the modem answers with
/// the data prompt
pub fn send_length(connect_id: u8, len: usize) -> Result<AtCommand, CommandError> {
    AtCommand::set("+QISEND", format_args!("{},{}", connect_id, len))
}

/// `AT+QICLOSE=<id>`
pub fn close(connect_id: u8) -> Result<AtCommand, CommandError> {
    AtCommand::set("+QICLOSE", format_args!("{}", connect_id))
}

/// Wait for the open URC, or an immediate rejection
pub fn open_terminator() -> Result<Terminator, TerminatorError> {
    Terminator::empty()
        .with_line_prefix(b"+QIOPEN:")?
        .with_line(b"ERROR")?
        .with_line_prefix(b"+CME ERROR:")
}

/// Check the `+QIOPEN` result for `connect_id`
pub fn open_result(response: &Response<'_>, connect_id: u8) -> Result<(), OpenError> {
    let value = response.field("+QIOPEN:").ok_or(OpenError::Missing)?;
    let (id, err) = value.split_once(',').ok_or(OpenError::Missing)?;
    if id.trim().parse::<u8>() != Ok(connect_id) {
        return Err(OpenError::Missing);
    }
    match err.trim().parse::<u16>() {
        Ok(0) => Ok(()),
        Ok(code) => Err(OpenError::Code(code)),
        Err(_) => Err(OpenError::Missing),
    }
}

//! AT command construction
//!
//! Commands are built into a fixed-capacity buffer and always end with a
//! single carriage return, which is what V.25ter modems expect.

use core::fmt::{self, Write};

use heapless::{String, Vec};

/// Maximum encoded command length including the trailing `\r`
pub const MAX_COMMAND_LEN: usize = 128;

/// Command line terminator
pub const CR: u8 = b'\r';

/// Errors building a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Command does not fit in [`MAX_COMMAND_LEN`] bytes
    TooLong,
    /// Command text contains a byte that would end the line early
    InvalidByte,
}

/// An encoded AT command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtCommand {
    bytes: Vec<u8, MAX_COMMAND_LEN>,
}

impl AtCommand {
    /// Wrap a complete command such as `"ATI"` or `"AT+GMI\r"`
    ///
    /// A trailing `\r` is appended if missing.
    pub fn raw(text: &str) -> Result<Self, CommandError> {
        let body = text.strip_suffix('\r').unwrap_or(text);
        if body.bytes().any(|b| b == CR || b == b'\n') {
            return Err(CommandError::InvalidByte);
        }
        let mut bytes = Vec::from_slice(body.as_bytes()).map_err(|_| CommandError::TooLong)?;
        bytes.push(CR).map_err(|_| CommandError::TooLong)?;
        Ok(Self { bytes })
    }

    /// Execute form: `AT<name>`, e.g. `execute("+GMI")`
    pub fn execute(name: &str) -> Result<Self, CommandError> {
        Self::format(format_args!("AT{}", name))
    }

    /// Read form: `AT<name>?`, e.g. `query("+CSQ")`
    pub fn query(name: &str) -> Result<Self, CommandError> {
        Self::format(format_args!("AT{}?", name))
    }

    /// Write form: `AT<name>=<args>`
    ///
    /// ```
    /// use nodelink_protocol::AtCommand;
    ///
    /// let cmd = AtCommand::set("+QISEND", format_args!("{},{}", 0, 24)).unwrap();
    /// assert_eq!(cmd.as_bytes(), b"AT+QISEND=0,24\r");
    /// ```
    pub fn set(name: &str, args: fmt::Arguments<'_>) -> Result<Self, CommandError> {
        Self::format(format_args!("AT{}={}", name, args))
    }

    fn format(args: fmt::Arguments<'_>) -> Result<Self, CommandError> {
        let mut text: String<MAX_COMMAND_LEN> = String::new();
        text.write_fmt(args).map_err(|_| CommandError::TooLong)?;
        Self::raw(&text)
    }

    /// Encoded bytes, including the trailing `\r`
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Command text without the trailing `\r`, as the modem echoes it
    pub fn echo(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - 1]
    }

    /// Encoded length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a command holds at least its terminator
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for AtCommand {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

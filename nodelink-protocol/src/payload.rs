//! Telemetry payload encoding
//!
//! A [`Reading`] is encoded into a caller-supplied buffer. Encoding never
//! fails on a short buffer: the leading bytes that fit are kept and the
//! result is flagged as truncated, the same policy the transport applies
//! to responses.

use core::fmt::{self, Write};

use serde::{Deserialize, Serialize};

/// Upper bound of a postcard-encoded [`Reading`]
pub const MAX_BINARY_LEN: usize = 16;

/// One telemetry sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Report sequence number since boot
    pub seq: u32,
    /// Temperature in 0.01°C
    pub temperature_centi: i32,
    /// Relative humidity in 0.01%
    pub humidity_centi: u32,
    /// Battery state of charge, 0-100
    pub battery_percent: u8,
}

/// Wire format of the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadFormat {
    /// `seq=7,t=23.45,h=41.20,b=87\n`
    #[default]
    Text,
    /// postcard binary, at most [`MAX_BINARY_LEN`] bytes
    Postcard,
}

/// Outcome of an encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Encoded {
    /// Bytes written into the buffer
    pub len: usize,
    /// The full encoding did not fit
    pub truncated: bool,
}

/// `fmt::Write` sink that keeps what fits and remembers what did not
struct TruncatingWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
    truncated: bool,
}

impl<'a> TruncatingWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            len: 0,
            truncated: false,
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        let room = self.buf.len() - self.len;
        let n = bytes.len().min(room);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        if n < bytes.len() {
            self.truncated = true;
        }
    }

    fn finish(self) -> Encoded {
        Encoded {
            len: self.len,
            truncated: self.truncated,
        }
    }
}

impl Write for TruncatingWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push(s.as_bytes());
        Ok(())
    }
}

/// Fixed-point value with two decimals, e.g. `-3.05`
struct Centi(i64);

impl fmt::Display for Centi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Encode a reading into `buf`
pub fn encode_payload(reading: &Reading, format: PayloadFormat, buf: &mut [u8]) -> Encoded {
    let mut out = TruncatingWriter::new(buf);
    match format {
        PayloadFormat::Text => {
            // TruncatingWriter never reports an error
            let _ = writeln!(
                out,
                "seq={},t={},h={},b={}",
                reading.seq,
                Centi(reading.temperature_centi as i64),
                Centi(reading.humidity_centi as i64),
                reading.battery_percent
            );
        }
        PayloadFormat::Postcard => {
            let mut scratch = [0u8; MAX_BINARY_LEN];
            if let Ok(bytes) = postcard::to_slice(reading, &mut scratch) {
                out.push(bytes);
            }
        }
    }
    out.finish()
}

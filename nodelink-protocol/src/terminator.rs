//! Response terminator detection
//!
//! A terminator is a small set of byte patterns. A response is complete
//! as soon as any of them appears in the bytes received so far.
//!
//! Three pattern kinds cover the dialects seen on Quectel firmware:
//! - `Exact`: raw bytes anywhere in the stream (`> ` data prompt, custom
//!   sentinels)
//! - `Line`: a whole line equal to the text (`OK`, `ERROR`)
//! - `LinePrefix`: a whole line starting with the text (`+CME ERROR: 10`)
//!
//! Lines end at `\n`; trailing `\r` bytes are ignored when comparing.

use heapless::Vec;

/// Maximum number of patterns per terminator
pub const MAX_PATTERNS: usize = 4;

/// Maximum length of a single pattern in bytes
pub const MAX_PATTERN_LEN: usize = 16;

/// Errors building a terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TerminatorError {
    /// Pattern is empty
    Empty,
    /// Pattern longer than [`MAX_PATTERN_LEN`]
    PatternTooLong,
    /// More than [`MAX_PATTERNS`] patterns
    TooManyPatterns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Kind {
    Exact,
    Line,
    LinePrefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pattern {
    kind: Kind,
    bytes: Vec<u8, MAX_PATTERN_LEN>,
}

impl Pattern {
    /// Check whether this pattern completes exactly at `end`
    fn matches_at(&self, haystack: &[u8], end: usize) -> bool {
        let head = &haystack[..end];
        match self.kind {
            Kind::Exact => head.ends_with(&self.bytes),
            Kind::Line | Kind::LinePrefix => {
                if head.last() != Some(&b'\n') {
                    return false;
                }
                let body = &head[..head.len() - 1];
                let start = body
                    .iter()
                    .rposition(|&b| b == b'\n')
                    .map_or(0, |i| i + 1);
                let mut line = &body[start..];
                while let [rest @ .., b'\r'] = line {
                    line = rest;
                }
                if self.kind == Kind::Line {
                    line == self.bytes.as_slice()
                } else {
                    line.starts_with(&self.bytes)
                }
            }
        }
    }
}

/// Set of byte patterns marking the end of a modem response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminator {
    patterns: Vec<Pattern, MAX_PATTERNS>,
}

impl Default for Terminator {
    fn default() -> Self {
        Self::final_result()
    }
}

impl Terminator {
    /// Terminator with no patterns; add some with the `with_*` builders
    pub const fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Single raw byte sequence, matched anywhere in the stream
    pub fn sentinel(pattern: &[u8]) -> Result<Self, TerminatorError> {
        Self::empty().with_exact(pattern)
    }

    /// Standard final result codes: `OK`, `ERROR`, `+CME ERROR: <n>`,
    /// `+CMS ERROR: <n>`
    pub fn final_result() -> Self {
        let mut t = Self::empty();
        t.push_preset(Kind::Line, b"OK");
        t.push_preset(Kind::Line, b"ERROR");
        t.push_preset(Kind::LinePrefix, b"+CME ERROR:");
        t.push_preset(Kind::LinePrefix, b"+CMS ERROR:");
        t
    }

    /// Data-mode prompt emitted before the modem accepts raw payload bytes
    pub fn prompt() -> Self {
        let mut t = Self::empty();
        t.push_preset(Kind::Exact, b"> ");
        t.push_preset(Kind::Line, b"ERROR");
        t.push_preset(Kind::LinePrefix, b"+CME ERROR:");
        t
    }

    /// Outcome of a socket send (`AT+QISEND` data phase)
    pub fn send_result() -> Self {
        let mut t = Self::empty();
        t.push_preset(Kind::Line, b"SEND OK");
        t.push_preset(Kind::Line, b"SEND FAIL");
        t.push_preset(Kind::Line, b"ERROR");
        t.push_preset(Kind::LinePrefix, b"+CME ERROR:");
        t
    }

    /// Add a raw byte pattern
    pub fn with_exact(self, pattern: &[u8]) -> Result<Self, TerminatorError> {
        self.with(Kind::Exact, pattern)
    }

    /// Add a whole-line pattern
    pub fn with_line(self, line: &[u8]) -> Result<Self, TerminatorError> {
        self.with(Kind::Line, line)
    }

    /// Add a line-prefix pattern
    pub fn with_line_prefix(self, prefix: &[u8]) -> Result<Self, TerminatorError> {
        self.with(Kind::LinePrefix, prefix)
    }

    fn with(mut self, kind: Kind, bytes: &[u8]) -> Result<Self, TerminatorError> {
        if bytes.is_empty() {
            return Err(TerminatorError::Empty);
        }
        let bytes = Vec::from_slice(bytes).map_err(|_| TerminatorError::PatternTooLong)?;
        self.patterns
            .push(Pattern { kind, bytes })
            .map_err(|_| TerminatorError::TooManyPatterns)?;
        Ok(self)
    }

    fn push_preset(&mut self, kind: Kind, bytes: &[u8]) {
        if let Ok(bytes) = Vec::from_slice(bytes) {
            let _ = self.patterns.push(Pattern { kind, bytes });
        }
    }

    /// Number of patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if no pattern is configured (such a terminator never matches)
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Find the earliest point after `from` where a pattern completes
    ///
    /// Only match ends in `from + 1..=haystack.len()` are considered, so
    /// callers accumulating a response can pass the previous length and
    /// scan just the new bytes. Patterns straddling the boundary are
    /// still found.
    ///
    /// Returns the exclusive end index of the match.
    pub fn find(&self, haystack: &[u8], from: usize) -> Option<usize> {
        (from + 1..=haystack.len())
            .find(|&end| self.patterns.iter().any(|p| p.matches_at(haystack, end)))
    }
}

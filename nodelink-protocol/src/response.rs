//! Response classification
//!
//! Splits a captured response into lines and identifies the final result
//! code. Parsing borrows from the caller's buffer and never allocates.

/// Final result code of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FinalResult {
    /// `OK`
    Ok,
    /// `ERROR`
    Error,
    /// `+CME ERROR: <n>`; `None` when the modem reports verbose text
    CmeError(Option<u16>),
    /// `+CMS ERROR: <n>`
    CmsError(Option<u16>),
    /// `SEND OK`
    SendOk,
    /// `SEND FAIL`
    SendFail,
    /// `> ` data prompt
    Prompt,
    /// No final result code present (truncated or still arriving)
    Missing,
}

impl FinalResult {
    /// Check if the command succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok | Self::SendOk | Self::Prompt)
    }

    fn classify(line: &[u8]) -> Option<Self> {
        match line {
            b"OK" => Some(Self::Ok),
            b"ERROR" => Some(Self::Error),
            b"SEND OK" => Some(Self::SendOk),
            b"SEND FAIL" => Some(Self::SendFail),
            b">" | b"> " => Some(Self::Prompt),
            _ => {
                if let Some(rest) = line.strip_prefix(b"+CME ERROR:") {
                    Some(Self::CmeError(parse_code(rest)))
                } else if let Some(rest) = line.strip_prefix(b"+CMS ERROR:") {
                    Some(Self::CmsError(parse_code(rest)))
                } else {
                    None
                }
            }
        }
    }
}

fn parse_code(text: &[u8]) -> Option<u16> {
    let text = core::str::from_utf8(text).ok()?;
    text.trim().parse().ok()
}

fn trim(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &line[start..end]
}

/// A parsed modem response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    raw: &'a [u8],
    result: FinalResult,
}

impl<'a> Response<'a> {
    /// Parse a captured response
    ///
    /// The final result is the last line that is a result code. A data
    /// prompt (`> `) has no line ending and is recognised at the tail.
    pub fn parse(raw: &'a [u8]) -> Self {
        let mut result = FinalResult::Missing;
        for line in lines(raw) {
            if let Some(r) = FinalResult::classify(line) {
                result = r;
            }
        }
        if result == FinalResult::Missing && raw.ends_with(b"> ") {
            result = FinalResult::Prompt;
        }
        Self { raw, result }
    }

    /// The bytes this response was parsed from
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Final result code
    pub fn result(&self) -> FinalResult {
        self.result
    }

    /// Check if the response carries a success result code
    pub fn is_ok(&self) -> bool {
        self.result.is_success()
    }

    /// Non-empty, whitespace-trimmed lines
    pub fn lines(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        lines(self.raw)
    }

    /// Information lines: everything except the command echo and result codes
    pub fn info_lines(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.lines()
            .filter(|line| FinalResult::classify(line).is_none())
            .filter(|line| !is_echo(line))
    }

    /// First information line as text
    pub fn first_info(&self) -> Option<&'a str> {
        self.info_lines()
            .find_map(|line| core::str::from_utf8(line).ok())
    }

    /// Value of the first `<prefix> <value>` information line
    ///
    /// ```
    /// use nodelink_protocol::Response;
    ///
    /// let rsp = Response::parse(b"\r\n+CSQ: 18,99\r\n\r\nOK\r\n");
    /// assert_eq!(rsp.field("+CSQ:"), Some("18,99"));
    /// ```
    pub fn field(&self, prefix: &str) -> Option<&'a str> {
        self.info_lines().find_map(|line| {
            let rest = line.strip_prefix(prefix.as_bytes())?;
            core::str::from_utf8(trim(rest)).ok()
        })
    }
}

fn lines(raw: &[u8]) -> impl Iterator<Item = &[u8]> {
    raw.split(|&b| b == b'\n' || b == b'\r')
        .map(trim)
        .filter(|line| !line.is_empty())
}

fn is_echo(line: &[u8]) -> bool {
    line.len() >= 2 && line[..2].eq_ignore_ascii_case(b"AT")
}

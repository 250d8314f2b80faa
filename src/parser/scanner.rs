//! Byte-position-tracking line reader.
//!
//! The record state machine needs exact file offsets for `rec_start`/`rec_end`,
//! which a plain `BufRead::lines()` throws away (it also eats the newline,
//! which we need to count). This reader hands back each raw line, newline
//! included, paired with the absolute offset its first byte sat at.

use std::io::{self, BufRead};

pub struct LineScanner<R> {
    reader: R,
    pos: u64,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        LineScanner { reader, pos: 0 }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Next raw line including its terminator, or `None` at EOF. The final
    /// line of a file lacking a trailing newline is still returned once.
    pub fn next_line(&mut self) -> io::Result<Option<(Vec<u8>, u64)>> {
        let mut buf = Vec::new();
        let n = self.reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        let start = self.pos;
        self.pos += n as u64;
        Ok(Some((buf, start)))
    }
}

/// Strip a trailing `\n` and, if present, the `\r` before it.
pub fn strip_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Trim ASCII whitespace from both ends — the SDF convention for "stripped".
pub fn strip_ascii_ws(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map(|i| i + 1).unwrap_or(start);
    &bytes[start..end]
}

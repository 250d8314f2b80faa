//! Record locator codec — fixed 32-byte packing of `(file_id, start, end,
//! is_conformer, cid)`.
//!
//! # On-disk layout (32 bytes, all fields little-endian)
//!
//! ```text
//! Offset  Size  Field
//!    0      4   file_id    u32, >= 1
//!    4      8   start      u64, inclusive
//!   12      8   end        u64, exclusive, > start
//!   20      2   flags      u16, bit0 = is_conformer
//!   22      8   cid        i64, -1 = absent
//!   30      2   reserved   u16, always 0
//! ```
//!
//! Encode and decode are pure, infallible-on-valid-input transforms over a
//! fixed-size buffer — no I/O, no allocation beyond the 32-byte array itself.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::IndexError;

pub const LOCATOR_SIZE: usize = 32;

const FLAG_IS_CONFORMER: u16 = 0x0001;

/// Pointer to one record's byte range within a specific indexed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub file_id:      u32,
    pub start:        u64,
    pub end:          u64,
    pub is_conformer: bool,
    /// Compound CID — the record's own CID if compound, else its effective
    /// parent CID if known. `None` means absent (no CID could be resolved).
    pub cid:          Option<u64>,
}

impl Locator {
    /// Pack into the frozen 32-byte little-endian layout.
    ///
    /// # Panics
    /// Panics if `file_id == 0`, `start > end`, `end > 2^63`, or `cid` does
    /// not fit in the signed slot — these are programmer errors in the
    /// builder, not recoverable runtime conditions, since every caller
    /// derives these values from a file it just read and CIDs above
    /// `i64::MAX` are already rejected at parse time (spec.md §9).
    pub fn encode(&self) -> [u8; LOCATOR_SIZE] {
        assert!(self.file_id >= 1, "locator file_id must be >= 1");
        assert!(self.start <= self.end, "locator start must be <= end");
        assert!(self.end <= 1u64 << 63, "locator end must be <= 2^63");
        if let Some(cid) = self.cid {
            assert!(cid <= i64::MAX as u64, "locator cid must fit in i64");
        }

        let mut buf = [0u8; LOCATOR_SIZE];
        let mut cursor = Cursor::new(&mut buf[..]);
        cursor.write_u32::<LittleEndian>(self.file_id).expect("fixed-size buffer");
        cursor.write_u64::<LittleEndian>(self.start).expect("fixed-size buffer");
        cursor.write_u64::<LittleEndian>(self.end).expect("fixed-size buffer");

        let flags: u16 = if self.is_conformer { FLAG_IS_CONFORMER } else { 0 };
        cursor.write_u16::<LittleEndian>(flags).expect("fixed-size buffer");

        let cid_i64: i64 = self.cid.map(|c| c as i64).unwrap_or(-1);
        cursor.write_i64::<LittleEndian>(cid_i64).expect("fixed-size buffer");
        // reserved u16 left zero, never written.
        buf
    }

    /// Unpack a 32-byte buffer. `cid == -1` decodes to `None`; any other
    /// negative value is corruption and fails with `CorruptLocator`.
    pub fn decode(buf: &[u8]) -> Result<Self, IndexError> {
        if buf.len() != LOCATOR_SIZE {
            return Err(IndexError::CorruptLocator(format!(
                "expected {LOCATOR_SIZE} bytes, got {}",
                buf.len()
            )));
        }

        let mut cursor = Cursor::new(buf);
        let file_id = cursor.read_u32::<LittleEndian>().expect("length checked above");
        let start   = cursor.read_u64::<LittleEndian>().expect("length checked above");
        let end     = cursor.read_u64::<LittleEndian>().expect("length checked above");
        let flags   = cursor.read_u16::<LittleEndian>().expect("length checked above");
        let cid_i64 = cursor.read_i64::<LittleEndian>().expect("length checked above");

        let cid = match cid_i64 {
            -1 => None,
            c if c >= 0 => Some(c as u64),
            other => {
                return Err(IndexError::CorruptLocator(format!(
                    "invalid cid sentinel {other}"
                )))
            }
        };

        Ok(Locator {
            file_id,
            start,
            end,
            is_conformer: flags & FLAG_IS_CONFORMER != 0,
            cid,
        })
    }
}

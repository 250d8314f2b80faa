//! Single-pass byte-level SDF record scanner.
//!
//! Reads one file as an opaque byte stream in large buffered reads and
//! segments it into records using only line-level rules — no chemistry is
//! parsed, only the handful of identifier fields the index needs. CRLF and
//! LF line endings are both tolerated.
//!
//! # State machine
//!
//! Conceptually five states per record: `AwaitingTitle` (first line is the
//! title), `InBody` (scanning for the next `"> <FIELD>"` header or the
//! terminator), `InPropertyHeader`/`InPropertyValue` (collecting a property's
//! first non-empty value line up to the closing blank line), and
//! `AwaitingTerminator` (back in `InBody` until `$$$$`). The header tick does
//! no observable work on its own — the very next line is either the value or
//! the closing blank — so the implementation folds it into `InProperty`.
//! A `$$$$` line ends the record from any state and returns to
//! `AwaitingTitle`. Nothing here ever aborts: unrecognized input just
//! advances the byte position and stays in the current state.

mod scanner;

use std::io::{self, BufRead};

use scanner::{strip_ascii_ws, strip_eol, LineScanner};

use crate::alid::RecordKind;

const CID_FIELDS: &[&str] = &["CID", "PUBCHEM_COMPOUND_CID", "PUBCHEM_CID", "COMPOUND_CID"];
const CONFORMER_ID_FIELDS: &[&str] =
    &["CONFORMER_ID", "CONFID", "PUBCHEM_CONFORMER_ID", "CONFORMERID"];
const PARENT_CID_EXTRA: &str = "PARENT_CID";

/// One record's byte range and extracted identifier fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub rec_start: u64,
    /// Exclusive — the offset just past the terminator line's newline.
    pub rec_end: u64,
    pub rec_no: usize,
    pub cid: Option<u64>,
    pub conformer_id: Option<String>,
    pub parent_cid: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    AwaitingTitle,
    InBody,
    InProperty { field: String, captured: bool },
}

struct Accum {
    rec_start: u64,
    rec_no: usize,
    cid: Option<u64>,
    conformer_id: Option<String>,
    parent_cid: Option<u64>,
}

impl Accum {
    fn new(rec_start: u64, rec_no: usize) -> Self {
        Accum { rec_start, rec_no, cid: None, conformer_id: None, parent_cid: None }
    }

    fn finish(self, rec_end: u64) -> ParsedRecord {
        ParsedRecord {
            rec_start: self.rec_start,
            rec_end,
            rec_no: self.rec_no,
            cid: self.cid,
            conformer_id: self.conformer_id,
            parent_cid: self.parent_cid,
        }
    }
}

/// Parses complete records out of a buffered byte stream that is expected to
/// be at least 64 KiB buffered by the caller (see [`std::io::BufReader`]).
pub struct SdfParser<R> {
    scanner: LineScanner<R>,
    kind: RecordKind,
    rec_no: usize,
    state: State,
    accum: Option<Accum>,
}

impl<R: BufRead> SdfParser<R> {
    pub fn new(reader: R, kind: RecordKind) -> Self {
        SdfParser {
            scanner: LineScanner::new(reader),
            kind,
            rec_no: 0,
            state: State::AwaitingTitle,
            accum: None,
        }
    }

    /// Pull the next complete record, or `None` at EOF. A trailing partial
    /// record (no `$$$$` before EOF) is discarded, matching every other
    /// malformed-input case in this parser.
    pub fn next_record(&mut self) -> io::Result<Option<ParsedRecord>> {
        loop {
            let (raw_line, line_start) = match self.scanner.next_line()? {
                Some(x) => x,
                None => return Ok(None),
            };
            let stripped = strip_ascii_ws(strip_eol(&raw_line));

            if stripped == b"$$$$" {
                let rec_end = self.scanner.position();
                let accum = self.accum.take();
                self.state = State::AwaitingTitle;
                if let Some(accum) = accum {
                    self.rec_no += 1;
                    return Ok(Some(accum.finish(rec_end)));
                }
                // `$$$$` with no open record — an empty or malformed leading
                // block; just keep scanning.
                continue;
            }

            match &mut self.state {
                State::AwaitingTitle => {
                    let mut accum = Accum::new(line_start, self.rec_no);
                    if self.kind == RecordKind::Compound {
                        if let Some(cid) = parse_ascii_u64(stripped) {
                            accum.cid = Some(cid);
                        }
                    }
                    self.accum = Some(accum);
                    self.state = State::InBody;
                }
                State::InBody => {
                    if let Some(field) = parse_property_header(stripped) {
                        self.state = State::InProperty { field, captured: false };
                    }
                    // Any other line in the body is inert filler (connection
                    // table, counts line, etc.) — stay in InBody.
                }
                State::InProperty { field, captured } => {
                    if stripped.is_empty() {
                        // Blank line closes the property.
                        self.state = State::InBody;
                    } else if !*captured {
                        let field = field.clone();
                        *captured = true;
                        let value = stripped;
                        if let Some(accum) = self.accum.as_mut() {
                            apply_field(accum, &field, value);
                        }
                    }
                    // Extra value lines before the blank are ignored — only
                    // the first non-empty one is the value.
                }
            }
        }
    }
}

fn parse_property_header(stripped: &[u8]) -> Option<String> {
    if stripped.len() > 4 && stripped.starts_with(b"> <") && stripped.ends_with(b">") {
        let name = &stripped[3..stripped.len() - 1];
        let normalized = String::from_utf8_lossy(name).trim().to_ascii_uppercase();
        Some(normalized)
    } else {
        None
    }
}

/// Apply one captured property value to the record accumulator. CID-field
/// matches feed *both* `cid` and `parent_cid` candidates (a conformer file
/// carrying a `PUBCHEM_COMPOUND_CID` property satisfies the parent-CID
/// field list, which is the CID list plus `PARENT_CID`); only the bare
/// `PARENT_CID` field feeds `parent_cid` exclusively. This mirrors the
/// "parsed CID if present else parent CID" fallback used when computing a
/// conformer's effective CID.
fn apply_field(accum: &mut Accum, field: &str, value: &[u8]) {
    if CID_FIELDS.contains(&field) {
        if accum.cid.is_none() {
            accum.cid = parse_ascii_u64(value);
        }
        if accum.parent_cid.is_none() {
            accum.parent_cid = parse_ascii_u64(value);
        }
    } else if field == PARENT_CID_EXTRA {
        if accum.parent_cid.is_none() {
            accum.parent_cid = parse_ascii_u64(value);
        }
    }

    if CONFORMER_ID_FIELDS.contains(&field) && accum.conformer_id.is_none() {
        accum.conformer_id = Some(String::from_utf8_lossy(value).into_owned());
    }
}

/// Parse a pure-ASCII-digit CID candidate. Values above `i64::MAX` (2^63 - 1)
/// cannot round-trip through the locator's signed `cid` slot (spec.md §4.1,
/// §9) and are treated as a non-digit value: silently ignored, same as
/// `"NA"` or any other unparseable candidate.
fn parse_ascii_u64(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let value: u64 = std::str::from_utf8(bytes).ok()?.parse().ok()?;
    if value > i64::MAX as u64 {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse_all(bytes: &[u8], kind: RecordKind) -> Vec<ParsedRecord> {
        let mut parser = SdfParser::new(Cursor::new(bytes.to_vec()), kind);
        let mut out = Vec::new();
        while let Some(rec) = parser.next_record().unwrap() {
            out.push(rec);
        }
        out
    }

    #[test]
    fn single_compound_record() {
        let sdf = b"2244\n\n\n> <PUBCHEM_COMPOUND_CID>\n2244\n\n$$$$\n";
        let recs = parse_all(sdf, RecordKind::Compound);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].rec_start, 0);
        assert_eq!(recs[0].rec_end, sdf.len() as u64);
        assert_eq!(recs[0].cid, Some(2244));
        assert_eq!(recs[0].rec_no, 0);
    }

    #[test]
    fn conformer_record_with_parent_cid() {
        // A CID-field match feeds both `cid` and `parent_cid` — the builder
        // is what decides whether a conformer's *effective* CID comes from
        // `cid` or falls back to `parent_cid`.
        let sdf = b"conf-title\n\n\n> <PUBCHEM_CONFORMER_ID>\n0000000100000001\n\n> <PUBCHEM_COMPOUND_CID>\n1\n\n$$$$\n";
        let recs = parse_all(sdf, RecordKind::Conformer);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].conformer_id.as_deref(), Some("0000000100000001"));
        assert_eq!(recs[0].parent_cid, Some(1));
        assert_eq!(recs[0].cid, Some(1));
    }

    #[test]
    fn bare_parent_cid_field_only_feeds_parent_cid() {
        let sdf = b"conf-title\n\n\n> <PARENT_CID>\n42\n\n$$$$\n";
        let recs = parse_all(sdf, RecordKind::Conformer);
        assert_eq!(recs[0].parent_cid, Some(42));
        assert_eq!(recs[0].cid, None);
    }

    #[test]
    fn trailing_partial_record_discarded() {
        let sdf = b"2244\n\n$$$$\nincomplete-title\nno-terminator-follows\n";
        let recs = parse_all(sdf, RecordKind::Compound);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn crlf_terminator_is_tolerated() {
        let sdf = b"5\r\n\r\n$$$$\r\n";
        let recs = parse_all(sdf, RecordKind::Compound);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].rec_end, sdf.len() as u64);
    }

    #[test]
    fn non_digit_cid_value_is_ignored() {
        let sdf = b"notanumber\n\n> <PUBCHEM_COMPOUND_CID>\nNA\n\n$$$$\n";
        let recs = parse_all(sdf, RecordKind::Compound);
        assert_eq!(recs[0].cid, None);
    }

    #[test]
    fn cid_above_i64_max_is_ignored() {
        // 2^63 does not fit in the locator's signed cid slot (spec.md §4.1) —
        // treated the same as a non-digit value, not stored and not an error.
        let sdf = b"9223372036854775808\n\n> <PUBCHEM_COMPOUND_CID>\n9223372036854775808\n\n$$$$\n";
        let recs = parse_all(sdf, RecordKind::Compound);
        assert_eq!(recs[0].cid, None);
    }

    #[test]
    fn cid_at_i64_max_is_accepted() {
        let sdf = b"9223372036854775807\n\n$$$$\n";
        let recs = parse_all(sdf, RecordKind::Compound);
        assert_eq!(recs[0].cid, Some(9223372036854775807));
    }

    #[test]
    fn only_first_value_line_is_captured() {
        let sdf = b"1\n\n> <CID>\nfirst\nsecond\n\n$$$$\n";
        let recs = parse_all(sdf, RecordKind::Conformer);
        // "first" isn't digits so parent_cid stays None, but we verify that
        // a second candidate line never overwrote a digit-valued first line.
        let sdf2 = b"1\n\n> <CID>\n77\n88\n\n$$$$\n";
        let recs2 = parse_all(sdf2, RecordKind::Conformer);
        assert_eq!(recs2[0].parent_cid, Some(77));
        assert!(recs[0].parent_cid.is_none());
    }

    #[test]
    fn multiple_records_advance_rec_no_and_offsets() {
        let sdf = b"1\n\n$$$$\n2\n\n$$$$\n";
        let recs = parse_all(sdf, RecordKind::Compound);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].rec_no, 0);
        assert_eq!(recs[1].rec_no, 1);
        assert_eq!(recs[1].rec_start, recs[0].rec_end);
    }
}

//! Deterministic internal identifier (ALID) derivation.
//!
//! An ALID is a 128-bit UUID derived via RFC-4122 v5 from
//! `(kind, relative_path, record_index_in_file, primary_id_string)` under a
//! fixed namespace. Identical inputs on two runs always produce identical
//! output — this is the load-bearing property behind "re-run `build()` and
//! get the same ALIDs back."

use uuid::Uuid;

/// UUID namespace URL — `6ba7b811-9dad-11d1-80b4-00c04fd430c8`, the RFC-4122
/// predefined namespace for URLs. Frozen; never change this without bumping
/// the schema version, since it silently reshuffles every ALID in existence.
pub const ALID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6b, 0xa7, 0xb8, 0x11, 0x9d, 0xad, 0x11, 0xd1,
    0x80, 0xb4, 0x00, 0xc0, 0x4f, 0xd4, 0x30, 0xc8,
]);

/// What kind of record this ALID belongs to — folded into the v5 input
/// string so a compound and a conformer can never collide even if they
/// happen to share a record index and primary id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Compound,
    Conformer,
}

impl RecordKind {
    fn label(self) -> &'static str {
        match self {
            RecordKind::Compound  => "compound",
            RecordKind::Conformer => "conformer",
        }
    }

    /// The single-byte prefix for this kind's primary record key.
    pub fn key_prefix(self) -> u8 {
        match self {
            RecordKind::Compound  => b'C',
            RecordKind::Conformer => b'F',
        }
    }
}

/// Derive a record's ALID. `primary_id` is the CID string for compounds or
/// the conformer-id string for conformers, or `""` when neither was parsed.
pub fn make_alid(kind: RecordKind, relpath: &str, rec_no: usize, primary_id: &str) -> Uuid {
    let s = format!("{}|{}|{}|{}", kind.label(), relpath, rec_no, primary_id);
    Uuid::new_v5(&ALID_NAMESPACE, s.as_bytes())
}

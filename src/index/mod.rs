//! Index builder and query engine (C4) — classifies files, drives the
//! parser and store writes during `build`, and resolves keys to locators
//! and record bytes during lookups.

pub mod build;
pub mod classify;
pub mod query;

pub use build::{build_index, BuildOptions};
pub use query::{open_index, IndexHandle};

use uuid::Uuid;

use crate::alid::RecordKind;
use crate::locator::Locator;

/// Length of a primary `records` key: one kind-prefix byte plus a 16-byte
/// ALID.
pub const PRIMARY_KEY_LEN: usize = 17;

/// Pack a primary `records` table key: `prefix_byte || alid_bytes`.
pub fn primary_key(kind: RecordKind, alid: Uuid) -> [u8; PRIMARY_KEY_LEN] {
    let mut out = [0u8; PRIMARY_KEY_LEN];
    out[0] = kind.key_prefix();
    out[1..].copy_from_slice(alid.as_bytes());
    out
}

/// One resolved hit: the record's identity and its decoded byte-range
/// locator. Callers decode UTF-8 from the segment bytes themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHit {
    pub alid: Uuid,
    pub locator: Locator,
}

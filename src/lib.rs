//! # sdfidx — byte-range index over PubChem-style SDF corpora
//!
//! Indexes a directory tree of concatenated-record SDF files so individual
//! compound and conformer records can be retrieved by identifier without
//! re-parsing the source files. Four primary lookups are supported:
//! compound-by-CID, conformer-by-conformer-id, conformer-list-by-CID, and
//! record-by-ALID (a deterministic internal UUID).
//!
//! Guarantees:
//! - All multi-byte integers in the on-disk store are little-endian.
//! - Every stored record resolves to a fixed 32-byte [`locator::Locator`].
//! - ALID derivation is pure: the same input tree produces the same ALIDs
//!   on every build, as long as the directory walk order is unchanged.
//! - `build_index` is a full rebuild; it does not garbage-collect entries
//!   left behind by files that disappeared since a previous build.
//! - Schema version lives in `meta.schema_version`; mismatches fail fast
//!   with [`error::IndexError::SchemaMismatch`].

pub mod alid;
pub mod error;
pub mod index;
pub mod locator;
pub mod parser;
pub mod paths;
pub mod store;

pub use alid::{make_alid, RecordKind, ALID_NAMESPACE};
pub use error::IndexError;
pub use index::{build_index, open_index, BuildOptions, IndexHandle, IndexHit};
pub use locator::{Locator, LOCATOR_SIZE};
pub use store::MetaDict;

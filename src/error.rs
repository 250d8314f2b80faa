//! Error kinds surfaced from the core.
//!
//! `NotFound` is never actually raised by a lookup — a missing key is a
//! normal "absent" outcome represented as `Option::None`. The variant exists
//! so callers building a uniform `Result`-returning wrapper have somewhere
//! to put it; the index API itself never constructs it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    /// Key has no entry. Never raised internally — kept for callers that
    /// want to fold "absent" into a `Result` at their own API boundary.
    #[error("not found")]
    NotFound,

    /// A `records` value is not 32 bytes, or carries an invalid `cid`
    /// sentinel (any negative value other than -1).
    #[error("corrupt locator: {0}")]
    CorruptLocator(String),

    /// A secondary-index entry points to a primary key absent from
    /// `records`. Treated as NotFound by callers; logged here so the dangling
    /// entry isn't silently invisible to anyone debugging the store.
    #[error("dangling reference: secondary key pointed at missing record {0}")]
    DanglingReference(String),

    /// The source SDF file is missing, unreadable, or shorter than the
    /// locator's `end` offset demands.
    #[error("source file I/O error: {0}")]
    FileIO(#[from] std::io::Error),

    /// The embedded key-value engine reported an error; the write
    /// transaction that triggered it is aborted, leaving the store at its
    /// last-committed state.
    #[error("store error: {0}")]
    StoreIO(#[from] lmdb::Error),

    /// `meta.meta_json` exists but does not parse as the expected shape.
    #[error("corrupt metadata record: {0}")]
    CorruptMeta(#[from] serde_json::Error),

    /// `meta.schema_version` does not match the schema version compiled
    /// into this build.
    #[error("schema mismatch: index was built with schema version {found}, this build expects {expected}")]
    SchemaMismatch { found: u32, expected: u32 },
}

//! The `meta` sub-table's JSON-encoded record — one document describing the
//! whole store, read by every query path to sanity-check schema version and
//! reported verbatim by the `get-meta` CLI subcommand.

use serde::{Deserialize, Serialize};

use super::{PL_PAGE_SIZE, SCHEMA_VERSION};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaDict {
    pub schema_version:          u32,
    pub root_dir:                String,
    /// Unix seconds at the moment `build()` finished.
    pub built_at:                i64,
    pub pl_page_size:            u32,
    pub total_files:             u64,
    pub total_records:           u64,
    pub total_compound_records:  u64,
    pub total_conformer_records: u64,
}

impl MetaDict {
    pub fn new(root_dir: String, built_at: i64) -> Self {
        MetaDict {
            schema_version: SCHEMA_VERSION,
            root_dir,
            built_at,
            pl_page_size: PL_PAGE_SIZE,
            total_files: 0,
            total_records: 0,
            total_compound_records: 0,
            total_conformer_records: 0,
        }
    }

    pub fn check_schema(&self) -> Result<(), crate::error::IndexError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(crate::error::IndexError::SchemaMismatch {
                found: self.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(())
    }
}

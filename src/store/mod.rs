//! Persistent store — LMDB-backed key-value layout for the eight sub-tables
//! in spec.md §4.2, plus the monotonic `file_id` counter and the
//! append-only posting-list paging protocol for CID → conformers.
//!
//! # Engine
//!
//! One [`lmdb::Environment`] per index directory, opened with a handful of
//! named sub-databases (LMDB calls them DBIs). One writer at a time, any
//! number of concurrent snapshot readers — this is LMDB's native contract,
//! not something layered on top. The reference Python implementation this
//! crate ports used `lmdb.open(..., map_size=1<<40, max_dbs=32)`; this is
//! the same engine via the `lmdb` crate.
//!
//! # Posting lists
//!
//! A conformer ALID (16 bytes) is appended to the last page of its CID's
//! list if that page holds fewer than `pl_page_size` entries; otherwise a
//! new page is opened and the header page-count incremented. Pages are
//! never compacted or split.

mod meta;

pub use meta::MetaDict;

use std::path::Path;

use lmdb::{Database, DatabaseFlags, Environment, EnvironmentFlags, Transaction, WriteFlags};

use crate::error::IndexError;

/// Entries per posting-list page. Carried in `meta.pl_page_size` so a
/// future reader can tell which page size an existing store was built
/// with, even if this constant changes in a later version.
pub const PL_PAGE_SIZE: u32 = 4096;

pub const SCHEMA_VERSION: u32 = 1;

const TABLE_NAMES: [&str; 8] = [
    "meta",
    "files",
    "files_rev",
    "records",
    "cid_to_compound",
    "confid_to_conf",
    "cid_to_conformers_h",
    "cid_to_conformers_p",
];

const META_KEY_JSON:          &[u8] = b"meta_json";
const META_KEY_FILE_COUNTER:  &[u8] = b"file_id_counter";

/// The open LMDB environment plus handles for every sub-table.
pub struct Store {
    pub env:                    Environment,
    pub db_meta:                Database,
    pub db_files:                Database,
    pub db_files_rev:            Database,
    pub db_records:              Database,
    pub db_cid_to_compound:      Database,
    pub db_confid_to_conf:       Database,
    pub db_cid_to_conformers_h:  Database,
    pub db_cid_to_conformers_p:  Database,
    pub pl_page_size:           u32,
}

impl Store {
    /// Open (creating if absent) a writable store with the given map size.
    pub fn create<P: AsRef<Path>>(index_dir: P, map_size: usize) -> Result<Self, IndexError> {
        std::fs::create_dir_all(&index_dir)?;
        let env = Environment::new()
            .set_max_dbs(TABLE_NAMES.len() as u32)
            .set_map_size(map_size)
            .open(index_dir.as_ref())?;
        Self::from_env(env, true)
    }

    /// Open an existing store read-only. Fails if the directory has no
    /// LMDB environment in it yet.
    pub fn open_readonly<P: AsRef<Path>>(index_dir: P) -> Result<Self, IndexError> {
        let env = Environment::new()
            .set_max_dbs(TABLE_NAMES.len() as u32)
            .set_flags(EnvironmentFlags::READ_ONLY | EnvironmentFlags::NO_LOCK)
            .open(index_dir.as_ref())?;
        Self::from_env(env, false)
    }

    fn from_env(env: Environment, create: bool) -> Result<Self, IndexError> {
        let open_one = |name: &str| -> Result<Database, IndexError> {
            if create {
                Ok(env.create_db(Some(name), DatabaseFlags::empty())?)
            } else {
                Ok(env.open_db(Some(name))?)
            }
        };

        Ok(Store {
            db_meta:                   open_one("meta")?,
            db_files:                  open_one("files")?,
            db_files_rev:              open_one("files_rev")?,
            db_records:                open_one("records")?,
            db_cid_to_compound:        open_one("cid_to_compound")?,
            db_confid_to_conf:         open_one("confid_to_conf")?,
            db_cid_to_conformers_h:    open_one("cid_to_conformers_h")?,
            db_cid_to_conformers_p:    open_one("cid_to_conformers_p")?,
            pl_page_size:              PL_PAGE_SIZE,
            env,
        })
    }

    // ── Metadata ─────────────────────────────────────────────────────────

    pub fn get_meta(&self) -> Result<Option<MetaDict>, IndexError> {
        let txn = self.env.begin_ro_txn()?;
        let result = match txn.get(self.db_meta, &META_KEY_JSON) {
            Ok(bytes) => Some(serde_json::from_slice::<MetaDict>(bytes)?),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.commit()?;
        Ok(result)
    }

    pub fn set_meta(&self, meta: &MetaDict) -> Result<(), IndexError> {
        let bytes = serde_json::to_vec(meta).expect("MetaDict always serializes");
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db_meta, &META_KEY_JSON, &bytes, WriteFlags::empty())?;
        txn.commit()?;
        Ok(())
    }

    // ── File table ───────────────────────────────────────────────────────

    /// Look up or assign a `file_id` for `relpath` within `txn`. The
    /// monotonic counter lives in `meta.file_id_counter`; `file_id` starts
    /// at 1 and is never reused.
    pub fn get_or_create_file_id(
        &self,
        txn: &mut lmdb::RwTransaction,
        relpath: &str,
    ) -> Result<u32, IndexError> {
        let key = relpath.as_bytes();
        match txn.get(self.db_files_rev, &key) {
            Ok(existing) => {
                let file_id = u64::from_le_bytes(existing[..8].try_into().unwrap());
                return Ok(file_id as u32);
            }
            Err(lmdb::Error::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let counter = match txn.get(self.db_meta, &META_KEY_FILE_COUNTER) {
            Ok(bytes) => u64::from_le_bytes(bytes.try_into().unwrap()),
            Err(lmdb::Error::NotFound) => 0,
            Err(e) => return Err(e.into()),
        };
        let file_id = counter + 1;

        txn.put(self.db_meta, &META_KEY_FILE_COUNTER, &file_id.to_le_bytes(), WriteFlags::empty())?;
        txn.put(self.db_files_rev, &key, &file_id.to_le_bytes(), WriteFlags::empty())?;
        txn.put(self.db_files, &file_id.to_le_bytes(), &key, WriteFlags::empty())?;

        Ok(file_id as u32)
    }

    pub fn resolve_file_path(&self, file_id: u32) -> Result<Option<String>, IndexError> {
        let txn = self.env.begin_ro_txn()?;
        let result = match txn.get(self.db_files, &(file_id as u64).to_le_bytes()) {
            Ok(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.commit()?;
        Ok(result)
    }

    // ── Posting lists ────────────────────────────────────────────────────

    /// Append one conformer ALID to `cid`'s posting list within `txn`.
    pub fn pl_append(
        &self,
        txn: &mut lmdb::RwTransaction,
        cid: u64,
        alid_bytes: &[u8; 16],
    ) -> Result<(), IndexError> {
        let cid_key = cid.to_string();
        let page_count = match txn.get(self.db_cid_to_conformers_h, &cid_key.as_bytes()) {
            Ok(bytes) => u32::from_le_bytes(bytes.try_into().unwrap()),
            Err(lmdb::Error::NotFound) => 0,
            Err(e) => return Err(e.into()),
        };

        if page_count == 0 {
            let page_key = format!("{cid_key}|0");
            txn.put(self.db_cid_to_conformers_p, &page_key.as_bytes(), alid_bytes, WriteFlags::empty())?;
            txn.put(self.db_cid_to_conformers_h, &cid_key.as_bytes(), &1u32.to_le_bytes(), WriteFlags::empty())?;
            return Ok(());
        }

        let last_page_no = page_count - 1;
        let last_page_key = format!("{cid_key}|{last_page_no}");
        let existing = match txn.get(self.db_cid_to_conformers_p, &last_page_key.as_bytes()) {
            Ok(bytes) => bytes.to_vec(),
            Err(lmdb::Error::NotFound) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        if (existing.len() / 16) < self.pl_page_size as usize {
            let mut merged = existing;
            merged.extend_from_slice(alid_bytes);
            txn.put(self.db_cid_to_conformers_p, &last_page_key.as_bytes(), &merged, WriteFlags::empty())?;
        } else {
            let new_page_no = page_count;
            let new_page_key = format!("{cid_key}|{new_page_no}");
            txn.put(self.db_cid_to_conformers_p, &new_page_key.as_bytes(), alid_bytes, WriteFlags::empty())?;
            txn.put(
                self.db_cid_to_conformers_h,
                &cid_key.as_bytes(),
                &(page_count + 1).to_le_bytes(),
                WriteFlags::empty(),
            )?;
        }
        Ok(())
    }

    /// Number of posting-list pages recorded for `cid`, or 0 if none.
    pub fn pl_page_count<T: Transaction>(&self, txn: &T, cid: u64) -> Result<u32, IndexError> {
        let cid_key = cid.to_string();
        match txn.get(self.db_cid_to_conformers_h, &cid_key.as_bytes()) {
            Ok(bytes) => Ok(u32::from_le_bytes(bytes.try_into().unwrap())),
            Err(lmdb::Error::NotFound) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Raw bytes of one posting-list page — a concatenation of 16-byte
    /// ALIDs, length always a multiple of 16.
    pub fn pl_read_page<T: Transaction>(&self, txn: &T, cid: u64, page_no: u32) -> Result<Vec<u8>, IndexError> {
        let page_key = format!("{cid}|{page_no}");
        match txn.get(self.db_cid_to_conformers_p, &page_key.as_bytes()) {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(lmdb::Error::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

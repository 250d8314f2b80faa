//! Point, batch, and streaming lookups, plus raw segment reads.
//!
//! Every lookup here is "absent is not an error" — a missing secondary-index
//! entry or a dangling one (pointing at a `records` key that no longer
//! exists) both resolve to `Ok(None)`, logged at `warn` in the dangling
//! case. Nothing in this module ever treats a missing key as a failure.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use lmdb::{RoTransaction, Transaction};
use uuid::Uuid;

use crate::alid::RecordKind;
use crate::error::IndexError;
use crate::locator::Locator;
use crate::store::{MetaDict, Store};

use super::{primary_key, IndexHit};

/// A handle over an open store. Construct via [`open_index`] or
/// [`create_index`](super::build::build_index) (which returns the built
/// `MetaDict` directly — reopen afterwards for lookups).
pub struct IndexHandle {
    store: Store,
}

/// Open an existing index directory. `readonly = false` also accepts
/// writes through the same low-level `Store` API, but every lookup method
/// on `IndexHandle` only ever reads.
pub fn open_index(index_dir: &Path, readonly: bool) -> Result<IndexHandle, IndexError> {
    let store = if readonly {
        Store::open_readonly(index_dir)?
    } else {
        Store::create(index_dir, 1usize << 40)?
    };
    if let Some(meta) = store.get_meta()? {
        meta.check_schema()?;
    }
    Ok(IndexHandle { store })
}

impl IndexHandle {
    pub fn get_meta(&self) -> Result<Option<MetaDict>, IndexError> {
        self.store.get_meta()
    }

    pub fn get_compound_by_cid(&self, cid: u64) -> Result<Option<IndexHit>, IndexError> {
        let txn = self.store.env.begin_ro_txn()?;
        let cid_key = cid.to_string();
        let primary = match txn.get(self.store.db_cid_to_compound, &cid_key.as_bytes()) {
            Ok(bytes) => bytes.to_vec(),
            Err(lmdb::Error::NotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        resolve_primary(&txn, &self.store, &primary)
    }

    pub fn get_conformer_by_conformer_id(&self, conformer_id: &str) -> Result<Option<IndexHit>, IndexError> {
        let txn = self.store.env.begin_ro_txn()?;
        let primary = match txn.get(self.store.db_confid_to_conf, &conformer_id.as_bytes()) {
            Ok(bytes) => bytes.to_vec(),
            Err(lmdb::Error::NotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        resolve_primary(&txn, &self.store, &primary)
    }

    /// Resolves `alid` to a record. With `kind` absent, probes the compound
    /// key first, then the conformer key.
    pub fn get_by_alid(&self, alid: Uuid, kind: Option<RecordKind>) -> Result<Option<IndexHit>, IndexError> {
        let txn = self.store.env.begin_ro_txn()?;
        let candidates = match kind {
            Some(k) => vec![k],
            None => vec![RecordKind::Compound, RecordKind::Conformer],
        };
        for k in candidates {
            let key = primary_key(k, alid);
            if let Some(hit) = resolve_primary(&txn, &self.store, &key)? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }

    /// Lazily yields every conformer belonging to `cid`, in append order
    /// (source-file byte order within a file, directory-walk order across
    /// files). Holds one read transaction for the lifetime of the iterator.
    pub fn iter_conformers_by_cid(&self, cid: u64) -> Result<ConformerIter<'_>, IndexError> {
        ConformerIter::new(&self.store, cid)
    }

    /// One read transaction held for the lifetime of the returned stream,
    /// so results are a consistent snapshot even if a concurrent build
    /// commits midway — the same guarantee `iter_conformers_by_cid` makes.
    /// `chunk_size` has no effect on the underlying reads — LMDB readers
    /// already hold a cheap memory-mapped snapshot, so there is nothing to
    /// amortize by batching them — but it is accepted to match the
    /// documented interface shape for callers who paginate on their side.
    pub fn batch_get_compounds_by_cid<I>(
        &self,
        cids: I,
        _chunk_size: usize,
    ) -> Result<BatchCompoundIter<'_, I::IntoIter>, IndexError>
    where
        I: IntoIterator<Item = u64>,
    {
        let txn = self.store.env.begin_ro_txn()?;
        Ok(BatchCompoundIter { store: &self.store, txn, cids: cids.into_iter() })
    }

    pub fn batch_get_conformers_by_conformer_id<'s, I>(
        &self,
        ids: I,
        _chunk_size: usize,
    ) -> Result<BatchConformerIter<'_, 's, I::IntoIter>, IndexError>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let txn = self.store.env.begin_ro_txn()?;
        Ok(BatchConformerIter {
            store: &self.store,
            txn,
            ids: ids.into_iter(),
            _marker: std::marker::PhantomData,
        })
    }

    /// Resolve `locator.file_id` to a path under `root`, then read exactly
    /// `end - start` bytes starting at `start`.
    pub fn read_segment(&self, root: &Path, locator: &Locator) -> Result<Vec<u8>, IndexError> {
        let relpath = self
            .store
            .resolve_file_path(locator.file_id)?
            .ok_or_else(|| IndexError::DanglingReference(format!("unknown file_id {}", locator.file_id)))?;
        let mut file = File::open(root.join(relpath))?;
        file.seek(SeekFrom::Start(locator.start))?;
        let len = (locator.end - locator.start) as usize;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

fn resolve_primary<T: Transaction>(txn: &T, store: &Store, key: &[u8]) -> Result<Option<IndexHit>, IndexError> {
    match txn.get(store.db_records, &key) {
        Ok(bytes) => {
            let locator = Locator::decode(bytes)?;
            let alid = Uuid::from_slice(&key[1..]).expect("primary key tail is always 16 bytes");
            Ok(Some(IndexHit { alid, locator }))
        }
        Err(lmdb::Error::NotFound) => {
            log::warn!("dangling reference: secondary entry points at missing record {key:02x?}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Streams a CID's conformer posting list page by page.
pub struct ConformerIter<'a> {
    store: &'a Store,
    txn: RoTransaction<'a>,
    cid: u64,
    page_count: u32,
    next_page: u32,
    current_page: Vec<u8>,
    offset: usize,
}

impl<'a> ConformerIter<'a> {
    fn new(store: &'a Store, cid: u64) -> Result<Self, IndexError> {
        let txn = store.env.begin_ro_txn()?;
        let page_count = store.pl_page_count(&txn, cid)?;
        Ok(ConformerIter {
            store,
            txn,
            cid,
            page_count,
            next_page: 0,
            current_page: Vec::new(),
            offset: 0,
        })
    }

    fn load_next_page(&mut self) -> Result<bool, IndexError> {
        if self.next_page >= self.page_count {
            return Ok(false);
        }
        self.current_page = self.store.pl_read_page(&self.txn, self.cid, self.next_page)?;
        self.offset = 0;
        self.next_page += 1;
        Ok(true)
    }
}

impl<'a> Iterator for ConformerIter<'a> {
    type Item = Result<IndexHit, IndexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.offset + 16 <= self.current_page.len() {
                let alid_bytes = &self.current_page[self.offset..self.offset + 16];
                let alid = Uuid::from_slice(alid_bytes).expect("posting-list entries are 16 bytes");
                self.offset += 16;
                let key = primary_key(RecordKind::Conformer, alid);
                match resolve_primary(&self.txn, self.store, &key) {
                    Ok(Some(hit)) => return Some(Ok(hit)),
                    Ok(None) => continue,
                    Err(e) => return Some(Err(e)),
                }
            }
            match self.load_next_page() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Streams `(cid, Opt<IndexHit>)` over one read transaction held for the
/// lifetime of the iterator.
pub struct BatchCompoundIter<'a, I> {
    store: &'a Store,
    txn: RoTransaction<'a>,
    cids: I,
}

impl<'a, I: Iterator<Item = u64>> Iterator for BatchCompoundIter<'a, I> {
    type Item = Result<(u64, Option<IndexHit>), IndexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cid = self.cids.next()?;
        let cid_key = cid.to_string();
        let hit = match self.txn.get(self.store.db_cid_to_compound, &cid_key.as_bytes()) {
            Ok(bytes) => resolve_primary(&self.txn, self.store, &bytes.to_vec()),
            Err(lmdb::Error::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        };
        Some(hit.map(|h| (cid, h)))
    }
}

/// Streams `(conformer_id, Opt<IndexHit>)` over one read transaction held
/// for the lifetime of the iterator.
pub struct BatchConformerIter<'a, 's, I> {
    store: &'a Store,
    txn: RoTransaction<'a>,
    ids: I,
    _marker: std::marker::PhantomData<&'s str>,
}

impl<'a, 's, I: Iterator<Item = &'s str>> Iterator for BatchConformerIter<'a, 's, I> {
    type Item = Result<(String, Option<IndexHit>), IndexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.ids.next()?;
        let hit = match self.txn.get(self.store.db_confid_to_conf, &id.as_bytes()) {
            Ok(bytes) => resolve_primary(&self.txn, self.store, &bytes.to_vec()),
            Err(lmdb::Error::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        };
        Some(hit.map(|h| (id.to_string(), h)))
    }
}

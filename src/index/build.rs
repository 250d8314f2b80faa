//! Driving the parser across a directory tree and writing every table.
//!
//! One write transaction per file (not per record) — large enough to
//! amortize LMDB's commit cost, small enough that a crash mid-build only
//! loses the file currently being indexed.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use lmdb::WriteFlags;

use crate::alid::{make_alid, RecordKind};
use crate::error::IndexError;
use crate::locator::Locator;
use crate::parser::SdfParser;
use crate::paths::sorted_sdf_files;
use crate::store::{MetaDict, Store};

use super::{classify::classify, primary_key};

const READ_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub map_size: usize,
    pub verbose: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions { map_size: 1usize << 40, verbose: true }
    }
}

struct FileStats {
    records: u64,
    compounds: u64,
    conformers: u64,
}

/// Full rebuild over `root` into `index_dir`. Re-running over an unchanged
/// tree reproduces identical ALIDs; re-running after files were added or
/// removed overwrites entries that share a key but does not garbage-collect
/// entries from files that vanished between runs (see the design notes on
/// rebuild semantics).
pub fn build_index(root: &Path, index_dir: &Path, options: BuildOptions) -> Result<MetaDict, IndexError> {
    let store = Store::create(index_dir, options.map_size)?;

    let built_at = Utc::now().timestamp();
    let mut meta = MetaDict::new(root.to_string_lossy().into_owned(), built_at);
    store.set_meta(&meta)?;

    let files = sorted_sdf_files(root);
    let progress = if options.verbose {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
            pb.set_style(style);
        }
        Some(pb)
    } else {
        None
    };

    let mut total_records = 0u64;
    let mut total_compound_records = 0u64;
    let mut total_conformer_records = 0u64;

    for (relpath, abspath) in &files {
        let kind = classify(abspath);
        let stats = index_one_file(&store, relpath, abspath, kind)?;
        total_records += stats.records;
        total_compound_records += stats.compounds;
        total_conformer_records += stats.conformers;
        if let Some(pb) = &progress {
            pb.set_message(relpath.clone());
            pb.inc(1);
        }
    }
    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }

    meta.total_files = files.len() as u64;
    meta.total_records = total_records;
    meta.total_compound_records = total_compound_records;
    meta.total_conformer_records = total_conformer_records;
    store.set_meta(&meta)?;

    info!(
        "indexed {} files, {} records ({} compounds, {} conformers)",
        files.len(),
        total_records,
        total_compound_records,
        total_conformer_records,
    );

    Ok(meta)
}

fn index_one_file(
    store: &Store,
    relpath: &str,
    abspath: &Path,
    kind: RecordKind,
) -> Result<FileStats, IndexError> {
    let mut stats = FileStats { records: 0, compounds: 0, conformers: 0 };

    let file = File::open(abspath)?;
    let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut parser = SdfParser::new(reader, kind);

    let mut txn = store.env.begin_rw_txn()?;
    let file_id = store.get_or_create_file_id(&mut txn, relpath)?;

    while let Some(rec) = parser.next_record()? {
        let (primary_id, is_conformer, effective_cid) = match kind {
            RecordKind::Compound => {
                (rec.cid.map(|c| c.to_string()).unwrap_or_default(), false, rec.cid)
            }
            RecordKind::Conformer => (
                rec.conformer_id.clone().unwrap_or_default(),
                true,
                rec.cid.or(rec.parent_cid),
            ),
        };

        let alid = make_alid(kind, relpath, rec.rec_no, &primary_id);
        let key = primary_key(kind, alid);

        let locator = Locator {
            file_id,
            start: rec.rec_start,
            end: rec.rec_end,
            is_conformer,
            cid: effective_cid,
        };
        let encoded = locator.encode();
        txn.put(store.db_records, &key, &encoded, WriteFlags::empty())?;

        match kind {
            RecordKind::Compound => {
                if let Some(cid) = rec.cid {
                    let cid_key = cid.to_string();
                    txn.put(store.db_cid_to_compound, &cid_key.as_bytes(), &key, WriteFlags::empty())?;
                }
                stats.compounds += 1;
            }
            RecordKind::Conformer => {
                if let Some(conf_id) = &rec.conformer_id {
                    txn.put(store.db_confid_to_conf, &conf_id.as_bytes(), &key, WriteFlags::empty())?;
                }
                if let Some(cid) = effective_cid {
                    store.pl_append(&mut txn, cid, alid.as_bytes())?;
                }
                stats.conformers += 1;
            }
        }
        stats.records += 1;
    }

    txn.commit()?;
    debug!("{relpath}: {} records ({:?})", stats.records, kind);
    Ok(stats)
}

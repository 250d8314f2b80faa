use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use sdfidx::{build_index, open_index, BuildOptions};

#[derive(Parser)]
#[command(name = "sdfidx", version, about = "Byte-range index over PubChem-style SDF corpora")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or rebuild) an index over a directory of .sdf files.
    Build {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        index: PathBuf,
        /// LMDB map size in bytes (default 1 TiB).
        #[arg(long, default_value_t = 1u64 << 40)]
        map_size: u64,
        #[arg(long)]
        quiet: bool,
    },
    /// Look up a compound record by CID.
    GetCompound {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        cid: u64,
    },
    /// Look up a conformer record by conformer id.
    GetConformer {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        confid: String,
    },
    /// Stream the conformer records belonging to a CID.
    ListConformers {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        cid: u64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

/// Bytes of record text shown for a single-record lookup, matching the
/// original CLI's `seg[:4000]` preview window.
const PREVIEW_BYTES: usize = 4000;

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), sdfidx::IndexError> {
    match Cli::parse().command {
        Commands::Build { root, index, map_size, quiet } => {
            let meta = build_index(
                &root,
                &index,
                BuildOptions { map_size: map_size as usize, verbose: !quiet },
            )?;
            println!("{}", serde_json::to_string_pretty(&meta).expect("MetaDict always serializes"));
        }

        Commands::GetCompound { root, index, cid } => {
            let handle = open_index(&index, true)?;
            match handle.get_compound_by_cid(cid)? {
                None => println!("NOT FOUND"),
                Some(hit) => {
                    let seg = handle.read_segment(&root, &hit.locator)?;
                    print_hit(&hit, &seg);
                }
            }
        }

        Commands::GetConformer { root, index, confid } => {
            let handle = open_index(&index, true)?;
            match handle.get_conformer_by_conformer_id(&confid)? {
                None => println!("NOT FOUND"),
                Some(hit) => {
                    let seg = handle.read_segment(&root, &hit.locator)?;
                    print_hit(&hit, &seg);
                }
            }
        }

        Commands::ListConformers { root: _, index, cid, limit } => {
            let handle = open_index(&index, true)?;
            let mut count = 0usize;
            for hit in handle.iter_conformers_by_cid(cid)? {
                let hit = hit?;
                println!(
                    "[{count}] ALID={} file_id={} start={} end={} cid={}",
                    hit.alid,
                    hit.locator.file_id,
                    hit.locator.start,
                    hit.locator.end,
                    hit.locator.cid.map(|c| c.to_string()).unwrap_or_else(|| "None".into()),
                );
                count += 1;
                if count >= limit {
                    break;
                }
            }
            println!("shown {count}");
        }
    }
    Ok(())
}

fn print_hit(hit: &sdfidx::IndexHit, seg: &[u8]) {
    println!("ALID={}", hit.alid);
    println!(
        "file_id={} start={} end={} cid={}",
        hit.locator.file_id,
        hit.locator.start,
        hit.locator.end,
        hit.locator.cid.map(|c| c.to_string()).unwrap_or_else(|| "None".into()),
    );
    let truncated = &seg[..seg.len().min(PREVIEW_BYTES)];
    println!("{}", String::from_utf8_lossy(truncated));
}

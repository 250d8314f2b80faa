use sdfidx::{build_index, open_index, BuildOptions};
use std::fs;
use std::path::Path;

fn write_sdf(root: &Path, relpath: &str, contents: &str) {
    let path = root.join(relpath);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn build_opts() -> BuildOptions {
    BuildOptions { map_size: 64 * 1024 * 1024, verbose: false }
}

#[test]
fn single_compound_file_round_trips() {
    let root = tempfile::tempdir().unwrap();
    let index_dir = tempfile::tempdir().unwrap();

    write_sdf(
        root.path(),
        "compound/c1.sdf",
        "2244\n\n\n> <PUBCHEM_COMPOUND_CID>\n2244\n\n$$$$\n",
    );

    build_index(root.path(), index_dir.path(), build_opts()).unwrap();
    let handle = open_index(index_dir.path(), true).unwrap();

    let hit = handle.get_compound_by_cid(2244).unwrap().expect("2244 indexed");
    assert!(!hit.locator.is_conformer);
    assert_eq!(hit.locator.start, 0);
    let file_len = fs::metadata(root.path().join("compound/c1.sdf")).unwrap().len();
    assert_eq!(hit.locator.end, file_len);

    assert!(handle.get_compound_by_cid(9999).unwrap().is_none());

    let seg = handle.read_segment(root.path(), &hit.locator).unwrap();
    assert!(seg.ends_with(b"$$$$\n"));
}

#[test]
fn conformer_file_with_parent_cid() {
    let root = tempfile::tempdir().unwrap();
    let index_dir = tempfile::tempdir().unwrap();

    write_sdf(
        root.path(),
        "conformer/c1.sdf",
        "conf-title\n\n\n> <PUBCHEM_CONFORMER_ID>\n0000000100000001\n\n> <PUBCHEM_COMPOUND_CID>\n1\n\n$$$$\n",
    );

    build_index(root.path(), index_dir.path(), build_opts()).unwrap();
    let handle = open_index(index_dir.path(), true).unwrap();

    let hit = handle
        .get_conformer_by_conformer_id("0000000100000001")
        .unwrap()
        .expect("conformer indexed");
    assert!(hit.locator.is_conformer);
    assert_eq!(hit.locator.cid, Some(1));

    let conformers: Vec<_> = handle.iter_conformers_by_cid(1).unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(conformers.len(), 1);
    assert_eq!(conformers[0].alid, hit.alid);
}

#[test]
fn multi_conformer_cid_pages_at_4096() {
    let root = tempfile::tempdir().unwrap();
    let index_dir = tempfile::tempdir().unwrap();

    let mut sdf = String::new();
    for i in 0..5000 {
        sdf.push_str(&format!(
            "conf-{i}\n\n\n> <PUBCHEM_CONFORMER_ID>\nC{i:04}\n\n> <PUBCHEM_COMPOUND_CID>\n7\n\n$$$$\n"
        ));
    }
    write_sdf(root.path(), "conformer/big.sdf", &sdf);

    build_index(root.path(), index_dir.path(), build_opts()).unwrap();
    let handle = open_index(index_dir.path(), true).unwrap();

    let hits: Vec<_> = handle.iter_conformers_by_cid(7).unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(hits.len(), 5000);

    // 5000 conformers at a 4096-entry page size means exactly 2 pages.
    let first = handle.get_conformer_by_conformer_id("C0000").unwrap().unwrap();
    let last = handle.get_conformer_by_conformer_id("C4999").unwrap().unwrap();
    assert_ne!(first.alid, last.alid);
}

#[test]
fn alid_is_stable_across_independent_builds() {
    let root = tempfile::tempdir().unwrap();
    write_sdf(
        root.path(),
        "compound/c1.sdf",
        "100\n\n\n> <CID>\n100\n\n$$$$\n200\n\n\n> <CID>\n200\n\n$$$$\n",
    );

    let index_a = tempfile::tempdir().unwrap();
    let index_b = tempfile::tempdir().unwrap();
    build_index(root.path(), index_a.path(), build_opts()).unwrap();
    build_index(root.path(), index_b.path(), build_opts()).unwrap();

    let handle_a = open_index(index_a.path(), true).unwrap();
    let handle_b = open_index(index_b.path(), true).unwrap();

    for cid in [100u64, 200u64] {
        let a = handle_a.get_compound_by_cid(cid).unwrap().unwrap();
        let b = handle_b.get_compound_by_cid(cid).unwrap().unwrap();
        assert_eq!(a.alid, b.alid);
    }
}

#[test]
fn batch_lookups_preserve_order_and_report_misses() {
    let root = tempfile::tempdir().unwrap();
    let index_dir = tempfile::tempdir().unwrap();

    write_sdf(
        root.path(),
        "compound/c1.sdf",
        "1\n\n$$$$\n2\n\n$$$$\n",
    );

    build_index(root.path(), index_dir.path(), build_opts()).unwrap();
    let handle = open_index(index_dir.path(), true).unwrap();

    let results: Vec<(u64, Option<sdfidx::IndexHit>)> = handle
        .batch_get_compounds_by_cid([1, 2, 999], 64)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, 1);
    assert!(results[0].1.is_some());
    assert_eq!(results[1].0, 2);
    assert!(results[1].1.is_some());
    assert_eq!(results[2].0, 999);
    assert!(results[2].1.is_none());
}

#[test]
fn batch_conformer_lookup_is_a_lazy_stream() {
    let root = tempfile::tempdir().unwrap();
    let index_dir = tempfile::tempdir().unwrap();

    write_sdf(
        root.path(),
        "conformer/c1.sdf",
        "a\n\n\n> <PUBCHEM_CONFORMER_ID>\nA\n\n$$$$\nb\n\n\n> <PUBCHEM_CONFORMER_ID>\nB\n\n$$$$\n",
    );

    build_index(root.path(), index_dir.path(), build_opts()).unwrap();
    let handle = open_index(index_dir.path(), true).unwrap();

    let ids = vec!["A", "MISSING", "B"];
    let mut stream = handle.batch_get_conformers_by_conformer_id(ids.iter().copied(), 64).unwrap();

    // The result type is a plain `Iterator`, not a pre-collected `Vec` — it
    // can be driven one item at a time without resolving the rest upfront.
    let (id, hit) = stream.next().unwrap().unwrap();
    assert_eq!(id, "A");
    assert!(hit.is_some());

    let (id, hit) = stream.next().unwrap().unwrap();
    assert_eq!(id, "MISSING");
    assert!(hit.is_none());

    let (id, hit) = stream.next().unwrap().unwrap();
    assert_eq!(id, "B");
    assert!(hit.is_some());

    assert!(stream.next().is_none());
}

#[test]
fn get_meta_reports_totals_after_build() {
    let root = tempfile::tempdir().unwrap();
    let index_dir = tempfile::tempdir().unwrap();

    write_sdf(root.path(), "compound/c1.sdf", "1\n\n$$$$\n");
    write_sdf(
        root.path(),
        "conformer/c1.sdf",
        "conf\n\n\n> <PUBCHEM_CONFORMER_ID>\nX\n\n> <PUBCHEM_COMPOUND_CID>\n1\n\n$$$$\n",
    );

    build_index(root.path(), index_dir.path(), build_opts()).unwrap();
    let handle = open_index(index_dir.path(), true).unwrap();
    let meta = handle.get_meta().unwrap().expect("meta written during build");

    assert_eq!(meta.schema_version, 1);
    assert_eq!(meta.total_files, 2);
    assert_eq!(meta.total_compound_records, 1);
    assert_eq!(meta.total_conformer_records, 1);
}

//! Path normalization and deterministic directory walk.
//!
//! `file_id` assignment and ALID derivation both depend on the order files
//! are enumerated in, so the walk must be sorted before anything else
//! touches it — see spec.md §9.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Normalize a path relative to `root` into a forward-slash UTF-8 string,
/// regardless of the platform path separator.
pub fn normalize_relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Enumerate every `*.sdf` file under `root`, returning normalized relative
/// paths sorted lexicographically (byte-wise on the UTF-8 string). The sort
/// is what makes `file_id` assignment and ALID derivation reproducible
/// across runs over an unchanged tree.
pub fn sorted_sdf_files(root: &Path) -> Vec<(String, PathBuf)> {
    let mut files: Vec<(String, PathBuf)> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("sdf"))
                .unwrap_or(false)
        })
        .map(|entry| {
            let abs = entry.into_path();
            let rel = normalize_relative(root, &abs);
            (rel, abs)
        })
        .collect();

    files.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walk_is_sorted_and_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("b/z.sdf"), b"").unwrap();
        fs::write(dir.path().join("a/y.sdf"), b"").unwrap();
        fs::write(dir.path().join("a/ignore.txt"), b"").unwrap();

        let found = sorted_sdf_files(dir.path());
        let names: Vec<&str> = found.iter().map(|(rel, _)| rel.as_str()).collect();
        assert_eq!(names, vec!["a/y.sdf", "b/z.sdf"]);
    }
}

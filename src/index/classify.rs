//! File classification by filename pattern.
//!
//! TODO: this is a known-weak heuristic (see design notes) — a future
//! version should probe the first few records of each file for a
//! conformer-id field and use these patterns only to bias probe order.

use std::path::Path;

use crate::alid::RecordKind;

const CONFORMER_PATTERNS: &[&str] = &["conformer", "conformers", "conf"];
const COMPOUND_PATTERNS: &[&str] = &["compound", "compounds", "cmpd"];

/// Classify a file as compound or conformer by its basename. Conformer
/// patterns are checked first; a bare `"conf"` substring anywhere in the
/// lowercased basename forces conformer kind even without a full pattern
/// match. Falls back to compound when nothing matches.
pub fn classify(path: &Path) -> RecordKind {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if CONFORMER_PATTERNS.iter().any(|p| name.contains(p)) {
        return RecordKind::Conformer;
    }
    if COMPOUND_PATTERNS.iter().any(|p| name.contains(p)) {
        return RecordKind::Compound;
    }
    if name.contains("conf") {
        return RecordKind::Conformer;
    }
    RecordKind::Compound
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn matches_conformer_directory_style_names() {
        assert_eq!(classify(&PathBuf::from("conformer/c1.sdf")), RecordKind::Conformer);
        assert_eq!(classify(&PathBuf::from("data/Conformers_00007.sdf")), RecordKind::Conformer);
    }

    #[test]
    fn matches_compound_style_names() {
        assert_eq!(classify(&PathBuf::from("compound/c1.sdf")), RecordKind::Compound);
        assert_eq!(classify(&PathBuf::from("Compounds_000001.sdf")), RecordKind::Compound);
    }

    #[test]
    fn bare_conf_substring_forces_conformer() {
        assert_eq!(classify(&PathBuf::from("misc_conf_chunk7.sdf")), RecordKind::Conformer);
    }

    #[test]
    fn unmatched_name_defaults_to_compound() {
        assert_eq!(classify(&PathBuf::from("batch_0042.sdf")), RecordKind::Compound);
    }
}

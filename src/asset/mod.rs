//! Static asset pass-through.
//!
//! Configured asset paths (images, section fragments) are copied byte-for-byte
//! from the source directory to the same relative location under the output.

mod process;

pub use process::{AssetReport, collect_assets, copy_assets};

use jwalk::WalkDir;
use std::path::{Path, PathBuf};

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files from a directory recursively
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_all_files_recursive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/one.png"), "").unwrap();
        fs::write(dir.path().join("a/b/two.png"), "").unwrap();
        fs::write(dir.path().join("a/.DS_Store"), "").unwrap();

        let files = collect_all_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| !p.ends_with(".DS_Store")));
    }

    #[test]
    fn test_collect_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(collect_all_files(&dir.path().join("nope")).is_empty());
    }
}

//! Asset copying.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::logger::ProgressLine;
use crate::{debug, log};

use super::collect_all_files;

/// Files resolved from the configured asset paths.
#[derive(Debug, Default)]
pub struct AssetFiles {
    /// `(source file, path relative to the source root)`
    pub files: Vec<(PathBuf, PathBuf)>,
    /// Configured paths that did not exist.
    pub missing: Vec<PathBuf>,
}

/// Outcome of an asset pass.
#[derive(Debug, Default)]
pub struct AssetReport {
    pub copied: usize,
    pub missing: Vec<PathBuf>,
    /// Copy failures; the remaining assets are still copied.
    pub failures: Vec<(PathBuf, anyhow::Error)>,
}

/// Expand configured asset paths (files or directories) into files.
pub fn collect_assets(source_dir: &Path, assets: &[PathBuf]) -> AssetFiles {
    let mut out = AssetFiles::default();
    for asset in assets {
        let path = source_dir.join(asset);
        if path.is_file() {
            out.files.push((path, asset.clone()));
        } else if path.is_dir() {
            for file in collect_all_files(&path) {
                let rel = file
                    .strip_prefix(source_dir)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| asset.join(file.file_name().unwrap_or_default()));
                out.files.push((file, rel));
            }
        } else {
            out.missing.push(asset.clone());
        }
    }
    out
}

/// Copy assets to `output_dir`, preserving relative paths.
pub fn copy_assets(
    assets: AssetFiles,
    output_dir: &Path,
    progress: Option<&ProgressLine>,
) -> AssetReport {
    for missing in &assets.missing {
        log!("skip"; "asset {} not found", missing.display());
    }

    let failures: Vec<(PathBuf, anyhow::Error)> = assets
        .files
        .par_iter()
        .filter_map(|(source, rel)| {
            let result = copy_one(source, &output_dir.join(rel));
            if let Some(p) = progress {
                p.inc("assets");
            }
            match result {
                Ok(()) => {
                    debug!("assets"; "{}", rel.display());
                    None
                }
                Err(e) => Some((rel.clone(), e)),
            }
        })
        .collect();

    AssetReport {
        copied: assets.files.len() - failures.len(),
        missing: assets.missing,
        failures,
    }
}

fn copy_one(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(source, dest).with_context(|| {
        format!(
            "Failed to copy asset from {} to {}",
            source.display(),
            dest.display()
        )
    })?;
    Ok(())
}

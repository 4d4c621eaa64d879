//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "."                 # Directory holding authored pages and scripts
//! output = "dist"              # Output directory (relative to site root)
//! manifest = "_redirects"      # Redirect manifest file name under output
//! scripts = ["auth-guard.js"]  # Scripts that get injection + rewriting
//! assets = ["images", "Sections"]  # Files/dirs copied through unchanged
//! ```

use crate::config::ConfigDiagnostics;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory holding the authored pages.
    pub source: PathBuf,

    /// Build output directory.
    pub output: PathBuf,

    /// Redirect manifest file name, written under `output`.
    pub manifest: String,

    /// Client-side scripts processed like pages but kept under their own name.
    pub scripts: Vec<String>,

    /// Static files and directories copied as-is (relative to `source`).
    pub assets: Vec<PathBuf>,

    /// Remove the output directory before building (CLI only).
    #[serde(skip)]
    pub clean: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            output: PathBuf::from("dist"),
            manifest: "_redirects".to_string(),
            scripts: vec!["auth-guard.js".to_string()],
            assets: vec![PathBuf::from("images"), PathBuf::from("Sections")],
            clean: false,
        }
    }
}

impl BuildConfig {
    /// Validate build configuration.
    ///
    /// `dest_files` are the files the page table will write under `output`.
    pub fn validate(&self, dest_files: &FxHashSet<String>, diag: &mut ConfigDiagnostics) {
        if self.manifest.is_empty() {
            diag.error("build.manifest", "manifest file name must not be empty");
        } else if self.manifest.contains(['/', '\\']) {
            diag.error("build.manifest", "manifest must be a file name, not a path");
        } else if dest_files.contains(&self.manifest) {
            diag.error(
                "build.manifest",
                format!("`{}` is also a page output file", self.manifest),
            );
        }

        // Covers `source == output`; `--clean` removes the whole output tree.
        if self.source.starts_with(&self.output) {
            diag.error_with_hint(
                "build.output",
                format!(
                    "output directory `{}` contains the source directory",
                    self.output.display()
                ),
                "use a separate directory such as `dist` next to or under the source",
            );
        }

        let mut seen = FxHashSet::default();
        for script in &self.scripts {
            if script.is_empty() {
                diag.error("build.scripts", "script name must not be empty");
            } else if !seen.insert(script.as_str()) {
                diag.error("build.scripts", format!("`{script}` listed more than once"));
            } else if dest_files.contains(script) {
                diag.error(
                    "build.scripts",
                    format!("`{script}` would overwrite a page output file"),
                );
            }
        }

        for asset in &self.assets {
            if asset.is_absolute() {
                diag.error(
                    "build.assets",
                    format!("`{}` must be relative to the source directory", asset.display()),
                );
            }
        }
    }
}

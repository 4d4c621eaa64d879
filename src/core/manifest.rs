//! Host redirect manifest generation.
//!
//! Generates a `_redirects` file from the slug registry.
//!
//! # Manifest Format
//!
//! ```text
//! /cambridge-pathway  /cambridge-pathway.html  200
//! /message-board  /message-board.html  200
//! /CambridgePathwaySimulator.html  /cambridge-pathway  301
//! /messageboard.html  /message-board  301
//! ```
//!
//! All serve rules come first so no redirect can shadow them. The root entry
//! gets no rules; serving `/` from `index.html` is the host default.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use super::registry::{SlugEntry, SlugRegistry};

/// HTTP status of a manifest rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuleKind {
    /// Rewrite: serve the file with 200.
    Serve,
    /// Permanent redirect: 301.
    Redirect,
}

impl RuleKind {
    pub const fn status(self) -> u16 {
        match self {
            Self::Serve => 200,
            Self::Redirect => 301,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectRule {
    pub from: String,
    pub to: String,
    pub kind: RuleKind,
}

impl RedirectRule {
    fn serve(entry: &SlugEntry) -> Self {
        Self {
            from: entry.target(),
            to: format!("/{}", entry.dest_file()),
            kind: RuleKind::Serve,
        }
    }

    /// `None` when the legacy filename already is the served file.
    fn redirect(entry: &SlugEntry) -> Option<Self> {
        (entry.source_id != entry.dest_file()).then(|| Self {
            from: entry.legacy_path(),
            to: entry.target(),
            kind: RuleKind::Redirect,
        })
    }
}

impl fmt::Display for RedirectRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}  {}", self.from, self.to, self.kind.status())
    }
}

/// Ordered ruleset: serve block, then redirect block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedirectManifest {
    rules: Vec<RedirectRule>,
}

impl RedirectManifest {
    pub fn generate(registry: &SlugRegistry) -> Self {
        let pages = || registry.entries().iter().filter(|e| !e.is_root());

        let mut rules: Vec<RedirectRule> = pages().map(RedirectRule::serve).collect();
        rules.extend(pages().filter_map(RedirectRule::redirect));

        Self { rules }
    }

    pub fn rules(&self) -> &[RedirectRule] {
        &self.rules
    }

    pub fn serve_rules(&self) -> impl Iterator<Item = &RedirectRule> {
        self.rules.iter().filter(|r| r.kind == RuleKind::Serve)
    }

    pub fn redirect_rules(&self) -> impl Iterator<Item = &RedirectRule> {
        self.rules.iter().filter(|r| r.kind == RuleKind::Redirect)
    }

    /// Write the manifest as `output_dir/file_name`.
    pub fn write(&self, output_dir: &Path, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        let path = output_dir.join(file_name);
        fs::write(&path, self.to_string())
            .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
        Ok(path)
    }
}

impl fmt::Display for RedirectManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

//! Document emission: inject placeholders, rewrite links, write one file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::inject::Placeholders;
use super::registry::SlugRegistry;
use super::rewrite::LinkRewriter;

/// Per-document emission failure.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The authored file does not exist. Callers skip it and keep building.
    #[error("source `{0}` not found")]
    SourceMissing(String),

    #[error("`{0}` is not a registered page")]
    NotRegistered(String),

    #[error("IO error on `{}`", .0.display())]
    Io(PathBuf, #[source] io::Error),
}

impl EmitError {
    /// Whether this error should only skip the document.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::SourceMissing(_))
    }
}

/// Outcome of one successful emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub source_id: String,
    /// File name under the output root.
    pub dest_file: String,
    pub path: PathBuf,
}

/// Writes rendered documents under the output root.
#[derive(Debug, Clone, Copy)]
pub struct Emitter<'a> {
    registry: &'a SlugRegistry,
    placeholders: &'a Placeholders,
    rewriter: &'a LinkRewriter,
    source_dir: &'a Path,
    output_dir: &'a Path,
}

impl<'a> Emitter<'a> {
    pub fn new(
        registry: &'a SlugRegistry,
        placeholders: &'a Placeholders,
        rewriter: &'a LinkRewriter,
        source_dir: &'a Path,
        output_dir: &'a Path,
    ) -> Self {
        Self {
            registry,
            placeholders,
            rewriter,
            source_dir,
            output_dir,
        }
    }

    /// Placeholder injection followed by link rewriting.
    pub fn render(&self, raw: &str) -> String {
        let injected = self.placeholders.apply(raw);
        self.rewriter.rewrite(&injected, self.registry).into_owned()
    }

    /// Emit a registered page to `dest_file_for(source_id)`.
    pub fn emit(&self, source_id: &str) -> Result<Emitted, EmitError> {
        let dest_file = self
            .registry
            .dest_file_for(source_id)
            .ok_or_else(|| EmitError::NotRegistered(source_id.to_string()))?;
        self.emit_as(source_id, dest_file)
    }

    /// Emit a script under its own name, with the same two passes.
    pub fn emit_script(&self, name: &str) -> Result<Emitted, EmitError> {
        self.emit_as(name, name.to_string())
    }

    fn emit_as(&self, source_id: &str, dest_file: String) -> Result<Emitted, EmitError> {
        let source = self.source_dir.join(source_id);
        if !source.is_file() {
            return Err(EmitError::SourceMissing(source_id.to_string()));
        }

        let raw = fs::read_to_string(&source).map_err(|e| EmitError::Io(source.clone(), e))?;
        let rendered = self.render(&raw);

        let path = self.output_dir.join(&dest_file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| EmitError::Io(parent.to_path_buf(), e))?;
        }
        fs::write(&path, rendered).map_err(|e| EmitError::Io(path.clone(), e))?;

        Ok(Emitted {
            source_id: source_id.to_string(),
            dest_file,
            path,
        })
    }
}

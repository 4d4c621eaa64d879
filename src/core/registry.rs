//! Slug registry: the authoritative source id <-> slug table.
//!
//! Built once per build from the `[[pages]]` table and never mutated. Every
//! consumer (emitter, link rewriter, manifest generator) reads the same
//! instance, so they cannot disagree about a mapping.
//!
//! # Invariants
//!
//! | Check          | Rejected input                                          |
//! |----------------|---------------------------------------------------------|
//! | source ids     | the same filename registered twice                      |
//! | slugs          | two filenames sharing a slug (including the root `""`) |
//! | dest files     | two slugs writing the same file (`""` and `index`)      |
//! | legacy paths   | a filename equal to another entry's `slug.html`         |
//! | tokens         | ids/slugs that could not be matched or served verbatim  |
//!
//! All violations are collected and reported together before anything is
//! written to disk.

use std::collections::hash_map::Entry;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

/// Destination file of the site root.
pub const ROOT_FILE: &str = "index.html";

/// Extension appended to a slug to form its destination file.
const HTML_EXT: &str = ".html";

/// One publishable document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugEntry {
    /// Authored filename, e.g. `CambridgePathwaySimulator.html`.
    pub source_id: String,
    /// Published path segment, empty for the site root.
    pub slug: String,
}

impl SlugEntry {
    pub fn new(source_id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            slug: slug.into(),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.slug.is_empty()
    }

    /// File written under the output root: `index.html` or `slug.html`.
    pub fn dest_file(&self) -> String {
        if self.is_root() {
            ROOT_FILE.to_string()
        } else {
            format!("{}{HTML_EXT}", self.slug)
        }
    }

    /// Clean path links are rewritten to: `/` or `/slug`.
    pub fn target(&self) -> String {
        format!("/{}", self.slug)
    }

    /// Filename-based path the page used to be served from.
    pub fn legacy_path(&self) -> String {
        format!("/{}", self.source_id)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A single registry invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    DuplicateSource(String),
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },
    MultipleRoots(Vec<String>),
    DuplicateDest {
        dest: String,
        first: String,
        second: String,
    },
    LegacyShadowsDest {
        source_id: String,
        owner: String,
    },
    MalformedSource(String),
    MalformedSlug {
        source_id: String,
        slug: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSource(id) => write!(f, "source `{id}` is registered more than once"),
            Self::DuplicateSlug {
                slug,
                first,
                second,
            } => write!(f, "slug `{slug}` is shared by `{first}` and `{second}`"),
            Self::MultipleRoots(ids) => {
                write!(f, "multiple root pages (empty slug): {}", ids.join(", "))
            }
            Self::DuplicateDest {
                dest,
                first,
                second,
            } => write!(f, "`{first}` and `{second}` would both be written to `{dest}`"),
            Self::LegacyShadowsDest { source_id, owner } => write!(
                f,
                "source `{source_id}` has the same name as the output file of `{owner}`"
            ),
            Self::MalformedSource(id) => write!(
                f,
                "source `{id}` must be a relative path without `.`/`..` segments, quotes, whitespace, `\\`, `#` or `?`"
            ),
            Self::MalformedSlug { source_id, slug } => write!(
                f,
                "slug `{slug}` of `{source_id}` must use only [A-Za-z0-9._~-], not be all dots and not end with .html"
            ),
        }
    }
}

/// Registry construction failed; nothing may be emitted.
#[derive(Debug, Error)]
#[error("invalid page table:\n{}", format_violations(.violations))]
pub struct RegistryError {
    pub violations: Vec<Violation>,
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Registry
// ============================================================================

/// Validated, immutable slug table.
#[derive(Debug, Clone, Default)]
pub struct SlugRegistry {
    /// Authoring order; drives manifest ordering.
    entries: Vec<SlugEntry>,
    by_source: FxHashMap<String, usize>,
    by_slug: FxHashMap<String, usize>,
}

impl SlugRegistry {
    /// Validate and index `entries`, keeping their order.
    pub fn build<I, S, T>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let entries: Vec<SlugEntry> = entries
            .into_iter()
            .map(|(source, slug)| SlugEntry::new(source, slug))
            .collect();

        let mut violations = Vec::new();
        let mut by_source = FxHashMap::default();
        let mut by_slug: FxHashMap<String, usize> = FxHashMap::default();

        for (idx, entry) in entries.iter().enumerate() {
            if !is_valid_source(&entry.source_id) {
                violations.push(Violation::MalformedSource(entry.source_id.clone()));
            }
            if !is_valid_slug(&entry.slug) {
                violations.push(Violation::MalformedSlug {
                    source_id: entry.source_id.clone(),
                    slug: entry.slug.clone(),
                });
            }

            if by_source.insert(entry.source_id.clone(), idx).is_some() {
                violations.push(Violation::DuplicateSource(entry.source_id.clone()));
                continue;
            }

            // Multiple roots get one aggregated violation below.
            if entry.is_root() && by_slug.contains_key("") {
                continue;
            }
            if let Some(&first) = by_slug.get(&entry.slug) {
                violations.push(Violation::DuplicateSlug {
                    slug: entry.slug.clone(),
                    first: entries[first].source_id.clone(),
                    second: entry.source_id.clone(),
                });
            } else {
                by_slug.insert(entry.slug.clone(), idx);
            }
        }

        let roots: Vec<String> = entries
            .iter()
            .filter(|e| e.is_root())
            .map(|e| e.source_id.clone())
            .collect();
        if roots.len() > 1 {
            violations.push(Violation::MultipleRoots(roots));
        }

        check_dest_files(&entries, &mut violations);

        if violations.is_empty() {
            Ok(Self {
                entries,
                by_source,
                by_slug,
            })
        } else {
            Err(RegistryError { violations })
        }
    }

    /// All entries in authoring order.
    #[inline]
    pub fn entries(&self) -> &[SlugEntry] {
        &self.entries
    }

    pub fn get(&self, source_id: &str) -> Option<&SlugEntry> {
        self.by_source.get(source_id).map(|&idx| &self.entries[idx])
    }

    pub fn resolve_slug(&self, source_id: &str) -> Option<&str> {
        self.get(source_id).map(|e| e.slug.as_str())
    }

    /// Inverse of [`resolve_slug`](Self::resolve_slug).
    pub fn resolve_source(&self, slug: &str) -> Option<&str> {
        self.by_slug
            .get(slug)
            .map(|&idx| self.entries[idx].source_id.as_str())
    }

    pub fn dest_file_for(&self, source_id: &str) -> Option<String> {
        self.get(source_id).map(SlugEntry::dest_file)
    }

    pub fn root(&self) -> Option<&SlugEntry> {
        self.by_slug.get("").map(|&idx| &self.entries[idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every entry must own its destination file, and a legacy filename must
/// never name a file another entry is served from, or its 301 rule would
/// shadow that entry's 200 rule.
fn check_dest_files(entries: &[SlugEntry], violations: &mut Vec<Violation>) {
    // First claim wins.
    let mut dest_owner: FxHashMap<String, &SlugEntry> = FxHashMap::default();
    for entry in entries {
        match dest_owner.entry(entry.dest_file()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            // Equal slugs and equal sources are reported on their own.
            Entry::Occupied(slot) => {
                let first = *slot.get();
                if first.slug != entry.slug && first.source_id != entry.source_id {
                    violations.push(Violation::DuplicateDest {
                        dest: slot.key().clone(),
                        first: first.source_id.clone(),
                        second: entry.source_id.clone(),
                    });
                }
            }
        }
    }

    for entry in entries {
        if let Some(owner) = dest_owner.get(&entry.source_id)
            && owner.source_id != entry.source_id
        {
            violations.push(Violation::LegacyShadowsDest {
                source_id: entry.source_id.clone(),
                owner: owner.source_id.clone(),
            });
        }
    }
}

fn is_valid_source(id: &str) -> bool {
    !id.is_empty()
        && id.split('/').all(|seg| !matches!(seg, "" | "." | ".."))
        && !id
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '#' | '?' | '\\'))
}

fn is_valid_slug(slug: &str) -> bool {
    let dots_only = !slug.is_empty() && slug.chars().all(|c| c == '.');
    !dots_only
        && !slug.ends_with(HTML_EXT)
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SlugRegistry {
        SlugRegistry::build([
            ("index.html", ""),
            ("library.html", "library"),
            ("messageboard.html", "message-board"),
            ("CambridgePathwaySimulator.html", "cambridge-pathway"),
        ])
        .unwrap()
    }

    #[test]
    fn test_dest_file_and_target() {
        let root = SlugEntry::new("index.html", "");
        assert_eq!(root.dest_file(), "index.html");
        assert_eq!(root.target(), "/");

        let page = SlugEntry::new("messageboard.html", "message-board");
        assert_eq!(page.dest_file(), "message-board.html");
        assert_eq!(page.target(), "/message-board");
        assert_eq!(page.legacy_path(), "/messageboard.html");
    }

    #[test]
    fn test_bijection_round_trip() {
        let registry = sample();
        for entry in registry.entries() {
            let slug = registry.resolve_slug(&entry.source_id).unwrap();
            assert_eq!(registry.resolve_source(slug), Some(entry.source_id.as_str()));
            let source = registry.resolve_source(&entry.slug).unwrap();
            assert_eq!(registry.resolve_slug(source), Some(entry.slug.as_str()));
        }
    }

    #[test]
    fn test_entries_keep_authoring_order() {
        let registry = sample();
        let ids: Vec<_> = registry.entries().iter().map(|e| e.source_id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "index.html",
                "library.html",
                "messageboard.html",
                "CambridgePathwaySimulator.html"
            ]
        );
    }

    #[test]
    fn test_lookups() {
        let registry = sample();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.root().map(|e| e.source_id.as_str()), Some("index.html"));
        assert_eq!(
            registry.dest_file_for("CambridgePathwaySimulator.html").as_deref(),
            Some("cambridge-pathway.html")
        );
        assert_eq!(registry.get("index.html").map(SlugEntry::target).as_deref(), Some("/"));
        assert_eq!(registry.resolve_slug("missing.html"), None);
        assert_eq!(registry.dest_file_for("missing.html"), None);
    }

    #[test]
    fn test_no_root_is_allowed() {
        let registry = SlugRegistry::build([("a.html", "a-page")]).unwrap();
        assert!(registry.root().is_none());
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let err = SlugRegistry::build([("a.html", "same"), ("b.html", "same")]).unwrap_err();
        assert_eq!(
            err.violations,
            vec![Violation::DuplicateSlug {
                slug: "same".into(),
                first: "a.html".into(),
                second: "b.html".into(),
            }]
        );
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let err = SlugRegistry::build([("a.html", "one"), ("a.html", "two")]).unwrap_err();
        assert_eq!(err.violations, vec![Violation::DuplicateSource("a.html".into())]);
    }

    #[test]
    fn test_multiple_roots_rejected_once() {
        let err = SlugRegistry::build([("index.html", ""), ("home.html", ""), ("x.html", "")])
            .unwrap_err();
        assert_eq!(
            err.violations,
            vec![Violation::MultipleRoots(vec![
                "index.html".into(),
                "home.html".into(),
                "x.html".into()
            ])]
        );
    }

    #[test]
    fn test_legacy_path_shadowing_dest_rejected() {
        // `a.html` would redirect to /b while /a is served from a.html.
        let err = SlugRegistry::build([("A.html", "a"), ("a.html", "b")]).unwrap_err();
        assert_eq!(
            err.violations,
            vec![Violation::LegacyShadowsDest {
                source_id: "a.html".into(),
                owner: "A.html".into(),
            }]
        );
    }

    #[test]
    fn test_root_and_index_slug_share_dest_rejected() {
        let err = SlugRegistry::build([("index.html", ""), ("home.html", "index")]).unwrap_err();
        assert_eq!(
            err.violations,
            vec![Violation::DuplicateDest {
                dest: "index.html".into(),
                first: "index.html".into(),
                second: "home.html".into(),
            }]
        );
        assert!(err.to_string().contains("would both be written to `index.html`"));
    }

    #[test]
    fn test_source_equal_to_own_dest_is_fine() {
        let registry = SlugRegistry::build([("library.html", "library")]).unwrap();
        assert_eq!(registry.dest_file_for("library.html").as_deref(), Some("library.html"));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let err = SlugRegistry::build([
            ("./a.html", "a"),
            ("b c.html", "b"),
            ("d.html", "nested/d"),
            ("e.html", "e.html"),
        ])
        .unwrap_err();
        assert_eq!(err.violations.len(), 4);
        assert!(matches!(err.violations[0], Violation::MalformedSource(_)));
        assert!(matches!(err.violations[2], Violation::MalformedSlug { .. }));
    }

    #[test]
    fn test_dot_slugs_and_parent_segments_rejected() {
        for slug in [".", "..", "..."] {
            let err = SlugRegistry::build([("a.html", slug)]).unwrap_err();
            assert!(matches!(err.violations[0], Violation::MalformedSlug { .. }), "{slug}");
        }
        for source in ["../a.html", "pages/../a.html", "pages\\a.html", "/a.html", "pages//a.html"] {
            let err = SlugRegistry::build([(source, "a")]).unwrap_err();
            assert_eq!(err.violations, vec![Violation::MalformedSource(source.into())], "{source}");
        }
        // Dots inside a slug and nested sources stay valid.
        assert!(SlugRegistry::build([("pages/a.html", "v1.2"), ("b.html", ".well")]).is_ok());
    }

    #[test]
    fn test_all_violations_collected() {
        let err = SlugRegistry::build([
            ("a.html", "x"),
            ("b.html", "x"),
            ("a.html", "y"),
            ("", "z"),
        ])
        .unwrap_err();
        assert_eq!(err.violations.len(), 3);
        let message = err.to_string();
        assert!(message.contains("slug `x` is shared by `a.html` and `b.html`"));
        assert!(message.contains("source `a.html` is registered more than once"));
    }
}

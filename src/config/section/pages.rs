//! `[[pages]]` table: one entry per published page.
//!
//! # Example
//!
//! ```toml
//! [[pages]]
//! source = "index.html"
//! slug = ""                    # the site root
//!
//! [[pages]]
//! source = "CambridgePathwaySimulator.html"
//! slug = "cambridge-pathway"
//! ```
//!
//! Order matters: it is the order of the redirect manifest.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Authored filename, relative to `[build].source`.
    pub source: String,

    /// Published path segment; empty for the root page.
    #[serde(default)]
    pub slug: String,
}

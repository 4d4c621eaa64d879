//! Clean-URL core: slug registry, link rewriting, emission, redirect manifest.
//!
//! ```text
//! SlugRegistry ──┬──► Emitter (inject ─► rewrite ─► write dest_file)
//!                └──► RedirectManifest (serve rules, then 301 rules)
//! ```

pub mod emit;
pub mod inject;
pub mod manifest;
pub mod registry;
pub mod rewrite;

pub use emit::{EmitError, Emitted, Emitter};
pub use inject::Placeholders;
pub use manifest::{RedirectManifest, RedirectRule};
pub use registry::{RegistryError, SlugEntry, SlugRegistry};
pub use rewrite::LinkRewriter;

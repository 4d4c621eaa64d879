//! Configuration section definitions.
//!
//! Each module corresponds to a section in `slugsite.toml`:
//!
//! | Module    | TOML Section  | Purpose                                  |
//! |-----------|---------------|------------------------------------------|
//! | `build`   | `[build]`     | Source/output paths, scripts, assets     |
//! | `rewrite` | `[rewrite]`   | Attributes and navigation properties     |
//! | `pages`   | `[[pages]]`   | Source filename to slug table            |

mod build;
mod pages;
mod rewrite;

pub use build::BuildConfig;
pub use pages::PageEntry;
pub use rewrite::RewriteConfig;

//! Site configuration management for `slugsite.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── pages      # [[pages]]
//! │   └── rewrite    # [rewrite]
//! ├── types/         # ConfigError, ConfigDiagnostics
//! ├── util.rs        # Config discovery, path resolution
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section       | Purpose                                            |
//! |---------------|----------------------------------------------------|
//! | `[build]`     | Source/output paths, manifest name, scripts, assets|
//! | `[rewrite]`   | Attributes and script properties to rewrite        |
//! | `[inject]`    | Placeholder token -> environment variable name     |
//! | `[[pages]]`   | Ordered source filename -> slug table              |

pub mod section;
pub mod types;
mod util;

pub use section::{BuildConfig, PageEntry, RewriteConfig};
pub use types::{ConfigDiagnostics, ConfigError};

use crate::{
    cli::{BuildArgs, Cli, Commands},
    core::{LinkRewriter, Placeholders, RegistryError, SlugRegistry},
    log,
};
use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{MapAccess, Visitor},
};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use util::{find_config_file, normalize_path, resolve_config_path};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing slugsite.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Link rewriting settings
    #[serde(default)]
    pub rewrite: RewriteConfig,

    /// Placeholder token -> environment variable name, in authoring order
    #[serde(default, deserialize_with = "ordered_pairs")]
    pub inject: Vec<(String, String)>,

    /// Published pages, in manifest order
    #[serde(default)]
    pub pages: Vec<PageEntry>,
}

impl SiteConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file; the project root is the
    /// config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path =
            find_config_file(&cli.config).ok_or_else(|| ConfigError::NotFound(cli.config.clone()))?;

        let mut config = Self::from_path(&config_path)?;
        config.config_path = normalize_path(&config_path);
        config.finalize(cli);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve root, apply CLI overrides, normalize paths.
    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.root = normalize_path(&root);

        self.apply_command_options(cli);
        self.normalize_paths();
    }

    /// Get path relative to the site root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli) {
        Self::update_option(&mut self.build.source, cli.source.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        match &cli.command {
            Commands::Build { build_args } => self.apply_build_args(build_args),
            Commands::Routes { .. } => {}
        }
    }

    fn apply_build_args(&mut self, args: &BuildArgs) {
        crate::logger::set_verbose(args.verbose);
        self.build.clean = args.clean;
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    fn normalize_paths(&mut self) {
        self.build.source = resolve_config_path(&self.build.source, &self.root);
        self.build.output = resolve_config_path(&self.build.output, &self.root);
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once. The page
    /// table itself is validated by [`SlugRegistry::build`].
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        let dest_files: FxHashSet<String> = self
            .pages
            .iter()
            .map(|p| crate::core::SlugEntry::new(p.source.as_str(), p.slug.as_str()).dest_file())
            .collect();

        self.build.validate(&dest_files, &mut diag);
        self.rewrite.validate(&mut diag);
        self.validate_inject(&mut diag);

        if self.pages.is_empty() {
            diag.warn("pages", "no pages registered, only scripts and assets will be built");
        }

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    fn validate_inject(&self, diag: &mut ConfigDiagnostics) {
        for (token, var) in &self.inject {
            if token.is_empty() {
                diag.error("inject", "placeholder token must not be empty");
            }
            if var.is_empty() {
                diag.error(
                    format!("inject.{token}"),
                    "environment variable name must not be empty",
                );
            }
        }
    }

    // ========================================================================
    // pipeline inputs
    // ========================================================================

    /// Build the slug registry from `[[pages]]`.
    pub fn registry(&self) -> Result<SlugRegistry, RegistryError> {
        SlugRegistry::build(
            self.pages
                .iter()
                .map(|p| (p.source.as_str(), p.slug.as_str())),
        )
    }

    /// Resolve `[inject]` against the process environment.
    pub fn placeholders(&self) -> Placeholders {
        Placeholders::from_env(
            self.inject
                .iter()
                .map(|(token, var)| (token.clone(), var.clone())),
        )
    }

    /// Compile `[rewrite]`.
    pub fn rewriter(&self) -> Result<LinkRewriter> {
        self.rewrite
            .rewriter()
            .map_err(ConfigError::Pattern)
            .context("failed to compile rewrite patterns")
    }
}

// ============================================================================
// helpers
// ============================================================================

/// Deserialize a `key = "value"` table into pairs, keeping document order.
fn ordered_pairs<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table of `placeholder = \"ENV_VAR\"` entries")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(pair) = map.next_entry()? {
                pairs.push(pair);
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_map(PairsVisitor)
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(SiteConfig::parse_with_ignored("[build\nsource = \".\"").is_err());
    }

    #[test]
    fn test_site_config_default() {
        let config = SiteConfig::default();
        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.build.manifest, "_redirects");
        assert!(config.pages.is_empty());
        assert!(config.inject.is_empty());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[build]\nmanifest = \"_redirects\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.build.manifest, "_redirects");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_unknown_page_field_detected() {
        let content = "[[pages]]\nsource = \"a.html\"\nslgu = \"a\"";
        let (_, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
        assert!(ignored.iter().any(|f| f.contains("slgu")));
    }

    #[test]
    fn test_registry_from_pages() {
        let config = test_parse_config(
            "[[pages]]\nsource = \"index.html\"\n[[pages]]\nsource = \"library.html\"\nslug = \"library\"",
        );
        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve_slug("library.html"), Some("library"));
    }

    #[test]
    fn test_registry_error_from_pages() {
        let config = test_parse_config(
            "[[pages]]\nsource = \"a.html\"\nslug = \"x\"\n[[pages]]\nsource = \"b.html\"\nslug = \"x\"",
        );
        assert!(config.registry().is_err());
    }

    #[test]
    fn test_placeholders_from_inject() {
        let config = test_parse_config(
            "[inject]\n__SLUGSITE_TEST_TOKEN__ = \"SLUGSITE_TEST_SURELY_UNSET_VAR\"",
        );
        let table = config.placeholders();
        let item = table.iter().next().unwrap();
        assert_eq!(item.token, "__SLUGSITE_TEST_TOKEN__");
        assert_eq!(item.var, "SLUGSITE_TEST_SURELY_UNSET_VAR");
        assert_eq!(item.value, None);
    }

    #[test]
    fn test_inject_keeps_authoring_order() {
        let config = test_parse_config(
            "[inject]\n__Z_KEY__ = \"Z_VAR\"\n__A_KEY__ = \"A_VAR\"\n__M_KEY__ = \"M_VAR\"",
        );
        let tokens: Vec<&str> = config.inject.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tokens, ["__Z_KEY__", "__A_KEY__", "__M_KEY__"]);

        let placeholders = config.placeholders();
        let vars: Vec<&str> = placeholders.iter().map(|p| p.var.as_str()).collect();
        assert_eq!(vars, ["Z_VAR", "A_VAR", "M_VAR"]);
    }

    #[test]
    fn test_inject_rejects_non_string_value() {
        assert!(SiteConfig::parse_with_ignored("[inject]\n__KEY__ = 3").is_err());
    }

    #[test]
    fn test_validate_collects_errors() {
        let mut config = test_parse_config(
            "[build]\nmanifest = \"\"\n[inject]\n__A__ = \"\"\n[[pages]]\nsource = \"index.html\"",
        );
        config.build.source = PathBuf::from("/site");
        config.build.output = PathBuf::from("/site/dist");
        let err = config.validate().unwrap_err();
        let diag = err.downcast_ref::<ConfigError>().unwrap();
        let ConfigError::Diagnostics(diag) = diag else {
            panic!("expected diagnostics");
        };
        assert_eq!(diag.errors().len(), 2);
    }

    #[test]
    fn test_root_relative() {
        let config = SiteConfig {
            root: PathBuf::from("/site"),
            ..SiteConfig::default()
        };
        assert_eq!(config.root_relative("/site/dist/index.html"), PathBuf::from("dist/index.html"));
        assert_eq!(config.root_relative("/other/x"), PathBuf::from("/other/x"));
    }
}

//! Site building orchestration.
//!
//! Build pipeline phases:
//! - **Registry** - Build and validate the page table (fatal on violation)
//! - **Init** - Clean (optional) and create the output directory
//! - **Emit** - Parallel page emission, manifest generation alongside
//! - **Scripts** - Pass-through scripts under their own names
//! - **Assets** - Copy configured static files unchanged
//! - **Finalize** - Skips, placeholder summary, failures

use crate::{
    asset::{AssetReport, collect_assets, copy_assets},
    config::SiteConfig,
    core::{EmitError, Emitted, Emitter, LinkRewriter, Placeholders, RedirectManifest, SlugRegistry},
    debug, log,
    logger::ProgressLine,
    utils::plural_count,
};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Build the whole site described by `config`.
///
/// Registry violations abort before anything is written. Per-document IO
/// failures are collected; the remaining work still runs and the build then
/// returns an error.
pub fn build_site(config: &SiteConfig, quiet: bool) -> Result<BuildReport> {
    let registry = config.registry()?;
    let placeholders = config.placeholders();
    let rewriter = config.rewriter()?;
    let options = BuildOptions::from_config(config);

    let report = Pipeline::new(&options, &registry, &placeholders, &rewriter).run(quiet)?;

    if !quiet {
        if lacks_root(&registry) {
            log!("warning"; "no page has an empty slug, `/` is not served from the page table");
        }
        log_placeholders(&placeholders);
        log_build_result(&report, &config.root_relative(&options.output_dir));
    }

    if report.has_failures() {
        for (name, error) in report.failures() {
            log!("error"; "{}: {:#}", name, error);
        }
        bail!(
            "Build failed: {}",
            plural_count(report.failures().count(), "error")
        );
    }

    Ok(report)
}

// ============================================================================
// options and report
// ============================================================================

/// Resolved filesystem inputs of one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub manifest: String,
    pub scripts: Vec<String>,
    pub assets: Vec<PathBuf>,
    pub clean: bool,
}

impl BuildOptions {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            source_dir: config.build.source.clone(),
            output_dir: config.build.output.clone(),
            manifest: config.build.manifest.clone(),
            scripts: config.build.scripts.clone(),
            assets: config.build.assets.clone(),
            clean: config.build.clean,
        }
    }
}

/// Aggregated outcome of a build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Pages and scripts written, pages in registry order first.
    pub emitted: Vec<Emitted>,
    /// Sources that did not exist.
    pub skipped: Vec<String>,
    /// Documents that could not be read or written.
    pub errors: Vec<(String, EmitError)>,
    /// Manifest path, or the error that prevented writing it.
    pub manifest: Option<Result<PathBuf>>,
    pub assets: AssetReport,
}

impl BuildReport {
    /// All failures, documents first, then manifest, then assets.
    pub fn failures(&self) -> impl Iterator<Item = (String, String)> + '_ {
        let documents = self
            .errors
            .iter()
            .map(|(name, e)| (name.clone(), format!("{e:#}")));
        let manifest = self
            .manifest
            .iter()
            .filter_map(|m| m.as_ref().err())
            .map(|e| ("manifest".to_string(), format!("{e:#}")));
        let assets = self
            .assets
            .failures
            .iter()
            .map(|(path, e)| (path.display().to_string(), format!("{e:#}")));
        documents.chain(manifest).chain(assets)
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    fn record(&mut self, name: &str, result: Result<Emitted, EmitError>) {
        match result {
            Ok(emitted) => self.emitted.push(emitted),
            Err(e) if e.is_skip() => self.skipped.push(name.to_string()),
            Err(e) => self.errors.push((name.to_string(), e)),
        }
    }
}

// ============================================================================
// pipeline
// ============================================================================

/// One build over an already validated registry.
pub struct Pipeline<'a> {
    options: &'a BuildOptions,
    registry: &'a SlugRegistry,
    placeholders: &'a Placeholders,
    rewriter: &'a LinkRewriter,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        options: &'a BuildOptions,
        registry: &'a SlugRegistry,
        placeholders: &'a Placeholders,
        rewriter: &'a LinkRewriter,
    ) -> Self {
        Self {
            options,
            registry,
            placeholders,
            rewriter,
        }
    }

    /// Run every phase. Only output directory setup is fatal here.
    pub fn run(&self, quiet: bool) -> Result<BuildReport> {
        let output = &self.options.output_dir;
        init_output(output, self.options.clean)?;

        let emitter = Emitter::new(
            self.registry,
            self.placeholders,
            self.rewriter,
            &self.options.source_dir,
            output,
        );
        let assets = collect_assets(&self.options.source_dir, &self.options.assets);
        let progress = (!quiet).then(|| {
            ProgressLine::new(&[
                ("pages", self.registry.len()),
                ("scripts", self.options.scripts.len()),
                ("assets", assets.files.len()),
            ])
        });

        let (pages, manifest) = rayon::join(
            || self.emit_pages(emitter, progress.as_ref()),
            || self.write_manifest(),
        );

        let mut report = BuildReport::default();
        for (source_id, result) in pages {
            report.record(source_id, result);
        }
        for name in &self.options.scripts {
            report.record(name, emitter.emit_script(name));
            if let Some(p) = &progress {
                p.inc("scripts");
            }
        }
        report.manifest = Some(manifest);
        report.assets = copy_assets(assets, output, progress.as_ref());

        if let Some(p) = progress {
            p.finish();
        }

        for name in &report.skipped {
            log!("skip"; "{} not found", name);
        }

        Ok(report)
    }

    /// Emit every registered page in parallel; results keep registry order.
    fn emit_pages(
        &self,
        emitter: Emitter<'a>,
        progress: Option<&ProgressLine>,
    ) -> Vec<(&'a str, Result<Emitted, EmitError>)> {
        self.registry
            .entries()
            .par_iter()
            .map(|entry| {
                let result = emitter.emit(&entry.source_id);
                if let Ok(emitted) = &result {
                    debug!("emit"; "{} -> {}", emitted.source_id, emitted.dest_file);
                }
                if let Some(p) = progress {
                    p.inc("pages");
                }
                (entry.source_id.as_str(), result)
            })
            .collect()
    }

    fn write_manifest(&self) -> Result<PathBuf> {
        let manifest = RedirectManifest::generate(self.registry);
        debug!(
            "manifest";
            "{} serve, {} redirect",
            manifest.serve_rules().count(),
            manifest.redirect_rules().count()
        );
        manifest.write(&self.options.output_dir, &self.options.manifest)
    }
}

/// Create the output directory, removing it first when `clean` is set.
fn init_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

// ============================================================================
// finalize
// ============================================================================

/// Pages are registered but none of them is the site root.
fn lacks_root(registry: &SlugRegistry) -> bool {
    !registry.is_empty() && registry.root().is_none()
}

/// Report which placeholders were resolved. Values are never printed.
fn log_placeholders(placeholders: &Placeholders) {
    for item in placeholders.iter() {
        let set = item.value.as_deref().is_some_and(|v| !v.is_empty());
        let state = if set { "[SET]" } else { "[NOT SET]" };
        log!("inject"; "{} ({}): {}", item.token, item.var, state);
    }
}

fn log_build_result(report: &BuildReport, output: &Path) {
    let mut parts = vec![plural_count(report.emitted.len(), "file")];
    if report.assets.copied > 0 {
        parts.push(plural_count(report.assets.copied, "asset"));
    }
    if !report.skipped.is_empty() {
        parts.push(format!("{} skipped", report.skipped.len()));
    }

    if report.emitted.is_empty() && report.assets.copied == 0 {
        log!("warning"; "output is empty, check [[pages]] and [build].source");
    } else {
        log!("done"; "{} in {}", parts.join(", "), output.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[build]
scripts = ["auth-guard.js"]
assets = ["images"]

[[pages]]
source = "index.html"
slug = ""

[[pages]]
source = "messageboard.html"
slug = "message-board"

[[pages]]
source = "CambridgePathwaySimulator.html"
slug = "cambridge-pathway"
"#;

    fn site() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("site");
        fs::create_dir_all(src.join("images")).unwrap();
        fs::write(
            src.join("index.html"),
            r#"<a href="./messageboard.html">Board</a><a href="CambridgePathwaySimulator.html">Sim</a>"#,
        )
        .unwrap();
        fs::write(src.join("messageboard.html"), r#"<a href="index.html">Home</a>"#).unwrap();
        fs::write(
            src.join("auth-guard.js"),
            "if (!user) { window.location.href = \"index.html\"; }\n",
        )
        .unwrap();
        fs::write(src.join("images/logo.png"), "png").unwrap();

        let mut config = test_parse_config(CONFIG);
        config.root = dir.path().to_path_buf();
        config.build.source = src;
        config.build.output = dir.path().join("dist");
        (dir, config)
    }

    #[test]
    fn test_build_site_outputs() {
        let (dir, config) = site();
        let report = build_site(&config, true).unwrap();
        let out = dir.path().join("dist");

        assert_eq!(
            fs::read_to_string(out.join("index.html")).unwrap(),
            r#"<a href="/message-board">Board</a><a href="/cambridge-pathway">Sim</a>"#
        );
        assert_eq!(
            fs::read_to_string(out.join("message-board.html")).unwrap(),
            r#"<a href="/">Home</a>"#
        );
        assert_eq!(
            fs::read_to_string(out.join("auth-guard.js")).unwrap(),
            "if (!user) { window.location.href = \"/\"; }\n"
        );
        assert!(out.join("images/logo.png").is_file());
        assert!(!out.join("messageboard.html").exists());

        let manifest = fs::read_to_string(out.join("_redirects")).unwrap();
        assert!(manifest.contains("/cambridge-pathway  /cambridge-pathway.html  200\n"));
        assert!(manifest.contains("/CambridgePathwaySimulator.html  /cambridge-pathway  301\n"));

        // Simulator source was never written, so it is skipped, not fatal.
        assert_eq!(report.skipped, ["CambridgePathwaySimulator.html"]);
        assert_eq!(report.emitted.len(), 3);
        assert!(!report.has_failures());
    }

    #[test]
    fn test_emitted_in_registry_order() {
        let (_dir, config) = site();
        let report = build_site(&config, true).unwrap();
        let names: Vec<&str> = report.emitted.iter().map(|e| e.dest_file.as_str()).collect();
        assert_eq!(names, ["index.html", "message-board.html", "auth-guard.js"]);
    }

    #[test]
    fn test_registry_violation_writes_nothing() {
        let (dir, mut config) = site();
        config.pages[1].slug = "cambridge-pathway".to_string();
        assert!(build_site(&config, true).is_err());
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_clean_removes_stale_files() {
        let (dir, mut config) = site();
        let out = dir.path().join("dist");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.html"), "old").unwrap();

        build_site(&config, true).unwrap();
        assert!(out.join("stale.html").exists());

        config.build.clean = true;
        build_site(&config, true).unwrap();
        assert!(!out.join("stale.html").exists());
        assert!(out.join("index.html").exists());
    }

    #[test]
    fn test_write_failure_fails_build_after_other_work() {
        let (dir, config) = site();
        let out = dir.path().join("dist");
        // A directory where a page file should be written.
        fs::create_dir_all(out.join("message-board.html")).unwrap();

        let err = build_site(&config, true).unwrap_err();
        assert!(err.to_string().contains("Build failed"));
        assert!(out.join("index.html").is_file());
        assert!(out.join("_redirects").is_file());
        assert!(out.join("images/logo.png").is_file());
    }

    #[test]
    fn test_lacks_root() {
        let with_root = SlugRegistry::build([("index.html", ""), ("a.html", "a")]).unwrap();
        let without_root = SlugRegistry::build([("a.html", "a")]).unwrap();
        let empty = SlugRegistry::build(Vec::<(String, String)>::new()).unwrap();
        assert!(!lacks_root(&with_root));
        assert!(lacks_root(&without_root));
        assert!(!lacks_root(&empty));
    }

    #[test]
    fn test_placeholders_injected() {
        let (dir, mut config) = site();
        fs::write(
            config.build.source.join("index.html"),
            r#"<script>const key = "__SLUGSITE_BUILD_TEST__";</script>"#,
        )
        .unwrap();
        config
            .inject
            .push(("__SLUGSITE_BUILD_TEST__".into(), "SLUGSITE_BUILD_TEST_UNSET".into()));

        build_site(&config, true).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("dist/index.html")).unwrap(),
            r#"<script>const key = "";</script>"#
        );
    }
}

//! `routes` command: show the route table without building.

use crate::{
    config::SiteConfig,
    core::{RedirectManifest, RedirectRule, SlugRegistry},
};
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// One registry entry with its derived paths.
#[derive(Debug, Serialize)]
struct RouteJson<'a> {
    source: &'a str,
    slug: &'a str,
    dest_file: String,
    target: String,
}

#[derive(Debug, Serialize)]
struct RoutesJson<'a> {
    pages: Vec<RouteJson<'a>>,
    rules: &'a [RedirectRule],
}

/// Validate the page table and print the manifest (or JSON) to stdout.
pub fn print_routes(config: &SiteConfig, json: bool) -> Result<()> {
    let registry = config.registry()?;
    let output = render_routes(&registry, json)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn render_routes(registry: &SlugRegistry, json: bool) -> Result<String> {
    let manifest = RedirectManifest::generate(registry);
    if !json {
        return Ok(manifest.to_string());
    }

    let routes = RoutesJson {
        pages: registry
            .entries()
            .iter()
            .map(|e| RouteJson {
                source: &e.source_id,
                slug: &e.slug,
                dest_file: e.dest_file(),
                target: e.target(),
            })
            .collect(),
        rules: manifest.rules(),
    };
    let mut text = serde_json::to_string_pretty(&routes)?;
    text.push('\n');
    Ok(text)
}

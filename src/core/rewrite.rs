//! Clean-URL link rewriting over raw HTML and script text.
//!
//! Two reference shapes are recognized:
//!
//! | Shape       | Example                                   | Result                     |
//! |-------------|-------------------------------------------|----------------------------|
//! | Attribute   | `<a href="./messageboard.html">`          | `<a href="/message-board">`|
//! | Navigation  | `window.location.href = "index.html";`    | `window.location.href = "/";` |
//!
//! The quoted value, minus one optional `./`, must equal a registered source
//! id exactly. Anything else, including `library.html#top` or an unregistered
//! `external.html`, is left byte-identical. Targets always start with `/` and
//! source ids never do, so rewriting is idempotent.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::registry::SlugRegistry;

/// Attributes whose quoted value may name a page.
pub const DEFAULT_ATTRIBUTES: &[&str] = &["href", "src", "action"];

/// Script properties whose assignment navigates to a page.
pub const DEFAULT_NAVIGATION: &[&str] = &[
    "window.location.href",
    "window.location",
    "document.location.href",
    "document.location",
    "location.href",
    "location",
];

const SAME_DIR: &str = "./";

static STANDARD: LazyLock<LinkRewriter> = LazyLock::new(|| {
    LinkRewriter::new(DEFAULT_ATTRIBUTES, DEFAULT_NAVIGATION)
        .expect("built-in rewrite patterns compile")
});

/// Rewrite `text` with the default attribute and navigation sets.
pub fn rewrite<'t>(text: &'t str, registry: &SlugRegistry) -> Cow<'t, str> {
    STANDARD.rewrite(text, registry)
}

/// Compiled matchers for one attribute set and one navigation set.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    attribute: Option<Regex>,
    navigation: Option<Regex>,
}

impl LinkRewriter {
    /// Compile matchers. An empty list disables that shape.
    pub fn new<A, N>(attributes: &[A], navigation: &[N]) -> Result<Self, regex::Error>
    where
        A: AsRef<str>,
        N: AsRef<str>,
    {
        let attribute = match alternation(attributes) {
            Some(names) => Some(Regex::new(&format!(
                r#"(?P<prefix>\s(?i:{names})\s*=\s*)(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#
            ))?),
            None => None,
        };

        // The leading class keeps `mylocation = ...` and `a.location = ...`
        // from matching `location`.
        let navigation = match alternation(navigation) {
            Some(props) => Some(Regex::new(&format!(
                r#"(?P<prefix>(?:^|[^\w.$])(?:{props})\s*=\s*)(?:"(?P<dq>[^"\\\r\n]*)"|'(?P<sq>[^'\\\r\n]*)'|`(?P<bq>[^`\\$]*)`)"#
            ))?),
            None => None,
        };

        Ok(Self {
            attribute,
            navigation,
        })
    }

    /// Built-in attribute and navigation sets.
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Replace every recognized reference to a registered page with its clean path.
    pub fn rewrite<'t>(&self, text: &'t str, registry: &SlugRegistry) -> Cow<'t, str> {
        let text = match &self.attribute {
            Some(re) => replace_refs(re, Cow::Borrowed(text), registry),
            None => Cow::Borrowed(text),
        };
        match &self.navigation {
            Some(re) => replace_refs(re, text, registry),
            None => text,
        }
    }
}

/// Escaped `a|b|c`, longest first, or `None` for an empty set.
fn alternation<S: AsRef<str>>(items: &[S]) -> Option<String> {
    let mut items: Vec<&str> = items
        .iter()
        .map(AsRef::as_ref)
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return None;
    }
    items.sort_by_key(|s| std::cmp::Reverse(s.len()));
    items.dedup();
    Some(
        items
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|"),
    )
}

fn replace_refs<'t>(re: &Regex, text: Cow<'t, str>, registry: &SlugRegistry) -> Cow<'t, str> {
    if !re.is_match(&text) {
        return text;
    }
    let replaced = re
        .replace_all(&text, |caps: &Captures| replace_one(caps, registry))
        .into_owned();
    Cow::Owned(replaced)
}

fn replace_one(caps: &Captures, registry: &SlugRegistry) -> String {
    let (quote, value) = if let Some(m) = caps.name("dq") {
        ('"', m.as_str())
    } else if let Some(m) = caps.name("sq") {
        ('\'', m.as_str())
    } else if let Some(m) = caps.name("bq") {
        ('`', m.as_str())
    } else {
        return caps[0].to_string();
    };

    let file = value.strip_prefix(SAME_DIR).unwrap_or(value);
    match registry.get(file) {
        Some(entry) => format!("{}{quote}{}{quote}", &caps["prefix"], entry.target()),
        None => caps[0].to_string(),
    }
}

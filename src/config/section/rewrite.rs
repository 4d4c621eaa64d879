//! `[rewrite]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [rewrite]
//! attributes = ["href", "src", "action"]
//! navigation = ["window.location.href", "location.href", "location"]
//! ```

use crate::config::ConfigDiagnostics;
use crate::core::LinkRewriter;
use crate::core::rewrite::{DEFAULT_ATTRIBUTES, DEFAULT_NAVIGATION};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// HTML attributes whose quoted value may reference a page.
    pub attributes: Vec<String>,

    /// Script properties whose assignment navigates to a page.
    pub navigation: Vec<String>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            attributes: DEFAULT_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
            navigation: DEFAULT_NAVIGATION.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RewriteConfig {
    /// Compile the configured sets.
    pub fn rewriter(&self) -> Result<LinkRewriter, regex::Error> {
        LinkRewriter::new(self.attributes.as_slice(), self.navigation.as_slice())
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for name in &self.attributes {
            if !is_attribute_name(name) {
                diag.error("rewrite.attributes", format!("`{name}` is not an attribute name"));
            }
        }
        for prop in &self.navigation {
            if !prop.split('.').all(is_identifier) {
                diag.error_with_hint(
                    "rewrite.navigation",
                    format!("`{prop}` is not a property path"),
                    "use dotted identifiers such as `window.location.href`",
                );
            }
        }
        if self.attributes.is_empty() && self.navigation.is_empty() {
            diag.warn("rewrite", "both sets are empty, links will not be rewritten");
        }
    }
}

fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '_' | '$'))
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$'))
}

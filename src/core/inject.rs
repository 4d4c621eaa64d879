//! Placeholder substitution for environment-supplied values.
//!
//! Pages carry literal tokens such as `__FIREBASE_API_KEY__`; the table maps
//! each token to the value read from the environment when the config was
//! resolved. Values are opaque and never contain source-id tokens, so the
//! order relative to link rewriting does not matter.

use std::borrow::Cow;

/// Ordered placeholder -> value table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    items: Vec<Placeholder>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub token: String,
    /// Environment variable the value came from.
    pub var: String,
    /// `None` when the variable was unset; substitutes as empty.
    pub value: Option<String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `(token, env var)` pairs through `lookup`.
    pub fn resolve<I, F>(pairs: I, lookup: F) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
        F: Fn(&str) -> Option<String>,
    {
        let items = pairs
            .into_iter()
            .map(|(token, var)| {
                let value = lookup(&var);
                Placeholder { token, var, value }
            })
            .collect();
        Self { items }
    }

    /// Resolve against the process environment.
    pub fn from_env<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::resolve(pairs, |var| std::env::var(var).ok())
    }

    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        self.items.push(Placeholder {
            var: token.clone(),
            token,
            value: Some(value.into()),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placeholder> {
        self.items.iter()
    }

    /// Replace every occurrence of every token.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let mut out = Cow::Borrowed(text);
        for item in &self.items {
            if item.token.is_empty() || !out.contains(item.token.as_str()) {
                continue;
            }
            let value = item.value.as_deref().unwrap_or_default();
            out = Cow::Owned(out.replace(item.token.as_str(), value));
        }
        out
    }
}

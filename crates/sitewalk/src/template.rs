//! URL templates with named path parameters.
//!
//! Page types declare a template such as `/details/books/{slug}`. Rendering
//! substitutes percent-encoded parameter values; matching a browser URL
//! against the template decodes them again.

use crate::result::{SitewalkError, SitewalkResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named values for a URL template's placeholders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlParams(BTreeMap<String, String>);

impl UrlParams {
    /// Empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder style)
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace a parameter
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Value of a parameter
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether no parameters are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UrlParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param(String),
}

/// A parsed URL template
#[derive(Debug, Clone)]
pub struct UrlTemplate {
    source: String,
    parts: Vec<Part>,
    pattern: Regex,
}

impl UrlTemplate {
    /// Parse a template.
    ///
    /// Placeholders are `{name}` where `name` is an identifier. Braces that
    /// do not form a placeholder are an error.
    pub fn parse(template: &str) -> SitewalkResult<Self> {
        let error = |message: &str| SitewalkError::UrlTemplate {
            template: template.to_string(),
            message: message.to_string(),
        };

        let mut parts = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find(&['{', '}'][..]) {
            if rest[open..].starts_with('}') {
                return Err(error("unmatched '}'"));
            }
            let close = rest[open..]
                .find('}')
                .map(|i| open + i)
                .ok_or_else(|| error("unclosed '{'"))?;
            let name = &rest[open + 1..close];
            if !is_identifier(name) {
                return Err(error(&format!("invalid placeholder name '{name}'")));
            }
            if parts.iter().any(|p| matches!(p, Part::Param(n) if n == name)) {
                return Err(error(&format!("placeholder '{name}' appears twice")));
            }
            if open > 0 {
                parts.push(Part::Literal(rest[..open].to_string()));
            }
            parts.push(Part::Param(name.to_string()));
            rest = &rest[close + 1..];
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }

        let mut regex = String::from("^");
        for part in &parts {
            match part {
                Part::Literal(text) => regex.push_str(&regex::escape(text)),
                Part::Param(name) => {
                    regex.push_str("(?P<");
                    regex.push_str(name);
                    regex.push_str(">[^/?#]+)");
                }
            }
        }
        if regex.ends_with('/') {
            regex.pop();
        }
        regex.push_str("/?$");
        let pattern = Regex::new(&regex).map_err(|e| error(&e.to_string()))?;

        Ok(Self {
            source: template.to_string(),
            parts,
            pattern,
        })
    }

    /// The template text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of appearance
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            Part::Param(name) => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    /// Substitute parameters. Every placeholder must have a value.
    pub fn render(&self, params: &UrlParams) -> SitewalkResult<String> {
        let mut out = String::with_capacity(self.source.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Param(name) => {
                    let value = params.get(name).ok_or_else(|| SitewalkError::UrlTemplate {
                        template: self.source.clone(),
                        message: format!("missing parameter '{name}'"),
                    })?;
                    out.push_str(&urlencoding::encode(value));
                }
            }
        }
        Ok(out)
    }

    /// Render under a base URL
    pub fn render_url(&self, base_url: &str, params: &UrlParams) -> SitewalkResult<String> {
        Ok(format!("{}{}", base_url.trim_end_matches('/'), self.render(params)?))
    }

    /// Recover parameters from a path (and query, if the template has one).
    ///
    /// Captures are percent-decoded; a capture that does not decode to
    /// UTF-8 is no match.
    #[must_use]
    pub fn extract(&self, path: &str) -> Option<UrlParams> {
        let caps = self.pattern.captures(path)?;
        self.param_names()
            .filter_map(|name| caps.name(name).map(|m| (name, m.as_str())))
            .map(|(name, raw)| {
                urlencoding::decode(raw)
                    .ok()
                    .map(|value| (name, value.into_owned()))
            })
            .collect()
    }

    /// Whether a path matches this template
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// Match an absolute browser URL that should live under `base_url`.
    ///
    /// Returns `None` when the URL is on another origin, outside the base
    /// path, or does not fit the template.
    #[must_use]
    pub fn match_url(&self, base_url: &str, url: &str) -> Option<UrlParams> {
        let base = url::Url::parse(base_url).ok()?;
        let actual = url::Url::parse(url).ok()?;
        if base.origin() != actual.origin() {
            return None;
        }
        let prefix = base.path().trim_end_matches('/');
        let path = actual.path().strip_prefix(prefix)?;
        let path = if path.is_empty() { "/" } else { path };
        if !path.starts_with('/') {
            return None;
        }
        match actual.query() {
            Some(query) if self.source.contains('?') => self.extract(&format!("{path}?{query}")),
            _ => self.extract(path),
        }
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

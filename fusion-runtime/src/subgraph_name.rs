//! Subgraph names compared in constant-case form.
//!
//! `MyApi`, `my_api` and `MY-API` all normalize to `MY_API` so callers can key
//! the executor cache and transport entry map without worrying about the
//! casing convention the supergraph metadata happened to use.

use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

/// A subgraph identifier, compared and hashed in constant-case.
///
/// The original casing is preserved for display and logging; only equality
/// and hashing go through normalization.
#[derive(Debug, Clone)]
pub struct SubgraphName {
    original: String,
    normalized: String,
}

impl SubgraphName {
    pub fn new(name: impl Into<String>) -> Self {
        let original = name.into();
        let normalized = constant_case(&original);
        Self {
            original,
            normalized,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }
}

/// Uppercases letters and collapses runs of non-alphanumeric characters
/// (including case boundaries) into a single `_` separator.
fn constant_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_separator = false;
    let mut prev_lower = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            let is_case_boundary = prev_lower && ch.is_ascii_uppercase();
            if (pending_separator || is_case_boundary) && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            prev_lower = ch.is_ascii_lowercase();
            out.push(ch.to_ascii_uppercase());
        } else {
            pending_separator = true;
            prev_lower = false;
        }
    }
    out
}

impl fmt::Display for SubgraphName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl PartialEq for SubgraphName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for SubgraphName {}

impl Hash for SubgraphName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl From<&str> for SubgraphName {
    fn from(value: &str) -> Self {
        SubgraphName::new(value)
    }
}

impl From<String> for SubgraphName {
    fn from(value: String) -> Self {
        SubgraphName::new(value)
    }
}

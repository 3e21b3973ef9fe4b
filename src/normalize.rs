//! Canonical identifiers and package-name comparison

use std::borrow::Cow;

/// Build the canonical `Name@Version` identifier.
///
/// Plain concatenation: no case folding, no trimming.
pub fn library_id(name: &str, version: &str) -> String {
    let mut id = String::with_capacity(name.len() + version.len() + 1);
    id.push_str(name);
    id.push('@');
    id.push_str(version);
    id
}

/// PEP 503 name normalization: lowercase, runs of `-`, `_`, `.` become one `-`
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;

    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
                in_separator = true;
            }
        } else {
            out.extend(ch.to_lowercase());
            in_separator = false;
        }
    }

    out
}

/// How two package names are compared when looking for duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatching {
    /// Byte-for-byte comparison
    #[default]
    Exact,
    /// Comparison after [`normalize_name`]
    Normalized,
}

impl NameMatching {
    pub fn from_case_sensitive(case_sensitive: bool) -> Self {
        if case_sensitive {
            NameMatching::Exact
        } else {
            NameMatching::Normalized
        }
    }

    /// Lookup key for `name` under this matching rule
    pub fn key<'a>(self, name: &'a str) -> Cow<'a, str> {
        match self {
            NameMatching::Exact => Cow::Borrowed(name),
            NameMatching::Normalized => Cow::Owned(normalize_name(name)),
        }
    }
}

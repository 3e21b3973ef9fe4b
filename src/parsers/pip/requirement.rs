//! Tokenizer for a single logical requirements line

use crate::error::{ParseError, Result};
use crate::lines::LogicalLine;

/// Version operators, longest first so `===` wins over `==`
const OPERATORS: [&str; 8] = ["===", "==", "~=", "!=", "<=", ">=", "<", ">"];

/// A package requirement with extras, markers and options stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Requirement {
    pub name: String,
    /// Literal version of the retained clause; `None` when unpinned
    pub version: Option<String>,
    /// `--hash` pins. Kept for tracing only, never emitted.
    pub hashes: Vec<String>,
}

/// What a logical line turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Entry {
    Requirement(Requirement),
    /// `-c` / `--constraint` directive with its path
    Constraint(String),
    /// Blank, comment, option flag, or a non-registry reference
    Skip,
}

/// Classify one logical line
pub(crate) fn classify(line: &LogicalLine) -> Result<Entry> {
    let text = strip_comment(&line.text).trim();

    if text.is_empty() {
        return Ok(Entry::Skip);
    }

    if text.starts_with('-') {
        return parse_option_line(text, line.start);
    }

    let (spec, hashes) = split_options(text);

    match parse_specifier(spec, line.start)? {
        Some(mut requirement) => {
            if !hashes.is_empty() {
                tracing::trace!(
                    "Ignoring {} hash pin(s) for {} on line {}",
                    hashes.len(),
                    requirement.name,
                    line.start
                );
            }
            requirement.hashes = hashes;
            Ok(Entry::Requirement(requirement))
        }
        None => {
            tracing::debug!("Skipping non-registry reference on line {}: {}", line.start, spec);
            Ok(Entry::Skip)
        }
    }
}

/// Cut the line at the first `#` that is not inside a quoted string
fn strip_comment(text: &str) -> &str {
    let mut quote: Option<char> = None;

    for (idx, ch) in text.char_indices() {
        match (quote, ch) {
            (None, '#') => return &text[..idx],
            (None, '\'' | '"') => quote = Some(ch),
            (Some(open), _) if open == ch => quote = None,
            _ => {}
        }
    }

    text
}

/// Handle lines starting with `-`. Only constraint directives matter.
fn parse_option_line(text: &str, line: usize) -> Result<Entry> {
    let path = if let Some(rest) = text.strip_prefix("--constraint") {
        match rest.chars().next() {
            None => Some(""),
            Some('=') => Some(&rest[1..]),
            Some(c) if c.is_whitespace() => Some(rest),
            // Some other long option that happens to share the prefix
            Some(_) => None,
        }
    } else if let Some(rest) = text.strip_prefix("-c") {
        Some(rest.strip_prefix('=').unwrap_or(rest))
    } else {
        None
    };

    match path {
        Some(path) => {
            let path = path.trim();
            if path.is_empty() {
                return Err(ParseError::syntax(line, "missing constraints file path"));
            }
            Ok(Entry::Constraint(path.to_string()))
        }
        None => {
            let option = text.split_whitespace().next().unwrap_or(text);
            tracing::debug!("Skipping option {} on line {}", option, line);
            Ok(Entry::Skip)
        }
    }
}

/// Split trailing per-requirement options (`--hash=...`, `--global-option`, ...)
/// off the specifier. Returns the specifier and the collected hashes.
fn split_options(text: &str) -> (&str, Vec<String>) {
    let mut cut = None;
    let bytes = text.as_bytes();
    for idx in 1..bytes.len() {
        if bytes[idx - 1].is_ascii_whitespace() && text[idx..].starts_with("--") {
            cut = Some(idx);
            break;
        }
    }

    let Some(cut) = cut else {
        return (text, Vec::new());
    };

    let mut hashes = Vec::new();
    let mut tokens = text[cut..].split_whitespace();
    while let Some(token) = tokens.next() {
        if let Some(value) = token.strip_prefix("--hash=") {
            hashes.push(value.to_string());
        } else if token == "--hash" {
            if let Some(value) = tokens.next() {
                hashes.push(value.to_string());
            }
        }
    }

    (text[..cut].trim_end(), hashes)
}

/// Parse `<name>[extras]<op><version>[,<op><version>...][; marker]`.
///
/// Returns `Ok(None)` for bare URLs and paths, which name no registry package.
pub(crate) fn parse_specifier(spec: &str, line: usize) -> Result<Option<Requirement>> {
    let spec = spec.trim();

    if !is_direct_reference(spec) && is_path_or_url(spec) {
        return Ok(None);
    }

    let name_len = spec
        .find(|c: char| !is_name_char(c))
        .unwrap_or(spec.len());
    let name = &spec[..name_len];

    if name.is_empty() {
        return Err(ParseError::syntax(
            line,
            format!("expected a package name in '{spec}'"),
        ));
    }
    if !is_valid_name(name) {
        return Err(ParseError::syntax(
            line,
            format!("invalid package name '{name}'"),
        ));
    }

    let mut rest = spec[name_len..].trim_start();

    if let Some(after_bracket) = rest.strip_prefix('[') {
        let Some(close) = after_bracket.find(']') else {
            return Err(ParseError::syntax(line, "unclosed extras bracket"));
        };
        validate_extras(&after_bracket[..close], line)?;
        rest = after_bracket[close + 1..].trim_start();
    }

    // Direct reference: name @ url
    if let Some(url) = rest.strip_prefix('@') {
        let url = url.split(';').next().unwrap_or_default().trim();
        if url.is_empty() {
            return Err(ParseError::syntax(line, "missing URL after '@'"));
        }
        return Ok(Some(Requirement {
            name: name.to_string(),
            version: None,
            hashes: Vec::new(),
        }));
    }

    let (clauses, marker) = match rest.find(';') {
        Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
        None => (rest, None),
    };

    if let Some(marker) = marker {
        validate_marker(marker, line)?;
    }

    let mut clauses = clauses.trim();
    if let Some(inner) = clauses.strip_prefix('(') {
        let Some(inner) = inner.strip_suffix(')') else {
            return Err(ParseError::syntax(line, "unclosed version parenthesis"));
        };
        clauses = inner.trim();
    }

    let version = if clauses.is_empty() {
        None
    } else {
        Some(select_version(clauses, line)?)
    };

    Ok(Some(Requirement {
        name: name.to_string(),
        version,
        hashes: Vec::new(),
    }))
}

/// Pick the version literal to emit from a comma-separated clause list.
///
/// Equality (`==`, `===`) wins, then compatible release (`~=`), then the
/// first clause.
fn select_version(clauses: &str, line: usize) -> Result<String> {
    let mut parsed = Vec::new();

    for clause in clauses.split(',') {
        let clause = clause.trim();
        if clause.is_empty() {
            return Err(ParseError::syntax(line, "empty version clause"));
        }

        let Some(op) = OPERATORS.iter().find(|op| clause.starts_with(*op)) else {
            return Err(ParseError::syntax(
                line,
                format!("expected a version operator in '{clause}'"),
            ));
        };

        let version = clause[op.len()..].trim();
        if version.is_empty() {
            return Err(ParseError::syntax(
                line,
                format!("missing version after '{op}'"),
            ));
        }
        if !version.chars().all(is_version_char) {
            return Err(ParseError::syntax(
                line,
                format!("invalid version '{version}'"),
            ));
        }

        parsed.push((*op, version));
    }

    let chosen = parsed
        .iter()
        .find(|(op, _)| *op == "==" || *op == "===")
        .or_else(|| parsed.iter().find(|(op, _)| *op == "~="))
        .or_else(|| parsed.first());

    match chosen {
        Some((_, version)) => Ok((*version).to_string()),
        None => Err(ParseError::syntax(line, "empty version clause")),
    }
}

fn validate_extras(extras: &str, line: usize) -> Result<()> {
    let extras = extras.trim();
    if extras.is_empty() {
        return Ok(());
    }

    for extra in extras.split(',') {
        let extra = extra.trim();
        if !is_valid_name(extra) {
            return Err(ParseError::syntax(
                line,
                format!("invalid extra '{extra}'"),
            ));
        }
    }

    Ok(())
}

/// Markers are discarded, but they still have to be well formed
fn validate_marker(marker: &str, line: usize) -> Result<()> {
    if marker.trim().is_empty() {
        return Err(ParseError::syntax(line, "empty environment marker"));
    }

    let mut quote: Option<char> = None;
    for ch in marker.chars() {
        match (quote, ch) {
            (None, '\'' | '"') => quote = Some(ch),
            (Some(open), _) if open == ch => quote = None,
            _ => {}
        }
    }

    if quote.is_some() {
        return Err(ParseError::syntax(
            line,
            "unterminated string in environment marker",
        ));
    }

    Ok(())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn is_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '*' | '+' | '!' | '_' | '-')
}

/// PEP 508 names start and end with a letter or digit
fn is_valid_name(name: &str) -> bool {
    let first = name.chars().next();
    let last = name.chars().last();
    matches!(first, Some(c) if c.is_ascii_alphanumeric())
        && matches!(last, Some(c) if c.is_ascii_alphanumeric())
        && name.chars().all(is_name_char)
}

/// `name[extras] @ url`, possibly without spaces around the `@`
fn is_direct_reference(spec: &str) -> bool {
    let Some(at) = spec.find('@') else {
        return false;
    };
    let head = spec[..at].trim();
    let bare = head.split('[').next().unwrap_or(head).trim();
    is_valid_name(bare)
}

fn is_path_or_url(spec: &str) -> bool {
    let head = spec.split_whitespace().next().unwrap_or(spec);
    let head = head.split(';').next().unwrap_or(head);

    head.contains("://")
        || head.starts_with(['.', '/', '\\', '~'])
        || head.contains(":\\")
        || head.ends_with(".whl")
        || head.ends_with(".tar.gz")
        || head.ends_with(".zip")
}

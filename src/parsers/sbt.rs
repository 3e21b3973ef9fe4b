//! Parser for sbt lock files (build.sbt.lock)
//!
//! The lock file is a JSON document whose `dependencies` array holds one
//! object per resolved artifact:
//!
//! ```text
//! {
//!   "lockVersion" : 1,
//!   "dependencies" : [
//!     {
//!       "org" : "org.apache.commons",
//!       "name" : "commons-lang3",
//!       "version" : "3.9",
//!       "artifacts" : [ ... ],
//!       "configurations" : [ "compile", "runtime" ]
//!     }
//!   ]
//! }
//! ```
//!
//! Each object is a block; its location covers the lines from its opening
//! brace to its closing brace. How a block is read is decided by a
//! [`LockSchema`], so later lock versions can be added without touching the
//! scanner.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use serde::Deserialize;

use super::{Parser, read_input};
use crate::config::LockfileConfig;
use crate::error::{ParseError, Result};
use crate::normalize::library_id;
use crate::types::{Library, Location, ParseOutput};

/// One artifact object, as located in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    pub start_line: usize,
    pub end_line: usize,
    /// Raw JSON text of the object, braces included
    pub text: &'a str,
}

/// Coordinates read out of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub organization: String,
    pub name: String,
    pub version: String,
    pub configurations: Vec<String>,
}

impl Artifact {
    /// `organization:name`
    pub fn coordinate(&self) -> String {
        format!("{}:{}", self.organization, self.name)
    }
}

/// Reads artifacts for one revision of the lock file format
pub trait LockSchema: Send + Sync {
    /// The `lockVersion` this schema understands
    fn version(&self) -> u64;

    fn coordinates(&self, block: &Block<'_>) -> Result<Artifact>;
}

/// `lockVersion: 1`
#[derive(Debug, Default, Clone, Copy)]
pub struct LockSchemaV1;

#[derive(Debug, Deserialize)]
struct V1Dependency {
    org: Option<String>,
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    configurations: Vec<String>,
}

impl LockSchema for LockSchemaV1 {
    fn version(&self) -> u64 {
        1
    }

    fn coordinates(&self, block: &Block<'_>) -> Result<Artifact> {
        let dep: V1Dependency = serde_json::from_str(block.text).map_err(|e| {
            ParseError::syntax(
                block.start_line + e.line().saturating_sub(1),
                format!("invalid dependency block: {e}"),
            )
        })?;

        let field = |value: Option<String>, key: &str| -> Result<String> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(ParseError::syntax(
                    block.start_line,
                    format!("dependency block is missing '{key}'"),
                )),
            }
        };

        Ok(Artifact {
            organization: field(dep.org, "org")?,
            name: field(dep.name, "name")?,
            version: field(dep.version, "version")?,
            configurations: dep.configurations,
        })
    }
}

/// Parser for sbt build.sbt.lock files
#[derive(Clone)]
pub struct SbtLockParser {
    schema: Arc<dyn LockSchema>,
    configurations: Option<Vec<String>>,
}

impl std::fmt::Debug for SbtLockParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SbtLockParser")
            .field("schema_version", &self.schema.version())
            .field("configurations", &self.configurations)
            .finish()
    }
}

impl Default for SbtLockParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SbtLockParser {
    pub fn new() -> Self {
        Self {
            schema: Arc::new(LockSchemaV1),
            configurations: None,
        }
    }

    pub fn from_config(config: &LockfileConfig) -> Self {
        Self {
            configurations: config.configurations.clone(),
            ..Self::new()
        }
    }

    /// Swap the block schema
    pub fn with_schema(mut self, schema: impl LockSchema + 'static) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    /// Only emit artifacts used in one of these configurations
    pub fn with_configurations(mut self, configurations: Vec<String>) -> Self {
        self.configurations = Some(configurations);
        self
    }

    /// Parse already-decoded text
    pub fn parse_str(&self, content: &str) -> Result<ParseOutput> {
        if content.trim().is_empty() {
            return Ok(ParseOutput::default());
        }

        let document: serde_json::Value = serde_json::from_str(content).map_err(|e| {
            // EOF errors can land one past the last line
            let last_line = content.lines().count().max(1);
            ParseError::syntax(e.line().clamp(1, last_line), format!("invalid lock file: {e}"))
        })?;

        let Some(root) = document.as_object() else {
            return Err(ParseError::syntax(1, "lock file must be a JSON object"));
        };

        let scan = scan_blocks(content);

        // serde_json keeps the last duplicate while the scanner sees the first
        if let Some((key, line)) = scan.duplicate_key {
            return Err(ParseError::syntax(
                line,
                format!("duplicate top-level key '{key}'"),
            ));
        }

        if let Some(found) = root.get("lockVersion") {
            let expected = self.schema.version();
            if found.as_u64() != Some(expected) {
                return Err(ParseError::syntax(
                    scan.lock_version_line.unwrap_or(1),
                    format!("unsupported lockVersion {found}, expected {expected}"),
                ));
            }
        }

        match root.get("dependencies") {
            None => return Ok(ParseOutput::default()),
            Some(serde_json::Value::Array(items)) => {
                if let Some(pos) = items.iter().position(|item| !item.is_object()) {
                    return Err(ParseError::syntax(
                        scan.dependencies_line.unwrap_or(1),
                        format!("dependency #{} is not an object", pos + 1),
                    ));
                }
            }
            Some(_) => {
                return Err(ParseError::syntax(
                    scan.dependencies_line.unwrap_or(1),
                    "'dependencies' must be an array",
                ));
            }
        }

        let mut libraries: Vec<Library> = Vec::with_capacity(scan.blocks.len());
        let mut seen: HashMap<String, usize> = HashMap::new();

        for block in &scan.blocks {
            let artifact = self.schema.coordinates(block)?;

            if !self.wants(&artifact) {
                tracing::debug!(
                    "Skipping {} {} (configurations {:?})",
                    artifact.coordinate(),
                    artifact.version,
                    artifact.configurations
                );
                continue;
            }

            let location = Location::new(block.start_line, block.end_line);
            let name = artifact.coordinate();
            let id = library_id(&name, &artifact.version);

            match seen.get(&id) {
                Some(&idx) => libraries[idx].locations.push(location),
                None => {
                    seen.insert(id, libraries.len());
                    libraries.push(Library::new(name, artifact.version, vec![location]));
                }
            }
        }

        Ok(ParseOutput::from_libraries(libraries))
    }

    fn wants(&self, artifact: &Artifact) -> bool {
        match &self.configurations {
            None => true,
            Some(wanted) => artifact
                .configurations
                .iter()
                .any(|c| wanted.iter().any(|w| w == c)),
        }
    }
}

impl Parser for SbtLockParser {
    fn parse(&self, reader: &mut dyn Read) -> Result<ParseOutput> {
        let content = read_input(reader)?;
        self.parse_str(&content)
    }
}

/// Result of walking the document text
#[derive(Debug, Default)]
struct Scan<'a> {
    blocks: Vec<Block<'a>>,
    lock_version_line: Option<usize>,
    dependencies_line: Option<usize>,
    /// Second occurrence of `lockVersion` or `dependencies` at the top level
    duplicate_key: Option<(&'a str, usize)>,
}

/// Walk the text tracking line numbers, string state and nesting, and
/// record every object that sits directly inside the top-level
/// `dependencies` array. Expects text that already parsed as JSON.
fn scan_blocks(content: &str) -> Scan<'_> {
    let bytes = content.as_bytes();
    let mut scan = Scan::default();

    let mut line = 1;
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut string_start = 0;
    // Top-level string waiting to see whether a ':' makes it a key
    let mut pending: Option<(&str, usize)> = None;
    let mut last_key: Option<&str> = None;
    // Depth of the dependencies array once entered
    let mut deps_depth: Option<usize> = None;
    let mut deps_done = false;
    let mut open_block: Option<(usize, usize)> = None;

    for (idx, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            line += 1;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
                if stack.len() == 1 {
                    pending = Some((&content[string_start + 1..idx], line));
                }
            }
            continue;
        }

        match b {
            b':' if stack.len() == 1 => {
                if let Some((key, key_line)) = pending.take() {
                    let first_seen = match key {
                        "lockVersion" => Some(&mut scan.lock_version_line),
                        "dependencies" => Some(&mut scan.dependencies_line),
                        _ => None,
                    };
                    match first_seen {
                        Some(slot) if slot.is_some() => {
                            if scan.duplicate_key.is_none() {
                                scan.duplicate_key = Some((key, key_line));
                            }
                        }
                        Some(slot) => *slot = Some(key_line),
                        None => {}
                    }
                    last_key = Some(key);
                }
            }
            b'"' => {
                in_string = true;
                string_start = idx;
            }
            b'[' => {
                if stack.len() == 1 && last_key == Some("dependencies") && !deps_done {
                    deps_depth = Some(stack.len() + 1);
                }
                stack.push(b);
            }
            b'{' => {
                stack.push(b);
                if deps_depth.is_some_and(|depth| stack.len() == depth + 1) {
                    open_block = Some((idx, line));
                }
            }
            b'}' => {
                if let Some(depth) = deps_depth
                    && stack.len() == depth + 1
                    && let Some((start_idx, start_line)) = open_block.take()
                {
                    scan.blocks.push(Block {
                        start_line,
                        end_line: line,
                        text: &content[start_idx..=idx],
                    });
                }
                stack.pop();
            }
            b']' => {
                if deps_depth == Some(stack.len()) {
                    // Only the first top-level dependencies array counts
                    deps_depth = None;
                    deps_done = true;
                }
                stack.pop();
            }
            _ => {}
        }
    }

    scan
}

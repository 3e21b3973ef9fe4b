//! Constraints files referenced with `-c <path>`
//!
//! Paths are turned into streams by a [`ConstraintsResolver`]; the core never
//! decides where a constraints file lives. All referenced files are read and
//! parsed before the main pass so later lookups are plain map reads.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

use super::requirement::{Entry, classify};
use crate::error::{ParseError, Result};
use crate::lines::LogicalLines;
use crate::normalize::NameMatching;
use crate::parsers::read_input;

/// Turns a constraints path, as written in the file, into a stream
pub trait ConstraintsResolver: Send + Sync {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read>>;
}

/// Resolves paths relative to a base directory
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    base: PathBuf,
}

impl DirectoryResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl ConstraintsResolver for DirectoryResolver {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read>> {
        let file = File::open(self.base.join(path))?;
        Ok(Box::new(file))
    }
}

/// Serves constraints files from memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryResolver {
    files: HashMap<String, Vec<u8>>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl ConstraintsResolver for InMemoryResolver {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read>> {
        match self.files.get(path) {
            Some(content) => Ok(Box::new(Cursor::new(content.clone()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("constraints file not found: {path}"),
            )),
        }
    }
}

/// Pinned versions collected from constraints files, keyed by match key
#[derive(Debug, Clone, Default)]
pub(crate) struct Constraints {
    matching: NameMatching,
    versions: HashMap<String, String>,
}

impl Constraints {
    pub fn empty(matching: NameMatching) -> Self {
        Self {
            matching,
            versions: HashMap::new(),
        }
    }

    /// Read and parse every referenced file. The first pin seen for a name wins.
    pub fn load(
        paths: &[String],
        resolver: &dyn ConstraintsResolver,
        matching: NameMatching,
    ) -> Result<Self> {
        let mut constraints = Self::empty(matching);

        for path in paths {
            let mut reader = resolver.open(path)?;
            let content = read_input(&mut reader)?;
            constraints
                .absorb(&content)
                .map_err(|e| in_constraints_file(path, e))?;
        }

        Ok(constraints)
    }

    fn absorb(&mut self, content: &str) -> Result<()> {
        for line in LogicalLines::new(content) {
            match classify(&line)? {
                Entry::Requirement(req) => {
                    let Some(version) = req.version else {
                        continue;
                    };
                    let key = self.matching.key(&req.name).into_owned();
                    self.versions.entry(key).or_insert(version);
                }
                Entry::Constraint(nested) => {
                    tracing::debug!(
                        "Not following nested constraints file {} on line {}",
                        nested,
                        line.start
                    );
                }
                Entry::Skip => {}
            }
        }

        Ok(())
    }

    pub fn version_for(&self, name: &str) -> Option<&str> {
        let key = self.matching.key(name);
        self.versions.get(&*key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }
}

fn in_constraints_file(path: &str, err: ParseError) -> ParseError {
    match err {
        ParseError::Syntax { line, reason } => ParseError::Syntax {
            line,
            reason: format!("{path}: {reason}"),
        },
        other => other,
    }
}

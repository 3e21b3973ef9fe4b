//! Parser for pip requirements and constraints files
//!
//! Supports:
//! - `name[extras]<op><version>[; marker]` specifiers with any whitespace
//! - backslash line continuations and `#` comments
//! - `--hash` pins and other per-requirement options (ignored)
//! - `-c <path>` constraints files supplying versions for unpinned lines
//! - optional dependency edges from installed-package metadata

mod constraints;
mod metadata;
mod requirement;

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

pub use constraints::{ConstraintsResolver, DirectoryResolver, InMemoryResolver};
pub use metadata::{DependencyProvider, InstalledPackages, PackageMetadata};

use super::{Parser, read_input};
use crate::config::RequirementsConfig;
use crate::error::Result;
use crate::graph::{RawEdge, assemble};
use crate::lines::LogicalLines;
use crate::normalize::{NameMatching, normalize_name};
use crate::types::{Library, Location, ParseOutput};
use constraints::Constraints;
use requirement::{Entry, Requirement, classify};

/// Parser for requirements.txt / constraints.txt files
#[derive(Clone)]
pub struct RequirementsParser {
    matching: NameMatching,
    follow_constraints: bool,
    resolver: Option<Arc<dyn ConstraintsResolver>>,
    provider: Option<Arc<dyn DependencyProvider>>,
}

impl std::fmt::Debug for RequirementsParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequirementsParser")
            .field("matching", &self.matching)
            .field("follow_constraints", &self.follow_constraints)
            .field("resolver", &self.resolver.is_some())
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

impl Default for RequirementsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequirementsParser {
    pub fn new() -> Self {
        Self::from_config(&RequirementsConfig::default())
    }

    pub fn from_config(config: &RequirementsConfig) -> Self {
        Self {
            matching: NameMatching::from_case_sensitive(config.case_sensitive_names),
            follow_constraints: config.follow_constraints,
            resolver: None,
            provider: None,
        }
    }

    /// How duplicate names and constraint lookups compare names
    pub fn with_name_matching(mut self, matching: NameMatching) -> Self {
        self.matching = matching;
        self
    }

    /// Resolver used for `-c` directives. Without one they are ignored.
    pub fn with_resolver(mut self, resolver: impl ConstraintsResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Source of dependency edges between the emitted libraries
    pub fn with_dependency_provider(
        mut self,
        provider: impl DependencyProvider + 'static,
    ) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Parse already-decoded text
    pub fn parse_str(&self, content: &str) -> Result<ParseOutput> {
        // Tokenize everything first: a malformed line anywhere aborts the parse
        let mut entries = Vec::new();
        let mut constraint_paths = Vec::new();

        for line in LogicalLines::new(content) {
            match classify(&line)? {
                Entry::Requirement(req) => entries.push((req, line.location())),
                Entry::Constraint(path) => constraint_paths.push(path),
                Entry::Skip => {}
            }
        }

        let constraints = self.load_constraints(&constraint_paths)?;
        let libraries = self.collect_libraries(entries, &constraints);
        let edges = self.edges(&libraries);

        assemble(libraries, edges)
    }

    fn load_constraints(&self, paths: &[String]) -> Result<Constraints> {
        if paths.is_empty() || !self.follow_constraints {
            return Ok(Constraints::empty(self.matching));
        }

        match &self.resolver {
            Some(resolver) => {
                let constraints = Constraints::load(paths, resolver.as_ref(), self.matching)?;
                tracing::debug!(
                    "Loaded {} pinned versions from {} constraints file(s)",
                    constraints.len(),
                    paths.len()
                );
                Ok(constraints)
            }
            None => {
                tracing::debug!(
                    "No constraints resolver configured, ignoring {} constraints file(s)",
                    paths.len()
                );
                Ok(Constraints::empty(self.matching))
            }
        }
    }

    /// Fold requirements into libraries. First occurrence fixes the position
    /// and version; later duplicates only add locations.
    fn collect_libraries(
        &self,
        entries: Vec<(Requirement, Location)>,
        constraints: &Constraints,
    ) -> Vec<Library> {
        let mut pending: Vec<(String, String, Vec<Location>)> = Vec::with_capacity(entries.len());
        let mut index: HashMap<String, usize> = HashMap::new();

        for (req, location) in entries {
            let key = self.matching.key(&req.name).into_owned();

            if let Some(&idx) = index.get(&key) {
                pending[idx].2.push(location);
                continue;
            }

            let version = match req.version {
                Some(version) => version,
                None => match constraints.version_for(&req.name) {
                    Some(version) => version.to_string(),
                    None => {
                        tracing::debug!(
                            "Dropping unpinned requirement {} on line {}",
                            req.name,
                            location.start_line
                        );
                        continue;
                    }
                },
            };

            index.insert(key, pending.len());
            pending.push((req.name, version, vec![location]));
        }

        pending
            .into_iter()
            .map(|(name, version, locations)| Library::new(name, version, locations))
            .collect()
    }

    fn edges(&self, libraries: &[Library]) -> Vec<RawEdge> {
        let Some(provider) = &self.provider else {
            return Vec::new();
        };

        let mut by_name: HashMap<String, &str> = HashMap::new();
        for lib in libraries {
            by_name
                .entry(normalize_name(&lib.name))
                .or_insert(lib.id.as_str());
        }

        libraries
            .iter()
            .filter_map(|lib| {
                let requires = provider.requires(&lib.name, &lib.version)?;
                let targets = requires
                    .iter()
                    .filter_map(|name| by_name.get(&normalize_name(name)))
                    .map(|id| (*id).to_string())
                    .collect();
                Some(RawEdge::new(lib.id.clone(), targets))
            })
            .collect()
    }
}

impl Parser for RequirementsParser {
    fn parse(&self, reader: &mut dyn Read) -> Result<ParseOutput> {
        let content = read_input(reader)?;
        self.parse_str(&content)
    }
}

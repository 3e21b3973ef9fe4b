//! Installed-package metadata (`METADATA` / `PKG-INFO`)
//!
//! A requirements file does not say which package needs which. When the
//! installed distributions are at hand, their `Requires-Dist` headers do, and
//! [`InstalledPackages`] feeds them to the requirements parser as edges.

use std::collections::HashMap;
use std::io::Read;

use crate::error::{ParseError, Result};
use crate::normalize::normalize_name;
use crate::parsers::read_input;

/// Supplies the names a package requires
pub trait DependencyProvider: Send + Sync {
    /// Names required by `name` at `version`, or `None` if the package is unknown
    fn requires(&self, name: &str, version: &str) -> Option<Vec<String>>;
}

/// Header fields of one installed distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    /// Unconditional requirements, by name
    pub requires: Vec<String>,
}

impl PackageMetadata {
    pub fn from_reader(reader: &mut dyn Read) -> Result<Self> {
        let content = read_input(reader)?;
        Self::parse(&content)
    }

    /// Parse the header block. The body after the first blank line is ignored.
    pub fn parse(content: &str) -> Result<Self> {
        let mut name = None;
        let mut version = None;
        let mut requires = Vec::new();
        let mut last_line = 0;

        for (idx, line) in content.lines().enumerate() {
            last_line = idx + 1;

            if line.trim().is_empty() {
                break;
            }
            // Folded header continuation
            if line.starts_with([' ', '\t']) {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                return Err(ParseError::syntax(
                    idx + 1,
                    format!("expected 'Key: value' header, found '{line}'"),
                ));
            };
            let value = value.trim();

            match key.trim() {
                "Name" => name = Some(value.to_string()),
                "Version" => version = Some(value.to_string()),
                "Requires-Dist" => {
                    if let Some(dep) = required_name(value) {
                        requires.push(dep);
                    }
                }
                _ => {}
            }
        }

        match (name, version) {
            (Some(name), Some(version)) if !name.is_empty() && !version.is_empty() => Ok(Self {
                name,
                version,
                requires,
            }),
            _ => Err(ParseError::syntax(
                last_line.max(1),
                "metadata is missing Name or Version",
            )),
        }
    }
}

/// Name out of a `Requires-Dist` value. Requirements that only apply to an
/// extra are not dependencies of the base package.
fn required_name(value: &str) -> Option<String> {
    let (spec, marker) = match value.split_once(';') {
        Some((spec, marker)) => (spec, Some(marker)),
        None => (value, None),
    };

    if marker.is_some_and(uses_extra_variable) {
        return None;
    }

    let spec = spec.trim();
    let end = spec
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(spec.len());
    let name = &spec[..end];

    (!name.is_empty()).then(|| name.to_string())
}

/// Whether a PEP 508 marker compares the `extra` variable. Quoted literals
/// and identifiers that merely contain the word do not count.
fn uses_extra_variable(marker: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut word = String::new();

    for ch in marker.chars().chain(std::iter::once(' ')) {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.') {
            word.push(ch);
            continue;
        }
        if word == "extra" {
            return true;
        }
        word.clear();
        if matches!(ch, '\'' | '"') {
            quote = Some(ch);
        }
    }

    false
}

/// Index of installed distributions by normalized name
#[derive(Debug, Clone, Default)]
pub struct InstalledPackages {
    packages: HashMap<String, Vec<PackageMetadata>>,
}

impl InstalledPackages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metadata: PackageMetadata) {
        self.packages
            .entry(normalize_name(&metadata.name))
            .or_default()
            .push(metadata);
    }

    /// Build an index from raw metadata documents
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut installed = Self::new();
        for document in documents {
            installed.insert(PackageMetadata::parse(document)?);
        }
        Ok(installed)
    }

    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl DependencyProvider for InstalledPackages {
    fn requires(&self, name: &str, version: &str) -> Option<Vec<String>> {
        self.packages
            .get(&normalize_name(name))?
            .iter()
            .find(|pkg| pkg.version == version)
            .map(|pkg| pkg.requires.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLASK_METADATA: &str = "Metadata-Version: 2.1
Name: Flask
Version: 2.0.0
Summary: A simple framework for building complex web applications.
Classifier: Programming Language :: Python
Requires-Python: >=3.6
Requires-Dist: Werkzeug (>=2.0)
Requires-Dist: Jinja2 (>=3.0)
Requires-Dist: itsdangerous (>=2.0)
Requires-Dist: click (>=7.1.2)
Provides-Extra: async
Requires-Dist: asgiref (>=3.2) ; extra == 'async'
Provides-Extra: dotenv
Requires-Dist: python-dotenv ; extra == 'dotenv'

Flask
=====

Requires-Dist: not-a-header
";

    #[test]
    fn test_parse_metadata() {
        let metadata = PackageMetadata::parse(FLASK_METADATA).unwrap();
        assert_eq!(metadata.name, "Flask");
        assert_eq!(metadata.version, "2.0.0");
        assert_eq!(
            metadata.requires,
            vec!["Werkzeug", "Jinja2", "itsdangerous", "click"]
        );
    }

    #[test]
    fn test_environment_markers_without_extra_are_kept() {
        let metadata = PackageMetadata::parse(
            "Name: click\nVersion: 8.0.0\nRequires-Dist: colorama; platform_system == \"Windows\"\nRequires-Dist: importlib-metadata; python_version < \"3.8\"\n",
        )
        .unwrap();
        assert_eq!(metadata.requires, vec!["colorama", "importlib-metadata"]);
    }

    #[test]
    fn test_only_the_extra_variable_marks_optional_requirements() {
        let metadata = PackageMetadata::parse(
            "Name: pkg\nVersion: 1.0\n\
             Requires-Dist: uvloop ; extra == 'async'\n\
             Requires-Dist: trio ; 'async' == extra\n\
             Requires-Dist: sphinx ; python_version >= \"3.8\" and (extra==\"docs\")\n\
             Requires-Dist: pywin32 ; sys_platform == \"extra\"\n\
             Requires-Dist: typing-extensions ; platform_release != 'extra-build'\n",
        )
        .unwrap();
        assert_eq!(metadata.requires, vec!["pywin32", "typing-extensions"]);
    }

    #[test]
    fn test_folded_headers_are_skipped() {
        let metadata = PackageMetadata::parse(
            "Name: attrs\nVersion: 20.3.0\nLicense: MIT\n        continued license text\n",
        )
        .unwrap();
        assert_eq!(metadata.name, "attrs");
        assert!(metadata.requires.is_empty());
    }

    #[test]
    fn test_missing_version() {
        let err = PackageMetadata::parse("Name: attrs\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_bad_header() {
        let err = PackageMetadata::parse("Name: attrs\nnot a header\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_installed_packages_lookup() {
        let installed = InstalledPackages::from_documents([
            FLASK_METADATA,
            "Name: MarkupSafe\nVersion: 2.0.0\n",
        ])
        .unwrap();

        assert_eq!(installed.len(), 2);
        assert_eq!(
            installed.requires("flask", "2.0.0"),
            Some(vec![
                "Werkzeug".to_string(),
                "Jinja2".to_string(),
                "itsdangerous".to_string(),
                "click".to_string(),
            ])
        );
        assert_eq!(installed.requires("Flask", "1.1.4"), None);
        assert_eq!(installed.requires("markupsafe", "2.0.0"), Some(vec![]));
        assert_eq!(installed.requires("click", "8.0.0"), None);
    }
}

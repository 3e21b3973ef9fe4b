//! Data contracts produced by every parser

use serde::{Deserialize, Serialize};

use crate::normalize::library_id;

/// Inclusive, 1-indexed line range where a library was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Location {
    pub start_line: usize,
    pub end_line: usize,
}

impl Location {
    /// Create a location, swapping the bounds if they arrive reversed
    pub fn new(start_line: usize, end_line: usize) -> Self {
        if start_line <= end_line {
            Self {
                start_line,
                end_line,
            }
        } else {
            Self {
                start_line: end_line,
                end_line: start_line,
            }
        }
    }

    /// Location covering a single line
    pub fn line(line: usize) -> Self {
        Self::new(line, line)
    }
}

/// A resolved package declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Library {
    /// Always `Name@Version`
    #[serde(rename = "ID")]
    pub id: String,
    /// Name as spelled by the ecosystem (casing and hyphenation preserved)
    pub name: String,
    /// Exact version literal, never a range
    pub version: String,
    /// One entry per declaration site, in file order
    pub locations: Vec<Location>,
}

impl Library {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        locations: Vec<Location>,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        Self {
            id: library_id(&name, &version),
            name,
            version,
            locations,
        }
    }
}

/// Directed edges from one library to the libraries it requires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "DependsOn")]
    pub depends_on: Vec<String>,
}

/// Everything a single parse call returns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParseOutput {
    pub libraries: Vec<Library>,
    pub dependencies: Vec<Dependency>,
}

impl ParseOutput {
    /// Output with libraries and no dependency edges
    pub fn from_libraries(libraries: Vec<Library>) -> Self {
        Self {
            libraries,
            dependencies: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Look up an emitted library by its ID
    pub fn library(&self, id: &str) -> Option<&Library> {
        self.libraries.iter().find(|lib| lib.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_id_is_derived() {
        let lib = Library::new("Jinja2", "3.0.0", vec![Location::line(4)]);
        assert_eq!(lib.id, "Jinja2@3.0.0");
        assert_eq!(lib.name, "Jinja2");
        assert_eq!(lib.version, "3.0.0");
    }

    #[test]
    fn test_location_bounds_are_ordered() {
        let loc = Location::new(25, 10);
        assert_eq!(loc.start_line, 10);
        assert_eq!(loc.end_line, 25);
        assert_eq!(Location::line(3), Location::new(3, 3));
    }

    #[test]
    fn test_serialized_field_names() {
        let output = ParseOutput {
            libraries: vec![Library::new("click", "8.0.0", vec![Location::line(1)])],
            dependencies: vec![Dependency {
                id: "click@8.0.0".to_string(),
                depends_on: vec![],
            }],
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["Libraries"][0]["ID"], "click@8.0.0");
        assert_eq!(value["Libraries"][0]["Locations"][0]["StartLine"], 1);
        assert_eq!(value["Libraries"][0]["Locations"][0]["EndLine"], 1);
        assert!(value["Dependencies"][0]["DependsOn"].is_array());
    }

    #[test]
    fn test_lookup_by_id() {
        let output = ParseOutput::from_libraries(vec![Library::new("attrs", "20.3.0", vec![])]);
        assert!(output.library("attrs@20.3.0").is_some());
        assert!(output.library("attrs@20.3.1").is_none());
        assert!(!output.is_empty());
    }
}

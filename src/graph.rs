//! Dependency graph assembly
//!
//! Turns raw `(from, to...)` edges supplied by a parser or one of its
//! collaborators into validated [`Dependency`] records.

use std::collections::{BTreeSet, HashMap};

use crate::error::{ParseError, Result};
use crate::types::{Dependency, Library, ParseOutput};

/// Unvalidated edges out of one library, by ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdge {
    pub from: String,
    pub to: Vec<String>,
}

impl RawEdge {
    pub fn new(from: impl Into<String>, to: Vec<String>) -> Self {
        Self {
            from: from.into(),
            to,
        }
    }
}

/// Validate edges against `libraries` and build the final output.
///
/// Library order is kept. Edges with the same source are merged, targets are
/// deduplicated and sorted, sources without targets are dropped. Any ID that
/// does not name an emitted library fails the whole call.
pub fn assemble(libraries: Vec<Library>, edges: Vec<RawEdge>) -> Result<ParseOutput> {
    let positions: HashMap<&str, usize> = libraries
        .iter()
        .enumerate()
        .map(|(idx, lib)| (lib.id.as_str(), idx))
        .collect();

    let mut merged: HashMap<usize, BTreeSet<String>> = HashMap::new();

    for edge in edges {
        let Some(&from_idx) = positions.get(edge.from.as_str()) else {
            // An unknown source with no targets yields no record
            let Some(to) = edge.to.into_iter().next() else {
                continue;
            };
            return Err(ParseError::DanglingReference {
                from: edge.from,
                to,
            });
        };

        for target in edge.to {
            if !positions.contains_key(target.as_str()) {
                return Err(ParseError::DanglingReference {
                    from: edge.from,
                    to: target,
                });
            }
            merged.entry(from_idx).or_default().insert(target);
        }
    }

    let mut dependencies: Vec<(usize, Dependency)> = merged
        .into_iter()
        .filter(|(_, targets)| !targets.is_empty())
        .map(|(idx, targets)| {
            let mut depends_on: Vec<String> = targets.into_iter().collect();
            depends_on.sort_by(|a, b| {
                a.to_lowercase()
                    .cmp(&b.to_lowercase())
                    .then_with(|| a.cmp(b))
            });
            (
                idx,
                Dependency {
                    id: libraries[idx].id.clone(),
                    depends_on,
                },
            )
        })
        .collect();
    dependencies.sort_by_key(|(idx, _)| *idx);

    Ok(ParseOutput {
        libraries,
        dependencies: dependencies.into_iter().map(|(_, dep)| dep).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;

    fn flask_libraries() -> Vec<Library> {
        [
            ("click", "8.0.0"),
            ("Flask", "2.0.0"),
            ("itsdangerous", "2.0.0"),
            ("Jinja2", "3.0.0"),
            ("MarkupSafe", "2.0.0"),
            ("Werkzeug", "2.0.0"),
        ]
        .iter()
        .enumerate()
        .map(|(idx, (name, version))| {
            Library::new(*name, *version, vec![Location::line(idx + 1)])
        })
        .collect()
    }

    #[test]
    fn test_assemble_sorts_and_dedupes() {
        let edges = vec![
            RawEdge::new(
                "Flask@2.0.0",
                vec![
                    "Werkzeug@2.0.0".to_string(),
                    "Jinja2@3.0.0".to_string(),
                    "itsdangerous@2.0.0".to_string(),
                    "click@8.0.0".to_string(),
                ],
            ),
            RawEdge::new(
                "Flask@2.0.0",
                vec!["MarkupSafe@2.0.0".to_string(), "click@8.0.0".to_string()],
            ),
            RawEdge::new("Jinja2@3.0.0", vec!["MarkupSafe@2.0.0".to_string()]),
        ];

        let output = assemble(flask_libraries(), edges).unwrap();
        assert_eq!(output.libraries.len(), 6);
        assert_eq!(
            output.dependencies,
            vec![
                Dependency {
                    id: "Flask@2.0.0".to_string(),
                    depends_on: vec![
                        "click@8.0.0".to_string(),
                        "itsdangerous@2.0.0".to_string(),
                        "Jinja2@3.0.0".to_string(),
                        "MarkupSafe@2.0.0".to_string(),
                        "Werkzeug@2.0.0".to_string(),
                    ],
                },
                Dependency {
                    id: "Jinja2@3.0.0".to_string(),
                    depends_on: vec!["MarkupSafe@2.0.0".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_dangling_target_is_rejected() {
        let edges = vec![RawEdge::new(
            "Flask@2.0.0",
            vec!["blinker@1.6.0".to_string()],
        )];
        let err = assemble(flask_libraries(), edges).unwrap_err();
        match err {
            ParseError::DanglingReference { from, to } => {
                assert_eq!(from, "Flask@2.0.0");
                assert_eq!(to, "blinker@1.6.0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_dangling_source_is_rejected() {
        let edges = vec![RawEdge::new("Flask@9.9.9", vec!["click@8.0.0".to_string()])];
        let err = assemble(flask_libraries(), edges).unwrap_err();
        match err {
            ParseError::DanglingReference { from, to } => {
                assert_eq!(from, "Flask@9.9.9");
                assert_eq!(to, "click@8.0.0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_source_without_targets_is_dropped() {
        let edges = vec![RawEdge::new("Flask@9.9.9", vec![])];
        let output = assemble(flask_libraries(), edges).unwrap();
        assert!(output.dependencies.is_empty());
    }

    #[test]
    fn test_sources_without_targets_are_dropped() {
        let edges = vec![RawEdge::new("click@8.0.0", vec![])];
        let output = assemble(flask_libraries(), edges).unwrap();
        assert!(output.dependencies.is_empty());
    }

    #[test]
    fn test_every_edge_resolves() {
        let edges = vec![
            RawEdge::new("Werkzeug@2.0.0", vec!["MarkupSafe@2.0.0".to_string()]),
            RawEdge::new("Flask@2.0.0", vec!["Werkzeug@2.0.0".to_string()]),
        ];
        let output = assemble(flask_libraries(), edges).unwrap();
        for dep in &output.dependencies {
            assert!(output.library(&dep.id).is_some());
            for target in &dep.depends_on {
                assert!(output.library(target).is_some());
            }
        }
        // Ordered by the source library's position
        assert_eq!(output.dependencies[0].id, "Flask@2.0.0");
        assert_eq!(output.dependencies[1].id, "Werkzeug@2.0.0");
    }
}

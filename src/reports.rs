//! Report generation for parse results
//!
//! Renders a [`ParseOutput`] as Markdown or a one-line summary for the CLI.
//! JSON output uses the serde representation directly.

use serde::{Deserialize, Serialize};

use crate::types::{Location, ParseOutput};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseSummary {
    pub libraries: usize,
    pub dependencies: usize,
    pub edges: usize,
}

impl ParseSummary {
    pub fn of(output: &ParseOutput) -> Self {
        Self {
            libraries: output.libraries.len(),
            dependencies: output.dependencies.len(),
            edges: output.dependencies.iter().map(|d| d.depends_on.len()).sum(),
        }
    }
}

fn format_location(location: &Location) -> String {
    if location.start_line == location.end_line {
        format!("{}", location.start_line)
    } else {
        format!("{}-{}", location.start_line, location.end_line)
    }
}

pub fn generate_summary(file: &str, output: &ParseOutput) -> String {
    let summary = ParseSummary::of(output);
    format!(
        "{}: {} libraries, {} with dependencies ({} edges)",
        file, summary.libraries, summary.dependencies, summary.edges
    )
}

pub fn generate_markdown_report(file: &str, output: &ParseOutput) -> String {
    let summary = ParseSummary::of(output);
    let mut lines = vec![
        "# Dependency Report".to_string(),
        String::new(),
        format!("**File**: {}", file),
        String::new(),
        "## Summary".to_string(),
        "| Item | Count |".to_string(),
        "|------|-------|".to_string(),
        format!("| Libraries | {} |", summary.libraries),
        format!("| With dependencies | {} |", summary.dependencies),
        format!("| Edges | {} |", summary.edges),
        String::new(),
    ];

    if output.libraries.is_empty() {
        lines.push("## No libraries found".to_string());
        return lines.join("\n");
    }

    lines.push("## Libraries".to_string());
    lines.push(String::new());
    lines.push("| Name | Version | Lines |".to_string());
    lines.push("|------|---------|-------|".to_string());
    for lib in &output.libraries {
        let locations: Vec<String> = lib.locations.iter().map(format_location).collect();
        lines.push(format!(
            "| {} | {} | {} |",
            lib.name,
            lib.version,
            locations.join(", ")
        ));
    }

    if !output.dependencies.is_empty() {
        lines.push(String::new());
        lines.push("## Dependencies".to_string());
        lines.push(String::new());
        for dep in &output.dependencies {
            lines.push(format!("### {}", dep.id));
            lines.push(String::new());
            for target in &dep.depends_on {
                lines.push(format!("- {}", target));
            }
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

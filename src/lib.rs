//! dep-parser - dependency extraction for package manifests
//!
//! Turns requirements/constraints files and sbt lock files into a uniform
//! list of pinned libraries with source locations, plus optional
//! library-to-library edges.
//!
//! ```no_run
//! use dep_parser::parsers::{Parser, pip::RequirementsParser};
//!
//! let output = RequirementsParser::new()
//!     .parse_bytes(b"Flask==2.0.0\nclick==8.0.0\n")
//!     .unwrap();
//! assert_eq!(output.libraries[0].id, "Flask@2.0.0");
//! ```

pub mod config;
pub mod encoding;
pub mod error;
pub mod file_types;
pub mod graph;
pub mod lines;
pub mod normalize;
pub mod parsers;
pub mod reports;
pub mod types;

pub use error::{ParseError, Result};
pub use parsers::Parser;
pub use types::{Dependency, Library, Location, ParseOutput};

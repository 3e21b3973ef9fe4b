#![no_main]

use dep_parser::parsers::Parser;
use dep_parser::parsers::pip::{InMemoryResolver, RequirementsParser};
use libfuzzer_sys::fuzz_target;
use std::panic::AssertUnwindSafe;

fuzz_target!(|data: &[u8]| {
    // The input doubles as its own constraints file
    let parser = RequirementsParser::new()
        .with_resolver(InMemoryResolver::new().with_file("c.txt", data.to_vec()));

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| parser.parse_bytes(data)));

    let Ok(Ok(output)) = result else {
        assert!(result.is_ok(), "parser panicked");
        return;
    };

    for lib in &output.libraries {
        assert!(!lib.version.is_empty(), "emitted library without a version");
        assert_eq!(lib.id, format!("{}@{}", lib.name, lib.version));
        assert!(!lib.locations.is_empty(), "library without a location");
        for loc in &lib.locations {
            assert!(loc.start_line >= 1, "lines are 1-indexed");
            assert!(loc.start_line <= loc.end_line, "start_line must be <= end_line");
        }
    }

    for dep in &output.dependencies {
        for target in &dep.depends_on {
            assert!(output.library(target).is_some(), "dangling dependency");
        }
    }
});

#![no_main]

use dep_parser::ParseError;
use dep_parser::parsers::Parser;
use dep_parser::parsers::sbt::SbtLockParser;
use libfuzzer_sys::fuzz_target;
use std::panic::AssertUnwindSafe;

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let parser = SbtLockParser::new();

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| parser.parse_bytes(data)));
    let line_count = content.lines().count().max(1);

    match result {
        Ok(Ok(output)) => {
            for lib in &output.libraries {
                assert_eq!(lib.id, format!("{}@{}", lib.name, lib.version));
                for loc in &lib.locations {
                    assert!(loc.start_line >= 1, "lines are 1-indexed");
                    assert!(loc.start_line <= loc.end_line, "start_line must be <= end_line");
                    assert!(loc.end_line <= line_count, "end_line must be within the input");
                }
            }
        }
        Ok(Err(ParseError::Syntax { line, .. })) => {
            assert!(line >= 1 && line <= line_count, "syntax error line out of range");
        }
        Ok(Err(_)) => {}
        Err(_) => panic!("parser panicked"),
    }
});

//! File type detection and parser selection
//!
//! Maps a manifest path to the parser that understands it.

use std::path::Path;

use crate::config::Config;
use crate::parsers::Parser;
use crate::parsers::pip::{DirectoryResolver, RequirementsParser};
use crate::parsers::sbt::SbtLockParser;

/// Supported dependency file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Python requirements and constraints files (requirements*.txt, constraints*.txt)
    Requirements,
    /// sbt lock files (build.sbt.lock)
    SbtLock,
}

impl FileType {
    /// Detect the file type from a path.
    ///
    /// Returns `None` if the file name does not match a known pattern.
    pub fn detect(path: &Path) -> Option<Self> {
        let filename = path.file_name()?.to_str()?;
        if filename.ends_with(".txt")
            && (filename.contains("constraints") || filename.contains("requirements"))
        {
            Some(FileType::Requirements)
        } else if filename.ends_with(".sbt.lock") {
            Some(FileType::SbtLock)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FileType::Requirements => "requirements",
            FileType::SbtLock => "sbt-lock",
        }
    }

    /// Build the parser for this file type.
    ///
    /// With a `base_dir`, constraints files referenced by a requirements file
    /// are opened relative to it.
    pub fn parser(self, config: &Config, base_dir: Option<&Path>) -> Box<dyn Parser> {
        match self {
            FileType::Requirements => {
                let parser = RequirementsParser::from_config(&config.requirements);
                match base_dir {
                    Some(dir) => Box::new(parser.with_resolver(DirectoryResolver::new(dir))),
                    None => Box::new(parser),
                }
            }
            FileType::SbtLock => Box::new(SbtLockParser::from_config(&config.lockfile)),
        }
    }
}

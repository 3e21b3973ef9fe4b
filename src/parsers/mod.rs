//! Parsers for dependency files (requirements.txt, build.sbt.lock, etc.)
//!
//! Every ecosystem implements the same [`Parser`] contract. Adding a format
//! means adding a module here; the shared types do not change.

use std::io::Read;

use crate::encoding;
use crate::error::Result;
use crate::types::ParseOutput;

/// Trait for parsing dependency files
pub trait Parser: Send + Sync {
    /// Parse one complete input stream.
    ///
    /// The stream is read to the end and decoded before tokenizing begins.
    fn parse(&self, reader: &mut dyn Read) -> Result<ParseOutput>;

    /// Convenience wrapper for in-memory input
    fn parse_bytes(&self, bytes: &[u8]) -> Result<ParseOutput> {
        let mut reader = bytes;
        self.parse(&mut reader)
    }
}

/// Read a whole stream and decode it to text
pub(crate) fn read_input(reader: &mut dyn Read) -> Result<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(encoding::decode(&bytes)?.into_owned())
}

pub mod pip;
pub mod sbt;

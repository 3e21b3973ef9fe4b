//! Error taxonomy shared by every parser.

use thiserror::Error;

/// Result alias used throughout the parsing core
pub type Result<T> = std::result::Result<T, ParseError>;

/// Failure of a single parse call.
///
/// A parse either succeeds completely or fails with one of these; there are
/// no partial results.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The byte stream could not be transcoded to text.
    #[error("encoding error at byte {offset}: {reason}")]
    Encoding { offset: usize, reason: String },

    /// A line or block failed to tokenize. `line` is 1-indexed.
    #[error("syntax error on line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    /// A dependency edge `from -> to` where either end was not emitted.
    #[error("dependency edge {from} -> {to} names a library that was not emitted")]
    DanglingReference { from: String, to: String },

    /// Surfaced unchanged from the stream supplier.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub(crate) fn syntax(line: usize, reason: impl Into<String>) -> Self {
        ParseError::Syntax {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn encoding(offset: usize, reason: impl Into<String>) -> Self {
        ParseError::Encoding {
            offset,
            reason: reason.into(),
        }
    }

    /// Line number carried by the error, if it has one
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = ParseError::syntax(7, "unclosed extras bracket");
        assert_eq!(
            err.to_string(),
            "syntax error on line 7: unclosed extras bracket"
        );
        assert_eq!(err.line(), Some(7));
    }

    #[test]
    fn test_io_error_passes_through() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "constraints.txt");
        let err: ParseError = io.into();
        assert!(matches!(err, ParseError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_dangling_reference_display() {
        let err = ParseError::DanglingReference {
            from: "Flask@2.0.0".to_string(),
            to: "click@8.0.0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "dependency edge Flask@2.0.0 -> click@8.0.0 names a library that was not emitted"
        );
    }
}

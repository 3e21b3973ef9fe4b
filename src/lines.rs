//! Line tracking for line-oriented formats
//!
//! Splits text into logical lines, splicing physical lines that end in a
//! backslash, and remembers which physical lines each logical line came from.

use std::str::Lines;

use crate::types::Location;

/// One logical line with the physical line span it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// First physical line (1-indexed)
    pub start: usize,
    /// Last physical line (1-indexed, inclusive)
    pub end: usize,
    /// Joined text with continuation markers removed
    pub text: String,
}

impl LogicalLine {
    pub fn location(&self) -> Location {
        Location::new(self.start, self.end)
    }
}

/// Iterator over the logical lines of a text
pub struct LogicalLines<'a> {
    lines: Lines<'a>,
    line_no: usize,
}

impl<'a> LogicalLines<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines(),
            line_no: 0,
        }
    }

    /// Number of physical lines consumed so far
    pub fn physical_lines(&self) -> usize {
        self.line_no
    }
}

impl Iterator for LogicalLines<'_> {
    type Item = LogicalLine;

    fn next(&mut self) -> Option<LogicalLine> {
        let first = self.lines.next()?;
        self.line_no += 1;
        let start = self.line_no;

        // A comment never continues, even with a trailing backslash
        if first.trim_start().starts_with('#') {
            return Some(LogicalLine {
                start,
                end: start,
                text: first.to_string(),
            });
        }

        let mut text = String::with_capacity(first.len());
        let mut current = first;

        loop {
            match current.strip_suffix('\\') {
                Some(head) => {
                    text.push_str(head);
                    match self.lines.next() {
                        Some(next) => {
                            self.line_no += 1;
                            current = next;
                        }
                        None => break,
                    }
                }
                None => {
                    text.push_str(current);
                    break;
                }
            }
        }

        Some(LogicalLine {
            start,
            end: self.line_no,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(content: &str) -> Vec<LogicalLine> {
        LogicalLines::new(content).collect()
    }

    #[test]
    fn test_plain_lines() {
        let lines = collect("a==1\nb==2\n\nc==3");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].start, 1);
        assert_eq!(lines[0].end, 1);
        assert_eq!(lines[2].text, "");
        assert_eq!(lines[3].start, 4);
        assert_eq!(lines[3].text, "c==3");
    }

    #[test]
    fn test_continuation_spans_joined_lines() {
        let content = "FooProject == 1.2 \\\n    --hash=sha256:abc \\\n    --hash=sha256:def\nJinja2==3.0.0\n";
        let lines = collect(content);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].start, 1);
        assert_eq!(lines[0].end, 3);
        assert_eq!(
            lines[0].text,
            "FooProject == 1.2     --hash=sha256:abc     --hash=sha256:def"
        );
        assert_eq!(lines[1].location(), Location::line(4));
    }

    #[test]
    fn test_comment_does_not_continue() {
        let lines = collect("# note \\\nflask==2.0.0");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "flask==2.0.0");
        assert_eq!(lines[1].start, 2);
    }

    #[test]
    fn test_continuation_at_end_of_input() {
        let mut iter = LogicalLines::new("flask==2.0.0 \\");
        let line = iter.next().unwrap();
        assert_eq!(line.text, "flask==2.0.0 ");
        assert_eq!(line.location(), Location::line(1));
        assert!(iter.next().is_none());
        assert_eq!(iter.physical_lines(), 1);
    }

    #[test]
    fn test_crlf_line_endings() {
        let lines = collect("click==8.0.0\r\nFlask==2.0.0\r\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "click==8.0.0");
        assert_eq!(lines[1].text, "Flask==2.0.0");
    }
}

//! Error adapter for converting TraceryError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.
//!
//! JSON parse errors carry the offending input, so they are rendered as a
//! source snippet with a label at the reported line and column. Every other
//! variant becomes a plain diagnostic with a stable code.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use tracery::TraceryError;

/// Adapter for a JSON parse failure with its source text.
pub struct ParseAdapter<'a> {
    err: &'a serde_json::Error,
    src: &'a str,
}

impl<'a> ParseAdapter<'a> {
    /// Create a new parse adapter.
    pub fn new(err: &'a serde_json::Error, src: &'a str) -> Self {
        Self { err, src }
    }

    /// Byte span of the position serde_json reported.
    fn span(&self) -> SourceSpan {
        let offset = line_column_to_offset(self.src, self.err.line(), self.err.column());
        let len = usize::from(offset < self.src.len());
        SourceSpan::new(offset.into(), len)
    }
}

impl fmt::Debug for ParseAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseAdapter")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for ParseAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid workflow input")
    }
}

impl std::error::Error for ParseAdapter<'_> {}

impl MietteDiagnostic for ParseAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("tracery::parse"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "expected an object with a `workflow` array and a `bubbles` table",
        ))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = LabeledSpan::new_primary_with_span(Some(self.err.to_string()), self.span());
        Some(Box::new(std::iter::once(label)))
    }
}

/// Adapter for [`TraceryError`] variants without source information.
pub struct ErrorAdapter<'a>(pub &'a TraceryError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            TraceryError::Io(_) => "tracery::io",
            TraceryError::Parse { .. } => "tracery::parse",
            TraceryError::Config(_) => "tracery::config",
            TraceryError::Graph(_) => "tracery::graph",
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
///
/// This enum wraps either a parse failure with source context or a
/// non-diagnostic error, providing a uniform interface for error rendering.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A parse failure pointing into the input.
    Parse(ParseAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Parse(p) => fmt::Display::fmt(p, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Parse(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Parse(p) => p.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Parse(p) => p.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Parse(p) => p.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Parse(p) => p.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Converts serde_json's 1-based line and column into a byte offset.
///
/// Column 0 (reported at end of input) maps to the start of the line. The
/// result never exceeds `src.len()`.
fn line_column_to_offset(src: &str, line: usize, column: usize) -> usize {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(src.len())
}

/// Convert a [`TraceryError`] into a list of reportable errors.
pub fn to_reportables(err: &TraceryError) -> Vec<Reportable<'_>> {
    match err {
        TraceryError::Parse { err, src } => vec![Reportable::Parse(ParseAdapter::new(err, src))],
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use tracery::graph::GraphError;

    use super::*;

    fn parse_error(src: &str) -> TraceryError {
        let err = serde_json::from_str::<serde_json::Value>(src).unwrap_err();
        TraceryError::new_parse_error(err, src)
    }

    #[test]
    fn test_line_column_to_offset() {
        let src = "ab\ncde\nf";
        assert_eq!(line_column_to_offset(src, 1, 1), 0);
        assert_eq!(line_column_to_offset(src, 2, 2), 4);
        assert_eq!(line_column_to_offset(src, 3, 1), 7);
        assert_eq!(line_column_to_offset(src, 3, 0), 7);
        assert_eq!(line_column_to_offset(src, 9, 9), src.len());
    }

    #[test]
    fn test_parse_error_is_labeled() {
        let src = "{\n  \"workflow\": [,]\n}";
        let err = parse_error(src);

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        let Reportable::Parse(adapter) = &reportables[0] else {
            panic!("Expected Parse");
        };
        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].primary());
        // Second line spans bytes 2..=19.
        assert!((2..=19).contains(&labels[0].offset()));
    }

    #[test]
    fn test_parse_error_at_end_of_input() {
        let src = "{\"workflow\": [";
        let err = parse_error(src);

        let reportables = to_reportables(&err);
        let labels: Vec<_> = reportables[0].labels().unwrap().collect();
        assert!(labels[0].offset() <= src.len());
    }

    #[test]
    fn test_non_parse_error_codes() {
        let cases = [
            (
                TraceryError::Config("bad".to_string()),
                "tracery::config",
                "Configuration error: bad",
            ),
            (
                TraceryError::Graph(GraphError::SelfLoop("step-1".to_string())),
                "tracery::graph",
                "Graph error: step `step-1` has an edge to itself",
            ),
        ];

        for (err, code, message) in &cases {
            let reportables = to_reportables(err);
            assert_eq!(reportables.len(), 1);

            match &reportables[0] {
                Reportable::Error(e) => {
                    assert_eq!(e.to_string(), *message);
                    assert_eq!(e.code().unwrap().to_string(), *code);
                    assert!(e.labels().is_none());
                }
                Reportable::Parse(_) => panic!("Expected Error"),
            }
        }
    }
}

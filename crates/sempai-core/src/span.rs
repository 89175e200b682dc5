//! Source span and position types for locating rule file regions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::source::SourceHash;

/// A line and column position within a source file.
///
/// Both fields are zero-indexed. Columns count characters, not bytes, so a
/// position survives conversion between encodings of the same text.
///
/// # Example
///
/// ```
/// use sempai_core::Position;
///
/// let pos = Position::new(10, 4);
/// assert_eq!(pos.line(), 10);
/// assert_eq!(pos.column(), 4);
/// assert_eq!(pos.to_string(), "10:4");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    /// Zero-indexed line number.
    pub line: u32,
    /// Zero-indexed column number (character offset within the line).
    pub column: u32,
}

impl Position {
    /// Creates a new line/column position.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Returns the zero-indexed line number.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Returns the zero-indexed column number.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open source range attached to a configuration node.
///
/// `start` is inclusive and `end` is exclusive. The optional `file` names
/// the originating document for display, while `source` identifies the text
/// registered in a [`SourceRegistry`](crate::SourceRegistry) so diagnostics
/// can render the surrounding lines.
///
/// Nodes built programmatically rather than parsed carry a
/// [`synthetic`](Self::synthetic) span.
///
/// # Example
///
/// ```
/// use sempai_core::{Position, Span};
///
/// let span = Span::new(Position::new(2, 0), Position::new(4, 0)).with_file("rules.yaml");
/// assert_eq!(span.start().line(), 2);
/// assert_eq!(span.file(), Some("rules.yaml"));
/// assert!(span.source().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
    /// Display name of the originating file, if any.
    pub file: Option<String>,
    /// Content hash of the registered source text, if any.
    pub source: Option<SourceHash>,
}

impl Span {
    /// Creates a span between two positions with no file or source.
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self {
            start,
            end,
            file: None,
            source: None,
        }
    }

    /// Returns the span used for nodes that were never parsed.
    #[must_use]
    pub const fn synthetic() -> Self {
        Self::new(Position::new(0, 0), Position::new(0, 0))
    }

    /// Attaches a file name to the span.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attaches the hash of the registered source text to the span.
    #[must_use]
    pub fn with_source(mut self, source: SourceHash) -> Self {
        self.source = Some(source);
        self
    }

    /// Returns the start position.
    #[must_use]
    pub const fn start(&self) -> &Position {
        &self.start
    }

    /// Returns the end position.
    #[must_use]
    pub const fn end(&self) -> &Position {
        &self.end
    }

    /// Returns the originating file name, if known.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Returns the source hash, if the span points into registered text.
    #[must_use]
    pub const fn source(&self) -> Option<&SourceHash> {
        self.source.as_ref()
    }

    /// Returns `true` when the span does not refer to any registered text.
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        self.source.is_none()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

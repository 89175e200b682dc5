//! Error types for rule file parsing and editing.

use sempai_core::{Level, Position, Span, SpanDiagnostic};
use thiserror::Error;

/// Errors raised while turning YAML text into a [`ConfigTree`](crate::ConfigTree).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum YamlError {
    /// The text is not well-formed YAML.
    #[error("invalid YAML: {message}")]
    Syntax {
        /// Scanner or parser description of the failure.
        message: String,
        /// Best-effort location of the failure.
        position: Option<Position>,
        /// Display name of the file being parsed.
        file: Option<String>,
    },

    /// Collections are nested deeper than the parser accepts.
    #[error("nesting exceeds the limit of {limit} levels")]
    NestingTooDeep {
        /// The maximum supported depth.
        limit: usize,
    },

    /// An alias refers to an anchor that was never defined.
    #[error("alias refers to an unknown anchor")]
    UnknownAnchor {
        /// Location of the alias.
        span: Span,
    },
}

impl YamlError {
    /// Converts the error into a renderable diagnostic.
    #[must_use]
    pub fn to_diagnostic(&self) -> SpanDiagnostic {
        let diagnostic = SpanDiagnostic::new(Level::Error, self.to_string());
        match self {
            Self::Syntax {
                position: Some(position),
                file,
                ..
            } => {
                let mut span = Span::new(*position, *position);
                span.file.clone_from(file);
                diagnostic.with_span(span)
            }
            Self::UnknownAnchor { span } => diagnostic.with_span(span.clone()),
            Self::Syntax { .. } | Self::NestingTooDeep { .. } => diagnostic,
        }
    }
}

/// Errors raised by in-place [`Document`](crate::Document) edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EditError {
    /// No node exists at the requested path.
    #[error("no node at path `{path}`")]
    PathNotFound {
        /// The path that was looked up.
        path: String,
    },

    /// The node at the path is not a sequence.
    #[error("node at `{path}` is not a sequence")]
    NotASequence {
        /// The path that was looked up.
        path: String,
    },

    /// The node at the path is not a scalar.
    #[error("node at `{path}` is not a scalar")]
    NotAScalar {
        /// The path that was looked up.
        path: String,
    },

    /// The sequence has no item at the requested index.
    #[error("index {index} is out of range for `{path}` with {len} items")]
    IndexOutOfRange {
        /// The sequence path.
        path: String,
        /// The requested index.
        index: usize,
        /// Number of items in the sequence.
        len: usize,
    },

    /// The source layout cannot be rewritten without reformatting.
    #[error("cannot edit `{path}`: {reason}")]
    UnsupportedLayout {
        /// The path being edited.
        path: String,
        /// Why the layout is unsupported.
        reason: &'static str,
    },

    /// The edit overlaps an earlier edit without containing it.
    #[error("edit at `{path}` conflicts with an earlier edit")]
    Conflict {
        /// The path being edited.
        path: String,
    },

    /// The replacement value could not be wrapped.
    #[error(transparent)]
    Wrap(#[from] YamlError),
}

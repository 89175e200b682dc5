//! Error types for pattern AST lookups and autofixing.

use std::path::PathBuf;
use std::sync::Arc;

use sempai_core::{Level, Span, SpanDiagnostic};
use sempai_yaml::{EditError, YamlError};
use thiserror::Error;

/// Errors from the external pattern parser.
///
/// Failures are assumed to be deterministic for identical input, so callers
/// report them instead of retrying.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum AstClientError {
    /// The executable could not be started.
    #[error("failed to run {}: {source}", executable.display())]
    Spawn {
        /// The executable that was invoked.
        executable: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The pattern could not be written to a temporary file.
    #[error("failed to stage pattern in a temporary file: {source}")]
    TempFile {
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The executable exited unsuccessfully.
    #[error(
        "{} exited with status {status} for {language} input: {stderr}; \
         this is likely a bug, please file an issue with the failing pattern",
        executable.display()
    )]
    NonZeroExit {
        /// The executable that was invoked.
        executable: PathBuf,
        /// Language passed to the executable.
        language: String,
        /// Exit status code, or -1 when terminated by a signal.
        status: i32,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// The output could not be decoded.
    #[error(
        "could not decode pattern dump: {message}; \
         this is likely a bug, please file an issue with the failing pattern"
    )]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },

    /// AST dump mode was given the wrong number of targets.
    #[error("exactly one target file is required to dump an AST (got {count})")]
    TargetCount {
        /// Number of targets supplied.
        count: usize,
    },
}

/// Errors that stop autofixing a rule file.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum AutofixError {
    /// The rule file is not valid YAML.
    #[error(transparent)]
    Parse(#[from] YamlError),

    /// A pattern AST could not be obtained.
    #[error(transparent)]
    Collaborator(#[from] AstClientError),

    /// The document rejected an edit.
    #[error(transparent)]
    Edit(#[from] EditError),

    /// The classifier and the tree disagree. Continuing could corrupt the
    /// rule file.
    #[error("internal consistency check failed: {message}")]
    InternalConsistency {
        /// What was violated.
        message: String,
        /// Where it was detected.
        span: Option<Span>,
    },

    /// Reading or writing the rule file failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// The rule file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl AutofixError {
    /// Returns `true` for errors that should stop a whole batch, not just
    /// the current file.
    #[must_use]
    pub const fn is_fatal_to_run(&self) -> bool {
        matches!(self, Self::InternalConsistency { .. })
    }

    pub(crate) fn consistency(message: impl Into<String>, span: Option<&Span>) -> Self {
        Self::InternalConsistency {
            message: message.into(),
            span: span.cloned(),
        }
    }

    /// Converts the error into a renderable diagnostic.
    #[must_use]
    pub fn to_diagnostic(&self) -> SpanDiagnostic {
        match self {
            Self::Parse(err) => err.to_diagnostic(),
            Self::InternalConsistency {
                span: Some(span), ..
            } => SpanDiagnostic::new(Level::Error, self.to_string()).with_span(span.clone()),
            Self::Collaborator(_)
            | Self::Edit(_)
            | Self::InternalConsistency { span: None, .. }
            | Self::Io { .. } => SpanDiagnostic::new(Level::Error, self.to_string()),
        }
    }
}

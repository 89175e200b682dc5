//! Span-anchored diagnostic rendering.
//!
//! A [`SpanDiagnostic`] pairs a short message with the source [`Span`]s it
//! concerns. [`SpanDiagnostic::emit`] resolves each span's text through a
//! [`SourceRegistry`] and renders a report of the form:
//!
//! ```text
//! error: duplicate pattern
//!   --> rules.yaml:4
//! 4| - pattern: foo()
//! = help: remove one of the alternatives
//! long message
//! ```
//!
//! Rendering is purely presentational. Spans whose text is not registered
//! produce a location header with an empty snippet body.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::source::SourceRegistry;
use crate::span::Span;

/// File label used for spans that do not name a file.
const UNKNOWN_FILE: &str = "<unknown>";

/// Severity of a diagnostic.
///
/// # Example
///
/// ```
/// use sempai_core::Level;
///
/// assert_eq!(Level::Warning.to_string(), "warning");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// The operation failed.
    Error,
    /// The rule file is valid but could be improved.
    Warning,
    /// Informational note.
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
            Self::Info => f.write_str("info"),
        }
    }
}

/// Number of lines rendered around each span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Lines shown before the span's first line.
    pub before: u32,
    /// Lines shown after the span's last line.
    pub after: u32,
}

impl ContextWindow {
    /// Creates a context window.
    #[must_use]
    pub const fn new(before: u32, after: u32) -> Self {
        Self { before, after }
    }
}

/// A diagnostic message anchored to zero or more source spans.
///
/// # Example
///
/// ```
/// use sempai_core::{ContextWindow, Level, Position, SourceRegistry, Span, SpanDiagnostic};
///
/// let registry = SourceRegistry::new();
/// let hash = registry.register("rules:\n  - id: demo\n");
/// let span = Span::new(Position::new(1, 4), Position::new(2, 0))
///     .with_file("demo.yaml")
///     .with_source(hash);
///
/// let report = SpanDiagnostic::new(Level::Error, "missing languages")
///     .with_span(span)
///     .with_help("add a `languages` list")
///     .emit(&registry, ContextWindow::default());
///
/// assert_eq!(
///     report,
///     "error: missing languages\n  --> demo.yaml:2\n2|   - id: demo\n= help: add a `languages` list\n"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanDiagnostic {
    level: Level,
    short_message: String,
    long_message: Option<String>,
    spans: Vec<Span>,
    help: Option<String>,
}

impl SpanDiagnostic {
    /// Creates a diagnostic with no spans.
    #[must_use]
    pub fn new(level: Level, short_message: impl Into<String>) -> Self {
        Self {
            level,
            short_message: short_message.into(),
            long_message: None,
            spans: Vec::new(),
            help: None,
        }
    }

    /// Appends a span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }

    /// Appends several spans, preserving their order.
    #[must_use]
    pub fn with_spans(mut self, spans: impl IntoIterator<Item = Span>) -> Self {
        self.spans.extend(spans);
        self
    }

    /// Sets the help line.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Sets the long message printed after all snippets.
    #[must_use]
    pub fn with_long_message(mut self, message: impl Into<String>) -> Self {
        self.long_message = Some(message.into());
        self
    }

    /// Returns the severity.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Returns the one-line summary.
    #[must_use]
    pub fn short_message(&self) -> &str {
        &self.short_message
    }

    /// Returns the long message, if any.
    #[must_use]
    pub fn long_message(&self) -> Option<&str> {
        self.long_message.as_deref()
    }

    /// Returns the spans in insertion order.
    #[must_use]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Returns the help text, if any.
    #[must_use]
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Renders the report.
    ///
    /// Each span contributes a `  --> <file>:<line>` header followed by the
    /// lines in `[start.line - before, end.line + after)`, clamped to the
    /// source and always including the span's first line. Line numbers are
    /// one-based and right-aligned to the widest number in that snippet.
    /// Snippets appear in span order without deduplication.
    #[must_use]
    pub fn emit(&self, registry: &SourceRegistry, window: ContextWindow) -> String {
        let mut output = format!("{}: {}\n", self.level, self.short_message);
        for span in &self.spans {
            render_span(&mut output, registry, span, window);
        }
        if let Some(help) = &self.help {
            output.push_str("= help: ");
            output.push_str(help);
            output.push('\n');
        }
        if let Some(long) = &self.long_message {
            output.push_str(long);
            output.push('\n');
        }
        output
    }
}

fn render_span(output: &mut String, registry: &SourceRegistry, span: &Span, window: ContextWindow) {
    let file = span.file().unwrap_or(UNKNOWN_FILE);
    output.push_str(&format!(
        "  --> {file}:{}\n",
        span.start.line.saturating_add(1)
    ));

    let Some(text) = span.source().and_then(|hash| registry.get(hash)) else {
        return;
    };
    let lines: Vec<&str> = text.lines().collect();
    let total = u32::try_from(lines.len()).unwrap_or(u32::MAX);

    let first = span.start.line.saturating_sub(window.before);
    let last = span
        .end
        .line
        .saturating_add(window.after)
        .max(span.start.line.saturating_add(1))
        .min(total);
    if first >= last {
        return;
    }

    let width = last.to_string().len();
    for index in first..last {
        let line = usize::try_from(index)
            .ok()
            .and_then(|i| lines.get(i))
            .copied()
            .unwrap_or_default();
        let number = index.saturating_add(1);
        output.push_str(&format!("{number:>width$}| {line}\n"));
    }
}

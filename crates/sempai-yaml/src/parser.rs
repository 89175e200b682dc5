//! YAML text to [`ConfigTree`] conversion.
//!
//! The parser consumes the event stream from `saphyr-parser` and assembles
//! nodes on an explicit stack, so deeply nested input is bounded by
//! [`MAX_DEPTH`] rather than by the call stack. Every node receives the span
//! the scanner reported for its construct, tagged with the file name and the
//! hash under which the text was registered.

use std::collections::HashMap;

use saphyr_parser::{Event, Marker, Parser, ScalarStyle as EventStyle, ScanError};
use sempai_core::{SourceHash, SourceRegistry, Span};
use tracing::debug;

use crate::error::YamlError;
use crate::lines::LineIndex;
use crate::scalar::resolve_plain;
use crate::tree::{ConfigTree, Layout, Scalar, ScalarStyle, TreeValue};

/// Tracing target for parser operations.
const PARSER_TARGET: &str = "sempai_yaml::parser";

/// Maximum nesting of collections accepted by [`parse`] and [`wrap`](crate::wrap).
///
/// Matches the scanner's own limit on nested flow collections, so block and
/// flow input are cut off at the same depth.
pub const MAX_DEPTH: usize = 255;

/// Message the scanner reports once flow collections nest past its limit.
const SCANNER_RECURSION_LIMIT: &str = "recursion limit exceeded";

/// Parses `text` into a [`ConfigTree`].
///
/// The text is registered in `registry` before parsing so that every span
/// in the result can be rendered later. Only the first document of a
/// stream is read; an empty stream yields a `null` root.
///
/// # Errors
///
/// Returns [`YamlError::Syntax`] for malformed YAML,
/// [`YamlError::NestingTooDeep`] past [`MAX_DEPTH`], and
/// [`YamlError::UnknownAnchor`] for dangling aliases. No partial tree is
/// returned.
///
/// # Example
///
/// ```
/// use sempai_core::SourceRegistry;
/// use sempai_yaml::parse;
///
/// let registry = SourceRegistry::new();
/// let tree = parse(&registry, "rules:\n  - id: demo\n", Some("demo.yaml"))?;
///
/// let id = tree.get("rules").and_then(|r| r.as_sequence()).and_then(|r| r.first());
/// let id = id.and_then(|rule| rule.get("id")).expect("id");
/// assert_eq!(id.as_str(), Some("demo"));
/// assert_eq!(id.span().start().line(), 1);
/// assert_eq!(id.span().start().column(), 8);
/// # Ok::<(), sempai_yaml::YamlError>(())
/// ```
pub fn parse(
    registry: &SourceRegistry,
    text: &str,
    file: Option<&str>,
) -> Result<ConfigTree, YamlError> {
    let hash = registry.register(text);
    let lines = LineIndex::new(text);
    parse_registered(text, hash, &lines, file)
}

/// Parses text that has already been registered under `hash`.
pub(crate) fn parse_registered(
    text: &str,
    hash: SourceHash,
    lines: &LineIndex,
    file: Option<&str>,
) -> Result<ConfigTree, YamlError> {
    let mut builder = TreeBuilder {
        text,
        lines,
        file,
        hash,
        stack: Vec::new(),
        anchors: HashMap::new(),
        root: None,
        nodes: 0,
    };

    for next in Parser::new_from_str(text) {
        let (event, span) = next.map_err(|err| syntax_error(&err, lines, file))?;
        if builder.accept(event, span.start, span.end)? {
            break;
        }
    }

    debug!(
        target: PARSER_TARGET,
        file = file.unwrap_or_default(),
        nodes = builder.nodes,
        "parsed configuration"
    );

    let empty = builder.span(0, 0);
    Ok(builder.root.unwrap_or_else(|| {
        ConfigTree::new(
            TreeValue::Scalar(Scalar::Null),
            empty,
            Layout::Scalar(ScalarStyle::Plain),
        )
    }))
}

fn syntax_error(err: &ScanError, lines: &LineIndex, file: Option<&str>) -> YamlError {
    if err.info() == SCANNER_RECURSION_LIMIT {
        return YamlError::NestingTooDeep { limit: MAX_DEPTH };
    }
    YamlError::Syntax {
        message: err.info().to_owned(),
        position: Some(lines.position(err.marker().index())),
        file: file.map(str::to_owned),
    }
}

/// A collection under construction.
enum Frame {
    Sequence {
        start: usize,
        anchor: usize,
        flow: bool,
        items: Vec<ConfigTree>,
    },
    Mapping {
        start: usize,
        anchor: usize,
        flow: bool,
        entries: Vec<(ConfigTree, ConfigTree)>,
        key: Option<ConfigTree>,
    },
}

struct TreeBuilder<'a> {
    text: &'a str,
    lines: &'a LineIndex,
    file: Option<&'a str>,
    hash: SourceHash,
    stack: Vec<Frame>,
    anchors: HashMap<usize, ConfigTree>,
    root: Option<ConfigTree>,
    nodes: usize,
}

impl TreeBuilder<'_> {
    /// Feeds one event. Returns `true` once the first document is complete.
    fn accept(&mut self, event: Event<'_>, start: Marker, end: Marker) -> Result<bool, YamlError> {
        match event {
            Event::Scalar(value, style, anchor, tag) => {
                let value = String::from(value);
                let is_str_tag = tag.as_ref().is_some_and(|tag| tag.suffix == "str");
                let style = scalar_style(style);
                let scalar = if style == ScalarStyle::Plain && !is_str_tag {
                    resolve_plain(&value)
                } else {
                    Scalar::String(value)
                };
                let node = ConfigTree::new(
                    TreeValue::Scalar(scalar),
                    self.span(start.index(), end.index()),
                    Layout::Scalar(style),
                );
                self.complete(node, anchor);
            }
            Event::SequenceStart(anchor, _) => {
                self.open(Frame::Sequence {
                    start: start.index(),
                    anchor,
                    flow: self.is_flow(start),
                    items: Vec::new(),
                })?;
            }
            Event::MappingStart(anchor, _) => {
                self.open(Frame::Mapping {
                    start: start.index(),
                    anchor,
                    flow: self.is_flow(start),
                    entries: Vec::new(),
                    key: None,
                })?;
            }
            Event::SequenceEnd | Event::MappingEnd => {
                if let Some(frame) = self.stack.pop() {
                    let (node, anchor) = self.close(frame, end.index());
                    self.complete(node, anchor);
                }
            }
            Event::Alias(id) => {
                let alias_span = self.span(start.index(), end.index());
                let node = self
                    .anchors
                    .get(&id)
                    .cloned()
                    .ok_or(YamlError::UnknownAnchor { span: alias_span })?;
                self.complete(node, 0);
            }
            Event::DocumentEnd => return Ok(self.root.is_some()),
            _ => {}
        }
        Ok(false)
    }

    fn open(&mut self, frame: Frame) -> Result<(), YamlError> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(YamlError::NestingTooDeep { limit: MAX_DEPTH });
        }
        self.stack.push(frame);
        Ok(())
    }

    fn close(&self, frame: Frame, end: usize) -> (ConfigTree, usize) {
        match frame {
            Frame::Sequence {
                start,
                anchor,
                flow,
                items,
            } => (
                ConfigTree::new(
                    TreeValue::Sequence(items),
                    self.span(start, end),
                    collection_layout(flow),
                ),
                anchor,
            ),
            Frame::Mapping {
                start,
                anchor,
                flow,
                entries,
                ..
            } => (
                ConfigTree::new(
                    TreeValue::Mapping(entries),
                    self.span(start, end),
                    collection_layout(flow),
                ),
                anchor,
            ),
        }
    }

    /// Attaches a finished node to its parent, or makes it the root.
    fn complete(&mut self, node: ConfigTree, anchor: usize) {
        self.nodes = self.nodes.saturating_add(1);
        if anchor != 0 {
            self.anchors.insert(anchor, node.clone());
        }
        match self.stack.last_mut() {
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                Some(k) => entries.push((k, node)),
                None => *key = Some(node),
            },
            None => {
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
        }
    }

    fn span(&self, start: usize, end: usize) -> Span {
        let span = Span::new(self.lines.position(start), self.lines.position(end))
            .with_source(self.hash);
        match self.file {
            Some(file) => span.with_file(file),
            None => span,
        }
    }

    fn is_flow(&self, start: Marker) -> bool {
        let offset = self.lines.offset(self.text, self.lines.position(start.index()));
        self.text
            .get(offset..)
            .is_some_and(|rest| rest.starts_with(['[', '{']))
    }
}

const fn collection_layout(flow: bool) -> Layout {
    if flow { Layout::Flow } else { Layout::Block }
}

fn scalar_style(style: EventStyle) -> ScalarStyle {
    match style {
        EventStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        EventStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        EventStyle::Literal => ScalarStyle::Literal,
        EventStyle::Folded => ScalarStyle::Folded,
        _ => ScalarStyle::Plain,
    }
}

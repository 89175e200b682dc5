//! In-place editing of a parsed rule file.
//!
//! A [`Document`] keeps the original text next to its [`ConfigTree`]. Edits
//! update the tree and record a byte-range replacement against the original
//! text; [`Document::render`] applies the recorded replacements and leaves
//! every other byte untouched. Only block sequences and scalars can be
//! edited. Flow collections are rejected rather than reformatted.

use std::ops::Range;
use std::sync::Arc;

use sempai_core::{Position, SourceHash, SourceRegistry};
use tracing::debug;

use crate::convert::wrap;
use crate::error::{EditError, YamlError};
use crate::lines::LineIndex;
use crate::parser::parse_registered;
use crate::scalar;
use crate::tree::{ConfigTree, Layout, ScalarStyle, TreePath, TreeValue};

/// Tracing target for document edits.
const DOCUMENT_TARGET: &str = "sempai_yaml::document";

/// A recorded replacement of `range` in the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TextEdit {
    range: Range<usize>,
    replacement: String,
}

/// A parsed YAML document that supports format-preserving edits.
///
/// # Example
///
/// ```
/// use sempai_core::SourceRegistry;
/// use sempai_yaml::{Document, TreePath};
///
/// let text = "items:\n  - a\n  - b # keep\n  - a\n";
/// let registry = SourceRegistry::new();
/// let mut document = Document::parse(&registry, text, Some("list.yaml"))?;
///
/// let items = TreePath::root().key("items");
/// let removed = document.remove_sequence_item(&items, 2)?;
/// assert_eq!(removed.as_str(), Some("a"));
/// assert_eq!(document.render(), "items:\n  - a\n  - b # keep\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    file: Option<String>,
    hash: SourceHash,
    text: Arc<str>,
    lines: LineIndex,
    root: ConfigTree,
    edits: Vec<TextEdit>,
}

impl Document {
    /// Registers `text` and parses it.
    ///
    /// # Errors
    ///
    /// Returns the [`YamlError`] raised by the parser.
    pub fn parse(
        registry: &SourceRegistry,
        text: &str,
        file: Option<&str>,
    ) -> Result<Self, YamlError> {
        let hash = registry.register(text);
        let lines = LineIndex::new(text);
        let root = parse_registered(text, hash, &lines, file)?;
        Ok(Self {
            file: file.map(str::to_owned),
            hash,
            text: Arc::from(text),
            lines,
            root,
            edits: Vec::new(),
        })
    }

    /// Returns the current tree.
    #[must_use]
    pub const fn root(&self) -> &ConfigTree {
        &self.root
    }

    /// Returns the file name given at parse time.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Returns the hash of the original text.
    #[must_use]
    pub const fn source_hash(&self) -> SourceHash {
        self.hash
    }

    /// Returns the original text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.text
    }

    /// Returns `true` once any edit has been recorded.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Removes item `index` from the block sequence at `path`.
    ///
    /// Non-final items take every line from their own entry up to the next
    /// entry. The final item takes its lines up to the end of its content,
    /// leaving any following comments and siblings in place.
    ///
    /// # Errors
    ///
    /// Fails when the path does not lead to a sequence, the index is out of
    /// range, the sequence is written in flow style, the removal would leave
    /// it empty, or entries do not each begin their own `- ` line.
    pub fn remove_sequence_item(
        &mut self,
        path: &TreePath,
        index: usize,
    ) -> Result<ConfigTree, EditError> {
        let range = self.removal_range(path, index)?;
        self.record(path, range, String::new())?;

        let removed = match self.root.at_mut(path).map(ConfigTree::value_mut) {
            Some(TreeValue::Sequence(items)) if index < items.len() => items.remove(index),
            _ => return Err(not_found(path)),
        };
        debug!(
            target: DOCUMENT_TARGET,
            path = %path,
            index,
            "removed sequence item"
        );
        Ok(removed)
    }

    /// Replaces the scalar at `path` with the string `value`.
    ///
    /// The new node keeps the original span and style. A style that cannot
    /// hold the new text (for example a plain scalar that would need
    /// quoting) is written as a double-quoted scalar instead. Block scalars
    /// are rewritten from their `|` or `>` header as literal blocks at their
    /// original indentation.
    ///
    /// # Errors
    ///
    /// Fails when the path does not lead to a scalar parsed from this
    /// document.
    pub fn replace_scalar(&mut self, path: &TreePath, value: &str) -> Result<(), EditError> {
        let node = self.root.at(path).ok_or_else(|| not_found(path))?;
        if node.as_scalar().is_none() {
            return Err(EditError::NotAScalar {
                path: path.to_string(),
            });
        }
        let Layout::Scalar(style) = node.layout() else {
            return Err(unsupported(path, "scalar was not parsed from source"));
        };
        self.ensure_owned(node, path)?;

        let span = node.span().clone();
        let content_start = self.offset(span.start);
        let start = match style {
            ScalarStyle::Literal | ScalarStyle::Folded => self
                .block_header_start(content_start)
                .ok_or_else(|| unsupported(path, "block scalar header not found"))?,
            ScalarStyle::Plain | ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted => {
                content_start
            }
        };
        let end = self.offset(span.end).max(content_start);
        let original = self.text.get(start..end).unwrap_or_default();
        let content_len = original.trim_end().len();
        let tail = original.get(content_len..).unwrap_or_default();
        let indent = self.block_indent(original, span.start);
        let replacement = format!("{}{tail}", scalar::render(value, style, &indent));

        self.record(path, start..end, replacement)?;

        let wrapped = wrap(value, &span)?;
        if let Some(target) = self.root.at_mut(path) {
            *target = ConfigTree::new(wrapped.into_value(), span, Layout::Scalar(style));
        }
        debug!(target: DOCUMENT_TARGET, path = %path, "replaced scalar");
        Ok(())
    }

    /// Returns the text with every recorded edit applied.
    ///
    /// An unedited document renders byte-identical to its source.
    #[must_use]
    pub fn render(&self) -> String {
        let mut ordered: Vec<&TextEdit> = self.edits.iter().collect();
        ordered.sort_by(|a, b| b.range.start.cmp(&a.range.start));

        let mut output = self.text.to_string();
        for edit in ordered {
            let Range { start, end } = edit.range;
            if end > output.len() || !output.is_char_boundary(start) || !output.is_char_boundary(end)
            {
                continue;
            }
            output.replace_range(start..end, &edit.replacement);
        }
        output
    }

    fn removal_range(&self, path: &TreePath, index: usize) -> Result<Range<usize>, EditError> {
        let sequence = self.root.at(path).ok_or_else(|| not_found(path))?;
        let items = sequence.as_sequence().ok_or_else(|| EditError::NotASequence {
            path: path.to_string(),
        })?;
        let item = items.get(index).ok_or_else(|| EditError::IndexOutOfRange {
            path: path.to_string(),
            index,
            len: items.len(),
        })?;
        if sequence.layout() != Layout::Block {
            return Err(unsupported(path, "only block sequences can be edited"));
        }
        if items.len() < 2 {
            return Err(unsupported(path, "removal would empty the sequence"));
        }
        self.ensure_owned(item, path)?;

        let start = self
            .entry_start(item)
            .ok_or_else(|| unsupported(path, "sequence entry does not begin its own line"))?;
        let end = match items.get(index.saturating_add(1)) {
            Some(next) => self
                .entry_start(next)
                .ok_or_else(|| unsupported(path, "sequence entry does not begin its own line"))?,
            None => {
                let end = self.entry_end(item);
                if self.follows_blank_line(start) {
                    self.skip_blank_lines(end)
                } else {
                    end
                }
            }
        };
        if end <= start {
            return Err(unsupported(path, "sequence entries share a line"));
        }
        Ok(start..end)
    }

    /// Returns the byte offset of the line holding `item`'s `- ` indicator.
    fn entry_start(&self, item: &ConfigTree) -> Option<usize> {
        let content_start = self.offset(item.span().start);
        let item_start = match item.layout() {
            Layout::Scalar(ScalarStyle::Literal | ScalarStyle::Folded) => {
                self.block_header_start(content_start)?
            }
            _ => content_start,
        };
        let line_start = self
            .text
            .get(..item_start)?
            .rfind('\n')
            .map_or(0, |newline| newline.saturating_add(1));
        let prefix = self.text.get(line_start..item_start)?;
        let rest = self.text.get(item_start..)?;

        let dash_in_prefix = prefix.trim() == "-" && prefix.ends_with([' ', '\t']);
        let dash_at_item = prefix.trim().is_empty()
            && rest
                .strip_prefix('-')
                .is_some_and(|after| after.starts_with([' ', '\t', '\n']));
        if dash_in_prefix || dash_at_item {
            return Some(line_start);
        }

        // `-` alone on the line above, with the item indented below it.
        if !prefix.trim().is_empty() {
            return None;
        }
        let (above_start, above) = self.line_before(line_start)?;
        (above.trim() == "-").then_some(above_start)
    }

    /// Returns the start offset and text of the line ending just before
    /// `line_start`.
    fn line_before(&self, line_start: usize) -> Option<(usize, &str)> {
        let head = self.text.get(..line_start)?.strip_suffix('\n')?;
        let start = head.rfind('\n').map_or(0, |newline| newline.saturating_add(1));
        Some((start, head.get(start..)?))
    }

    fn follows_blank_line(&self, line_start: usize) -> bool {
        self.line_before(line_start)
            .is_some_and(|(_, line)| line.trim().is_empty())
    }

    /// Returns the offset past any whitespace-only lines starting at
    /// `line_start`.
    fn skip_blank_lines(&self, line_start: usize) -> usize {
        let mut end = line_start;
        while let Some(rest) = self.text.get(end..).filter(|rest| !rest.is_empty()) {
            let line_len = rest.find('\n').map_or(rest.len(), |newline| newline.saturating_add(1));
            if !rest.get(..line_len).unwrap_or_default().trim().is_empty() {
                break;
            }
            end = end.saturating_add(line_len);
        }
        end
    }

    /// Returns the offset of the `|` or `>` header of the block scalar whose
    /// content begins at `content_start`.
    fn block_header_start(&self, content_start: usize) -> Option<usize> {
        if self.text.get(content_start..)?.starts_with(['|', '>']) {
            return Some(content_start);
        }
        let before = self.text.get(..content_start)?.trim_end();
        let line_start = before.rfind('\n').map_or(0, |newline| newline.saturating_add(1));
        let line = before.get(line_start..)?;
        line.char_indices()
            .rev()
            .find(|&(at, indicator)| {
                matches!(indicator, '|' | '>')
                    && line
                        .get(..at)
                        .is_some_and(|head| head.is_empty() || head.ends_with([' ', '\t']))
                    && line.get(at..).is_some_and(is_block_header)
            })
            .map(|(at, _)| line_start.saturating_add(at))
    }

    /// Returns the offset just past the newline ending `item`'s content.
    fn entry_end(&self, item: &ConfigTree) -> usize {
        let content_end = self.content_end(item);
        self.text
            .get(content_end..)
            .and_then(|rest| rest.find('\n'))
            .map_or(self.text.len(), |newline| {
                content_end.saturating_add(newline).saturating_add(1)
            })
    }

    /// Returns the furthest non-whitespace byte offset covered by `node`'s
    /// leaves.
    fn content_end(&self, node: &ConfigTree) -> usize {
        let mut furthest = 0;
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            let children_before = pending.len();
            match current.value() {
                TreeValue::Sequence(items) => pending.extend(items),
                TreeValue::Mapping(entries) => {
                    pending.extend(entries.iter().flat_map(|(k, v)| [k, v]));
                }
                TreeValue::Scalar(_) => {}
            }
            if pending.len() == children_before {
                furthest = furthest.max(self.trimmed_end(current));
            }
        }
        furthest
    }

    fn trimmed_end(&self, node: &ConfigTree) -> usize {
        let start = self.offset(node.span().start);
        let end = self.offset(node.span().end).max(start);
        let covered = self.text.get(start..end).unwrap_or_default();
        start.saturating_add(covered.trim_end().len())
    }

    /// Returns the indentation for block scalar content lines.
    fn block_indent(&self, original: &str, start: Position) -> String {
        let existing = original
            .lines()
            .skip(1)
            .find(|line| !line.trim().is_empty())
            .map(|line| {
                let content = line.trim_start().len();
                line.get(..line.len().saturating_sub(content))
                    .unwrap_or_default()
                    .to_owned()
            });
        existing.unwrap_or_else(|| {
            let line_start = self.lines.line_start(&self.text, start);
            let line = self.text.get(line_start..).unwrap_or_default();
            let depth = line.len().saturating_sub(line.trim_start().len());
            " ".repeat(depth.saturating_add(2))
        })
    }

    fn ensure_owned(&self, node: &ConfigTree, path: &TreePath) -> Result<(), EditError> {
        if node.span().source() == Some(&self.hash) {
            Ok(())
        } else {
            Err(unsupported(path, "node was not parsed from this document"))
        }
    }

    fn offset(&self, position: Position) -> usize {
        self.lines.offset(&self.text, position)
    }

    /// Records an edit, discarding earlier edits it fully covers.
    fn record(
        &mut self,
        path: &TreePath,
        range: Range<usize>,
        replacement: String,
    ) -> Result<(), EditError> {
        let covers = |inner: &Range<usize>| range.start <= inner.start && inner.end <= range.end;
        let overlaps = |other: &Range<usize>| other.start < range.end && range.start < other.end;
        if self
            .edits
            .iter()
            .any(|edit| overlaps(&edit.range) && !covers(&edit.range))
        {
            return Err(EditError::Conflict {
                path: path.to_string(),
            });
        }
        self.edits.retain(|edit| !covers(&edit.range));
        self.edits.push(TextEdit { range, replacement });
        Ok(())
    }
}

fn not_found(path: &TreePath) -> EditError {
    EditError::PathNotFound {
        path: path.to_string(),
    }
}

fn unsupported(path: &TreePath, reason: &'static str) -> EditError {
    EditError::UnsupportedLayout {
        path: path.to_string(),
        reason,
    }
}

/// Returns `true` if `text` is a block scalar header: an indicator, optional
/// chomping and indentation indicators, then an optional comment.
fn is_block_header(text: &str) -> bool {
    let header = text.split_once('#').map_or(text, |(head, _)| head).trim_end();
    let mut chars = header.chars();
    chars.next().is_some_and(|indicator| matches!(indicator, '|' | '>'))
        && chars.all(|c| c == '+' || c == '-' || c.is_ascii_digit())
}

//! Conversions between character offsets, positions, and byte offsets.

use sempai_core::Position;

/// Line start table for one source text.
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    /// Byte offset of each line start.
    bytes: Vec<usize>,
    /// Character offset of each line start.
    chars: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut bytes = vec![0];
        let mut chars = vec![0];
        for (char_index, (byte_index, ch)) in text.char_indices().enumerate() {
            if ch == '\n' {
                bytes.push(byte_index.saturating_add(1));
                chars.push(char_index.saturating_add(1));
            }
        }
        Self { bytes, chars }
    }

    /// Converts a character offset from the scanner into a position.
    pub(crate) fn position(&self, char_offset: usize) -> Position {
        let line = self
            .chars
            .partition_point(|start| *start <= char_offset)
            .saturating_sub(1);
        let line_start = self.chars.get(line).copied().unwrap_or_default();
        Position::new(
            u32::try_from(line).unwrap_or(u32::MAX),
            u32::try_from(char_offset.saturating_sub(line_start)).unwrap_or(u32::MAX),
        )
    }

    /// Converts a position into a byte offset, clamped to the text.
    pub(crate) fn offset(&self, text: &str, position: Position) -> usize {
        let Some(start) = usize::try_from(position.line)
            .ok()
            .and_then(|line| self.bytes.get(line))
            .copied()
        else {
            return text.len();
        };
        let column = usize::try_from(position.column).unwrap_or(usize::MAX);
        text.get(start..)
            .unwrap_or_default()
            .char_indices()
            .nth(column)
            .map_or(text.len(), |(index, _)| start.saturating_add(index))
    }

    /// Returns the byte offset at which `position`'s line begins.
    pub(crate) fn line_start(&self, text: &str, position: Position) -> usize {
        usize::try_from(position.line)
            .ok()
            .and_then(|line| self.bytes.get(line))
            .copied()
            .unwrap_or(text.len())
    }
}

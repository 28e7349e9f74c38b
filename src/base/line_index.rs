//! Offset to line/column conversion.
//!
//! Built once per document snapshot; lookups are binary searches over the
//! recorded newline offsets. The engine itself works in byte offsets, this
//! index exists for hosts that report positions to editors.

use text_size::TextSize;

use super::Point;

/// Maps byte offsets to [`Point`]s and back for one version of a text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the start of each line. Always begins with 0.
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::new(i as u32 + 1));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// The [`Point`] of a byte offset. Offsets past the end saturate to the
    /// end of the text.
    pub fn point_at(&self, offset: TextSize) -> Point {
        let offset = offset.min(self.len);
        let row = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let column = u32::from(offset) - u32::from(self.line_starts[row]);
        Point::new(row, column as usize)
    }

    /// The byte offset of a [`Point`], or `None` if the row does not exist.
    /// Columns past the end of a line clamp to the line's end.
    pub fn offset_at(&self, point: Point) -> Option<TextSize> {
        let start = *self.line_starts.get(point.row)?;
        let line_end = self
            .line_starts
            .get(point.row + 1)
            .map(|&next| next - TextSize::new(1))
            .unwrap_or(self.len);
        let offset = start + TextSize::new(point.column as u32);
        Some(offset.min(line_end))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn len(&self) -> TextSize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == TextSize::new(0)
    }
}

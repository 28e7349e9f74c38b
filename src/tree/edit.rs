//! Edit records applied to a [`Tree`](super::Tree) between parses.

use text_size::{TextRange, TextSize};
use thiserror::Error;

use crate::base::Point;

/// A single replacement of a byte range of the source text.
///
/// Positions describe the same three locations as the byte offsets, in
/// row/column form; they are carried for callers that track points and are
/// not validated beyond the byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEdit {
    pub start_byte: TextSize,
    pub old_end_byte: TextSize,
    pub new_end_byte: TextSize,
    pub start_position: Point,
    pub old_end_position: Point,
    pub new_end_position: Point,
}

impl InputEdit {
    /// The replaced range, in pre-edit coordinates.
    pub fn old_range(&self) -> TextRange {
        TextRange::new(self.start_byte, self.old_end_byte)
    }

    /// The replacement range, in post-edit coordinates.
    pub fn new_range(&self) -> TextRange {
        TextRange::new(self.start_byte, self.new_end_byte)
    }

    /// Signed change in text length.
    pub(crate) fn delta(&self) -> i64 {
        i64::from(u32::from(self.new_end_byte)) - i64::from(u32::from(self.old_end_byte))
    }

    pub(crate) fn check(&self, text_len: TextSize) -> Result<(), EditError> {
        if self.old_end_byte < self.start_byte {
            return Err(EditError::ReversedRange {
                start: self.start_byte,
                end: self.old_end_byte,
            });
        }
        if self.new_end_byte < self.start_byte {
            return Err(EditError::ReversedRange {
                start: self.start_byte,
                end: self.new_end_byte,
            });
        }
        if self.old_end_byte > text_len {
            return Err(EditError::OutOfBounds {
                old_end: self.old_end_byte,
                len: text_len,
            });
        }
        Ok(())
    }
}

/// Rejection reasons for [`Tree::edit`](super::Tree::edit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit ends at {end:?}, before its start at {start:?}")]
    ReversedRange { start: TextSize, end: TextSize },

    #[error("edit replaces text up to {old_end:?} but the tree covers only {len:?} bytes")]
    OutOfBounds { old_end: TextSize, len: TextSize },
}

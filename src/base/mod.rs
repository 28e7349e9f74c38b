//! Foundation types shared by every layer of the engine:
//! - [`TextRange`], [`TextSize`] - byte offsets into source text
//! - [`Point`] - zero-indexed row/column positions
//! - [`LineIndex`] - offset to line/column conversion
//!
//! This module has no dependencies on other arbor modules.

mod line_index;
mod point;

pub use line_index::LineIndex;
pub use point::Point;

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};

//! Parser construction and edit-record helpers for the integration suites.

use arbor::{InputEdit, Language, Parser, Point, TextSize};

/// A parser with `language` installed.
pub fn parser_for(language: &Language) -> Parser {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .expect("fixture tables match the engine version");
    parser
}

/// A single-line edit replacing `[start, old_end)` with `new_end - start`
/// bytes of replacement text.
pub fn edit(start: u32, old_end: u32, new_end: u32) -> InputEdit {
    InputEdit {
        start_byte: TextSize::new(start),
        old_end_byte: TextSize::new(old_end),
        new_end_byte: TextSize::new(new_end),
        start_position: Point::new(0, start as usize),
        old_end_position: Point::new(0, old_end as usize),
        new_end_position: Point::new(0, new_end as usize),
    }
}

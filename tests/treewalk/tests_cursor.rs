//! Cursor traversal tests.
//!
//! Cursors walk visible children only, surface field tags through hidden
//! splices, and never leave the subtree they were opened on.

use arbor::{TextRange, TextSize};

use crate::helpers::grammar_fixtures::{arith, statements};
use crate::helpers::parse_helpers::*;

// =============================================================================
// SIBLING WALKS
// =============================================================================

#[test]
fn test_cursor_walks_visible_children_with_fields() {
    let mut parser = parser_for(&arith::LANGUAGE);
    let tree = parser.parse("a + b", None).unwrap();

    let mut cursor = tree.walk();
    assert_eq!(cursor.node().kind(), "source");

    assert!(cursor.goto_first_child());
    assert_eq!(cursor.node().kind(), "identifier");
    assert_eq!(cursor.field_name(), Some("left"));

    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.node().kind(), "+");
    assert_eq!(cursor.field_name(), None);

    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.node().kind(), "identifier");
    assert_eq!(cursor.field_name(), Some("right"));

    // A failed move keeps the position.
    assert!(!cursor.goto_next_sibling());
    assert_eq!(cursor.node().byte_range(), TextRange::new(4.into(), 5.into()));

    assert!(cursor.goto_parent());
    assert_eq!(cursor.node().kind(), "source");
    assert!(!cursor.goto_parent());
}

#[test]
fn test_cursor_descends_across_statements() {
    let mut parser = parser_for(&statements::LANGUAGE);
    let tree = parser.parse("a ;\nb ;", None).unwrap();
    assert!(!tree.has_error());

    let mut cursor = tree.walk();
    assert!(cursor.goto_first_child());
    assert_eq!(cursor.node().kind(), "statement");
    assert_eq!(cursor.node().byte_range(), TextRange::new(0.into(), 3.into()));

    assert!(cursor.goto_first_child());
    assert_eq!(cursor.node().kind(), "identifier");
    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.node().kind(), ";");
    assert!(!cursor.goto_next_sibling());

    assert!(cursor.goto_parent());
    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.node().byte_range(), TextRange::new(4.into(), 7.into()));
}

// =============================================================================
// BYTE ADDRESSING
// =============================================================================

#[test]
fn test_first_child_for_byte_seeks_past_earlier_children() {
    let mut parser = parser_for(&statements::LANGUAGE);
    let tree = parser.parse("a ;\nb ;", None).unwrap();

    let mut cursor = tree.walk();
    assert!(cursor.goto_first_child_for_byte(TextSize::new(5)));
    assert_eq!(cursor.node().kind(), "statement");
    assert_eq!(cursor.node().byte_range(), TextRange::new(4.into(), 7.into()));

    assert!(cursor.goto_first_child_for_byte(TextSize::new(6)));
    assert_eq!(cursor.node().kind(), ";");

    // Past the end of every child: no move, position retained.
    assert!(!cursor.goto_first_child_for_byte(TextSize::new(20)));
    assert_eq!(cursor.node().kind(), ";");
}

// =============================================================================
// REBASING AND CONFINEMENT
// =============================================================================

#[test]
fn test_cursor_reset_rebases_onto_another_node() {
    let mut parser = parser_for(&statements::LANGUAGE);
    let tree = parser.parse("a ;\nb ;", None).unwrap();

    let second = tree.root_node().named_child(1).unwrap();
    let mut cursor = tree.walk();
    assert!(cursor.goto_first_child());
    assert!(cursor.goto_first_child());

    cursor.reset(second);
    assert_eq!(cursor.node().id(), second.id());
    assert!(!cursor.goto_parent());

    assert!(cursor.goto_first_child());
    assert_eq!(cursor.node().byte_range(), TextRange::new(4.into(), 5.into()));
}

#[test]
fn test_cursor_never_escapes_the_walked_subtree() {
    let mut parser = parser_for(&statements::LANGUAGE);
    let tree = parser.parse("a ;\nb ;", None).unwrap();

    let first = tree.root_node().named_child(0).unwrap();
    let mut cursor = first.walk();
    assert!(!cursor.goto_parent());
    assert!(!cursor.goto_next_sibling());
    assert_eq!(cursor.node().id(), first.id());
}

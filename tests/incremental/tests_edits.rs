//! Edit validation and changed-range tests over the expression fixture.

use arbor::{EditError, TextRange};

use crate::helpers::grammar_fixtures::{arith, statements};
use crate::helpers::parse_helpers::*;

// =============================================================================
// EDIT VALIDATION
// =============================================================================

#[test]
fn test_edit_bounds_follow_the_edited_length() {
    let mut parser = parser_for(&arith::LANGUAGE);
    let mut tree = parser.parse("a + b", None).unwrap();

    assert!(matches!(
        tree.edit(&edit(4, 7, 7)),
        Err(EditError::OutOfBounds { .. })
    ));
    assert!(matches!(
        tree.edit(&edit(3, 2, 4)),
        Err(EditError::ReversedRange { .. })
    ));

    // A growing edit raises the bound for the next one.
    tree.edit(&edit(4, 5, 6)).unwrap();
    tree.edit(&edit(5, 6, 6)).unwrap();
    assert!(matches!(
        tree.edit(&edit(6, 9, 9)),
        Err(EditError::OutOfBounds { .. })
    ));
}

// =============================================================================
// CHANGED RANGES
// =============================================================================

#[test]
fn test_changed_ranges_cover_the_relexed_tail() {
    let mut parser = parser_for(&arith::LANGUAGE);
    let mut old = parser.parse("a + b", None).unwrap();
    old.edit(&edit(4, 5, 6)).unwrap();

    let new = parser.parse("a + bc", Some(&old)).unwrap();
    assert!(!new.has_error());

    let old_left = old.root_node().child_by_field_name("left").unwrap();
    let new_left = new.root_node().child_by_field_name("left").unwrap();
    assert_eq!(old_left.id(), new_left.id(), "untouched operand must be reused");

    // The operator's lexing window reaches the edit, so it is re-lexed;
    // the new token is byte-identical but not shared.
    let new_op = new.root_node().child(1).unwrap();
    assert_eq!(new_op.kind(), "+");
    assert_eq!(new_op.byte_range(), TextRange::new(2.into(), 3.into()));

    assert_eq!(
        new.changed_ranges(&old),
        [TextRange::new(2.into(), 6.into())]
    );
}

#[test]
fn test_unedited_reparse_reports_no_changes() {
    let mut parser = parser_for(&arith::LANGUAGE);
    let first = parser.parse("a + b", None).unwrap();
    let second = parser.parse("a + b", Some(&first)).unwrap();

    assert!(!second.has_error());
    assert_eq!(second.root_node().to_sexp(), first.root_node().to_sexp());
    assert!(second.changed_ranges(&first).is_empty());
}

#[test]
fn test_stacked_edits_compose() {
    let mut parser = parser_for(&arith::LANGUAGE);
    let mut old = parser.parse("a + b", None).unwrap();

    // Insert "xy" at the front, then replace the old "a": "a + b" becomes
    // "xya + b" becomes "xyq + b".
    old.edit(&edit(0, 0, 2)).unwrap();
    old.edit(&edit(2, 3, 3)).unwrap();

    let new = parser.parse("xyq + b", Some(&old)).unwrap();
    assert!(!new.has_error());

    let old_right = old.root_node().child_by_field_name("right").unwrap();
    let new_right = new.root_node().child_by_field_name("right").unwrap();
    assert_eq!(old_right.id(), new_right.id());

    assert_eq!(
        new.changed_ranges(&old),
        [TextRange::new(0.into(), 3.into())]
    );
}

#[test]
fn test_shrinking_edit_reparses_cleanly() {
    let mut parser = parser_for(&arith::LANGUAGE);
    let mut old = parser.parse("a + b", None).unwrap();
    old.edit(&edit(1, 5, 1)).unwrap();

    let new = parser.parse("a", Some(&old)).unwrap();
    assert!(!new.has_error());
    assert_eq!(new.root_node().to_sexp(), "(source (identifier))");
    assert_eq!(
        new.changed_ranges(&old),
        [TextRange::new(0.into(), 1.into())]
    );
}

#[test]
fn test_trees_from_different_languages_diff_whole() {
    let mut arith_parser = parser_for(&arith::LANGUAGE);
    let arith_tree = arith_parser.parse("a", None).unwrap();

    let mut stmt_parser = parser_for(&statements::LANGUAGE);
    let stmt_tree = stmt_parser.parse("b ;", None).unwrap();

    assert_eq!(
        stmt_tree.changed_ranges(&arith_tree),
        [TextRange::new(0.into(), 3.into())]
    );
}

//! Error-recovery tests over the statements fixture.
//!
//! Each malformed input exercises one repair strategy: deleting a stray
//! token, synthesizing a missing one, or sweeping unparsable stretches
//! into error nodes. The tree must always cover the full input.

use arbor::{TextRange, TextSize};
use rstest::rstest;

use crate::helpers::grammar_fixtures::{arith, statements};
use crate::helpers::parse_helpers::*;

// =============================================================================
// TOKEN DELETION
// =============================================================================

#[test]
fn test_stray_token_is_deleted() {
    let mut parser = parser_for(&statements::LANGUAGE);
    let tree = parser.parse("a ? ; b ;", None).unwrap();

    let root = tree.root_node();
    assert_eq!(
        root.to_sexp(),
        "(source (statement (identifier) (ERROR (UNEXPECTED))) (statement (identifier)))"
    );
    assert_eq!(root.byte_range(), TextRange::new(0.into(), 9.into()));
    assert!(tree.has_error());
    assert_eq!(tree.error_count(), 2);
    assert_eq!(tree.error_ranges(), [TextRange::new(2.into(), 3.into())]);
}

// =============================================================================
// TOKEN INSERTION
// =============================================================================

#[test]
fn test_missing_separator_is_synthesized() {
    let mut parser = parser_for(&statements::LANGUAGE);
    let tree = parser.parse("a b ;", None).unwrap();

    let root = tree.root_node();
    assert_eq!(
        root.to_sexp(),
        "(source (statement (identifier) (MISSING \";\")) (statement (identifier)))"
    );
    assert_eq!(tree.error_count(), 1);
    assert_eq!(tree.error_ranges(), [TextRange::empty(TextSize::new(2))]);

    let missing = root.named_child(0).unwrap().child(1).unwrap();
    assert!(missing.is_missing());
    assert_eq!(missing.kind(), ";");
    assert!(missing.byte_range().is_empty());
}

#[test]
fn test_synthesized_tokens_beat_error_wrappers_when_cheaper() {
    let mut parser = parser_for(&statements::LANGUAGE);

    // One missing separator costs less than wrapping a real token.
    let insertion = parser.parse("a b ;", None).unwrap();
    let insertion_sexp = insertion.root_node().to_sexp();
    assert!(insertion_sexp.contains("MISSING"), "got {insertion_sexp}");
    assert!(!insertion_sexp.contains("ERROR"), "got {insertion_sexp}");

    // An unlexable byte can only be wrapped, never synthesized around.
    let deletion = parser.parse("a ? ; b ;", None).unwrap();
    let deletion_sexp = deletion.root_node().to_sexp();
    assert!(deletion_sexp.contains("ERROR"), "got {deletion_sexp}");
    assert!(!deletion_sexp.contains("MISSING"), "got {deletion_sexp}");
}

#[test]
fn test_leading_garbage_still_yields_a_statement() {
    let mut parser = parser_for(&statements::LANGUAGE);
    let tree = parser.parse("? ;", None).unwrap();

    let root = tree.root_node();
    assert_eq!(
        root.to_sexp(),
        "(source (ERROR (UNEXPECTED)) (statement (MISSING identifier)))"
    );
    assert_eq!(tree.error_count(), 3);
    assert_eq!(
        tree.error_ranges(),
        [
            TextRange::new(0.into(), 1.into()),
            TextRange::empty(TextSize::new(2)),
        ]
    );
}

// =============================================================================
// RESYNCHRONIZATION
// =============================================================================

#[test]
fn test_trailing_garbage_is_swept_into_an_error() {
    let mut parser = parser_for(&statements::LANGUAGE);
    let tree = parser.parse("a ; b", None).unwrap();

    let root = tree.root_node();
    assert_eq!(
        root.to_sexp(),
        "(source (statement (identifier)) (ERROR (identifier)))"
    );
    assert_eq!(tree.error_count(), 1);
    assert_eq!(tree.error_ranges(), [TextRange::new(4.into(), 5.into())]);
}

#[test]
fn test_dangling_operator_keeps_the_prefix() {
    let mut parser = parser_for(&arith::LANGUAGE);
    let tree = parser.parse("a +", None).unwrap();

    let root = tree.root_node();
    assert_eq!(root.to_sexp(), "(source (identifier) (ERROR))");
    assert_eq!(root.byte_range(), TextRange::new(0.into(), 3.into()));
    assert_eq!(tree.error_ranges(), [TextRange::new(2.into(), 3.into())]);
}

#[test]
fn test_lone_unlexable_byte_becomes_an_error_root() {
    let mut parser = parser_for(&statements::LANGUAGE);
    let tree = parser.parse("?", None).unwrap();

    let root = tree.root_node();
    assert_eq!(root.to_sexp(), "(source (ERROR (UNEXPECTED)))");
    assert_eq!(root.byte_range(), TextRange::new(0.into(), 1.into()));
    assert!(tree.has_error());
}

// =============================================================================
// COVERAGE UNDER ERRORS
// =============================================================================

#[rstest]
#[case("a ? ; b ;")]
#[case("a b ;")]
#[case("a ; b")]
#[case("? ;")]
#[case("?")]
#[case("; ;")]
fn test_error_trees_still_cover_the_input(#[case] source: &str) {
    let mut parser = parser_for(&statements::LANGUAGE);
    let tree = parser.parse(source, None).unwrap();

    let root = tree.root_node();
    assert_eq!(root.kind(), "source");
    assert_eq!(
        root.byte_range(),
        TextRange::new(0.into(), TextSize::new(source.len() as u32)),
        "root must cover all of {source:?}"
    );
    assert!(tree.has_error(), "expected errors in {source:?}");
    assert!(root.has_error());
}

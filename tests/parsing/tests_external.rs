//! External-scanner tests over the commented fixture.
//!
//! A hand-written scanner produces nested `(* ... *)` comment tokens the
//! table-driven lexer cannot express. The scanner only runs where the
//! grammar admits its token, and its failures fall back to the internal
//! lexer.

use arbor::TextRange;

use crate::helpers::grammar_fixtures::commented;
use crate::helpers::parse_helpers::*;
use crate::helpers::scanner_fixtures::NestedCommentScanner;

// =============================================================================
// SCANNED EXTRAS
// =============================================================================

#[test]
fn test_scanner_token_interleaves_as_extra() {
    let mut parser = parser_for(&commented::LANGUAGE);
    parser.set_external_scanner(Some(Box::new(NestedCommentScanner)));
    let tree = parser.parse("ab (* note *) cd", None).unwrap();

    assert!(!tree.has_error());
    let root = tree.root_node();
    assert_eq!(root.to_sexp(), "(source (word) (comment) (word))");

    let comment = root.named_child(1).unwrap();
    assert_eq!(comment.kind(), "comment");
    assert!(comment.is_named());
    assert!(comment.is_extra());
    assert_eq!(comment.byte_range(), TextRange::new(3.into(), 13.into()));
}

#[test]
fn test_nested_comments_balance() {
    let mut parser = parser_for(&commented::LANGUAGE);
    parser.set_external_scanner(Some(Box::new(NestedCommentScanner)));
    let tree = parser.parse("ab (* x (* y *) z *) cd", None).unwrap();

    assert!(!tree.has_error());
    let root = tree.root_node();
    assert_eq!(root.to_sexp(), "(source (word) (comment) (word))");
    assert_eq!(
        root.named_child(1).unwrap().byte_range(),
        TextRange::new(3.into(), 20.into())
    );
}

#[test]
fn test_comments_fold_at_the_edges() {
    let mut parser = parser_for(&commented::LANGUAGE);
    parser.set_external_scanner(Some(Box::new(NestedCommentScanner)));
    let tree = parser.parse("(* a *) bc (* d *)", None).unwrap();

    assert!(!tree.has_error());
    let root = tree.root_node();
    assert_eq!(root.to_sexp(), "(source (comment) (word) (comment))");
    assert_eq!(root.byte_range(), TextRange::new(0.into(), 18.into()));
}

// =============================================================================
// SCANNER FAILURE PATHS
// =============================================================================

#[test]
fn test_unterminated_comment_falls_back_to_recovery() {
    let mut parser = parser_for(&commented::LANGUAGE);
    parser.set_external_scanner(Some(Box::new(NestedCommentScanner)));
    let tree = parser.parse("ab (* oops", None).unwrap();

    assert!(tree.has_error());
    let root = tree.root_node();
    assert_eq!(
        root.to_sexp(),
        "(source (word) (ERROR (UNEXPECTED) (UNEXPECTED)) (word))"
    );
    assert_eq!(tree.error_ranges(), [TextRange::new(3.into(), 6.into())]);
}

#[test]
fn test_without_a_scanner_comments_are_errors() {
    let mut parser = parser_for(&commented::LANGUAGE);
    let tree = parser.parse("ab (* x *) cd", None).unwrap();

    assert!(tree.has_error(), "comment bytes need the external scanner");
}

#[test]
fn test_scanner_state_resets_between_parses() {
    let mut parser = parser_for(&commented::LANGUAGE);
    parser.set_external_scanner(Some(Box::new(NestedCommentScanner)));

    let first = parser.parse("ab (* note *) cd", None).unwrap();
    let second = parser.parse("ab (* note *) cd", None).unwrap();

    assert!(!first.has_error());
    assert!(!second.has_error());
    assert_eq!(first.root_node().to_sexp(), second.root_node().to_sexp());
}

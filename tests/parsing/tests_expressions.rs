//! Tree-shape tests over the expression fixture.
//!
//! These tests verify hidden-rule splicing, field labels, anonymous
//! tokens, and the byte coverage of well-formed parses.

use arbor::{TextRange, TextSize};
use rstest::rstest;

use crate::helpers::grammar_fixtures::arith;
use crate::helpers::parse_helpers::*;

// =============================================================================
// WELL-FORMED INPUT
// =============================================================================

#[test]
fn test_single_identifier_is_spliced_to_the_root() {
    let mut parser = parser_for(&arith::LANGUAGE);
    let tree = parser.parse("ab", None).unwrap();

    let root = tree.root_node();
    assert_eq!(root.to_sexp(), "(source (identifier))");
    assert_eq!(root.byte_range(), TextRange::new(0.into(), 2.into()));
    assert_eq!(root.child_count(), 1);
    assert!(!tree.has_error());
}

#[rstest]
#[case("a")]
#[case("a + b")]
#[case("ab + cd + ef")]
fn test_well_formed_input_parses_cleanly(#[case] source: &str) {
    let mut parser = parser_for(&arith::LANGUAGE);
    let tree = parser.parse(source, None).unwrap();

    let root = tree.root_node();
    assert_eq!(root.kind(), "source");
    assert_eq!(
        root.byte_range(),
        TextRange::new(0.into(), TextSize::new(source.len() as u32)),
        "root must cover all of {source:?}"
    );
    assert!(!tree.has_error(), "no errors expected in {source:?}");
    assert_eq!(tree.error_count(), 0);
    assert!(tree.error_ranges().is_empty());
}

#[test]
fn test_empty_input_yields_an_empty_root() {
    let mut parser = parser_for(&arith::LANGUAGE);
    let tree = parser.parse("", None).unwrap();

    assert_eq!(tree.len(), TextSize::new(0));
    assert!(!tree.has_error());
    assert_eq!(tree.root_node().to_sexp(), "(source)");
    assert_eq!(tree.root_node().child_count(), 0);
}

// =============================================================================
// ANONYMOUS TOKENS AND FIELDS
// =============================================================================

#[test]
fn test_operator_is_anonymous_but_visible() {
    let mut parser = parser_for(&arith::LANGUAGE);
    let tree = parser.parse("a + b", None).unwrap();

    let root = tree.root_node();
    assert_eq!(root.child_count(), 3);
    assert_eq!(root.named_child_count(), 2);

    let op = root.child(1).unwrap();
    assert_eq!(op.kind(), "+");
    assert!(!op.is_named());
    assert_eq!(op.byte_range(), TextRange::new(2.into(), 3.into()));
    assert_eq!(op.kind_id(), arith::PLUS.raw());

    let language = tree.language();
    assert_eq!(language.symbol_for_name("+", false), Some(arith::PLUS));
    assert_eq!(language.symbol_for_name("+", true), None);
}

#[test]
fn test_fields_label_the_operands() {
    let mut parser = parser_for(&arith::LANGUAGE);
    let tree = parser.parse("a + b", None).unwrap();

    let root = tree.root_node();
    let left = root.child_by_field_name("left").unwrap();
    let right = root.child_by_field_name("right").unwrap();
    assert_eq!(left.utf8_text(b"a + b").unwrap(), "a");
    assert_eq!(right.utf8_text(b"a + b").unwrap(), "b");

    assert_eq!(root.field_name_for_child(0), Some("left"));
    assert_eq!(root.field_name_for_child(1), None);
    assert_eq!(root.field_name_for_child(2), Some("right"));
    assert!(root.child_by_field_name("middle").is_none());
}

#[test]
fn test_nested_sums_splice_flat() {
    let source = "a + b + c";
    let mut parser = parser_for(&arith::LANGUAGE);
    let tree = parser.parse(source, None).unwrap();

    let root = tree.root_node();
    assert_eq!(root.child_count(), 5);
    assert_eq!(root.named_child_count(), 3);
    assert_eq!(
        root.to_sexp(),
        "(source left: (identifier) right: (identifier) right: (identifier))"
    );

    let texts: Vec<&str> = root
        .named_children()
        .map(|child| child.utf8_text(source.as_bytes()).unwrap())
        .collect();
    assert_eq!(texts, ["a", "b", "c"]);
}

// =============================================================================
// CHUNKED INPUT
// =============================================================================

#[test]
fn test_chunked_input_matches_slice_parse() {
    let source = "ab + cd + ef";
    let mut parser = parser_for(&arith::LANGUAGE);
    let whole = parser.parse(source, None).unwrap();

    let bytes = source.as_bytes();
    let chunked = parser
        .parse_with(
            |pos| bytes[pos.min(bytes.len())..].iter().take(3).copied().collect(),
            None,
        )
        .unwrap();

    assert_eq!(chunked.root_node().to_sexp(), whole.root_node().to_sexp());
    assert_eq!(chunked.len(), whole.len());
    assert!(!chunked.has_error());
}

//! # arbor
//!
//! Incremental GLR parsing engine: static grammar tables drive a lexer and
//! a generalized LR stack machine that produce persistent concrete syntax
//! trees, recover from malformed input, and reuse unchanged subtrees across
//! edits.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! parser    → GLR driver: stack versions, error recovery, subtree reuse
//!   ↓
//! lexer     → token DFA walk, lex modes, external scanner interface
//!   ↓
//! tree      → green/red syntax trees, cursors, edits, tree diffing
//!   ↓
//! language  → compiled grammar tables: symbols, states, productions
//!   ↓
//! base      → primitives (Point, LineIndex, TextRange)
//! ```
//!
//! The top-level flow mirrors the usual bindings: build a [`Language`] from
//! generated tables once, hand it to a [`Parser`], and call
//! [`Parser::parse`] with the source bytes and optionally the previous
//! [`Tree`] (edited via [`Tree::edit`]) to parse incrementally.

// ============================================================================
// MODULES (dependency order: base → language → tree → lexer → parser)
// ============================================================================

/// Foundation types: Point, LineIndex, TextRange/TextSize
pub mod base;

/// Grammar tables: symbols, productions, LR states, lex patterns
pub mod language;

/// Lexing: token DFA, lex modes, external scanners
pub mod lexer;

/// GLR driver: stack versions, error recovery, incremental reuse
pub mod parser;

/// Concrete syntax trees: green store, red nodes, cursors, edits
pub mod tree;

// Re-export the parsing surface
pub use parser::{ParseError, Parser};

// Re-export the grammar surface
pub use language::{
    Language, LanguageData, LanguageError, LANGUAGE_VERSION, MIN_COMPATIBLE_LANGUAGE_VERSION,
};

// Re-export the tree surface
pub use tree::{EditError, InputEdit, Node, Tree, TreeCursor};

// Re-export external-scanner plumbing and foundation types
pub use lexer::{ExternalScanner, LexCursor};

pub use base::{LineIndex, Point, TextRange, TextSize};

//! The green layer: immutable, position-independent tree data.
//!
//! Green nodes and tokens store lengths rather than absolute offsets, so a
//! subtree can be shared between tree versions regardless of where edits
//! moved it. The red layer ([`Node`](super::Node), [`TreeCursor`](super::TreeCursor))
//! computes absolute offsets while walking.
//!
//! No text is stored anywhere in the tree; a token knows only its symbol,
//! its length, and the lexing context it was produced in. Callers slice
//! their own source by node ranges.

use std::sync::Arc;

use text_size::TextSize;

use crate::language::{FieldId, LexModeId, ProductionId, Symbol};

pub(crate) const ERROR_COST_PER_RECOVERY: u32 = 100;
pub(crate) const ERROR_COST_PER_MISSING_TOKEN: u32 = 110;
/// Charged for every well-formed subtree swept into an `ERROR` wrapper, so
/// discarding real content always costs more than synthesizing one missing
/// token.
pub(crate) const ERROR_COST_PER_SKIPPED_TREE: u32 = 100;

// ============================================================================
// TOKENS
// ============================================================================

/// A leaf: one lexed terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GreenToken {
    pub(crate) symbol: Symbol,
    pub(crate) len: TextSize,
    /// Bytes examined beyond `len` when this token was lexed. Bounds the
    /// region that must be untouched for the token to be reusable.
    pub(crate) lookahead: u32,
    pub(crate) mode: LexModeId,
    pub(crate) is_extra: bool,
    pub(crate) is_external: bool,
    pub(crate) is_missing: bool,
    pub(crate) is_error: bool,
}

impl GreenToken {
    pub(crate) fn error_cost(&self) -> u32 {
        if self.is_missing {
            ERROR_COST_PER_MISSING_TOKEN
        } else if self.is_error {
            ERROR_COST_PER_RECOVERY + u32::from(self.len)
        } else {
            0
        }
    }

    pub(crate) fn error_count(&self) -> u32 {
        u32::from(self.is_missing || self.is_error)
    }
}

// ============================================================================
// NODES
// ============================================================================

/// A child edge: relative offset inside the parent, optional field tag, and
/// the element itself.
#[derive(Debug, Clone)]
pub(crate) struct GreenChild {
    pub(crate) rel_offset: TextSize,
    pub(crate) field: Option<FieldId>,
    pub(crate) element: GreenElement,
}

#[derive(Debug, Clone)]
pub(crate) enum GreenElement {
    Node(Arc<GreenNodeData>),
    Token(Arc<GreenToken>),
}

impl GreenElement {
    pub(crate) fn len(&self) -> TextSize {
        match self {
            GreenElement::Node(node) => node.len,
            GreenElement::Token(token) => token.len,
        }
    }

    pub(crate) fn lookahead(&self) -> u32 {
        match self {
            GreenElement::Node(node) => node.lookahead,
            GreenElement::Token(token) => token.lookahead,
        }
    }

    pub(crate) fn error_cost(&self) -> u32 {
        match self {
            GreenElement::Node(node) => node.error_cost,
            GreenElement::Token(token) => token.error_cost(),
        }
    }

    pub(crate) fn error_count(&self) -> u32 {
        match self {
            GreenElement::Node(node) => node.error_count,
            GreenElement::Token(token) => token.error_count(),
        }
    }

    pub(crate) fn has_external(&self) -> bool {
        match self {
            GreenElement::Node(node) => node.has_external,
            GreenElement::Token(token) => token.is_external,
        }
    }

    pub(crate) fn leading_mode(&self) -> Option<LexModeId> {
        match self {
            GreenElement::Node(node) => node.leading_mode,
            GreenElement::Token(token) => Some(token.mode),
        }
    }

    pub(crate) fn dynamic_precedence(&self) -> i32 {
        match self {
            GreenElement::Node(node) => node.dynamic_precedence,
            GreenElement::Token(_) => 0,
        }
    }

    pub(crate) fn symbol(&self) -> Symbol {
        match self {
            GreenElement::Node(node) => node.symbol,
            GreenElement::Token(token) => token.symbol,
        }
    }

    pub(crate) fn is_extra(&self) -> bool {
        match self {
            GreenElement::Node(node) => node.is_extra_wrapper,
            GreenElement::Token(token) => token.is_extra,
        }
    }

    /// An element recovery produced itself: an `ERROR` node, an unexpected
    /// token, or a synthesized missing token. These price themselves.
    pub(crate) fn is_recovery_artifact(&self) -> bool {
        match self {
            GreenElement::Node(node) => node.is_error,
            GreenElement::Token(token) => token.is_error || token.is_missing,
        }
    }

    /// Stable address of the shared allocation, used for identity checks.
    pub(crate) fn ptr_id(&self) -> usize {
        match self {
            GreenElement::Node(node) => Arc::as_ptr(node) as usize,
            GreenElement::Token(token) => Arc::as_ptr(token) as usize,
        }
    }

    pub(crate) fn ptr_eq(&self, other: &GreenElement) -> bool {
        match (self, other) {
            (GreenElement::Node(a), GreenElement::Node(b)) => Arc::ptr_eq(a, b),
            (GreenElement::Token(a), GreenElement::Token(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// An interior node. Aggregates are computed once at construction and never
/// change; all sharing is by `Arc`.
#[derive(Debug)]
pub(crate) struct GreenNodeData {
    pub(crate) symbol: Symbol,
    pub(crate) production: Option<ProductionId>,
    pub(crate) len: TextSize,
    /// Bytes examined beyond this node's end while parsing it.
    pub(crate) lookahead: u32,
    pub(crate) error_cost: u32,
    pub(crate) error_count: u32,
    pub(crate) dynamic_precedence: i32,
    pub(crate) has_external: bool,
    /// Lex mode of the first token in this subtree, if any.
    pub(crate) leading_mode: Option<LexModeId>,
    /// Recovery wrapper (`ERROR`) node.
    pub(crate) is_error: bool,
    /// Error nodes attached where extras go are carried like extras by the
    /// stack; real extras are tokens, so this is set only on such wrappers.
    pub(crate) is_extra_wrapper: bool,
    pub(crate) children: Box<[GreenChild]>,
}

impl GreenNodeData {
    /// Build a node bottom-up from ordered children. Offsets, length,
    /// lookahead, error aggregates and the leading lex mode are derived
    /// here.
    pub(crate) fn new(
        symbol: Symbol,
        production: Option<ProductionId>,
        production_precedence: i32,
        is_error: bool,
        children: Vec<(Option<FieldId>, GreenElement)>,
    ) -> Arc<GreenNodeData> {
        Arc::new(GreenNodeData::build(
            symbol,
            production,
            production_precedence,
            is_error,
            children,
        ))
    }

    /// An `ERROR` wrapper. `in_extra_position` marks wrappers that sit
    /// between grammar symbols the way trivia does.
    pub(crate) fn error(
        children: Vec<(Option<FieldId>, GreenElement)>,
        in_extra_position: bool,
    ) -> Arc<GreenNodeData> {
        let mut data = GreenNodeData::build(Symbol::ERROR, None, 0, true, children);
        data.is_extra_wrapper = in_extra_position;
        Arc::new(data)
    }

    fn build(
        symbol: Symbol,
        production: Option<ProductionId>,
        production_precedence: i32,
        is_error: bool,
        children: Vec<(Option<FieldId>, GreenElement)>,
    ) -> GreenNodeData {
        let mut offset = TextSize::new(0);
        let mut lookahead_end = 0u64;
        let mut error_cost = 0u32;
        let mut error_count = 0u32;
        let mut dynamic_precedence = production_precedence;
        let mut has_external = false;
        let mut leading_mode = None;

        let mut built = Vec::with_capacity(children.len());
        for (field, element) in children {
            let end = offset + element.len();
            let seen = u32::from(end) as u64 + element.lookahead() as u64;
            lookahead_end = lookahead_end.max(seen);
            error_cost = error_cost.saturating_add(element.error_cost());
            error_count += element.error_count();
            dynamic_precedence += element.dynamic_precedence();
            has_external |= element.has_external();
            if leading_mode.is_none() {
                leading_mode = element.leading_mode();
            }
            built.push(GreenChild {
                rel_offset: offset,
                field,
                element,
            });
            offset = end;
        }

        if is_error {
            let skipped = built
                .iter()
                .filter(|child| {
                    !child.element.is_extra() && !child.element.is_recovery_artifact()
                })
                .count() as u32;
            error_cost = error_cost
                .saturating_add(ERROR_COST_PER_RECOVERY + u32::from(offset))
                .saturating_add(ERROR_COST_PER_SKIPPED_TREE.saturating_mul(skipped));
            error_count += 1;
        }

        let lookahead = lookahead_end.saturating_sub(u32::from(offset) as u64) as u32;
        GreenNodeData {
            symbol,
            production,
            len: offset,
            lookahead,
            error_cost,
            error_count,
            dynamic_precedence,
            has_external,
            leading_mode,
            is_error,
            is_extra_wrapper: false,
            children: built.into_boxed_slice(),
        }
    }
}

//! Parse-stack versions.
//!
//! The engine runs a bounded GLR scheme: a conflicted action cell forks the
//! stack into versions that advance independently; versions landing on the
//! same state at the same position are condensed down to the best one, and
//! the population is pruned to the table's `max_versions`. "Best" is lowest
//! accumulated error cost, then highest summed dynamic precedence, then
//! earliest creation.
//!
//! Each entry pairs a parse state with the subtree that carried the stack
//! into it. Extras (and error wrappers attached like extras) are pushed
//! without changing state and are swept into whichever reduction later
//! spans them.

use std::sync::Arc;

use crate::language::{Language, ProductionId, StateId, Symbol};
use crate::lexer::Token;
use crate::tree::{GreenElement, GreenNodeData, GreenToken};

/// A lexed token in green form, ready to sit on the stack.
pub(crate) fn token_element(token: &Token) -> GreenElement {
    GreenElement::Token(Arc::new(GreenToken {
        symbol: token.symbol,
        len: token.len,
        lookahead: token.lookahead,
        mode: token.mode,
        is_extra: token.is_extra,
        is_external: token.is_external,
        is_missing: token.is_missing,
        is_error: token.is_error,
    }))
}

/// One stack slot: the subtree plus the state reached after consuming it.
#[derive(Debug, Clone)]
pub(crate) struct StackEntry {
    pub(crate) state: StateId,
    pub(crate) element: GreenElement,
    /// Extras and error wrappers: present on the stack but not grammar
    /// children of any pending production.
    pub(crate) is_extra: bool,
}

/// One live parse stack.
#[derive(Debug, Clone)]
pub(crate) struct StackVersion {
    pub(crate) id: u32,
    pub(crate) entries: Vec<StackEntry>,
    /// Byte position of the next token.
    pub(crate) position: usize,
    pub(crate) error_cost: u32,
    pub(crate) dynamic_precedence: i32,
    /// Byte position of the last missing-token repair, to keep insertion
    /// from looping at one spot.
    pub(crate) last_insert_pos: Option<usize>,
    /// Last zero-width external token shifted, by position and symbol.
    pub(crate) last_zero_external: Option<(usize, Symbol)>,
    /// Recovery ran out of input and stack; the version's entries are the
    /// final partial result.
    pub(crate) bailed: bool,
}

impl StackVersion {
    pub(crate) fn new(id: u32) -> StackVersion {
        StackVersion {
            id,
            entries: Vec::new(),
            position: 0,
            error_cost: 0,
            dynamic_precedence: 0,
            last_insert_pos: None,
            last_zero_external: None,
            bailed: false,
        }
    }

    pub(crate) fn fork(&self, id: u32) -> StackVersion {
        let mut version = self.clone();
        version.id = id;
        version
    }

    /// Current parse state: the top entry's, or the start state.
    pub(crate) fn state(&self) -> StateId {
        self.entries
            .last()
            .map(|entry| entry.state)
            .unwrap_or(StateId::START)
    }

    /// Ordering key: smaller is better.
    pub(crate) fn quality(&self) -> (u32, i64, u32) {
        (
            self.error_cost,
            -(self.dynamic_precedence as i64),
            self.id,
        )
    }

    pub(crate) fn push(&mut self, state: StateId, element: GreenElement, is_extra: bool) {
        self.error_cost = self.error_cost.saturating_add(element.error_cost());
        self.dynamic_precedence += element.dynamic_precedence();
        self.entries.push(StackEntry {
            state,
            element,
            is_extra,
        });
    }

    /// Push an extra without changing state.
    pub(crate) fn push_extra(&mut self, element: GreenElement) {
        self.push(self.state(), element, true);
    }

    pub(crate) fn pop(&mut self) -> Option<StackEntry> {
        let entry = self.entries.pop()?;
        self.error_cost = self.error_cost.saturating_sub(entry.element.error_cost());
        self.dynamic_precedence -= entry.element.dynamic_precedence();
        Some(entry)
    }

    /// Apply one reduction: pop the production's children (holding trailing
    /// extras aside), build the node, and push it on the goto target.
    /// Returns `false`, with the stack unchanged, when the table has no
    /// goto for the exposed state; the caller treats that version as dead.
    pub(crate) fn reduce(&mut self, language: &Language, id: ProductionId) -> bool {
        let production = language.production(id);
        let arity = production.arity();

        let mut trailing = Vec::new();
        if arity > 0 {
            while self.entries.last().is_some_and(|entry| entry.is_extra) {
                // pop() cannot fail here; the loop condition saw an entry.
                if let Some(entry) = self.pop() {
                    trailing.push(entry);
                }
            }
        }

        let mut popped = Vec::new();
        let mut remaining = arity;
        while remaining > 0 {
            let Some(entry) = self.pop() else {
                self.restore(popped, trailing);
                return false;
            };
            if !entry.is_extra {
                remaining -= 1;
            }
            popped.push(entry);
        }

        let Some(target) = language.goto(self.state(), production.lhs) else {
            self.restore(popped, trailing);
            return false;
        };

        let mut children = Vec::with_capacity(popped.len());
        let mut grammar_index = 0usize;
        for entry in popped.iter().rev() {
            let field = if entry.is_extra {
                None
            } else {
                let field = production.field_at(grammar_index);
                grammar_index += 1;
                field
            };
            children.push((field, entry.element.clone()));
        }

        let node = GreenNodeData::new(
            production.lhs,
            Some(id),
            production.dynamic_precedence,
            false,
            children,
        );
        self.push(target, GreenElement::Node(node), false);
        for entry in trailing.into_iter().rev() {
            self.push(target, entry.element, true);
        }
        true
    }

    fn restore(&mut self, popped: Vec<StackEntry>, trailing: Vec<StackEntry>) {
        for entry in popped.into_iter().rev() {
            self.push(entry.state, entry.element, entry.is_extra);
        }
        for entry in trailing.into_iter().rev() {
            self.push(entry.state, entry.element, entry.is_extra);
        }
    }
}

/// Collapse a finished stack into the final root node. The root-symbol
/// subtree (when present) donates its children so that surrounding extras
/// and error wrappers fold into the root rather than floating beside it.
pub(crate) fn fold_root(language: &Language, version: &StackVersion) -> Arc<GreenNodeData> {
    let root_symbol = language.root_symbol();
    let mut production = None;
    let mut precedence = 0;
    let mut spliced = false;
    let mut children = Vec::with_capacity(version.entries.len());

    for entry in &version.entries {
        match &entry.element {
            GreenElement::Node(node) if !spliced && !entry.is_extra && node.symbol == root_symbol => {
                spliced = true;
                production = node.production;
                for child in node.children.iter() {
                    children.push((child.field, child.element.clone()));
                }
            }
            element => children.push((None, element.clone())),
        }
    }

    if let Some(id) = production {
        precedence = language.production(id).dynamic_precedence;
    }
    GreenNodeData::new(root_symbol, production, precedence, false, children)
}

//! Error recovery.
//!
//! When a stack version has no action for the current lookahead, it is
//! replaced by repair candidates that the GLR machinery then races on cost:
//!
//! - **deletion**: skip the offending token inside an `ERROR` wrapper and
//!   carry on in the same state;
//! - **insertion**: synthesize a zero-width missing token for a terminal
//!   the state could shift, when that repair makes the lookahead actionable
//!   one step later;
//! - **resynchronization**: relex under the all-tokens recovery mode,
//!   sweeping input into an `ERROR` wrapper until a recovery symbol or an
//!   actionable token appears. At end of input this pops the stack down to
//!   a state that can act on EOF, folding the popped subtrees into the
//!   wrapper, and marks the version bailed when no such state exists.
//!
//! Every candidate either advances the position, shrinks the stack, or
//! records an insertion position that blocks repeating itself, so recovery
//! cannot revisit the same configuration.

use text_size::TextSize;
use tracing::debug;

use crate::language::{FieldId, Language, StateId, Symbol};
use crate::lexer::{Lexer, Token};
use crate::tree::{GreenElement, GreenNodeData, GreenToken};

use super::stack::{token_element, StackVersion};

/// Replacement versions for one stuck version, in deterministic order.
pub(crate) fn recover(
    language: &Language,
    lexer: &mut Lexer<'_, '_>,
    version: &StackVersion,
    token: &Token,
    next_id: &mut u32,
) -> Vec<StackVersion> {
    let mut fresh = || {
        let id = *next_id;
        *next_id += 1;
        id
    };
    let mut candidates = Vec::new();

    if !token.is_eof() && token.len > TextSize::new(0) {
        candidates.push(delete_token(version, token, fresh()));
    }

    if !token.is_eof() && !token.is_error && version.last_insert_pos != Some(version.position) {
        for (symbol, target) in language.shiftable_terminals(version.state()) {
            if symbol == Symbol::EOF {
                continue;
            }
            if language.actions(target, token.symbol).is_empty() {
                continue;
            }
            candidates.push(insert_missing(language, version, symbol, target, fresh()));
        }
    }

    if let Some(resynced) = resynchronize(language, lexer, version, fresh()) {
        candidates.push(resynced);
    }

    debug!(
        version = version.id,
        position = version.position,
        state = version.state().raw(),
        lookahead = language.symbol_name(token.symbol),
        candidates = candidates.len(),
        "recovering"
    );
    candidates
}

/// Skip the lookahead token, keeping its text inside an `ERROR` wrapper.
fn delete_token(version: &StackVersion, token: &Token, id: u32) -> StackVersion {
    let mut repaired = version.fork(id);
    let wrapper = GreenNodeData::error(vec![(None, token_element(token))], true);
    repaired.push_extra(GreenElement::Node(wrapper));
    repaired.position += usize::from(token.len);
    repaired
}

/// Shift a synthesized zero-width missing token for `symbol`.
fn insert_missing(
    language: &Language,
    version: &StackVersion,
    symbol: Symbol,
    target: StateId,
    id: u32,
) -> StackVersion {
    let mut repaired = version.fork(id);
    let missing = GreenToken {
        symbol,
        len: TextSize::new(0),
        lookahead: 0,
        mode: language.lex_mode(repaired.state()),
        is_extra: false,
        is_external: language.is_external(symbol),
        is_missing: true,
        is_error: false,
    };
    repaired.push(
        target,
        GreenElement::Token(std::sync::Arc::new(missing)),
        false,
    );
    repaired.last_insert_pos = Some(repaired.position);
    repaired
}

/// Relex forward in recovery mode until the parse can plausibly restart.
/// Returns `None` when stopping immediately would reproduce the parent
/// version unchanged.
fn resynchronize(
    language: &Language,
    lexer: &mut Lexer<'_, '_>,
    version: &StackVersion,
    id: u32,
) -> Option<StackVersion> {
    let mode = language.recovery_lex_mode();
    let mut repaired = version.fork(id);
    let mut skipped: Vec<(Option<FieldId>, GreenElement)> = Vec::new();
    let mut pos = repaired.position;

    loop {
        let mut token = match lexer.next_token(pos, mode) {
            Some(token) => token,
            None => lexer.error_token(pos, mode),
        };
        // A zero-width non-EOF token would stall the sweep. The error token
        // is also zero-width only when the input is exhausted.
        if !token.is_eof() && token.len == TextSize::new(0) {
            token = lexer.error_token(pos, mode);
            if token.len == TextSize::new(0) {
                token = Token::eof(mode);
            }
        }

        if token.is_eof() {
            let mut popped = Vec::new();
            while language.actions(repaired.state(), Symbol::EOF).is_empty() {
                let Some(entry) = repaired.pop() else { break };
                popped.push(entry.element);
            }
            popped.reverse();
            let mut children: Vec<(Option<FieldId>, GreenElement)> =
                popped.into_iter().map(|element| (None, element)).collect();
            children.append(&mut skipped);

            if language.actions(repaired.state(), Symbol::EOF).is_empty() {
                repaired.bailed = true;
            }
            if !children.is_empty() {
                repaired.push_extra(GreenElement::Node(GreenNodeData::error(children, true)));
            }
            repaired.position = pos;
            return Some(repaired);
        }

        let stops_here = language.is_recovery_symbol(token.symbol)
            || !language.actions(repaired.state(), token.symbol).is_empty();
        if stops_here {
            if skipped.is_empty() {
                return None;
            }
            repaired.push_extra(GreenElement::Node(GreenNodeData::error(skipped, true)));
            repaired.position = pos;
            return Some(repaired);
        }

        pos += usize::from(token.len);
        skipped.push((None, token_element(&token)));
    }
}

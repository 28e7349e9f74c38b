//! Maximal-munch lexing over the language's token DFA.
//!
//! The lexer is driven by the parser: each call scans one token at a given
//! byte position under the valid-token set (lex mode) of the current parse
//! state. An installed [`ExternalScanner`] is consulted before the DFA so
//! context-sensitive tokens can claim the position first.
//!
//! The DFA walk follows the dense-DFA protocol: anchored start, one
//! transition per byte, an end-of-input transition at the end, and match
//! states observed one byte late. Among every pattern that matches, the
//! longest valid one wins; equal lengths fall back to lexical precedence,
//! then declaration order.

use regex_automata::dfa::{dense, Automaton};
use regex_automata::{Anchored, Input as DfaInput};
use text_size::TextSize;

use crate::language::{Language, LexModeId, Symbol, TokenSet};

mod input;

pub(crate) use input::Input;

// ============================================================================
// TOKENS
// ============================================================================

/// One lexed terminal. Carries everything incremental reuse needs to decide
/// later whether the same token would be produced again: its length, how
/// many bytes past its end the lexer examined, and the mode it was scanned
/// in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) symbol: Symbol,
    pub(crate) len: TextSize,
    /// Bytes examined beyond `len` (the end-of-input sentinel counts as
    /// one). Zero only for synthesized missing tokens.
    pub(crate) lookahead: u32,
    pub(crate) mode: LexModeId,
    pub(crate) is_extra: bool,
    pub(crate) is_external: bool,
    pub(crate) is_missing: bool,
    pub(crate) is_error: bool,
}

impl Token {
    pub(crate) fn eof(mode: LexModeId) -> Token {
        Token {
            symbol: Symbol::EOF,
            len: TextSize::new(0),
            lookahead: 0,
            mode,
            is_extra: false,
            is_external: false,
            is_missing: false,
            is_error: false,
        }
    }

    /// A zero-width token synthesized by error recovery.
    pub(crate) fn missing(symbol: Symbol, mode: LexModeId) -> Token {
        Token {
            symbol,
            len: TextSize::new(0),
            lookahead: 0,
            mode,
            is_extra: false,
            is_external: false,
            is_missing: true,
            is_error: false,
        }
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.symbol == Symbol::EOF && !self.is_missing
    }
}

// ============================================================================
// EXTERNAL SCANNERS
// ============================================================================

/// A byte cursor handed to external scanners. Consumed bytes become the
/// token's text.
pub struct LexCursor<'c, 'a> {
    input: &'c mut Input<'a>,
    start: usize,
    consumed: usize,
}

impl LexCursor<'_, '_> {
    /// The byte the scanner is looking at, or `None` at end of input.
    pub fn peek(&mut self) -> Option<u8> {
        self.input.byte(self.start + self.consumed)
    }

    /// Consume the current byte.
    pub fn advance(&mut self) {
        if self.input.byte(self.start + self.consumed).is_some() {
            self.consumed += 1;
        }
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Absolute byte offset of the token start.
    pub fn start_offset(&self) -> usize {
        self.start
    }
}

/// Context-sensitive lexing capability, injected per grammar.
///
/// Implementations keep whatever state their tokens need (nesting depth,
/// delimiter stacks); the engine treats them as opaque. `scan` may consume
/// bytes through the cursor and return the recognized symbol, which must be
/// one of `valid`. Zero-width results are allowed for tokens that mark
/// positions rather than text.
pub trait ExternalScanner: Send {
    /// Called once before each parse; clear any per-document state.
    fn reset(&mut self);

    fn scan(&mut self, valid: &TokenSet, cursor: &mut LexCursor<'_, '_>) -> Option<Symbol>;
}

// ============================================================================
// LEXER
// ============================================================================

pub(crate) struct Lexer<'a, 's> {
    language: Language,
    input: Input<'a>,
    scanner: Option<&'s mut (dyn ExternalScanner + 'static)>,
}

impl<'a, 's> Lexer<'a, 's> {
    pub(crate) fn new(
        language: Language,
        input: Input<'a>,
        scanner: Option<&'s mut (dyn ExternalScanner + 'static)>,
    ) -> Self {
        Lexer {
            language,
            input,
            scanner,
        }
    }

    /// Scan one token at `pos` under `mode`. Returns `None` when no valid
    /// terminal (and no external scanner) matches; the caller then widens
    /// the mode or synthesizes an error token.
    pub(crate) fn next_token(&mut self, pos: usize, mode: LexModeId) -> Option<Token> {
        if let Some(token) = self.scan_external(pos, mode) {
            return Some(token);
        }
        if self.input.byte(pos).is_none() {
            return Some(Token::eof(mode));
        }
        let (symbol, len, lookahead) =
            Self::dfa_scan(&self.language, &mut self.input, pos, mode)?;
        tracing::trace!(
            pos,
            symbol = self.language.symbol_name(symbol),
            len,
            lookahead,
            "lexed token"
        );
        Some(Token {
            symbol,
            len: TextSize::new(len as u32),
            lookahead,
            mode,
            is_extra: self.language.is_extra(symbol),
            is_external: false,
            is_missing: false,
            is_error: false,
        })
    }

    /// Synthesize an error token covering one UTF-8 sequence (at least one
    /// byte), for positions nothing claims.
    pub(crate) fn error_token(&mut self, pos: usize, mode: LexModeId) -> Token {
        let mut len = 0usize;
        if let Some(lead) = self.input.byte(pos) {
            len = 1;
            let width = match lead {
                0xF0.. => 4,
                0xE0.. => 3,
                0xC0.. => 2,
                _ => 1,
            };
            while len < width && self.input.byte(pos + len).is_some_and(is_continuation) {
                len += 1;
            }
        }
        tracing::trace!(pos, len, "synthesized error token");
        Token {
            symbol: Symbol::ERROR,
            len: TextSize::new(len as u32),
            lookahead: 1,
            mode,
            is_extra: false,
            is_external: false,
            is_missing: false,
            is_error: true,
        }
    }

    /// Total input length. Forces any remaining chunks.
    pub(crate) fn input_len(&mut self) -> usize {
        self.input.len()
    }

    fn scan_external(&mut self, pos: usize, mode: LexModeId) -> Option<Token> {
        let scanner = self.scanner.as_deref_mut()?;
        let valid = self.language.mode_externals(mode);
        if valid.is_empty() {
            return None;
        }
        let mut cursor = LexCursor {
            input: &mut self.input,
            start: pos,
            consumed: 0,
        };
        let symbol = scanner.scan(valid, &mut cursor)?;
        let len = cursor.consumed;
        if !valid.contains(symbol) {
            tracing::warn!(
                symbol = symbol.raw(),
                "external scanner produced a token that is not valid here; ignoring"
            );
            return None;
        }
        tracing::trace!(
            pos,
            symbol = self.language.symbol_name(symbol),
            len,
            "external token"
        );
        Some(Token {
            symbol,
            len: TextSize::new(len as u32),
            lookahead: 1,
            mode,
            is_extra: self.language.is_extra(symbol),
            is_external: true,
            is_missing: false,
            is_error: false,
        })
    }

    /// Walk the token DFA from `pos`, returning the best (symbol, length,
    /// lookahead) among valid matches.
    fn dfa_scan(
        language: &Language,
        input: &mut Input<'_>,
        pos: usize,
        mode: LexModeId,
    ) -> Option<(Symbol, usize, u32)> {
        let dfa = language.dfa();
        let valid = language.mode_tokens(mode);
        let Ok(start) = dfa.start_state_forward(&DfaInput::new(b"").anchored(Anchored::Yes))
        else {
            return None;
        };

        let mut sid = start;
        let mut best: Option<(usize, Symbol)> = None;
        let mut fed = 0usize;
        // Matches surface one transition late: observing a match state after
        // feeding byte k means a match of length k ended just before it.
        let examined = loop {
            match input.byte(pos + fed) {
                None => {
                    let eoi = dfa.next_eoi_state(sid);
                    if dfa.is_match_state(eoi) {
                        consider_matches(language, dfa, eoi, fed, valid, &mut best);
                    }
                    break fed + 1;
                }
                Some(byte) => {
                    let next = dfa.next_state(sid, byte);
                    fed += 1;
                    if dfa.is_special_state(next) {
                        if dfa.is_match_state(next) {
                            consider_matches(language, dfa, next, fed - 1, valid, &mut best);
                        } else if dfa.is_dead_state(next) || dfa.is_quit_state(next) {
                            break fed;
                        }
                    }
                    sid = next;
                }
            }
        };

        let (len, symbol) = best?;
        Some((symbol, len, (examined - len) as u32))
    }
}

fn consider_matches(
    language: &Language,
    dfa: &dense::DFA<Vec<u32>>,
    sid: regex_automata::util::primitives::StateID,
    len: usize,
    valid: &TokenSet,
    best: &mut Option<(usize, Symbol)>,
) {
    if len == 0 {
        return;
    }
    for index in 0..dfa.match_len(sid) {
        let symbol = language.pattern_symbol(dfa.match_pattern(sid, index));
        if !valid.contains(symbol) {
            continue;
        }
        let wins = match *best {
            None => true,
            Some((best_len, best_symbol)) => {
                len > best_len
                    || (len == best_len && beats(language, symbol, best_symbol))
            }
        };
        if wins {
            *best = Some((len, symbol));
        }
    }
}

/// Equal-length tie-break: higher lexical precedence, then declaration
/// order.
fn beats(language: &Language, challenger: Symbol, incumbent: Symbol) -> bool {
    let (cp, ip) = (
        language.lex_precedence(challenger),
        language.lex_precedence(incumbent),
    );
    cp > ip || (cp == ip && challenger.raw() < incumbent.raw())
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

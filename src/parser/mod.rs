//! Table-driven GLR parsing.
//!
//! A [`Parser`] pairs a [`Language`]'s static tables with the runtime
//! machinery that turns input bytes into a [`Tree`]:
//!
//! ```text
//! Input bytes
//!     ↓
//! Lexer (per-state modes, external scanner) → Tokens
//!     ↓
//! Stack versions (shift / reduce / fork / condense / prune)
//!     ↓                                   ↑
//! Error recovery (delete / insert / resync)
//!     ↓
//! Accept → fold into the root green node → Tree
//! ```
//!
//! One token is processed per scheduling step, always for the version
//! furthest behind in the input; conflicted table cells fork versions and
//! the population is condensed and pruned after every step. When a previous
//! tree is supplied, a reuse cursor runs ahead of the single live version
//! and splices unchanged subtrees in whole, skipping their bytes entirely.

mod recovery;
mod reuse;
mod stack;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use text_size::TextSize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::language::{Language, LanguageError, LexModeId, ParseAction, StateId};
use crate::lexer::{ExternalScanner, Input, Lexer, Token};
use crate::tree::{GreenElement, GreenNodeData, Tree};

use recovery::recover;
use reuse::{first_leaf, ReuseCursor};
use stack::{fold_root, token_element, StackVersion};

/// Reduce chains driven by a reused node's first leaf are cut off here;
/// anything longer is a cyclic unit-production chain.
const MAX_REUSE_REDUCTIONS: u32 = 256;

// ============================================================================
// ERRORS
// ============================================================================

/// Hard parse failures. Malformed *input* is never one of these; it yields
/// a tree with error nodes.
#[derive(Debug, Error)]
pub enum ParseError {
    /// `parse` was called before `set_language`.
    #[error("no language set on the parser")]
    NoLanguage,

    /// The previous tree handed in for incremental parsing was produced by
    /// a different language.
    #[error("previous tree was parsed with language `{previous}`, parser has `{current}`")]
    LanguageMismatch { previous: String, current: String },

    /// The cancellation token flipped mid-parse.
    #[error("parse cancelled")]
    Cancelled,

    /// The caller's operation budget ran out.
    #[error("parse exceeded the operation limit of {limit}")]
    OperationLimit { limit: u64 },
}

// ============================================================================
// THE PARSER
// ============================================================================

/// A reusable parsing session: language, optional external scanner, and the
/// caller's interruption knobs. One parse at a time.
#[derive(Default)]
pub struct Parser {
    language: Option<Language>,
    scanner: Option<Box<dyn ExternalScanner>>,
    cancellation: Option<CancellationToken>,
    operation_limit: Option<u64>,
}

impl Parser {
    pub fn new() -> Parser {
        Parser::default()
    }

    /// Install the grammar to parse with. Rejects tables whose ABI version
    /// falls outside this build's supported window.
    pub fn set_language(&mut self, language: &Language) -> Result<(), LanguageError> {
        let version = language.abi_version();
        if !(crate::language::MIN_COMPATIBLE_LANGUAGE_VERSION..=crate::language::LANGUAGE_VERSION)
            .contains(&version)
        {
            return Err(LanguageError::version(language.name().to_string(), version));
        }
        self.language = Some(language.clone());
        Ok(())
    }

    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    /// Install or remove the external scanner consulted before the DFA at
    /// every lex. The scanner is reset at the start of each parse.
    pub fn set_external_scanner(&mut self, scanner: Option<Box<dyn ExternalScanner>>) {
        self.scanner = scanner;
    }

    /// Token checked between lexer invocations; flipping it makes the
    /// running parse return [`ParseError::Cancelled`].
    pub fn set_cancellation_token(&mut self, token: Option<CancellationToken>) {
        self.cancellation = token;
    }

    /// Bound the number of parse operations (shifts, reductions, recovery
    /// rounds) before the parse gives up with
    /// [`ParseError::OperationLimit`]. `None` removes the bound.
    pub fn set_operation_limit(&mut self, limit: Option<u64>) {
        self.operation_limit = limit;
    }

    pub fn operation_limit(&self) -> Option<u64> {
        self.operation_limit
    }

    /// Parse in-memory bytes, reusing unchanged subtrees of `old_tree` when
    /// one is given (it must carry its edits, see [`Tree::edit`]).
    pub fn parse(
        &mut self,
        source: impl AsRef<[u8]>,
        old_tree: Option<&Tree>,
    ) -> Result<Tree, ParseError> {
        self.parse_input(Input::slice(source.as_ref()), old_tree)
    }

    /// Parse text pulled lazily through `read`, which returns the bytes at
    /// a requested offset (empty when past the end). Reused regions are
    /// never read.
    pub fn parse_with<F>(&mut self, read: F, old_tree: Option<&Tree>) -> Result<Tree, ParseError>
    where
        F: FnMut(usize) -> Vec<u8>,
    {
        self.parse_input(Input::chunks(Box::new(read)), old_tree)
    }

    fn parse_input(&mut self, input: Input<'_>, old_tree: Option<&Tree>) -> Result<Tree, ParseError> {
        let Parser {
            language,
            scanner,
            cancellation,
            operation_limit,
        } = self;
        let language = language.clone().ok_or(ParseError::NoLanguage)?;
        if let Some(old) = old_tree {
            if *old.language() != language {
                return Err(ParseError::LanguageMismatch {
                    previous: old.language().name().to_string(),
                    current: language.name().to_string(),
                });
            }
        }
        if let Some(scanner) = scanner.as_deref_mut() {
            scanner.reset();
        }

        let reuse = old_tree.map(|old| ReuseCursor::new(old.root_green(), old.edits()));
        debug!(
            language = language.name(),
            incremental = reuse.is_some(),
            "parse started"
        );

        let run = ParseRun {
            lexer: Lexer::new(language.clone(), input, scanner.as_deref_mut()),
            language,
            cancellation: cancellation.clone(),
            operation_limit: *operation_limit,
            operations: 0,
            versions: vec![StackVersion::new(0)],
            next_id: 1,
            token_cache: FxHashMap::default(),
            reuse,
            finished: Vec::new(),
        };
        let (language, root) = run.run()?;
        debug!(
            len = u32::from(root.len),
            errors = root.error_count,
            "parse finished"
        );
        Ok(Tree::new(language, root))
    }
}

// ============================================================================
// ONE PARSE
// ============================================================================

/// A completed stack version, waiting for the others to finish or die.
struct FinishedParse {
    root: Arc<GreenNodeData>,
    error_cost: u32,
    dynamic_precedence: i32,
    id: u32,
}

struct ParseRun<'a, 's> {
    language: Language,
    lexer: Lexer<'a, 's>,
    cancellation: Option<CancellationToken>,
    operation_limit: Option<u64>,
    operations: u64,
    versions: Vec<StackVersion>,
    next_id: u32,
    /// Tokens already lexed this parse, by position and mode.
    token_cache: FxHashMap<(usize, LexModeId), Token>,
    reuse: Option<ReuseCursor>,
    finished: Vec<FinishedParse>,
}

impl ParseRun<'_, '_> {
    fn run(mut self) -> Result<(Language, Arc<GreenNodeData>), ParseError> {
        while !self.versions.is_empty() {
            self.check_budget()?;
            let index = self.next_version_index();
            self.advance(index);
            self.condense();
        }

        // Recovery guarantees at least one version accepts or bails.
        let best = self
            .finished
            .iter()
            .min_by_key(|f| (f.error_cost, -(f.dynamic_precedence as i64), f.id))
            .map(|f| Arc::clone(&f.root))
            .unwrap_or_else(|| {
                GreenNodeData::new(self.language.root_symbol(), None, 0, false, Vec::new())
            });
        Ok((self.language, best))
    }

    fn check_budget(&self) -> Result<(), ParseError> {
        if let Some(token) = &self.cancellation {
            if token.is_cancelled() {
                return Err(ParseError::Cancelled);
            }
        }
        if let Some(limit) = self.operation_limit {
            if self.operations > limit {
                return Err(ParseError::OperationLimit { limit });
            }
        }
        Ok(())
    }

    fn fresh_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The version furthest behind in the input; ties go to the best
    /// scoring one.
    fn next_version_index(&self) -> usize {
        self.versions
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| (v.position, v.quality()))
            .map(|(index, _)| index)
            .unwrap_or(0)
    }

    /// One scheduling step for one version: reuse what it can, then apply
    /// the table actions for one lexed token (or recover when there are
    /// none).
    fn advance(&mut self, index: usize) {
        let mut version = self.versions.remove(index);
        self.operations += 1;

        if version.bailed {
            self.finish(version);
            return;
        }

        if self.versions.is_empty() && self.finished.is_empty() {
            self.try_reuse(&mut version);
        }

        let state = version.state();
        let mode = self.language.lex_mode(state);
        let token = self.token_at(version.position, mode);

        // A zero-width external token may be shifted once per position;
        // seeing the same one again would loop forever.
        let repeated_zero_external = token.is_external
            && token.len == TextSize::new(0)
            && version.last_zero_external == Some((version.position, token.symbol));

        let actions = self.language.actions(state, token.symbol).to_vec();
        if actions.is_empty() || repeated_zero_external {
            if token.is_extra && !repeated_zero_external {
                if token.is_external && token.len == TextSize::new(0) {
                    version.last_zero_external = Some((version.position, token.symbol));
                }
                version.position += usize::from(token.len);
                version.push_extra(token_element(&token));
                self.versions.push(version);
                return;
            }
            // Nothing lexed under this state's mode. Relex with every
            // terminal valid so recovery sees the token the input actually
            // holds; only then can it judge which repairs make it shiftable.
            let token = if token.is_error {
                self.token_at(version.position, self.language.recovery_lex_mode())
            } else {
                token
            };
            self.recover(version, &token);
            return;
        }

        let mut pending = Vec::with_capacity(actions.len());
        pending.push(version);
        if actions.len() > 1 {
            let snapshot = pending[0].clone();
            for _ in 1..actions.len() {
                let id = self.fresh_id();
                pending.push(snapshot.fork(id));
            }
        }
        for (v, action) in pending.into_iter().zip(actions.iter()) {
            self.apply(v, *action, &token);
            self.operations += 1;
        }
    }

    fn apply(&mut self, mut version: StackVersion, action: ParseAction, token: &Token) {
        match action {
            ParseAction::Shift(target) => {
                self.shift(version, target, token);
            }
            ParseAction::Reduce(production) => {
                if version.reduce(&self.language, production) {
                    self.versions.push(version);
                } else {
                    self.drop_dead(version);
                }
            }
            ParseAction::Accept => self.finish(version),
        }
    }

    fn shift(&mut self, mut version: StackVersion, target: StateId, token: &Token) {
        if token.is_external && token.len == TextSize::new(0) {
            version.last_zero_external = Some((version.position, token.symbol));
        }
        version.position += usize::from(token.len);
        version.push(target, token_element(token), false);
        self.versions.push(version);
    }

    fn recover(&mut self, version: StackVersion, token: &Token) {
        let candidates = recover(
            &self.language,
            &mut self.lexer,
            &version,
            token,
            &mut self.next_id,
        );
        self.operations += candidates.len() as u64;
        if candidates.is_empty() {
            self.drop_dead(version);
            return;
        }
        self.versions.extend(candidates);
    }

    /// A version with no way forward. The last one standing is folded into
    /// a partial result rather than lost.
    fn drop_dead(&mut self, mut version: StackVersion) {
        if self.versions.is_empty() && self.finished.is_empty() {
            version.bailed = true;
            self.finish(version);
        }
    }

    fn finish(&mut self, version: StackVersion) {
        let root = fold_root(&self.language, &version);
        debug!(
            version = version.id,
            error_cost = root.error_cost,
            bailed = version.bailed,
            "version finished"
        );
        self.finished.push(FinishedParse {
            error_cost: root.error_cost,
            dynamic_precedence: version.dynamic_precedence,
            id: version.id,
            root,
        });
    }

    fn token_at(&mut self, position: usize, mode: LexModeId) -> Token {
        if let Some(token) = self.token_cache.get(&(position, mode)) {
            return *token;
        }
        let token = match self.lexer.next_token(position, mode) {
            Some(token) => token,
            None => self.lexer.error_token(position, mode),
        };
        self.token_cache.insert((position, mode), token);
        self.operations += 1;
        token
    }

    fn cursor_descend(&mut self) {
        if let Some(cursor) = self.reuse.as_mut() {
            cursor.descend();
        }
    }

    fn cursor_advance(&mut self) {
        if let Some(cursor) = self.reuse.as_mut() {
            cursor.advance_past();
        }
    }

    /// Splice reusable old subtrees onto the version while they line up
    /// with its position and state.
    fn try_reuse(&mut self, version: &mut StackVersion) {
        let mut reductions = 0u32;
        loop {
            let state = version.state();
            let mode = self.language.lex_mode(state);
            let candidate = match self
                .reuse
                .as_mut()
                .and_then(|cursor| cursor.candidate_at(version.position))
            {
                Some(candidate) => candidate,
                None => return,
            };
            // External tokens depend on scanner state that is not
            // reproducible mid-input.
            if candidate.element.has_external() {
                self.cursor_descend();
                continue;
            }

            match &candidate.element {
                GreenElement::Token(token) => {
                    if token.mode != mode {
                        self.cursor_descend();
                        continue;
                    }
                    let actions = self.language.actions(state, token.symbol).to_vec();
                    if token.is_extra && actions.is_empty() {
                        version.position += usize::from(token.len);
                        version.push_extra(candidate.element.clone());
                        self.cursor_advance();
                        self.operations += 1;
                        continue;
                    }
                    match actions.as_slice() {
                        [ParseAction::Shift(target)] => {
                            version.position += usize::from(token.len);
                            version.push(*target, candidate.element.clone(), false);
                            self.cursor_advance();
                            self.operations += 1;
                        }
                        // Pending reductions or a conflict: let the normal
                        // step handle this token.
                        _ => return,
                    }
                }
                GreenElement::Node(node) => {
                    if node.leading_mode != Some(mode) {
                        self.cursor_descend();
                        continue;
                    }
                    if let Some(target) = self.language.goto(state, node.symbol) {
                        version.position += usize::from(node.len);
                        version.push(target, candidate.element.clone(), false);
                        self.cursor_advance();
                        self.operations += 1;
                        continue;
                    }
                    // Not pushable yet; the node's first token decides
                    // whether a reduction gets it there.
                    let Some(leaf) = first_leaf(&candidate.element) else {
                        self.cursor_descend();
                        continue;
                    };
                    let leaf_symbol = leaf.symbol;
                    let actions = self.language.actions(state, leaf_symbol).to_vec();
                    match actions.as_slice() {
                        [ParseAction::Reduce(production)]
                            if reductions < MAX_REUSE_REDUCTIONS =>
                        {
                            reductions += 1;
                            self.operations += 1;
                            if !version.reduce(&self.language, *production) {
                                return;
                            }
                        }
                        _ => {
                            self.cursor_descend();
                        }
                    }
                }
            }
        }
    }

    /// Merge versions that converged on the same position and state, then
    /// prune the field down to the configured bound. Versions that cannot
    /// beat an already finished parse are dropped too.
    fn condense(&mut self) {
        if let Some(best) = self.finished.iter().map(|f| f.error_cost).min() {
            self.versions.retain(|v| v.error_cost <= best);
        }
        if self.versions.len() <= 1 {
            return;
        }
        self.versions
            .sort_by_key(|v| (v.position, v.state().raw(), v.bailed, v.quality()));
        self.versions
            .dedup_by_key(|v| (v.position, v.state(), v.bailed));
        let max = self.language.max_versions();
        if self.versions.len() > max {
            self.versions.sort_by_key(StackVersion::quality);
            self.versions.truncate(max);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

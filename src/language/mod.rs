//! Grammar tables and their runtime form.
//!
//! A [`Language`] is the validated, immutable handle over a
//! [`LanguageData`] table: symbol metadata, LR actions and gotos, the token
//! DFA compiled from the table's lex patterns, and the deduplicated
//! per-state valid-token sets (lex modes). Bindings construct one
//! `Language` per grammar at startup and share it process-wide; it is
//! cheaply cloneable and safe to use from many threads at once.
//!
//! ```text
//! LanguageData (plain data)
//!     |  try_from_data: validate ids, compile patterns, dedupe modes
//!     v
//! Language (Arc-shared, read-only)
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex_automata::dfa::dense;
use regex_automata::{MatchKind, PatternID};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

mod error;
pub mod tables;

pub use error::LanguageError;
pub use tables::{
    FieldId, GlrConfig, LanguageData, LexModeId, LexPattern, ParseAction, ProductionData,
    ProductionId, RecoveryData, StateData, StateId, Symbol, SymbolInfo, SymbolType, TokenSet,
};

/// Current grammar-table ABI version produced by the generator toolchain.
pub const LANGUAGE_VERSION: u32 = 14;

/// Oldest table ABI version this engine build still accepts.
pub const MIN_COMPATIBLE_LANGUAGE_VERSION: u32 = 13;

// ============================================================================
// RUNTIME TABLES
// ============================================================================

/// One production in runtime form.
#[derive(Debug)]
pub(crate) struct ProductionInfo {
    pub(crate) lhs: Symbol,
    pub(crate) rhs: Box<[Symbol]>,
    pub(crate) fields: Box<[(u16, FieldId)]>,
    pub(crate) dynamic_precedence: i32,
}

impl ProductionInfo {
    pub(crate) fn arity(&self) -> usize {
        self.rhs.len()
    }

    pub(crate) fn field_at(&self, child_index: usize) -> Option<FieldId> {
        self.fields
            .iter()
            .find(|(index, _)| *index as usize == child_index)
            .map(|(_, field)| *field)
    }
}

/// One LR state in runtime form.
#[derive(Debug)]
struct StateTable {
    actions: FxHashMap<u16, Box<[ParseAction]>>,
    gotos: FxHashMap<u16, StateId>,
    lex_mode: LexModeId,
}

/// Lexing tables: the token DFA plus mode bookkeeping.
struct LexTables {
    dfa: dense::DFA<Vec<u32>>,
    /// DFA pattern index to terminal symbol.
    pattern_symbols: Box<[Symbol]>,
    /// Deduplicated valid-token sets. Extras are folded into every mode;
    /// external terminals appear only where the state can act on them.
    modes: Box<[TokenSet]>,
    /// Per-mode subset handed to the external scanner.
    mode_externals: Box<[TokenSet]>,
    /// Mode with every terminal valid, used while resynchronizing after an
    /// error.
    recovery_mode: LexModeId,
    extras: TokenSet,
    externals: TokenSet,
}

struct LanguageInner {
    name: SmolStr,
    abi_version: u32,
    symbols: Vec<SymbolInfo>,
    fields: Vec<SmolStr>,
    productions: Vec<ProductionInfo>,
    states: Vec<StateTable>,
    root_symbol: Symbol,
    recovery_symbols: FxHashSet<u16>,
    glr: GlrConfig,
    lex: LexTables,
    symbols_by_name: FxHashMap<(SmolStr, bool), Symbol>,
    fields_by_name: FxHashMap<SmolStr, FieldId>,
}

// ============================================================================
// LANGUAGE
// ============================================================================

/// A validated grammar table. Cloning shares the underlying data.
#[derive(Clone)]
pub struct Language {
    inner: Arc<LanguageInner>,
}

impl Language {
    /// Validate a raw table and compile its runtime form.
    ///
    /// This is the one-time, per-grammar loading step: id ranges are
    /// checked, token patterns are compiled into a single dense DFA, and
    /// per-state valid-token sets are deduplicated into lex modes. The
    /// returned handle is immutable; every parser using it shares the same
    /// tables.
    pub fn try_from_data(data: LanguageData) -> Result<Language, LanguageError> {
        let name = data.name.clone();
        if data.abi_version < MIN_COMPATIBLE_LANGUAGE_VERSION || data.abi_version > LANGUAGE_VERSION
        {
            return Err(LanguageError::version(name, data.abi_version));
        }
        validate_symbols(&name, &data)?;
        validate_fields(&name, &data)?;
        validate_productions(&name, &data)?;
        validate_states(&name, &data)?;
        validate_recovery(&name, &data)?;

        let (dfa, pattern_symbols, extras, externals) = compile_dfa(&name, &data)?;
        let (modes, state_modes, recovery_mode) = assign_lex_modes(&data, &extras);
        let mode_externals: Box<[TokenSet]> =
            modes.iter().map(|mode| mode.intersect(&externals)).collect();

        let mut states = Vec::with_capacity(data.states.len());
        for (state, mode) in data.states.iter().zip(&state_modes) {
            let actions = state
                .actions
                .iter()
                .map(|(symbol, acts)| (symbol.raw(), acts.clone().into_boxed_slice()))
                .collect();
            let gotos = state
                .gotos
                .iter()
                .map(|(symbol, target)| (symbol.raw(), *target))
                .collect();
            states.push(StateTable {
                actions,
                gotos,
                lex_mode: *mode,
            });
        }

        let mut symbols_by_name = FxHashMap::default();
        for (index, info) in data.symbols.iter().enumerate() {
            symbols_by_name
                .entry((info.name.clone(), info.named))
                .or_insert(Symbol::new(index as u16));
        }
        let mut fields_by_name = FxHashMap::default();
        for (index, field) in data.fields.iter().enumerate() {
            fields_by_name.insert(field.clone(), FieldId::new(index as u16));
        }

        let productions = data
            .productions
            .into_iter()
            .map(|p| ProductionInfo {
                lhs: p.lhs,
                rhs: p.rhs.into_boxed_slice(),
                fields: p.fields.into_boxed_slice(),
                dynamic_precedence: p.dynamic_precedence,
            })
            .collect();

        let inner = LanguageInner {
            name,
            abi_version: data.abi_version,
            symbols: data.symbols,
            fields: data.fields,
            productions,
            states,
            root_symbol: data.root_symbol,
            recovery_symbols: data.recovery.symbols.iter().map(|s| s.raw()).collect(),
            glr: data.glr,
            lex: LexTables {
                dfa,
                pattern_symbols,
                modes,
                mode_externals,
                recovery_mode,
                extras,
                externals,
            },
            symbols_by_name,
            fields_by_name,
        };

        tracing::debug!(
            language = %inner.name,
            states = inner.states.len(),
            symbols = inner.symbols.len(),
            modes = inner.lex.modes.len(),
            "loaded grammar table"
        );
        Ok(Language {
            inner: Arc::new(inner),
        })
    }

    // ------------------------------------------------------------------
    // Host-facing metadata
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Table format version, for hosts that gate on compatibility.
    pub fn abi_version(&self) -> u32 {
        self.inner.abi_version
    }

    pub fn symbol_count(&self) -> usize {
        self.inner.symbols.len()
    }

    pub fn field_count(&self) -> usize {
        self.inner.fields.len()
    }

    /// The display name of a symbol. Recovery nodes report `"ERROR"`.
    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        if symbol == Symbol::ERROR {
            return "ERROR";
        }
        self.inner
            .symbols
            .get(symbol.index())
            .map(|info| info.name.as_str())
            .unwrap_or("ERROR")
    }

    /// Look a symbol up by name, distinguishing named rules/tokens from
    /// anonymous literals.
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<Symbol> {
        self.inner
            .symbols_by_name
            .get(&(SmolStr::new(name), named))
            .copied()
    }

    pub fn field_name(&self, field: FieldId) -> Option<&str> {
        self.inner
            .fields
            .get(field.raw() as usize)
            .map(|f| f.as_str())
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.inner.fields_by_name.get(name).copied()
    }

    /// The symbol of well-formed tree roots.
    pub fn root_symbol(&self) -> Symbol {
        self.inner.root_symbol
    }

    pub fn has_external_tokens(&self) -> bool {
        !self.inner.lex.externals.is_empty()
    }

    // ------------------------------------------------------------------
    // Symbol metadata (sentinel-aware)
    // ------------------------------------------------------------------

    pub fn is_named(&self, symbol: Symbol) -> bool {
        if symbol == Symbol::ERROR {
            return true;
        }
        self.info(symbol).map(|i| i.named).unwrap_or(false)
    }

    pub fn is_visible(&self, symbol: Symbol) -> bool {
        if symbol == Symbol::ERROR {
            return true;
        }
        self.info(symbol).map(|i| i.visible).unwrap_or(false)
    }

    pub fn is_extra(&self, symbol: Symbol) -> bool {
        self.info(symbol).map(|i| i.extra).unwrap_or(false)
    }

    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        self.info(symbol).map(|i| i.is_terminal()).unwrap_or(false)
    }

    pub fn is_external(&self, symbol: Symbol) -> bool {
        self.info(symbol).map(|i| i.external).unwrap_or(false)
    }

    fn info(&self, symbol: Symbol) -> Option<&SymbolInfo> {
        self.inner.symbols.get(symbol.index())
    }

    // ------------------------------------------------------------------
    // Table lookups (engine-internal)
    // ------------------------------------------------------------------

    /// All actions for (state, lookahead). Empty means Error.
    pub(crate) fn actions(&self, state: StateId, lookahead: Symbol) -> &[ParseAction] {
        self.inner.states[state.index()]
            .actions
            .get(&lookahead.raw())
            .map(|a| &a[..])
            .unwrap_or(&[])
    }

    pub(crate) fn goto(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        self.inner.states[state.index()]
            .gotos
            .get(&symbol.raw())
            .copied()
    }

    pub(crate) fn lex_mode(&self, state: StateId) -> LexModeId {
        self.inner.states[state.index()].lex_mode
    }

    pub(crate) fn recovery_lex_mode(&self) -> LexModeId {
        self.inner.lex.recovery_mode
    }

    pub(crate) fn mode_tokens(&self, mode: LexModeId) -> &TokenSet {
        &self.inner.lex.modes[mode.index()]
    }

    /// External terminals the scanner may produce under this mode.
    pub(crate) fn mode_externals(&self, mode: LexModeId) -> &TokenSet {
        &self.inner.lex.mode_externals[mode.index()]
    }

    pub(crate) fn extras(&self) -> &TokenSet {
        &self.inner.lex.extras
    }

    pub(crate) fn externals(&self) -> &TokenSet {
        &self.inner.lex.externals
    }

    pub(crate) fn is_recovery_symbol(&self, symbol: Symbol) -> bool {
        self.inner.recovery_symbols.contains(&symbol.raw())
    }

    /// Terminals this state can shift, in symbol order. Used to enumerate
    /// insertion repairs deterministically.
    pub(crate) fn shiftable_terminals(&self, state: StateId) -> Vec<(Symbol, StateId)> {
        let mut out: Vec<(Symbol, StateId)> = self.inner.states[state.index()]
            .actions
            .iter()
            .filter_map(|(symbol, actions)| {
                actions.iter().find_map(|action| match action {
                    ParseAction::Shift(target) => Some((Symbol::new(*symbol), *target)),
                    _ => None,
                })
            })
            .collect();
        out.sort_by_key(|(symbol, _)| symbol.raw());
        out
    }

    pub(crate) fn max_versions(&self) -> usize {
        self.inner.glr.max_versions as usize
    }

    pub(crate) fn production(&self, id: ProductionId) -> &ProductionInfo {
        &self.inner.productions[id.index()]
    }

    pub(crate) fn dfa(&self) -> &dense::DFA<Vec<u32>> {
        &self.inner.lex.dfa
    }

    pub(crate) fn pattern_symbol(&self, pattern: PatternID) -> Symbol {
        self.inner.lex.pattern_symbols[pattern.as_usize()]
    }

    pub(crate) fn lex_precedence(&self, symbol: Symbol) -> i16 {
        self.info(symbol).map(|i| i.lex_precedence).unwrap_or(0)
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.inner.name)
            .field("abi_version", &self.inner.abi_version)
            .field("symbols", &self.inner.symbols.len())
            .field("states", &self.inner.states.len())
            .finish()
    }
}

/// Languages compare by identity: two handles are equal when they share the
/// same loaded table.
impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Language {}

// ============================================================================
// VALIDATION
// ============================================================================

fn validate_symbols(name: &str, data: &LanguageData) -> Result<(), LanguageError> {
    if data.symbols.is_empty() {
        return Err(LanguageError::invalid(name, "symbol table is empty"));
    }
    if data.symbols.len() >= u16::MAX as usize {
        return Err(LanguageError::invalid(name, "too many symbols"));
    }
    let end = &data.symbols[0];
    if !end.is_terminal() || end.name != "end" || end.pattern != LexPattern::None {
        return Err(LanguageError::invalid(
            name,
            "symbol 0 must be the end-of-input terminal `end` with no pattern",
        ));
    }
    for (index, info) in data.symbols.iter().enumerate() {
        let describe = |msg: &str| format!("symbol `{}` (id {index}) {msg}", info.name);
        match info.kind {
            SymbolType::Terminal => {
                if info.external && info.pattern != LexPattern::None {
                    return Err(LanguageError::invalid(
                        name,
                        describe("is external but carries a DFA pattern"),
                    ));
                }
            }
            SymbolType::NonTerminal => {
                if info.pattern != LexPattern::None {
                    return Err(LanguageError::invalid(
                        name,
                        describe("is a non-terminal but carries a pattern"),
                    ));
                }
                if info.extra || info.external {
                    return Err(LanguageError::invalid(
                        name,
                        describe("is a non-terminal but flagged extra/external"),
                    ));
                }
            }
        }
    }
    let root = data.root_symbol;
    let valid_root = data
        .symbols
        .get(root.index())
        .is_some_and(|info| !info.is_terminal());
    if !valid_root {
        return Err(LanguageError::invalid(
            name,
            format!("root symbol {} is not a non-terminal", root.raw()),
        ));
    }
    Ok(())
}

fn validate_fields(name: &str, data: &LanguageData) -> Result<(), LanguageError> {
    if data.fields.len() >= u16::MAX as usize {
        return Err(LanguageError::invalid(name, "too many fields"));
    }
    let mut seen = FxHashSet::default();
    for field in &data.fields {
        if !seen.insert(field.as_str()) {
            return Err(LanguageError::invalid(
                name,
                format!("duplicate field name `{field}`"),
            ));
        }
    }
    Ok(())
}

fn validate_productions(name: &str, data: &LanguageData) -> Result<(), LanguageError> {
    if data.productions.len() >= u16::MAX as usize {
        return Err(LanguageError::invalid(name, "too many productions"));
    }
    for (index, production) in data.productions.iter().enumerate() {
        let lhs_ok = data
            .symbols
            .get(production.lhs.index())
            .is_some_and(|info| !info.is_terminal());
        if !lhs_ok {
            return Err(LanguageError::invalid(
                name,
                format!("production {index}: lhs is not a non-terminal"),
            ));
        }
        for symbol in &production.rhs {
            if *symbol == Symbol::EOF || data.symbols.get(symbol.index()).is_none() {
                return Err(LanguageError::invalid(
                    name,
                    format!(
                        "production {index}: rhs symbol {} out of range",
                        symbol.raw()
                    ),
                ));
            }
        }
        for (child, field) in &production.fields {
            if *child as usize >= production.rhs.len() {
                return Err(LanguageError::invalid(
                    name,
                    format!("production {index}: field child index {child} out of range"),
                ));
            }
            if data.fields.get(field.raw() as usize).is_none() {
                return Err(LanguageError::invalid(
                    name,
                    format!("production {index}: field id {} out of range", field.raw()),
                ));
            }
        }
    }
    Ok(())
}

fn validate_states(name: &str, data: &LanguageData) -> Result<(), LanguageError> {
    if data.states.is_empty() {
        return Err(LanguageError::invalid(name, "state table is empty"));
    }
    if data.states.len() > u16::MAX as usize {
        return Err(LanguageError::invalid(name, "too many states"));
    }
    let mut saw_accept = false;
    for (index, state) in data.states.iter().enumerate() {
        let mut keys = FxHashSet::default();
        for (symbol, actions) in &state.actions {
            let terminal = data
                .symbols
                .get(symbol.index())
                .is_some_and(|info| info.is_terminal());
            if !terminal {
                return Err(LanguageError::invalid(
                    name,
                    format!(
                        "state {index}: action key {} is not a terminal",
                        symbol.raw()
                    ),
                ));
            }
            if !keys.insert(symbol.raw()) {
                return Err(LanguageError::invalid(
                    name,
                    format!("state {index}: duplicate action key {}", symbol.raw()),
                ));
            }
            if actions.is_empty() {
                return Err(LanguageError::invalid(
                    name,
                    format!("state {index}: empty action list for {}", symbol.raw()),
                ));
            }
            for action in actions {
                match action {
                    ParseAction::Shift(target) => {
                        if target.index() >= data.states.len() {
                            return Err(LanguageError::invalid(
                                name,
                                format!(
                                    "state {index}: shift target {} out of range",
                                    target.raw()
                                ),
                            ));
                        }
                    }
                    ParseAction::Reduce(production) => {
                        if production.index() >= data.productions.len() {
                            return Err(LanguageError::invalid(
                                name,
                                format!(
                                    "state {index}: reduce production {} out of range",
                                    production.raw()
                                ),
                            ));
                        }
                    }
                    ParseAction::Accept => {
                        if *symbol != Symbol::EOF {
                            return Err(LanguageError::invalid(
                                name,
                                format!("state {index}: accept action keyed by non-end symbol"),
                            ));
                        }
                        saw_accept = true;
                    }
                }
            }
        }
        let mut goto_keys = FxHashSet::default();
        for (symbol, target) in &state.gotos {
            let non_terminal = data
                .symbols
                .get(symbol.index())
                .is_some_and(|info| !info.is_terminal());
            if !non_terminal {
                return Err(LanguageError::invalid(
                    name,
                    format!(
                        "state {index}: goto key {} is not a non-terminal",
                        symbol.raw()
                    ),
                ));
            }
            if !goto_keys.insert(symbol.raw()) {
                return Err(LanguageError::invalid(
                    name,
                    format!("state {index}: duplicate goto key {}", symbol.raw()),
                ));
            }
            if target.index() >= data.states.len() {
                return Err(LanguageError::invalid(
                    name,
                    format!("state {index}: goto target {} out of range", target.raw()),
                ));
            }
        }
    }
    if !saw_accept {
        return Err(LanguageError::invalid(name, "no accept action in any state"));
    }
    Ok(())
}

fn validate_recovery(name: &str, data: &LanguageData) -> Result<(), LanguageError> {
    for symbol in &data.recovery.symbols {
        let terminal = data
            .symbols
            .get(symbol.index())
            .is_some_and(|info| info.is_terminal());
        if !terminal {
            return Err(LanguageError::invalid(
                name,
                format!("recovery symbol {} is not a terminal", symbol.raw()),
            ));
        }
    }
    if data.glr.max_versions == 0 {
        return Err(LanguageError::invalid(
            name,
            "glr.max_versions must be at least 1",
        ));
    }
    Ok(())
}

// ============================================================================
// LEX COMPILATION
// ============================================================================

type CompiledDfa = (dense::DFA<Vec<u32>>, Box<[Symbol]>, TokenSet, TokenSet);

/// Compile every literal/regex pattern into one multi-pattern anchored DFA.
/// `MatchKind::All` keeps every pattern alive through the walk so the lexer
/// can apply maximal munch plus precedence itself.
fn compile_dfa(name: &str, data: &LanguageData) -> Result<CompiledDfa, LanguageError> {
    let mut patterns: Vec<String> = Vec::new();
    let mut pattern_symbols: Vec<Symbol> = Vec::new();
    let mut extras = TokenSet::new();
    let mut externals = TokenSet::new();

    for (index, info) in data.symbols.iter().enumerate() {
        let symbol = Symbol::new(index as u16);
        if info.extra {
            extras.insert(symbol);
        }
        if info.external {
            externals.insert(symbol);
        }
        let source = match &info.pattern {
            LexPattern::Literal(text) => regex_syntax::escape(text),
            LexPattern::Regex(source) => {
                // Parse eagerly so errors name the offending symbol.
                let checked = regex_syntax::ParserBuilder::new()
                    .unicode(false)
                    .utf8(false)
                    .build()
                    .parse(source);
                if let Err(err) = checked {
                    return Err(LanguageError::pattern(
                        name,
                        info.name.clone(),
                        err.to_string(),
                    ));
                }
                source.to_string()
            }
            LexPattern::None => continue,
        };
        patterns.push(source);
        pattern_symbols.push(symbol);
    }

    let dfa = if patterns.is_empty() {
        dense::DFA::never_match()
            .map_err(|err| LanguageError::pattern(name, "<empty>", err.to_string()))?
    } else {
        dense::Builder::new()
            .configure(
                dense::Config::new()
                    .match_kind(MatchKind::All)
                    .start_kind(regex_automata::dfa::StartKind::Anchored),
            )
            .syntax(
                regex_automata::util::syntax::Config::new()
                    .unicode(false)
                    .utf8(false),
            )
            .build_many(&patterns)
            .map_err(|err| LanguageError::pattern(name, "<table>", err.to_string()))?
    };

    extras.shrink();
    externals.shrink();
    Ok((dfa, pattern_symbols.into_boxed_slice(), extras, externals))
}

/// Dedupe per-state valid-token sets into lex modes and append the all-valid
/// recovery mode. Returns the mode sets, each state's mode, and the recovery
/// mode id.
fn assign_lex_modes(
    data: &LanguageData,
    extras: &TokenSet,
) -> (Box<[TokenSet]>, Vec<LexModeId>, LexModeId) {
    let mut interned: IndexMap<TokenSet, LexModeId> = IndexMap::new();
    let mut intern = |set: TokenSet, interned: &mut IndexMap<TokenSet, LexModeId>| {
        let next = LexModeId(interned.len() as u16);
        *interned.entry(set).or_insert(next)
    };

    let mut state_modes = Vec::with_capacity(data.states.len());
    for state in &data.states {
        let mut set = TokenSet::new();
        for (symbol, _) in &state.actions {
            set.insert(*symbol);
        }
        for symbol in extras.iter() {
            set.insert(symbol);
        }
        set.shrink();
        state_modes.push(intern(set, &mut interned));
    }

    let mut all = TokenSet::new();
    for (index, info) in data.symbols.iter().enumerate() {
        if info.is_terminal() {
            all.insert(Symbol::new(index as u16));
        }
    }
    all.shrink();
    let recovery_mode = intern(all, &mut interned);

    let modes: Box<[TokenSet]> = interned.into_keys().collect();
    (modes, state_modes, recovery_mode)
}

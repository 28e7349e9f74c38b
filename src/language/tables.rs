//! Raw grammar-table data.
//!
//! A grammar reaches the engine as plain data produced by an external
//! generation step: symbol and field tables, productions, LR parse states,
//! token patterns, and the recovery/GLR configuration that ships alongside
//! the tables. [`LanguageData`] holds that data verbatim;
//! [`Language::try_from_data`](super::Language::try_from_data) validates it
//! and compiles the runtime form (lookup maps, lex modes, the token DFA).
//!
//! Nothing in this module is mutated after load.

use smol_str::SmolStr;

// ============================================================================
// IDS
// ============================================================================

/// A terminal or non-terminal symbol id. Indexes [`LanguageData::symbols`].
///
/// Two ids are reserved and never appear in the symbol table: [`Symbol::EOF`]
/// is always index 0, and [`Symbol::ERROR`] marks nodes produced by error
/// recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Symbol(pub u16);

impl Symbol {
    /// End of input. The symbol table must describe it at index 0.
    pub const EOF: Symbol = Symbol(0);
    /// Nodes synthesized by error recovery.
    pub const ERROR: Symbol = Symbol(u16::MAX);

    pub const fn new(raw: u16) -> Self {
        Symbol(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A field name id. Indexes [`LanguageData::fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct FieldId(pub u16);

impl FieldId {
    pub const fn new(raw: u16) -> Self {
        FieldId(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// A parse-state id. Indexes [`LanguageData::states`]. State 0 is the start
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct StateId(pub u16);

impl StateId {
    pub const START: StateId = StateId(0);

    pub const fn new(raw: u16) -> Self {
        StateId(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A production id. Indexes [`LanguageData::productions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ProductionId(pub u16);

impl ProductionId {
    pub const fn new(raw: u16) -> Self {
        ProductionId(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A deduplicated valid-token-set id. Two parse states whose valid terminals
/// coincide share a lex mode; tokens remember the mode they were scanned in
/// so incremental reuse can compare lexing contexts cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LexModeId(pub u16);

impl LexModeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// SYMBOLS
// ============================================================================

/// Terminal or non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolType {
    Terminal,
    NonTerminal,
}

/// How a terminal's text is recognized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LexPattern {
    /// Exact text. Escaped before DFA compilation, so metacharacters are
    /// literal.
    Literal(SmolStr),
    /// A byte-oriented regular expression (no Unicode classes).
    Regex(SmolStr),
    /// Not lexed by the DFA. Non-terminals, end of input, and tokens
    /// produced only by an external scanner.
    None,
}

/// One entry of the symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolInfo {
    pub name: SmolStr,
    pub kind: SymbolType,
    /// Named symbols surface in ASTs; anonymous ones are punctuation and
    /// operator literals.
    pub named: bool,
    /// Hidden symbols (conventionally underscore-prefixed rules) keep their
    /// place in the green tree but are spliced out of visible traversal.
    pub visible: bool,
    /// Extras are lexed wherever they appear and attached to the tree
    /// without participating in any production (whitespace, comments).
    pub extra: bool,
    /// Produced by the external scanner rather than the token DFA.
    pub external: bool,
    /// Tie-break among equal-length token matches; higher wins. Equal
    /// precedence falls back to declaration order.
    pub lex_precedence: i16,
    pub pattern: LexPattern,
}

impl SymbolInfo {
    /// A named terminal with a regex pattern.
    pub fn terminal(name: impl Into<SmolStr>, pattern: impl Into<SmolStr>) -> Self {
        SymbolInfo {
            name: name.into(),
            kind: SymbolType::Terminal,
            named: true,
            visible: true,
            extra: false,
            external: false,
            lex_precedence: 0,
            pattern: LexPattern::Regex(pattern.into()),
        }
    }

    /// An anonymous terminal matching its name exactly ("+", "{", "fn").
    pub fn anon(text: impl Into<SmolStr>) -> Self {
        let text = text.into();
        SymbolInfo {
            name: text.clone(),
            kind: SymbolType::Terminal,
            named: false,
            visible: true,
            extra: false,
            external: false,
            lex_precedence: 0,
            pattern: LexPattern::Literal(text),
        }
    }

    /// A named keyword terminal: literal text, but named like a rule.
    pub fn keyword(name: impl Into<SmolStr>, text: impl Into<SmolStr>) -> Self {
        SymbolInfo {
            name: name.into(),
            kind: SymbolType::Terminal,
            named: true,
            visible: true,
            extra: false,
            external: false,
            lex_precedence: 1,
            pattern: LexPattern::Literal(text.into()),
        }
    }

    /// A visible non-terminal.
    pub fn rule(name: impl Into<SmolStr>) -> Self {
        SymbolInfo {
            name: name.into(),
            kind: SymbolType::NonTerminal,
            named: true,
            visible: true,
            extra: false,
            external: false,
            lex_precedence: 0,
            pattern: LexPattern::None,
        }
    }

    /// A hidden non-terminal, spliced out of visible traversal.
    pub fn hidden_rule(name: impl Into<SmolStr>) -> Self {
        SymbolInfo {
            name: name.into(),
            kind: SymbolType::NonTerminal,
            named: true,
            visible: false,
            extra: false,
            external: false,
            lex_precedence: 0,
            pattern: LexPattern::None,
        }
    }

    /// The end-of-input terminal required at symbol index 0.
    pub fn end() -> Self {
        SymbolInfo {
            name: SmolStr::new_static("end"),
            kind: SymbolType::Terminal,
            named: false,
            visible: false,
            extra: false,
            external: false,
            lex_precedence: 0,
            pattern: LexPattern::None,
        }
    }

    pub fn with_extra(mut self) -> Self {
        self.extra = true;
        self
    }

    pub fn with_hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_external(mut self) -> Self {
        self.external = true;
        self.pattern = LexPattern::None;
        self
    }

    pub fn with_precedence(mut self, precedence: i16) -> Self {
        self.lex_precedence = precedence;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == SymbolType::Terminal
    }
}

// ============================================================================
// PRODUCTIONS AND STATES
// ============================================================================

/// One grammar production `lhs -> rhs`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProductionData {
    pub lhs: Symbol,
    pub rhs: Vec<Symbol>,
    /// Field tags on rhs positions: `(child_index, field)`.
    pub fields: Vec<(u16, FieldId)>,
    /// GLR tie-break weight. Versions carrying higher summed precedence win
    /// when everything else is equal.
    pub dynamic_precedence: i32,
}

impl ProductionData {
    pub fn new(lhs: Symbol, rhs: impl Into<Vec<Symbol>>) -> Self {
        ProductionData {
            lhs,
            rhs: rhs.into(),
            fields: Vec::new(),
            dynamic_precedence: 0,
        }
    }

    pub fn with_field(mut self, child_index: u16, field: FieldId) -> Self {
        self.fields.push((child_index, field));
        self
    }

    pub fn with_dynamic_precedence(mut self, precedence: i32) -> Self {
        self.dynamic_precedence = precedence;
        self
    }
}

/// A parse-table action. An action cell may hold several of these; more than
/// one forks the stack (GLR).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParseAction {
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

/// One LR state: terminal actions and non-terminal gotos. Terminals with no
/// entry are errors in this state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateData {
    pub actions: Vec<(Symbol, Vec<ParseAction>)>,
    pub gotos: Vec<(Symbol, StateId)>,
}

impl StateData {
    pub fn new(
        actions: impl Into<Vec<(Symbol, Vec<ParseAction>)>>,
        gotos: impl Into<Vec<(Symbol, StateId)>>,
    ) -> Self {
        StateData {
            actions: actions.into(),
            gotos: gotos.into(),
        }
    }
}

// ============================================================================
// RECOVERY AND GLR CONFIGURATION
// ============================================================================

/// Error-recovery configuration shipped with the tables, not hardcoded in
/// the engine: the symbols resynchronization may stop at (typically
/// statement and block terminators).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecoveryData {
    pub symbols: Vec<Symbol>,
}

impl RecoveryData {
    pub fn new(symbols: impl Into<Vec<Symbol>>) -> Self {
        RecoveryData {
            symbols: symbols.into(),
        }
    }
}

/// GLR bounds shipped with the tables.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlrConfig {
    /// Maximum live stack versions; the worst-scoring versions beyond this
    /// are pruned.
    pub max_versions: u16,
}

impl Default for GlrConfig {
    fn default() -> Self {
        GlrConfig { max_versions: 6 }
    }
}

// ============================================================================
// THE TABLE
// ============================================================================

/// A complete grammar table, as emitted by a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LanguageData {
    pub name: SmolStr,
    /// Table format version, checked against the engine's supported window.
    pub abi_version: u32,
    /// Symbol table. Index 0 must be the end-of-input terminal.
    pub symbols: Vec<SymbolInfo>,
    /// Field-name table, indexed by [`FieldId`].
    pub fields: Vec<SmolStr>,
    pub productions: Vec<ProductionData>,
    /// Parse states. Index 0 is the start state.
    pub states: Vec<StateData>,
    /// The symbol of the tree root; also used to wrap partial results.
    pub root_symbol: Symbol,
    pub recovery: RecoveryData,
    pub glr: GlrConfig,
}

// ============================================================================
// TOKEN SETS
// ============================================================================

/// A bitset over symbol ids, used for per-state valid-token sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TokenSet {
    words: Vec<u64>,
}

impl TokenSet {
    pub fn new() -> Self {
        TokenSet::default()
    }

    pub fn insert(&mut self, symbol: Symbol) {
        let (word, bit) = (symbol.index() / 64, symbol.index() % 64);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << bit;
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        let (word, bit) = (symbol.index() / 64, symbol.index() % 64);
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            (0..64)
                .filter(move |bit| w & (1 << bit) != 0)
                .map(move |bit| Symbol::new((wi * 64 + bit) as u16))
        })
    }

    pub fn intersect(&self, other: &TokenSet) -> TokenSet {
        let mut words: Vec<u64> = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a & b)
            .collect();
        while words.last() == Some(&0) {
            words.pop();
        }
        TokenSet { words }
    }

    /// Canonical form so that equal sets hash equally regardless of how
    /// they were built.
    pub(crate) fn shrink(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

impl FromIterator<Symbol> for TokenSet {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let mut set = TokenSet::new();
        for symbol in iter {
            set.insert(symbol);
        }
        set
    }
}

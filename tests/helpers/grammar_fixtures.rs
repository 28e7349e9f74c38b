//! Hand-assembled grammar tables for the integration suites.
//!
//! Each fixture is a complete table set a generator could have emitted:
//! symbols, productions, LR states, and recovery configuration. They are
//! deliberately tiny so every action cell can be checked by hand.

use arbor::Language;
use arbor::language::{
    FieldId, GlrConfig, LanguageData, ParseAction, ProductionData, ProductionId, RecoveryData,
    StateData, StateId, Symbol, SymbolInfo, LANGUAGE_VERSION,
};
use once_cell::sync::Lazy;

/// `source -> _sum; _sum -> _sum "+" _term | _term; _term -> identifier`,
/// with blanks as extras and `left`/`right` fields on the sum arms.
pub mod arith {
    use super::*;

    pub const IDENT: Symbol = Symbol(1);
    pub const PLUS: Symbol = Symbol(2);
    pub const SOURCE: Symbol = Symbol(4);
    pub const SUM: Symbol = Symbol(5);
    pub const TERM: Symbol = Symbol(6);

    pub static LANGUAGE: Lazy<Language> = Lazy::new(|| {
        Language::try_from_data(LanguageData {
            name: "arith".into(),
            abi_version: LANGUAGE_VERSION,
            symbols: vec![
                SymbolInfo::end(),
                SymbolInfo::terminal("identifier", "[a-z]+"),
                SymbolInfo::anon("+"),
                SymbolInfo::terminal("ws", "[ ]+").with_extra().with_hidden(),
                SymbolInfo::rule("source"),
                SymbolInfo::hidden_rule("_sum"),
                SymbolInfo::hidden_rule("_term"),
            ],
            fields: vec!["left".into(), "right".into()],
            productions: vec![
                ProductionData::new(SOURCE, [SUM]),
                ProductionData::new(SUM, [SUM, PLUS, TERM])
                    .with_field(0, FieldId(0))
                    .with_field(2, FieldId(1)),
                ProductionData::new(SUM, [TERM]),
                ProductionData::new(TERM, [IDENT]),
            ],
            states: vec![
                StateData::new(
                    [(IDENT, vec![ParseAction::Shift(StateId(1))])],
                    [
                        (SOURCE, StateId(5)),
                        (SUM, StateId(2)),
                        (TERM, StateId(3)),
                    ],
                ),
                StateData::new(
                    [
                        (PLUS, vec![ParseAction::Reduce(ProductionId(3))]),
                        (Symbol::EOF, vec![ParseAction::Reduce(ProductionId(3))]),
                    ],
                    [],
                ),
                StateData::new(
                    [
                        (PLUS, vec![ParseAction::Shift(StateId(4))]),
                        (Symbol::EOF, vec![ParseAction::Reduce(ProductionId(0))]),
                    ],
                    [],
                ),
                StateData::new(
                    [
                        (PLUS, vec![ParseAction::Reduce(ProductionId(2))]),
                        (Symbol::EOF, vec![ParseAction::Reduce(ProductionId(2))]),
                    ],
                    [],
                ),
                StateData::new(
                    [(IDENT, vec![ParseAction::Shift(StateId(1))])],
                    [(TERM, StateId(6))],
                ),
                StateData::new([(Symbol::EOF, vec![ParseAction::Accept])], []),
                StateData::new(
                    [
                        (PLUS, vec![ParseAction::Reduce(ProductionId(1))]),
                        (Symbol::EOF, vec![ParseAction::Reduce(ProductionId(1))]),
                    ],
                    [],
                ),
            ],
            root_symbol: SOURCE,
            recovery: RecoveryData::default(),
            glr: Default::default(),
        })
        .expect("arith tables are well-formed")
    });
}

/// `source -> _statements; _statements -> _statements statement | statement;
/// statement -> identifier ";"`, with blanks and newlines as extras and `;`
/// registered as a recovery symbol.
pub mod statements {
    use super::*;

    pub const IDENT: Symbol = Symbol(1);
    pub const SEMI: Symbol = Symbol(2);
    pub const SOURCE: Symbol = Symbol(4);
    pub const STATEMENTS: Symbol = Symbol(5);
    pub const STATEMENT: Symbol = Symbol(6);

    pub static LANGUAGE: Lazy<Language> = Lazy::new(|| {
        Language::try_from_data(LanguageData {
            name: "statements".into(),
            abi_version: LANGUAGE_VERSION,
            symbols: vec![
                SymbolInfo::end(),
                SymbolInfo::terminal("identifier", "[a-z]+"),
                SymbolInfo::anon(";"),
                SymbolInfo::terminal("ws", r"[ \n]+")
                    .with_extra()
                    .with_hidden(),
                SymbolInfo::rule("source"),
                SymbolInfo::hidden_rule("_statements"),
                SymbolInfo::rule("statement"),
            ],
            fields: vec![],
            productions: vec![
                ProductionData::new(SOURCE, [STATEMENTS]),
                ProductionData::new(STATEMENTS, [STATEMENTS, STATEMENT]),
                ProductionData::new(STATEMENTS, [STATEMENT]),
                ProductionData::new(STATEMENT, [IDENT, SEMI]),
            ],
            states: vec![
                StateData::new(
                    [(IDENT, vec![ParseAction::Shift(StateId(1))])],
                    [
                        (SOURCE, StateId(6)),
                        (STATEMENTS, StateId(2)),
                        (STATEMENT, StateId(3)),
                    ],
                ),
                StateData::new([(SEMI, vec![ParseAction::Shift(StateId(4))])], []),
                StateData::new(
                    [
                        (Symbol::EOF, vec![ParseAction::Reduce(ProductionId(0))]),
                        (IDENT, vec![ParseAction::Shift(StateId(1))]),
                    ],
                    [(STATEMENT, StateId(5))],
                ),
                StateData::new(
                    [
                        (Symbol::EOF, vec![ParseAction::Reduce(ProductionId(2))]),
                        (IDENT, vec![ParseAction::Reduce(ProductionId(2))]),
                    ],
                    [],
                ),
                StateData::new(
                    [
                        (Symbol::EOF, vec![ParseAction::Reduce(ProductionId(3))]),
                        (IDENT, vec![ParseAction::Reduce(ProductionId(3))]),
                    ],
                    [],
                ),
                StateData::new(
                    [
                        (Symbol::EOF, vec![ParseAction::Reduce(ProductionId(1))]),
                        (IDENT, vec![ParseAction::Reduce(ProductionId(1))]),
                    ],
                    [],
                ),
                StateData::new([(Symbol::EOF, vec![ParseAction::Accept])], []),
            ],
            root_symbol: SOURCE,
            recovery: RecoveryData::new([SEMI]),
            glr: Default::default(),
        })
        .expect("statements tables are well-formed")
    });
}

/// `source -> item; item -> variable | constant; variable -> word;
/// constant -> word`, a deliberate reduce-reduce ambiguity on `word`
/// settled by dynamic precedence.
pub mod choices {
    use super::*;

    pub const WORD: Symbol = Symbol(1);
    pub const SOURCE: Symbol = Symbol(2);
    pub const ITEM: Symbol = Symbol(3);
    pub const VARIABLE: Symbol = Symbol(4);
    pub const CONSTANT: Symbol = Symbol(5);

    /// Builds the grammar with the given weights on the two `word` readings.
    pub fn language(variable_bias: i32, constant_bias: i32) -> Language {
        language_with(variable_bias, constant_bias, GlrConfig::default())
    }

    pub fn language_with(variable_bias: i32, constant_bias: i32, glr: GlrConfig) -> Language {
        Language::try_from_data(LanguageData {
            name: "choices".into(),
            abi_version: LANGUAGE_VERSION,
            symbols: vec![
                SymbolInfo::end(),
                SymbolInfo::terminal("word", "[a-z]+"),
                SymbolInfo::rule("source"),
                SymbolInfo::rule("item"),
                SymbolInfo::rule("variable"),
                SymbolInfo::rule("constant"),
            ],
            fields: vec![],
            productions: vec![
                ProductionData::new(SOURCE, [ITEM]),
                ProductionData::new(ITEM, [VARIABLE]),
                ProductionData::new(ITEM, [CONSTANT]),
                ProductionData::new(VARIABLE, [WORD]).with_dynamic_precedence(variable_bias),
                ProductionData::new(CONSTANT, [WORD]).with_dynamic_precedence(constant_bias),
            ],
            states: vec![
                StateData::new(
                    [(WORD, vec![ParseAction::Shift(StateId(1))])],
                    [
                        (SOURCE, StateId(5)),
                        (ITEM, StateId(2)),
                        (VARIABLE, StateId(3)),
                        (CONSTANT, StateId(4)),
                    ],
                ),
                // The fork: both readings of `word` stay live until the
                // finished versions are compared.
                StateData::new(
                    [(
                        Symbol::EOF,
                        vec![
                            ParseAction::Reduce(ProductionId(3)),
                            ParseAction::Reduce(ProductionId(4)),
                        ],
                    )],
                    [],
                ),
                StateData::new([(Symbol::EOF, vec![ParseAction::Reduce(ProductionId(0))])], []),
                StateData::new([(Symbol::EOF, vec![ParseAction::Reduce(ProductionId(1))])], []),
                StateData::new([(Symbol::EOF, vec![ParseAction::Reduce(ProductionId(2))])], []),
                StateData::new([(Symbol::EOF, vec![ParseAction::Accept])], []),
            ],
            root_symbol: SOURCE,
            recovery: RecoveryData::default(),
            glr,
        })
        .expect("choices tables are well-formed")
    }
}

/// `source -> _words; _words -> _words word | word`, with whitespace and an
/// externally scanned `comment` token as extras.
pub mod commented {
    use super::*;

    pub const WORD: Symbol = Symbol(1);
    pub const COMMENT: Symbol = Symbol(2);
    pub const SOURCE: Symbol = Symbol(4);
    pub const WORDS: Symbol = Symbol(5);

    pub static LANGUAGE: Lazy<Language> = Lazy::new(|| {
        Language::try_from_data(LanguageData {
            name: "commented".into(),
            abi_version: LANGUAGE_VERSION,
            symbols: vec![
                SymbolInfo::end(),
                SymbolInfo::terminal("word", "[a-z]+"),
                SymbolInfo::terminal("comment", "").with_external().with_extra(),
                SymbolInfo::terminal("ws", "[ ]+").with_extra().with_hidden(),
                SymbolInfo::rule("source"),
                SymbolInfo::hidden_rule("_words"),
            ],
            fields: vec![],
            productions: vec![
                ProductionData::new(SOURCE, [WORDS]),
                ProductionData::new(WORDS, [WORDS, WORD]),
                ProductionData::new(WORDS, [WORD]),
            ],
            states: vec![
                StateData::new(
                    [(WORD, vec![ParseAction::Shift(StateId(1))])],
                    [(SOURCE, StateId(4)), (WORDS, StateId(2))],
                ),
                StateData::new(
                    [
                        (Symbol::EOF, vec![ParseAction::Reduce(ProductionId(2))]),
                        (WORD, vec![ParseAction::Reduce(ProductionId(2))]),
                    ],
                    [],
                ),
                StateData::new(
                    [
                        (Symbol::EOF, vec![ParseAction::Reduce(ProductionId(0))]),
                        (WORD, vec![ParseAction::Shift(StateId(3))]),
                    ],
                    [],
                ),
                StateData::new(
                    [
                        (Symbol::EOF, vec![ParseAction::Reduce(ProductionId(1))]),
                        (WORD, vec![ParseAction::Reduce(ProductionId(1))]),
                    ],
                    [],
                ),
                StateData::new([(Symbol::EOF, vec![ParseAction::Accept])], []),
            ],
            root_symbol: SOURCE,
            recovery: RecoveryData::default(),
            glr: Default::default(),
        })
        .expect("commented tables are well-formed")
    });
}

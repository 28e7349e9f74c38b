//! Errors raised while loading a grammar table.
//!
//! These are the only hard failures on the language side: a table that
//! validates successfully can never fail at parse time because of its own
//! contents.

use thiserror::Error;

use super::{MIN_COMPATIBLE_LANGUAGE_VERSION, LANGUAGE_VERSION};

#[derive(Debug, Error)]
pub enum LanguageError {
    /// The table was generated for an ABI this engine build does not speak.
    #[error(
        "grammar table `{language}` has ABI version {version}, engine supports \
         {min}..={max}"
    )]
    VersionMismatch {
        language: String,
        version: u32,
        min: u32,
        max: u32,
    },

    /// Structurally inconsistent table data (out-of-range ids, misplaced
    /// symbols, missing accept state and so on).
    #[error("invalid grammar table `{language}`: {message}")]
    InvalidTable { language: String, message: String },

    /// A token pattern did not compile into the language DFA.
    #[error("grammar table `{language}`: token pattern for `{symbol}` failed to compile: {message}")]
    Pattern {
        language: String,
        symbol: String,
        message: String,
    },
}

impl LanguageError {
    pub(crate) fn version(language: impl Into<String>, version: u32) -> Self {
        LanguageError::VersionMismatch {
            language: language.into(),
            version,
            min: MIN_COMPATIBLE_LANGUAGE_VERSION,
            max: LANGUAGE_VERSION,
        }
    }

    pub(crate) fn invalid(language: impl Into<String>, message: impl Into<String>) -> Self {
        LanguageError::InvalidTable {
            language: language.into(),
            message: message.into(),
        }
    }

    pub(crate) fn pattern(
        language: impl Into<String>,
        symbol: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LanguageError::Pattern {
            language: language.into(),
            symbol: symbol.into(),
            message: message.into(),
        }
    }
}

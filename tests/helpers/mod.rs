//! Shared fixtures and helpers for the integration suites.

pub mod grammar_fixtures;
pub mod parse_helpers;

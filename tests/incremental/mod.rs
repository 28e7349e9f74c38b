//! Incremental re-parsing tests
//!
//! Edit bookkeeping and subtree reuse across parses:
//! - Edit validation and composition
//! - Changed-range reporting between tree versions
//! - Node identity across reuse boundaries
//! - External tokens forcing re-scans

pub mod tests_edits;

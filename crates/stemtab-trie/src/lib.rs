//! Patch-command tries for dictionary-driven stemming.
//!
//! This crate compiles a word→stem dictionary into a compact transition
//! table (a "trie" of character transitions annotated with patch
//! commands) and answers stemming lookups against it. A patch command is
//! a small edit script — skip/delete/insert/replace tokens — that rewrites
//! a word into its stem when replayed from the matched end.
//!
//! # Architecture
//!
//! - [`diff`] -- Weighted edit-script engine (command synthesis and replay)
//! - [`pool`] -- Interned command strings, referenced by index
//! - [`row`] -- Rows and cells: one node's outgoing transitions
//! - [`trie`] -- The transition table: insertion, lookup, persistence
//! - [`reduce`] -- Minimization passes over a built table
//! - [`multi`] -- Layered tables splitting multi-step commands
//! - [`format`] -- Binary primitives shared by the persisted format

pub mod diff;
pub mod format;
pub mod multi;
pub mod pool;
pub mod reduce;
pub mod row;
pub mod trie;

/// Error type for table persistence and layered-table invariants.
#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    #[error("table data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("invalid character scalar {0:#x} in table data")]
    InvalidChar(u32),
    #[error("invalid UTF-8 in stored string")]
    InvalidUtf8,
    #[error("negative count {0} in table data")]
    NegativeCount(i32),
    #[error("row index {index} out of range ({rows} rows)")]
    BadRowIndex { index: i32, rows: usize },
    #[error("command index {index} out of range ({cmds} commands)")]
    BadCommandIndex { index: i32, cmds: usize },
    #[error("adjacent patch segments {prev:?} and {next:?} both continue with '{op}'")]
    SegmentOrder { prev: String, next: String, op: char },
}

/// A minimization pass over a [`Trie`](trie::Trie).
///
/// Passes read their input immutably and build a fresh table; every pass
/// finishes with a reachability compaction, so the output is dense and
/// contains no unreachable rows. Lookup results for inserted keys are
/// preserved (for [`reduce::UniformLift`] with `respect_skip = false`,
/// preserved under `get_last_on_path` rather than `get_fully`).
pub trait Reduce {
    fn optimize(&self, trie: &trie::Trie) -> trie::Trie;
}

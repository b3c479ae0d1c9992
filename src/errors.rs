//! Error kinds of spec §7.
//!
//! `MergeConflict` is deliberately *not* a variant here: per spec §7 it
//! is "an expected outcome, not an error", reported through
//! [`crate::merge_result::MergeResult`]'s conflict statistics instead
//! (mirroring `mergiraf`'s own `MergeResult { conflict_count, .. }`).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    /// Input cannot be parsed. Under `combined`/`autotuning` this
    /// triggers a fallback to the line merger; otherwise it surfaces.
    #[error("failed to parse {revision}: {message}")]
    ParseFailure { revision: String, message: String },

    /// An unknown strategy name was requested. Fatal before any
    /// merging begins.
    #[error("unknown merge strategy: {0:?}")]
    StrategyNotFound(String),

    /// An input file could not be found.
    #[error("input missing: {0}")]
    InputMissing(PathBuf),

    /// An input file exists but could not be read (permissions,
    /// encoding, etc.).
    #[error("input inaccessible: {path}: {source}")]
    InputInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data-model invariant was violated. Always fatal, never caught
    /// for recovery (spec §7).
    #[error("internal assertion failed: {0}")]
    InternalAssertion(String),

    /// Cooperative cancellation occurred; partial state was discarded.
    #[error("merge cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, MergeError>;

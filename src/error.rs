//! Crate-wide error kinds.

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors reported by journals, trees and traversals.
pub enum JstError {
    /// A breakpoint or breakend is not valid where it was used:
    /// ends out of order, or a handle that does not belong to the
    /// journal it was given to.
    #[error("invalid breakpoint: {0}")]
    InvalidBreakend(String),
    /// An index lies outside `[0, size)`.
    #[error("position {position} out of range (size {size})")]
    OutOfRange { position: usize, size: usize },
    /// An event was supplied with an empty coverage.
    #[error("event at reference position {0} has empty coverage")]
    EmptyCoverage(usize),
    /// Two events with intersecting coverage claim conflicting spans.
    #[error("conflicting events at reference positions {0} and {1}")]
    InvalidEventSet(usize, usize),
    /// A position handle outlived a journal mutation.
    #[error("journal mutated since handle was taken (generation {held} vs {current})")]
    JournalMutated { held: u64, current: u64 },
    /// Internal consistency check failed; indicates a bug in this crate.
    #[error("internal invariant violated: {0}")]
    InvariantViolated(&'static str),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, JstError>;

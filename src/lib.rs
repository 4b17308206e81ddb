//! Journaled sequence tree: a reference string plus shared edit
//! events (substitution, insertion, deletion), each annotated with a
//! bit-set coverage of the samples carrying it.
//!
//! What the crate gives you:
//! - An inline sequence journal with O(log n) locate and inline
//!   `record` edits, and a journaled-sequence façade with
//!   `insert` / `erase` / `replace` at positions
//! - Lazy sequence-tree traversal over the implied variant graph,
//!   wrapped in a composable adapter pipeline (labelled, coloured,
//!   trim, prune, left-extend, merge, seek)
//! - A context enumerator yielding every distinct length-w window
//!   present in at least one sample, exactly once, together with the
//!   coverage and a coordinate resolvable to per-sample offsets
//!
//! The tree borrows the reference and owns only the event list;
//! sample sequences are materialised on request, never stored.
//! Traversal is read-only, deterministic, and safe to run from
//! several traversers concurrently.

mod coverage;
mod enumerate;
mod error;
mod event;
mod journal;
mod journaled;
mod pipeline;
mod slice;
mod traverse;
mod tree;

pub use crate::coverage::{Coverage, CoverageIter, CoverageSet, SampleId};
pub use crate::enumerate::{Context, ContextEnumerator};
pub use crate::error::{JstError, Result};
pub use crate::event::{Event, EventId, EventKind, EventStore};
pub use crate::journal::{Breakend, InlineJournal, JournalRecord};
pub use crate::journaled::{Bytes, JournaledSequence};
pub use crate::pipeline::{Layer, PipelineConfig, PipelinedTree};
pub use crate::slice::{Breakpoint, SliceOrigin, SliceRef};
pub use crate::traverse::{Anchor, Cargo, Coordinate, TreeTraverser};
pub use crate::tree::JournaledTree;

//! Journaled sequence tree: a reference plus a validated shared event
//! store, queried lazily.
//!
//! The tree borrows the reference bytes for its whole lifetime and
//! never materialises sample sequences on its own; `sequence_at`
//! replays a sample's events through an inline journal on demand.

use rayon::prelude::*;

use crate::coverage::{Coverage, SampleId};
use crate::enumerate::ContextEnumerator;
use crate::error::Result;
use crate::event::{Event, EventKind, EventStore};
use crate::journaled::JournaledSequence;
use crate::pipeline::{PipelineConfig, PipelinedTree};
use crate::traverse::{Anchor, Coordinate};

/// Reference + shared events over a fixed sample domain.
#[derive(Debug)]
pub struct JournaledTree<'r> {
    reference: &'r [u8],
    store: EventStore,
}

impl<'r> JournaledTree<'r> {
    /// Build a tree over `reference` for `samples` samples.
    ///
    /// Sorts and validates the event list; see
    /// [`EventStore::new`] for the rejection rules.
    pub fn build(reference: &'r [u8], events: Vec<Event>, samples: usize) -> Result<Self> {
        let store = EventStore::new(events, samples, reference.len())?;
        Ok(JournaledTree { reference, store })
    }

    #[inline]
    pub fn reference(&self) -> &'r [u8] {
        self.reference
    }

    #[inline]
    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Number of samples in the domain.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.store.domain()
    }

    /// Coverage containing every sample.
    #[inline]
    pub fn full_coverage(&self) -> Coverage {
        Coverage::all(self.store.domain())
    }

    // ----- Sample materialisation -----

    /// The sample's sequence as a journaled sequence over the
    /// reference: every carried event replayed through the journal in
    /// event order, with positions rebased by the running shift.
    pub fn journaled_sequence_at(&self, sample: SampleId) -> Result<JournaledSequence> {
        let mut seq = JournaledSequence::from_source(self.reference.to_vec());
        let mut shift = 0isize;
        for (_, event) in self.store.carried_by(sample) {
            let at = (event.position() as isize + shift) as usize;
            match event.kind() {
                EventKind::Insertion(payload) => {
                    seq.insert(at, payload)?;
                }
                EventKind::Deletion(len) => {
                    seq.erase(at, at + len)?;
                }
                EventKind::Substitution(payload) => {
                    seq.replace(at, at + payload.len(), payload)?;
                }
            }
            shift += event.shift();
        }
        Ok(seq)
    }

    /// The sample's sequence as plain bytes.
    pub fn sequence_at(&self, sample: SampleId) -> Result<Vec<u8>> {
        Ok(self.journaled_sequence_at(sample)?.to_vec())
    }

    /// All sample sequences, materialised in parallel.
    pub fn sequences(&self) -> Result<Vec<Vec<u8>>> {
        (0..self.store.domain() as SampleId)
            .into_par_iter()
            .map(|s| self.sequence_at(s))
            .collect()
    }

    // ----- Traversal -----

    /// The tree wrapped in the standard adapter pipeline for windows
    /// of `window` characters.
    pub fn with_pipeline(&self, window: usize) -> PipelinedTree<'_, 'r> {
        PipelinedTree::new(self, PipelineConfig::standard(window))
    }

    /// Like [`Self::with_pipeline`], with an explicit layer set.
    pub fn with_config(&self, config: PipelineConfig) -> PipelinedTree<'_, 'r> {
        PipelinedTree::new(self, config)
    }

    /// Enumerator over every distinct length-`window` context present
    /// in at least one sample.
    pub fn context_enumerator(&self, window: usize) -> ContextEnumerator<'_, 'r> {
        ContextEnumerator::new(self.with_pipeline(window))
    }

    // ----- Coordinate resolution (seek) -----

    /// Resolve a coordinate into `(sample, offset)` pairs: for every
    /// covered sample, the position of the coordinate's anchor within
    /// that sample's derived sequence.
    ///
    /// Returns an empty list for coordinates produced without the
    /// seek layer.
    pub fn sequence_positions_at(&self, coordinate: &Coordinate) -> Vec<(SampleId, usize)> {
        let Some(anchor) = coordinate.anchor() else {
            return Vec::new();
        };
        coordinate
            .coverage()
            .iter()
            .map(|sample| {
                let pos = match anchor {
                    Anchor::Reference(r) => r as isize + self.store.sample_shift_at(sample, r),
                    Anchor::Payload { event, offset } => {
                        let ev = self.store.get(event);
                        ev.position() as isize
                            + self.store.sample_shift_excluding(sample, ev.position(), event)
                            + offset as isize
                    }
                };
                debug_assert!(pos >= 0, "coordinate resolved to a negative offset");
                (sample, pos as usize)
            })
            .collect()
    }
}

//! Shared event store: substitutions, insertions and deletions on the
//! reference, each annotated with the coverage of samples carrying it.
//!
//! Events are sorted by reference position; ties are broken by kind
//! (insertion before deletion before substitution), so an insertion at
//! position `p` logically occurs between reference positions `p-1`
//! and `p` and before any span-consuming event at `p`. The store is
//! immutable after validation.

use crate::coverage::{Coverage, CoverageSet, SampleId};
use crate::error::{JstError, Result};
use crate::slice::Breakpoint;

/// Stable event identity: index into the sorted store.
pub type EventId = u32;

/// The three shared edit kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Replaces a same-length reference span with the payload.
    Substitution(Vec<u8>),
    /// Inserts the payload between two reference positions.
    Insertion(Vec<u8>),
    /// Removes `len` reference positions.
    Deletion(usize),
}

impl EventKind {
    /// Tie-break rank at equal positions: ins < del < sub.
    #[inline]
    fn rank(&self) -> u8 {
        match self {
            EventKind::Insertion(_) => 0,
            EventKind::Deletion(_) => 1,
            EventKind::Substitution(_) => 2,
        }
    }
}

/// A shared edit on the reference.
#[derive(Clone, Debug)]
pub struct Event {
    position: usize,
    kind: EventKind,
    coverage: Coverage,
}

impl Event {
    pub fn new(position: usize, kind: EventKind, coverage: Coverage) -> Self {
        Event {
            position,
            kind,
            coverage,
        }
    }

    /// Reference position the event applies at.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    #[inline]
    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    /// Number of reference positions consumed.
    #[inline]
    pub fn span(&self) -> usize {
        match &self.kind {
            EventKind::Substitution(payload) => payload.len(),
            EventKind::Insertion(_) => 0,
            EventKind::Deletion(len) => *len,
        }
    }

    /// One past the last consumed reference position.
    #[inline]
    pub fn end(&self) -> usize {
        self.position + self.span()
    }

    /// Consumed reference interval as a breakpoint.
    #[inline]
    pub fn breakpoint(&self) -> Breakpoint {
        Breakpoint::unchecked(self.position, self.end())
    }

    /// Alternate bytes the event contributes (empty for deletions).
    #[inline]
    pub fn alt(&self) -> &[u8] {
        match &self.kind {
            EventKind::Substitution(payload) | EventKind::Insertion(payload) => payload,
            EventKind::Deletion(_) => &[],
        }
    }

    /// Length change a carrying sample experiences.
    #[inline]
    pub fn shift(&self) -> isize {
        self.alt().len() as isize - self.span() as isize
    }

    #[inline]
    pub fn is_insertion(&self) -> bool {
        matches!(self.kind, EventKind::Insertion(_))
    }

    #[inline]
    pub fn is_deletion(&self) -> bool {
        matches!(self.kind, EventKind::Deletion(_))
    }
}

/// Sorted, validated event collection over a fixed sample domain.
#[derive(Clone, Debug)]
pub struct EventStore {
    events: Vec<Event>,
    domain: usize,
}

impl EventStore {
    /// Sort and validate `events` against a reference of `ref_len`
    /// bytes and a domain of `domain` samples.
    ///
    /// Rejected inputs: empty coverages, zero-length payloads or
    /// deletions, spans past the reference end, and conflicting event
    /// pairs with intersecting coverage (overlapping spans, an
    /// insertion strictly inside a consuming span, or two insertions
    /// at one position).
    pub fn new(mut events: Vec<Event>, domain: usize, ref_len: usize) -> Result<Self> {
        for event in &events {
            assert!(
                event.coverage.domain() == domain,
                "event coverage domain {} does not match sample count {}",
                event.coverage.domain(),
                domain
            );
            if event.coverage.is_empty() {
                return Err(JstError::EmptyCoverage(event.position));
            }
            let malformed = match &event.kind {
                EventKind::Substitution(p) | EventKind::Insertion(p) => p.is_empty(),
                EventKind::Deletion(len) => *len == 0,
            };
            if malformed {
                return Err(JstError::InvalidEventSet(event.position, event.position));
            }
            if event.end() > ref_len {
                return Err(JstError::OutOfRange {
                    position: event.end(),
                    size: ref_len,
                });
            }
        }

        events.sort_by_key(|e| (e.position, e.kind.rank()));

        let store = EventStore { events, domain };
        store.check_conflicts()?;
        Ok(store)
    }

    fn check_conflicts(&self) -> Result<()> {
        for i in 0..self.events.len() {
            let a = &self.events[i];
            for b in self.events[i + 1..].iter() {
                if b.position > a.end() {
                    break;
                }
                if !a.coverage.intersects(&b.coverage) {
                    continue;
                }
                let span_overlap = a.breakpoint().overlaps(&b.breakpoint());
                let ins_inside = b.is_insertion()
                    && b.position > a.position
                    && a.breakpoint().covers(b.position);
                let twin_insertions =
                    a.is_insertion() && b.is_insertion() && a.position == b.position;
                if span_overlap || ins_inside || twin_insertions {
                    return Err(JstError::InvalidEventSet(a.position, b.position));
                }
            }
        }
        Ok(())
    }

    /// Number of samples in the domain.
    #[inline]
    pub fn domain(&self) -> usize {
        self.domain
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    pub fn get(&self, id: EventId) -> &Event {
        &self.events[id as usize]
    }

    /// Events in sorted order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (EventId, &Event)> {
        self.events.iter().enumerate().map(|(i, e)| (i as EventId, e))
    }

    /// Id of the first event with `position >= pos`.
    pub fn first_at_or_after(&self, pos: usize) -> EventId {
        let mut lo = 0usize;
        let mut hi = self.events.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.events[mid].position < pos {
                lo = mid + 1
            } else {
                hi = mid
            }
        }
        lo as EventId
    }

    /// Events carried by `sample`, in sorted order.
    pub fn carried_by(&self, sample: SampleId) -> impl Iterator<Item = (EventId, &Event)> {
        self.iter()
            .filter(move |(_, e)| e.coverage.contains(sample))
    }

    // ----- Position shifts (seek support) -----

    /// Net length shift `sample` accumulates strictly left of
    /// `ref_pos`: insertions at or before it, deletions ending at or
    /// before it.
    ///
    /// Well defined only when no carried span straddles `ref_pos`;
    /// the traversal guarantees that for every resolved coordinate.
    pub fn sample_shift_at(&self, sample: SampleId, ref_pos: usize) -> isize {
        self.sample_shift_excluding(sample, ref_pos, EventId::MAX)
    }

    /// Same as [`Self::sample_shift_at`], ignoring event `exclude`
    /// (used when the anchor sits inside that event's own payload).
    pub fn sample_shift_excluding(
        &self,
        sample: SampleId,
        ref_pos: usize,
        exclude: EventId,
    ) -> isize {
        let mut shift = 0isize;
        for (id, event) in self.iter() {
            if event.position > ref_pos {
                break;
            }
            if id == exclude || !event.coverage.contains(sample) {
                continue;
            }
            match &event.kind {
                EventKind::Insertion(payload) => shift += payload.len() as isize,
                EventKind::Deletion(len) => {
                    if event.end() <= ref_pos {
                        shift -= *len as isize;
                    }
                }
                EventKind::Substitution(_) => {}
            }
        }
        shift
    }
}

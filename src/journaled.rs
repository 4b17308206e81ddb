//! Journaled sequence: a random-access sequence façade over an
//! [`InlineJournal`].
//!
//! The sequence owns its source bytes (never mutated) and an
//! append-only scratch pool holding every literal ever recorded.
//! `insert` / `erase` / `replace` translate positions into journal
//! breakpoints; all three invalidate outstanding positions and
//! iterators, so callers re-acquire them after each edit.

use crate::error::{JstError, Result};
use crate::journal::{InlineJournal, JournalRecord};
use crate::slice::{Breakpoint, SliceRef};

/// A sequence represented as a source plus an inline journal of
/// recorded edits.
#[derive(Clone, Debug)]
pub struct JournaledSequence {
    source: Vec<u8>,
    scratch: Vec<u8>,
    journal: InlineJournal,
}

impl JournaledSequence {
    /// Empty sequence over an empty source.
    pub fn new() -> Self {
        JournaledSequence::from_source(Vec::new())
    }

    /// Sequence initially spelling `source`.
    pub fn from_source(source: Vec<u8>) -> Self {
        let journal = InlineJournal::new(source.len());
        JournaledSequence {
            source,
            scratch: Vec::new(),
            journal,
        }
    }

    /// The unmodified source bytes.
    #[inline]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Current length of the derived sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.journal.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The underlying journal.
    #[inline]
    pub fn journal(&self) -> &InlineJournal {
        &self.journal
    }

    /// Byte at `pos`, if in range.
    pub fn get(&self, pos: usize) -> Option<u8> {
        if pos >= self.len() {
            return None;
        }
        let rec = &self.journal.records()[self.journal.find(pos)];
        let bytes = rec.slice().resolve(&self.source, &self.scratch);
        Some(bytes[pos - rec.position()])
    }

    /// Resolve a record's slice against the owned pools.
    #[inline]
    pub fn bytes_of(&self, record: &JournalRecord) -> &[u8] {
        record.slice().resolve(&self.source, &self.scratch)
    }

    // ----- Modifiers -----

    /// Insert `seq` before position `at`; returns the position of the
    /// first inserted byte (`at`).
    pub fn insert(&mut self, at: usize, seq: &[u8]) -> Result<usize> {
        self.splice(Breakpoint::point(at), seq)
    }

    /// Erase `[from, to)`; returns the position of the first byte
    /// after the erased span (`from`).
    pub fn erase(&mut self, from: usize, to: usize) -> Result<usize> {
        self.splice(Breakpoint::new(from, to)?, &[])
    }

    /// Erase the single byte at `at`.
    pub fn erase_at(&mut self, at: usize) -> Result<usize> {
        if at >= self.len() {
            return Err(JstError::OutOfRange {
                position: at,
                size: self.len(),
            });
        }
        self.splice(Breakpoint::new(at, at + 1)?, &[])
    }

    /// Replace `[from, to)` with `seq`; returns `from`.
    pub fn replace(&mut self, from: usize, to: usize, seq: &[u8]) -> Result<usize> {
        self.splice(Breakpoint::new(from, to)?, seq)
    }

    /// Drop every edit; the sequence spells the source again.
    ///
    /// Invalidates outstanding positions like any other mutation.
    pub fn clear(&mut self) {
        self.scratch.clear();
        self.journal.clear();
    }

    fn splice(&mut self, span: Breakpoint, seq: &[u8]) -> Result<usize> {
        let low = self.journal.breakend_at(span.low())?;
        let high = self.journal.breakend_at(span.high())?;
        let slice = if seq.is_empty() {
            SliceRef::empty()
        } else {
            let start = self.scratch.len();
            self.scratch.extend_from_slice(seq);
            SliceRef::scratch(start, self.scratch.len())
        };
        let out = self.journal.record(low, high, slice)?;
        self.journal.position_of(&out)
    }

    // ----- Iteration -----

    /// Random-access byte iterator over the derived sequence.
    pub fn iter(&self) -> Bytes<'_> {
        Bytes {
            seq: self,
            front: 0,
            back: self.len(),
            front_rec: 0,
            back_rec: self.journal.len().saturating_sub(1),
        }
    }

    /// Materialise the derived sequence.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for rec in self.journal.records() {
            out.extend_from_slice(self.bytes_of(rec));
        }
        out
    }
}

impl Default for JournaledSequence {
    fn default() -> Self {
        JournaledSequence::new()
    }
}

impl From<&[u8]> for JournaledSequence {
    fn from(source: &[u8]) -> Self {
        JournaledSequence::from_source(source.to_vec())
    }
}

impl From<Vec<u8>> for JournaledSequence {
    fn from(source: Vec<u8>) -> Self {
        JournaledSequence::from_source(source)
    }
}

/// Double-ended byte iterator; O(1) amortised per step.
pub struct Bytes<'a> {
    seq: &'a JournaledSequence,
    front: usize,
    back: usize,
    front_rec: usize,
    back_rec: usize,
}

impl Iterator for Bytes<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.front >= self.back {
            return None;
        }
        let recs = self.seq.journal.records();
        while self.front >= recs[self.front_rec].position() + recs[self.front_rec].slice().len() {
            self.front_rec += 1;
        }
        let rec = &recs[self.front_rec];
        let byte = self.seq.bytes_of(rec)[self.front - rec.position()];
        self.front += 1;
        Some(byte)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl DoubleEndedIterator for Bytes<'_> {
    fn next_back(&mut self) -> Option<u8> {
        if self.back <= self.front {
            return None;
        }
        self.back -= 1;
        let recs = self.seq.journal.records();
        while recs[self.back_rec].position() > self.back {
            self.back_rec -= 1;
        }
        let rec = &recs[self.back_rec];
        Some(self.seq.bytes_of(rec)[self.back - rec.position()])
    }
}

impl ExactSizeIterator for Bytes<'_> {}

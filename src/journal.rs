//! Inline sequence journal: a sorted vector of records partitioning a
//! derived sequence into non-overlapping slices.
//!
//! Records are updated inline: recording a new slice rewrites the
//! neighbouring records and rebases the positions of every successor,
//! so the journal always describes the current state of the derived
//! sequence only. A zero-length sentinel record sits at `size()`; it
//! is never removed and keeps end handles stable across edits.
//!
//! Invariants (checked after every mutation in debug builds):
//! - the first record starts at position 0;
//! - adjacent records are contiguous: `r.position + r.len == r'.position`;
//! - the sentinel is empty and positioned at `size()`.

use crate::error::{JstError, Result};
use crate::slice::SliceRef;

/// One journal entry: a slice and its begin position in the derived
/// sequence. The position doubles as the sort key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JournalRecord {
    position: usize,
    slice: SliceRef,
}

impl JournalRecord {
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn slice(&self) -> SliceRef {
        self.slice
    }

    #[inline]
    fn len(&self) -> usize {
        self.slice.len()
    }

    /// Split into `[..offset)` and `[offset..)` records.
    fn split(&self, offset: usize) -> (JournalRecord, JournalRecord) {
        let (head, tail) = self.slice.split(offset);
        (
            JournalRecord {
                position: self.position,
                slice: head,
            },
            JournalRecord {
                position: self.position + offset,
                slice: tail,
            },
        )
    }
}

/// A position inside the journal: `(record index, offset in slice)`,
/// stamped with the journal generation that issued it.
///
/// Converts to a global derived-sequence position via
/// [`InlineJournal::position_of`]. Any journal mutation invalidates
/// outstanding breakends; using a stale one fails with
/// [`JstError::JournalMutated`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Breakend {
    record: usize,
    offset: usize,
    generation: u64,
}

impl Breakend {
    #[inline]
    pub fn record_index(&self) -> usize {
        self.record
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// The journal proper. Owns no bytes: slices index the pools held by
/// the surrounding journaled sequence.
#[derive(Clone, Debug)]
pub struct InlineJournal {
    records: Vec<JournalRecord>,
    generation: u64,
    source_len: usize,
}

impl InlineJournal {
    /// Journal over a source of `source_len` bytes: one record
    /// covering the whole source (if any), plus the sentinel.
    pub fn new(source_len: usize) -> Self {
        let mut journal = InlineJournal {
            records: Vec::with_capacity(2),
            generation: 0,
            source_len,
        };
        journal.initialize();
        journal
    }

    fn initialize(&mut self) {
        if self.source_len > 0 {
            self.records.push(JournalRecord {
                position: 0,
                slice: SliceRef::source(0, self.source_len),
            });
        }
        self.records.push(JournalRecord {
            position: self.source_len,
            slice: SliceRef::empty(),
        });
    }

    /// Length of the derived sequence.
    #[inline]
    pub fn size(&self) -> usize {
        self.records[self.records.len() - 1].position
    }

    /// Number of records, excluding the sentinel.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Records in position order, excluding the sentinel.
    #[inline]
    pub fn records(&self) -> &[JournalRecord] {
        &self.records[..self.records.len() - 1]
    }

    /// The sentinel record: empty, positioned at `size()`.
    #[inline]
    pub fn sentinel(&self) -> &JournalRecord {
        &self.records[self.records.len() - 1]
    }

    /// Mutation counter; bumps on every successful `record`.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ----- Lookup -----

    /// Index of the first non-sentinel record with `position >= key`.
    pub fn lower_bound(&self, key: usize) -> usize {
        let recs = self.records();
        let mut lo = 0usize;
        let mut hi = recs.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            if recs[mid].position < key {
                lo = mid + 1
            } else {
                hi = mid
            }
        }
        lo
    }

    /// Index of the first non-sentinel record with `position > key`.
    pub fn upper_bound(&self, key: usize) -> usize {
        let recs = self.records();
        let mut lo = 0usize;
        let mut hi = recs.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            if recs[mid].position <= key {
                lo = mid + 1
            } else {
                hi = mid
            }
        }
        lo
    }

    /// Index of the record containing `key`: the last record with
    /// `position <= key`. `key == size()` maps to the sentinel.
    pub fn find(&self, key: usize) -> usize {
        if key >= self.size() {
            return self.records.len() - 1;
        }
        self.upper_bound(key) - 1
    }

    /// Breakend at global derived position `pos` (`0..=size()`).
    pub fn breakend_at(&self, pos: usize) -> Result<Breakend> {
        if pos > self.size() {
            return Err(JstError::OutOfRange {
                position: pos,
                size: self.size(),
            });
        }
        let record = self.find(pos);
        Ok(Breakend {
            record,
            offset: pos - self.records[record].position,
            generation: self.generation,
        })
    }

    /// Global derived position of a breakend.
    pub fn position_of(&self, breakend: &Breakend) -> Result<usize> {
        self.check_breakend(breakend)?;
        Ok(self.records[breakend.record].position + breakend.offset)
    }

    fn check_breakend(&self, breakend: &Breakend) -> Result<()> {
        if breakend.generation != self.generation {
            return Err(JstError::JournalMutated {
                held: breakend.generation,
                current: self.generation,
            });
        }
        if breakend.record >= self.records.len() {
            return Err(JstError::InvalidBreakend(format!(
                "record index {} out of {}",
                breakend.record,
                self.records.len()
            )));
        }
        if breakend.offset > self.records[breakend.record].len() {
            return Err(JstError::InvalidBreakend(format!(
                "offset {} past record of length {}",
                breakend.offset,
                self.records[breakend.record].len()
            )));
        }
        Ok(())
    }

    // ----- Modification -----

    /// Record `new_seq` inline over the span `[low, high)`, replacing
    /// whatever the journal currently holds there.
    ///
    /// Splits the record containing each end, drops the records
    /// strictly between them, overwrites the high record with its own
    /// suffix (keeping the sentinel's identity for end edits), slots
    /// in the surviving low prefix plus the new slice, and rebases
    /// every successor by `new_seq.len() - (high - low)`.
    ///
    /// Returns a breakend at the first inserted record, or at the
    /// high suffix when `new_seq` is empty.
    pub fn record(&mut self, low: Breakend, high: Breakend, new_seq: SliceRef) -> Result<Breakend> {
        self.check_breakend(&low)?;
        self.check_breakend(&high)?;
        let low_pos = self.records[low.record].position + low.offset;
        let high_pos = self.records[high.record].position + high.offset;
        if low_pos > high_pos {
            return Err(JstError::InvalidBreakend(format!(
                "ends out of order: {low_pos} > {high_pos}"
            )));
        }

        let deletion = high_pos - low_pos;
        let insertion = new_seq.len();

        let (low_prefix, low_suffix) = self.records[low.record].split(low.offset);
        let (_, high_suffix) = self.records[high.record].split(high.offset);

        self.records[high.record] = high_suffix;

        let mut pending = [JournalRecord {
            position: 0,
            slice: SliceRef::empty(),
        }; 2];
        let mut marked = 0usize;
        if !low_prefix.slice.is_empty() {
            pending[marked] = low_prefix;
            marked += 1;
        }
        if insertion > 0 {
            pending[marked] = JournalRecord {
                position: low_suffix.position,
                slice: new_seq,
            };
            marked += 1;
        }

        self.records.drain(low.record..high.record);
        let insert_at = low.record;
        for (k, rec) in pending[..marked].iter().enumerate() {
            self.records.insert(insert_at + k, *rec);
        }

        // Rebase everything from the high suffix onward.
        let offset = insertion as isize - deletion as isize;
        if offset != 0 {
            for rec in &mut self.records[insert_at + marked..] {
                rec.position = (rec.position as isize + offset) as usize;
            }
        }

        self.generation += 1;
        debug_assert!(self.check_invariants(), "journal invariants violated");

        let target = insert_at + marked - usize::from(insertion > 0);
        Ok(Breakend {
            record: target,
            offset: 0,
            generation: self.generation,
        })
    }

    /// Drop every recorded edit and reinitialise over the source
    /// span. Bumps the generation, so outstanding breakends fail
    /// with [`JstError::JournalMutated`].
    pub fn clear(&mut self) {
        self.records.clear();
        self.initialize();
        self.generation += 1;
    }

    // ----- Sanity -----

    fn check_invariants(&self) -> bool {
        if self.records.is_empty() || self.records[0].position != 0 {
            return false;
        }
        for pair in self.records.windows(2) {
            if pair[0].position + pair[0].len() != pair[1].position {
                return false;
            }
        }
        self.sentinel().slice.is_empty()
    }
}

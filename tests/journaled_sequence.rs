//! Journaled sequence editing scenarios: construction, the three
//! mutators, iteration, and the journal invariants after every edit.

use journaled_seq_tree::{
    Breakpoint, InlineJournal, JournaledSequence, JstError, SliceOrigin, SliceRef,
};

/// Adjacent records contiguous, first at 0, sentinel at size.
fn assert_journal_sound(seq: &JournaledSequence) {
    let journal = seq.journal();
    let mut expected = 0usize;
    for rec in journal.records() {
        assert_eq!(rec.position(), expected, "record out of place");
        expected += rec.slice().len();
    }
    assert_eq!(journal.sentinel().position(), journal.size());
    assert_eq!(journal.sentinel().slice().len(), 0);
    assert_eq!(journal.size(), seq.len());
}

#[test]
fn default_initialized_sequence_is_empty() {
    let seq = JournaledSequence::new();
    assert!(seq.is_empty());
    assert_eq!(seq.len(), 0);
    assert_journal_sound(&seq);
}

#[test]
fn insert_into_empty_sequence() {
    let mut seq = JournaledSequence::new();
    let at = seq.insert(0, b"ACGT").unwrap();
    assert_eq!(at, 0);
    assert!(!seq.is_empty());
    assert_eq!(seq.to_vec(), b"ACGT");
    assert_journal_sound(&seq);
}

#[test]
fn erase_nothing_from_empty_sequence() {
    let mut seq = JournaledSequence::new();
    let at = seq.erase(0, 0).unwrap();
    assert_eq!(at, 0);
    assert!(seq.is_empty());
    assert_journal_sound(&seq);
}

#[test]
fn insert_in_the_middle() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    let at = seq.insert(2, b"TGCA").unwrap();
    assert_eq!(at, 2);
    assert_eq!(seq.to_vec(), b"ACTGCAGT");
    assert_eq!(seq.len(), 8);
    assert_eq!(seq.source(), b"ACGT");
    assert_journal_sound(&seq);
}

#[test]
fn insert_at_the_beginning() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    let at = seq.insert(0, b"TGCA").unwrap();
    assert_eq!(at, 0);
    assert_eq!(seq.to_vec(), b"TGCAACGT");
    assert_eq!(seq.source(), b"ACGT");
    assert_journal_sound(&seq);
}

#[test]
fn insert_at_the_end() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    let at = seq.insert(4, b"TGCA").unwrap();
    assert_eq!(at, 4);
    assert_eq!(seq.to_vec(), b"ACGTTGCA");
    assert_eq!(seq.source(), b"ACGT");
    assert_journal_sound(&seq);
}

#[test]
fn erase_single_element() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    let at = seq.erase_at(2).unwrap();
    assert_eq!(at, 2);
    assert_eq!(seq.to_vec(), b"ACT");
    assert_eq!(seq.source(), b"ACGT");
    assert_journal_sound(&seq);
}

#[test]
fn erase_a_range() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    let at = seq.erase(1, 3).unwrap();
    assert_eq!(at, 1);
    assert_eq!(seq.to_vec(), b"AT");
    assert_eq!(seq.source(), b"ACGT");
    assert_journal_sound(&seq);
}

#[test]
fn replace_everything() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    seq.replace(0, 4, b"TGCA").unwrap();
    assert_eq!(seq.to_vec(), b"TGCA");
    assert_eq!(seq.source(), b"ACGT");
    assert_journal_sound(&seq);
}

#[test]
fn replace_a_segment() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    let at = seq.replace(1, 3, b"TGCA").unwrap();
    assert_eq!(at, 1);
    assert_eq!(seq.to_vec(), b"ATGCAT");
    assert_eq!(seq.source(), b"ACGT");
    assert_journal_sound(&seq);
}

#[test]
fn two_substitutions_via_replace() {
    let mut seq = JournaledSequence::from(&b"AAAAGGGG"[..]);
    seq.replace(4, 5, b"C").unwrap();
    seq.replace(6, 7, b"C").unwrap();
    assert_eq!(seq.to_vec(), b"AAAACGCG");
    assert_journal_sound(&seq);
}

#[test]
fn iteration_forward_and_backward() {
    let seq = JournaledSequence::from(&b"ACGT"[..]);
    let forward: Vec<u8> = seq.iter().collect();
    assert_eq!(forward, b"ACGT");
    let backward: Vec<u8> = seq.iter().rev().collect();
    assert_eq!(backward, b"TGCA");
    assert_eq!(seq.iter().len(), 4);
}

#[test]
fn iteration_after_edits() {
    let mut seq = JournaledSequence::from(&b"AAAAGGGG"[..]);
    seq.replace(4, 5, b"C").unwrap();
    seq.replace(6, 7, b"C").unwrap();
    let collected: Vec<u8> = seq.iter().collect();
    assert_eq!(collected, b"AAAACGCG");
    let reversed: Vec<u8> = seq.iter().rev().collect();
    assert_eq!(reversed, b"GCGCAAAA");
}

#[test]
fn random_access_after_edits() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    seq.insert(2, b"TGCA").unwrap();
    let expected = b"ACTGCAGT";
    for (i, &b) in expected.iter().enumerate() {
        assert_eq!(seq.get(i), Some(b));
    }
    assert_eq!(seq.get(8), None);
}

#[test]
fn edits_stack_up() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    seq.insert(2, b"TT").unwrap(); // ACTTGT
    assert_eq!(seq.to_vec(), b"ACTTGT");
    assert_journal_sound(&seq);
    seq.erase(1, 4).unwrap(); // AGT
    assert_eq!(seq.to_vec(), b"AGT");
    assert_journal_sound(&seq);
    seq.replace(0, 2, b"CCC").unwrap(); // CCCT
    assert_eq!(seq.to_vec(), b"CCCT");
    assert_journal_sound(&seq);
    assert_eq!(seq.source(), b"ACGT");
}

#[test]
fn reversed_ranges_are_rejected() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    assert!(matches!(
        seq.erase(3, 1),
        Err(JstError::InvalidBreakend(_))
    ));
    assert!(matches!(
        seq.replace(3, 1, b"A"),
        Err(JstError::InvalidBreakend(_))
    ));
    assert_eq!(seq.to_vec(), b"ACGT");
}

#[test]
fn clearing_restores_the_source() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    seq.insert(2, b"TT").unwrap();
    seq.replace(0, 1, b"G").unwrap();
    assert_eq!(seq.to_vec(), b"GCTTGT");

    let stale = seq.journal().breakend_at(1).unwrap();
    seq.clear();
    assert_eq!(seq.to_vec(), b"ACGT");
    assert_eq!(seq.len(), 4);
    assert_eq!(seq.source(), b"ACGT");
    assert_journal_sound(&seq);
    // Clearing is a mutation like any other.
    assert!(matches!(
        seq.journal().position_of(&stale),
        Err(JstError::JournalMutated { .. })
    ));

    seq.insert(4, b"AA").unwrap();
    assert_eq!(seq.to_vec(), b"ACGTAA");
    assert_journal_sound(&seq);
}

#[test]
fn journal_clear_invalidates_handles() {
    let mut journal = InlineJournal::new(8);
    let low = journal.breakend_at(2).unwrap();
    let high = journal.breakend_at(5).unwrap();
    let out = journal.record(low, high, SliceRef::source(0, 1)).unwrap();
    assert_eq!(journal.size(), 6);

    journal.clear();
    assert_eq!(journal.size(), 8);
    assert_eq!(journal.len(), 1);
    assert!(matches!(
        journal.position_of(&out),
        Err(JstError::JournalMutated { .. })
    ));

    // A fresh breakpoint works against the reinitialised journal.
    let low = journal.breakend_at(0).unwrap();
    let high = journal.breakend_at(8).unwrap();
    let end = journal.record(low, high, SliceRef::empty()).unwrap();
    assert_eq!(journal.position_of(&end).unwrap(), 0);
    assert_eq!(journal.size(), 0);
}

#[test]
fn out_of_range_edits_are_rejected() {
    let mut seq = JournaledSequence::from(&b"ACGT"[..]);
    assert!(matches!(
        seq.insert(5, b"A"),
        Err(JstError::OutOfRange { .. })
    ));
    assert!(matches!(
        seq.erase(2, 9),
        Err(JstError::OutOfRange { .. })
    ));
    assert!(matches!(
        seq.erase_at(4),
        Err(JstError::OutOfRange { .. })
    ));
    // Failed edits leave the sequence untouched.
    assert_eq!(seq.to_vec(), b"ACGT");
}

// ----- Breakpoint primitives -----

#[test]
fn breakpoint_semantics() {
    let span = Breakpoint::new(2, 5).unwrap();
    assert_eq!(span.low(), 2);
    assert_eq!(span.high(), 5);
    assert_eq!(span.span(), 3);
    assert!(!span.is_empty());
    assert!(span.covers(2));
    assert!(span.covers(4));
    assert!(!span.covers(5));
    assert!(!span.covers(1));

    let point = Breakpoint::point(3);
    assert!(point.is_empty());
    assert_eq!(point.span(), 0);

    // Half-open overlap; empty intervals never overlap anything.
    assert!(span.overlaps(&Breakpoint::new(4, 6).unwrap()));
    assert!(!span.overlaps(&Breakpoint::new(5, 7).unwrap()));
    assert!(!span.overlaps(&point));

    assert!(matches!(
        Breakpoint::new(5, 3),
        Err(JstError::InvalidBreakend(_))
    ));
}

// ----- Journal-level API -----

#[test]
fn journal_lookup_bounds() {
    let mut seq = JournaledSequence::from(&b"AAAAGGGG"[..]);
    seq.replace(4, 5, b"C").unwrap();
    // Records now partition [0,8) as [0,4), [4,5), [5,8).
    let journal = seq.journal();
    assert_eq!(journal.len(), 3);
    let recs = journal.records();
    assert_eq!(recs[0].slice().origin(), SliceOrigin::Source);
    assert_eq!((recs[0].slice().start(), recs[0].slice().end()), (0, 4));
    assert_eq!(recs[1].slice().origin(), SliceOrigin::Scratch);
    assert_eq!(recs[1].slice().len(), 1);
    assert_eq!(recs[2].slice().origin(), SliceOrigin::Source);
    assert_eq!((recs[2].slice().start(), recs[2].slice().end()), (5, 8));
    assert_eq!(journal.lower_bound(0), 0);
    assert_eq!(journal.lower_bound(4), 1);
    assert_eq!(journal.lower_bound(3), 1);
    assert_eq!(journal.upper_bound(4), 2);
    assert_eq!(journal.find(0), 0);
    assert_eq!(journal.find(3), 0);
    assert_eq!(journal.find(4), 1);
    assert_eq!(journal.find(7), 2);
}

#[test]
fn journal_record_returns_breakend_at_new_slice() {
    let mut journal = InlineJournal::new(8);
    let low = journal.breakend_at(2).unwrap();
    let high = journal.breakend_at(5).unwrap();
    let out = journal.record(low, high, SliceRef::source(0, 2)).unwrap();
    assert_eq!(journal.position_of(&out).unwrap(), 2);
    assert_eq!(journal.size(), 7);
}

#[test]
fn stale_breakend_is_detected() {
    let mut journal = InlineJournal::new(8);
    let low = journal.breakend_at(2).unwrap();
    let high = journal.breakend_at(5).unwrap();
    journal
        .record(low, high, SliceRef::source(0, 1))
        .unwrap();
    // Handles from before the mutation no longer apply.
    assert!(matches!(
        journal.record(low, high, SliceRef::source(0, 1)),
        Err(JstError::JournalMutated { .. })
    ));
    assert!(matches!(
        journal.position_of(&low),
        Err(JstError::JournalMutated { .. })
    ));
}

#[test]
fn breakend_past_the_end_is_rejected() {
    let journal = InlineJournal::new(4);
    assert!(matches!(
        journal.breakend_at(5),
        Err(JstError::OutOfRange { .. })
    ));
    assert!(journal.breakend_at(4).is_ok());
}

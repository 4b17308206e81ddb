//! Property tests: the journaled sequence against a plain vector
//! model under random edit scripts, coverage algebra against a set
//! model, and enumeration against a naive splice oracle over random
//! valid event sets.

use std::collections::HashSet;

use journaled_seq_tree::{
    Coverage, CoverageSet, Event, EventKind, JournaledSequence, JournaledTree,
};
use proptest::prelude::*;

fn clamp_range(a: usize, b: usize, len: usize) -> (usize, usize) {
    let from = if len == 0 { 0 } else { a % (len + 1) };
    let to = if len == 0 { 0 } else { b % (len + 1) };
    (from.min(to), from.max(to))
}

fn assert_journal_sound(seq: &JournaledSequence) -> Result<(), TestCaseError> {
    let journal = seq.journal();
    let mut expected = 0usize;
    for rec in journal.records() {
        prop_assert_eq!(rec.position(), expected);
        expected += rec.slice().len();
    }
    prop_assert_eq!(journal.sentinel().position(), journal.size());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn journaled_sequence_matches_vector_model(
        source in prop::collection::vec(prop::sample::select(b"acgt".to_vec()), 0..24),
        ops in prop::collection::vec(
            (
                0u8..3,
                any::<usize>(),
                any::<usize>(),
                prop::collection::vec(prop::sample::select(b"acgt".to_vec()), 1..6),
            ),
            0..12,
        ),
    ) {
        let mut model = source.clone();
        let mut seq = JournaledSequence::from_source(source);
        for (kind, a, b, payload) in ops {
            let len = model.len();
            match kind {
                0 => {
                    let at = if len == 0 { 0 } else { a % (len + 1) };
                    seq.insert(at, &payload).unwrap();
                    model.splice(at..at, payload.iter().copied());
                }
                1 => {
                    let (from, to) = clamp_range(a, b, len);
                    seq.erase(from, to).unwrap();
                    model.splice(from..to, std::iter::empty());
                }
                _ => {
                    let (from, to) = clamp_range(a, b, len);
                    seq.replace(from, to, &payload).unwrap();
                    model.splice(from..to, payload.iter().copied());
                }
            }
            prop_assert_eq!(seq.to_vec(), model.clone());
            prop_assert_eq!(seq.len(), model.len());
            assert_journal_sound(&seq)?;
        }
        let collected: Vec<u8> = seq.iter().collect();
        prop_assert_eq!(collected, model);
    }

    #[test]
    fn coverage_algebra_matches_set_model(
        domain in 1usize..70,
        xs in prop::collection::vec(any::<usize>(), 0..24),
        ys in prop::collection::vec(any::<usize>(), 0..24),
    ) {
        let xs: HashSet<u32> = xs.into_iter().map(|v| (v % domain) as u32).collect();
        let ys: HashSet<u32> = ys.into_iter().map(|v| (v % domain) as u32).collect();
        let a = Coverage::from_samples(domain, xs.iter().copied());
        let b = Coverage::from_samples(domain, ys.iter().copied());

        let inter: HashSet<u32> = a.intersect(&b).iter().collect();
        prop_assert_eq!(inter, xs.intersection(&ys).copied().collect::<HashSet<u32>>());
        let diff: HashSet<u32> = a.difference(&b).iter().collect();
        prop_assert_eq!(diff, xs.difference(&ys).copied().collect::<HashSet<u32>>());
        let uni: HashSet<u32> = a.union(&b).iter().collect();
        prop_assert_eq!(uni, xs.union(&ys).copied().collect::<HashSet<u32>>());

        prop_assert_eq!(a.is_empty(), xs.is_empty());
        prop_assert_eq!(a.intersects(&b), !xs.is_disjoint(&ys));
        prop_assert_eq!(a.count(), xs.len());
        for s in 0..domain as u32 {
            prop_assert_eq!(a.contains(s), xs.contains(&s));
        }
    }

    #[test]
    fn enumeration_agrees_with_naive_oracle(
        reference in prop::collection::vec(prop::sample::select(b"ab".to_vec()), 0..20),
        samples in 2usize..5,
        window in 1usize..6,
        raw_events in prop::collection::vec(
            (0usize..4, 0u8..3, 1usize..4, any::<u32>()),
            0..6,
        ),
    ) {
        let events = build_events(&reference, samples, &raw_events);
        let naive: Vec<Vec<u8>> = (0..samples)
            .map(|s| derive(&reference, &events, s as u32))
            .collect();
        let tree = JournaledTree::build(&reference, events, samples).unwrap();

        for (s, expected) in naive.iter().enumerate() {
            prop_assert_eq!(&tree.sequence_at(s as u32).unwrap(), expected);
        }

        let mut seen: HashSet<(u32, usize)> = HashSet::new();
        let mut run: Vec<(Vec<u8>, Vec<(u32, usize)>)> = Vec::new();
        for context in tree.context_enumerator(window) {
            let positions = tree.sequence_positions_at(context.coordinate());
            prop_assert!(!positions.is_empty());
            for &(sample, pos) in &positions {
                let seq = &naive[sample as usize];
                prop_assert!(pos + window <= seq.len());
                prop_assert_eq!(&seq[pos..pos + window], context.bytes());
                prop_assert!(seen.insert((sample, pos)));
            }
            run.push((context.bytes().to_vec(), positions));
        }
        for (s, seq) in naive.iter().enumerate() {
            if seq.len() < window {
                continue;
            }
            for p in 0..=seq.len() - window {
                prop_assert!(seen.contains(&(s as u32, p)));
            }
        }

        let again: Vec<(Vec<u8>, Vec<(u32, usize)>)> = tree
            .context_enumerator(window)
            .map(|c| (c.bytes().to_vec(), tree.sequence_positions_at(c.coordinate())))
            .collect();
        prop_assert_eq!(run, again);
    }
}

/// Constructive generator: walk the reference left to right so spans
/// never overlap, which keeps any coverage combination valid.
fn build_events(
    reference: &[u8],
    samples: usize,
    raw: &[(usize, u8, usize, u32)],
) -> Vec<Event> {
    let mut events = Vec::new();
    let mut cursor = 0usize;
    for &(gap, kind, span, mask) in raw {
        let pos = cursor + gap;
        if pos > reference.len() {
            break;
        }
        let mut coverage = Coverage::none(samples);
        for s in 0..samples as u32 {
            if mask >> s & 1 == 1 {
                coverage.set(s);
            }
        }
        coverage.set((mask as usize % samples) as u32);

        match kind {
            0 => {
                events.push(Event::new(
                    pos,
                    EventKind::Insertion(vec![b'x'; span]),
                    coverage,
                ));
                // A forced gap after an insertion avoids twins.
                cursor = pos + 1;
            }
            1 => {
                let span = span.min(reference.len() - pos);
                if span == 0 {
                    continue;
                }
                events.push(Event::new(pos, EventKind::Deletion(span), coverage));
                cursor = pos + span;
            }
            _ => {
                let span = span.min(reference.len() - pos);
                if span == 0 {
                    continue;
                }
                events.push(Event::new(
                    pos,
                    EventKind::Substitution(vec![b'y'; span]),
                    coverage,
                ));
                cursor = pos + span;
            }
        }
    }
    events
}

/// Naive sample derivation by direct splicing.
fn derive(reference: &[u8], events: &[Event], sample: u32) -> Vec<u8> {
    let rank = |e: &Event| match e.kind() {
        EventKind::Insertion(_) => 0u8,
        EventKind::Deletion(_) => 1,
        EventKind::Substitution(_) => 2,
    };
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by_key(|&i| (events[i].position(), rank(&events[i]), i));

    let mut out = Vec::new();
    let mut cursor = 0usize;
    for &i in &order {
        let event = &events[i];
        if !event.coverage().contains(sample) {
            continue;
        }
        out.extend_from_slice(&reference[cursor..event.position()]);
        cursor = event.position();
        match event.kind() {
            EventKind::Insertion(payload) => out.extend_from_slice(payload),
            EventKind::Deletion(len) => cursor += len,
            EventKind::Substitution(payload) => {
                out.extend_from_slice(payload);
                cursor += payload.len();
            }
        }
    }
    out.extend_from_slice(&reference[cursor..]);
    out
}

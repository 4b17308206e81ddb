//! Context enumeration: every distinct length-w window present in at
//! least one sample, with window-exact coverage and a resolvable
//! coordinate.
//!
//! The enumerator drives a depth-first traversal of the pipelined
//! tree and slides a window along each path. Uniqueness falls out of
//! two rules: a branch only emits windows that still cover both its
//! first and its most recent divergence (everything sliding past
//! belongs to a later branch), and every window subtracts the
//! coverage of each event that overlaps it without being taken on
//! the current path. A window whose refined coverage is empty is
//! dropped.

use std::collections::VecDeque;

use crate::coverage::{Coverage, CoverageSet};
use crate::error::JstError;
use crate::event::{Event, EventId, EventStore};
use crate::pipeline::{NodeSlice, PipelinedTree};
use crate::traverse::{Anchor, Cargo, Coordinate, Step, TraverserCore};

/// Where one path character comes from.
#[derive(Clone, Copy, Debug)]
enum CharOrigin {
    /// A reference character at this position.
    Reference(usize),
    /// A character of an event's alternate payload.
    Payload { event: EventId, offset: usize },
}

/// Window bounds a branch imposes: a window must still cover the
/// branch root's divergence and the most recent one.
#[derive(Clone, Copy, Debug)]
struct BranchBounds {
    head_allow: isize,
    last_need: usize,
    last_allow: isize,
}

/// Per-path sliding state; snapshotted at every descent.
#[derive(Clone)]
struct PathState {
    tail: VecDeque<(u8, CharOrigin)>,
    t: usize,
    branch: Option<BranchBounds>,
    taken: Vec<EventId>,
}

impl PathState {
    fn new() -> Self {
        PathState {
            tail: VecDeque::new(),
            t: 0,
            branch: None,
            taken: Vec::new(),
        }
    }
}

/// One emitted context: the window bytes and the coordinate they were
/// found at.
#[derive(Clone, Debug)]
pub struct Context {
    bytes: Vec<u8>,
    coordinate: Coordinate,
}

impl Context {
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    pub fn into_parts(self) -> (Vec<u8>, Coordinate) {
        (self.bytes, self.coordinate)
    }
}

/// Iterator over every distinct length-w context of the tree.
pub struct ContextEnumerator<'t, 'r> {
    pipeline: PipelinedTree<'t, 'r>,
    core: TraverserCore,
    path: PathState,
    snapshots: Vec<PathState>,
    pending: VecDeque<Context>,
    emitted: u64,
}

impl<'t, 'r> ContextEnumerator<'t, 'r> {
    pub fn new(pipeline: PipelinedTree<'t, 'r>) -> Self {
        ContextEnumerator {
            pipeline,
            core: TraverserCore::new(),
            path: PathState::new(),
            snapshots: Vec::new(),
            pending: VecDeque::new(),
            emitted: 0,
        }
    }

    #[inline]
    pub fn pipeline(&self) -> &PipelinedTree<'t, 'r> {
        &self.pipeline
    }

    /// The fault that ended the stream early, if any.
    #[inline]
    pub fn error(&self) -> Option<&JstError> {
        self.core.error()
    }

    fn window(&self) -> usize {
        self.pipeline.window()
    }

    fn apply(&mut self, cargo: &Cargo<'t>) {
        if let Some(event_id) = cargo.event {
            self.enter_alternate(event_id, cargo);
        } else if let NodeSlice::Reference { start, .. } = cargo.slice {
            for (i, &byte) in cargo.bytes().iter().enumerate() {
                self.push_char(byte, CharOrigin::Reference(start + i), cargo);
            }
        }
    }

    fn enter_alternate(&mut self, event_id: EventId, cargo: &Cargo<'t>) {
        let store = self.pipeline.tree().store();
        let event = store.get(event_id);
        let alt_len = event.alt().len();
        let t = self.path.t;
        let allow = if event.is_deletion() {
            t as isize - 1
        } else {
            (t + alt_len) as isize - 1
        };

        if self.path.branch.is_none() {
            // Entering a branch from the trunk: the left-extend layer
            // decides how much upstream context survives.
            match self.pipeline.config().left_extend_width() {
                Some(keep) => {
                    while self.path.tail.len() > keep {
                        self.path.tail.pop_front();
                    }
                }
                None => self.path.tail.clear(),
            }
            self.path.branch = Some(BranchBounds {
                head_allow: allow,
                last_need: t,
                last_allow: allow,
            });
        } else if let Some(bounds) = &mut self.path.branch {
            bounds.last_need = t;
            bounds.last_allow = allow;
        }
        self.path.taken.push(event_id);

        for (i, &byte) in event.alt().iter().enumerate() {
            self.push_char(
                byte,
                CharOrigin::Payload {
                    event: event_id,
                    offset: i,
                },
                cargo,
            );
        }
    }

    fn push_char(&mut self, byte: u8, origin: CharOrigin, cargo: &Cargo<'t>) {
        let w = self.window();
        self.path.tail.push_back((byte, origin));
        self.path.t += 1;
        if self.path.tail.len() == w {
            self.try_emit(cargo);
            self.path.tail.pop_front();
        }
    }

    fn try_emit(&mut self, cargo: &Cargo<'t>) {
        let w = self.window();
        let start = self.path.t - w;

        if let Some(bounds) = &self.path.branch {
            if start as isize > bounds.head_allow.min(bounds.last_allow) {
                return;
            }
            if start + w <= bounds.last_need {
                return;
            }
        }

        let mut coverage = cargo.coverage().clone();
        self.subtract_overlapping(&mut coverage);
        if coverage.is_empty() {
            return;
        }

        let anchor = if self.pipeline.config().seek() {
            Some(match self.path.tail[0].1 {
                CharOrigin::Reference(pos) => Anchor::Reference(pos),
                CharOrigin::Payload { event, offset } => Anchor::Payload { event, offset },
            })
        } else {
            None
        };

        self.emitted += 1;
        let coordinate = Coordinate::new(self.emitted, anchor, coverage);
        let bytes = self.path.tail.iter().map(|(b, _)| *b).collect();
        self.pending.push_back(Context { bytes, coordinate });
    }

    /// Subtract every event that overlaps the current window without
    /// being taken on this path.
    fn subtract_overlapping(&self, coverage: &mut Coverage) {
        let store = self.pipeline.tree().store();
        let max_point = self
            .path
            .tail
            .iter()
            .map(|(_, o)| match *o {
                CharOrigin::Reference(p) => p,
                CharOrigin::Payload { event, offset } => {
                    let ev = store.get(event);
                    if ev.is_insertion() {
                        ev.position()
                    } else {
                        ev.position() + offset
                    }
                }
            })
            .max()
            .unwrap_or(0);

        for (id, event) in store.iter() {
            if event.position() > max_point {
                break;
            }
            if self.path.taken.contains(&id) {
                continue;
            }
            if !coverage.intersects(event.coverage()) {
                continue;
            }
            if self.window_overlaps(store, event) {
                coverage.subtract(event.coverage());
            }
        }
    }

    /// Whether the window's character run is broken by `event` for
    /// any sample carrying it.
    fn window_overlaps(&self, store: &EventStore, event: &Event) -> bool {
        if event.span() > 0 {
            // Consuming events break the window iff the window holds a
            // character whose reference point falls inside the span.
            self.path.tail.iter().any(|(_, o)| match *o {
                CharOrigin::Reference(p) => event.breakpoint().covers(p),
                CharOrigin::Payload { event: other, offset } => {
                    let ev = store.get(other);
                    !ev.is_insertion() && event.breakpoint().covers(ev.position() + offset)
                }
            })
        } else {
            // An insertion breaks the window iff the window has
            // characters on both sides of the insertion point.
            let q = event.position();
            let mut left = false;
            let mut right = false;
            for (_, o) in &self.path.tail {
                match *o {
                    CharOrigin::Reference(p) => {
                        left |= p < q;
                        right |= p >= q;
                    }
                    CharOrigin::Payload { event: other, offset } => {
                        let ev = store.get(other);
                        let p = if ev.is_insertion() {
                            ev.position()
                        } else {
                            ev.position() + offset
                        };
                        if ev.is_insertion() {
                            left |= p <= q;
                            right |= p > q;
                        } else {
                            left |= p < q;
                            right |= p >= q;
                        }
                    }
                }
            }
            left && right
        }
    }
}

impl Iterator for ContextEnumerator<'_, '_> {
    type Item = Context;

    fn next(&mut self) -> Option<Context> {
        loop {
            if let Some(hit) = self.pending.pop_front() {
                return Some(hit);
            }
            match self.core.next_step(&self.pipeline) {
                Step::Descend(cargo) => {
                    self.snapshots.push(self.path.clone());
                    self.apply(&cargo);
                }
                Step::Ascend => {
                    self.path = self
                        .snapshots
                        .pop()
                        .unwrap_or_else(PathState::new);
                }
                Step::Done => return None,
            }
        }
    }
}

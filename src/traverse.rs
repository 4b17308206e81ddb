//! Depth-first traversal over a pipelined tree.
//!
//! The traverser is a pull iterator producing a [`Cargo`] per visited
//! node, parent before children, siblings in event order with the
//! reference branch last. Cancellation is simply not advancing.

use crate::coverage::Coverage;
use crate::error::JstError;
use crate::event::EventId;
use crate::pipeline::{NodeSlice, PipeNode, PipelinedTree};

/// Where a coordinate is anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// A reference position.
    Reference(usize),
    /// An offset into an event's alternate payload.
    Payload { event: EventId, offset: usize },
}

/// An opaque traversal position, resolvable into per-sample offsets
/// via `JournaledTree::sequence_positions_at` when the seek layer is
/// active.
#[derive(Clone, Debug)]
pub struct Coordinate {
    label: u64,
    anchor: Option<Anchor>,
    coverage: Coverage,
}

impl Coordinate {
    pub(crate) fn new(label: u64, anchor: Option<Anchor>, coverage: Coverage) -> Self {
        Coordinate {
            label,
            anchor,
            coverage,
        }
    }

    /// Monotonic label; unique per visited node when the labelled
    /// layer is active.
    #[inline]
    pub fn label(&self) -> u64 {
        self.label
    }

    #[inline]
    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    /// Samples this coordinate belongs to.
    #[inline]
    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }
}

/// One traversal output: the node's slice of characters, the active
/// coverage along the path taken, and the node's coordinate.
#[derive(Clone, Debug)]
pub struct Cargo<'t> {
    bytes: &'t [u8],
    coverage: Coverage,
    coordinate: Coordinate,
    pub(crate) slice: NodeSlice,
    pub(crate) event: Option<EventId>,
}

impl<'t> Cargo<'t> {
    #[inline]
    pub fn bytes(&self) -> &'t [u8] {
        self.bytes
    }

    #[inline]
    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    #[inline]
    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }
}

/// Structured traversal step (crate-internal; the public face is the
/// cargo iterator).
pub(crate) enum Step<'t> {
    /// Enter a node one level down (or a sibling after an `Ascend`).
    Descend(Cargo<'t>),
    /// Leave the current node.
    Ascend,
    /// Traversal finished; idempotent.
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TraverserState {
    Start,
    AtNode,
    End,
}

struct Frame {
    children: Vec<PipeNode>,
    next: usize,
}

/// The by-value traversal state machine, shared by the public
/// traverser and the context enumerator.
pub(crate) struct TraverserCore {
    stack: Vec<Frame>,
    state: TraverserState,
    counter: u64,
    err: Option<JstError>,
}

impl TraverserCore {
    pub(crate) fn new() -> Self {
        TraverserCore {
            stack: Vec::new(),
            state: TraverserState::Start,
            counter: 0,
            err: None,
        }
    }

    pub(crate) fn error(&self) -> Option<&JstError> {
        self.err.as_ref()
    }

    fn cargo<'t>(&mut self, pipeline: &PipelinedTree<'t, '_>, node: &PipeNode) -> Option<Cargo<'t>> {
        if let NodeSlice::Reference { start, end } = node.slice {
            let len = pipeline.tree().reference().len();
            if start > end || end > len {
                self.err = Some(JstError::InvariantViolated(
                    "node slice outside the reference",
                ));
                self.state = TraverserState::End;
                return None;
            }
        }
        let anchor = if pipeline.config().seek() {
            Some(match node.slice {
                NodeSlice::Reference { start, .. } => Anchor::Reference(start),
                NodeSlice::Payload { event } => Anchor::Payload { event, offset: 0 },
            })
        } else {
            None
        };
        Some(Cargo {
            bytes: pipeline.slice_bytes(&node.slice),
            coverage: node.coverage.clone(),
            coordinate: Coordinate::new(node.label, anchor, node.coverage.clone()),
            slice: node.slice,
            event: node.taken_event(),
        })
    }

    /// Advance one structural step.
    pub(crate) fn next_step<'t>(&mut self, pipeline: &PipelinedTree<'t, '_>) -> Step<'t> {
        match self.state {
            TraverserState::End => Step::Done,
            TraverserState::Start => {
                self.state = TraverserState::AtNode;
                let root = pipeline.root(&mut self.counter);
                let mut kids = Vec::new();
                pipeline.children(&root, &mut self.counter, &mut kids);
                let Some(cargo) = self.cargo(pipeline, &root) else {
                    return Step::Done;
                };
                self.stack.push(Frame {
                    children: kids,
                    next: 0,
                });
                Step::Descend(cargo)
            }
            TraverserState::AtNode => {
                let next = match self.stack.last_mut() {
                    None => {
                        self.state = TraverserState::End;
                        return Step::Done;
                    }
                    Some(top) if top.next < top.children.len() => {
                        let node = top.children[top.next].clone();
                        top.next += 1;
                        Some(node)
                    }
                    Some(_) => None,
                };
                if let Some(node) = next {
                    let mut kids = Vec::new();
                    pipeline.children(&node, &mut self.counter, &mut kids);
                    let Some(cargo) = self.cargo(pipeline, &node) else {
                        return Step::Done;
                    };
                    self.stack.push(Frame {
                        children: kids,
                        next: 0,
                    });
                    return Step::Descend(cargo);
                }
                self.stack.pop();
                if self.stack.is_empty() {
                    self.state = TraverserState::End;
                    return Step::Done;
                }
                Step::Ascend
            }
        }
    }
}

/// Depth-first pull traverser over a borrowed pipeline.
pub struct TreeTraverser<'p, 't, 'r> {
    pipeline: &'p PipelinedTree<'t, 'r>,
    core: TraverserCore,
}

impl<'p, 't, 'r> TreeTraverser<'p, 't, 'r> {
    pub fn new(pipeline: &'p PipelinedTree<'t, 'r>) -> Self {
        TreeTraverser {
            pipeline,
            core: TraverserCore::new(),
        }
    }

    /// The fault that ended the stream early, if any.
    #[inline]
    pub fn error(&self) -> Option<&JstError> {
        self.core.error()
    }
}

impl<'t> Iterator for TreeTraverser<'_, 't, '_> {
    type Item = Cargo<'t>;

    fn next(&mut self) -> Option<Cargo<'t>> {
        loop {
            match self.core.next_step(self.pipeline) {
                Step::Descend(cargo) => return Some(cargo),
                Step::Ascend => continue,
                Step::Done => return None,
            }
        }
    }
}

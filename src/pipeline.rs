//! Adapter pipeline over the base tree.
//!
//! The adapters form a closed set of layers interpreted during node
//! expansion, composed in the reference order:
//!
//! `base | labelled | coloured | trim(w-1) | prune | left_extend(w-1)
//!  | merge | seek`
//!
//! Layer effects:
//! - `labelled`: monotonic node labels in creation order.
//! - `coloured`: active coverage; intersected on an alternate edge,
//!   subtracted on a reference edge past an event.
//! - `trim(k)`: caps a branch at `k` reference characters past its
//!   last event, bounded overall by the branch root's window horizon.
//! - `prune`: drops children whose active coverage is empty.
//! - `left_extend(k)`: keeps `k` characters of upstream context
//!   available when a branch is entered, so windows ending inside the
//!   branch can start before it.
//! - `merge`: collapses the trimmed-out alternate back into the
//!   reference continuation it is observationally equivalent to,
//!   restoring the union coverage on the continuation.
//! - `seek`: coordinates carry resolvable anchors.
//!
//! Omitting a layer changes the traversal observably (duplicate or
//! dead branches, narrower coverage), which is what the composition
//! order section of the design notes is about.

use crate::coverage::{Coverage, CoverageSet};
use crate::event::EventId;
use crate::tree::JournaledTree;

/// One adapter layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Labelled,
    Coloured,
    Trim(usize),
    Prune,
    LeftExtend(usize),
    Merge,
    Seek,
}

/// Which layers wrap the base tree, and the window they serve.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    window: usize,
    layers: Vec<Layer>,
}

impl PipelineConfig {
    /// The reference pipeline for a window of `window` characters.
    pub fn standard(window: usize) -> Self {
        assert!(window > 0, "window must be positive");
        PipelineConfig {
            window,
            layers: vec![
                Layer::Labelled,
                Layer::Coloured,
                Layer::Trim(window - 1),
                Layer::Prune,
                Layer::LeftExtend(window - 1),
                Layer::Merge,
                Layer::Seek,
            ],
        }
    }

    /// No layers at all; the bare base tree.
    pub fn bare(window: usize) -> Self {
        assert!(window > 0, "window must be positive");
        PipelineConfig {
            window,
            layers: Vec::new(),
        }
    }

    /// Append a layer.
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    #[inline]
    pub fn window(&self) -> usize {
        self.window
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn labelled(&self) -> bool {
        self.layers.contains(&Layer::Labelled)
    }

    pub(crate) fn coloured(&self) -> bool {
        self.layers.contains(&Layer::Coloured)
    }

    pub(crate) fn prune(&self) -> bool {
        self.layers.contains(&Layer::Prune)
    }

    pub(crate) fn merge(&self) -> bool {
        self.layers.contains(&Layer::Merge)
    }

    pub(crate) fn seek(&self) -> bool {
        self.layers.contains(&Layer::Seek)
    }

    pub(crate) fn trim_width(&self) -> Option<usize> {
        self.layers.iter().find_map(|l| match l {
            Layer::Trim(k) => Some(*k),
            _ => None,
        })
    }

    pub(crate) fn left_extend_width(&self) -> Option<usize> {
        self.layers.iter().find_map(|l| match l {
            Layer::LeftExtend(k) => Some(*k),
            _ => None,
        })
    }
}

/// What a node contributes to the path text.
#[derive(Clone, Copy, Debug)]
pub(crate) enum NodeSlice {
    /// A span of the reference.
    Reference { start: usize, end: usize },
    /// The alternate of a taken event (empty for deletions).
    Payload { event: EventId },
}

/// Trunk vs branch bookkeeping.
#[derive(Clone, Copy, Debug)]
pub(crate) enum NodeKind {
    /// On the reference path; unbounded.
    Trunk,
    /// Inside a branch spawned by a taken event.
    Branch {
        /// Last path offset a window may start at and still cover the
        /// branch root's divergence. Negative: no such window exists.
        head_allow: isize,
        /// Reference characters still allowed past the last taken
        /// event (trim).
        budget: usize,
    },
}

/// A node of the pipelined tree.
#[derive(Clone, Debug)]
pub(crate) struct PipeNode {
    pub(crate) slice: NodeSlice,
    pub(crate) kind: NodeKind,
    pub(crate) coverage: Coverage,
    pub(crate) label: u64,
    /// Next event to consider; its position is at or past `ref_next`.
    pub(crate) cursor: EventId,
    /// Reference position where the continuation resumes.
    pub(crate) ref_next: usize,
    /// Path characters accumulated through this node's slice.
    pub(crate) t_len: usize,
}

impl PipeNode {
    /// The event this node takes, if it is an alternate node.
    pub(crate) fn taken_event(&self) -> Option<EventId> {
        match self.slice {
            NodeSlice::Payload { event } => Some(event),
            NodeSlice::Reference { .. } => None,
        }
    }
}

/// The base tree wrapped in a layer composition.
pub struct PipelinedTree<'t, 'r> {
    tree: &'t JournaledTree<'r>,
    config: PipelineConfig,
}

impl<'t, 'r> PipelinedTree<'t, 'r> {
    pub fn new(tree: &'t JournaledTree<'r>, config: PipelineConfig) -> Self {
        PipelinedTree { tree, config }
    }

    #[inline]
    pub fn tree(&self) -> &'t JournaledTree<'r> {
        self.tree
    }

    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[inline]
    pub fn window(&self) -> usize {
        self.config.window
    }

    /// Traverse this pipeline depth-first.
    pub fn traverse(&self) -> crate::traverse::TreeTraverser<'_, 't, 'r> {
        crate::traverse::TreeTraverser::new(self)
    }

    fn next_label(&self, counter: &mut u64) -> u64 {
        if self.config.labelled() {
            *counter += 1;
            *counter
        } else {
            0
        }
    }

    /// The root node: the reference up to the first event, carrying
    /// the full domain coverage.
    pub(crate) fn root(&self, counter: &mut u64) -> PipeNode {
        let store = self.tree.store();
        let end = if store.is_empty() {
            self.tree.reference().len()
        } else {
            store.get(0).position()
        };
        PipeNode {
            slice: NodeSlice::Reference { start: 0, end },
            kind: NodeKind::Trunk,
            coverage: self.tree.full_coverage(),
            label: self.next_label(counter),
            cursor: 0,
            ref_next: end,
            t_len: end,
        }
    }

    /// First event after `id` whose position clears the taken span.
    fn next_compatible(&self, id: EventId) -> EventId {
        let store = self.tree.store();
        let end = store.get(id).end();
        let mut next = id + 1;
        while (next as usize) < store.len() && store.get(next).position() < end {
            next += 1;
        }
        next
    }

    /// Expand `node`, alternates before the reference continuation.
    pub(crate) fn children(&self, node: &PipeNode, counter: &mut u64, out: &mut Vec<PipeNode>) {
        out.clear();
        let store = self.tree.store();
        let ref_len = self.tree.reference().len();
        let m = store.len() as EventId;
        let window = self.config.window;
        let coloured = self.config.coloured();
        let prune = self.config.prune();
        let merge = self.config.merge();
        let trim = self.config.trim_width();

        let at_boundary =
            node.cursor < m && store.get(node.cursor).position() == node.ref_next;

        if at_boundary {
            let event = store.get(node.cursor);

            // Alternate child: take the event.
            let in_reach = match node.kind {
                NodeKind::Trunk => true,
                NodeKind::Branch { head_allow, .. } => {
                    trim.is_none() || (node.t_len as isize) < head_allow + window as isize
                }
            };
            if in_reach {
                let taken = if coloured {
                    node.coverage.intersect(event.coverage())
                } else {
                    node.coverage.clone()
                };
                if !prune || !taken.is_empty() {
                    let alt_len = event.alt().len();
                    let kind = match node.kind {
                        NodeKind::Trunk => NodeKind::Branch {
                            head_allow: if event.is_deletion() {
                                node.t_len as isize - 1
                            } else {
                                (node.t_len + alt_len) as isize - 1
                            },
                            budget: trim.unwrap_or(usize::MAX),
                        },
                        NodeKind::Branch { head_allow, .. } => NodeKind::Branch {
                            head_allow,
                            budget: trim.unwrap_or(usize::MAX),
                        },
                    };
                    out.push(PipeNode {
                        slice: NodeSlice::Payload { event: node.cursor },
                        kind,
                        coverage: taken,
                        label: self.next_label(counter),
                        cursor: self.next_compatible(node.cursor),
                        ref_next: event.end(),
                        t_len: node.t_len + alt_len,
                    });
                }
            }

            // Reference child: pass the event.
            let passed = if coloured && !merge {
                node.coverage.difference(event.coverage())
            } else {
                node.coverage.clone()
            };
            if !prune || !passed.is_empty() {
                let cursor = node.cursor + 1;
                let bound = if cursor < m {
                    store.get(cursor).position()
                } else {
                    ref_len
                };
                let cap = self.extension_cap(node, bound);
                let end = node.ref_next + cap;
                let more_here = cursor < m && store.get(cursor).position() == node.ref_next;
                if end > node.ref_next || more_here {
                    out.push(PipeNode {
                        slice: NodeSlice::Reference {
                            start: node.ref_next,
                            end,
                        },
                        kind: self.spent(node.kind, cap),
                        coverage: passed,
                        label: self.next_label(counter),
                        cursor,
                        ref_next: end,
                        t_len: node.t_len + cap,
                    });
                }
            }
        } else if matches!(node.slice, NodeSlice::Payload { .. }) {
            // Continuation after a taken event: extend on the
            // reference toward the next boundary or the caps.
            let bound = if node.cursor < m {
                store.get(node.cursor).position()
            } else {
                ref_len
            };
            let cap = self.extension_cap(node, bound);
            if cap > 0 {
                out.push(PipeNode {
                    slice: NodeSlice::Reference {
                        start: node.ref_next,
                        end: node.ref_next + cap,
                    },
                    kind: self.spent(node.kind, cap),
                    coverage: node.coverage.clone(),
                    label: self.next_label(counter),
                    cursor: node.cursor,
                    ref_next: node.ref_next + cap,
                    t_len: node.t_len + cap,
                });
            }
        }
        // A reference node short of its boundary was capped by trim:
        // it is a leaf.
    }

    /// How many reference characters the continuation may span,
    /// given the next boundary and the node's trim state.
    fn extension_cap(&self, node: &PipeNode, bound: usize) -> usize {
        let to_boundary = bound - node.ref_next;
        match node.kind {
            NodeKind::Trunk => to_boundary,
            NodeKind::Branch { head_allow, budget } => {
                if self.config.trim_width().is_none() {
                    return to_boundary;
                }
                let reach = (head_allow + self.config.window as isize) - node.t_len as isize;
                to_boundary.min(budget).min(reach.max(0) as usize)
            }
        }
    }

    fn spent(&self, kind: NodeKind, used: usize) -> NodeKind {
        match kind {
            NodeKind::Trunk => NodeKind::Trunk,
            NodeKind::Branch { head_allow, budget } => NodeKind::Branch {
                head_allow,
                budget: budget.saturating_sub(used),
            },
        }
    }

    /// Bytes of a node's slice; reference slices borrow the
    /// reference, payload slices borrow the event store.
    pub(crate) fn slice_bytes(&self, slice: &NodeSlice) -> &'t [u8] {
        match slice {
            NodeSlice::Reference { start, end } => &self.tree.reference()[*start..*end],
            NodeSlice::Payload { event } => self.tree.store().get(*event).alt(),
        }
    }
}

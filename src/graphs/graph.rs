//! The compiled, immutable stage graph.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::StageEdge;
use crate::stage::Stage;
use crate::types::StageKind;

/// Immutable workflow definition produced by
/// [`GraphBuilder::compile`](super::GraphBuilder::compile).
///
/// Pure data: holds the stage registry and routing tables, never any
/// execution state. Constructed once at startup and shared (cheaply, via the
/// inner `Arc`s) with every run.
#[derive(Clone)]
pub struct StageGraph {
    pub(super) stages: FxHashMap<StageKind, Arc<dyn Stage>>,
    pub(super) edges: FxHashMap<StageKind, Vec<StageEdge>>,
    pub(super) entry: StageKind,
    pub(super) delivery: Option<StageKind>,
    pub(super) drains: bool,
}

/// The concurrent region around one fan-out stage: the ordered branch
/// stages and the single merge stage they converge on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FanOutPlan {
    pub branches: Vec<StageKind>,
    pub merge: StageKind,
}

impl StageGraph {
    /// The entry stage (target of the single edge from `Start`).
    #[must_use]
    pub fn entry(&self) -> &StageKind {
        &self.entry
    }

    /// Look up a registered stage implementation.
    #[must_use]
    pub fn stage(&self, kind: &StageKind) -> Option<&Arc<dyn Stage>> {
        self.stages.get(kind)
    }

    /// Ordered outgoing edges of `from`. Empty for terminal stages.
    #[must_use]
    pub fn edges_from(&self, from: &StageKind) -> &[StageEdge] {
        self.edges.get(from).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The marked delivery stage, if any.
    #[must_use]
    pub fn delivery(&self) -> Option<&StageKind> {
        self.delivery.as_ref()
    }

    /// Whether the graph defines a drain loop-back (an edge to `Start`).
    ///
    /// Draining graphs process the whole fetched queue per run; without a
    /// loop-back a run is single-shot.
    #[must_use]
    pub fn drains(&self) -> bool {
        self.drains
    }

    /// Number of registered stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The fan-out region rooted at `from`, when `from` has two or more
    /// unconditional outgoing edges.
    ///
    /// Validation has already checked the shape, so the merge stage is read
    /// off the first branch's single edge.
    #[must_use]
    pub fn fan_out(&self, from: &StageKind) -> Option<FanOutPlan> {
        let edges = self.edges_from(from);
        if edges.len() < 2 || edges.iter().any(StageEdge::is_conditional) {
            return None;
        }
        let branches: Vec<StageKind> = edges.iter().map(|e| e.to().clone()).collect();
        let merge = self.edges_from(&branches[0]).first()?.to().clone();
        Some(FanOutPlan { branches, merge })
    }
}

impl std::fmt::Debug for StageGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageGraph")
            .field("entry", &self.entry)
            .field("stages", &self.stages.keys().collect::<Vec<_>>())
            .field("delivery", &self.delivery)
            .field("drains", &self.drains)
            .finish()
    }
}

//! GraphBuilder: fluent construction of workflow graphs.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::StageEdge;
use crate::stage::Stage;
use crate::types::StageKind;

/// Builder for workflow graphs.
///
/// Stages and edges are declared up front; [`compile`](Self::compile)
/// validates the topology and produces an immutable
/// [`StageGraph`](super::StageGraph). Graphs are built once at startup —
/// validation failures are fatal to the process, by design.
///
/// # Required configuration
///
/// - at least one stage registered via [`add_stage`](Self::add_stage)
/// - exactly one unconditional edge from [`StageKind::Start`] (the entry)
/// - for stages with conditional routes, a trailing unconditional default
///
/// `Start` and `End` are virtual endpoints and are never registered as
/// stages; attempts to do so are ignored with a warning.
///
/// # Examples
///
/// ```rust
/// use relaygraph::graphs::{GraphBuilder, StageEdge, predicates};
/// use relaygraph::stage::{Stage, StageContext, StageResult};
/// # use async_trait::async_trait;
/// # use relaygraph::{blackboard::Blackboard, item::Item};
/// # struct Fixed;
/// # #[async_trait]
/// # impl Stage for Fixed {
/// #     async fn run(&self, _: &Item, _: &Blackboard, _: StageContext) -> StageResult {
/// #         StageResult::done()
/// #     }
/// # }
///
/// let graph = GraphBuilder::new()
///     .add_stage("assess", Fixed)
///     .add_stage("reply", Fixed)
///     .add_edge("Start", "assess")
///     .add_route("assess", StageEdge::when("reply", predicates::needs_action("assess")))
///     .add_route("assess", StageEdge::always("End"))
///     .add_edge("reply", "Start") // drain loop-back
///     .compile()
///     .unwrap();
///
/// assert!(graph.drains());
/// ```
pub struct GraphBuilder {
    pub(super) stages: FxHashMap<StageKind, Arc<dyn Stage>>,
    pub(super) edges: FxHashMap<StageKind, Vec<StageEdge>>,
    /// Declaration order of edge sources, so validation reports the first
    /// offending stage deterministically.
    pub(super) edge_order: Vec<StageKind>,
    pub(super) delivery: Option<StageKind>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: FxHashMap::default(),
            edges: FxHashMap::default(),
            edge_order: Vec::new(),
            delivery: None,
        }
    }

    /// Registers a stage under `kind`.
    ///
    /// Registering `Start` or `End` is ignored with a warning: the virtual
    /// endpoints exist only for topology.
    #[must_use]
    pub fn add_stage(mut self, kind: impl Into<StageKind>, stage: impl Stage + 'static) -> Self {
        let kind = kind.into();
        match kind {
            StageKind::Start | StageKind::End => {
                tracing::warn!(?kind, "ignoring registration of virtual stage kind");
            }
            _ => {
                self.stages.insert(kind, Arc::new(stage));
            }
        }
        self
    }

    /// Adds an unconditional edge, `from -> to`.
    ///
    /// Sugar for `add_route(from, StageEdge::always(to))`. Multiple
    /// unconditional edges from one stage declare a fan-out; an edge to
    /// `Start` declares the drain loop-back; an edge to `End` is terminal.
    #[must_use]
    pub fn add_edge(self, from: impl Into<StageKind>, to: impl Into<StageKind>) -> Self {
        self.add_route(from, StageEdge::always(to))
    }

    /// Adds a routed edge to `from`'s ordered edge list.
    ///
    /// Edges are evaluated in declared order; the first accepting edge wins.
    /// A stage mixing conditional edges must declare its unconditional
    /// default last — validation enforces this.
    #[must_use]
    pub fn add_route(mut self, from: impl Into<StageKind>, edge: StageEdge) -> Self {
        let from = from.into();
        if !self.edges.contains_key(&from) {
            self.edge_order.push(from.clone());
        }
        self.edges.entry(from).or_default().push(edge);
        self
    }

    /// Marks the stage whose blackboard receipt drives `mark_done` and the
    /// run's sent count.
    #[must_use]
    pub fn mark_delivery(mut self, stage: impl Into<StageKind>) -> Self {
        self.delivery = Some(stage.into());
        self
    }
}

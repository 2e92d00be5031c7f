//! Edge types and routing predicates.
//!
//! Routing between stages is expressed as an ordered list of [`StageEdge`]s
//! per source stage. Edges are evaluated in declared order against the walk's
//! blackboard; the first edge whose predicate holds (or the unconditional
//! default) wins. Validation guarantees that any stage with conditional
//! edges also carries a trailing default, so a walk can never get stuck.

use std::sync::Arc;

use crate::blackboard::Blackboard;
use crate::types::StageKind;

/// Predicate evaluated against the blackboard to guard an edge.
///
/// Predicates must be pure reads: they are evaluated by the sequential walk
/// and may run more than once for logging purposes.
///
/// # Examples
///
/// ```rust
/// use relaygraph::graphs::RoutePredicate;
/// use std::sync::Arc;
///
/// let has_draft: RoutePredicate = Arc::new(|board| board.text("draft").is_some());
/// ```
pub type RoutePredicate = Arc<dyn Fn(&Blackboard) -> bool + Send + Sync + 'static>;

/// One outgoing edge of a stage.
///
/// `when: None` is the unconditional form — a linear hop, the default arm of
/// a conditional route, one branch of a fan-out, or the drain loop-back
/// (target [`StageKind::Start`]).
#[derive(Clone)]
pub struct StageEdge {
    to: StageKind,
    when: Option<RoutePredicate>,
}

impl StageEdge {
    /// An unconditional edge.
    pub fn always(to: impl Into<StageKind>) -> Self {
        Self {
            to: to.into(),
            when: None,
        }
    }

    /// A predicate-guarded edge.
    pub fn when(to: impl Into<StageKind>, predicate: RoutePredicate) -> Self {
        Self {
            to: to.into(),
            when: Some(predicate),
        }
    }

    /// The edge's target stage.
    #[must_use]
    pub fn to(&self) -> &StageKind {
        &self.to
    }

    /// Whether this edge carries a predicate.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        self.when.is_some()
    }

    /// Evaluate this edge against the blackboard.
    ///
    /// Unconditional edges always accept.
    #[must_use]
    pub fn accepts(&self, board: &Blackboard) -> bool {
        match &self.when {
            Some(pred) => pred(board),
            None => true,
        }
    }
}

impl std::fmt::Debug for StageEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageEdge")
            .field("to", &self.to)
            .field("conditional", &self.when.is_some())
            .finish()
    }
}

/// Ready-made predicates for common routing conventions.
pub mod predicates {
    use super::RoutePredicate;
    use crate::stages::Decision;
    use std::sync::Arc;

    /// True when the decision stage named `decision_stage` recorded
    /// `needs_action = true`.
    ///
    /// Fails closed: a missing or undecodable decision routes as `false`,
    /// so the guarded "produce output" branch is never taken by accident.
    pub fn needs_action(decision_stage: impl Into<String>) -> RoutePredicate {
        let stage = decision_stage.into();
        Arc::new(move |board| {
            board
                .decode::<Decision>(&stage)
                .map(|d| d.needs_action)
                .unwrap_or(false)
        })
    }

    /// True when `stage` recorded any value at all.
    pub fn produced(stage: impl Into<String>) -> RoutePredicate {
        let stage = stage.into();
        Arc::new(move |board| board.value(&stage).is_some())
    }
}

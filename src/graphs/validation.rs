//! Structural validation performed by [`GraphBuilder::compile`].
//!
//! Compilation rejects malformed graphs up front so the runner never has to
//! handle an undefined successor or an ambiguous route mid-walk. Every error
//! names the offending stage and carries a `help` hint for fixing the
//! builder call.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::instrument;

use super::builder::GraphBuilder;
use super::edges::StageEdge;
use super::graph::StageGraph;
use crate::types::StageKind;

/// Problems detected while compiling a [`GraphBuilder`] into a
/// [`StageGraph`].
#[derive(Debug, Error, Diagnostic)]
pub enum GraphDefinitionError {
    #[error("graph has no entry edge from Start")]
    #[diagnostic(
        code(relaygraph::graph::missing_entry),
        help("add an unconditional edge from StageKind::Start to your first stage")
    )]
    MissingEntry,

    #[error("Start must have exactly one unconditional edge to a named stage, found {found}")]
    #[diagnostic(
        code(relaygraph::graph::invalid_entry),
        help("route from Start with a single builder.add_edge(StageKind::Start, ...) call")
    )]
    InvalidEntry { found: String },

    #[error("edge declared from unregistered stage `{from}`")]
    #[diagnostic(
        code(relaygraph::graph::unknown_stage),
        help("register the stage with builder.add_stage before routing from it")
    )]
    UnknownStage { from: StageKind },

    #[error("stage `{from}` routes to undefined stage `{to}`")]
    #[diagnostic(
        code(relaygraph::graph::undefined_successor),
        help("register `{to}` with builder.add_stage, or fix the edge target")
    )]
    UndefinedSuccessor { from: StageKind, to: StageKind },

    #[error("stage `{stage}` has conditional routes but no unconditional default")]
    #[diagnostic(
        code(relaygraph::graph::non_exhaustive_routes),
        help("append a trailing StageEdge::always(...) so an item always has somewhere to go")
    )]
    NonExhaustiveRoutes { stage: StageKind },

    #[error("stage `{stage}` mixes conditional and unconditional routes in an ambiguous order")]
    #[diagnostic(
        code(relaygraph::graph::misordered_routes),
        help("declare conditional edges first and exactly one unconditional default last")
    )]
    MisorderedRoutes { stage: StageKind },

    #[error("fan-out from `{stage}` declares branch `{branch}` more than once")]
    #[diagnostic(
        code(relaygraph::graph::duplicate_branch),
        help("each fan-out branch runs once and owns its blackboard key; remove the repeated edge")
    )]
    DuplicateBranch { stage: StageKind, branch: StageKind },

    #[error("fan-out from `{stage}` does not converge on a single merge stage")]
    #[diagnostic(
        code(relaygraph::graph::divergent_fan_out),
        help(
            "every fan-out branch must be a named stage with exactly one unconditional \
             edge, and all branches must target the same merge stage"
        )
    )]
    DivergentFanOut { stage: StageKind },

    #[error("stage `{stage}` is unreachable from the entry")]
    #[diagnostic(
        code(relaygraph::graph::unreachable_stage),
        help("connect `{stage}` to the graph or remove its registration")
    )]
    UnreachableStage { stage: StageKind },

    #[error("cycle through stage `{stage}` without passing Start")]
    #[diagnostic(
        code(relaygraph::graph::stage_cycle),
        help("loop back by routing to StageKind::Start instead of directly to an earlier stage")
    )]
    StageCycle { stage: StageKind },

    #[error("delivery stage `{stage}` is not registered")]
    #[diagnostic(
        code(relaygraph::graph::unknown_delivery_stage),
        help("mark_delivery must name a stage previously passed to add_stage")
    )]
    UnknownDeliveryStage { stage: StageKind },
}

impl GraphBuilder {
    /// Validate the builder and freeze it into an immutable [`StageGraph`].
    ///
    /// Checks, in order: the entry edge from `Start`, that every route
    /// source and target is defined, the conditional/default shape of each
    /// stage's routes, fan-out convergence, reachability, and the absence of
    /// direct cycles between named stages (looping is only allowed through
    /// `Start`).
    #[instrument(skip(self), fields(stages = self.stages.len()))]
    pub fn compile(self) -> Result<StageGraph, GraphDefinitionError> {
        let entry = validate_entry(&self.edges)?;
        validate_routes(&self.stages, &self.edges, &self.edge_order)?;
        validate_fan_outs(&self.edges, &self.edge_order)?;
        validate_reachability(&self.stages, &self.edges, &entry)?;
        validate_acyclic(&self.edges, &entry)?;

        if let Some(delivery) = &self.delivery {
            if !self.stages.contains_key(delivery) {
                return Err(GraphDefinitionError::UnknownDeliveryStage {
                    stage: delivery.clone(),
                });
            }
        }

        let drains = self
            .edges
            .values()
            .flatten()
            .any(|edge| edge.to().is_start());

        tracing::debug!(entry = %entry, drains, "graph compiled");
        Ok(StageGraph {
            stages: self.stages,
            edges: self.edges,
            entry,
            delivery: self.delivery,
            drains,
        })
    }
}

fn validate_entry(
    edges: &FxHashMap<StageKind, Vec<StageEdge>>,
) -> Result<StageKind, GraphDefinitionError> {
    let Some(entry_edges) = edges.get(&StageKind::Start) else {
        return Err(GraphDefinitionError::MissingEntry);
    };
    match entry_edges.as_slice() {
        [only] if !only.is_conditional() && only.to().is_custom() => Ok(only.to().clone()),
        [only] => Err(GraphDefinitionError::InvalidEntry {
            found: format!("edge to {}", only.to()),
        }),
        many => Err(GraphDefinitionError::InvalidEntry {
            found: format!("{} edges", many.len()),
        }),
    }
}

fn validate_routes(
    stages: &FxHashMap<StageKind, std::sync::Arc<dyn crate::stage::Stage>>,
    edges: &FxHashMap<StageKind, Vec<StageEdge>>,
    edge_order: &[StageKind],
) -> Result<(), GraphDefinitionError> {
    for from in edge_order {
        let routes = &edges[from];
        if !from.is_start() && !stages.contains_key(from) {
            return Err(GraphDefinitionError::UnknownStage { from: from.clone() });
        }
        for edge in routes {
            if edge.to().is_custom() && !stages.contains_key(edge.to()) {
                return Err(GraphDefinitionError::UndefinedSuccessor {
                    from: from.clone(),
                    to: edge.to().clone(),
                });
            }
        }
        if from.is_start() {
            continue;
        }

        let conditional = routes.iter().filter(|e| e.is_conditional()).count();
        let unconditional = routes.len() - conditional;
        if conditional > 0 {
            // Conditionals are tried in declaration order, so the single
            // default must come last or later routes can never fire.
            if unconditional == 0 {
                return Err(GraphDefinitionError::NonExhaustiveRoutes {
                    stage: from.clone(),
                });
            }
            let last_is_default = routes
                .last()
                .is_some_and(|edge| !edge.is_conditional());
            if unconditional > 1 || !last_is_default {
                return Err(GraphDefinitionError::MisorderedRoutes {
                    stage: from.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_fan_outs(
    edges: &FxHashMap<StageKind, Vec<StageEdge>>,
    edge_order: &[StageKind],
) -> Result<(), GraphDefinitionError> {
    for from in edge_order {
        let routes = &edges[from];
        if from.is_start() || routes.len() < 2 || routes.iter().any(StageEdge::is_conditional) {
            continue;
        }
        let divergent = || GraphDefinitionError::DivergentFanOut { stage: from.clone() };

        let mut merge: Option<&StageKind> = None;
        let mut seen: Vec<&StageKind> = Vec::with_capacity(routes.len());
        for branch_edge in routes {
            let branch = branch_edge.to();
            if !branch.is_custom() {
                return Err(divergent());
            }
            if seen.contains(&branch) {
                return Err(GraphDefinitionError::DuplicateBranch {
                    stage: from.clone(),
                    branch: branch.clone(),
                });
            }
            seen.push(branch);
            let next = match edges.get(branch).map(Vec::as_slice) {
                Some([only]) if !only.is_conditional() && only.to().is_custom() => only.to(),
                _ => return Err(divergent()),
            };
            if next == branch {
                return Err(divergent());
            }
            match merge {
                None => merge = Some(next),
                Some(m) if m != next => return Err(divergent()),
                Some(_) => {}
            }
        }
    }
    Ok(())
}

fn validate_reachability(
    stages: &FxHashMap<StageKind, std::sync::Arc<dyn crate::stage::Stage>>,
    edges: &FxHashMap<StageKind, Vec<StageEdge>>,
    entry: &StageKind,
) -> Result<(), GraphDefinitionError> {
    let mut seen: Vec<StageKind> = vec![entry.clone()];
    let mut frontier = vec![entry.clone()];
    while let Some(current) = frontier.pop() {
        for edge in edges.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
            let to = edge.to();
            if to.is_custom() && !seen.contains(to) {
                seen.push(to.clone());
                frontier.push(to.clone());
            }
        }
    }
    for stage in stages.keys() {
        if !seen.contains(stage) {
            return Err(GraphDefinitionError::UnreachableStage {
                stage: stage.clone(),
            });
        }
    }
    Ok(())
}

/// DFS cycle check over named stages only. Edges back to `Start` are the
/// sanctioned loop-back and are skipped here.
fn validate_acyclic(
    edges: &FxHashMap<StageKind, Vec<StageEdge>>,
    entry: &StageKind,
) -> Result<(), GraphDefinitionError> {
    fn visit(
        node: &StageKind,
        edges: &FxHashMap<StageKind, Vec<StageEdge>>,
        path: &mut Vec<StageKind>,
        done: &mut Vec<StageKind>,
    ) -> Result<(), GraphDefinitionError> {
        if done.contains(node) {
            return Ok(());
        }
        if path.contains(node) {
            return Err(GraphDefinitionError::StageCycle {
                stage: node.clone(),
            });
        }
        path.push(node.clone());
        for edge in edges.get(node).map(Vec::as_slice).unwrap_or(&[]) {
            if edge.to().is_custom() {
                visit(edge.to(), edges, path, done)?;
            }
        }
        path.pop();
        done.push(node.clone());
        Ok(())
    }

    let mut path = Vec::new();
    let mut done = Vec::new();
    visit(entry, edges, &mut path, &mut done)
}

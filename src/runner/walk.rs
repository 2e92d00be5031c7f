//! The run loop: fetch a batch, walk each item through the graph, account.

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::config::RunnerConfig;
use super::retry::invoke_with_retry;
use super::summary::{RunFailure, RunSummary};
use crate::blackboard::Blackboard;
use crate::graphs::StageGraph;
use crate::item::Item;
use crate::join::join_branches;
use crate::sink::ActionSink;
use crate::source::{ItemSource, SourceError};
use crate::stage::StageResult;
use crate::types::StageKind;

/// Failures that abort a whole run, as opposed to per-item failures which
/// are absorbed into the [`RunSummary`].
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("failed to fetch the item batch from the source")]
    #[diagnostic(
        code(relaygraph::runner::fetch),
        help("check the source's credentials and connectivity, then rerun")
    )]
    Fetch(#[from] SourceError),
}

/// Drives items from an [`ItemSource`] through a compiled [`StageGraph`].
///
/// One `GraphRunner` can serve many runs; each [`run`](Self::run) fetches a
/// fresh batch and returns its own [`RunSummary`]. Per-item failures never
/// abort the run: the item is recorded in the summary and left pending at
/// the source for a later run.
pub struct GraphRunner {
    graph: StageGraph,
    config: RunnerConfig,
}

enum WalkOutcome {
    Completed,
    Failed,
}

impl GraphRunner {
    #[must_use]
    pub fn new(graph: StageGraph) -> Self {
        Self::with_config(graph, RunnerConfig::default())
    }

    #[must_use]
    pub fn with_config(graph: StageGraph, config: RunnerConfig) -> Self {
        Self { graph, config }
    }

    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Fetch a batch from `source` and walk each item through the graph.
    ///
    /// When the graph drains (has a loop-back to `Start`), every fetched
    /// item is walked in order; otherwise only the first item runs and the
    /// rest stay queued. Items that reach the delivery stage are
    /// acknowledged through `sink.mark_done` exactly once, after delivery.
    #[instrument(skip_all, fields(run_id = tracing::field::Empty))]
    pub async fn run<Src, Snk>(&self, source: &Src, sink: &Snk) -> Result<RunSummary, RunnerError>
    where
        Src: ItemSource,
        Snk: ActionSink,
    {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let mut summary = RunSummary::new(run_id);

        let batch = source
            .fetch(&self.config.filter, self.config.batch_limit)
            .await?;
        let fetched = batch.len();
        info!(fetched, "starting run");
        if batch.is_empty() {
            return Ok(summary);
        }

        for (index, item) in batch.into_iter().enumerate() {
            if index > 0 && !self.graph.drains() {
                debug!(
                    remaining = fetched - index,
                    "graph has no loop-back, leaving remaining items queued"
                );
                break;
            }
            summary.items_processed += 1;
            let item = match source.get_full(&item.id).await {
                Ok(full) => full,
                Err(err) => {
                    warn!(item = %item.id, error = %err, "could not hydrate item");
                    summary.record_failure(RunFailure::new(
                        item.id.clone(),
                        self.graph.entry().clone(),
                        format!("failed to hydrate item: {err}"),
                    ));
                    continue;
                }
            };
            self.walk_item(&item, sink, &mut summary).await;
        }

        info!(%summary, "run finished");
        Ok(summary)
    }

    /// Walk a single, already-hydrated item. The push-model entry point for
    /// callers that receive items via webhook instead of polling a source.
    #[instrument(skip_all, fields(run_id = tracing::field::Empty, item = %item.id))]
    pub async fn run_item<Snk>(&self, item: Item, sink: &Snk) -> RunSummary
    where
        Snk: ActionSink,
    {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let mut summary = RunSummary::new(run_id);
        summary.items_processed = 1;
        self.walk_item(&item, sink, &mut summary).await;
        summary
    }

    /// One item's walk from entry to a terminal edge. Each walk gets a
    /// fresh blackboard; items never see each other's state.
    #[instrument(skip_all, fields(item = %item.id))]
    async fn walk_item<Snk: ActionSink>(
        &self,
        item: &Item,
        sink: &Snk,
        summary: &mut RunSummary,
    ) {
        let mut board = Blackboard::new();
        let mut current = self.graph.entry().clone();

        let outcome = loop {
            let Some(stage) = self.graph.stage(&current) else {
                // Unreachable after compile, but never panic mid-run.
                summary.record_failure(RunFailure::new(
                    item.id.clone(),
                    current.clone(),
                    "stage missing from compiled graph",
                ));
                break WalkOutcome::Failed;
            };

            match invoke_with_retry(stage, &current, item, &board, &self.config.retry).await {
                StageResult::Continue(value) => {
                    board.record(&current, value);
                }
                StageResult::Fatal(reason) => {
                    warn!(stage = %current, %reason, "item walk ended fatally");
                    summary.record_failure(RunFailure::new(
                        item.id.clone(),
                        current.clone(),
                        reason,
                    ));
                    break WalkOutcome::Failed;
                }
                // invoke_with_retry only ever settles.
                StageResult::Retry(reason) => {
                    summary.record_failure(RunFailure::new(
                        item.id.clone(),
                        current.clone(),
                        reason,
                    ));
                    break WalkOutcome::Failed;
                }
            }

            match self.next_hop(&current, item, &board).await {
                Hop::Stage(next, updates) => {
                    for (stage, value) in updates {
                        board.record(&stage, value);
                    }
                    current = next;
                }
                Hop::Terminal => break WalkOutcome::Completed,
            }
        };

        if matches!(outcome, WalkOutcome::Completed) {
            self.acknowledge(item, &board, sink, summary).await;
        }
    }

    /// Route out of `current`: either fan out across concurrent branches
    /// and land on their merge stage, or take the first accepting edge.
    async fn next_hop(&self, current: &StageKind, item: &Item, board: &Blackboard) -> Hop {
        if let Some(plan) = self.graph.fan_out(current) {
            debug!(
                stage = %current,
                branches = plan.branches.len(),
                merge = %plan.merge,
                "fanning out"
            );
            let results = join_branches(
                &plan.branches,
                &self.graph,
                item,
                board,
                &self.config.retry,
            )
            .await;
            let mut updates = Vec::with_capacity(results.len());
            for branch in results {
                match branch.result {
                    StageResult::Continue(value) => updates.push((branch.stage, value)),
                    StageResult::Fatal(reason) | StageResult::Retry(reason) => {
                        // The merge stage still runs on the partial results.
                        warn!(branch = %branch.stage, %reason, "fan-out branch failed");
                    }
                }
            }
            return Hop::Stage(plan.merge, updates);
        }

        for edge in self.graph.edges_from(current) {
            if !edge.accepts(board) {
                continue;
            }
            return match edge.to() {
                StageKind::End | StageKind::Start => Hop::Terminal,
                next @ StageKind::Custom(_) => Hop::Stage(next.clone(), Vec::new()),
            };
        }
        Hop::Terminal
    }

    /// After a completed walk, acknowledge the item at the source when it
    /// actually went through the delivery stage. Items routed away from
    /// delivery stay untouched so a later run can revisit them.
    async fn acknowledge<Snk: ActionSink>(
        &self,
        item: &Item,
        board: &Blackboard,
        sink: &Snk,
        summary: &mut RunSummary,
    ) {
        let Some(delivery) = self.graph.delivery() else {
            return;
        };
        if board.value(delivery.name()).is_none() {
            debug!(item = %item.id, "walk completed without delivery, not acknowledging");
            return;
        }
        summary.items_sent += 1;
        if let Err(err) = sink.mark_done(&item.id).await {
            // Delivery already happened; a failed acknowledgement means the
            // item may be fetched again, and the sink's mark_done is
            // idempotent for that case.
            warn!(item = %item.id, error = %err, "failed to acknowledge delivered item");
        }
    }
}

enum Hop {
    Stage(StageKind, Vec<(StageKind, serde_json::Value)>),
    Terminal,
}

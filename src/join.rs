//! Concurrent fan-out execution.
//!
//! When a stage has several unconditional successors, all of them run
//! concurrently against the same item and blackboard view. The join waits
//! for every branch to settle, never cancelling the slow ones, and reports
//! results in the order the branches were declared so downstream merge
//! stages see a stable layout regardless of completion timing.

use futures_util::future::join_all;

use crate::blackboard::Blackboard;
use crate::item::Item;
use crate::runner::{retry::invoke_with_retry, RetryPolicy};
use crate::stage::StageResult;
use crate::types::StageKind;

/// Outcome of one fan-out branch, tagged with the branch stage.
#[derive(Debug)]
pub struct BranchResult {
    pub stage: StageKind,
    pub result: StageResult,
}

impl BranchResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.result.is_continue()
    }
}

/// Run every branch stage concurrently and collect all outcomes.
///
/// Each branch gets its own retry loop under `policy`. The returned vector
/// is in declared-branch order, one entry per branch, present even when a
/// branch ended `Fatal`. Branches the graph does not know are reported as
/// `Fatal`; compilation makes that unreachable in practice.
pub async fn join_branches(
    branches: &[StageKind],
    graph: &crate::graphs::StageGraph,
    item: &Item,
    board: &Blackboard,
    policy: &RetryPolicy,
) -> Vec<BranchResult> {
    let futures = branches.iter().map(|kind| async move {
        let result = match graph.stage(kind) {
            Some(stage) => invoke_with_retry(stage, kind, item, board, policy).await,
            None => StageResult::Fatal(format!("branch stage `{kind}` not registered")),
        };
        BranchResult {
            stage: kind.clone(),
            result,
        }
    });
    join_all(futures).await
}

//! Per-run accounting returned by [`GraphRunner::run`](super::GraphRunner).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::ItemId;
use crate::types::StageKind;

/// One item that ended in `Fatal`, with enough context to triage later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFailure {
    pub when: DateTime<Utc>,
    pub item_id: ItemId,
    pub stage: StageKind,
    pub reason: String,
}

impl RunFailure {
    #[must_use]
    pub fn new(item_id: ItemId, stage: StageKind, reason: impl Into<String>) -> Self {
        Self {
            when: Utc::now(),
            item_id,
            stage,
            reason: reason.into(),
        }
    }
}

/// What one run accomplished.
///
/// `items_processed` counts every item whose walk started, whether or not it
/// succeeded. `items_sent` counts items that reached the delivery stage and
/// were acknowledged. `items_failed` counts walks that ended `Fatal`; those
/// items stay pending at the source and will be picked up again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub items_processed: usize,
    pub items_sent: usize,
    pub items_failed: usize,
    pub failures: Vec<RunFailure>,
}

impl RunSummary {
    pub(crate) fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            items_processed: 0,
            items_sent: 0,
            items_failed: 0,
            failures: Vec::new(),
        }
    }

    pub(crate) fn record_failure(&mut self, failure: RunFailure) {
        self.items_failed += 1;
        self.failures.push(failure);
    }

    /// True when nothing went fatally wrong.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.items_failed == 0
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "run {}: {} processed, {} sent, {} failed",
            self.run_id, self.items_processed, self.items_sent, self.items_failed
        )
    }
}

//! Retry loop wrapped around every stage invocation.

use std::sync::Arc;

use tracing::{instrument, warn};

use super::config::RetryPolicy;
use crate::blackboard::Blackboard;
use crate::item::Item;
use crate::stage::{Stage, StageContext, StageResult};
use crate::types::StageKind;

/// Invoke `stage` until it settles: `Continue` and `Fatal` are returned as
/// is, `Retry` is re-invoked after a backoff until the policy's ceiling,
/// after which the last retry reason is promoted to `Fatal`.
#[instrument(skip_all, fields(stage = %kind, item = %item.id))]
pub(crate) async fn invoke_with_retry(
    stage: &Arc<dyn Stage>,
    kind: &StageKind,
    item: &Item,
    board: &Blackboard,
    policy: &RetryPolicy,
) -> StageResult {
    let mut attempt: u32 = 1;
    loop {
        let ctx = StageContext::new(kind.name(), item.id.clone(), attempt);
        match stage.run(item, board, ctx).await {
            StageResult::Retry(reason) => {
                let retries_used = attempt - 1;
                if retries_used >= policy.max_retries {
                    warn!(%reason, attempt, "retry ceiling reached, promoting to fatal");
                    return StageResult::Fatal(format!(
                        "retries exhausted after {attempt} attempts: {reason}"
                    ));
                }
                warn!(%reason, attempt, "stage asked for retry");
                let delay = policy.delay_for(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
            settled => return settled,
        }
    }
}

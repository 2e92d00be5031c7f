//! Sink-backed delivery stage.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::blackboard::Blackboard;
use crate::item::Item;
use crate::sink::{ActionSink, DeliverError, DeliveryReceipt};
use crate::stage::{Stage, StageContext, StageResult};

/// Sends the drafted reply back to the item's origin through an
/// [`ActionSink`], addressing the item's thread when it has one.
///
/// On success a [`DeliveryReceipt`] is recorded under this stage's name;
/// the runner uses its presence to decide whether to acknowledge the item.
/// Mark this stage with
/// [`GraphBuilder::mark_delivery`](crate::graphs::GraphBuilder::mark_delivery)
/// for that accounting to happen.
pub struct DeliverStage<S: ActionSink> {
    sink: Arc<S>,
    draft_stage: String,
}

impl<S: ActionSink> DeliverStage<S> {
    /// `draft_stage` names the stage whose blackboard entry holds the body
    /// to send.
    pub fn new(sink: Arc<S>, draft_stage: impl Into<String>) -> Self {
        Self {
            sink,
            draft_stage: draft_stage.into(),
        }
    }
}

#[async_trait]
impl<S: ActionSink> Stage for DeliverStage<S> {
    async fn run(&self, item: &Item, board: &Blackboard, ctx: StageContext) -> StageResult {
        let Some(body) = board.text(&self.draft_stage) else {
            return StageResult::Fatal(format!(
                "no draft found under `{}` on the blackboard",
                self.draft_stage
            ));
        };

        match self
            .sink
            .deliver(&item.origin, item.thread_context.as_deref(), body)
            .await
        {
            Ok(()) => {
                info!(stage = %ctx.stage, item = %ctx.item_id, target = %item.origin, "delivered");
                let receipt =
                    DeliveryReceipt::new(item.origin.clone(), item.thread_context.clone());
                StageResult::Continue(json!(receipt))
            }
            Err(err @ DeliverError::Transient(_)) => StageResult::Retry(err.to_string()),
            Err(err) => StageResult::Fatal(err.to_string()),
        }
    }
}

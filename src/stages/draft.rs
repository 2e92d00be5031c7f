//! Generator-backed drafting stage.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::blackboard::Blackboard;
use crate::generate::{GenerateError, Generator};
use crate::item::Item;
use crate::stage::{Stage, StageContext, StageResult};

/// Produces a reply draft for an item via a [`Generator`].
///
/// The draft is recorded on the blackboard as a plain JSON string under
/// this stage's name, where [`DeliverStage`](super::DeliverStage) expects
/// to find it. Transient generator errors are retried; a rejection is
/// fatal for the item, since without a draft there is nothing to deliver.
pub struct DraftStage<G: Generator> {
    generator: Arc<G>,
    system_instruction: String,
}

impl<G: Generator> DraftStage<G> {
    pub fn new(generator: Arc<G>, system_instruction: impl Into<String>) -> Self {
        Self {
            generator,
            system_instruction: system_instruction.into(),
        }
    }
}

#[async_trait]
impl<G: Generator> Stage for DraftStage<G> {
    async fn run(&self, item: &Item, _board: &Blackboard, _ctx: StageContext) -> StageResult {
        match self
            .generator
            .generate(&self.system_instruction, &item.prompt_content())
            .await
        {
            Ok(draft) => StageResult::Continue(Value::String(draft.trim().to_owned())),
            Err(err @ GenerateError::Transient(_)) => StageResult::Retry(err.to_string()),
            Err(err) => StageResult::Fatal(err.to_string()),
        }
    }
}

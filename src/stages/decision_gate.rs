//! Generator-backed triage stage.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::blackboard::Blackboard;
use crate::generate::{GenerateError, Generator};
use crate::item::Item;
use crate::stage::{Stage, StageContext, StageResult};

/// The gate's verdict, recorded on the blackboard for downstream routes.
///
/// Any field missing from the generator's reply deserializes to `false`,
/// so a half-formed answer never opens the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub needs_action: bool,
}

/// Asks a [`Generator`] whether an item needs acting on, parsing the reply
/// as strict JSON.
///
/// The gate fails closed: an unparseable or rejected reply becomes
/// `needs_action: false` and the item is routed away from the action path.
/// Only transient generator errors are retried.
pub struct DecisionGate<G: Generator> {
    generator: Arc<G>,
    system_instruction: String,
}

impl<G: Generator> DecisionGate<G> {
    pub fn new(generator: Arc<G>, system_instruction: impl Into<String>) -> Self {
        Self {
            generator,
            system_instruction: system_instruction.into(),
        }
    }
}

#[async_trait]
impl<G: Generator> Stage for DecisionGate<G> {
    async fn run(&self, item: &Item, _board: &Blackboard, ctx: StageContext) -> StageResult {
        let reply = match self
            .generator
            .generate(&self.system_instruction, &item.prompt_content())
            .await
        {
            Ok(reply) => reply,
            Err(err @ GenerateError::Transient(_)) => {
                return StageResult::Retry(err.to_string());
            }
            Err(err) => {
                warn!(stage = %ctx.stage, item = %ctx.item_id, error = %err,
                    "generator rejected the request, closing the gate");
                return StageResult::Continue(json!(Decision { needs_action: false }));
            }
        };

        let decision = match serde_json::from_str::<Decision>(strip_code_fences(&reply)) {
            Ok(decision) => decision,
            Err(err) => {
                warn!(stage = %ctx.stage, item = %ctx.item_id, error = %err,
                    "unparseable gate reply, closing the gate");
                Decision { needs_action: false }
            }
        };
        StageResult::Continue(json!(decision))
    }
}

/// Strip a Markdown code fence (with optional language tag) wrapping the
/// generator's reply, leaving the payload for the JSON parser.
pub(crate) fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_passes_through() {
        assert_eq!(strip_code_fences(r#"{"needs_action": true}"#), r#"{"needs_action": true}"#);
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let reply = "```json\n{\"needs_action\": true}\n```";
        assert_eq!(strip_code_fences(reply), r#"{"needs_action": true}"#);
    }

    #[test]
    fn fence_without_language_tag() {
        let reply = "```\n{\"needs_action\": false}\n```";
        assert_eq!(strip_code_fences(reply), r#"{"needs_action": false}"#);
    }

    #[test]
    fn missing_field_defaults_closed() {
        let decision: Decision = serde_json::from_str("{}").unwrap();
        assert!(!decision.needs_action);
    }
}

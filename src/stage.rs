//! Stage execution primitives.
//!
//! This module provides the core abstractions for executable workflow
//! stages: the [`Stage`] trait, the per-invocation [`StageContext`], and the
//! tagged [`StageResult`] outcome.

use async_trait::async_trait;
use serde_json::Value;

use crate::blackboard::Blackboard;
use crate::item::{Item, ItemId};

/// Core trait defining an executable workflow stage.
///
/// A stage receives the current item and the walk's blackboard, performs
/// its work (often a call into an external collaborator), and returns a
/// [`StageResult`]. Stages are stateless with respect to the walk: everything
/// they want to pass downstream goes through their `Continue` value, which
/// the runner records on the blackboard under the stage's name.
///
/// # Error handling
///
/// A stage never lets an error escape its boundary. Transient collaborator
/// failures become [`StageResult::Retry`] (the runner re-invokes with
/// backoff, bounded by the retry ceiling); unrecoverable conditions become
/// [`StageResult::Fatal`], which abandons the current item but never the
/// batch.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use relaygraph::blackboard::Blackboard;
/// use relaygraph::item::Item;
/// use relaygraph::stage::{Stage, StageContext, StageResult};
/// use serde_json::json;
///
/// struct Tag;
///
/// #[async_trait]
/// impl Stage for Tag {
///     async fn run(&self, item: &Item, _board: &Blackboard, _ctx: StageContext) -> StageResult {
///         StageResult::Continue(json!({"origin": item.origin}))
///     }
/// }
/// ```
#[async_trait]
pub trait Stage: Send + Sync {
    /// Execute this stage for one item.
    async fn run(&self, item: &Item, board: &Blackboard, ctx: StageContext) -> StageResult;
}

// Lets callers register a shared handle and keep one for themselves.
#[async_trait]
impl<T: Stage + ?Sized> Stage for std::sync::Arc<T> {
    async fn run(&self, item: &Item, board: &Blackboard, ctx: StageContext) -> StageResult {
        (**self).run(item, board, ctx).await
    }
}

/// Execution context passed to a stage on every invocation.
///
/// Carries the stage's identity and retry attempt so stage implementations
/// can emit meaningful tracing without reaching into runner internals.
#[derive(Clone, Debug)]
pub struct StageContext {
    /// Name of the stage being invoked.
    pub stage: String,
    /// Identifier of the item being walked.
    pub item_id: ItemId,
    /// One-based attempt counter; greater than 1 only on retries.
    pub attempt: u32,
}

impl StageContext {
    pub fn new(stage: impl Into<String>, item_id: ItemId, attempt: u32) -> Self {
        Self {
            stage: stage.into(),
            item_id,
            attempt,
        }
    }
}

/// Tagged outcome of one stage invocation.
///
/// This is the only way control and failure information crosses a stage
/// boundary; raw errors never escape the runner's walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageResult {
    /// The stage finished; record the value and route onward.
    Continue(Value),
    /// Transient failure; re-invoke the same stage after backoff. Exceeding
    /// the retry ceiling converts to `Fatal`.
    Retry(String),
    /// Unrecoverable for this item; abandon the walk and record a failure.
    Fatal(String),
}

impl StageResult {
    /// `Continue` with an empty object value, for stages that only route.
    #[must_use]
    pub fn done() -> Self {
        StageResult::Continue(Value::Object(serde_json::Map::new()))
    }

    /// Convenience constructor for [`StageResult::Retry`].
    pub fn retry(reason: impl Into<String>) -> Self {
        StageResult::Retry(reason.into())
    }

    /// Convenience constructor for [`StageResult::Fatal`].
    pub fn fatal(reason: impl Into<String>) -> Self {
        StageResult::Fatal(reason.into())
    }

    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, StageResult::Continue(_))
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, StageResult::Fatal(_))
    }
}

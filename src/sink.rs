//! Action sink boundary.
//!
//! The [`ActionSink`] performs the terminal side effect of a walk — sending
//! a reply, writing a draft file — and flips the source's durable handled
//! marker afterwards. Ordering matters: the runner calls `mark_done` only
//! after `deliver` reports success, so the duplicate-delivery window is
//! exactly a crash between the two calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::item::ItemId;

/// Errors from an action sink.
#[derive(Debug, Error, Diagnostic)]
pub enum DeliverError {
    /// Network or backend hiccup; eligible for bounded retry.
    #[error("transient delivery failure: {0}")]
    #[diagnostic(code(relaygraph::sink::transient))]
    Transient(String),

    /// The sink reported a definitive failure; the item stays unhandled and
    /// the source will redeliver it on a later run.
    #[error("delivery rejected: {0}")]
    #[diagnostic(code(relaygraph::sink::rejected))]
    Rejected(String),
}

impl DeliverError {
    /// Whether this error is eligible for bounded retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, DeliverError::Transient(_))
    }
}

/// Record of a successful delivery, written to the blackboard by the
/// delivery stage and consumed by the runner to drive `mark_done` and the
/// sent count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Where the payload went.
    pub target: String,
    /// Thread/correlation id the delivery replied to, if any.
    pub reply_to: Option<String>,
    /// When the sink confirmed the delivery.
    pub delivered_at: DateTime<Utc>,
}

impl DeliveryReceipt {
    pub fn new(target: impl Into<String>, reply_to: Option<String>) -> Self {
        Self {
            target: target.into(),
            reply_to,
            delivered_at: Utc::now(),
        }
    }
}

/// Terminal side effects: deliver a payload, mark an item handled.
#[async_trait]
pub trait ActionSink: Send + Sync {
    /// Deliver `body` to `target`, optionally threaded onto `reply_to`.
    async fn deliver(
        &self,
        target: &str,
        reply_to: Option<&str>,
        body: &str,
    ) -> Result<(), DeliverError>;

    /// Flip the durable handled marker for `id`.
    ///
    /// Must be idempotent. The engine does not deduplicate redelivery by
    /// item id; sinks that need stronger-than-at-most-one-duplicate
    /// guarantees should dedup here.
    async fn mark_done(&self, id: &ItemId) -> Result<(), DeliverError>;
}

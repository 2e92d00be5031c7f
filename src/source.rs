//! Item source boundary.
//!
//! An [`ItemSource`] yields the work items a run processes: unread inbox
//! messages, queued chat messages, a single prompt. The source owns all
//! durability — in particular the "already handled" marker that
//! [`ActionSink::mark_done`](crate::sink::ActionSink::mark_done) flips — so a
//! restarted process simply re-fetches and sees whatever was never marked.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::item::{Item, ItemId};

/// Filter applied when fetching a batch.
///
/// `unread_only` is the default posture for poll-and-reply flows; `query` is
/// an opaque provider-specific string passed through to the backend (for a
/// mail source, something like `is:unread -from:me`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceFilter {
    pub unread_only: bool,
    pub query: Option<String>,
}

impl SourceFilter {
    /// Unread-only with no extra query, the usual polling filter.
    #[must_use]
    pub fn unread() -> Self {
        Self {
            unread_only: true,
            query: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

/// Errors from an item source.
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    /// Network or backend hiccup; the next scheduler tick will retry.
    #[error("transient source failure: {0}")]
    #[diagnostic(code(relaygraph::source::transient))]
    Transient(String),

    /// The requested item does not exist (or is no longer visible).
    #[error("item not found: {0}")]
    #[diagnostic(code(relaygraph::source::not_found))]
    NotFound(ItemId),

    /// The backend rejected the request outright.
    #[error("source rejected request: {0}")]
    #[diagnostic(
        code(relaygraph::source::rejected),
        help("Check source credentials and filter syntax.")
    )]
    Rejected(String),
}

/// A sequence of work items with a durable handled/unhandled marker.
///
/// Implementations must provide at-least-once delivery: an item that was
/// never marked done reappears on a later `fetch`. The engine does not
/// manufacture that guarantee.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch up to `limit` unhandled items, in source order.
    async fn fetch(&self, filter: &SourceFilter, limit: usize) -> Result<Vec<Item>, SourceError>;

    /// Expand a header-only item into its full form (subject, body, thread).
    ///
    /// Sources whose `fetch` already returns complete items may implement
    /// this as a lookup of the same data.
    async fn get_full(&self, id: &ItemId) -> Result<Item, SourceError>;
}

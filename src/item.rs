//! Work items flowing through the engine.
//!
//! An [`Item`] is one unit of work fetched from an [`ItemSource`](crate::source::ItemSource):
//! an inbox message, a chat message, a topic prompt. Items are immutable once
//! fetched and are consumed exactly once per run pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque item identifier, unique within a run.
///
/// The engine never interprets the contents; sources supply whatever their
/// backend uses (a message id, a webhook event id, a synthetic uuid).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

/// One unit of work.
///
/// # Examples
///
/// ```rust
/// use relaygraph::item::Item;
///
/// let item = Item::builder("msg-1", "alice@example.com", "Can we move the meeting?")
///     .subject("Meeting time")
///     .thread_context("thread-42")
///     .build();
///
/// assert_eq!(item.origin, "alice@example.com");
/// assert_eq!(item.thread_context.as_deref(), Some("thread-42"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier within a run.
    pub id: ItemId,
    /// Who or what the item came from (sender address, phone number, user).
    pub origin: String,
    /// The item body.
    pub payload: String,
    /// Optional subject line, when the source carries one.
    pub subject: Option<String>,
    /// Optional correlation id for threading replies.
    pub thread_context: Option<String>,
}

impl Item {
    /// Creates an item with the required fields only.
    pub fn new(id: impl Into<ItemId>, origin: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin: origin.into(),
            payload: payload.into(),
            subject: None,
            thread_context: None,
        }
    }

    /// Starts a builder for items with optional fields.
    pub fn builder(
        id: impl Into<ItemId>,
        origin: impl Into<String>,
        payload: impl Into<String>,
    ) -> ItemBuilder {
        ItemBuilder {
            item: Item::new(id, origin, payload),
        }
    }

    /// The item rendered the way decision and draft prompts consume it.
    ///
    /// Mirrors the subject/body framing the upstream sources use; items
    /// without a subject render as the bare payload.
    #[must_use]
    pub fn prompt_content(&self) -> String {
        match &self.subject {
            Some(subject) => format!("Subject: {subject}\nBody: {}", self.payload),
            None => format!("Message: {}", self.payload),
        }
    }
}

/// Builder for [`Item`].
#[derive(Debug)]
pub struct ItemBuilder {
    item: Item,
}

impl ItemBuilder {
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.item.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn thread_context(mut self, thread: impl Into<String>) -> Self {
        self.item.thread_context = Some(thread.into());
        self
    }

    #[must_use]
    pub fn build(self) -> Item {
        self.item
    }
}

//! Scripted in-memory collaborators standing in for real backends.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use relaygraph::generate::{GenerateError, Generator};
use relaygraph::item::{Item, ItemId};
use relaygraph::sink::{ActionSink, DeliverError};
use relaygraph::source::{ItemSource, SourceError, SourceFilter};

/// Source backed by a fixed vector of items.
pub struct MemorySource {
    items: Vec<Item>,
    pub fetch_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            fetch_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ItemSource for MemorySource {
    async fn fetch(&self, _filter: &SourceFilter, limit: usize) -> Result<Vec<Item>, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.iter().take(limit).cloned().collect())
    }

    async fn get_full(&self, id: &ItemId) -> Result<Item, SourceError> {
        self.items
            .iter()
            .find(|item| &item.id == id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.clone()))
    }
}

/// Source whose `fetch` always fails transiently.
pub struct BrokenSource;

#[async_trait]
impl ItemSource for BrokenSource {
    async fn fetch(&self, _: &SourceFilter, _: usize) -> Result<Vec<Item>, SourceError> {
        Err(SourceError::Transient("connection reset".into()))
    }

    async fn get_full(&self, id: &ItemId) -> Result<Item, SourceError> {
        Err(SourceError::NotFound(id.clone()))
    }
}

/// Source that lists items fine but cannot hydrate them.
pub struct HeaderOnlySource {
    items: Vec<Item>,
}

impl HeaderOnlySource {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl ItemSource for HeaderOnlySource {
    async fn fetch(&self, _: &SourceFilter, limit: usize) -> Result<Vec<Item>, SourceError> {
        Ok(self.items.iter().take(limit).cloned().collect())
    }

    async fn get_full(&self, _: &ItemId) -> Result<Item, SourceError> {
        Err(SourceError::Transient("body fetch timed out".into()))
    }
}

/// Sink that records every call, with optional scripted delivery failures
/// consumed before deliveries start succeeding.
#[derive(Default)]
pub struct RecordingSink {
    pub deliveries: Mutex<Vec<(String, Option<String>, String)>>,
    pub done: Mutex<Vec<ItemId>>,
    failures: Mutex<VecDeque<DeliverError>>,
    mark_done_failures: Mutex<VecDeque<DeliverError>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(failures: Vec<DeliverError>) -> Self {
        Self {
            failures: Mutex::new(failures.into()),
            ..Self::default()
        }
    }

    pub fn failing_mark_done(failures: Vec<DeliverError>) -> Self {
        Self {
            mark_done_failures: Mutex::new(failures.into()),
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<(String, Option<String>, String)> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn marked_done(&self) -> Vec<ItemId> {
        self.done.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionSink for RecordingSink {
    async fn deliver(
        &self,
        target: &str,
        reply_to: Option<&str>,
        body: &str,
    ) -> Result<(), DeliverError> {
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.deliveries.lock().unwrap().push((
            target.to_string(),
            reply_to.map(str::to_string),
            body.to_string(),
        ));
        Ok(())
    }

    async fn mark_done(&self, id: &ItemId) -> Result<(), DeliverError> {
        if let Some(err) = self.mark_done_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.done.lock().unwrap().push(id.clone());
        Ok(())
    }
}

/// Generator replaying a script of replies, one per call.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GenerateError>>>,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, GenerateError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, _system: &str, _user: &str) -> Result<String, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerateError::Rejected("script exhausted".into())))
    }
}

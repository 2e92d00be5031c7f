//! Small deterministic stages for wiring test graphs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use relaygraph::blackboard::Blackboard;
use relaygraph::item::Item;
use relaygraph::stage::{Stage, StageContext, StageResult};
use serde_json::{json, Value};

/// Records which stage ran, under its own name.
pub struct EchoStage;

#[async_trait]
impl Stage for EchoStage {
    async fn run(&self, item: &Item, _board: &Blackboard, ctx: StageContext) -> StageResult {
        StageResult::Continue(json!({"stage": ctx.stage, "item": item.id.as_str()}))
    }
}

/// Emits a fixed triage decision.
pub struct DecideStage {
    pub needs_action: bool,
}

#[async_trait]
impl Stage for DecideStage {
    async fn run(&self, _: &Item, _: &Blackboard, _: StageContext) -> StageResult {
        StageResult::Continue(json!({"needs_action": self.needs_action}))
    }
}

/// Replays a script of results across invocations (shared across items),
/// counting calls. An exhausted script keeps returning `done()`.
pub struct ScriptStage {
    script: Mutex<VecDeque<StageResult>>,
    pub calls: AtomicUsize,
}

impl ScriptStage {
    pub fn new(script: Vec<StageResult>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Stage for ScriptStage {
    async fn run(&self, _: &Item, _: &Blackboard, _: StageContext) -> StageResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(StageResult::done)
    }
}

/// Sleeps before emitting a fixed value, for exercising fan-out timing.
pub struct SleepyStage {
    pub delay: Duration,
    pub value: Value,
}

#[async_trait]
impl Stage for SleepyStage {
    async fn run(&self, _: &Item, _: &Blackboard, _: StageContext) -> StageResult {
        tokio::time::sleep(self.delay).await;
        StageResult::Continue(self.value.clone())
    }
}

/// Always fatal.
pub struct FatalStage;

#[async_trait]
impl Stage for FatalStage {
    async fn run(&self, _: &Item, _: &Blackboard, _: StageContext) -> StageResult {
        StageResult::fatal("always fails")
    }
}

/// Captures a snapshot of the blackboard it saw, then continues.
#[derive(Default)]
pub struct CaptureStage {
    pub seen: Mutex<Vec<Blackboard>>,
}

impl CaptureStage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Stage for CaptureStage {
    async fn run(&self, _: &Item, board: &Blackboard, _: StageContext) -> StageResult {
        self.seen.lock().unwrap().push(board.clone());
        StageResult::done()
    }
}

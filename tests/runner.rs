use std::sync::Arc;

use relaygraph::graphs::{predicates, GraphBuilder, StageEdge};
use relaygraph::runner::{GraphRunner, RetryPolicy, RunnerConfig, RunnerError};
use relaygraph::stage::StageResult;
use relaygraph::types::StageKind;

mod common;
use common::*;

fn immediate_config() -> RunnerConfig {
    RunnerConfig {
        retry: RetryPolicy::immediate(3),
        ..RunnerConfig::default()
    }
}

/// The usual triage graph: assess gates on `needs_action`, replies drain
/// back to Start, and `send` is the delivery stage.
fn triage_graph(needs_action: bool, send: impl relaygraph::stage::Stage + 'static) -> relaygraph::graphs::StageGraph {
    GraphBuilder::new()
        .add_stage("assess", DecideStage { needs_action })
        .add_stage("draft", EchoStage)
        .add_stage("send", send)
        .add_edge(StageKind::Start, "assess")
        .add_route(
            "assess",
            StageEdge::when("draft", predicates::needs_action("assess")),
        )
        .add_route("assess", StageEdge::always(StageKind::Start))
        .add_edge("draft", "send")
        .add_edge("send", StageKind::Start)
        .mark_delivery("send")
        .compile()
        .unwrap()
}

#[tokio::test]
async fn routed_away_items_are_never_acknowledged() {
    let source = MemorySource::new(sample_batch(2));
    let sink = RecordingSink::new();
    let runner = GraphRunner::with_config(triage_graph(false, EchoStage), immediate_config());

    let summary = runner.run(&source, &sink).await.unwrap();

    assert_eq!(summary.items_processed, 2);
    assert_eq!(summary.items_sent, 0);
    assert_eq!(summary.items_failed, 0);
    assert!(sink.marked_done().is_empty());
}

#[tokio::test]
async fn drain_loop_works_through_the_whole_batch() {
    let source = MemorySource::new(sample_batch(3));
    let sink = RecordingSink::new();
    let runner = GraphRunner::with_config(triage_graph(true, EchoStage), immediate_config());

    let summary = runner.run(&source, &sink).await.unwrap();

    assert_eq!(summary.items_processed, 3);
    assert_eq!(summary.items_sent, 3);
    assert!(summary.is_clean());
    // The queue drains from the one fetched batch; no mid-batch re-fetch.
    assert_eq!(source.fetch_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    let done = sink.marked_done();
    assert_eq!(done.len(), 3);
    assert_eq!(done[0].as_str(), "item-1");
    assert_eq!(done[2].as_str(), "item-3");
}

#[tokio::test]
async fn graph_without_loop_back_is_single_shot() {
    let graph = GraphBuilder::new()
        .add_stage("only", EchoStage)
        .add_edge(StageKind::Start, "only")
        .add_edge("only", StageKind::End)
        .compile()
        .unwrap();
    assert!(!graph.drains());

    let source = MemorySource::new(sample_batch(4));
    let sink = RecordingSink::new();
    let summary = GraphRunner::with_config(graph, immediate_config())
        .run(&source, &sink)
        .await
        .unwrap();

    assert_eq!(summary.items_processed, 1);
}

#[tokio::test]
async fn batch_limit_caps_the_fetch() {
    let source = MemorySource::new(sample_batch(10));
    let sink = RecordingSink::new();
    let config = RunnerConfig {
        batch_limit: 5,
        retry: RetryPolicy::immediate(0),
        ..RunnerConfig::default()
    };
    let summary = GraphRunner::with_config(triage_graph(true, EchoStage), config)
        .run(&source, &sink)
        .await
        .unwrap();

    assert_eq!(summary.items_processed, 5);
}

#[tokio::test]
async fn transient_failures_are_retried_to_success() {
    let flaky = Arc::new(ScriptStage::new(vec![
        StageResult::retry("timeout"),
        StageResult::retry("timeout"),
        StageResult::done(),
    ]));
    let source = MemorySource::new(sample_batch(1));
    let sink = RecordingSink::new();
    let runner = GraphRunner::with_config(triage_graph(true, flaky.clone()), immediate_config());

    let summary = runner.run(&source, &sink).await.unwrap();

    assert_eq!(flaky.call_count(), 3);
    assert_eq!(summary.items_sent, 1);
    assert!(summary.is_clean());
}

#[tokio::test]
async fn retry_ceiling_promotes_to_fatal() {
    let flaky = Arc::new(ScriptStage::new(vec![
        StageResult::retry("down"),
        StageResult::retry("down"),
        StageResult::retry("down"),
        StageResult::retry("down"),
        StageResult::retry("down"),
    ]));
    let source = MemorySource::new(sample_batch(1));
    let sink = RecordingSink::new();
    let runner = GraphRunner::with_config(triage_graph(true, flaky.clone()), immediate_config());

    let summary = runner.run(&source, &sink).await.unwrap();

    // One initial attempt plus three retries.
    assert_eq!(flaky.call_count(), 4);
    assert_eq!(summary.items_failed, 1);
    assert_eq!(summary.items_sent, 0);
    assert!(sink.marked_done().is_empty());
    let failure = &summary.failures[0];
    assert_eq!(failure.stage, StageKind::from("send"));
    assert!(failure.reason.contains("retries exhausted"));
    assert!(failure.reason.contains("down"));
}

#[tokio::test]
async fn fatal_item_does_not_abort_the_batch() {
    // First item hits the fatal script entry, second sails through.
    let send = Arc::new(ScriptStage::new(vec![StageResult::fatal("hard reject")]));
    let source = MemorySource::new(sample_batch(2));
    let sink = RecordingSink::new();
    let runner = GraphRunner::with_config(triage_graph(true, send.clone()), immediate_config());

    let summary = runner.run(&source, &sink).await.unwrap();

    assert_eq!(summary.items_processed, 2);
    assert_eq!(summary.items_failed, 1);
    assert_eq!(summary.items_sent, 1);
    assert_eq!(summary.failures[0].item_id.as_str(), "item-1");
    assert_eq!(sink.marked_done()[0].as_str(), "item-2");
}

#[tokio::test]
async fn failed_acknowledgement_still_counts_the_item_as_sent() {
    use relaygraph::sink::DeliverError;

    // Delivery succeeded; only the durable marker flip failed. The item is
    // sent, not failed, and will simply be re-fetched later.
    let sink = RecordingSink::failing_mark_done(vec![DeliverError::Transient(
        "marker store unavailable".into(),
    )]);
    let source = MemorySource::new(sample_batch(1));
    let runner = GraphRunner::with_config(triage_graph(true, EchoStage), immediate_config());

    let summary = runner.run(&source, &sink).await.unwrap();

    assert_eq!(summary.items_sent, 1);
    assert_eq!(summary.items_failed, 0);
    assert!(summary.is_clean());
    assert!(sink.marked_done().is_empty());
}

#[tokio::test]
async fn fetch_failure_aborts_the_run() {
    let sink = RecordingSink::new();
    let runner = GraphRunner::with_config(triage_graph(true, EchoStage), immediate_config());

    let err = runner.run(&BrokenSource, &sink).await.unwrap_err();
    assert!(matches!(err, RunnerError::Fetch(_)));
}

#[tokio::test]
async fn hydration_failure_is_recorded_per_item() {
    let source = HeaderOnlySource::new(sample_batch(2));
    let sink = RecordingSink::new();
    let runner = GraphRunner::with_config(triage_graph(true, EchoStage), immediate_config());

    let summary = runner.run(&source, &sink).await.unwrap();

    assert_eq!(summary.items_processed, 2);
    assert_eq!(summary.items_failed, 2);
    assert!(summary.failures[0].reason.contains("hydrate"));
}

#[tokio::test]
async fn run_item_walks_a_pushed_item() {
    let sink = RecordingSink::new();
    let runner = GraphRunner::with_config(triage_graph(true, EchoStage), immediate_config());

    let summary = runner.run_item(sample_item("webhook-1"), &sink).await;

    assert_eq!(summary.items_processed, 1);
    assert_eq!(summary.items_sent, 1);
    assert_eq!(sink.marked_done()[0].as_str(), "webhook-1");
}

#[tokio::test]
async fn empty_batch_is_a_clean_noop() {
    let source = MemorySource::new(Vec::new());
    let sink = RecordingSink::new();
    let runner = GraphRunner::with_config(triage_graph(true, EchoStage), immediate_config());

    let summary = runner.run(&source, &sink).await.unwrap();

    assert_eq!(summary.items_processed, 0);
    assert!(summary.is_clean());
    assert_eq!(source.fetch_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

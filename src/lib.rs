//! relaygraph: a stage-graph engine for item-handling workflows.
//!
//! A workflow is a directed graph of named stages. Items are fetched from
//! an [`ItemSource`](source::ItemSource), walked through the graph one at a
//! time, and results are delivered through an
//! [`ActionSink`](sink::ActionSink). Along the way each stage records its
//! output on a per-item [`Blackboard`](blackboard::Blackboard), which
//! routing predicates inspect to choose the next hop.
//!
//! # Building a workflow
//!
//! ```rust,no_run
//! use relaygraph::graphs::{predicates, GraphBuilder, StageEdge};
//! use relaygraph::runner::GraphRunner;
//! use relaygraph::types::StageKind;
//! # use relaygraph::{blackboard::Blackboard, item::Item};
//! # use relaygraph::stage::{Stage, StageContext, StageResult};
//! # struct Gate; struct Draft; struct Send;
//! # #[async_trait::async_trait] impl Stage for Gate {
//! #     async fn run(&self, _: &Item, _: &Blackboard, _: StageContext) -> StageResult {
//! #         StageResult::done() } }
//! # #[async_trait::async_trait] impl Stage for Draft {
//! #     async fn run(&self, _: &Item, _: &Blackboard, _: StageContext) -> StageResult {
//! #         StageResult::done() } }
//! # #[async_trait::async_trait] impl Stage for Send {
//! #     async fn run(&self, _: &Item, _: &Blackboard, _: StageContext) -> StageResult {
//! #         StageResult::done() } }
//!
//! let graph = GraphBuilder::new()
//!     .add_stage("assess", Gate)
//!     .add_stage("draft", Draft)
//!     .add_stage("send", Send)
//!     .add_edge(StageKind::Start, "assess")
//!     .add_route("assess", StageEdge::when("draft", predicates::needs_action("assess")))
//!     .add_route("assess", StageEdge::always(StageKind::Start))
//!     .add_edge("draft", "send")
//!     .add_edge("send", StageKind::Start)
//!     .mark_delivery("send")
//!     .compile()
//!     .expect("valid graph");
//!
//! let runner = GraphRunner::new(graph);
//! # let _ = runner;
//! ```
//!
//! The edge back to `Start` is the drain loop: the runner keeps pulling
//! queued items until the fetched batch is empty. A graph without it is
//! single-shot.
//!
//! # Concurrency
//!
//! A stage with two or more unconditional successors fans out: all branches
//! run concurrently against the same blackboard view, and their outputs are
//! merged in declared order before the common merge stage runs. See
//! [`join`] for the guarantees.

pub mod blackboard;
pub mod generate;
pub mod graphs;
pub mod item;
pub mod join;
pub mod runner;
pub mod sink;
pub mod source;
pub mod stage;
pub mod stages;
pub mod telemetry;
pub mod types;

pub use blackboard::Blackboard;
pub use item::{Item, ItemId};
pub use runner::{GraphRunner, RunSummary};
pub use stage::{Stage, StageContext, StageResult};
pub use types::StageKind;

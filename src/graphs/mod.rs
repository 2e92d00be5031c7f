//! Graph definition and compilation.
//!
//! A workflow is declared against the fluent [`GraphBuilder`]: register
//! stages, wire edges (unconditional, predicate-guarded, or fanned out),
//! then [`compile`](GraphBuilder::compile) into an immutable [`StageGraph`]
//! the runner can walk. Malformed topologies are rejected at compile time
//! with a [`GraphDefinitionError`] naming the offending stage.

mod builder;
mod edges;
mod graph;
mod validation;

pub use builder::GraphBuilder;
pub use edges::{predicates, RoutePredicate, StageEdge};
pub use graph::{FanOutPlan, StageGraph};
pub use validation::GraphDefinitionError;

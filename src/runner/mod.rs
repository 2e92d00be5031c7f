//! Run-loop machinery: configuration, retry, accounting, and the
//! [`GraphRunner`] itself.

mod config;
pub(crate) mod retry;
mod summary;
mod walk;

pub use config::{RetryPolicy, RunnerConfig};
pub use summary::{RunFailure, RunSummary};
pub use walk::{GraphRunner, RunnerError};

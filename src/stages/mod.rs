//! Ready-made stages for the common triage / draft / deliver pipeline.
//!
//! These cover the shape most workflows take: a [`DecisionGate`] deciding
//! whether an item needs acting on, a [`DraftStage`] producing the reply,
//! and a [`DeliverStage`] sending it. Anything else is a custom
//! [`Stage`](crate::stage::Stage) implementation.

mod decision_gate;
mod deliver;
mod draft;

pub use decision_gate::{Decision, DecisionGate};
pub use deliver::DeliverStage;
pub use draft::DraftStage;

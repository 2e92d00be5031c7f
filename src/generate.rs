//! Generation service boundary.
//!
//! The engine treats text generation as an opaque request/response call. The
//! returned text is untrusted: callers that expect structure (the decision
//! gate) must attempt a strict parse and degrade on failure, never assume
//! schema conformance.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

/// Errors from the generation service.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerateError {
    /// Network/service failure worth retrying with backoff.
    #[error("transient generation failure: {0}")]
    #[diagnostic(code(relaygraph::generate::transient))]
    Transient(String),

    /// The service refused the request; retrying the same input is pointless.
    #[error("generation rejected: {0}")]
    #[diagnostic(
        code(relaygraph::generate::rejected),
        help("Rejections are not retried; the calling stage degrades instead.")
    )]
    Rejected(String),
}

impl GenerateError {
    /// Whether this error is eligible for bounded retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerateError::Transient(_))
    }
}

/// Stateless request/response text generation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce text for `user_content` under `system_instruction`.
    async fn generate(
        &self,
        system_instruction: &str,
        user_content: &str,
    ) -> Result<String, GenerateError>;
}

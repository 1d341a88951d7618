//! `Provider` trait: abstraction over text-generation backends.
//!
//! Providers (Gemini, Null) implement this trait so the service can be
//! configured to use any supported backend via the `[llm] provider`
//! config field.

use anyhow::Result;
use async_trait::async_trait;

use super::{LlmRequest, LlmResponse};

/// Abstraction over text-generation backends (Gemini, the offline null
/// stand-in, etc.).
///
/// Implementations are stateless request/response translators. Retry
/// policy belongs to the caller, not the provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Sends one generation request and returns the normalized response.
    ///
    /// Transport failures, non-success HTTP statuses, and empty
    /// completions all surface as errors. A returned `Ok` always carries
    /// exactly one assistant message.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse>;

    /// Human-readable description of the provider and model.
    ///
    /// Used in status output, e.g. `"gemini (gemini-2.0-flash)"`.
    fn description(&self) -> String;
}

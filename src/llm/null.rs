//! Null provider: offline stand-in for environments without a
//! generation backend.
//!
//! Performs no network I/O and returns a deterministic, clearly labeled
//! response. Useful for local development without an API key and for
//! exercising the pipeline in tests and CI.

use anyhow::Result;
use async_trait::async_trait;

use super::provider::Provider;
use super::{LlmMessage, LlmRequest, LlmResponse};

/// Marker prefix on every null-provider response.
pub const NULL_RESPONSE_PREFIX: &str = "[null-provider]";

/// Provider that never calls out. Same request, same response.
pub struct NullProvider;

#[async_trait]
impl Provider for NullProvider {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("");

        let content = format!(
            "{NULL_RESPONSE_PREFIX} No generation backend is configured. \
             Received {} message(s) and {} tool definition(s){}. \
             Last user message: {:?}",
            request.messages.len(),
            request.tools.len(),
            if request.response_schema.is_some() {
                " (structured output requested)"
            } else {
                ""
            },
            last_user,
        );

        Ok(LlmResponse {
            message: LlmMessage {
                role: "assistant".to_string(),
                content,
            },
            usage: None,
        })
    }

    fn description(&self) -> String {
        "null (offline stand-in)".to_string()
    }
}

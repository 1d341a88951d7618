//! Shared LLM request/response types and the provider seam.
//!
//! Providers (Gemini, the offline null stand-in) translate these
//! provider-agnostic shapes into their own wire format and normalize
//! responses back into [`LlmResponse`].

pub mod gemini;
pub mod null;
pub mod provider;

pub use gemini::GeminiProvider;
pub use null::NullProvider;
pub use provider::Provider;

use serde::{Deserialize, Serialize};

/// A role-tagged message in a generation request.
///
/// Roles are plain strings: `"system"`, `"user"`, `"assistant"`.
/// Inline attachments travel inside `content` as
/// `data:<mime>;base64,<payload>` URLs; schema-aware providers split them
/// into separate binary parts on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

/// Tool definition advertised to the model.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A single generation request.
///
/// `tools` empty means no tool definitions are sent. When
/// `response_schema` is set, schema-aware providers request their
/// structured/JSON output mode; the output still cannot be trusted to
/// match the schema and must be validated downstream.
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub messages: Vec<LlmMessage>,
    pub tools: Vec<ToolDefinition>,
    pub response_schema: Option<serde_json::Value>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Token-usage accounting reported by a provider.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct LlmUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Response to a generation request: a single assistant message plus
/// optional usage accounting.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub message: LlmMessage,
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    /// Text content of the assistant message.
    pub fn text(&self) -> &str {
        &self.message.content
    }
}

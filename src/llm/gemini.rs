//! Google Gemini API provider.
//!
//! Calls `POST {host}/v1beta/models/{model}:generateContent` with the
//! Gemini-native request format. Translates the shared message/tool types
//! into Gemini's wire format and normalizes responses back into
//! `LlmResponse`.
//!
//! Key points of the Gemini wire format:
//! - System messages go into a top-level `systemInstruction` field, not
//!   the `contents` array.
//! - The `assistant` role is called `model`; everything else maps to `user`.
//! - Inline `data:<mime>;base64,<payload>` URLs in message text become
//!   separate `inlineData` parts so the model sees real binary content.
//! - Tool definitions ride in `tools[].functionDeclarations`.
//! - Structured output: `generationConfig.responseMimeType` set to
//!   `application/json` plus `responseSchema` when a schema is requested.
//! - Token usage: `usageMetadata.promptTokenCount` / `candidatesTokenCount`
//!   (may be absent).

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::provider::Provider;
use super::{LlmMessage, LlmRequest, LlmResponse, LlmUsage};
use crate::config::LlmConfig;

/// Default Gemini API base URL.
const DEFAULT_GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";

/// Matches inline `data:<mime>;base64,<payload>` URLs embedded in message
/// text.
static DATA_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"data:([A-Za-z0-9][A-Za-z0-9.+-]*/[A-Za-z0-9.+-]+);base64,([A-Za-z0-9+/=]+)")
        .unwrap()
});

// ── Gemini API request types ─────────────────────────────

/// Gemini `generateContent` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTools>>,
    generation_config: GenerationConfig,
}

/// A role-tagged group of parts. The `systemInstruction` content carries
/// no role.
#[derive(Debug, Serialize, Deserialize, Clone)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// One part of a content entry: either text or inline binary data.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

/// Inline binary payload (base64) with its MIME type.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

/// Tool container: Gemini groups function declarations under one entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTools {
    function_declarations: Vec<GeminiFunctionDecl>,
}

/// A single function declaration.
#[derive(Debug, Serialize)]
struct GeminiFunctionDecl {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Gemini generation parameters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

// ── Gemini API response types ────────────────────────────

/// Gemini `generateContent` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

/// One response candidate. Blocked or truncated generations arrive with
/// `content` absent, or present with an empty `parts` list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Token counts reported by Gemini.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
}

// ── GeminiProvider ───────────────────────────────────────

/// Provider for the Google Gemini API.
pub struct GeminiProvider {
    client: Client,
    config: LlmConfig,
    host: String,
}

impl GeminiProvider {
    /// Creates a new Gemini provider from configuration.
    ///
    /// If `config.host` is `None`, defaults to the public Google endpoint.
    pub fn new(config: LlmConfig) -> Self {
        let host = config
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_HOST.to_string());
        // Strip trailing slash for consistent URL construction
        let host = host.trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            config,
            host,
        }
    }

    /// Translates a shared request into the Gemini wire format.
    fn to_wire(&self, request: &LlmRequest) -> GenerateContentRequest {
        // System messages become the systemInstruction; everything else
        // goes into contents with Gemini role names.
        let system_texts: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .collect();
        let system_instruction = if system_texts.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: Some(system_texts.join("\n\n")),
                    inline_data: None,
                }],
            })
        };

        let contents: Vec<GeminiContent> = request
            .messages
            .iter()
            .filter(|m| m.role != "system")
            .map(|m| GeminiContent {
                role: Some(map_role(&m.role)),
                parts: split_inline_attachments(&m.content),
            })
            .collect();

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(vec![GeminiTools {
                function_declarations: request
                    .tools
                    .iter()
                    .map(|td| GeminiFunctionDecl {
                        name: td.name.clone(),
                        description: td.description.clone(),
                        parameters: td.input_schema.clone(),
                    })
                    .collect(),
            }])
        };

        let generation_config = GenerationConfig {
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_output_tokens: request.max_tokens.unwrap_or(self.config.max_output_tokens),
            response_mime_type: request
                .response_schema
                .as_ref()
                .map(|_| "application/json".to_string()),
            response_schema: request.response_schema.clone(),
        };

        GenerateContentRequest {
            system_instruction,
            contents,
            tools,
            generation_config,
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let wire = self.to_wire(request);

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.host, self.config.model
        );

        debug!(
            "Calling Gemini API ({}) with {} messages{}{}",
            self.config.model,
            request.messages.len(),
            if request.tools.is_empty() { "" } else { " + tools" },
            if request.response_schema.is_some() { " + schema" } else { "" }
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&wire)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({status}): {body}");
        }

        let resp: GenerateContentResponse = response.json().await?;
        let result = from_wire(resp)?;

        if let Some(u) = &result.usage {
            info!(
                "LLM response: {} in / {} out tokens",
                u.input_tokens, u.output_tokens
            );
        }

        Ok(result)
    }

    fn description(&self) -> String {
        format!("{} ({})", self.config.provider, self.config.model)
    }
}

// ── Response translation ─────────────────────────────────

/// Normalizes a Gemini response into the shared `LlmResponse`.
///
/// Blocked or truncated generations are errors, not empty responses: an
/// empty candidate list, a candidate without `content`, and content
/// without parts all fail, carrying the finish reason when Gemini
/// reported one.
fn from_wire(resp: GenerateContentResponse) -> Result<LlmResponse> {
    let usage = resp.usage_metadata.as_ref().map(|u| LlmUsage {
        input_tokens: u.prompt_token_count.unwrap_or(0),
        output_tokens: u.candidates_token_count.unwrap_or(0),
    });

    let candidate = match resp.candidates.into_iter().next() {
        Some(c) => c,
        None => anyhow::bail!("Gemini API returned no candidates"),
    };
    let content = match candidate.content {
        Some(c) => c,
        None => anyhow::bail!(
            "Gemini API returned an empty candidate (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ),
    };
    if content.parts.is_empty() {
        anyhow::bail!(
            "Gemini API returned a candidate with no content parts (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        );
    }

    // Concatenate text parts; non-text parts carry no response text.
    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();

    Ok(LlmResponse {
        message: LlmMessage {
            role: "assistant".to_string(),
            content: text,
        },
        usage,
    })
}

// ── Message translation helpers ──────────────────────────

/// Maps a shared role name onto Gemini's role vocabulary.
fn map_role(role: &str) -> String {
    match role {
        "assistant" => "model".to_string(),
        _ => "user".to_string(),
    }
}

/// Splits message text into Gemini parts, lifting inline data URLs out
/// into `inlineData` parts.
///
/// Text between attachments is preserved as text parts; whitespace-only
/// fragments are dropped. Always returns at least one part, since Gemini
/// rejects empty content entries.
fn split_inline_attachments(text: &str) -> Vec<GeminiPart> {
    let mut parts = Vec::new();
    let mut cursor = 0;

    for caps in DATA_URL_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let before = &text[cursor..whole.start()];
        if !before.trim().is_empty() {
            parts.push(GeminiPart {
                text: Some(before.to_string()),
                inline_data: None,
            });
        }
        parts.push(GeminiPart {
            text: None,
            inline_data: Some(GeminiInlineData {
                mime_type: caps[1].to_string(),
                data: caps[2].to_string(),
            }),
        });
        cursor = whole.end();
    }

    let rest = &text[cursor..];
    if !rest.trim().is_empty() {
        parts.push(GeminiPart {
            text: Some(rest.to_string()),
            inline_data: None,
        });
    }

    if parts.is_empty() {
        parts.push(GeminiPart {
            text: Some(text.to_string()),
            inline_data: None,
        });
    }

    parts
}

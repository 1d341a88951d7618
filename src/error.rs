//! Task-level error taxonomy.
//!
//! Configuration mistakes (unknown skill, dangling prompt reference)
//! fail fast before any network call. Provider failures propagate after
//! being logged; retry policy belongs to the caller. Invalid top-level
//! JSON from an extraction call is fatal to that call, while malformed
//! individual items are silently dropped by the normalizer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    /// The requested skill name is not registered.
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    /// The skill references a prompt id that is not registered.
    #[error("Unknown prompt '{prompt_id}' referenced by skill '{skill}'")]
    UnknownPrompt { skill: String, prompt_id: String },

    /// The generation backend failed: transport error, non-success
    /// status, or an unusable response.
    #[error("Provider call failed: {0}")]
    Provider(anyhow::Error),

    /// The response body of an extraction call was not parseable JSON.
    #[error("LLM response was not valid JSON.")]
    InvalidJson,
}

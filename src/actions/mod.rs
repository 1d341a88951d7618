//! Actionable-item extraction: free-form family text in, typed todo,
//! meal, and event records out.
//!
//! The entrypoint runs the extraction skill through the task pipeline,
//! then pushes the raw model output through the normalizer. Attachments
//! are embedded into the message text as data URLs; schema-aware
//! providers lift them back out into binary parts.

pub mod normalize;

pub use normalize::{
    normalize_actions, EventTime, ExtractedActions, MealType, ParsedEvent, ParsedMeal, ParsedTodo,
};

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;

use crate::error::TaskError;
use crate::service::{LlmService, TaskRequest, USER_MESSAGE_KEY};

/// Skill the extraction entrypoint runs. Registered by
/// [`crate::builtin::register_defaults`].
pub const PARSE_ACTIONS_SKILL: &str = "parse_actions";

/// A binary attachment to an extraction call.
///
/// Size, count, and MIME-type limits are the boundary layer's job;
/// whatever arrives here is embedded as-is.
#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Input to one extraction call.
#[derive(Debug, Clone, Default)]
pub struct ExtractionInput {
    pub text: String,
    pub files: Vec<FileAttachment>,
    /// IANA timezone for resolving relative dates; defaults to UTC.
    pub timezone: Option<String>,
    pub locale: Option<String>,
    pub language: Option<String>,
}

/// Extracts actionable items from a family message.
///
/// Runs the `parse_actions` skill and normalizes its output. Malformed
/// individual items are dropped; an unparseable response body or a
/// provider failure is an error.
pub async fn parse_actionable_items(
    service: &LlmService,
    input: &ExtractionInput,
) -> Result<ExtractedActions, TaskError> {
    let time_zone = input.timezone.clone().unwrap_or_else(|| "UTC".to_string());

    let mut message = input.text.clone();
    for attachment in &input.files {
        let encoded = STANDARD.encode(&attachment.data);
        message.push_str(&format!(
            "\ndata:{};base64,{}",
            attachment.mime_type, encoded
        ));
    }

    let mut task_input = HashMap::new();
    task_input.insert(USER_MESSAGE_KEY.to_string(), message);
    task_input.insert("timezone".to_string(), time_zone.clone());
    task_input.insert(
        "locale".to_string(),
        input.locale.clone().unwrap_or_else(|| "en-US".to_string()),
    );
    task_input.insert(
        "language".to_string(),
        input
            .language
            .clone()
            .unwrap_or_else(|| "English".to_string()),
    );
    task_input.insert(
        "currentDate".to_string(),
        Utc::now().format("%Y-%m-%d").to_string(),
    );

    let outcome = service
        .run_task(&TaskRequest {
            skill_name: PARSE_ACTIONS_SKILL.to_string(),
            input: task_input,
            ..Default::default()
        })
        .await?;

    normalize_actions(outcome.response.text(), &time_zone)
}

//! Builtin catalog: the prompts, skills, and tools registered for the
//! family assistant at startup.
//!
//! Everything here is declarative data plus one clock tool. Callers may
//! register more of each before constructing the service; re-registering
//! a builtin name replaces it.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::actions::PARSE_ACTIONS_SKILL;
use crate::llm::ToolDefinition;
use crate::registry::{PromptRegistry, PromptTemplate, Skill, SkillRegistry, Tool, ToolRegistry};

/// Skill that writes the periodic household SMS summary.
pub const SMS_SUMMARY_SKILL: &str = "sms_summary";
/// Skill that drafts an outbound appointment request.
pub const APPOINTMENT_REQUEST_SKILL: &str = "appointment_request";

const ACTION_PARSE_TEMPLATE: &str = r#"You are the action-extraction engine of a family assistant. Extract every actionable item from the message below into structured JSON.

Today's date: {currentDate}
Household timezone: {timezone}
Locale: {locale}
Reply language: {language}

Known household context:
{context}

Rules:
- Extract todos (tasks someone must do), meals (cooking or meal planning), and events (anything with a date or time).
- Emit every date as an RFC 3339 UTC timestamp such as 2025-03-10T17:00:00.000Z. Resolve relative phrases like "tomorrow" or "next Tuesday" against today's date in the household timezone.
- Give each item a confidence between 0 and 1.
- Copy the exact phrase the item came from into sourceText.
- Reply with a single JSON object of the shape {"todos": [], "meals": [], "events": []} and nothing else.
- If nothing is actionable, return the three empty arrays."#;

const SMS_SUMMARY_TEMPLATE: &str = r#"You are the daily-summary writer of a family assistant. Compose one short SMS (under 320 characters) summarizing the household's day for {recipient}.

Recent household activity:
{context}

Rules:
- Lead with anything time-sensitive for today or tomorrow.
- Plain text only: no markdown, no emoji, no greeting line.
- If there is nothing worth reporting, reply exactly: Nothing new today."#;

const APPOINTMENT_REQUEST_TEMPLATE: &str = r#"You are drafting an appointment request on behalf of a family. Produce a JSON object ready for the communications layer to send.

Today's date: {currentDate}
Household timezone: {timezone}

Known household context:
{context}

Rules:
- recipient: the clinic, office, or person the request goes to.
- channel: "sms" or "email", whichever the message asks for.
- subject: a short subject line; empty string for SMS.
- body: a polite, concise request naming the family member and the reason.
- proposedTimes: up to three RFC 3339 UTC timestamps that satisfy the request."#;

/// Registers the builtin prompts, skills, and tools.
pub fn register_defaults(
    prompts: &mut PromptRegistry,
    skills: &mut SkillRegistry,
    tools: &mut ToolRegistry,
) {
    prompts.register(PromptTemplate::new(
        "action_parse",
        "Extracts todos, meals, and events from a family message",
        ACTION_PARSE_TEMPLATE,
    ));
    prompts.register(PromptTemplate::new(
        "sms_summary",
        "Writes the periodic household summary SMS",
        SMS_SUMMARY_TEMPLATE,
    ));
    prompts.register(PromptTemplate::new(
        "appointment_request",
        "Drafts an outbound appointment request",
        APPOINTMENT_REQUEST_TEMPLATE,
    ));

    skills.register(Skill {
        name: PARSE_ACTIONS_SKILL.to_string(),
        description: "Extract actionable items into typed records".to_string(),
        prompt_id: "action_parse".to_string(),
        tool_names: vec![],
        response_schema: Some(action_response_schema()),
    });
    skills.register(Skill {
        name: SMS_SUMMARY_SKILL.to_string(),
        description: "Summarize recent household activity as one SMS".to_string(),
        prompt_id: "sms_summary".to_string(),
        tool_names: vec!["current_datetime".to_string()],
        response_schema: None,
    });
    skills.register(Skill {
        name: APPOINTMENT_REQUEST_SKILL.to_string(),
        description: "Draft an appointment request for the communications layer".to_string(),
        prompt_id: "appointment_request".to_string(),
        tool_names: vec!["current_datetime".to_string()],
        response_schema: Some(appointment_response_schema()),
    });

    tools.register(Box::new(CurrentDatetimeTool));
}

/// Response schema for `parse_actions`. Guides schema-aware providers;
/// the normalizer still validates everything.
fn action_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "todos": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "confidence": {"type": "number"},
                        "sourceText": {"type": "string"},
                        "notes": {"type": "string"}
                    },
                    "required": ["title", "confidence"]
                }
            },
            "meals": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "confidence": {"type": "number"},
                        "mealType": {
                            "type": "string",
                            "enum": ["breakfast", "lunch", "dinner", "snack"]
                        },
                        "scheduledFor": {"type": "string"},
                        "servings": {"type": "integer"},
                        "recipeUrl": {"type": "string"},
                        "sourceText": {"type": "string"},
                        "notes": {"type": "string"}
                    },
                    "required": ["title", "confidence"]
                }
            },
            "events": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "confidence": {"type": "number"},
                        "start": event_time_schema(),
                        "end": event_time_schema(),
                        "location": {"type": "string"},
                        "sourceText": {"type": "string"},
                        "notes": {"type": "string"}
                    },
                    "required": ["title", "confidence", "start"]
                }
            }
        },
        "required": ["todos", "meals", "events"]
    })
}

fn event_time_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "dateTime": {"type": "string"},
            "timeZone": {"type": "string"}
        },
        "required": ["dateTime"]
    })
}

/// Response schema for `appointment_request`.
fn appointment_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "recipient": {"type": "string"},
            "channel": {"type": "string", "enum": ["sms", "email"]},
            "subject": {"type": "string"},
            "body": {"type": "string"},
            "proposedTimes": {
                "type": "array",
                "items": {"type": "string"}
            }
        },
        "required": ["recipient", "channel", "body"]
    })
}

/// Tool reporting the current date and time in UTC.
///
/// Prompt rendering is pure, so time-sensitive skills ground "today"
/// and "tomorrow" through this tool instead of a baked-in clock.
struct CurrentDatetimeTool;

#[async_trait]
impl Tool for CurrentDatetimeTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "current_datetime".to_string(),
            description: "Returns the current date, weekday, and time in UTC".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    async fn execute(&self, _input: Value) -> anyhow::Result<String> {
        Ok(Utc::now().format("%A %Y-%m-%d %H:%M UTC").to_string())
    }
}

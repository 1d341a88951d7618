//! Normalization of raw extraction output into typed action records.
//!
//! The model's JSON cannot be trusted even when a response schema was
//! requested. The policy here is drop, clamp, default:
//! - items without a usable title or a numeric confidence are dropped,
//! - confidence is clamped into `[0.0, 1.0]`,
//! - timestamps are re-emitted as UTC RFC 3339 with millisecond
//!   precision, or defaulted (event end) or cleared (meal date) when
//!   unparseable,
//! - malformed optional fields become `None` rather than junk values.
//!
//! Only an unparseable top-level body is fatal. Per-item drops are
//! silent apart from a debug-level count, since partial extraction is
//! still useful.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::TaskError;

/// Duration assigned to events whose end time is absent or invalid.
const DEFAULT_EVENT_DURATION_MINS: i64 = 60;

/// Naive timestamp shapes accepted besides full RFC 3339. Read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Meal slot of a parsed meal suggestion.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Case-insensitive parse; anything unrecognized is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            "snack" => Some(Self::Snack),
            _ => None,
        }
    }
}

/// A task someone in the household must do.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTodo {
    pub id: String,
    pub title: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A meal suggestion, optionally scheduled.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMeal {
    pub id: String,
    pub title: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    /// UTC RFC 3339; cleared when the model's date was unparseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Timestamp plus the IANA timezone it should be displayed in.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// UTC RFC 3339 with millisecond precision.
    pub date_time: String,
    pub time_zone: String,
}

/// A calendar event. Always has both a start and an end.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEvent {
    pub id: String,
    pub title: String,
    pub confidence: f64,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The three filtered arrays produced by one extraction call.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ExtractedActions {
    pub todos: Vec<ParsedTodo>,
    pub meals: Vec<ParsedMeal>,
    pub events: Vec<ParsedEvent>,
}

impl ExtractedActions {
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty() && self.meals.is_empty() && self.events.is_empty()
    }
}

/// Normalizes the raw response text of an extraction call.
///
/// Expects a JSON object with `todos`, `meals`, and `events` arrays;
/// absent or non-array entries are treated as empty. A body that is not
/// valid JSON at all is the only fatal case. Surviving items get fresh
/// ids; relative order within each array is preserved.
pub fn normalize_actions(
    raw: &str,
    fallback_time_zone: &str,
) -> Result<ExtractedActions, TaskError> {
    let value: Value = serde_json::from_str(raw).map_err(|_| TaskError::InvalidJson)?;

    let raw_todos = items(&value, "todos");
    let raw_meals = items(&value, "meals");
    let raw_events = items(&value, "events");

    let todos: Vec<ParsedTodo> = raw_todos.iter().filter_map(normalize_todo).collect();
    let meals: Vec<ParsedMeal> = raw_meals.iter().filter_map(normalize_meal).collect();
    let events: Vec<ParsedEvent> = raw_events
        .iter()
        .filter_map(|item| normalize_event(item, fallback_time_zone))
        .collect();

    let dropped = (raw_todos.len() - todos.len())
        + (raw_meals.len() - meals.len())
        + (raw_events.len() - events.len());
    if dropped > 0 {
        debug!(
            "Dropped {dropped} malformed extraction item(s); kept {} todos, {} meals, {} events",
            todos.len(),
            meals.len(),
            events.len()
        );
    }

    Ok(ExtractedActions {
        todos,
        meals,
        events,
    })
}

/// The named array, or empty when absent or not an array.
fn items<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn normalize_todo(item: &Value) -> Option<ParsedTodo> {
    let title = clean_title(item.get("title"))?;
    let confidence = clamp_confidence(item.get("confidence"))?;
    Some(ParsedTodo {
        id: new_id(),
        title,
        confidence,
        source_text: opt_text(item.get("sourceText")),
        notes: opt_text(item.get("notes")),
    })
}

fn normalize_meal(item: &Value) -> Option<ParsedMeal> {
    let title = clean_title(item.get("title"))?;
    let confidence = clamp_confidence(item.get("confidence"))?;
    Some(ParsedMeal {
        id: new_id(),
        title,
        confidence,
        meal_type: item
            .get("mealType")
            .and_then(Value::as_str)
            .and_then(MealType::parse),
        scheduled_for: item
            .get("scheduledFor")
            .and_then(Value::as_str)
            .and_then(normalize_timestamp),
        servings: opt_servings(item.get("servings")),
        recipe_url: opt_url(item.get("recipeUrl")),
        source_text: opt_text(item.get("sourceText")),
        notes: opt_text(item.get("notes")),
    })
}

fn normalize_event(item: &Value, fallback_time_zone: &str) -> Option<ParsedEvent> {
    let title = clean_title(item.get("title"))?;
    let confidence = clamp_confidence(item.get("confidence"))?;

    let start = extract_event_time(item.get("start"));
    // No usable start time: the whole event is dropped.
    let start_at = start.date_time?;

    let end = extract_event_time(item.get("end"));
    // Default end is start plus one hour; if that is not representable,
    // the whole event is dropped.
    let end_at = end
        .date_time
        .or_else(|| start_at.checked_add_signed(Duration::minutes(DEFAULT_EVENT_DURATION_MINS)))?;

    let start_tz = start
        .time_zone
        .unwrap_or_else(|| fallback_time_zone.to_string());
    let end_tz = end.time_zone.unwrap_or_else(|| start_tz.clone());

    Some(ParsedEvent {
        id: new_id(),
        title,
        confidence,
        start: EventTime {
            date_time: format_timestamp(start_at),
            time_zone: start_tz,
        },
        end: EventTime {
            date_time: format_timestamp(end_at),
            time_zone: end_tz,
        },
        location: opt_text(item.get("location")),
        source_text: opt_text(item.get("sourceText")),
        notes: opt_text(item.get("notes")),
    })
}

/// Partially parsed `start`/`end` field of an event item.
struct RawEventTime {
    date_time: Option<DateTime<Utc>>,
    time_zone: Option<String>,
}

/// Accepts the `{dateTime, timeZone}` object form and, leniently, a
/// bare timestamp string.
fn extract_event_time(value: Option<&Value>) -> RawEventTime {
    match value {
        Some(Value::String(s)) => RawEventTime {
            date_time: parse_timestamp(s),
            time_zone: None,
        },
        Some(Value::Object(map)) => RawEventTime {
            date_time: map
                .get("dateTime")
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
            time_zone: map
                .get("timeZone")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        },
        _ => RawEventTime {
            date_time: None,
            time_zone: None,
        },
    }
}

/// Trimmed non-empty title, or `None` to drop the item.
fn clean_title(value: Option<&Value>) -> Option<String> {
    let title = value?.as_str()?.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Numeric confidence clamped into `[0.0, 1.0]`, or `None` to drop the
/// item.
fn clamp_confidence(value: Option<&Value>) -> Option<f64> {
    let n = value?.as_f64()?;
    n.is_finite().then(|| n.clamp(0.0, 1.0))
}

/// Trimmed non-empty string, or `None`.
fn opt_text(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Positive whole-number servings, or `None`.
fn opt_servings(value: Option<&Value>) -> Option<u32> {
    value?
        .as_u64()
        .filter(|n| *n >= 1)
        .and_then(|n| u32::try_from(n).ok())
}

/// An http(s) URL that actually parses, or `None`.
fn opt_url(value: Option<&Value>) -> Option<String> {
    let raw = opt_text(value)?;
    let parsed = Url::parse(&raw).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(raw)
}

/// Parses a timestamp and re-emits it as UTC RFC 3339 with millisecond
/// precision, or `None` when unparseable.
fn normalize_timestamp(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(format_timestamp)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::db;
use crate::models::DEFAULT_CATEGORY;

pub const DIFFICULTY_RANGE: (i64, i64) = (1, 5);
pub const COOKING_TIME_RANGE: (i64, i64) = (1, 1440);
pub const SERVINGS_RANGE: (i64, i64) = (1, 50);

const DEFAULT_DIFFICULTY: i64 = 1;
const DEFAULT_COOKING_TIME: i64 = 30;
const DEFAULT_SERVINGS: i64 = 2;

/// A dish payload after trimming, coercion and defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct DishInput {
    pub name: String,
    pub category: String,
    pub difficulty: i64,
    pub cooking_time: i64,
    pub servings: i64,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub image: String,
    pub tags: Vec<String>,
    pub tutorial_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLog {
    pub dish_id: i64,
    pub image_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogChanges {
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub cooked_at: Option<String>,
}

/// Parse a request body, treating anything that is not JSON as `null` so
/// that the validators report it as "not an object".
pub fn parse_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or(Value::Null)
}

/// Validate and normalize a dish payload, collecting every violated rule.
pub fn validate_dish(input: &Value) -> Result<DishInput, Vec<String>> {
    let Some(obj) = input.as_object() else {
        return Err(vec!["request body must be a JSON object".to_string()]);
    };

    let name = text_field(obj, "name");
    let category = Some(text_field(obj, "category"))
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let difficulty = coerce_int(obj.get("difficulty"), DEFAULT_DIFFICULTY);
    let cooking_time = coerce_int(obj.get("cooking_time"), DEFAULT_COOKING_TIME);
    let servings = coerce_int(obj.get("servings"), DEFAULT_SERVINGS);
    let ingredients = string_list(obj.get("ingredients"));
    let instructions = string_list(obj.get("instructions"));
    let tags = string_list(obj.get("tags"));

    let mut errors = Vec::new();

    if name.is_empty() {
        errors.push("name is required".to_string());
    }
    if ingredients.is_empty() {
        errors.push("at least one ingredient is required".to_string());
    }
    if instructions.is_empty() {
        errors.push("at least one instruction step is required".to_string());
    }
    if !in_range(difficulty, DIFFICULTY_RANGE) {
        errors.push("difficulty must be between 1 and 5".to_string());
    }
    if !in_range(cooking_time, COOKING_TIME_RANGE) {
        errors.push("cooking_time must be between 1 and 1440 minutes".to_string());
    }
    if !in_range(servings, SERVINGS_RANGE) {
        errors.push("servings must be between 1 and 50".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(DishInput {
        name,
        category,
        difficulty,
        cooking_time,
        servings,
        ingredients,
        instructions,
        image: text_field(obj, "image"),
        tags,
        tutorial_url: text_field(obj, "tutorial_url"),
    })
}

/// Validate a new cooking log. `path_dish_id` wins over a `dish_id` in the body.
pub fn validate_new_log(input: &Value, path_dish_id: Option<i64>) -> Result<NewLog, Vec<String>> {
    let Some(obj) = input.as_object() else {
        return Err(vec!["request body must be a JSON object".to_string()]);
    };

    let mut errors = Vec::new();

    let dish_id = path_dish_id.or_else(|| obj.get("dish_id").and_then(positive_id));
    if dish_id.is_none() {
        errors.push("dish_id must be a positive integer".to_string());
    }

    let image_url = optional_text(obj, "image_url");
    let notes = optional_text(obj, "notes");
    if image_url.is_none() && notes.is_none() {
        errors.push("image_url or notes is required".to_string());
    }

    match dish_id {
        Some(dish_id) if errors.is_empty() => Ok(NewLog {
            dish_id,
            image_url,
            notes,
        }),
        _ => Err(errors),
    }
}

pub fn validate_log_changes(input: &Value) -> Result<LogChanges, Vec<String>> {
    let Some(obj) = input.as_object() else {
        return Err(vec!["request body must be a JSON object".to_string()]);
    };

    let mut errors = Vec::new();

    let image_url = optional_text(obj, "image_url");
    let notes = optional_text(obj, "notes");
    if image_url.is_none() && notes.is_none() {
        errors.push("image_url or notes is required".to_string());
    }

    let cooked_at = match optional_text(obj, "cooked_at") {
        Some(raw) => {
            let parsed = normalize_timestamp(&raw);
            if parsed.is_none() {
                errors.push("cooked_at must be an RFC 3339 timestamp".to_string());
            }
            parsed
        }
        None => None,
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(LogChanges {
        image_url,
        notes,
        cooked_at,
    })
}

/// Parse a strictly positive integer id from a path or query segment.
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

fn positive_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().filter(|id| *id > 0),
        Value::String(s) => parse_id(s),
        _ => None,
    }
}

fn in_range(value: i64, (min, max): (i64, i64)) -> bool {
    (min..=max).contains(&value)
}

/// Absent or non-numeric values fall back; numeric values are truncated to
/// an integer and kept even when out of range so the range check can reject them.
fn coerce_int(value: Option<&Value>, fallback: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(fallback),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .unwrap_or(fallback)
        }
        _ => fallback,
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn optional_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    Some(text_field(obj, key)).filter(|s| !s.is_empty())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn normalize_timestamp(raw: &str) -> Option<String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(db::timestamp(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| db::timestamp(naive.and_utc()))
}

//! Repairs for JSON-mode replies that do not match the requested shape.

use crate::error::TmError;
use crate::schema::{find_array_field, SchemaShape};
use serde_json::{Map, Value};

/// Parse a model reply as JSON.
///
/// Tries the text as-is, then without a surrounding markdown code fence,
/// then the outermost span opened by whichever of `{` or `[` comes first.
pub fn parse_json_payload(text: &str) -> Result<Value, TmError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TmError::no_object("empty response"));
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let unfenced = strip_code_fence(trimmed);
    if !unfenced.is_empty() {
        if let Ok(value) = serde_json::from_str(unfenced) {
            return Ok(value);
        }
        if let Some(value) = parse_outer_span(unfenced) {
            return Ok(value);
        }
    }
    if unfenced != trimmed {
        if let Some(value) = parse_outer_span(trimmed) {
            return Ok(value);
        }
    }

    Err(TmError::no_object(format!(
        "could not parse response as JSON: {}",
        preview(trimmed)
    )))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (```json)
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest.trim_start_matches(char::is_alphabetic),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Spans are tried in the order their opening bracket appears, so an
/// array of objects stays an array.
fn parse_outer_span(text: &str) -> Option<Value> {
    let mut spans: Vec<(usize, &str)> = [('{', '}'), ('[', ']')]
        .into_iter()
        .filter_map(|(open, close)| {
            let start = text.find(open)?;
            let end = text.rfind(close)?;
            (end > start).then(|| (start, &text[start..=end]))
        })
        .collect();
    spans.sort_by_key(|(start, _)| *start);

    spans
        .into_iter()
        .find_map(|(_, span)| serde_json::from_str(span).ok())
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Turn a parsed payload into the object handed back to callers.
///
/// Objects pass through untouched. A bare array is nested under the
/// schema's array field, or under `object_name` when the schema has none
/// that can be found. Scalars are not a usable object.
pub fn wrap_payload<S: SchemaShape + ?Sized>(
    payload: Value,
    schema: &S,
    object_name: &str,
) -> Result<Map<String, Value>, TmError> {
    match payload {
        Value::Object(object) => Ok(object),
        Value::Array(items) => {
            let key = match find_array_field(schema) {
                Some(key) => key,
                None => {
                    tracing::warn!(
                        object_name,
                        "Endpoint returned a bare array for '{}' but no array field was found in the schema; using the object name as wrapper key",
                        object_name
                    );
                    object_name.to_string()
                }
            };

            let mut object = Map::new();
            object.insert(key, Value::Array(items));
            Ok(object)
        }
        other => into_object(other, object_name),
    }
}

/// Accept the payload only if it already is an object.
pub fn into_object(payload: Value, object_name: &str) -> Result<Map<String, Value>, TmError> {
    match payload {
        Value::Object(object) => Ok(object),
        other => Err(TmError::no_object(format!(
            "expected a JSON object for '{}', got {}",
            object_name,
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

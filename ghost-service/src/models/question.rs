use serde_json::{Map, Value};
use service_core::error::AppError;

pub const MISSING_QUESTION: &str = "Missing 'question'";

/// A trimmed, non-empty question taken from the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    /// Extract `question` from a raw body; never fails on malformed JSON, only
    /// on an absent or blank question.
    pub fn parse(body: &[u8]) -> Result<Self, AppError> {
        let fields = parse_body(body);
        let text = fields
            .get("question")
            .map(coerce_to_string)
            .unwrap_or_default();
        let text = text.trim();

        if text.is_empty() {
            return Err(AppError::BadRequest(MISSING_QUESTION.to_string()));
        }
        Ok(Question(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Body as a JSON object. A JSON string holding an encoded object is decoded
/// once more; anything else is an empty object.
pub fn parse_body(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

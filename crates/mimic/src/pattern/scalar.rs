//! Boolean, number, string, datetime and null primitives.

use super::Pattern;
use crate::error::ContractError;
use crate::result::MatchResult;
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub(super) fn is_datetime(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).is_ok()
}

pub(super) fn matches(pattern: &Pattern, value: &Value) -> MatchResult {
    match (pattern, value) {
        (Pattern::Boolean, Value::Boolean(_))
        | (Pattern::Number, Value::Number(_))
        | (Pattern::String, Value::String(_)) => MatchResult::Success,
        (Pattern::DateTime, Value::String(text)) => {
            if is_datetime(text) {
                MatchResult::Success
            } else {
                MatchResult::failure(format!("expected datetime, got \"{text}\""))
            }
        }
        (Pattern::Null, value) if value.is_empty() => MatchResult::Success,
        (pattern, value) => MatchResult::mismatch(pattern.type_name(), value),
    }
}

pub(super) fn parse(pattern: &Pattern, text: &str) -> Result<Value, ContractError> {
    let trimmed = text.trim();
    match pattern {
        Pattern::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(ContractError::parse("boolean", text)),
        },
        Pattern::Number => match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Number(number)) => Ok(Value::Number(number)),
            _ => Err(ContractError::parse("number", text)),
        },
        Pattern::DateTime if is_datetime(trimmed) => Ok(Value::string(trimmed)),
        Pattern::DateTime => Err(ContractError::parse("datetime", text)),
        Pattern::Null if trimmed.is_empty() => Ok(Value::Null),
        Pattern::Null => Err(ContractError::parse("null", text)),
        _ => Ok(Value::string(text)),
    }
}

pub(super) fn generate(pattern: &Pattern) -> Value {
    let mut rng = rand::thread_rng();
    match pattern {
        Pattern::Boolean => Value::Boolean(rng.gen()),
        Pattern::Number => Value::number(rng.gen_range(0..1000)),
        Pattern::DateTime => Value::string(Utc::now().format(DATETIME_FORMAT).to_string()),
        Pattern::Null => Value::Null,
        _ => {
            let length = rng.gen_range(5..=10);
            Value::String(
                rng.sample_iter(&Alphanumeric)
                    .take(length)
                    .map(char::from)
                    .collect(),
            )
        }
    }
}

//! services/storefront/src/app/feedback.rs
//!
//! Turns port errors into the short messages shown in banners and inline form
//! errors. Raw markup from a misbehaving server is never passed through.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use storefront_core::ports::PortError;

const SEPARATOR: &str = " • ";

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)<!doctype|<html").expect("static pattern compiles"))
}

fn looks_like_markup(text: &str) -> bool {
    markup_pattern().is_match(text)
}

fn server_error(status: u16) -> String {
    format!("Server error ({}). Please try again later.", status)
}

/// Renders a JSON scalar or the first entry of an array as plain text.
fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(entries) => entries.iter().find_map(first_message),
        Value::Null => None,
        Value::Object(fields) => fields.values().find_map(first_message),
        other => Some(other.to_string()),
    }
}

fn join_field_errors(fields: &Map<String, Value>) -> Option<String> {
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|(field, value)| first_message(value).map(|msg| format!("{}: {}", field, msg)))
        .collect();
    (!parts.is_empty()).then(|| parts.join(SEPARATOR))
}

fn describe_body(status: u16, body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(text)) if looks_like_markup(&text) => Some(server_error(status)),
        Ok(Value::String(text)) => Some(text).filter(|t| !t.trim().is_empty()),
        Ok(Value::Object(fields)) => match fields.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            _ => join_field_errors(&fields),
        },
        Ok(Value::Array(entries)) => {
            let parts: Vec<String> = entries.iter().filter_map(first_message).collect();
            (!parts.is_empty()).then(|| parts.join(SEPARATOR))
        }
        Ok(_) => None,
        Err(_) if looks_like_markup(body) => Some(server_error(status)),
        Err(_) => Some(body.trim().to_string()).filter(|t| !t.is_empty()),
    }
}

/// A user-facing message for `error`, or `fallback` when nothing usable is
/// available.
pub fn describe(error: &PortError, fallback: &str) -> String {
    let described = match error {
        PortError::Rejected { status, body } => describe_body(*status, body),
        PortError::NotFound(body) => describe_body(404, body),
        PortError::Forbidden(reason) if !reason.is_empty() => Some(reason.clone()),
        _ => None,
    };
    described.unwrap_or_else(|| fallback.to_string())
}

/// The first message of the first field of a validation error, or the
/// `detail` string when that is all the server sent.
pub fn first_error(error: &PortError) -> Option<String> {
    let PortError::Rejected { body, .. } = error else {
        return None;
    };
    match serde_json::from_str::<Value>(body).ok()? {
        Value::Object(fields) => match fields.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            _ => fields.values().find_map(first_message),
        },
        other => first_message(&other),
    }
}

/// A read whose failure was recovered locally: `value` is the empty
/// fallback and `error` carries the message for a retry control.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered<T> {
    pub value: T,
    pub error: Option<String>,
}

impl<T> Recovered<T> {
    pub fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    pub fn failed(value: T, error: String) -> Self {
        Self {
            value,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

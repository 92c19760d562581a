//! Release webhook payload as delivered by GitHub.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::AppError;

/// Timestamp layout used by the webhook's `created_at` / `published_at`.
pub const WEBHOOK_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Actions that carry a release worth mirroring.
pub const ACTION_PUBLISHED: &str = "published";
pub const ACTION_EDITED: &str = "edited";

/// Top-level webhook document. Only `action` is required up front; the
/// `release` object is validated separately once the action is known to matter.
#[derive(Debug, Deserialize)]
pub struct ReleaseWebhookPayload {
    pub action: String,
    #[serde(default)]
    pub release: Option<ReleasePayload>,
}

/// The webhook's `release` object. Each field is `None` when absent and
/// `Some(Value::Null)` when explicitly null, so validation can tell the two apart.
#[derive(Debug, Default, Deserialize)]
pub struct ReleasePayload {
    #[serde(default, deserialize_with = "present")]
    pub tag_name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub body: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub created_at: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub published_at: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ReleaseWebhookPayload {
    pub fn parse(body: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(body).map_err(|e| {
            tracing::error!("Malformed webhook payload: {}", e);
            AppError::BadRequest(format!("Malformed webhook payload: {}", e))
        })
    }

    pub fn is_release_update(&self) -> bool {
        self.action == ACTION_PUBLISHED || self.action == ACTION_EDITED
    }

    /// Validate the `release` object, reporting every missing or mistyped field at once.
    pub fn release_event(&self) -> Result<ReleaseEvent, AppError> {
        let Some(release) = &self.release else {
            return Err(AppError::Validation("release is missing".to_string()));
        };

        let mut problems = Vec::new();
        let tag_name = required_string("tag_name", release.tag_name.as_ref(), &mut problems);
        let created_at = required_string("created_at", release.created_at.as_ref(), &mut problems);
        let name = nullable_string("name", release.name.as_ref(), &mut problems);
        let body = nullable_string("body", release.body.as_ref(), &mut problems);
        let published_at =
            nullable_string("published_at", release.published_at.as_ref(), &mut problems);

        if !problems.is_empty() {
            return Err(AppError::Validation(format!(
                "Invalid release payload: {}",
                problems.join(", ")
            )));
        }

        Ok(ReleaseEvent {
            tag_name: tag_name.unwrap_or_default(),
            name: name.unwrap_or_default(),
            body: body.unwrap_or_default(),
            created_at: parse_webhook_time("created_at", created_at.as_deref()),
            published_at: parse_webhook_time("published_at", published_at.as_deref()),
        })
    }
}

/// The validated part of the webhook's `release` object.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseEvent {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

fn required_string(
    key: &str,
    value: Option<&Value>,
    problems: &mut Vec<String>,
) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::String(_)) => {
            problems.push(format!("release.{} is empty", key));
            None
        }
        Some(other) => {
            problems.push(format!(
                "release.{} must be a string, got {}",
                key,
                type_name(other)
            ));
            None
        }
        None => {
            problems.push(format!("release.{} is missing", key));
            None
        }
    }
}

fn nullable_string(
    key: &str,
    value: Option<&Value>,
    problems: &mut Vec<String>,
) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) => None,
        Some(other) => {
            problems.push(format!(
                "release.{} must be a string, got {}",
                key,
                type_name(other)
            ));
            None
        }
        None => {
            problems.push(format!("release.{} is missing", key));
            None
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse a webhook timestamp; an unparsable value is logged and left empty.
fn parse_webhook_time(field: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    match NaiveDateTime::parse_from_str(value, WEBHOOK_TIME_FORMAT) {
        Ok(naive) => Some(naive.and_utc()),
        Err(e) => {
            tracing::warn!("Ignoring unparsable {} '{}': {}", field, value, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn payload(value: Value) -> ReleaseWebhookPayload {
        ReleaseWebhookPayload::parse(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_valid_release_event() {
        let p = payload(json!({
            "action": "published",
            "release": {
                "name": "v0.7.0",
                "tag_name": "v0.7.0",
                "created_at": "2024-03-01T10:20:30Z",
                "published_at": "2024-03-02T00:00:00Z",
                "body": "notes"
            }
        }));

        assert!(p.is_release_update());
        let event = p.release_event().unwrap();
        assert_eq!(event.tag_name, "v0.7.0");
        assert_eq!(event.body, "notes");
        let created = event.created_at.unwrap();
        assert_eq!((created.year(), created.month(), created.day()), (2024, 3, 1));
        assert_eq!(created.hour(), 10);
        assert!(event.published_at.is_some());
    }

    #[test]
    fn test_other_actions_are_not_updates() {
        for action in ["deleted", "created", "prereleased", "unpublished"] {
            let p = payload(json!({ "action": action }));
            assert!(!p.is_release_update(), "{action} should be ignored");
        }
    }

    #[test]
    fn test_bad_timestamp_is_not_fatal() {
        let p = payload(json!({
            "action": "edited",
            "release": {
                "name": "v1",
                "tag_name": "v1",
                "created_at": "yesterday",
                "published_at": null,
                "body": null
            }
        }));

        let event = p.release_event().unwrap();
        assert!(event.created_at.is_none());
        assert!(event.published_at.is_none());
        assert_eq!(event.body, "");
    }

    #[test]
    fn test_every_problem_is_reported() {
        let p = payload(json!({
            "action": "published",
            "release": { "name": 42, "created_at": "2024-03-01T10:20:30Z", "published_at": null, "body": "" }
        }));

        let err = p.release_event().unwrap_err();
        let message = err.message();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(message.contains("release.tag_name is missing"), "{message}");
        assert!(message.contains("release.name must be a string, got number"), "{message}");
    }

    #[test]
    fn test_null_and_missing_optional_fields_differ() {
        let p = payload(json!({
            "action": "published",
            "release": { "tag_name": "v1", "created_at": "2024-03-01T10:20:30Z", "name": null }
        }));

        let release = p.release.as_ref().unwrap();
        assert_eq!(release.name, Some(Value::Null));
        assert!(release.body.is_none());

        let message = p.release_event().unwrap_err().message();
        assert!(message.contains("release.body is missing"), "{message}");
        assert!(message.contains("release.published_at is missing"), "{message}");
        assert!(!message.contains("release.name"), "{message}");
    }

    #[test]
    fn test_release_must_be_an_object() {
        let err = ReleaseWebhookPayload::parse(br#"{"action":"published","release":"v1"}"#)
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_missing_release_object() {
        let p = payload(json!({ "action": "published" }));
        assert!(matches!(p.release_event(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_malformed_json_is_bad_request() {
        let err = ReleaseWebhookPayload::parse(b"{not json").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = ReleaseWebhookPayload::parse(br#"{"action": 7}"#).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}

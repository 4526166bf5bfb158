// src/webhook/normalizer.rs
//! Turns an inbound delivery into a verification signal or canonical events.
//!
//! Payload shapes are tried in a fixed priority order ([`PayloadShape::PRIORITY`]).
//! Each matcher either declines or claims the payload with a result; the
//! first claim wins. Adding a shape means adding a variant and its matcher.

use super::event::{CanonicalEvent, EventMetadata, Notification, SubjectKind};
use crate::constants::NOTIFICATION_MAX_NESTING;
use crate::error::NormalizeError;
use crate::types::EntityId;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Keys under which a single event names the entity it is about.
const RESOURCE_KEYS: [&str; 4] = ["entity", "resource", "item", "target"];

/// The payload shapes the normalizer understands, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{"verification_token": "..."}` handshake.
    VerificationToken,
    /// A batch: `items`/`events` arrays, a bare array, or a `payload` envelope.
    ItemContainer,
    /// One event object.
    SingleEvent,
}

impl PayloadShape {
    pub const PRIORITY: [PayloadShape; 3] = [
        PayloadShape::VerificationToken,
        PayloadShape::ItemContainer,
        PayloadShape::SingleEvent,
    ];

    pub fn describe(&self) -> &'static str {
        match self {
            PayloadShape::VerificationToken => "verification token",
            PayloadShape::ItemContainer => "item container",
            PayloadShape::SingleEvent => "single event",
        }
    }
}

/// Outcome of one shape matcher.
enum ShapeMatch {
    NoMatch,
    Matched(Result<Notification, NormalizeError>),
}

/// Normalizes webhook payloads. Stateless apart from its nesting limit.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    max_nesting: usize,
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::with_max_nesting(NOTIFICATION_MAX_NESTING)
    }
}

impl EventNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_nesting(max_nesting: usize) -> Self {
        Self { max_nesting }
    }

    /// Normalizes one delivery.
    pub fn normalize(&self, payload: &Value) -> Result<Notification, NormalizeError> {
        self.normalize_at(payload, 0)
    }

    fn normalize_at(&self, payload: &Value, nesting: usize) -> Result<Notification, NormalizeError> {
        if nesting > self.max_nesting {
            return Err(NormalizeError::NestingTooDeep {
                limit: self.max_nesting,
            });
        }

        for shape in PayloadShape::PRIORITY {
            let matched = match shape {
                PayloadShape::VerificationToken => match_verification(payload),
                PayloadShape::ItemContainer => self.match_container(payload, nesting),
                PayloadShape::SingleEvent => match_single_event(payload),
            };
            if let ShapeMatch::Matched(result) = matched {
                log::debug!("Payload matched shape '{}'", shape.describe());
                return result;
            }
        }

        Err(NormalizeError::UnrecognizedShape {
            expected: PayloadShape::PRIORITY
                .iter()
                .map(PayloadShape::describe)
                .collect(),
        })
    }

    fn match_container(&self, payload: &Value, nesting: usize) -> ShapeMatch {
        let (container, items): (&'static str, &Vec<Value>) = match payload {
            Value::Array(items) => ("array", items),
            Value::Object(map) => {
                if let Some(Value::Array(items)) = map.get("items") {
                    ("items", items)
                } else if let Some(Value::Array(items)) = map.get("events") {
                    ("events", items)
                } else if let Some(envelope @ (Value::Object(_) | Value::Array(_))) =
                    map.get("payload")
                {
                    return ShapeMatch::Matched(self.normalize_at(envelope, nesting + 1));
                } else {
                    return ShapeMatch::NoMatch;
                }
            }
            _ => return ShapeMatch::NoMatch,
        };

        ShapeMatch::Matched(self.normalize_items(container, items, nesting))
    }

    /// Normalizes each element independently. Elements that fail are skipped
    /// so one bad entry does not sink the batch.
    fn normalize_items(
        &self,
        container: &'static str,
        items: &[Value],
        nesting: usize,
    ) -> Result<Notification, NormalizeError> {
        let mut events = Vec::with_capacity(items.len());
        let mut rejected = 0;

        for (index, item) in items.iter().enumerate() {
            match self.normalize_at(item, nesting + 1) {
                Ok(Notification::Events(found)) => events.extend(found),
                Ok(Notification::Verification(_)) => {
                    log::warn!(
                        "Skipping '{}' element {}: verification token inside a batch",
                        container,
                        index
                    );
                    rejected += 1;
                }
                Err(err @ NormalizeError::NestingTooDeep { .. }) => return Err(err),
                Err(err) => {
                    log::warn!("Skipping '{}' element {}: {}", container, index, err);
                    rejected += 1;
                }
            }
        }

        if events.is_empty() {
            return Err(NormalizeError::EmptyBatch {
                container,
                rejected,
            });
        }
        Ok(Notification::Events(events))
    }
}

fn match_verification(payload: &Value) -> ShapeMatch {
    match payload.get("verification_token") {
        None => ShapeMatch::NoMatch,
        Some(Value::String(token)) => ShapeMatch::Matched(Ok(Notification::Verification(
            token.clone(),
        ))),
        Some(_) => ShapeMatch::Matched(Err(NormalizeError::InvalidVerificationToken)),
    }
}

/// Reads one event, coalescing fields from the top level and an optional
/// `event` section.
fn match_single_event(payload: &Value) -> ShapeMatch {
    let Some(raw) = payload.as_object() else {
        return ShapeMatch::NoMatch;
    };
    let section = raw.get("event").and_then(Value::as_object);
    let lookup = EventFields { raw, section };

    let Some(event_kind) = lookup.text("event_type").or_else(|| lookup.text("type")) else {
        return ShapeMatch::NoMatch;
    };

    let resource = lookup.resource();
    let subject_id = lookup.text("entity_id").or_else(|| {
        resource
            .and_then(|r| r.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
    });
    let Some(subject_id) = subject_id.and_then(|id| EntityId::parse(id).ok()) else {
        return ShapeMatch::Matched(Err(NormalizeError::IncompleteEvent {
            missing: "subject id",
        }));
    };

    let subject_kind = lookup
        .text("entity_type")
        .or_else(|| {
            resource
                .and_then(|r| r.get("type"))
                .and_then(Value::as_str)
                .filter(|kind| !kind.trim().is_empty())
        })
        .map(SubjectKind::parse)
        .unwrap_or_default();

    let metadata = EventMetadata {
        event_id: lookup
            .text("event_id")
            .or_else(|| lookup.section_text("id"))
            .map(str::to_string),
        timestamp: lookup.text("timestamp").and_then(parse_timestamp),
        workspace_id: lookup.text("workspace_id").map(str::to_string),
        webhook_id: lookup
            .text("webhook_id")
            .or_else(|| lookup.text("subscription_id"))
            .map(str::to_string),
        user_id: lookup.text("user_id").map(str::to_string),
        request_id: lookup.text("request_id").map(str::to_string),
    };

    ShapeMatch::Matched(Ok(Notification::Events(vec![CanonicalEvent {
        event_kind: event_kind.to_string(),
        subject_id,
        subject_kind,
        metadata,
        raw: payload.clone(),
    }])))
}

/// Field lookup over an event's top level and its `event` section.
struct EventFields<'a> {
    raw: &'a Map<String, Value>,
    section: Option<&'a Map<String, Value>>,
}

impl<'a> EventFields<'a> {
    /// First non-blank string under `key`, top level first.
    fn text(&self, key: &str) -> Option<&'a str> {
        let non_blank = |map: &'a Map<String, Value>| {
            map.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
        };
        non_blank(self.raw).or_else(|| self.section.and_then(non_blank))
    }

    /// Non-blank string under `key` in the `event` section only. A flat
    /// event is its own section.
    fn section_text(&self, key: &str) -> Option<&'a str> {
        self.section
            .unwrap_or(self.raw)
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// The resource object, preferring the `event` section.
    fn resource(&self) -> Option<&'a Map<String, Value>> {
        let find = |map: &'a Map<String, Value>| {
            RESOURCE_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_object))
        };
        self.section.and_then(find).or_else(|| find(self.raw))
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            log::debug!("Ignoring unparseable event timestamp '{}': {}", value, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(payload: Value) -> Result<Notification, NormalizeError> {
        EventNormalizer::default().normalize(&payload)
    }

    fn subjects(notification: &Notification) -> Vec<&str> {
        notification
            .events()
            .iter()
            .map(|e| e.subject_id.as_str())
            .collect()
    }

    #[test]
    fn verification_token_is_not_an_event() {
        let result = normalize(json!({"verification_token": "abc"})).unwrap();
        assert_eq!(result, Notification::Verification("abc".to_string()));
    }

    #[test]
    fn non_string_verification_token_is_rejected() {
        assert_eq!(
            normalize(json!({"verification_token": 42})),
            Err(NormalizeError::InvalidVerificationToken)
        );
    }

    #[test]
    fn items_keep_input_order() {
        let result = normalize(json!({"items": [
            {"type": "page.updated", "entity": {"id": "p1"}},
            {"type": "page.updated", "entity": {"id": "p2"}}
        ]}))
        .unwrap();

        assert_eq!(subjects(&result), vec!["p1", "p2"]);
        assert!(result
            .events()
            .iter()
            .all(|e| e.event_kind == "page.updated" && e.subject_kind == SubjectKind::Page));
    }

    #[test]
    fn empty_object_is_malformed() {
        let err = normalize(json!({})).unwrap_err();
        assert!(matches!(err, NormalizeError::UnrecognizedShape { .. }));
        assert!(err.to_string().contains("verification token"));
        assert!(err.to_string().contains("item container"));
        assert!(err.to_string().contains("single event"));
    }

    #[test]
    fn legacy_flat_event() {
        let result = normalize(json!({
            "id": "delivery-1",
            "timestamp": "2024-05-01T12:00:00Z",
            "workspace_id": "ws",
            "event_id": "evt-1",
            "subscription_id": "sub-9",
            "event_type": "database.updated",
            "entity_id": "db1",
            "entity_type": "database",
            "extra_field": {"ignored": true}
        }))
        .unwrap();

        let event = &result.events()[0];
        assert_eq!(event.subject_id.as_str(), "db1");
        assert_eq!(event.subject_kind, SubjectKind::Database);
        assert_eq!(event.metadata.event_id.as_deref(), Some("evt-1"));
        assert_eq!(event.metadata.webhook_id.as_deref(), Some("sub-9"));
        assert_eq!(event.metadata.workspace_id.as_deref(), Some("ws"));
        assert_eq!(
            event.metadata.timestamp.map(|t| t.to_rfc3339()),
            Some("2024-05-01T12:00:00+00:00".to_string())
        );
    }

    #[test]
    fn nested_event_section_and_resource() {
        let result = normalize(json!({
            "event": {"id": "evt-2", "type": "page.created", "resource": {"id": "p9", "type": "page"}}
        }))
        .unwrap();

        let event = &result.events()[0];
        assert_eq!(event.event_kind, "page.created");
        assert_eq!(event.subject_id.as_str(), "p9");
        assert_eq!(event.metadata.event_id.as_deref(), Some("evt-2"));
    }

    #[test]
    fn flat_event_id_user_and_request_ids() {
        let result = normalize(json!({
            "id": "evt-7",
            "type": "page.content_updated",
            "entity": {"id": "p1", "type": "page"},
            "user_id": "user-3",
            "event": "not-an-object",
            "request_id": "req-5"
        }))
        .unwrap();

        let metadata = &result.events()[0].metadata;
        assert_eq!(metadata.event_id.as_deref(), Some("evt-7"));
        assert_eq!(metadata.user_id.as_deref(), Some("user-3"));
        assert_eq!(metadata.request_id.as_deref(), Some("req-5"));
    }

    #[test]
    fn nested_section_supplies_user_and_request_ids() {
        let result = normalize(json!({
            "event": {
                "type": "database.deleted",
                "entity_id": "db2",
                "user_id": "user-9",
                "request_id": "req-1"
            }
        }))
        .unwrap();

        let metadata = &result.events()[0].metadata;
        assert_eq!(metadata.event_id, None);
        assert_eq!(metadata.user_id.as_deref(), Some("user-9"));
        assert_eq!(metadata.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn subject_kind_defaults_to_page_and_keeps_unknown_kinds() {
        let default_kind = normalize(json!({"type": "x", "entity_id": "e"})).unwrap();
        assert_eq!(default_kind.events()[0].subject_kind, SubjectKind::Page);

        let comment = normalize(json!({"type": "comment.created", "entity": {"id": "c1", "type": "comment"}}))
            .unwrap();
        assert_eq!(
            comment.events()[0].subject_kind,
            SubjectKind::Other("comment".to_string())
        );
    }

    #[test]
    fn event_without_subject_is_incomplete() {
        assert_eq!(
            normalize(json!({"type": "page.updated"})),
            Err(NormalizeError::IncompleteEvent {
                missing: "subject id"
            })
        );
    }

    #[test]
    fn malformed_elements_are_skipped() {
        let result = normalize(json!({"events": [
            {"type": "page.updated"},
            "garbage",
            {"type": "page.updated", "entity_id": "p3"}
        ]}))
        .unwrap();
        assert_eq!(subjects(&result), vec!["p3"]);
    }

    #[test]
    fn batch_without_usable_events_fails() {
        assert_eq!(
            normalize(json!({"items": [{"nothing": 1}, 7]})),
            Err(NormalizeError::EmptyBatch {
                container: "items",
                rejected: 2
            })
        );
        assert_eq!(
            normalize(json!({"items": []})),
            Err(NormalizeError::EmptyBatch {
                container: "items",
                rejected: 0
            })
        );
    }

    #[test]
    fn bare_arrays_and_payload_envelopes() {
        let bare = normalize(json!([{"type": "page.updated", "entity_id": "a"}])).unwrap();
        assert_eq!(subjects(&bare), vec!["a"]);

        let envelope = normalize(json!({"payload": {"events": [
            {"type": "page.updated", "entity_id": "b"},
            {"type": "page.updated", "entity_id": "c"}
        ]}}))
        .unwrap();
        assert_eq!(subjects(&envelope), vec!["b", "c"]);

        let single = normalize(json!({"payload": {"type": "page.deleted", "entity_id": "d"}})).unwrap();
        assert_eq!(subjects(&single), vec!["d"]);
    }

    #[test]
    fn nested_containers_are_flattened_in_order() {
        let result = normalize(json!({"items": [
            {"events": [{"type": "t", "entity_id": "x1"}, {"type": "t", "entity_id": "x2"}]},
            {"type": "t", "entity_id": "x3"}
        ]}))
        .unwrap();
        assert_eq!(subjects(&result), vec!["x1", "x2", "x3"]);
    }

    #[test]
    fn nesting_is_bounded() {
        let mut payload = json!({"type": "t", "entity_id": "deep"});
        for _ in 0..4 {
            payload = json!({ "items": [payload] });
        }

        assert!(EventNormalizer::with_max_nesting(4).normalize(&payload).is_ok());
        assert_eq!(
            EventNormalizer::with_max_nesting(3).normalize(&payload),
            Err(NormalizeError::NestingTooDeep { limit: 3 })
        );
    }

    #[test]
    fn normalizing_twice_is_identical() {
        let payload = json!({"items": [{"type": "page.updated", "entity": {"id": "p1"}}]});
        assert_eq!(normalize(payload.clone()), normalize(payload));
    }
}

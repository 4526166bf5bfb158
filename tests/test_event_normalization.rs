use notion_snapshot::{EventNormalizer, NormalizeError, Notification, SubjectKind};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn normalize(payload: Value) -> Result<Notification, NormalizeError> {
    EventNormalizer::default().normalize(&payload)
}

fn kinds_and_subjects(notification: &Notification) -> Vec<(String, String)> {
    notification
        .events()
        .iter()
        .map(|e| (e.event_kind.clone(), e.subject_id.to_string()))
        .collect()
}

#[test]
fn verification_handshake() {
    let notification = normalize(json!({"verification_token": "secret_tok"})).unwrap();
    assert_eq!(notification.verification_token(), Some("secret_tok"));
    assert!(notification.events().is_empty());
}

#[test]
fn current_delivery_shape() {
    let notification = normalize(json!({
        "id": "evt-1",
        "timestamp": "2024-05-01T12:00:00.000Z",
        "workspace_id": "ws-1",
        "subscription_id": "sub-1",
        "type": "page.content_updated",
        "entity": {"id": "59833787-2cf9-4fdf-8782-e53db20768a5", "type": "page"}
    }))
    .unwrap();

    let events = notification.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.event_kind, "page.content_updated");
    assert_eq!(event.subject_id.as_str(), "59833787-2cf9-4fdf-8782-e53db20768a5");
    assert_eq!(event.subject_kind, SubjectKind::Page);
    assert_eq!(event.metadata.workspace_id.as_deref(), Some("ws-1"));
    assert_eq!(event.metadata.webhook_id.as_deref(), Some("sub-1"));
    assert_eq!(event.metadata.event_id.as_deref(), Some("evt-1"));
    assert!(event.metadata.timestamp.is_some());
}

#[test]
fn legacy_flat_shape_defaults_to_page() {
    let notification = normalize(json!({
        "event_type": "page.updated",
        "entity_id": "abc"
    }))
    .unwrap();

    assert_eq!(
        kinds_and_subjects(&notification),
        vec![("page.updated".to_string(), "abc".to_string())]
    );
    assert_eq!(notification.events()[0].subject_kind, SubjectKind::Page);
}

#[test]
fn batch_skips_malformed_elements_and_keeps_order() {
    let notification = normalize(json!({"events": [
        {"type": "database.updated", "entity": {"id": "db1", "type": "database"}},
        {"type": "page.updated"},
        "not an event",
        {"type": "comment.created", "entity": {"id": "c1", "type": "comment"}},
        {"type": "page.created", "entity": {"id": "p1"}}
    ]}))
    .unwrap();

    assert_eq!(
        kinds_and_subjects(&notification),
        vec![
            ("database.updated".to_string(), "db1".to_string()),
            ("comment.created".to_string(), "c1".to_string()),
            ("page.created".to_string(), "p1".to_string()),
        ]
    );
    assert_eq!(
        notification.events()[1].subject_kind,
        SubjectKind::Other("comment".to_string())
    );
}

#[test]
fn envelope_and_bare_array() {
    let wrapped = normalize(json!({"payload": {"events": [
        {"type": "page.updated", "entity": {"id": "p1"}}
    ]}}))
    .unwrap();
    let bare = normalize(json!([
        {"type": "page.updated", "entity": {"id": "p1"}}
    ]))
    .unwrap();

    assert_eq!(kinds_and_subjects(&wrapped), kinds_and_subjects(&bare));
}

#[test]
fn batch_of_only_bad_elements_is_empty() {
    assert_eq!(
        normalize(json!({"items": [{"type": "page.updated"}, 7]})),
        Err(NormalizeError::EmptyBatch {
            container: "items",
            rejected: 2
        })
    );
}

#[test]
fn event_without_subject_is_incomplete() {
    assert_eq!(
        normalize(json!({"type": "page.deleted", "entity": {"type": "page"}})),
        Err(NormalizeError::IncompleteEvent {
            missing: "subject id"
        })
    );
}

#[test]
fn unknown_shapes_are_rejected() {
    for payload in [json!({"hello": "world"}), json!("text"), json!(3)] {
        assert!(matches!(
            normalize(payload),
            Err(NormalizeError::UnrecognizedShape { .. })
        ));
    }
}

#[test]
fn nesting_is_bounded() {
    let mut payload = json!({"type": "page.updated", "entity": {"id": "p1"}});
    for _ in 0..4 {
        payload = json!({ "payload": payload });
    }

    assert!(EventNormalizer::with_max_nesting(8).normalize(&payload).is_ok());
    assert_eq!(
        EventNormalizer::with_max_nesting(2).normalize(&payload),
        Err(NormalizeError::NestingTooDeep { limit: 2 })
    );
}

// src/webhook/event.rs
//! Canonical event records produced by the normalizer.

use crate::constants::DEFAULT_SUBJECT_KIND;
use crate::model::EntityKind;
use crate::types::EntityId;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// What kind of entity an event is about.
///
/// Kinds other than pages and databases (comments, data sources, ...) are
/// carried through so newer deliveries still normalize; they are not
/// snapshotted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubjectKind {
    Page,
    Database,
    Other(String),
}

impl SubjectKind {
    pub fn parse(kind: &str) -> Self {
        match kind.trim() {
            "page" => SubjectKind::Page,
            "database" => SubjectKind::Database,
            other => SubjectKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SubjectKind::Page => "page",
            SubjectKind::Database => "database",
            SubjectKind::Other(kind) => kind,
        }
    }

    /// The snapshot kind, if this subject can be snapshotted.
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            SubjectKind::Page => Some(EntityKind::Page),
            SubjectKind::Database => Some(EntityKind::Database),
            SubjectKind::Other(_) => None,
        }
    }
}

impl Default for SubjectKind {
    fn default() -> Self {
        Self::parse(DEFAULT_SUBJECT_KIND)
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubjectKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Delivery metadata, coalesced from the field aliases used across payload
/// versions. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventMetadata {
    pub event_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub workspace_id: Option<String>,
    pub webhook_id: Option<String>,
    pub user_id: Option<String>,
    pub request_id: Option<String>,
}

/// One normalized change notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalEvent {
    pub event_kind: String,
    pub subject_id: EntityId,
    pub subject_kind: SubjectKind,
    pub metadata: EventMetadata,
    /// The source fragment this event was read from, for diagnostics.
    pub raw: Value,
}

/// Result of normalizing one delivery: a verification handshake or events.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Verification(String),
    Events(Vec<CanonicalEvent>),
}

impl Notification {
    pub fn events(&self) -> &[CanonicalEvent] {
        match self {
            Notification::Events(events) => events,
            Notification::Verification(_) => &[],
        }
    }

    pub fn verification_token(&self) -> Option<&str> {
        match self {
            Notification::Verification(token) => Some(token),
            Notification::Events(_) => None,
        }
    }
}

use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The two document kinds that can be snapshotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Page,
    Database,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Page => "page",
            EntityKind::Database => "database",
        }
    }

    /// Directory name used by fixture trees (`pages/`, `databases/`).
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Page => "pages",
            EntityKind::Database => "databases",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered snapshot of one entity, handed to a `SnapshotStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: EntityId,
    pub kind: EntityKind,
    pub title: String,
    pub url: String,
    pub markdown: String,
}

/// A fetched entity in the provider's native JSON shape.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDocument {
    pub id: EntityId,
    pub kind: EntityKind,
    /// The page or database object itself (properties, title, url).
    pub object: Value,
    /// Top-level content blocks, children already attached.
    pub blocks: Vec<Value>,
}

impl EntityDocument {
    pub fn new(id: EntityId, kind: EntityKind, object: Value) -> Self {
        Self {
            id,
            kind,
            object,
            blocks: Vec::new(),
        }
    }

    pub fn with_blocks(mut self, blocks: Vec<Value>) -> Self {
        self.blocks = blocks;
        self
    }
}

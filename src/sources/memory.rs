// src/sources/memory.rs
use crate::error::AppError;
use crate::model::{EntityKind, EntitySummary};
use crate::pipeline::SnapshotStore;
use crate::types::EntityId;
use dashmap::DashMap;

/// In-memory `SnapshotStore`. Upserts are keyed by kind and id, so a later
/// snapshot of the same entity replaces the earlier one.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: DashMap<(EntityKind, EntityId), EntitySummary>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: EntityKind, id: &EntityId) -> Option<EntitySummary> {
        self.snapshots
            .get(&(kind, id.clone()))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// All stored snapshots, ordered by kind then id.
    pub fn snapshots(&self) -> Vec<EntitySummary> {
        let mut all: Vec<EntitySummary> = self
            .snapshots
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| {
            a.kind
                .as_str()
                .cmp(b.kind.as_str())
                .then_with(|| a.id.cmp(&b.id))
        });
        all
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn upsert(&self, summary: &EntitySummary) -> Result<(), AppError> {
        let replaced = self
            .snapshots
            .insert((summary.kind, summary.id.clone()), summary.clone())
            .is_some();
        log::debug!(
            "{} snapshot for {} {}",
            if replaced { "Replaced" } else { "Inserted" },
            summary.kind,
            summary.id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, title: &str) -> EntitySummary {
        EntitySummary {
            id: EntityId::new(id),
            kind: EntityKind::Page,
            title: title.to_string(),
            url: format!("https://www.notion.so/{}", id),
            markdown: String::new(),
        }
    }

    #[tokio::test]
    async fn upsert_replaces_existing_snapshot() {
        let store = MemorySnapshotStore::new();
        store.upsert(&summary("p1", "First")).await.unwrap();
        store.upsert(&summary("p1", "Second")).await.unwrap();

        assert_eq!(store.len(), 1);
        let stored = store.get(EntityKind::Page, &EntityId::new("p1")).unwrap();
        assert_eq!(stored.title, "Second");
        assert!(store.get(EntityKind::Database, &EntityId::new("p1")).is_none());
    }
}

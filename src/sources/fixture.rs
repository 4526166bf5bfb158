// src/sources/fixture.rs
//! Reads entities from a fixture directory.
//!
//! Layout:
//!
//! ```text
//! <root>/pages/<id>.json       page object
//! <root>/databases/<id>.json   database object
//! <root>/blocks/<id>.json      top-level blocks (array or {"results": [...]})
//! ```

use crate::error::AppError;
use crate::model::{EntityDocument, EntityKind};
use crate::pipeline::EntitySource;
use crate::types::EntityId;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// An `EntitySource` backed by JSON files on disk.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    root: PathBuf,
}

impl FixtureSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entity_path(&self, id: &EntityId, kind: EntityKind) -> PathBuf {
        self.root
            .join(kind.plural())
            .join(format!("{}.json", id.as_str()))
    }

    fn blocks_path(&self, id: &EntityId) -> PathBuf {
        self.root.join("blocks").join(format!("{}.json", id.as_str()))
    }

    /// Reads and parses a JSON file. A missing file is `Ok(None)`.
    async fn read_json(&self, id: &EntityId, path: &Path) -> Result<Option<Value>, AppError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::SourceFailed {
                    id: id.to_string(),
                    cause: format!("{}: {}", path.display(), e),
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| AppError::JsonParseError {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait::async_trait]
impl EntitySource for FixtureSource {
    async fn fetch_entity(
        &self,
        id: &EntityId,
        kind: EntityKind,
    ) -> Result<Option<EntityDocument>, AppError> {
        let entity_path = self.entity_path(id, kind);
        let Some(object) = self.read_json(id, &entity_path).await? else {
            log::debug!("No fixture at {}", entity_path.display());
            return Ok(None);
        };

        let blocks = match self.read_json(id, &self.blocks_path(id)).await? {
            Some(Value::Array(blocks)) => blocks,
            Some(Value::Object(mut map)) => match map.remove("results") {
                Some(Value::Array(blocks)) => blocks,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        log::debug!(
            "Loaded {} {} with {} top-level block(s)",
            kind,
            id,
            blocks.len()
        );
        Ok(Some(
            EntityDocument::new(id.clone(), kind, object).with_blocks(blocks),
        ))
    }
}

// src/snapshot.rs
//! Composes a fetched entity into its stored snapshot.

use crate::analytics::measure_blocks;
use crate::formatting::{render_blocks, TitleExtractor};
use crate::model::{parse_block, Block, EntityDocument, EntitySummary};
use crate::types::{EntityId, ValidatedUrl};
use serde_json::Value;

/// Builds [`EntitySummary`] values: title, URL and Markdown.
#[derive(Debug, Clone)]
pub struct SnapshotComposer {
    titles: TitleExtractor,
    page_base_url: ValidatedUrl,
}

impl SnapshotComposer {
    pub fn new(titles: TitleExtractor, page_base_url: ValidatedUrl) -> Self {
        Self {
            titles,
            page_base_url,
        }
    }

    pub fn compose(&self, document: &EntityDocument) -> EntitySummary {
        let found_title = self.titles.find_title(&document.object, document.kind);
        let url = provided_url(&document.object).unwrap_or_else(|| {
            build_page_url(&self.page_base_url, found_title.as_deref(), &document.id)
        });

        let blocks: Vec<Block> = document.blocks.iter().map(parse_block).collect();
        let markdown = render_blocks(&blocks);

        let stats = measure_blocks(&blocks);
        log::debug!(
            "Composed {} {} ({} blocks, depth {}, {} bytes of markdown)",
            document.kind,
            document.id,
            stats.total_blocks,
            stats.deepest_nesting,
            markdown.len()
        );
        if stats.has_unsupported() {
            log::debug!(
                "{} {} contains unsupported block kinds: {:?}",
                document.kind,
                document.id,
                stats.unsupported_kinds
            );
        }

        EntitySummary {
            id: document.id.clone(),
            kind: document.kind,
            title: found_title.unwrap_or_else(|| self.titles.placeholder().to_string()),
            url,
            markdown,
        }
    }
}

fn provided_url(object: &Value) -> Option<String> {
    object
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// `{base}{slug}-{compact_id}`, or `{base}{compact_id}` when the title leaves
/// no slug. The slug keeps alphanumerics and `-`, with spaces turned into `-`.
pub fn build_page_url(base: &ValidatedUrl, title: Option<&str>, id: &EntityId) -> String {
    let slug: String = title
        .unwrap_or_default()
        .trim()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect();

    if slug.is_empty() {
        format!("{}{}", base.as_base(), id.compact())
    } else {
        format!("{}{}-{}", base.as_base(), slug, id.compact())
    }
}

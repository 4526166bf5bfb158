// src/analytics/mod.rs
//! Block tree statistics for diagnostics logging.

use crate::constants::BLOCK_MAX_RENDER_DEPTH;
use crate::model::{Block, BlockVisitor, ChildDatabaseBlock, ChildPageBlock, UnsupportedBlock};
use std::collections::BTreeSet;

/// Counts and depth of a block tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTreeStats {
    pub total_blocks: usize,
    /// 1 for a flat list, 0 for an empty tree.
    pub deepest_nesting: usize,
    pub child_entities: usize,
    /// Distinct kinds that rendered through the fallback arm.
    pub unsupported_kinds: BTreeSet<String>,
}

impl BlockTreeStats {
    pub fn has_unsupported(&self) -> bool {
        !self.unsupported_kinds.is_empty()
    }
}

/// Collects per-block facts that need the concrete variant.
#[derive(Default)]
struct KindCollector {
    child_entities: usize,
    unsupported_kinds: BTreeSet<String>,
}

impl BlockVisitor for KindCollector {
    type Output = ();

    fn visit_child_page(&mut self, _page: &ChildPageBlock) {
        self.child_entities += 1;
    }

    fn visit_child_database(&mut self, _database: &ChildDatabaseBlock) {
        self.child_entities += 1;
    }

    fn visit_unsupported(&mut self, block: &UnsupportedBlock) {
        self.unsupported_kinds.insert(block.block_type.clone());
    }
}

/// Measures a block tree. Levels below [`BLOCK_MAX_RENDER_DEPTH`] nested
/// children are not visited.
pub fn measure_blocks(blocks: &[Block]) -> BlockTreeStats {
    let mut collector = KindCollector::default();
    let mut stats = BlockTreeStats::default();
    walk_blocks(&mut stats, &mut collector, blocks, 1);

    stats.child_entities = collector.child_entities;
    stats.unsupported_kinds = collector.unsupported_kinds;
    stats
}

fn walk_blocks(
    stats: &mut BlockTreeStats,
    collector: &mut KindCollector,
    blocks: &[Block],
    depth: usize,
) {
    if blocks.is_empty() || depth > BLOCK_MAX_RENDER_DEPTH + 1 {
        return;
    }
    stats.deepest_nesting = stats.deepest_nesting.max(depth);

    for block in blocks {
        stats.total_blocks += 1;
        block.accept(collector);
        walk_blocks(stats, collector, block.children(), depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_blocks, BlockCommon, ToggleBlock};
    use serde_json::json;

    #[test]
    fn empty_tree_has_no_depth() {
        assert_eq!(measure_blocks(&[]), BlockTreeStats::default());
    }

    #[test]
    fn counts_nested_blocks_and_fallbacks() {
        let blocks = parse_blocks(&json!([
            {"type": "toggle", "toggle": {"rich_text": []}, "children": [
                {"type": "paragraph", "paragraph": {"rich_text": []}, "children": [
                    {"type": "synced_block", "synced_block": {}}
                ]}
            ]},
            {"type": "child_page", "child_page": {"title": "Sub"}},
            {"type": "breadcrumb", "breadcrumb": {}}
        ]));

        let stats = measure_blocks(&blocks);
        assert_eq!(stats.total_blocks, 5);
        assert_eq!(stats.deepest_nesting, 3);
        assert_eq!(stats.child_entities, 1);
        assert!(stats.has_unsupported());
        assert_eq!(
            stats.unsupported_kinds.into_iter().collect::<Vec<_>>(),
            vec!["breadcrumb".to_string(), "synced_block".to_string()]
        );
    }

    #[test]
    fn deep_trees_stop_at_the_render_limit() {
        let mut block = Block::Toggle(ToggleBlock::default());
        for _ in 0..BLOCK_MAX_RENDER_DEPTH + 20 {
            block = Block::Toggle(ToggleBlock {
                common: BlockCommon::default().with_children(vec![block]),
                ..Default::default()
            });
        }

        let stats = measure_blocks(&[block]);
        assert_eq!(stats.deepest_nesting, BLOCK_MAX_RENDER_DEPTH + 1);
        assert_eq!(stats.total_blocks, BLOCK_MAX_RENDER_DEPTH + 1);
    }
}

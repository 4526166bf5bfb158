use super::Block;
use crate::types::BlockId;
use serde::{Deserialize, Serialize};

/// Common fields for all blocks.
///
/// `has_children` mirrors the provider's flag and may be true while
/// `children` is empty (children not fetched). Rendering only looks at
/// `children`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockCommon {
    pub id: BlockId,
    pub children: Vec<Block>,
    pub has_children: bool,
}

impl BlockCommon {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            children: Vec::new(),
            has_children: false,
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }
}

mod block;
pub mod blocks;
pub mod common;
mod entity;
pub mod parse;

pub use block::{Block, BlockVisitor};
pub use blocks::*;
pub use common::*;
pub use entity::{EntityDocument, EntityKind, EntitySummary};
pub use parse::{parse_block, parse_blocks, parse_rich_text};

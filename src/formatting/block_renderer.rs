// src/formatting/block_renderer.rs
//! Tree rendering: walks a top-level block sequence and joins the lines.

use super::pure_visitor::{BlockRenderer, MarkdownBlockRenderer, RenderOptions};
use super::state::RenderContext;
use crate::constants::CHARS_PER_BLOCK_ESTIMATE;
use crate::model::{parse_blocks, Block};
use serde_json::Value;

// --- Public API ---

/// Renders a slice of blocks into markdown with default options.
///
/// Each call owns a fresh [`RenderContext`], so rendering the same blocks
/// twice yields identical text.
pub fn render_blocks(blocks: &[Block]) -> String {
    render_blocks_with(blocks, &RenderOptions::default())
}

/// Renders a slice of blocks into markdown.
///
/// Every line is followed by `\n`, so non-empty output ends with a trailing
/// newline. Input that produces no lines (including an empty slice) yields
/// `""`, not a lone `"\n"` as a plain join-then-append would.
pub fn render_blocks_with(blocks: &[Block], options: &RenderOptions) -> String {
    let renderer = MarkdownBlockRenderer::new(options.clone());
    let mut context = RenderContext::new();

    let lines = renderer.render_children(blocks, 0, &mut context);

    let mut output = String::with_capacity(blocks.len() * CHARS_PER_BLOCK_ESTIMATE);
    for line in &lines {
        output.push_str(line);
        output.push('\n');
    }

    log::debug!(
        "Rendered {} top-level blocks into {} lines ({} bytes)",
        blocks.len(),
        lines.len(),
        output.len()
    );
    output
}

/// Parses provider block JSON and renders it.
pub fn render_markdown(value: &Value) -> String {
    render_blocks(&parse_blocks(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::types::{BlockId, RichTextItem};

    fn item(kind: &str, text: &str) -> Block {
        let common = BlockCommon::new(BlockId::new(text));
        let content = TextBlockContent::new(vec![RichTextItem::plain_text(text)]);
        match kind {
            "numbered" => Block::NumberedListItem(NumberedListItemBlock { common, content }),
            "bulleted" => Block::BulletedListItem(BulletedListItemBlock { common, content }),
            _ => Block::Paragraph(ParagraphBlock { common, content }),
        }
    }

    #[test]
    fn test_numbered_list_counter_increments() {
        let blocks = vec![
            item("numbered", "First item"),
            item("numbered", "Second item"),
            item("numbered", "Third item"),
        ];

        assert_eq!(
            render_blocks(&blocks),
            "1. First item\n2. Second item\n3. Third item\n"
        );
    }

    #[test]
    fn other_kinds_reset_numbering() {
        let blocks = vec![
            item("numbered", "a"),
            item("numbered", "b"),
            item("bulleted", "c"),
            item("numbered", "d"),
        ];

        assert_eq!(render_blocks(&blocks), "1. a\n2. b\n- c\n1. d\n");
    }

    #[test]
    fn empty_input_renders_empty_string() {
        assert_eq!(render_blocks(&[]), "");
    }

    #[test]
    fn render_markdown_parses_then_renders() {
        let value = serde_json::json!([
            {"type": "heading_1", "heading_1": {"rich_text": [{"plain_text": "Doc"}]}},
            {"type": "divider", "divider": {}}
        ]);
        assert_eq!(render_markdown(&value), "# Doc\n---\n");
    }
}

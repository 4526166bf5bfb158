// src/formatting/pure_visitor.rs
//! Per-block Markdown rendering.
//!
//! A block renders to zero or more physical lines. Lines are produced
//! unindented and then prefixed with `depth * INDENT_SPACES` spaces, so
//! every kind nests the same way. Children render at `depth + 1` with the
//! same [`RenderContext`].

use super::rich_text::rich_text_to_markdown;
use super::state::RenderContext;
use crate::constants::{
    BLOCK_MAX_RENDER_DEPTH, CALLOUT_DEFAULT_ICON, CODE_FENCE_MIN_BACKTICKS, INDENT_SPACES,
    UNTITLED_CHILD_DATABASE, UNTITLED_CHILD_PAGE,
};
use crate::model::*;
use crate::types::{concat_plain_text, RichTextItem};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BACKTICK_RUN: Regex = Regex::new("`+").expect("valid backtick regex");
}

/// Knobs for one render. The defaults match the crate constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Deepest depth at which blocks are still rendered.
    pub max_depth: usize,
    /// Spaces per nesting level.
    pub indent_spaces: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: BLOCK_MAX_RENDER_DEPTH,
            indent_spaces: INDENT_SPACES,
        }
    }
}

/// Trait for formatting blocks into output lines.
pub trait BlockRenderer {
    /// Render one block, and its children, at `depth`.
    fn render_block(&self, block: &Block, depth: usize, context: &mut RenderContext)
        -> Vec<String>;

    /// Render a sibling sequence in order, threading the context through.
    fn render_children(
        &self,
        blocks: &[Block],
        depth: usize,
        context: &mut RenderContext,
    ) -> Vec<String> {
        let mut lines = Vec::with_capacity(blocks.len());
        for block in blocks {
            lines.extend(self.render_block(block, depth, context));
        }
        lines
    }
}

/// Formats blocks as Markdown.
#[derive(Debug, Clone, Default)]
pub struct MarkdownBlockRenderer {
    options: RenderOptions,
}

impl MarkdownBlockRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Lines for the block itself, before indentation.
    fn own_lines(&self, block: &Block, depth: usize, context: &mut RenderContext) -> Vec<String> {
        match block {
            Block::Paragraph(b) => {
                let text = rich_text_to_markdown(&b.content.rich_text);
                if text.trim().is_empty() {
                    Vec::new()
                } else {
                    split_lines(&text)
                }
            }
            Block::Heading1(b) => prefixed_lines("#", &b.content),
            Block::Heading2(b) => prefixed_lines("##", &b.content),
            Block::Heading3(b) => prefixed_lines("###", &b.content),
            Block::BulletedListItem(b) => prefixed_lines("-", &b.content),
            Block::Toggle(b) => prefixed_lines("-", &b.content),
            Block::NumberedListItem(b) => {
                let number = context.next_number(depth);
                prefixed_lines(&format!("{}.", number), &b.content)
            }
            Block::ToDo(b) => {
                let checkbox = if b.checked { "- [x]" } else { "- [ ]" };
                prefixed_lines(checkbox, &b.content)
            }
            Block::Quote(b) => quote_lines(">", &rich_text_to_markdown(&b.content.rich_text)),
            Block::Callout(b) => {
                let icon = b
                    .icon
                    .as_ref()
                    .and_then(Icon::emoji)
                    .unwrap_or(CALLOUT_DEFAULT_ICON);
                quote_lines(
                    &format!("> {}", icon),
                    &rich_text_to_markdown(&b.content.rich_text),
                )
            }
            Block::Code(b) => code_lines(b),
            Block::Equation(b) => vec!["$$".to_string(), b.expression.clone(), "$$".to_string()],
            Block::Divider(_) => vec!["---".to_string()],
            Block::Image(b) => {
                let Some(url) = b.image.as_ref().map(FileObject::url).filter(|u| !u.is_empty())
                else {
                    log::debug!("Image block {} has no URL; skipping", b.common.id);
                    return Vec::new();
                };
                let caption = rich_text_to_markdown(&b.caption);
                let label = if caption.trim().is_empty() {
                    "image"
                } else {
                    caption.trim()
                };
                vec![format!("[{}]({})", label, url)]
            }
            Block::Bookmark(b) => {
                let caption = rich_text_to_markdown(&b.caption);
                let caption = caption.trim();
                match (b.url.is_empty(), caption.is_empty()) {
                    (false, true) => vec![format!("[{}]({})", b.url, b.url)],
                    (false, false) => vec![format!("[{}]({})", caption, b.url)],
                    (true, false) => vec![caption.to_string()],
                    (true, true) => Vec::new(),
                }
            }
            Block::ChildPage(b) => vec![format!("## {}", or_default(&b.title, UNTITLED_CHILD_PAGE))],
            Block::ChildDatabase(b) => {
                vec![format!("## {}", or_default(&b.title, UNTITLED_CHILD_DATABASE))]
            }
            Block::Table(b) => table_lines(b),
            Block::TableRow(b) => vec![table_row_line(&b.cells, b.cells.len())],
            Block::Unsupported(b) => {
                if b.plain_text.trim().is_empty() {
                    vec![format!("[Unsupported block type: {}]", b.block_type)]
                } else {
                    split_lines(&b.plain_text)
                }
            }
        }
    }
}

impl BlockRenderer for MarkdownBlockRenderer {
    fn render_block(
        &self,
        block: &Block,
        depth: usize,
        context: &mut RenderContext,
    ) -> Vec<String> {
        if !matches!(block, Block::NumberedListItem(_)) {
            context.reset(depth);
        }

        let indent = " ".repeat(depth * self.options.indent_spaces);
        let mut lines: Vec<String> = self
            .own_lines(block, depth, context)
            .into_iter()
            .map(|line| indent_line(&line, &indent))
            .collect();

        // Table rows are consumed by the table itself
        let children: &[Block] = match block {
            Block::Table(_) => &[],
            _ => block.children(),
        };
        if children.is_empty() {
            return lines;
        }

        if depth + 1 > self.options.max_depth {
            log::warn!(
                "Block {} nests deeper than {} levels; dropping {} child block(s)",
                block.id(),
                self.options.max_depth,
                children.len()
            );
            return lines;
        }

        context.enter_children(depth);
        lines.extend(self.render_children(children, depth + 1, context));
        lines
    }
}

// --- Helpers ---

/// `prefix text`, or the bare prefix when there is no text. Continuation
/// lines of multi-line text carry no prefix.
fn prefixed_lines(prefix: &str, content: &TextBlockContent) -> Vec<String> {
    let text = rich_text_to_markdown(&content.rich_text);
    if text.trim().is_empty() {
        return vec![prefix.to_string()];
    }
    let mut lines = split_lines(&text);
    if let Some(first) = lines.first_mut() {
        *first = format!("{} {}", prefix, first);
    }
    lines
}

/// Quote-style lines: the first carries `first_prefix`, the rest `> `.
fn quote_lines(first_prefix: &str, text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![first_prefix.to_string()];
    }
    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            let prefix = if i == 0 { first_prefix } else { ">" };
            if line.is_empty() {
                prefix.to_string()
            } else {
                format!("{} {}", prefix, line)
            }
        })
        .collect()
}

fn code_lines(code: &CodeBlock) -> Vec<String> {
    let content = concat_plain_text(&code.content.rich_text);
    let fence = code_fence_for(&content);
    let language = code.language.trim();
    let label = if language.eq_ignore_ascii_case("plain text") {
        ""
    } else {
        language
    };

    let mut lines = Vec::with_capacity(content.lines().count() + 2);
    lines.push(format!("{}{}", fence, label));
    lines.extend(content.split('\n').map(str::to_string));
    lines.push(fence);
    lines
}

/// A backtick fence one longer than the longest run inside `content`, never
/// shorter than three.
pub(crate) fn code_fence_for(content: &str) -> String {
    let longest_run = BACKTICK_RUN
        .find_iter(content)
        .map(|m| m.as_str().len())
        .max()
        .unwrap_or(0);
    "`".repeat((longest_run + 1).max(CODE_FENCE_MIN_BACKTICKS))
}

/// Rows become `| a | b |` lines padded to the widest row. With a column
/// header the first row heads the table; without one an empty header row is
/// emitted so every row stays a body row.
fn table_lines(table: &TableBlock) -> Vec<String> {
    let rows: Vec<&TableRowBlock> = table
        .common
        .children
        .iter()
        .filter_map(|child| match child {
            Block::TableRow(row) => Some(row),
            _ => None,
        })
        .collect();
    if rows.is_empty() {
        return Vec::new();
    }

    let width = rows.iter().map(|row| row.cells.len()).max().unwrap_or(0).max(1);
    let separator = format!("|{}", " --- |".repeat(width));

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let mut body = rows.iter();
    if table.has_column_header {
        if let Some(header) = body.next() {
            lines.push(table_row_line(&header.cells, width));
        }
    } else {
        lines.push(format!("|{}", "  |".repeat(width)));
    }
    lines.push(separator);
    lines.extend(body.map(|row| table_row_line(&row.cells, width)));
    lines
}

/// One table row, padded with empty cells up to `width`.
fn table_row_line(cells: &[Vec<RichTextItem>], width: usize) -> String {
    let mut row = String::from("|");
    for cell in cells {
        let content = rich_text_to_markdown(cell)
            .replace('|', "\\|")
            .replace('\n', " ");
        row.push_str(&format!(" {} |", content.trim()));
    }
    for _ in cells.len()..width {
        row.push_str("  |");
    }
    row
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

fn indent_line(line: &str, indent: &str) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{}{}", indent, line)
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

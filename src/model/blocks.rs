use super::common::BlockCommon;
use crate::types::RichTextItem;
use serde::{Deserialize, Serialize};

/// Text content block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBlockContent {
    pub rich_text: Vec<RichTextItem>,
}

impl TextBlockContent {
    pub fn new(rich_text: Vec<RichTextItem>) -> Self {
        Self { rich_text }
    }
}

/// Paragraph block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParagraphBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Heading 1 block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Heading1Block {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Heading 2 block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Heading2Block {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Heading 3 block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Heading3Block {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Bulleted list item block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BulletedListItemBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Numbered list item block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumberedListItemBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Toggle block. Open/closed state is a UI concern and is not modelled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToggleBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// To-do block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToDoBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
    pub checked: bool,
}

/// Quote block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuoteBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Callout block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalloutBlock {
    pub common: BlockCommon,
    pub icon: Option<Icon>,
    pub content: TextBlockContent,
}

/// Icon types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Icon {
    #[serde(rename = "emoji")]
    Emoji { emoji: String },
    #[serde(rename = "external")]
    External { url: String },
    #[serde(rename = "file")]
    File { url: String },
}

impl Icon {
    pub fn emoji(&self) -> Option<&str> {
        match self {
            Icon::Emoji { emoji } if !emoji.is_empty() => Some(emoji),
            _ => None,
        }
    }
}

/// Code block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeBlock {
    pub common: BlockCommon,
    pub language: String,
    pub content: TextBlockContent,
}

/// Equation block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EquationBlock {
    pub common: BlockCommon,
    pub expression: String,
}

/// Divider block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DividerBlock {
    pub common: BlockCommon,
}

/// Image block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageBlock {
    pub common: BlockCommon,
    pub image: Option<FileObject>,
    pub caption: Vec<RichTextItem>,
}

/// Bookmark block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookmarkBlock {
    pub common: BlockCommon,
    pub url: String,
    pub caption: Vec<RichTextItem>,
}

/// Child page block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChildPageBlock {
    pub common: BlockCommon,
    pub title: String,
}

/// Child database block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChildDatabaseBlock {
    pub common: BlockCommon,
    pub title: String,
}

/// Table block. Rows arrive as `TableRow` children; the column count is
/// taken from the rows themselves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableBlock {
    pub common: BlockCommon,
    pub has_column_header: bool,
}

/// Table row block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableRowBlock {
    pub common: BlockCommon,
    pub cells: Vec<Vec<RichTextItem>>,
}

/// Any block kind without a dedicated variant, including blocks that carry
/// no type tag at all.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnsupportedBlock {
    pub common: BlockCommon,
    pub block_type: String,
    /// Visible text recovered from the raw block, possibly empty.
    pub plain_text: String,
}

/// File object types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FileObject {
    #[serde(rename = "external")]
    External { url: String },
    #[serde(rename = "file")]
    File { url: String },
}

impl FileObject {
    pub fn url(&self) -> &str {
        match self {
            FileObject::External { url } | FileObject::File { url } => url,
        }
    }
}

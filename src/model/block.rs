use super::blocks::*;
use super::common::BlockCommon;
use crate::types::BlockId;
use serde::{Deserialize, Serialize};

/// Macro to reduce boilerplate in Block enum methods
macro_rules! match_all_blocks {
    ($self:expr, $pattern:pat => $result:expr) => {
        match $self {
            Block::Paragraph($pattern) => $result,
            Block::Heading1($pattern) => $result,
            Block::Heading2($pattern) => $result,
            Block::Heading3($pattern) => $result,
            Block::BulletedListItem($pattern) => $result,
            Block::NumberedListItem($pattern) => $result,
            Block::ToDo($pattern) => $result,
            Block::Toggle($pattern) => $result,
            Block::Quote($pattern) => $result,
            Block::Callout($pattern) => $result,
            Block::Code($pattern) => $result,
            Block::Equation($pattern) => $result,
            Block::Divider($pattern) => $result,
            Block::Image($pattern) => $result,
            Block::Bookmark($pattern) => $result,
            Block::ChildPage($pattern) => $result,
            Block::ChildDatabase($pattern) => $result,
            Block::Table($pattern) => $result,
            Block::TableRow($pattern) => $result,
            Block::Unsupported($pattern) => $result,
        }
    };
}

/// One node of a document's content tree.
///
/// The set of variants is closed; provider block kinds without a variant
/// land in `Unsupported` and still render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Paragraph(ParagraphBlock),
    Heading1(Heading1Block),
    Heading2(Heading2Block),
    Heading3(Heading3Block),
    BulletedListItem(BulletedListItemBlock),
    NumberedListItem(NumberedListItemBlock),
    ToDo(ToDoBlock),
    Toggle(ToggleBlock),
    Quote(QuoteBlock),
    Callout(CalloutBlock),
    Code(CodeBlock),
    Equation(EquationBlock),
    Divider(DividerBlock),
    Image(ImageBlock),
    Bookmark(BookmarkBlock),
    ChildPage(ChildPageBlock),
    ChildDatabase(ChildDatabaseBlock),
    Table(TableBlock),
    TableRow(TableRowBlock),
    Unsupported(UnsupportedBlock),
}

impl Block {
    /// Get the block's ID
    pub fn id(&self) -> &BlockId {
        match_all_blocks!(self, b => &b.common.id)
    }

    /// Get the block's children
    pub fn children(&self) -> &[Block] {
        match_all_blocks!(self, b => &b.common.children)
    }

    /// Check if the provider flagged this block as having children
    pub fn has_children(&self) -> bool {
        self.common().has_children
    }

    /// Get common block data
    pub fn common(&self) -> &BlockCommon {
        match_all_blocks!(self, b => &b.common)
    }

    /// Get block type name, as the provider spells it
    pub fn block_type(&self) -> &str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Heading1(_) => "heading_1",
            Block::Heading2(_) => "heading_2",
            Block::Heading3(_) => "heading_3",
            Block::BulletedListItem(_) => "bulleted_list_item",
            Block::NumberedListItem(_) => "numbered_list_item",
            Block::ToDo(_) => "to_do",
            Block::Toggle(_) => "toggle",
            Block::Quote(_) => "quote",
            Block::Callout(_) => "callout",
            Block::Code(_) => "code",
            Block::Equation(_) => "equation",
            Block::Divider(_) => "divider",
            Block::Image(_) => "image",
            Block::Bookmark(_) => "bookmark",
            Block::ChildPage(_) => "child_page",
            Block::ChildDatabase(_) => "child_database",
            Block::Table(_) => "table",
            Block::TableRow(_) => "table_row",
            Block::Unsupported(b) => &b.block_type,
        }
    }

    /// Accept a visitor
    pub fn accept<V: BlockVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Block::ChildPage(b) => visitor.visit_child_page(b),
            Block::ChildDatabase(b) => visitor.visit_child_database(b),
            Block::Unsupported(b) => visitor.visit_unsupported(b),
            _ => Default::default(),
        }
    }
}

/// Visitor trait for traversing block structures.
///
/// All methods have default implementations that return `Default::default()`,
/// so implementors only need to override the methods they care about.
/// Variants without a dedicated method yield the default output.
pub trait BlockVisitor {
    type Output: Default;

    fn visit_child_page(&mut self, _page: &ChildPageBlock) -> Self::Output {
        Default::default()
    }
    fn visit_child_database(&mut self, _database: &ChildDatabaseBlock) -> Self::Output {
        Default::default()
    }
    fn visit_unsupported(&mut self, _block: &UnsupportedBlock) -> Self::Output {
        Default::default()
    }
}

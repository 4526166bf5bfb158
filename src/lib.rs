// src/lib.rs
//! notion-snapshot library: renders Notion block trees to Markdown and
//! normalizes webhook deliveries into canonical change events.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `NormalizeError`, `ValidationError`
//! - **Configuration**: `CommandLineInput`, `SnapshotConfig`
//! - **Domain model**: `Block`, block structs, `EntityDocument`, `EntitySummary`
//! - **Domain types**: `EntityId`, `BlockId`, `RichTextItem`, `ValidatedUrl`
//! - **Formatting**: `render_blocks`, `TitleExtractor`, `RenderContext`
//! - **Webhooks**: `EventNormalizer`, `CanonicalEvent`, `Notification`
//! - **Pipeline**: `SnapshotPipeline`, `EntitySource`, `SnapshotStore`

mod analytics;
mod config;
mod constants;
mod error;

#[cfg(feature = "bench")]
pub mod formatting;
#[cfg(not(feature = "bench"))]
mod formatting;

#[cfg(feature = "bench")]
pub mod model;
#[cfg(not(feature = "bench"))]
mod model;

mod pipeline;
mod snapshot;
mod sources;

#[cfg(feature = "bench")]
pub mod types;
#[cfg(not(feature = "bench"))]
mod types;

mod webhook;

// --- Error Handling ---
pub use crate::error::{AppError, NormalizeError};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{Command, CommandLineInput, SnapshotConfig};
pub use crate::constants::{BLOCK_MAX_RENDER_DEPTH, NOTIFICATION_MAX_NESTING, NOTION_PAGE_BASE_URL};

// --- Domain Model ---
pub use crate::model::{
    parse_block, parse_blocks, parse_rich_text, Block, BlockCommon, BlockVisitor,
    EntityDocument, EntityKind, EntitySummary,
};

// --- Block Types ---
pub use crate::model::blocks::{
    BookmarkBlock, BulletedListItemBlock, CalloutBlock, ChildDatabaseBlock, ChildPageBlock,
    CodeBlock, DividerBlock, EquationBlock, FileObject, Heading1Block, Heading2Block,
    Heading3Block, Icon, ImageBlock, NumberedListItemBlock, ParagraphBlock, QuoteBlock,
    TableBlock, TableRowBlock, TextBlockContent, ToDoBlock, ToggleBlock, UnsupportedBlock,
};

// --- Domain Types ---
pub use crate::types::{
    concat_plain_text, Annotations, BlockId, EntityId, EquationData, Link, RichTextItem,
    RichTextType, ValidatedUrl,
};

// --- Formatting ---
pub use crate::formatting::{
    render_blocks, render_blocks_with, render_markdown, rich_text_to_markdown, BlockRenderer,
    MarkdownBlockRenderer, RenderContext, RenderOptions, TitleExtractor,
};

// --- Webhooks ---
pub use crate::webhook::{
    CanonicalEvent, EventMetadata, EventNormalizer, Notification, PayloadShape, SubjectKind,
};

// --- Snapshots & Pipeline ---
pub use crate::analytics::{measure_blocks, BlockTreeStats};
pub use crate::pipeline::{
    EntitySource, EventOutcome, EventReport, IngestReport, SnapshotPipeline, SnapshotStore,
};
pub use crate::snapshot::{build_page_url, SnapshotComposer};
pub use crate::sources::{FixtureSource, MemorySnapshotStore};

// src/formatting/mod.rs
//! Renders block trees into markdown and derives display titles.

pub mod block_renderer;
mod pure_visitor;
mod rich_text;
mod state;
pub mod title;

pub use block_renderer::{render_blocks, render_blocks_with, render_markdown};
pub use pure_visitor::{BlockRenderer, MarkdownBlockRenderer, RenderOptions};
pub use rich_text::rich_text_to_markdown;
pub use state::RenderContext;
pub use title::TitleExtractor;

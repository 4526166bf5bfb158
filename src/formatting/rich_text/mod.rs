// src/formatting/rich_text/mod.rs
//! Handles formatting of rich text fragment arrays into Markdown.
//!
//! Formatting is total: missing or empty fragment lists produce an empty
//! string, and links that fail URL validation are dropped rather than
//! reported.

mod annotations;

use crate::types::{Link, RichTextItem, RichTextType, ValidatedUrl};
use annotations::{annotations_to_style, MarkdownStyleRenderer};

/// Formats an array of RichTextItems into Markdown.
pub fn rich_text_to_markdown(items: &[RichTextItem]) -> String {
    items.iter().map(format_single_item).collect()
}

/// Formats a single rich text item.
fn format_single_item(item: &RichTextItem) -> String {
    let mut style = annotations_to_style(&item.annotations);

    // The fragment-level href wins over a text object's own link
    let link_target = item.href.as_deref().or(match &item.text_type {
        RichTextType::Text {
            link: Some(Link { url }),
            ..
        } => Some(url.as_str()),
        _ => None,
    });
    if let Some(href) = link_target {
        match ValidatedUrl::parse(href) {
            Ok(url) => style.link = Some(url),
            Err(e) => log::debug!("Dropping link on rich text fragment: {}", e),
        }
    }

    match &item.text_type {
        RichTextType::Equation(eq) => {
            let expression = if eq.expression.is_empty() {
                item.plain_text.as_str()
            } else {
                eq.expression.as_str()
            };
            if expression.is_empty() {
                return String::new();
            }
            // Equations ignore annotations
            format!("${}$", expression)
        }
        RichTextType::Text { .. } | RichTextType::Mention { .. } => {
            if item.plain_text.is_empty() {
                return String::new();
            }
            MarkdownStyleRenderer::apply_styles(&item.plain_text, &style)
        }
    }
}

// src/formatting/rich_text/annotations.rs
//! Annotation processing for rich text.
//!
//! This module handles the application of text annotations (styling)
//! in a structured and composable way.

use crate::types::{Annotations, ValidatedUrl};

/// Styling resolved for one fragment: its annotations plus an optional
/// validated link target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub link: Option<ValidatedUrl>,
}

/// Converts model annotations to text style.
pub fn annotations_to_style(annotations: &Annotations) -> TextStyle {
    TextStyle {
        bold: annotations.bold,
        italic: annotations.italic,
        strikethrough: annotations.strikethrough,
        underline: annotations.underline,
        code: annotations.code,
        link: None, // Links are handled separately
    }
}

/// Renderer for text styles to Markdown.
pub struct MarkdownStyleRenderer;

impl MarkdownStyleRenderer {
    /// Applies styles to text content for Markdown output.
    pub fn apply_styles(content: &str, style: &TextStyle) -> String {
        let mut result = content.to_string();

        // Code wraps the bare text so other markers stay outside the backticks
        if style.code {
            result = format!("`{}`", result);
        }

        if style.strikethrough {
            result = format!("~~{}~~", result);
        }

        if style.bold {
            result = format!("**{}**", result);
        }

        if style.italic {
            result = format!("*{}*", result);
        }

        // Underline requires HTML
        if style.underline {
            result = format!("<u>{}</u>", result);
        }

        if let Some(url) = &style.link {
            result = format!("[{}]({})", result, url.as_str());
        }

        result
    }
}

use serde::{Deserialize, Serialize};

/// The kind of rich text content, as a typed vocabulary.
///
/// Mentions keep only the provider's mention kind; their visible form is
/// always the fragment's `plain_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RichTextType {
    Text { content: String, link: Option<Link> },
    Mention { kind: String },
    Equation(EquationData),
}

/// Rich text item with formatting annotations.
///
/// The `text_type` field carries the content variant
/// and `plain_text` provides the fallback rendering for any variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextItem {
    pub text_type: RichTextType,
    pub annotations: Annotations,
    pub plain_text: String,
    pub href: Option<String>,
}

impl RichTextItem {
    /// Create a plain text item. Most fragments are this variant.
    ///
    /// ```ignore
    /// RichTextItem::plain_text("hello")
    /// ```
    pub fn plain_text(text: &str) -> Self {
        Self {
            text_type: RichTextType::Text {
                content: text.to_string(),
                link: None,
            },
            annotations: Annotations::default(),
            plain_text: text.to_string(),
            href: None,
        }
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

/// Concatenates the visible text of a fragment list, ignoring styling.
pub fn concat_plain_text(items: &[RichTextItem]) -> String {
    items.iter().map(|item| item.plain_text.as_str()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationData {
    pub expression: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

// src/formatting/title.rs
//! Best-effort display titles from a heterogeneous property bag.
//!
//! Extraction never fails. Rules are tried in order and the first one that
//! yields non-blank text wins:
//!
//! 1. a property typed `title` (or an untyped property holding a `title`
//!    fragment array);
//! 2. a top-level `title`, as a fragment array or a plain string;
//! 3. a top-level `name`, as a fragment array or a plain string;
//! 4. the first property holding a non-empty `title` or `rich_text` array;
//! 5. the placeholder.
//!
//! Properties are always visited in ascending key order so the result does
//! not depend on the input's key order.

use crate::constants::UNTITLED_PLACEHOLDER;
use crate::model::{parse_rich_text, EntityKind};
use crate::types::concat_plain_text;
use serde_json::{Map, Value};

/// Derives display titles, falling back to a fixed placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleExtractor {
    placeholder: String,
}

impl Default for TitleExtractor {
    fn default() -> Self {
        Self::new(UNTITLED_PLACEHOLDER)
    }
}

impl TitleExtractor {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// The entity's title, or the placeholder.
    pub fn extract(&self, data: &Value, kind: EntityKind) -> String {
        self.find_title(data, kind).unwrap_or_else(|| {
            log::debug!("No title found for {}; using placeholder", kind);
            self.placeholder.clone()
        })
    }

    /// The entity's title without the placeholder fallback.
    pub fn find_title(&self, data: &Value, kind: EntityKind) -> Option<String> {
        let object = data.as_object()?;
        let properties = sorted_properties(object);

        let found = title_typed_property(&properties)
            .or_else(|| fragment_field(object, "title"))
            .or_else(|| string_field(object, "title"))
            .or_else(|| fragment_field(object, "name"))
            .or_else(|| string_field(object, "name"))
            .or_else(|| first_text_property(&properties));

        if let Some(title) = &found {
            log::debug!("Extracted {} title '{}'", kind, title);
        }
        found
    }
}

// --- Rules ---

fn title_typed_property(properties: &[(&String, &Map<String, Value>)]) -> Option<String> {
    properties.iter().find_map(|(_, prop)| {
        let typed_title = prop.get("type").and_then(Value::as_str) == Some("title");
        let untyped_title =
            prop.get("type").is_none() && prop.get("title").is_some_and(Value::is_array);
        if !(typed_title || untyped_title) {
            return None;
        }
        fragment_field(prop, "title").or_else(|| fragment_field(prop, "rich_text"))
    })
}

fn first_text_property(properties: &[(&String, &Map<String, Value>)]) -> Option<String> {
    properties.iter().find_map(|(_, prop)| {
        fragment_field(prop, "title").or_else(|| fragment_field(prop, "rich_text"))
    })
}

// --- Helpers ---

/// Object-valued entries of `data["properties"]`, sorted by key.
fn sorted_properties(object: &Map<String, Value>) -> Vec<(&String, &Map<String, Value>)> {
    let mut properties: Vec<_> = object
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .filter_map(|(key, value)| value.as_object().map(|prop| (key, prop)))
                .collect()
        })
        .unwrap_or_default();
    properties.sort_by(|a, b| a.0.cmp(b.0));
    properties
}

/// Concatenated, trimmed plain text of a fragment array; `None` if blank.
fn fragment_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    let fragments = map.get(key).filter(|v| v.is_array())?;
    non_blank(&concat_plain_text(&parse_rich_text(fragments)))
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).and_then(non_blank)
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(data: Value) -> String {
        TitleExtractor::default().extract(&data, EntityKind::Page)
    }

    #[test]
    fn untyped_title_property() {
        let data = json!({"properties": {"Name": {"title": [{"plain_text": "Roadmap"}]}}});
        assert_eq!(extract(data), "Roadmap");
    }

    #[test]
    fn typed_title_beats_earlier_rich_text() {
        let data = json!({"properties": {
            "A notes": {"type": "rich_text", "rich_text": [{"plain_text": "notes"}]},
            "Z name": {"type": "title", "title": [{"plain_text": "Real "}, {"plain_text": "Title"}]}
        }});
        assert_eq!(extract(data), "Real Title");
    }

    #[test]
    fn blank_title_property_falls_through() {
        let data = json!({
            "properties": {"Name": {"type": "title", "title": [{"plain_text": "   "}]}},
            "title": [{"plain_text": "Top level"}]
        });
        assert_eq!(extract(data), "Top level");
    }

    #[test]
    fn database_title_array_then_name() {
        let db = json!({"title": [{"plain_text": "Tasks"}]});
        assert_eq!(
            TitleExtractor::default().extract(&db, EntityKind::Database),
            "Tasks"
        );

        let named = json!({"name": [{"plain_text": "Legacy"}]});
        assert_eq!(extract(named), "Legacy");
    }

    #[test]
    fn title_string_wins_over_name_array() {
        let data = json!({
            "title": "Board Title",
            "name": [{"plain_text": "Legacy Name"}]
        });
        assert_eq!(
            TitleExtractor::default().extract(&data, EntityKind::Database),
            "Board Title"
        );
    }

    #[test]
    fn plain_string_fields_are_trimmed() {
        assert_eq!(extract(json!({"title": "  Plain  "})), "Plain");
        assert_eq!(extract(json!({"name": "Named"})), "Named");
    }

    #[test]
    fn rich_text_property_is_last_resort_in_key_order() {
        let data = json!({"properties": {
            "b": {"type": "rich_text", "rich_text": [{"plain_text": "second"}]},
            "a": {"type": "rich_text", "rich_text": [{"plain_text": "first"}]},
            "c": {"type": "number", "number": 3}
        }});
        assert_eq!(extract(data), "first");
    }

    #[test]
    fn empty_bag_yields_placeholder() {
        assert_eq!(extract(json!({})), "Untitled");
        assert_eq!(extract(json!({"properties": {}})), "Untitled");
        assert_eq!(extract(json!(null)), "Untitled");
        assert_eq!(
            TitleExtractor::new("(no title)").extract(&json!({}), EntityKind::Database),
            "(no title)"
        );
    }
}

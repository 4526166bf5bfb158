// src/model/parse.rs
//! Shape-tolerant conversion from the provider's native block JSON into
//! [`Block`] values.
//!
//! Parsing never fails. A block is `{type, <type>: payload, has_children,
//! children?}`; the kind may also be spelled `kind` and the payload may sit
//! under `payload`. Anything that cannot be typed becomes
//! [`Block::Unsupported`].

use super::blocks::*;
use super::common::BlockCommon;
use super::Block;
use crate::constants::BLOCK_MAX_RENDER_DEPTH;
use crate::types::{Annotations, BlockId, EquationData, Link, RichTextItem, RichTextType};
use serde_json::{Map, Value};

/// Kind reported for blocks that carry no type tag.
pub const UNTYPED_BLOCK_KIND: &str = "untyped";

/// Parses a block list from a bare array, a `{ "results": [...] }` page of
/// results, or a `{ "children": [...] }` wrapper. A single block object
/// yields a one-element list; anything else yields an empty list.
pub fn parse_blocks(value: &Value) -> Vec<Block> {
    match value {
        Value::Array(items) => items.iter().map(parse_block).collect(),
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("results") {
                items.iter().map(parse_block).collect()
            } else if let Some(Value::Array(items)) = map.get("children") {
                if block_kind(map).is_some() {
                    vec![parse_block(value)]
                } else {
                    items.iter().map(parse_block).collect()
                }
            } else if block_kind(map).is_some() {
                vec![parse_block(value)]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

/// Parses one block node, recursing into its children. Children nested
/// deeper than [`BLOCK_MAX_RENDER_DEPTH`] are dropped, since no renderer
/// would emit them.
pub fn parse_block(value: &Value) -> Block {
    parse_block_at(value, 0)
}

fn parse_block_at(value: &Value, depth: usize) -> Block {
    let empty = Map::new();
    let map = value.as_object().unwrap_or(&empty);

    let Some(kind) = block_kind(map) else {
        log::debug!("Block without a type tag; treating as unsupported");
        return Block::Unsupported(UnsupportedBlock {
            common: parse_common(map, &empty, depth),
            block_type: UNTYPED_BLOCK_KIND.to_string(),
            plain_text: block_plain_text(map, &empty),
        });
    };

    let payload = block_payload(map, &kind).unwrap_or(&empty);
    let common = parse_common(map, payload, depth);
    let content = || TextBlockContent::new(rich_text_field(payload, "rich_text"));

    match canonical_kind(&kind) {
        "paragraph" => Block::Paragraph(ParagraphBlock {
            common,
            content: content(),
        }),
        "heading_1" => Block::Heading1(Heading1Block {
            common,
            content: content(),
        }),
        "heading_2" => Block::Heading2(Heading2Block {
            common,
            content: content(),
        }),
        "heading_3" => Block::Heading3(Heading3Block {
            common,
            content: content(),
        }),
        "bulleted_list_item" => Block::BulletedListItem(BulletedListItemBlock {
            common,
            content: content(),
        }),
        "numbered_list_item" => Block::NumberedListItem(NumberedListItemBlock {
            common,
            content: content(),
        }),
        "to_do" => Block::ToDo(ToDoBlock {
            common,
            content: content(),
            checked: bool_field(payload, "checked"),
        }),
        "toggle" => Block::Toggle(ToggleBlock {
            common,
            content: content(),
        }),
        "quote" => Block::Quote(QuoteBlock {
            common,
            content: content(),
        }),
        "callout" => Block::Callout(CalloutBlock {
            common,
            icon: payload.get("icon").and_then(parse_icon),
            content: content(),
        }),
        "code" => Block::Code(CodeBlock {
            common,
            language: str_field(payload, "language").unwrap_or_default().to_string(),
            content: content(),
        }),
        "equation" => Block::Equation(EquationBlock {
            common,
            expression: str_field(payload, "expression")
                .unwrap_or_default()
                .to_string(),
        }),
        "divider" => Block::Divider(DividerBlock { common }),
        "image" => Block::Image(ImageBlock {
            common,
            image: parse_file_object(payload),
            caption: rich_text_field(payload, "caption"),
        }),
        "bookmark" => Block::Bookmark(BookmarkBlock {
            common,
            url: str_field(payload, "url").unwrap_or_default().to_string(),
            caption: rich_text_field(payload, "caption"),
        }),
        "child_page" => Block::ChildPage(ChildPageBlock {
            common,
            title: str_field(payload, "title").unwrap_or_default().to_string(),
        }),
        "child_database" => Block::ChildDatabase(ChildDatabaseBlock {
            common,
            title: str_field(payload, "title").unwrap_or_default().to_string(),
        }),
        "table" => Block::Table(TableBlock {
            common,
            has_column_header: bool_field(payload, "has_column_header"),
        }),
        "table_row" => Block::TableRow(TableRowBlock {
            common,
            cells: payload
                .get("cells")
                .and_then(Value::as_array)
                .map(|cells| cells.iter().map(parse_rich_text).collect())
                .unwrap_or_default(),
        }),
        other => {
            log::debug!("Unsupported block type '{}'", other);
            Block::Unsupported(UnsupportedBlock {
                plain_text: block_plain_text(map, payload),
                common,
                block_type: kind.clone(),
            })
        }
    }
}

/// Parses an array of rich text fragments. Non-arrays and non-object
/// elements contribute nothing.
pub fn parse_rich_text(value: &Value) -> Vec<RichTextItem> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(parse_rich_text_item).collect())
        .unwrap_or_default()
}

fn parse_rich_text_item(value: &Value) -> Option<RichTextItem> {
    let item = value.as_object()?;

    let text = item.get("text").and_then(Value::as_object);
    let content = text
        .and_then(|t| t.get("content"))
        .and_then(Value::as_str);

    let text_type = match str_field(item, "type") {
        Some("mention") => RichTextType::Mention {
            kind: item
                .get("mention")
                .and_then(|m| m.get("type"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        Some("equation") => RichTextType::Equation(EquationData {
            expression: item
                .get("equation")
                .and_then(|e| e.get("expression"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }),
        _ => RichTextType::Text {
            content: content.unwrap_or_default().to_string(),
            link: text
                .and_then(|t| t.get("link"))
                .and_then(|l| l.get("url"))
                .and_then(Value::as_str)
                .map(|url| Link {
                    url: url.to_string(),
                }),
        },
    };

    let plain_text = str_field(item, "plain_text")
        .map(str::to_string)
        .unwrap_or_else(|| match &text_type {
            RichTextType::Text { content, .. } => content.clone(),
            RichTextType::Equation(eq) => eq.expression.clone(),
            RichTextType::Mention { .. } => String::new(),
        });

    let annotations = item
        .get("annotations")
        .and_then(|a| serde_json::from_value::<Annotations>(a.clone()).ok())
        .unwrap_or_default();

    Some(RichTextItem {
        text_type,
        annotations,
        plain_text,
        href: str_field(item, "href").map(str::to_string),
    })
}

// --- Helpers ---

fn block_kind(map: &Map<String, Value>) -> Option<String> {
    str_field(map, "type")
        .or_else(|| str_field(map, "kind"))
        .filter(|kind| !kind.is_empty())
        .map(str::to_string)
}

/// Maps the hyphenated and shortened spellings onto provider kind names.
fn canonical_kind(kind: &str) -> &str {
    match kind {
        "heading-1" | "heading1" => "heading_1",
        "heading-2" | "heading2" => "heading_2",
        "heading-3" | "heading3" => "heading_3",
        "bulleted-item" | "bulleted_item" | "bulleted-list-item" => "bulleted_list_item",
        "numbered-item" | "numbered_item" | "numbered-list-item" => "numbered_list_item",
        "to-do" | "todo" => "to_do",
        other => other,
    }
}

fn block_payload<'a>(map: &'a Map<String, Value>, kind: &str) -> Option<&'a Map<String, Value>> {
    map.get(kind)
        .and_then(Value::as_object)
        .or_else(|| map.get("payload").and_then(Value::as_object))
}

fn parse_common(
    map: &Map<String, Value>,
    payload: &Map<String, Value>,
    depth: usize,
) -> BlockCommon {
    let items = map
        .get("children")
        .and_then(Value::as_array)
        .or_else(|| payload.get("children").and_then(Value::as_array));

    let children = match items {
        Some(items) if depth >= BLOCK_MAX_RENDER_DEPTH => {
            log::warn!(
                "Dropping {} child block(s) nested deeper than {}",
                items.len(),
                BLOCK_MAX_RENDER_DEPTH
            );
            Vec::new()
        }
        Some(items) => items
            .iter()
            .map(|item| parse_block_at(item, depth + 1))
            .collect(),
        None => Vec::new(),
    };

    BlockCommon {
        id: BlockId::new(str_field(map, "id").unwrap_or_default()),
        children,
        has_children: bool_field(map, "has_children"),
    }
}

/// Visible text of a block we cannot type: the block-level `plain_text`,
/// else its payload's rich text.
fn block_plain_text(map: &Map<String, Value>, payload: &Map<String, Value>) -> String {
    if let Some(text) = str_field(map, "plain_text").filter(|t| !t.is_empty()) {
        return text.to_string();
    }
    let fragments = rich_text_field(payload, "rich_text");
    crate::types::concat_plain_text(&fragments)
}

fn parse_icon(value: &Value) -> Option<Icon> {
    let icon = value.as_object()?;
    match str_field(icon, "type") {
        Some("external") => Some(Icon::External {
            url: nested_url(icon, "external")?,
        }),
        Some("file") => Some(Icon::File {
            url: nested_url(icon, "file")?,
        }),
        _ => str_field(icon, "emoji").map(|emoji| Icon::Emoji {
            emoji: emoji.to_string(),
        }),
    }
}

fn parse_file_object(payload: &Map<String, Value>) -> Option<FileObject> {
    match str_field(payload, "type") {
        Some("external") => nested_url(payload, "external").map(|url| FileObject::External { url }),
        Some("file") => nested_url(payload, "file").map(|url| FileObject::File { url }),
        _ => nested_url(payload, "external")
            .map(|url| FileObject::External { url })
            .or_else(|| nested_url(payload, "file").map(|url| FileObject::File { url }))
            .or_else(|| {
                str_field(payload, "url").map(|url| FileObject::External {
                    url: url.to_string(),
                })
            }),
    }
}

fn nested_url(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(|v| v.get("url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

fn rich_text_field(map: &Map<String, Value>, key: &str) -> Vec<RichTextItem> {
    map.get(key).map(parse_rich_text).unwrap_or_default()
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn bool_field(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_native_paragraph_with_annotations() {
        let block = parse_block(&json!({
            "id": "b1",
            "type": "paragraph",
            "has_children": false,
            "paragraph": {
                "rich_text": [{
                    "type": "text",
                    "text": {"content": "Hello", "link": null},
                    "plain_text": "Hello",
                    "annotations": {"bold": true, "color": "default"}
                }]
            }
        }));

        let Block::Paragraph(p) = block else {
            panic!("expected paragraph");
        };
        assert_eq!(p.common.id.as_str(), "b1");
        assert_eq!(p.content.rich_text.len(), 1);
        assert!(p.content.rich_text[0].annotations.bold);
        assert!(!p.content.rich_text[0].annotations.italic);
    }

    #[test]
    fn accepts_kind_and_payload_spelling() {
        let block = parse_block(&json!({
            "kind": "to_do",
            "payload": {"checked": true, "rich_text": [{"plain_text": "done"}]}
        }));
        assert!(matches!(block, Block::ToDo(ToDoBlock { checked: true, .. })));
    }

    #[test]
    fn untyped_blocks_are_unsupported() {
        let block = parse_block(&json!({"plain_text": "stray"}));
        let Block::Unsupported(b) = block else {
            panic!("expected unsupported");
        };
        assert_eq!(b.block_type, UNTYPED_BLOCK_KIND);
        assert_eq!(b.plain_text, "stray");
    }

    #[test]
    fn unknown_kind_keeps_its_name_and_text() {
        let block = parse_block(&json!({
            "type": "synced_block",
            "synced_block": {"rich_text": [{"plain_text": "mirrored"}]}
        }));
        let Block::Unsupported(b) = block else {
            panic!("expected unsupported");
        };
        assert_eq!(b.block_type, "synced_block");
        assert_eq!(b.plain_text, "mirrored");
    }

    #[test]
    fn children_come_from_block_or_payload() {
        let outer = parse_block(&json!({
            "type": "toggle",
            "has_children": true,
            "toggle": {
                "rich_text": [],
                "children": [{"type": "divider", "divider": {}}]
            }
        }));
        assert_eq!(outer.children().len(), 1);
        assert!(outer.has_children());

        let flagged_only = parse_block(&json!({"type": "toggle", "has_children": true}));
        assert!(flagged_only.has_children());
        assert!(flagged_only.children().is_empty());
    }

    #[test]
    fn children_past_the_depth_limit_are_dropped() {
        let mut value = json!({"type": "paragraph", "paragraph": {"rich_text": []}});
        for _ in 0..BLOCK_MAX_RENDER_DEPTH + 20 {
            value = json!({
                "type": "toggle",
                "has_children": true,
                "toggle": {"rich_text": []},
                "children": [value]
            });
        }

        let mut depth = 0;
        let mut block = parse_block(&value);
        while let Some(child) = block.children().first().cloned() {
            block = child;
            depth += 1;
        }
        assert_eq!(depth, BLOCK_MAX_RENDER_DEPTH);
        assert!(block.has_children());
    }

    #[test]
    fn block_lists_from_every_container() {
        let divider = json!({"type": "divider", "divider": {}});
        assert_eq!(parse_blocks(&json!([divider.clone(), divider.clone()])).len(), 2);
        assert_eq!(parse_blocks(&json!({"results": [divider.clone()]})).len(), 1);
        assert_eq!(parse_blocks(&json!({"children": [divider.clone()]})).len(), 1);
        assert_eq!(parse_blocks(&divider).len(), 1);
        assert!(parse_blocks(&json!("nope")).is_empty());
    }

    #[test]
    fn image_url_from_external_or_file() {
        let external = parse_block(&json!({
            "type": "image",
            "image": {"type": "external", "external": {"url": "https://x/y.png"}}
        }));
        let Block::Image(img) = external else {
            panic!("expected image");
        };
        assert_eq!(img.image.as_ref().map(FileObject::url), Some("https://x/y.png"));

        let missing = parse_block(&json!({"type": "image", "image": {}}));
        let Block::Image(img) = missing else {
            panic!("expected image");
        };
        assert!(img.image.is_none());
    }

    #[test]
    fn rich_text_tolerates_garbage() {
        assert!(parse_rich_text(&json!(null)).is_empty());
        assert!(parse_rich_text(&json!([1, "two"])).is_empty());

        let items = parse_rich_text(&json!([{"type": "text", "text": {"content": "raw"}}]));
        assert_eq!(items[0].plain_text, "raw");
    }
}

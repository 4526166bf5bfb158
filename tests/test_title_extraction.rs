use notion_snapshot::{EntityKind, TitleExtractor};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn title_of(data: Value) -> String {
    TitleExtractor::default().extract(&data, EntityKind::Page)
}

fn fragments(text: &str) -> Value {
    json!([{"type": "text", "text": {"content": text}, "plain_text": text}])
}

#[test]
fn title_typed_property_wins_over_top_level_fields() {
    let data = json!({
        "title": "Top level",
        "properties": {
            "Status": {"type": "select", "select": {"name": "Done"}},
            "Task": {"type": "title", "title": fragments("From property")}
        }
    });
    assert_eq!(title_of(data), "From property");
}

#[test]
fn database_title_array() {
    let data = json!({"object": "database", "title": fragments("Team Directory")});
    assert_eq!(
        TitleExtractor::default().extract(&data, EntityKind::Database),
        "Team Directory"
    );
}

#[test]
fn plain_string_title_and_name() {
    assert_eq!(title_of(json!({"title": "  Plain title  "})), "Plain title");
    assert_eq!(title_of(json!({"name": "Named"})), "Named");
}

#[test]
fn blank_title_falls_through_to_next_rule() {
    let data = json!({
        "title": fragments("   "),
        "name": "Fallback name"
    });
    assert_eq!(title_of(data), "Fallback name");
}

#[test]
fn first_text_property_in_key_order() {
    let data = json!({"properties": {
        "b_notes": {"type": "rich_text", "rich_text": fragments("second")},
        "a_summary": {"type": "rich_text", "rich_text": fragments("first")}
    }});
    assert_eq!(title_of(data), "first");
}

#[test]
fn multi_fragment_titles_concatenate() {
    let data = json!({"properties": {"Name": {"type": "title", "title": [
        {"plain_text": "Q3 "},
        {"plain_text": "Roadmap", "annotations": {"bold": true}}
    ]}}});
    assert_eq!(title_of(data), "Q3 Roadmap");
}

#[test]
fn placeholder_when_nothing_matches() {
    assert_eq!(title_of(json!({})), "Untitled");
    assert_eq!(title_of(json!(null)), "Untitled");
    assert_eq!(
        TitleExtractor::new("(no title)").extract(&json!({"properties": {}}), EntityKind::Page),
        "(no title)"
    );
}

use gov_ease::dom::document::{Document, DocumentError, DomEvent};
use gov_ease::dom::query::Selector;
use serde_json::json;

mod common;
use crate::common::utils::benefits_page;

// =========================================================================
// Snapshot loading
// =========================================================================

#[test]
fn load_fixture_builds_arena_in_document_order() {
    let doc = benefits_page();

    assert_eq!(doc.title, "Apply for Retirement Benefits");
    assert_eq!(doc.tag(doc.root()), "body");

    let forms = doc.query_selector_all(doc.root(), &Selector::parse("form"));
    assert_eq!(forms.len(), 2, "Two forms on the page");
    assert!(forms[0] < forms[1], "Document order preserved");
    assert_eq!(doc.attr(forms[0], "id"), Some("retirement"));
}

#[test]
fn load_missing_file_is_io_error() {
    let err = Document::load("tests/fixtures/does_not_exist.json").unwrap_err();
    assert!(matches!(err, DocumentError::Io { .. }));
}

#[test]
fn malformed_snapshot_is_json_error() {
    let err = Document::from_json_str("{\"root\": 42}").unwrap_err();
    assert!(matches!(err, DocumentError::Json(_)));
}

#[test]
fn tags_are_lowercased() {
    let doc = Document::from_value(json!({
        "root": { "tag": "BODY", "children": [ { "tag": "INPUT" } ] }
    }))
    .unwrap();
    assert_eq!(doc.tag(doc.root()), "body");
    let input = doc.query_selector(doc.root(), &Selector::parse("input"));
    assert!(input.is_some());
}

// =========================================================================
// Navigation
// =========================================================================

#[test]
fn closest_includes_ancestors_and_self() {
    let doc = benefits_page();
    let ssn = doc
        .descendants(doc.root())
        .into_iter()
        .find(|id| doc.attr(*id, "name") == Some("ssn"))
        .unwrap();

    let label = doc.closest(ssn, "label").expect("ssn input is wrapped in a label");
    assert_eq!(doc.tag(label), "label");
    assert_eq!(doc.closest(ssn, "input"), Some(ssn));
    assert!(doc.closest(ssn, "table").is_none());
}

#[test]
fn previous_element_sibling_stops_at_first_child() {
    let doc = benefits_page();
    let heading = doc.query_selector(doc.root(), &Selector::parse("h1")).unwrap();
    assert!(doc.previous_element_sibling(heading).is_none());

    let form = doc.get_element_by_id("retirement").unwrap();
    let prev = doc.previous_element_sibling(form).unwrap();
    assert_eq!(doc.tag(prev), "h2");
}

#[test]
fn text_content_concatenates_descendants() {
    let doc = Document::from_value(json!({
        "root": {
            "tag": "div",
            "text": "Hello ",
            "children": [ { "tag": "b", "text": "World" } ]
        }
    }))
    .unwrap();
    assert_eq!(doc.text_content(doc.root()), "Hello World");
}

#[test]
fn body_text_skips_scripts_and_blank_text() {
    let doc = benefits_page();
    let text = doc.body_text();

    assert!(text.starts_with("Social Security Benefits"));
    assert!(text.contains("Complete all required fields."));
    assert!(!text.contains("window.analytics"), "Script text excluded");
}

#[test]
fn label_for_matches_for_attribute() {
    let doc = benefits_page();
    let label = doc.label_for("first_name").unwrap();
    assert_eq!(doc.text_content(label), "First Name");
    assert!(doc.label_for("nope").is_none());
}

// =========================================================================
// Selectors
// =========================================================================

#[test]
fn selector_list_matches_tags_and_classes() {
    let doc = benefits_page();
    let form = doc.get_element_by_id("retirement").unwrap();

    let desc = doc
        .query_selector(form, &Selector::parse(".description, .form-description, p"))
        .unwrap();
    assert_eq!(doc.text_content(desc), "Complete all required fields.");

    let fields = doc.query_selector_all(form, &Selector::parse("input, select, textarea"));
    assert_eq!(fields.len(), 7);
}

// =========================================================================
// Values and events
// =========================================================================

#[test]
fn input_value_queues_event_but_set_value_does_not() {
    let mut doc = benefits_page();
    let first = doc.get_element_by_id("first_name").unwrap();
    let last = doc.get_element_by_id("last_name").unwrap();

    assert!(doc.set_value(last, "quiet"));
    assert_eq!(doc.pending_events(), 0);

    assert!(doc.input_value(first, "Ada"));
    assert_eq!(doc.value(first), "Ada");
    assert_eq!(doc.drain_events(), vec![DomEvent::Input { target: first }]);
    assert_eq!(doc.pending_events(), 0);
}

#[test]
fn to_snapshot_keeps_values() {
    let mut doc = benefits_page();
    let first = doc.get_element_by_id("first_name").unwrap();
    doc.set_value(first, "Ada");

    let reloaded = Document::from_snapshot(doc.to_snapshot());
    let first_again = reloaded.get_element_by_id("first_name").unwrap();
    assert_eq!(reloaded.value(first_again), "Ada");
    assert_eq!(reloaded.len(), doc.len());
}

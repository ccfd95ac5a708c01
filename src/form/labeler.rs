use crate::dom::document::{Document, NodeId};

/// Effective `type` of a form control, as the page reports it.
pub fn element_type(doc: &Document, id: NodeId) -> String {
    match doc.tag(id) {
        "input" => doc
            .non_empty_attr(id, "type")
            .map(str::to_lowercase)
            .unwrap_or_else(|| "text".to_string()),
        "select" => {
            if doc.attr(id, "multiple").is_some() {
                "select-multiple".to_string()
            } else {
                "select-one".to_string()
            }
        }
        "textarea" => "textarea".to_string(),
        other => other.to_string(),
    }
}

/// Derive a human-readable label for one input-like element.
///
/// Tries, in order: a `label[for=id]`, an enclosing `label`, the previous
/// element sibling's text, then placeholder, name and type. Never empty.
pub fn field_label(doc: &Document, input: NodeId) -> String {
    if let Some(element_id) = doc.non_empty_attr(input, "id") {
        if let Some(label) = doc.label_for(element_id) {
            let text = doc.text_content(label).trim().to_string();
            if !text.is_empty() {
                return text;
            }
        }
    }

    if let Some(label) = doc.closest(input, "label") {
        let text = doc.text_content(label).trim().to_string();
        if !text.is_empty() {
            return text;
        }
    }

    if let Some(prev) = doc.previous_element_sibling(input) {
        let text = doc.text_content(prev).trim().to_string();
        if !text.is_empty() {
            return text;
        }
    }

    doc.non_empty_attr(input, "placeholder")
        .or_else(|| doc.non_empty_attr(input, "name"))
        .map(str::to_string)
        .unwrap_or_else(|| element_type(doc, input))
}

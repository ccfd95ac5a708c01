use tracing::debug;

use crate::dom::document::{Document, NodeId};
use crate::dom::query::{Selector, is_heading};
use crate::form::form_model::{Difficulty, FieldDescriptor, FormDescriptor};
use crate::form::labeler::{element_type, field_label};
use crate::form::suggest::field_suggestions;
use crate::profile::profile_model::Profile;

pub const DEFAULT_FORM_TITLE: &str = "Government Form";

const FIELD_SELECTOR: &str = "input, select, textarea";
const TITLE_SELECTOR: &str = "h1, h2, h3, .title, .form-title";
const DESCRIPTION_SELECTOR: &str = ".description, .form-description, p";

// ============================================================================
// Form analysis
// ============================================================================

/// Build a descriptor for one `form` element.
///
/// Pure read of the document: fields, labels and suggestions are derived
/// fresh on every call.
pub fn analyze_form(doc: &Document, form: NodeId, profile: &Profile) -> FormDescriptor {
    let fields = extract_form_fields(doc, form, profile);
    let title = form_title(doc, form);
    let description = form_description(doc, form);
    let estimated_minutes = estimate_completion_minutes(&fields);
    let required = fields.iter().filter(|f| f.required).count();
    let difficulty = assess_difficulty(required, fields.len());

    let id = doc
        .non_empty_attr(form, "id")
        .map(str::to_string)
        .unwrap_or_else(|| generated_form_id(form, &title));

    debug!(
        form_id = %id,
        fields = fields.len(),
        required,
        %difficulty,
        "analyzed form"
    );

    FormDescriptor {
        id,
        element: form,
        fields,
        title,
        description,
        estimated_minutes,
        difficulty,
    }
}

pub fn extract_form_fields(doc: &Document, form: NodeId, profile: &Profile) -> Vec<FieldDescriptor> {
    doc.query_selector_all(form, &Selector::parse(FIELD_SELECTOR))
        .into_iter()
        .map(|input| {
            let id = doc.attr(input, "id").unwrap_or_default().to_string();
            let name = doc.attr(input, "name").unwrap_or_default().to_string();
            let suggestions = field_suggestions(&name, &id, profile);

            FieldDescriptor {
                r#type: element_type(doc, input),
                label: field_label(doc, input),
                required: doc.attr(input, "required").is_some(),
                placeholder: doc.attr(input, "placeholder").unwrap_or_default().to_string(),
                suggestions,
                element: input,
                id,
                name,
            }
        })
        .collect()
}

/// Heading inside the form, else a heading right before it, else the default.
pub fn form_title(doc: &Document, form: NodeId) -> String {
    if let Some(heading) = doc.query_selector(form, &Selector::parse(TITLE_SELECTOR)) {
        let text = doc.text_content(heading).trim().to_string();
        if !text.is_empty() {
            return text;
        }
    }

    if let Some(prev) = doc.previous_element_sibling(form) {
        if is_heading(doc.tag(prev)) {
            let text = doc.text_content(prev).trim().to_string();
            if !text.is_empty() {
                return text;
            }
        }
    }

    DEFAULT_FORM_TITLE.to_string()
}

pub fn form_description(doc: &Document, form: NodeId) -> String {
    doc.query_selector(form, &Selector::parse(DESCRIPTION_SELECTOR))
        .map(|el| doc.text_content(el).trim().to_string())
        .unwrap_or_default()
}

/// Half a minute per field plus 0.3 per free-text field, rounded.
pub fn estimate_completion_minutes(fields: &[FieldDescriptor]) -> u32 {
    let base = fields.len() as f64 * 0.5;
    let text_like = fields.iter().filter(|f| f.is_text_like()).count() as f64 * 0.3;
    (base + text_like).round() as u32
}

pub fn assess_difficulty(required: usize, total: usize) -> Difficulty {
    if required > 10 || total > 20 {
        Difficulty::High
    } else if required > 5 || total > 10 {
        Difficulty::Medium
    } else {
        Difficulty::Low
    }
}

/// Deterministic id for forms without an `id` attribute.
fn generated_form_id(form: NodeId, title: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(format!("{}:{}", form.0, title).as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("form_{}", &digest[..9])
}

use tracing::debug;

use crate::dom::document::Document;
use crate::form::form_model::FormDescriptor;

/// Minimum confidence a suggestion needs before it is written into a field.
///
/// Profile suggestions are always 0.9, so this only rejects lower-confidence
/// sources.
pub const AUTOFILL_THRESHOLD: f32 = 0.7;

/// Write the first suggestion of each qualifying field into the page and
/// queue an input notification for it. Returns the number of fields filled.
pub fn autofill_form(form: &FormDescriptor, doc: &mut Document) -> usize {
    let mut filled = 0;

    for field in &form.fields {
        let Some(top) = field.top_suggestion() else {
            continue;
        };
        if top.confidence <= AUTOFILL_THRESHOLD {
            continue;
        }

        if doc.input_value(field.element, &top.value) {
            debug!(field = %field.label, "auto-filled");
            filled += 1;
        }
    }

    filled
}

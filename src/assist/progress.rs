use serde::Serialize;

use crate::dom::document::{Document, NodeId};
use crate::form::form_model::FormDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }

    pub fn display_text(&self) -> String {
        format!("{} / {} fields completed", self.completed, self.total)
    }
}

/// Count the form's fields whose trimmed value is non-empty.
pub fn compute_progress(form: &FormDescriptor, doc: &Document) -> Progress {
    let completed = form
        .fields
        .iter()
        .filter(|f| !doc.value(f.element).trim().is_empty())
        .count();

    Progress {
        completed,
        total: form.fields.len(),
    }
}

/// Last progress reported for the current form.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Option<Progress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute from scratch when `target` belongs to `form`.
    pub fn on_input(
        &mut self,
        target: NodeId,
        form: &FormDescriptor,
        doc: &Document,
    ) -> Option<Progress> {
        if !form.contains(target) {
            return None;
        }
        let progress = compute_progress(form, doc);
        self.last = Some(progress);
        Some(progress)
    }

    pub fn reset(&mut self, form: &FormDescriptor) {
        self.last = Some(Progress {
            completed: 0,
            total: form.fields.len(),
        });
    }

    pub fn clear(&mut self) {
        self.last = None;
    }

    pub fn last(&self) -> Option<Progress> {
        self.last
    }
}

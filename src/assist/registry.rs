use serde::Serialize;
use tracing::info;

use crate::dom::document::Document;
use crate::dom::query::Selector;
use crate::form::analyzer::analyze_form;
use crate::form::form_model::{Difficulty, FormDescriptor};
use crate::profile::profile_model::Profile;

/// On-page marker rendered next to each detected form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    /// 1-based position shown to the user.
    pub number: usize,
    pub title: String,
    pub difficulty: Difficulty,
}

/// All forms detected on the current page, in document order, plus the
/// form the user selected.
#[derive(Debug, Default)]
pub struct FormRegistry {
    forms: Vec<FormDescriptor>,
    badges: Vec<Badge>,
    current: Option<usize>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze every form in the document, replacing whatever was stored.
    pub fn scan(&mut self, doc: &Document, profile: &Profile) -> usize {
        self.forms = doc
            .query_selector_all(doc.root(), &Selector::parse("form"))
            .into_iter()
            .map(|form| analyze_form(doc, form, profile))
            .collect();
        self.current = None;
        self.badges = self
            .forms
            .iter()
            .enumerate()
            .map(|(index, form)| Badge {
                number: index + 1,
                title: form.title.clone(),
                difficulty: form.difficulty,
            })
            .collect();

        info!("Detected {} forms on the page", self.forms.len());
        self.forms.len()
    }

    pub fn forms(&self) -> &[FormDescriptor] {
        &self.forms
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Make the form at `index` (0-based) current.
    pub fn select(&mut self, index: usize) -> Option<&FormDescriptor> {
        if index >= self.forms.len() {
            return None;
        }
        self.current = Some(index);
        self.forms.get(index)
    }

    pub fn current(&self) -> Option<&FormDescriptor> {
        self.current.and_then(|i| self.forms.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }
}

use std::fmt;

use serde::Serialize;

use crate::dom::document::NodeId;

pub const SOURCE_USER_PROFILE: &str = "user_profile";

/// A proposed fill value for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub value: String,
    pub confidence: f32,
    pub source: String,
}

/// One input-like element of a form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    pub r#type: String,
    pub label: String,
    pub required: bool,
    pub placeholder: String,
    /// Kept in matcher insertion order; autofill reads only the first entry.
    pub suggestions: Vec<Suggestion>,
    pub element: NodeId,
}

impl FieldDescriptor {
    pub fn top_suggestion(&self) -> Option<&Suggestion> {
        self.suggestions.first()
    }

    pub fn is_text_like(&self) -> bool {
        self.r#type == "text" || self.r#type == "textarea"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Difficulty {
    Low,
    Medium,
    High,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Low => "Low",
            Difficulty::Medium => "Medium",
            Difficulty::High => "High",
        };
        f.write_str(s)
    }
}

/// Structured summary of one detected page form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDescriptor {
    pub id: String,
    pub element: NodeId,
    pub fields: Vec<FieldDescriptor>,
    pub title: String,
    pub description: String,
    pub estimated_minutes: u32,
    pub difficulty: Difficulty,
}

impl FormDescriptor {
    pub fn required_count(&self) -> usize {
        self.fields.iter().filter(|f| f.required).count()
    }

    pub fn contains(&self, element: NodeId) -> bool {
        self.fields.iter().any(|f| f.element == element)
    }

    pub fn field_for(&self, element: NodeId) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.element == element)
    }
}

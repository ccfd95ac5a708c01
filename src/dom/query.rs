use crate::dom::document::Node;

/// One compound-free selector: a tag name or a `.class`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Tag(String),
    Class(String),
}

/// A comma-separated selector list such as `h1, h2, .form-title`.
///
/// Only the forms the form analyzer needs are supported: bare tag names and
/// single class names. A node matches if any entry matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector(pub Vec<SimpleSelector>);

impl Selector {
    pub fn parse(list: &str) -> Self {
        let parts = list
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| match p.strip_prefix('.') {
                Some(class) => SimpleSelector::Class(class.to_string()),
                None => SimpleSelector::Tag(p.to_lowercase()),
            })
            .collect();
        Selector(parts)
    }

    pub fn matches(&self, node: &Node) -> bool {
        self.0.iter().any(|s| match s {
            SimpleSelector::Tag(tag) => node.tag == *tag,
            SimpleSelector::Class(class) => node.has_class(class),
        })
    }
}

pub fn is_heading(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

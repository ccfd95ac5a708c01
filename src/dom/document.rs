use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::query::Selector;

// ============================================================================
// Page snapshot format (JSON, nested element tree)
// ============================================================================

/// One element of a captured page, as written by the page extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Text owned directly by this element, rendered before its children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Current value of form controls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    pub root: SnapshotNode,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Arena document
// ============================================================================

/// Stable handle to an element inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct Node {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: Option<String>,
    pub value: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|name| name == class))
            .unwrap_or(false)
    }
}

/// Notifications raised by value changes, consumed by the assistant session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    Input { target: NodeId },
}

/// A page held as an arena of elements keyed by [`NodeId`].
///
/// Nodes are never removed, so a `NodeId` handed out by a query stays valid
/// for the lifetime of the document.
#[derive(Debug, Clone)]
pub struct Document {
    pub url: Option<String>,
    pub title: String,
    nodes: Vec<Node>,
    events: VecDeque<DomEvent>,
}

impl Document {
    pub fn from_snapshot(snapshot: PageSnapshot) -> Self {
        let mut doc = Document {
            url: snapshot.url,
            title: snapshot.title,
            nodes: Vec::new(),
            events: VecDeque::new(),
        };
        doc.insert(snapshot.root, None);
        doc
    }

    pub fn from_json_str(json: &str) -> Result<Self, DocumentError> {
        let snapshot: PageSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, DocumentError> {
        let snapshot: PageSnapshot = serde_json::from_value(value)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    fn insert(&mut self, node: SnapshotNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: node.tag.to_lowercase(),
            attrs: node.attrs,
            text: node.text,
            value: node.value.unwrap_or_default(),
            parent,
            children: Vec::new(),
        });

        for child in node.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }

        id
    }

    /// Rebuild the nested snapshot form, including current values.
    pub fn to_snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            url: self.url.clone(),
            title: self.title.clone(),
            root: self.snapshot_node(self.root()),
        }
    }

    fn snapshot_node(&self, id: NodeId) -> SnapshotNode {
        let node = &self.nodes[id.0];
        SnapshotNode {
            tag: node.tag.clone(),
            attrs: node.attrs.clone(),
            text: node.text.clone(),
            value: if node.value.is_empty() {
                None
            } else {
                Some(node.value.clone())
            },
            children: node.children.iter().map(|c| self.snapshot_node(*c)).collect(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn tag(&self, id: NodeId) -> &str {
        self.node(id).map(|n| n.tag.as_str()).unwrap_or("")
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).and_then(|n| n.attr(name))
    }

    /// Non-empty attribute value, mirroring how the page treats `""` as unset.
    pub fn non_empty_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attr(id, name).filter(|v| !v.is_empty())
    }

    pub fn value(&self, id: NodeId) -> &str {
        self.node(id).map(|n| n.value.as_str()).unwrap_or("")
    }

    // ------------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------------

    /// All descendants of `scope` in document order, excluding `scope` itself.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.node(scope) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };

        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.node(id) {
                stack.extend(n.children.iter().rev().copied());
            }
        }

        out
    }

    /// Nearest inclusive ancestor with the given tag.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            if node.tag == tag {
                return Some(current);
            }
            cursor = node.parent;
        }
        None
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id)?.parent?;
        let siblings = &self.node(parent)?.children;
        let pos = siblings.iter().position(|s| *s == id)?;
        if pos == 0 {
            None
        } else {
            Some(siblings[pos - 1])
        }
    }

    /// Concatenated text of the element and all its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.node(id) {
            if let Some(text) = &node.text {
                out.push_str(text);
            }
            for child in &node.children {
                out.push_str(&self.text_content(*child));
            }
        }
        out
    }

    /// Visible page text, one element's own text per line.
    pub fn body_text(&self) -> String {
        std::iter::once(self.root())
            .chain(self.descendants(self.root()))
            .filter(|id| !matches!(self.tag(*id), "script" | "style"))
            .filter_map(|id| self.node(id)?.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.node(*id).is_some_and(|n| selector.matches(n)))
    }

    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.node(*id).is_some_and(|n| selector.matches(n)))
            .collect()
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        std::iter::once(self.root())
            .chain(self.descendants(self.root()))
            .find(|id| self.attr(*id, "id") == Some(element_id))
    }

    /// First `label` element whose `for` attribute names `element_id`.
    pub fn label_for(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.tag(*id) == "label" && self.attr(*id, "for") == Some(element_id))
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Set a control's value without raising any notification.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) => {
                node.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Set a control's value and queue an `input` notification for it.
    pub fn input_value(&mut self, id: NodeId, value: &str) -> bool {
        if self.set_value(id, value) {
            self.dispatch_input(id);
            true
        } else {
            false
        }
    }

    pub fn dispatch_input(&mut self, target: NodeId) {
        self.events.push_back(DomEvent::Input { target });
    }

    pub fn drain_events(&mut self) -> Vec<DomEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

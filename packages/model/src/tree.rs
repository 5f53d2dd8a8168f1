//! # Document tree
//!
//! The document is an immutable tree of [`Element`]s and [`Text`] runs. Nodes
//! are shared through `Arc`, so an edit copies only the spine it touches and
//! every untouched subtree keeps its pointer identity. Downstream code relies
//! on that identity (`Arc::ptr_eq`) to skip work.
//!
//! An empty `Text` is the line-break sentinel and renders as `<br>`.

use crate::node_id::NodeId;
use crate::text::utf16_len;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A run of text. The empty string is a line break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub id: NodeId,
    pub text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: NodeId::generate(),
            text: text.into(),
        }
    }

    /// A line-break sentinel
    pub fn line_break() -> Self {
        Self::new("")
    }

    pub fn is_line_break(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in UTF-16 code units
    pub fn len(&self) -> usize {
        utf16_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Same node identity, new content
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            id: self.id.clone(),
            text: text.into(),
        }
    }
}

/// An element with ordered children.
///
/// `tag` and `props` are render configuration. The model passes them through
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    pub fn new() -> Self {
        Self {
            id: NodeId::generate(),
            tag: None,
            props: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Same identity and render configuration, new children
    pub fn with_replaced_children(&self, children: Vec<Node>) -> Self {
        Self {
            id: self.id.clone(),
            tag: self.tag.clone(),
            props: self.props.clone(),
            children,
        }
    }

    /// Wrap in an `Arc` for use as a document root
    pub fn into_root(self) -> Arc<Element> {
        Arc::new(self)
    }
}

impl Default for Element {
    fn default() -> Self {
        Self::new()
    }
}

/// Tree node: either an element or a text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Element(Arc<Element>),
    Text(Arc<Text>),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Arc::new(Text::new(text)))
    }

    pub fn line_break() -> Self {
        Node::Text(Arc::new(Text::line_break()))
    }

    pub fn id(&self) -> &NodeId {
        match self {
            Node::Element(element) => &element.id,
            Node::Text(text) => &text.id,
        }
    }

    pub fn as_element(&self) -> Option<&Arc<Element>> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Arc<Text>> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    /// Text that is not a line break
    pub fn is_mergeable_text(&self) -> bool {
        matches!(self, Node::Text(text) if !text.is_line_break())
    }

    /// Pointer identity, not structural equality
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Element(a), Node::Element(b)) => Arc::ptr_eq(a, b),
            (Node::Text(a), Node::Text(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(Arc::new(element))
    }
}

impl From<Arc<Element>> for Node {
    fn from(element: Arc<Element>) -> Self {
        Node::Element(element)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(Arc::new(text))
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::text(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::text(text)
    }
}

/// Concatenated text of a subtree. Line breaks contribute `'\n'`.
pub fn plain_text(element: &Element) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Element(child) => collect_text(child, out),
            Node::Text(text) if text.is_line_break() => out.push('\n'),
            Node::Text(text) => out.push_str(&text.text),
        }
    }
}

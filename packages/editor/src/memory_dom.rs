//! # In-memory DOM
//!
//! A small DOM implementing [`DomNode`] and [`SelectionSurface`], with a
//! reference renderer that honors the render contract:
//!
//! - every rendered node gets the ref callback for its path
//! - every rendered element carries at least one attribute (`data-node-id`)
//! - an empty text run renders as `<br>`
//!
//! `type_text` and `delete_text` mimic what a browser does to the DOM for a
//! native edit and return the mutation records an observer would see.

use crate::dom::{DomKind, DomNode, DomRange, SelectionSurface};
use crate::mutations::MutationRecord;
use crate::registry::RefCallback;
use folio_model::text::{insert_at, remove_range};
use folio_model::{Element, Node, NodeId, Path};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::Arc;

#[derive(Debug)]
enum Content {
    Text(String),
    LineBreak,
    Element(String),
}

#[derive(Debug)]
struct NodeData {
    content: Content,
    attributes: BTreeMap<String, String>,
    parent: Weak<RefCell<NodeData>>,
    children: Vec<MemoryNode>,
}

/// Shared handle to an in-memory node; equality is node identity.
#[derive(Clone)]
pub struct MemoryNode(Rc<RefCell<NodeData>>);

impl MemoryNode {
    fn with_content(content: Content) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            content,
            attributes: BTreeMap::new(),
            parent: Weak::new(),
            children: Vec::new(),
        })))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content(Content::Text(text.into()))
    }

    pub fn line_break() -> Self {
        Self::with_content(Content::LineBreak)
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_content(Content::Element(tag.into()))
    }

    pub fn tag(&self) -> Option<String> {
        match &self.0.borrow().content {
            Content::Element(tag) => Some(tag.clone()),
            Content::LineBreak => Some("br".to_string()),
            Content::Text(_) => None,
        }
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.0.borrow_mut().attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.borrow().attributes.get(name).cloned()
    }

    /// Replace a text node's data. No effect on other nodes.
    pub fn set_text(&self, text: impl Into<String>) {
        if let Content::Text(data) = &mut self.0.borrow_mut().content {
            *data = text.into();
        }
    }

    pub fn append_child(&self, child: &MemoryNode) {
        self.insert_before(child, None);
    }

    /// Insert `child` before `reference`, or at the end. A child attached
    /// elsewhere is moved.
    pub fn insert_before(&self, child: &MemoryNode, reference: Option<&MemoryNode>) {
        child.detach();
        let mut data = self.0.borrow_mut();
        let index = reference
            .and_then(|reference| data.children.iter().position(|c| c == reference))
            .unwrap_or(data.children.len());
        data.children.insert(index, child.clone());
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
    }

    pub fn remove_child(&self, child: &MemoryNode) -> bool {
        let mut data = self.0.borrow_mut();
        let Some(index) = data.children.iter().position(|c| c == child) else {
            return false;
        };
        data.children.remove(index);
        child.0.borrow_mut().parent = Weak::new();
        true
    }

    /// Replace all children with `children`, detaching the old ones.
    pub fn replace_children(&self, children: Vec<MemoryNode>) {
        let old = std::mem::take(&mut self.0.borrow_mut().children);
        for child in &old {
            child.0.borrow_mut().parent = Weak::new();
        }
        for child in &children {
            child.detach();
            child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        }
        self.0.borrow_mut().children = children;
    }

    fn detach(&self) {
        if let Some(parent) = self.parent_node() {
            parent.remove_child(self);
        }
    }

    /// Markup for assertions, attributes omitted
    pub fn to_html(&self) -> String {
        let data = self.0.borrow();
        match &data.content {
            Content::Text(text) => text.clone(),
            Content::LineBreak => "<br>".to_string(),
            Content::Element(tag) => {
                let inner: String = data.children.iter().map(MemoryNode::to_html).collect();
                format!("<{tag}>{inner}</{tag}>")
            }
        }
    }

    /// Type `data` at `offset` the way a browser does natively.
    ///
    /// Typing into a `<br>` replaces it with a new text node. Returns the text
    /// node holding the result and the observed records.
    pub fn type_text(&self, offset: usize, data: &str) -> Option<(MemoryNode, Vec<MutationRecord<MemoryNode>>)> {
        match self.kind() {
            DomKind::Text => {
                let content = insert_at(&self.text_content(), offset, data)?;
                self.set_text(content);
                Some((self.clone(), vec![MutationRecord::CharacterData { target: self.clone() }]))
            }
            DomKind::LineBreak => {
                let parent = self.parent_node()?;
                let text = MemoryNode::text("");
                parent.insert_before(&text, Some(self));
                parent.remove_child(self);
                text.set_text(data);
                let records = vec![
                    MutationRecord::ChildList {
                        target: parent.clone(),
                        added: vec![text.clone()],
                        removed: vec![],
                    },
                    MutationRecord::ChildList {
                        target: parent,
                        added: vec![],
                        removed: vec![self.clone()],
                    },
                    MutationRecord::CharacterData { target: text.clone() },
                ];
                Some((text, records))
            }
            _ => None,
        }
    }

    /// Delete `from..to` from a text node the way a browser does natively.
    ///
    /// Emptying the node replaces it with a `<br>`.
    pub fn delete_text(&self, from: usize, to: usize) -> Option<Vec<MutationRecord<MemoryNode>>> {
        if self.kind() != DomKind::Text {
            return None;
        }
        let remaining = remove_range(&self.text_content(), from, to);
        let empty = remaining.is_empty();
        self.set_text(remaining);
        let mut records = vec![MutationRecord::CharacterData { target: self.clone() }];

        if empty {
            let parent = self.parent_node()?;
            let br = MemoryNode::line_break();
            parent.insert_before(&br, Some(self));
            parent.remove_child(self);
            records.push(MutationRecord::ChildList {
                target: parent.clone(),
                added: vec![],
                removed: vec![self.clone()],
            });
            records.push(MutationRecord::ChildList {
                target: parent,
                added: vec![br],
                removed: vec![],
            });
        }
        Some(records)
    }
}

impl PartialEq for MemoryNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MemoryNode {}

impl Hash for MemoryNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.borrow().content {
            Content::Text(text) => write!(f, "#text({text:?})"),
            Content::LineBreak => f.write_str("<br>"),
            Content::Element(tag) => write!(f, "<{tag}>"),
        }
    }
}

impl DomNode for MemoryNode {
    fn kind(&self) -> DomKind {
        match self.0.borrow().content {
            Content::Text(_) => DomKind::Text,
            Content::LineBreak => DomKind::LineBreak,
            Content::Element(_) => DomKind::Element,
        }
    }

    fn text_content(&self) -> String {
        let data = self.0.borrow();
        match &data.content {
            Content::Text(text) => text.clone(),
            Content::LineBreak => String::new(),
            Content::Element(_) => data.children.iter().map(MemoryNode::text_content).collect(),
        }
    }

    fn parent_node(&self) -> Option<Self> {
        self.0.borrow().parent.upgrade().map(MemoryNode)
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.0.borrow().children.clone()
    }

    fn attribute_count(&self) -> usize {
        self.0.borrow().attributes.len()
    }
}

/// Native selection stand-in. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemorySelection {
    range: Rc<RefCell<Option<DomRange<MemoryNode>>>>,
    writes: Rc<Cell<usize>>,
}

impl MemorySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the selection as the user would, without counting a write
    pub fn place(&self, range: DomRange<MemoryNode>) {
        *self.range.borrow_mut() = Some(range);
    }

    pub fn clear(&self) {
        *self.range.borrow_mut() = None;
    }

    /// Number of `set_range` calls
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl SelectionSurface<MemoryNode> for MemorySelection {
    fn range(&self) -> Option<DomRange<MemoryNode>> {
        self.range.borrow().clone()
    }

    fn set_range(&mut self, range: &DomRange<MemoryNode>) {
        self.writes.set(self.writes.get() + 1);
        *self.range.borrow_mut() = Some(range.clone());
    }
}

/// Reference renderer over [`MemoryNode`]s.
///
/// Nodes are reused across renders by [`NodeId`] as long as they render to
/// the same kind of DOM node. Ref callbacks are committed after the tree is
/// built: stale attachments are detached first, then new ones attached.
pub struct MemoryRenderer {
    container: MemoryNode,
    nodes: HashMap<NodeId, MemoryNode>,
    attached: Vec<(RefCallback<MemoryNode>, MemoryNode)>,
    with_attributes: bool,
}

impl MemoryRenderer {
    pub fn new(container: MemoryNode) -> Self {
        Self {
            container,
            nodes: HashMap::new(),
            attached: Vec::new(),
            with_attributes: true,
        }
    }

    /// A renderer that breaks the attribute rule, for exercising diagnostics
    pub fn without_attributes(container: MemoryNode) -> Self {
        Self {
            with_attributes: false,
            ..Self::new(container)
        }
    }

    pub fn container(&self) -> &MemoryNode {
        &self.container
    }

    /// The rendered root element, once something has been rendered
    pub fn root(&self) -> Option<MemoryNode> {
        self.container.child_nodes().into_iter().next()
    }

    /// The DOM node rendered for `id` in the last render
    pub fn node_for(&self, id: &NodeId) -> Option<&MemoryNode> {
        self.nodes.get(id)
    }

    pub fn render<F>(&mut self, element: &Arc<Element>, ref_for: F) -> MemoryNode
    where
        F: Fn(&Path) -> RefCallback<MemoryNode>,
    {
        let mut frame = RenderFrame {
            previous: &self.nodes,
            nodes: HashMap::new(),
            attached: Vec::new(),
            with_attributes: self.with_attributes,
            ref_for: &ref_for,
        };
        let root = frame.element(element, Path::root());
        let RenderFrame { nodes, attached, .. } = frame;

        if self.container.child_nodes() != [root.clone()] {
            self.container.replace_children(vec![root.clone()]);
        }

        for (callback, node) in &self.attached {
            if !attached.iter().any(|(c, n)| c.ptr_eq(callback) && n == node) {
                callback.call(None);
            }
        }
        for (callback, node) in &attached {
            if !self.attached.iter().any(|(c, n)| c.ptr_eq(callback) && n == node) {
                callback.call(Some(node.clone()));
            }
        }

        self.nodes = nodes;
        self.attached = attached;
        root
    }

    /// Detach every ref, as on unmount
    pub fn unmount(&mut self) {
        for (callback, _) in self.attached.drain(..) {
            callback.call(None);
        }
        self.nodes.clear();
        self.container.replace_children(Vec::new());
    }
}

struct RenderFrame<'a, F> {
    previous: &'a HashMap<NodeId, MemoryNode>,
    nodes: HashMap<NodeId, MemoryNode>,
    attached: Vec<(RefCallback<MemoryNode>, MemoryNode)>,
    with_attributes: bool,
    ref_for: &'a F,
}

impl<F> RenderFrame<'_, F>
where
    F: Fn(&Path) -> RefCallback<MemoryNode>,
{
    fn reuse(&self, id: &NodeId, kind: DomKind) -> Option<MemoryNode> {
        self.previous.get(id).filter(|node| node.kind() == kind).cloned()
    }

    fn element(&mut self, element: &Element, path: Path) -> MemoryNode {
        let tag = element.tag.clone().unwrap_or_else(|| "div".to_string());
        let node = self
            .reuse(&element.id, DomKind::Element)
            .filter(|node| node.tag().as_deref() == Some(tag.as_str()))
            .unwrap_or_else(|| MemoryNode::element(tag));

        if self.with_attributes {
            node.set_attribute("data-node-id", element.id.as_str());
            for (name, value) in &element.props {
                node.set_attribute(name.clone(), value.clone());
            }
        }

        let children = element
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| {
                let child_path = path.child(index);
                match child {
                    Node::Element(inner) => self.element(inner, child_path),
                    Node::Text(run) => self.text(&run.id, &run.text, child_path),
                }
            })
            .collect::<Vec<_>>();

        if node.child_nodes() != children {
            node.replace_children(children);
        }

        self.mount(&element.id, node, &path)
    }

    fn text(&mut self, id: &NodeId, text: &str, path: Path) -> MemoryNode {
        let node = if text.is_empty() {
            self.reuse(id, DomKind::LineBreak).unwrap_or_else(MemoryNode::line_break)
        } else {
            let node = self.reuse(id, DomKind::Text).unwrap_or_else(|| MemoryNode::text(""));
            if node.text_content() != text {
                node.set_text(text);
            }
            node
        };
        self.mount(id, node, &path)
    }

    fn mount(&mut self, id: &NodeId, node: MemoryNode, path: &Path) -> MemoryNode {
        self.nodes.insert(id.clone(), node.clone());
        self.attached.push(((self.ref_for)(path), node.clone()));
        node
    }
}

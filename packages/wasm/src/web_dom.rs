//! `web-sys` implementation of the editor's DOM abstraction.
//!
//! JS nodes have no stable hash, so each node seen by the editor is stamped
//! with a numeric key stored as an expando property. Equality and hashing use
//! that key.

use folio_editor::{DomKind, DomNode, DomPoint, DomRange, MutationRecord, SelectionSurface};
use std::cell::Cell;
use std::hash::{Hash, Hasher};
use wasm_bindgen::{JsCast, JsValue};

const KEY_PROPERTY: &str = "__folioKey";

thread_local! {
    static NEXT_KEY: Cell<u32> = const { Cell::new(1) };
}

fn key_of(node: &web_sys::Node) -> u32 {
    let property = JsValue::from_str(KEY_PROPERTY);
    if let Some(key) = js_sys::Reflect::get(node, &property).ok().and_then(|value| value.as_f64()) {
        return key as u32;
    }
    let key = NEXT_KEY.with(|next| {
        let key = next.get();
        next.set(key.wrapping_add(1));
        key
    });
    let _ = js_sys::Reflect::set(node, &property, &JsValue::from(key));
    key
}

#[derive(Clone, Debug)]
pub struct WebNode {
    node: web_sys::Node,
    key: u32,
}

impl WebNode {
    pub fn new(node: web_sys::Node) -> Self {
        let key = key_of(&node);
        Self { node, key }
    }

    pub fn node(&self) -> &web_sys::Node {
        &self.node
    }

    pub fn key(&self) -> u32 {
        self.key
    }
}

impl PartialEq for WebNode {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for WebNode {}

impl Hash for WebNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl DomNode for WebNode {
    fn kind(&self) -> DomKind {
        match self.node.node_type() {
            web_sys::Node::TEXT_NODE => DomKind::Text,
            web_sys::Node::ELEMENT_NODE if self.node.node_name().eq_ignore_ascii_case("br") => DomKind::LineBreak,
            web_sys::Node::ELEMENT_NODE => DomKind::Element,
            _ => DomKind::Other,
        }
    }

    fn text_content(&self) -> String {
        self.node.text_content().unwrap_or_default()
    }

    fn parent_node(&self) -> Option<Self> {
        self.node.parent_node().map(WebNode::new)
    }

    fn child_nodes(&self) -> Vec<Self> {
        nodes(&self.node.child_nodes())
    }

    fn attribute_count(&self) -> usize {
        self.node
            .dyn_ref::<web_sys::Element>()
            .map(|element| element.attributes().length() as usize)
            .unwrap_or(0)
    }

    fn child_at(&self, index: usize) -> Option<Self> {
        let index = u32::try_from(index).ok()?;
        self.node.child_nodes().get(index).map(WebNode::new)
    }
}

fn nodes(list: &web_sys::NodeList) -> Vec<WebNode> {
    (0..list.length()).filter_map(|index| list.get(index)).map(WebNode::new).collect()
}

/// A target range of a `beforeinput` event
pub fn static_range(range: &web_sys::StaticRange) -> DomRange<WebNode> {
    DomRange::new(
        DomPoint::new(WebNode::new(range.start_container()), range.start_offset() as usize),
        DomPoint::new(WebNode::new(range.end_container()), range.end_offset() as usize),
    )
}

pub fn target_ranges(event: &web_sys::InputEvent) -> Vec<DomRange<WebNode>> {
    event
        .get_target_ranges()
        .iter()
        .filter_map(|value| value.dyn_into::<web_sys::StaticRange>().ok())
        .map(|range| static_range(&range))
        .collect()
}

/// Converts one `MutationRecord`; attribute records are skipped.
pub fn mutation_record(record: &web_sys::MutationRecord) -> Option<MutationRecord<WebNode>> {
    let target = WebNode::new(record.target()?);
    match record.type_().as_str() {
        "characterData" => Some(MutationRecord::CharacterData { target }),
        "childList" => Some(MutationRecord::ChildList {
            target,
            added: nodes(&record.added_nodes()),
            removed: nodes(&record.removed_nodes()),
        }),
        _ => None,
    }
}

/// The document selection
#[derive(Clone)]
pub struct WebSelection {
    document: web_sys::Document,
}

impl WebSelection {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    fn selection(&self) -> Option<web_sys::Selection> {
        self.document.get_selection().ok().flatten()
    }
}

impl SelectionSurface<WebNode> for WebSelection {
    fn range(&self) -> Option<DomRange<WebNode>> {
        let selection = self.selection()?;
        if selection.range_count() == 0 {
            return None;
        }
        Some(DomRange::new(
            DomPoint::new(WebNode::new(selection.anchor_node()?), selection.anchor_offset() as usize),
            DomPoint::new(WebNode::new(selection.focus_node()?), selection.focus_offset() as usize),
        ))
    }

    fn set_range(&mut self, range: &DomRange<WebNode>) {
        let Some(selection) = self.selection() else {
            return;
        };
        let (Ok(anchor), Ok(focus)) = (u32::try_from(range.anchor.offset), u32::try_from(range.focus.offset)) else {
            return;
        };
        if let Err(err) = selection.set_base_and_extent(range.anchor.node.node(), anchor, range.focus.node.node(), focus) {
            tracing::warn!(error = ?err, "could not write the native selection");
        }
    }
}

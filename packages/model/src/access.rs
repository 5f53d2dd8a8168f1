//! Path-indexed reads and copy-on-write writes.
//!
//! `set` rebuilds only the elements on the path from the root to the target.
//! Siblings and untouched subtrees are shared with the input, and a write that
//! cannot land returns the input `Arc` itself.

use crate::path::Path;
use crate::text::utf16_len;
use crate::tree::{Element, Node, Text};
use std::sync::Arc;

/// Node at `path`. The root path yields the root element; a path that ends
/// inside a `Text` (a character offset) yields `None`.
pub fn get(element: &Arc<Element>, path: &Path) -> Option<Node> {
    let mut current = Node::Element(Arc::clone(element));
    for &index in path.indices() {
        let next = match &current {
            Node::Element(parent) => parent.children.get(index)?.clone(),
            Node::Text(_) => return None,
        };
        current = next;
    }
    Some(current)
}

/// Text node at `path`
pub fn get_text(element: &Arc<Element>, path: &Path) -> Option<Arc<Text>> {
    match get(element, path)? {
        Node::Text(text) => Some(text),
        Node::Element(_) => None,
    }
}

/// Replace the node at `path`.
///
/// Out-of-range indices, paths through a `Text`, and a `Text` written at the
/// root are no-ops returning `element` unchanged.
pub fn set(element: &Arc<Element>, path: &Path, node: Node) -> Arc<Element> {
    match path.indices().split_first() {
        None => match node {
            Node::Element(root) => root,
            Node::Text(_) => Arc::clone(element),
        },
        Some((&index, rest)) => set_in(element, index, rest, node).unwrap_or_else(|| Arc::clone(element)),
    }
}

fn set_in(element: &Arc<Element>, index: usize, rest: &[usize], node: Node) -> Option<Arc<Element>> {
    let child = element.children.get(index)?;

    let replacement = match rest.split_first() {
        None => node,
        Some((&next, rest)) => match child {
            Node::Element(child) => Node::Element(set_in(child, next, rest, node)?),
            Node::Text(_) => return None,
        },
    };

    let mut children = element.children.clone();
    children[index] = replacement;
    Some(Arc::new(element.with_replaced_children(children)))
}

/// Whether `path` resolves against `element`.
///
/// Every index but the last must step through an element's children. The last
/// index must name an existing child of an element, or be an offset no greater
/// than the length of a `Text`.
pub fn is_valid_path(element: &Arc<Element>, path: &Path) -> bool {
    let Some((&last, spine)) = path.indices().split_last() else {
        return true;
    };

    match get(element, &Path::new(spine.to_vec())) {
        Some(Node::Element(parent)) => last < parent.children.len(),
        Some(Node::Text(text)) => last <= utf16_len(&text.text),
        None => false,
    }
}

/// Resolve a text point (`text path ++ [offset]`) to its run and offset.
pub fn resolve_text_point(element: &Arc<Element>, point: &Path) -> Option<(Path, Arc<Text>, usize)> {
    let offset = point.last()?;
    let text_path = point.parent()?;
    let text = get_text(element, &text_path)?;
    (offset <= text.len()).then_some((text_path, text, offset))
}

//! # Normalization
//!
//! A normalized tree never holds two adjacent non-empty `Text` siblings. The
//! empty `Text` is a line break and acts as a hard boundary: runs on either
//! side of it stay separate.
//!
//! [`normalize`] returns the *same* `Arc` when nothing had to change, at every
//! level of the tree. [`is_normalized`] is defined through that identity so the
//! two can never disagree.

use crate::path::Path;
use crate::text::utf16_len;
use crate::tree::{Element, Node};
use std::sync::Arc;

/// Merge adjacent non-line-break text runs, recursing into child elements.
///
/// A merged run keeps the id of its first member.
pub fn normalize(element: &Arc<Element>) -> Arc<Element> {
    match normalize_children(&element.children) {
        Some(children) => Arc::new(element.with_replaced_children(children)),
        None => Arc::clone(element),
    }
}

/// `normalize(element)` is `element` itself.
pub fn is_normalized(element: &Arc<Element>) -> bool {
    Arc::ptr_eq(&normalize(element), element)
}

fn normalize_children(children: &[Node]) -> Option<Vec<Node>> {
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    let mut changed = false;

    for child in children {
        match child {
            Node::Element(element) => {
                let normalized = normalize(element);
                if !Arc::ptr_eq(&normalized, element) {
                    changed = true;
                }
                out.push(Node::Element(normalized));
            }
            Node::Text(text) => {
                if !text.is_line_break() {
                    if let Some(Node::Text(previous)) = out.last_mut() {
                        if !previous.is_line_break() {
                            let merged = previous.with_text(format!("{}{}", previous.text, text.text));
                            *previous = Arc::new(merged);
                            changed = true;
                            continue;
                        }
                    }
                }
                out.push(child.clone());
            }
        }
    }

    changed.then_some(out)
}

/// Translate a point valid against `before` into the coordinates of
/// `normalize(before)`.
///
/// At every level the child index becomes the index of the merged run, and a
/// text offset grows by the length of the runs merged ahead of it. Steps that
/// do not resolve are carried over unchanged.
pub fn map_point(before: &Element, point: &Path) -> Path {
    let indices = point.indices();
    let mut out = Vec::with_capacity(indices.len());
    let mut current = before;
    let mut depth = 0;

    while depth < indices.len() {
        let index = indices[depth];
        if index >= current.children.len() {
            out.extend_from_slice(&indices[depth..]);
            break;
        }

        let (group, offset_before) = locate_in_groups(&current.children, index);
        out.push(group);

        match &current.children[index] {
            Node::Element(element) => {
                current = element.as_ref();
                depth += 1;
            }
            Node::Text(_) => {
                if let Some(offset) = indices.get(depth + 1) {
                    out.push(offset + offset_before);
                }
                break;
            }
        }
    }

    Path::new(out)
}

/// Index of the merged group holding `children[index]`, and the UTF-16 length
/// of the group members before it.
fn locate_in_groups(children: &[Node], index: usize) -> (usize, usize) {
    let mut group = 0;
    let mut offset_before = 0;

    for (i, child) in children.iter().enumerate().take(index + 1) {
        let joins_previous =
            i > 0 && child.is_mergeable_text() && children[i - 1].is_mergeable_text();

        if i > 0 && !joins_previous {
            group += 1;
            offset_before = 0;
        }

        if i < index {
            if let Node::Text(text) = child {
                offset_before += utf16_len(&text.text);
            }
        }
    }

    (group, offset_before)
}

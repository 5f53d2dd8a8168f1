//! Text-level edits built on [`crate::access`].
//!
//! Edits keep node ids: a rewritten run is the same logical node with new
//! content. None of these functions normalize; callers do that once per
//! action.

use crate::access::{get_text, set};
use crate::path::Path;
use crate::text;
use crate::tree::{Element, Node};
use std::sync::Arc;

/// Insert `insert` into the run at `text_path`, at UTF-16 `offset`.
pub fn insert_text(element: &Arc<Element>, text_path: &Path, offset: usize, insert: &str) -> Option<Arc<Element>> {
    let run = get_text(element, text_path)?;
    let content = text::insert_at(&run.text, offset, insert)?;
    Some(set(element, text_path, Node::Text(Arc::new(run.with_text(content)))))
}

/// Replace the whole content of the run at `text_path`.
///
/// Writing the content the run already has returns `element` itself.
pub fn replace_text(element: &Arc<Element>, text_path: &Path, content: &str) -> Option<Arc<Element>> {
    let run = get_text(element, text_path)?;
    if run.text == content {
        return Some(Arc::clone(element));
    }
    Some(set(element, text_path, Node::Text(Arc::new(run.with_text(content)))))
}

/// Delete everything between the points `start` and `end`.
///
/// Runs holding an endpoint are trimmed and kept, even when they end up empty
/// (an empty run is a line break). Nodes lying strictly between the endpoints
/// are removed. An empty or inverted range returns `element` itself.
pub fn delete_range(element: &Arc<Element>, start: &Path, end: &Path) -> Arc<Element> {
    if start >= end {
        return Arc::clone(element);
    }
    delete_in(element, &Path::root(), start, end).unwrap_or_else(|| Arc::clone(element))
}

fn delete_in(element: &Arc<Element>, at: &Path, start: &Path, end: &Path) -> Option<Arc<Element>> {
    let mut children = Vec::with_capacity(element.children.len());
    let mut changed = false;

    for (index, child) in element.children.iter().enumerate() {
        let path = at.child(index);

        match child {
            Node::Element(inner) => {
                if start < &path && &path < end && !path.contains(end) {
                    changed = true;
                    continue;
                }
                if path.contains(start) || path.contains(end) {
                    if let Some(trimmed) = delete_in(inner, &path, start, end) {
                        changed = true;
                        children.push(Node::Element(trimmed));
                        continue;
                    }
                }
                children.push(child.clone());
            }
            Node::Text(run) => {
                let len = run.len();
                let holds_start = start.parent().as_ref() == Some(&path);
                let holds_end = end.parent().as_ref() == Some(&path);

                if !holds_start && !holds_end {
                    if start < &path && &path < end {
                        changed = true;
                    } else {
                        children.push(child.clone());
                    }
                    continue;
                }

                let from = match (holds_start, start.last()) {
                    (true, Some(offset)) => offset.min(len),
                    _ if start < &path => 0,
                    _ => len,
                };
                let to = match (holds_end, end.last()) {
                    (true, Some(offset)) => offset.min(len),
                    _ if end < &path => 0,
                    _ => len,
                };

                if from >= to {
                    children.push(child.clone());
                    continue;
                }

                changed = true;
                let content = text::remove_range(&run.text, from, to);
                children.push(Node::Text(Arc::new(run.with_text(content))));
            }
        }
    }

    changed.then(|| Arc::new(element.with_replaced_children(children)))
}

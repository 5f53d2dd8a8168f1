//! # Coordinate translator
//!
//! Converts between DOM boundary points and tree paths, through the registry.
//!
//! DOM → tree:
//! - text node at `offset` → `path(text) ++ [offset]`
//! - `<br>` at any offset → `path(br) ++ [0]`
//! - element at child index `k` → the start of child `k` if it is a registered
//!   text or `<br>`, else the end of child `k - 1` if that is a registered
//!   text, else `path(element) ++ [k]`
//!
//! Tree → DOM is the reverse: the last index is split off, the owner is found
//! in the registry, and a `<br>` owner is expressed as a child index of its
//! parent (a `<br>` cannot hold a caret itself).

use crate::dom::{DomKind, DomNode, DomPoint, DomRange};
use crate::registry::NodeRegistry;
use folio_model::text::utf16_len;
use folio_model::{Path, Selection};

/// Tree path for a DOM boundary point, or `None` when the node is unknown.
pub fn point_to_path<N: DomNode>(registry: &NodeRegistry<N>, point: &DomPoint<N>) -> Option<Path> {
    match point.node.kind() {
        DomKind::Text => Some(registry.by_node(&point.node)?.child(point.offset)),
        DomKind::LineBreak => Some(registry.by_node(&point.node)?.child(0)),
        DomKind::Element => element_point_to_path(registry, &point.node, point.offset),
        DomKind::Other => None,
    }
}

fn element_point_to_path<N: DomNode>(registry: &NodeRegistry<N>, element: &N, index: usize) -> Option<Path> {
    let path = registry.by_node(element)?;
    let children = element.child_nodes();

    if let Some(child) = children.get(index) {
        if matches!(child.kind(), DomKind::Text | DomKind::LineBreak) {
            if let Some(child_path) = registry.by_node(child) {
                return Some(child_path.child(0));
            }
        }
    }

    if let Some(previous) = index.checked_sub(1).and_then(|i| children.get(i)) {
        if previous.kind() == DomKind::Text {
            if let Some(previous_path) = registry.by_node(previous) {
                return Some(previous_path.child(utf16_len(&previous.text_content())));
            }
        }
    }

    Some(path.child(index))
}

/// DOM boundary point for a tree path, or `None` when the owner is not rendered.
pub fn path_to_point<N: DomNode>(registry: &NodeRegistry<N>, path: &Path) -> Option<DomPoint<N>> {
    let owner_path = path.parent()?;
    let offset = path.last()?;
    let owner = registry.by_path(&owner_path)?;

    match owner.kind() {
        DomKind::Text => Some(DomPoint::new(owner.clone(), offset)),
        DomKind::LineBreak => {
            let parent = owner.parent_node()?;
            let index = owner.index_in_parent()?;
            Some(DomPoint::new(parent, index))
        }
        DomKind::Element => {
            // the path names a rendered child: point just before it
            if let Some(child) = registry.by_path(path) {
                if let (Some(parent), Some(index)) = (child.parent_node(), child.index_in_parent()) {
                    return Some(DomPoint::new(parent, index));
                }
            }
            let index = offset.min(owner.child_nodes().len());
            Some(DomPoint::new(owner.clone(), index))
        }
        DomKind::Other => None,
    }
}

/// Selection for a native range; both ends must resolve.
pub fn range_to_selection<N: DomNode>(registry: &NodeRegistry<N>, range: &DomRange<N>) -> Option<Selection> {
    Some(Selection {
        anchor: point_to_path(registry, &range.anchor)?,
        focus: point_to_path(registry, &range.focus)?,
    })
}

/// Native range for a selection, keeping its direction.
pub fn selection_to_range<N: DomNode>(registry: &NodeRegistry<N>, selection: &Selection) -> Option<DomRange<N>> {
    Some(DomRange::new(
        path_to_point(registry, &selection.anchor)?,
        path_to_point(registry, &selection.focus)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_dom::MemoryNode;

    /// `<div>[p: <span>"ho"</span>, <br>]</div>` registered as `[]`, `[0]`, `[0,0]`, `[0,1]`
    fn fixture() -> (NodeRegistry<MemoryNode>, MemoryNode, MemoryNode, MemoryNode, MemoryNode) {
        let root = MemoryNode::element("div");
        let p = MemoryNode::element("p");
        let text = MemoryNode::text("ho");
        let br = MemoryNode::line_break();
        root.append_child(&p);
        p.append_child(&text);
        p.append_child(&br);

        let mut registry = NodeRegistry::new();
        registry.add(root.clone(), Path::root());
        registry.add(p.clone(), Path::from([0]));
        registry.add(text.clone(), Path::from([0, 0]));
        registry.add(br.clone(), Path::from([0, 1]));
        (registry, root, p, text, br)
    }

    #[test]
    fn test_text_point() {
        let (registry, _, _, text, _) = fixture();
        let path = point_to_path(&registry, &DomPoint::new(text, 2));
        assert_eq!(path, Some(Path::from([0, 0, 2])));
    }

    #[test]
    fn test_line_break_point_maps_to_zero() {
        let (registry, _, _, _, br) = fixture();
        assert_eq!(point_to_path(&registry, &DomPoint::new(br, 0)), Some(Path::from([0, 1, 0])));
    }

    #[test]
    fn test_element_points_prefer_text_children() {
        let (registry, root, p, _, _) = fixture();
        // before the text
        assert_eq!(point_to_path(&registry, &DomPoint::new(p.clone(), 0)), Some(Path::from([0, 0, 0])));
        // before the <br>
        assert_eq!(point_to_path(&registry, &DomPoint::new(p.clone(), 1)), Some(Path::from([0, 1, 0])));
        // after the <br>, nothing textual around
        assert_eq!(point_to_path(&registry, &DomPoint::new(p, 2)), Some(Path::from([0, 2])));
        assert_eq!(point_to_path(&registry, &DomPoint::new(root, 1)), Some(Path::from([1])));
    }

    #[test]
    fn test_element_point_after_text_lands_at_end() {
        let root = MemoryNode::element("div");
        let text = MemoryNode::text("abc");
        root.append_child(&text);

        let mut registry = NodeRegistry::new();
        registry.add(root.clone(), Path::root());
        registry.add(text, Path::from([0]));

        assert_eq!(point_to_path(&registry, &DomPoint::new(root, 1)), Some(Path::from([0, 3])));
    }

    #[test]
    fn test_unregistered_node_does_not_resolve() {
        let (registry, ..) = fixture();
        let stray = MemoryNode::text("stray");
        assert_eq!(point_to_path(&registry, &DomPoint::new(stray, 0)), None);
    }

    #[test]
    fn test_path_to_point() {
        let (registry, _, p, text, _) = fixture();
        assert_eq!(path_to_point(&registry, &Path::from([0, 0, 1])), Some(DomPoint::new(text, 1)));
        // a caret on the <br> sits before it in its parent
        assert_eq!(path_to_point(&registry, &Path::from([0, 1, 0])), Some(DomPoint::new(p.clone(), 1)));
        assert_eq!(path_to_point(&registry, &Path::from([0, 2])), Some(DomPoint::new(p, 2)));
        assert_eq!(path_to_point(&registry, &Path::root()), None);
        assert_eq!(path_to_point(&registry, &Path::from([5, 0, 0])), None);
    }

    #[test]
    fn test_selection_round_trip_keeps_direction() {
        let (registry, ..) = fixture();
        let selection = Selection::new([0, 0, 2], [0, 0, 0]);
        let range = selection_to_range(&registry, &selection).unwrap();
        assert_eq!(range_to_selection(&registry, &range), Some(selection));
    }
}

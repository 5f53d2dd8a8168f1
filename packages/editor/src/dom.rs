//! # DOM abstraction
//!
//! The sync layer never touches a concrete DOM. It sees platform nodes through
//! [`DomNode`] and the native selection through [`SelectionSurface`]; the
//! browser binding implements both over `web-sys`, and
//! [`crate::memory_dom`] implements them in memory.
//!
//! Node handles are compared by identity (`Eq`/`Hash` must mean "same
//! platform node"), never by content.

use std::fmt::Debug;
use std::hash::Hash;

/// What a platform node is, as far as the sync layer cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomKind {
    Text,
    /// `<br>`, the rendering of an empty text run
    LineBreak,
    Element,
    Other,
}

/// Handle to a live platform node.
pub trait DomNode: Clone + Eq + Hash + Debug {
    fn kind(&self) -> DomKind;

    /// `textContent` of the node
    fn text_content(&self) -> String;

    fn parent_node(&self) -> Option<Self>;

    fn child_nodes(&self) -> Vec<Self>;

    /// Number of attributes; zero for non-elements
    fn attribute_count(&self) -> usize;

    /// Position among the parent's child nodes
    fn index_in_parent(&self) -> Option<usize> {
        self.parent_node()?.child_nodes().iter().position(|child| child == self)
    }

    fn child_at(&self, index: usize) -> Option<Self> {
        self.child_nodes().into_iter().nth(index)
    }
}

/// A `(node, offset)` boundary point, as used by DOM ranges.
///
/// For text nodes the offset counts UTF-16 code units; for other nodes it is a
/// child index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomPoint<N> {
    pub node: N,
    pub offset: usize,
}

impl<N> DomPoint<N> {
    pub fn new(node: N, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// An anchor/focus pair of boundary points, in native direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomRange<N> {
    pub anchor: DomPoint<N>,
    pub focus: DomPoint<N>,
}

impl<N: PartialEq> DomRange<N> {
    pub fn new(anchor: DomPoint<N>, focus: DomPoint<N>) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

impl<N: Clone> DomRange<N> {
    pub fn caret(point: DomPoint<N>) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }
}

/// Read/write access to the document's native selection.
pub trait SelectionSurface<N> {
    /// Current native selection, if it has a range
    fn range(&self) -> Option<DomRange<N>>;

    fn set_range(&mut self, range: &DomRange<N>);
}

//! # Selection
//!
//! A selection is an anchor/focus pair of points. It is *forward* when the
//! anchor is at or before the focus, and *collapsed* when the two are equal.
//!
//! Operations that shift or collapse offsets (`move_by`, `collapse_to_start`,
//! `collapse_to_end`) leave a selection touching the root path unchanged:
//! the root has no final index to act on.

use crate::access::resolve_text_point;
use crate::path::{compare_paths, Path};
use crate::tree::Element;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Path,
    pub focus: Path,
}

/// A selection ordered so that `start <= end`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: Path,
    pub end: Path,
}

impl Selection {
    pub fn new(anchor: impl Into<Path>, focus: impl Into<Path>) -> Self {
        Self {
            anchor: anchor.into(),
            focus: focus.into(),
        }
    }

    /// Caret at `point`
    pub fn collapsed(point: impl Into<Path>) -> Self {
        let point = point.into();
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_forward(&self) -> bool {
        compare_paths(&self.anchor, &self.focus) != Ordering::Greater
    }

    pub fn is_backward(&self) -> bool {
        !self.is_forward()
    }

    fn touches_root(&self) -> bool {
        self.anchor.is_root() || self.focus.is_root()
    }

    pub fn as_range(&self) -> SelectionRange {
        if self.is_forward() {
            SelectionRange {
                start: self.anchor.clone(),
                end: self.focus.clone(),
            }
        } else {
            SelectionRange {
                start: self.focus.clone(),
                end: self.anchor.clone(),
            }
        }
    }

    pub fn collapse_to_start(&self) -> Selection {
        if self.touches_root() {
            return self.clone();
        }
        Selection::collapsed(self.as_range().start)
    }

    pub fn collapse_to_end(&self) -> Selection {
        if self.touches_root() {
            return self.clone();
        }
        Selection::collapsed(self.as_range().end)
    }

    /// Shift the final index of both points by `offset`.
    ///
    /// Returns the selection unchanged when it touches the root or when
    /// either index would go below zero.
    pub fn move_by(&self, offset: isize) -> Selection {
        if self.touches_root() {
            return self.clone();
        }
        match (shift_last(&self.anchor, offset), shift_last(&self.focus, offset)) {
            (Some(anchor), Some(focus)) => Selection { anchor, focus },
            _ => self.clone(),
        }
    }

    /// Both points resolve to offsets inside text runs of `element`.
    pub fn is_valid(&self, element: &Arc<Element>) -> bool {
        resolve_text_point(element, &self.anchor).is_some()
            && resolve_text_point(element, &self.focus).is_some()
    }
}

impl SelectionRange {
    /// `path` lies within the range. An ancestor of either endpoint counts as
    /// inside, since part of its subtree is selected.
    pub fn contains(&self, path: &Path) -> bool {
        if path.is_ancestor_or_self(&self.start) || path.is_ancestor_or_self(&self.end) {
            return true;
        }
        compare_paths(&self.start, path) == Ordering::Less && compare_paths(path, &self.end) == Ordering::Less
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

fn shift_last(path: &Path, offset: isize) -> Option<Path> {
    let last = path.last()?;
    let shifted = last.checked_add_signed(offset)?;
    Some(path.with_last(shifted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction() {
        let forward = Selection::new([0, 0, 1], [0, 0, 3]);
        let backward = Selection::new([0, 1, 0], [0, 0, 3]);
        let caret = Selection::collapsed([0, 0, 2]);

        assert!(forward.is_forward());
        assert!(backward.is_backward());
        assert!(caret.is_forward());
        assert!(caret.is_collapsed());
    }

    #[test]
    fn test_as_range_orders_endpoints() {
        let backward = Selection::new([1, 0, 2], [0, 0, 3]);
        let range = backward.as_range();
        assert_eq!(range.start, Path::from([0, 0, 3]));
        assert_eq!(range.end, Path::from([1, 0, 2]));
        assert!(range.start <= range.end);
    }

    #[test]
    fn test_collapse() {
        let selection = Selection::new([0, 0, 4], [0, 0, 1]);
        assert_eq!(selection.collapse_to_start(), Selection::collapsed([0, 0, 1]));
        assert_eq!(selection.collapse_to_end(), Selection::collapsed([0, 0, 4]));
    }

    #[test]
    fn test_move_by() {
        let caret = Selection::collapsed([0, 0, 2]);
        assert_eq!(caret.move_by(1), Selection::collapsed([0, 0, 3]));
        assert_eq!(caret.move_by(-2), Selection::collapsed([0, 0, 0]));
        // underflow is rejected
        assert_eq!(caret.move_by(-3), caret);
    }

    #[test]
    fn test_root_selection_is_left_alone() {
        let root = Selection::collapsed(Path::root());
        assert_eq!(root.move_by(1), root);
        assert_eq!(root.collapse_to_start(), root);
        assert_eq!(root.collapse_to_end(), root);

        let mixed = Selection::new(Path::root(), [0, 1]);
        assert_eq!(mixed.move_by(1), mixed);
    }

    #[test]
    fn test_validity_against_tree() {
        let root = Element::new().with_child(Element::new().with_child("ho")).into_root();
        assert!(Selection::collapsed([0, 0, 2]).is_valid(&root));
        assert!(!Selection::collapsed([0, 0, 3]).is_valid(&root));
        assert!(!Selection::collapsed([0, 1]).is_valid(&root));
    }

    #[test]
    fn test_range_contains() {
        let range = Selection::new([0, 0, 1], [2, 0, 0]).as_range();
        assert!(range.contains(&Path::from([1])));
        assert!(range.contains(&Path::from([0])));
        assert!(range.contains(&Path::from([2, 0])));
        assert!(!range.contains(&Path::from([3])));
    }
}

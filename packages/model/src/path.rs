//! # Paths
//!
//! A [`Path`] addresses a node from the root element: each index selects a
//! child of the node reached so far. When the last step lands inside a
//! `Text`, that final index is a character offset (UTF-16 code units) rather
//! than a child index.
//!
//! Paths are totally ordered lexicographically. A strict prefix sorts before
//! its extensions, so an ancestor precedes every point inside it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    /// The root path `[]`
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Path(indices)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Path with the final index removed. `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        match self.0.split_last() {
            Some((_, rest)) => Some(Path(rest.to_vec())),
            None => None,
        }
    }

    /// Path extended by one index
    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Path(indices)
    }

    /// Same path with the final index replaced. The root is returned unchanged.
    pub fn with_last(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        if let Some(last) = indices.last_mut() {
            *last = index;
        }
        Path(indices)
    }

    /// True iff `other` is a strict extension of `self`.
    pub fn contains(&self, other: &Path) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }

    /// True iff `self` is `other` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Path(indices)
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Path(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", index)?;
        }
        f.write_str("]")
    }
}

/// Lexicographic comparison; a strict prefix compares less than its extensions.
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    a.cmp(b)
}

/// `a` is at or before `b` in document order.
pub fn is_forward(a: &Path, b: &Path) -> bool {
    compare_paths(a, b) != Ordering::Greater
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(indices: &[usize]) -> Path {
        Path::new(indices.to_vec())
    }

    #[test]
    fn test_compare_is_lexicographic() {
        assert_eq!(compare_paths(&p(&[0, 1]), &p(&[0, 2])), Ordering::Less);
        assert_eq!(compare_paths(&p(&[1]), &p(&[0, 5])), Ordering::Greater);
        assert_eq!(compare_paths(&p(&[0, 1]), &p(&[0, 1])), Ordering::Equal);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(compare_paths(&p(&[0]), &p(&[0, 0])), Ordering::Less);
        assert_eq!(compare_paths(&Path::root(), &p(&[0])), Ordering::Less);
    }

    #[test]
    fn test_ordering_is_total_and_antisymmetric() {
        let paths = [p(&[]), p(&[0]), p(&[0, 0]), p(&[0, 1]), p(&[1]), p(&[1, 0, 3])];
        for a in &paths {
            for b in &paths {
                let ab = compare_paths(a, b);
                let ba = compare_paths(b, a);
                assert_eq!(ab, ba.reverse());
                if a != b {
                    assert_ne!(is_forward(a, b), is_forward(b, a));
                } else {
                    assert_eq!(ab, Ordering::Equal);
                }
            }
        }
    }

    #[test]
    fn test_contains_requires_strict_extension() {
        assert!(p(&[0]).contains(&p(&[0, 3])));
        assert!(Path::root().contains(&p(&[2])));
        assert!(!p(&[0]).contains(&p(&[0])));
        assert!(!p(&[0, 3]).contains(&p(&[0])));
        assert!(!p(&[1]).contains(&p(&[0, 1])));
    }

    #[test]
    fn test_parent_child_and_with_last() {
        let path = p(&[0, 2, 5]);
        assert_eq!(path.parent(), Some(p(&[0, 2])));
        assert_eq!(path.with_last(1), p(&[0, 2, 1]));
        assert_eq!(p(&[0, 2]).child(5), path);
        assert_eq!(Path::root().parent(), None);
        assert_eq!(Path::root().with_last(3), Path::root());
    }

    #[test]
    fn test_display() {
        assert_eq!(p(&[0, 1, 12]).to_string(), "[0,1,12]");
        assert_eq!(Path::root().to_string(), "[]");
    }

    #[test]
    fn test_serializes_as_array() {
        let json = serde_json::to_string(&p(&[0, 0, 3])).unwrap();
        assert_eq!(json, "[0,0,3]");
    }
}

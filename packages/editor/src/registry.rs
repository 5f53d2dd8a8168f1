//! # Node↔Path registry
//!
//! Bidirectional association between live DOM nodes and tree paths. It is
//! filled only by ref callbacks while a render commits, and read by the event
//! handlers. It holds handles, not ownership: entries are removed explicitly
//! when the renderer detaches a node.
//!
//! ## Ref callbacks
//!
//! The renderer asks for one callback per rendered path and forwards it to the
//! DOM node it creates. Callbacks are memoized by path, so a renderer that
//! compares callback identity sees the same callback for the same path and a
//! different one when a node moves. Each callback only ever writes under its
//! own path.

use crate::dom::DomNode;
use folio_model::Path;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::trace;

/// Registry shared between the editor and the ref callbacks it hands out
pub type SharedRegistry<N> = Rc<RefCell<NodeRegistry<N>>>;

#[derive(Debug)]
pub struct NodeRegistry<N: DomNode> {
    by_path: HashMap<Path, N>,
    by_node: HashMap<N, Path>,
}

impl<N: DomNode> NodeRegistry<N> {
    pub fn new() -> Self {
        Self {
            by_path: HashMap::new(),
            by_node: HashMap::new(),
        }
    }

    pub fn shared() -> SharedRegistry<N> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Associate `node` with `path`, dropping whatever either was paired with.
    pub fn add(&mut self, node: N, path: Path) {
        if let Some(old_path) = self.by_node.remove(&node) {
            if old_path != path {
                self.by_path.remove(&old_path);
            }
        }
        if let Some(old_node) = self.by_path.remove(&path) {
            if old_node != node {
                self.by_node.remove(&old_node);
            }
        }
        trace!(path = %path, "registry add");
        self.by_node.insert(node.clone(), path.clone());
        self.by_path.insert(path, node);
    }

    /// Remove the pair `(node, path)`. Nothing happens unless they are
    /// currently paired with each other.
    pub fn remove(&mut self, node: &N, path: &Path) -> bool {
        if self.by_path.get(path) != Some(node) {
            return false;
        }
        trace!(path = %path, "registry remove");
        self.by_path.remove(path);
        self.by_node.remove(node);
        true
    }

    pub fn by_path(&self, path: &Path) -> Option<&N> {
        self.by_path.get(path)
    }

    pub fn by_node(&self, node: &N) -> Option<&Path> {
        self.by_node.get(node)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Forget everything, e.g. before a renderer remounts the root
    pub fn clear(&mut self) {
        self.by_path.clear();
        self.by_node.clear();
    }
}

impl<N: DomNode> Default for NodeRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ref callback bound to one path.
#[derive(Debug)]
pub struct RefCallback<N: DomNode> {
    inner: Rc<RefCallbackInner<N>>,
}

#[derive(Debug)]
struct RefCallbackInner<N: DomNode> {
    path: Path,
    attached: RefCell<Option<N>>,
    registry: Weak<RefCell<NodeRegistry<N>>>,
}

impl<N: DomNode> Clone for RefCallback<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N: DomNode> RefCallback<N> {
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Called by the renderer with the committed node, or `None` on unmount.
    pub fn call(&self, node: Option<N>) {
        let Some(registry) = self.inner.registry.upgrade() else {
            return;
        };
        let mut registry = registry.borrow_mut();
        let previous = self.inner.attached.replace(node.clone());

        if let Some(previous) = previous {
            if node.as_ref() != Some(&previous) {
                registry.remove(&previous, &self.inner.path);
            }
        }
        if let Some(node) = node {
            registry.add(node, self.inner.path.clone());
        }
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached.borrow().is_some()
    }

    /// Same memoized callback
    pub fn ptr_eq(&self, other: &RefCallback<N>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Per-path memo of ref callbacks.
#[derive(Debug)]
pub struct RefCallbacks<N: DomNode> {
    registry: SharedRegistry<N>,
    callbacks: RefCell<HashMap<Path, RefCallback<N>>>,
}

impl<N: DomNode> RefCallbacks<N> {
    pub fn new(registry: SharedRegistry<N>) -> Self {
        Self {
            registry,
            callbacks: RefCell::new(HashMap::new()),
        }
    }

    /// The callback for `path`, created on first request.
    pub fn for_path(&self, path: &Path) -> RefCallback<N> {
        let mut callbacks = self.callbacks.borrow_mut();
        callbacks
            .entry(path.clone())
            .or_insert_with(|| RefCallback {
                inner: Rc::new(RefCallbackInner {
                    path: path.clone(),
                    attached: RefCell::new(None),
                    registry: Rc::downgrade(&self.registry),
                }),
            })
            .clone()
    }

    /// Drop memoized callbacks that currently have no node attached.
    pub fn prune_detached(&self) {
        self.callbacks.borrow_mut().retain(|_, callback| callback.is_attached());
    }

    /// Forget all callbacks and registry entries, for a full remount.
    pub fn reset(&self) {
        self.callbacks.borrow_mut().clear();
        self.registry.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }
}

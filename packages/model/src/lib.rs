//! # Folio Model
//!
//! Immutable rich-text document tree addressed by integer paths.
//!
//! ## Shape
//!
//! ```text
//! Element { id, tag?, props, children: [Element | Text] }
//! Text    { id, text }            "" is a line break (<br>)
//! Path    [usize]                 child indices, last may be a UTF-16 offset
//! Value   { element, selection?, hasFocus }
//! ```
//!
//! ## Core Principles
//!
//! 1. **Structural sharing**: edits copy only the spine they touch, so
//!    `Arc::ptr_eq` is a valid "unchanged" test anywhere in the tree
//! 2. **Stable identity**: every node carries a [`NodeId`] from construction on
//! 3. **Normalized**: adjacent non-empty text runs are always merged
//!
//! ## Usage
//!
//! ```rust
//! use folio_model::{access, normalize, Element, Node, Path};
//!
//! let root = Element::new()
//!     .with_child(Element::new().with_children(["a", "b"]))
//!     .into_root();
//!
//! let root = normalize::normalize(&root);
//! let text = access::get_text(&root, &Path::from([0, 0])).unwrap();
//! assert_eq!(text.text, "ab");
//!
//! let root = access::set(&root, &Path::from([0, 0]), Node::text("c"));
//! assert!(normalize::is_normalized(&root));
//! ```

pub mod access;
pub mod edit;
mod errors;
pub mod node_id;
pub mod normalize;
pub mod path;
pub mod selection;
pub mod text;
pub mod tree;
mod value;

pub use errors::ModelError;
pub use node_id::{IdGenerator, NodeId};
pub use path::{compare_paths, is_forward, Path};
pub use selection::{Selection, SelectionRange};
pub use tree::{plain_text, Element, Node, Text};
pub use value::Value;

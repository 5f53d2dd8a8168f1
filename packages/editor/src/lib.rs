//! # Folio Editor
//!
//! Keeps a folio document and a contentEditable DOM in sync.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ DOM: beforeinput, mutations, selectionchange│
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ sync layer                                  │
//! │  - registry: DOM node ↔ tree path           │
//! │  - translator: DOM point ↔ tree path        │
//! │  - interceptor: native, prevent or drop     │
//! │  - afterTyping: read back on next frame     │
//! │  - reconciler: mutation batches → SetText   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ reducer: (Value, Action) → Value            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//!        on_change → host renders → sync_selection
//! ```
//!
//! ## Core Principles
//!
//! 1. **Model is the source of truth**: the DOM is written by the renderer;
//!    native edits are only let through when the model can read them back
//! 2. **Fail silently, stay consistent**: anything that cannot be resolved is
//!    dropped with a [`Diagnostic`] instead of half-applied
//! 3. **No-op is identity**: an action that changes nothing returns the same
//!    `Arc<Value>`, and nobody is notified
//!
//! ## Usage
//!
//! ```rust
//! use folio_editor::memory_dom::{MemoryNode, MemoryRenderer};
//! use folio_editor::{Action, Editor, ManualFrames};
//! use folio_model::{Element, Path, Selection, Value};
//!
//! let element = Element::new().with_child(Element::new().with_child("ho")).into_root();
//! let mut editor: Editor<MemoryNode> = Editor::new(Value::new(element), ManualFrames::new());
//!
//! let mut renderer = MemoryRenderer::new(MemoryNode::element("main"));
//! renderer.render(&editor.value().element, |path| editor.ref_callback(path));
//!
//! editor.dispatch(Action::InsertText {
//!     text: "j".to_string(),
//!     selection: Selection::collapsed([0, 0, 3]),
//! });
//! assert_eq!(folio_model::plain_text(&editor.value().element), "hoj");
//! assert!(editor.registry().borrow().by_path(&Path::from([0, 0])).is_some());
//! ```

mod actions;
mod after_typing;
pub mod diagnostics;
pub mod dom;
mod editor;
mod errors;
pub mod input;
pub mod memory_dom;
pub mod mutations;
mod options;
mod reducer;
pub mod registry;
pub mod translator;

pub use actions::Action;
pub use after_typing::{AfterTyping, AfterTypingQueue, FrameScheduler, ManualFrames};
pub use dom::{DomKind, DomNode, DomPoint, DomRange, SelectionSurface};
pub use editor::{ChangeHandler, Editor};
pub use errors::{Diagnostic, EditorError};
pub use input::{BeforeInput, InputType, Interception};
pub use mutations::{MutationRecord, MutationShape, Reconciliation};
pub use options::EditorOptions;
pub use reducer::reduce;
pub use registry::{NodeRegistry, RefCallback, RefCallbacks, SharedRegistry};

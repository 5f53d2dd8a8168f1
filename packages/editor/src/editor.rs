//! # Editor controller
//!
//! Owns the current [`Value`] and routes every DOM event through the sync
//! layer into the reducer.
//!
//! ## Event flow
//!
//! ```text
//! beforeinput ──► intercept ──► Native  ──► afterTyping queue ──► next frame ──► reduce
//!                           ├─► Prevent ──────────────────────────────────────► reduce
//!                           └─► Drop    ──► diagnostic
//! mutations   ──► reconcile ──► registry updates + SetText ───────────────────► reduce
//! selection   ──► translate ──► SelectionChange ──────────────────────────────► reduce
//! ```
//!
//! Every new value (pointer-different from the last) goes to `on_change`. The
//! host renders it with [`Editor::ref_callback`] and then calls
//! [`Editor::sync_selection`] before the next paint.

use crate::actions::Action;
use crate::after_typing::{AfterTyping, AfterTypingQueue, FrameScheduler};
use crate::diagnostics::{check_normalized, check_rendered};
use crate::dom::{DomKind, DomNode, DomRange, SelectionSurface};
use crate::errors::Diagnostic;
use crate::input::{intercept, BeforeInput, Interception};
use crate::mutations::{reconcile, MutationRecord, Reconciliation};
use crate::options::EditorOptions;
use crate::reducer::reduce;
use crate::registry::{NodeRegistry, RefCallback, RefCallbacks, SharedRegistry};
use crate::translator::{range_to_selection, selection_to_range};
use folio_model::access::{get, get_text};
use folio_model::text::utf16_len;
use folio_model::{Node, Path, Value};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Called with every new value
pub type ChangeHandler = Box<dyn FnMut(&Arc<Value>)>;

pub struct Editor<N: DomNode> {
    value: Arc<Value>,
    registry: SharedRegistry<N>,
    refs: RefCallbacks<N>,
    after_typing: AfterTypingQueue,
    scheduler: Box<dyn FrameScheduler>,
    options: EditorOptions,
    on_change: Option<ChangeHandler>,
}

impl<N: DomNode> Editor<N> {
    pub fn new(value: Value, scheduler: impl FrameScheduler + 'static) -> Self {
        let registry = NodeRegistry::shared();
        let refs = RefCallbacks::new(Rc::clone(&registry));
        let editor = Self {
            value: Arc::new(value),
            registry,
            refs,
            after_typing: AfterTypingQueue::new(),
            scheduler: Box::new(scheduler),
            options: EditorOptions::default(),
            on_change: None,
        };
        editor.check_value();
        editor
    }

    pub fn with_options(mut self, options: EditorOptions) -> Self {
        self.options = options;
        self.check_value();
        self
    }

    pub fn on_change(mut self, handler: impl FnMut(&Arc<Value>) + 'static) -> Self {
        self.on_change = Some(Box::new(handler));
        self
    }

    pub fn value(&self) -> &Arc<Value> {
        &self.value
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Replace the value without notifying, for hosts feeding a (possibly
    /// modified) value back in.
    pub fn set_value(&mut self, value: Arc<Value>) {
        if Arc::ptr_eq(&self.value, &value) {
            return;
        }
        self.value = value;
        self.check_value();
    }

    pub fn registry(&self) -> SharedRegistry<N> {
        Rc::clone(&self.registry)
    }

    /// Run `action` through the reducer. Returns whether the value changed.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let next = reduce(&self.value, &action);
        if Arc::ptr_eq(&next, &self.value) {
            debug!(action = action.name(), "no-op action");
            return false;
        }
        debug!(action = action.name(), "dispatched");
        self.value = next;
        self.check_value();

        if let Some(on_change) = self.on_change.as_mut() {
            on_change(&self.value);
        }
        true
    }

    /// The ref callback the renderer attaches to the node rendered at `path`
    pub fn ref_callback(&self, path: &Path) -> RefCallback<N> {
        self.refs.for_path(path)
    }

    /// Forget all registry entries and callbacks before a full remount
    pub fn reset_registry(&mut self) {
        self.refs.reset();
    }

    pub fn pending_after_typing(&self) -> usize {
        self.after_typing.len()
    }

    /// Classify a `beforeinput` event and act on it. The caller must call
    /// `preventDefault` when the result says so.
    pub fn handle_before_input(&mut self, event: &BeforeInput<N>, native: Option<&DomRange<N>>) -> Interception {
        let interception = {
            let registry = self.registry.borrow();
            intercept(event, native, &registry, &self.value)
        };

        match &interception {
            Interception::Native(continuation) => {
                self.after_typing.push(continuation.clone(), self.scheduler.as_mut());
            }
            Interception::Prevent(action) => {
                // earlier native edits are already in the DOM; apply them first
                if self.after_typing.is_pending() {
                    self.on_animation_frame();
                }
                self.dispatch(action.clone());
            }
            Interception::Drop(diagnostic) => report(diagnostic),
        }
        interception
    }

    /// Reconcile one `MutationObserver` batch.
    pub fn handle_mutations(&mut self, records: &[MutationRecord<N>]) -> Reconciliation {
        let reconciliation = reconcile(records, &mut self.registry.borrow_mut());

        if let Some(action) = &reconciliation.action {
            if self.options.suppress_mutations_while_typing && self.after_typing.is_pending() {
                debug!(action = action.name(), "withheld while afterTyping is pending");
            } else {
                self.dispatch(action.clone());
            }
        }
        reconciliation
    }

    /// Follow the document selection. Ranges outside the editor are ignored.
    pub fn handle_selection_change(&mut self, native: Option<&DomRange<N>>) {
        if self.after_typing.is_pending() {
            debug!("selectionchange ignored while afterTyping is pending");
            return;
        }
        let selection = match native {
            Some(range) => {
                let resolved = range_to_selection(&self.registry.borrow(), range);
                match resolved {
                    Some(selection) => Some(selection),
                    None => {
                        debug!("selection outside the editor");
                        return;
                    }
                }
            }
            None => None,
        };
        self.dispatch(Action::SelectionChange { selection });
    }

    pub fn handle_focus(&mut self) {
        self.dispatch(Action::Focus);
    }

    pub fn handle_blur(&mut self) {
        self.dispatch(Action::Blur);
    }

    /// Run every due afterTyping continuation, then verify the runs they
    /// touched against the DOM.
    pub fn on_animation_frame(&mut self) {
        let due = self.after_typing.drain();
        if due.is_empty() {
            return;
        }
        let before = Arc::clone(&self.value);
        // runs whose full DOM text was already read this frame
        let mut read_back: Vec<&Path> = Vec::new();

        for continuation in &due {
            let text_path = continuation.text_path();
            if let AfterTyping::InsertText { data, caret, .. } = continuation {
                if read_back.contains(&text_path) {
                    // the read already holds this keystroke; only the caret moves
                    if let Ok(advance) = isize::try_from(utf16_len(data)) {
                        self.dispatch(Action::SelectionChange {
                            selection: Some(caret.move_by(advance)),
                        });
                    }
                    continue;
                }
            }
            match self.continuation_action(continuation) {
                Some(action) => {
                    if !matches!(continuation, AfterTyping::InsertText { .. }) {
                        read_back.push(text_path);
                    }
                    self.dispatch(action);
                }
                None => report(&Diagnostic::UnresolvableCoordinate(format!(
                    "no rendered run at {}",
                    continuation.text_path()
                ))),
            }
        }

        if self.options.verify_after_typing {
            let mut touched: Vec<&Path> = due.iter().map(AfterTyping::text_path).collect();
            touched.sort();
            touched.dedup();
            for path in touched {
                self.verify_text(&before, path);
            }
        }
    }

    fn continuation_action(&self, continuation: &AfterTyping) -> Option<Action> {
        match continuation {
            AfterTyping::InsertText { data, caret, .. } => {
                let advance = isize::try_from(utf16_len(data)).ok()?;
                Some(Action::InsertText {
                    text: data.clone(),
                    selection: caret.move_by(advance),
                })
            }
            AfterTyping::ReplacementText { text_path } => Some(Action::InsertReplacementText {
                text: self.dom_text(text_path)?,
            }),
            AfterTyping::Resync { text_path, caret } => Some(Action::DeleteText {
                text: self.dom_text(text_path)?,
                selection: caret.clone(),
            }),
        }
    }

    fn dom_text(&self, path: &Path) -> Option<String> {
        let registry = self.registry.borrow();
        let node = registry.by_path(path)?;
        matches!(node.kind(), DomKind::Text | DomKind::LineBreak).then(|| node.text_content())
    }

    /// Resync the run at `path` from the DOM when they disagree. Skipped when
    /// the run's siblings were merged or split since `before`: the DOM still
    /// shows the old runs until the next render.
    fn verify_text(&mut self, before: &Arc<Value>, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        if sibling_count(before, &parent) != sibling_count(&self.value, &parent) {
            debug!(path = %path, "run structure changed, skipping verification");
            return;
        }
        let (Some(dom), Some(model)) = (self.dom_text(path), get_text(&self.value.element, path)) else {
            return;
        };
        if dom == model.text {
            return;
        }
        report(&Diagnostic::TextMismatch { path: path.clone() });
        self.dispatch(Action::SetText {
            path: path.clone(),
            text: dom,
        });
    }

    /// Write the model selection into the native one. Call after every render
    /// commit, before paint. Returns whether the native selection was written.
    pub fn sync_selection(&self, surface: &mut dyn SelectionSurface<N>) -> bool {
        self.refs.prune_detached();
        if !self.value.has_focus || self.after_typing.is_pending() {
            return false;
        }
        let Some(selection) = &self.value.selection else {
            return false;
        };
        let Some(range) = selection_to_range(&self.registry.borrow(), selection) else {
            debug!(anchor = %selection.anchor, focus = %selection.focus, "selection is not rendered");
            return false;
        };
        if surface.range().as_ref() == Some(&range) {
            return false;
        }
        surface.set_range(&range);
        true
    }

    /// Development check of the rendered DOM under `root`
    pub fn check_rendered(&self, root: &N) -> Vec<Diagnostic> {
        if !self.options.development_checks {
            return Vec::new();
        }
        check_rendered(root)
    }

    fn check_value(&self) {
        if self.options.development_checks {
            check_normalized(&self.value.element);
        }
    }
}

fn sibling_count(value: &Value, parent: &Path) -> Option<usize> {
    match get(&value.element, parent)? {
        Node::Element(element) => Some(element.children.len()),
        Node::Text(_) => None,
    }
}

fn report(diagnostic: &Diagnostic) {
    if diagnostic.is_unrecognized() {
        warn!(%diagnostic, "input dropped");
    } else {
        debug!(%diagnostic, "input dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::after_typing::ManualFrames;
    use crate::dom::DomPoint;
    use crate::memory_dom::{MemoryNode, MemoryRenderer, MemorySelection};
    use folio_model::{Element, Selection};
    use std::cell::RefCell;

    fn editor_with(text: &str) -> (Editor<MemoryNode>, MemoryRenderer, ManualFrames) {
        let frames = ManualFrames::new();
        let element = Element::new().with_child(Element::new().with_tag("p").with_child(text)).into_root();
        let value = Value::new(element)
            .with_selection(Selection::collapsed([0, 0, 0]))
            .with_focus(true);
        let editor = Editor::new(value, frames.clone());
        let mut renderer = MemoryRenderer::new(MemoryNode::element("main"));
        renderer.render(&editor.value().element, |path| editor.ref_callback(path));
        (editor, renderer, frames)
    }

    fn text_node(editor: &Editor<MemoryNode>, path: &[usize]) -> MemoryNode {
        editor.registry().borrow().by_path(&Path::new(path.to_vec())).cloned().unwrap()
    }

    #[test]
    fn test_dispatch_notifies_only_on_change() {
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        let (editor, ..) = editor_with("ho");
        let mut editor = editor.on_change(move |_| *counter.borrow_mut() += 1);

        assert!(!editor.dispatch(Action::Focus));
        assert!(editor.dispatch(Action::Blur));
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_native_typing_catches_up_on_next_frame() {
        let (mut editor, _renderer, frames) = editor_with("ho");
        let text = text_node(&editor, &[0, 0]);
        let caret = DomRange::caret(DomPoint::new(text.clone(), 2));

        let event = BeforeInput::new("insertText").with_data("j");
        let result = editor.handle_before_input(&event, Some(&caret));
        assert!(!result.prevents_default());
        assert_eq!(frames.requested(), 1);

        let (_, records) = text.type_text(2, "j").unwrap();
        let reconciliation = editor.handle_mutations(&records);
        // the read-back owns this edit
        assert!(reconciliation.action.is_some());
        assert_eq!(get_text(&editor.value().element, &Path::from([0, 0])).unwrap().text, "ho");

        assert!(frames.take());
        editor.on_animation_frame();
        assert_eq!(get_text(&editor.value().element, &Path::from([0, 0])).unwrap().text, "hoj");
        assert_eq!(editor.value().selection, Some(Selection::collapsed([0, 0, 3])));
    }

    #[test]
    fn test_mutations_apply_when_nothing_is_pending() {
        let (mut editor, ..) = editor_with("ho");
        let text = text_node(&editor, &[0, 0]);
        let (_, records) = text.type_text(0, "e").unwrap();

        editor.handle_mutations(&records);
        assert_eq!(get_text(&editor.value().element, &Path::from([0, 0])).unwrap().text, "eho");
    }

    #[test]
    fn test_verification_resyncs_from_dom() {
        let (mut editor, _renderer, _frames) = editor_with("ho");
        let text = text_node(&editor, &[0, 0]);
        let caret = DomRange::caret(DomPoint::new(text.clone(), 2));

        editor.handle_before_input(&BeforeInput::new("insertText").with_data("j"), Some(&caret));
        // the browser autocorrected while inserting
        text.set_text("hoJ");
        editor.on_animation_frame();

        assert_eq!(get_text(&editor.value().element, &Path::from([0, 0])).unwrap().text, "hoJ");
    }

    #[test]
    fn test_sync_selection_writes_only_on_difference() {
        let (editor, _renderer, _frames) = editor_with("ho");
        let mut selection = MemorySelection::new();

        assert!(editor.sync_selection(&mut selection));
        assert!(!editor.sync_selection(&mut selection));
        assert_eq!(selection.writes(), 1);
    }

    #[test]
    fn test_selection_change_follows_native() {
        let (mut editor, ..) = editor_with("ho");
        let text = text_node(&editor, &[0, 0]);
        editor.handle_selection_change(Some(&DomRange::caret(DomPoint::new(text, 1))));
        assert_eq!(editor.value().selection, Some(Selection::collapsed([0, 0, 1])));

        // outside the editor
        let stray = MemoryNode::text("elsewhere");
        editor.handle_selection_change(Some(&DomRange::caret(DomPoint::new(stray, 0))));
        assert_eq!(editor.value().selection, Some(Selection::collapsed([0, 0, 1])));
    }
}

//! End-to-end editing sessions against the in-memory DOM

use anyhow::{anyhow, Result};
use folio_editor::memory_dom::{MemoryNode, MemoryRenderer, MemorySelection};
use folio_editor::{
    reduce, Action, BeforeInput, Diagnostic, DomKind, DomNode, DomPoint, DomRange, Editor, EditorOptions,
    Interception, ManualFrames, MutationShape, SelectionSurface,
};
use folio_model::access::get_text;
use folio_model::{plain_text, Element, Node, Path, Selection, Value};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Editor + renderer + native selection, re-rendering on every change
struct Session {
    editor: Editor<MemoryNode>,
    renderer: MemoryRenderer,
    selection: MemorySelection,
    frames: ManualFrames,
    changes: Rc<RefCell<usize>>,
    /// Plain text of every value handed to `on_change`
    history: Rc<RefCell<Vec<String>>>,
}

impl Session {
    fn new(value: Value) -> Self {
        Self::with_options(value, EditorOptions::development())
    }

    fn with_options(value: Value, options: EditorOptions) -> Self {
        init_tracing();
        let frames = ManualFrames::new();
        let changes = Rc::new(RefCell::new(0));
        let history = Rc::new(RefCell::new(Vec::new()));
        let counter = Rc::clone(&changes);
        let seen = Rc::clone(&history);
        let editor = Editor::new(value, frames.clone())
            .with_options(options)
            .on_change(move |value: &Arc<Value>| {
                *counter.borrow_mut() += 1;
                seen.borrow_mut().push(plain_text(&value.element));
            });

        let mut session = Self {
            editor,
            renderer: MemoryRenderer::new(MemoryNode::element("main")),
            selection: MemorySelection::new(),
            frames,
            changes,
            history,
        };
        session.commit();
        session
    }

    /// Paragraphs of text, caret at `caret`, focused
    fn with_paragraphs(paragraphs: &[&str], caret: &[usize]) -> Self {
        Self::new(Self::paragraphs(paragraphs, caret))
    }

    fn paragraphs(paragraphs: &[&str], caret: &[usize]) -> Value {
        let element = paragraphs
            .iter()
            .fold(Element::new(), |root, text| {
                root.with_child(Element::new().with_tag("p").with_child(Node::text(*text)))
            })
            .into_root();
        Value::new(element)
            .with_selection(Selection::collapsed(Path::new(caret.to_vec())))
            .with_focus(true)
    }

    /// Render the current value and run the layout effect
    fn commit(&mut self) {
        let editor = &self.editor;
        self.renderer.render(&editor.value().element, |path| editor.ref_callback(path));
        self.editor.sync_selection(&mut self.selection);
    }

    fn node(&self, path: &[usize]) -> Result<MemoryNode> {
        self.editor
            .registry()
            .borrow()
            .by_path(&Path::new(path.to_vec()))
            .cloned()
            .ok_or_else(|| anyhow!("nothing registered at {path:?}"))
    }

    fn caret_in(&self, path: &[usize], offset: usize) -> Result<DomRange<MemoryNode>> {
        Ok(DomRange::caret(DomPoint::new(self.node(path)?, offset)))
    }

    fn before_input(&mut self, event: BeforeInput<MemoryNode>) -> Interception {
        let native = self.selection.range();
        self.editor.handle_before_input(&event, native.as_ref())
    }

    /// Let the browser type `data` at the native caret, as if default was not prevented
    fn type_natively(&mut self, data: &str) -> Result<()> {
        let caret = self.selection.range().ok_or_else(|| anyhow!("no native selection"))?;
        let (text, records) = caret
            .focus
            .node
            .type_text(caret.focus.offset, data)
            .ok_or_else(|| anyhow!("cannot type into {:?}", caret.focus.node))?;
        self.selection.place(DomRange::caret(DomPoint::new(
            text,
            caret.focus.offset + data.encode_utf16().count(),
        )));
        self.editor.handle_mutations(&records);
        Ok(())
    }

    fn next_frame(&mut self) {
        while self.frames.take() {
            self.editor.on_animation_frame();
        }
        self.commit();
    }

    fn text(&self, path: &[usize]) -> Option<String> {
        get_text(&self.editor.value().element, &Path::new(path.to_vec())).map(|t| t.text.clone())
    }
}

#[test]
fn test_typing_burst_composes_on_one_frame() -> Result<()> {
    let mut session = Session::with_paragraphs(&["ho"], &[0, 0, 2]);

    for key in ["j", "!"] {
        let result = session.before_input(BeforeInput::new("insertText").with_data(key));
        assert!(!result.prevents_default());
        session.type_natively(key)?;
    }
    assert_eq!(session.frames.requested(), 1);
    assert_eq!(session.text(&[0, 0]).as_deref(), Some("ho"));

    session.next_frame();
    assert_eq!(session.text(&[0, 0]).as_deref(), Some("hoj!"));
    assert_eq!(session.editor.value().selection, Some(Selection::collapsed([0, 0, 4])));
    assert_eq!(session.node(&[0, 0])?.text_content(), "hoj!");
    Ok(())
}

#[test]
fn test_typing_into_empty_line() -> Result<()> {
    let mut session = Session::with_paragraphs(&["ho", ""], &[1, 0, 0]);
    assert_eq!(session.node(&[1, 0])?.kind(), DomKind::LineBreak);
    // caret on an empty line sits before the <br> in its paragraph
    assert_eq!(session.selection.range(), Some(DomRange::caret(DomPoint::new(session.node(&[1])?, 0))));

    session.selection.place(session.caret_in(&[1, 0], 0)?);
    session.before_input(BeforeInput::new("insertText").with_data("x"));
    session.type_natively("x")?;
    // the reconciler handed the <br>'s path to the new text node
    assert_eq!(session.node(&[1, 0])?.kind(), DomKind::Text);

    session.next_frame();
    assert_eq!(session.text(&[1, 0]).as_deref(), Some("x"));
    assert_eq!(session.editor.value().selection, Some(Selection::collapsed([1, 0, 1])));
    assert_eq!(session.renderer.container().to_html(), "<main><div><p>ho</p><p>x</p></div></main>");
    Ok(())
}

#[test]
fn test_backspace_emptying_a_run_becomes_line_break() -> Result<()> {
    let mut session = Session::with_paragraphs(&["b"], &[0, 0, 1]);
    session.selection.place(session.caret_in(&[0, 0], 1)?);

    let result = session.before_input(BeforeInput::new("deleteContentBackward"));
    assert!(result.prevents_default());
    session.commit();

    assert_eq!(session.text(&[0, 0]).as_deref(), Some(""));
    assert_eq!(session.editor.value().selection, Some(Selection::collapsed([0, 0, 0])));
    assert_eq!(session.node(&[0, 0])?.kind(), DomKind::LineBreak);
    assert_eq!(session.renderer.container().to_html(), "<main><div><p><br></p></div></main>");
    Ok(())
}

#[test]
fn test_native_backspace_reads_back_dom() -> Result<()> {
    let mut session = Session::with_paragraphs(&["hoj"], &[0, 0, 3]);
    let text = session.node(&[0, 0])?;

    let result = session.before_input(BeforeInput::new("deleteContentBackward"));
    assert!(!result.prevents_default());

    let records = text.delete_text(2, 3).ok_or_else(|| anyhow!("delete failed"))?;
    let reconciliation = session.editor.handle_mutations(&records);
    assert_eq!(reconciliation.shape, MutationShape::TextEdited);
    assert_eq!(session.text(&[0, 0]).as_deref(), Some("hoj"));

    session.next_frame();
    assert_eq!(session.text(&[0, 0]).as_deref(), Some("ho"));
    assert_eq!(session.editor.value().selection, Some(Selection::collapsed([0, 0, 2])));
    Ok(())
}

#[test]
fn test_browser_substituted_break_is_reconciled() -> Result<()> {
    let mut session = Session::with_paragraphs(&["a"], &[0, 0, 1]);
    let text = session.node(&[0, 0])?;

    // an engine emptied the node without a beforeinput we could intercept
    let records = text.delete_text(0, 1).ok_or_else(|| anyhow!("delete failed"))?;
    let reconciliation = session.editor.handle_mutations(&records);

    assert_eq!(reconciliation.shape, MutationShape::TextReplacedByBreak);
    assert_eq!(session.text(&[0, 0]).as_deref(), Some(""));
    assert_eq!(session.node(&[0, 0])?.kind(), DomKind::LineBreak);
    assert_eq!(session.editor.value().selection, Some(Selection::collapsed([0, 0, 0])));
    Ok(())
}

#[test]
fn test_range_deletion_across_paragraphs() -> Result<()> {
    let mut session = Session::with_paragraphs(&["first", "second"], &[0, 0, 0]);
    session.selection.place(DomRange::new(
        DomPoint::new(session.node(&[0, 0])?, 2),
        DomPoint::new(session.node(&[1, 0])?, 3),
    ));

    let result = session.before_input(BeforeInput::new("deleteContentBackward"));
    assert!(matches!(result, Interception::Prevent(Action::DeleteContent { .. })));
    session.commit();

    assert_eq!(plain_text(&session.editor.value().element), "fiond");
    assert_eq!(session.editor.value().selection, Some(Selection::collapsed([0, 0, 2])));
    assert_eq!(session.selection.range(), Some(session.caret_in(&[0, 0], 2)?));
    Ok(())
}

#[test]
fn test_unhandled_input_is_prevented_and_reported() -> Result<()> {
    let mut session = Session::with_paragraphs(&["ho"], &[0, 0, 2]);
    session.selection.place(session.caret_in(&[0, 0], 2)?);
    let before = Arc::clone(session.editor.value());

    let result = session.before_input(BeforeInput::new("insertParagraph"));
    assert!(result.prevents_default());
    assert_eq!(result, Interception::Drop(Diagnostic::UnhandledInput("insertParagraph".to_string())));
    assert!(Arc::ptr_eq(&before, session.editor.value()));
    assert_eq!(*session.changes.borrow(), 0);
    Ok(())
}

#[test]
fn test_spellcheck_replacement() -> Result<()> {
    let mut session = Session::with_paragraphs(&["teh"], &[0, 0, 3]);
    let text = session.node(&[0, 0])?;
    session.selection.place(session.caret_in(&[0, 0], 3)?);

    let word = DomRange::new(DomPoint::new(text.clone(), 0), DomPoint::new(text.clone(), 3));
    let result = session.before_input(BeforeInput::new("insertReplacementText").with_data("the").with_target_range(word));
    assert!(!result.prevents_default());

    text.set_text("the");
    session.next_frame();
    assert_eq!(session.text(&[0, 0]).as_deref(), Some("the"));
    Ok(())
}

/// Backspace at the end of "abc", then "x", both native, drained together
fn delete_then_type(options: EditorOptions) -> Result<Session> {
    let mut session = Session::with_options(Session::paragraphs(&["abc"], &[0, 0, 3]), options);
    let text = session.node(&[0, 0])?;

    let result = session.before_input(BeforeInput::new("deleteContentBackward"));
    assert!(!result.prevents_default());
    let records = text.delete_text(2, 3).ok_or_else(|| anyhow!("delete failed"))?;
    session.editor.handle_mutations(&records);
    session.selection.place(session.caret_in(&[0, 0], 2)?);

    let result = session.before_input(BeforeInput::new("insertText").with_data("x"));
    assert!(!result.prevents_default());
    session.type_natively("x")?;
    assert_eq!(text.text_content(), "abx");

    session.next_frame();
    Ok(session)
}

#[test]
fn test_native_delete_and_typing_in_one_frame() -> Result<()> {
    let session = delete_then_type(EditorOptions::development())?;

    assert_eq!(session.text(&[0, 0]).as_deref(), Some("abx"));
    assert_eq!(session.editor.value().selection, Some(Selection::collapsed([0, 0, 3])));
    assert!(session.history.borrow().iter().all(|text| text != "abxx"));
    Ok(())
}

#[test]
fn test_native_delete_and_typing_without_verification() -> Result<()> {
    let options = EditorOptions {
        verify_after_typing: false,
        ..EditorOptions::development()
    };
    let session = delete_then_type(options)?;

    assert_eq!(session.text(&[0, 0]).as_deref(), Some("abx"));
    assert_eq!(session.node(&[0, 0])?.text_content(), "abx");
    assert_eq!(session.history.borrow().last().map(String::as_str), Some("abx"));
    Ok(())
}

#[test]
fn test_replacement_then_typing_in_one_frame() -> Result<()> {
    let mut session = Session::with_paragraphs(&["teh"], &[0, 0, 3]);
    let text = session.node(&[0, 0])?;
    session.selection.place(session.caret_in(&[0, 0], 3)?);

    let word = DomRange::new(DomPoint::new(text.clone(), 0), DomPoint::new(text.clone(), 3));
    session.before_input(BeforeInput::new("insertReplacementText").with_data("the").with_target_range(word));
    text.set_text("the");

    session.selection.place(session.caret_in(&[0, 0], 3)?);
    let result = session.before_input(BeforeInput::new("insertText").with_data("!"));
    assert!(!result.prevents_default());
    session.type_natively("!")?;

    session.next_frame();
    assert_eq!(session.text(&[0, 0]).as_deref(), Some("the!"));
    assert_eq!(session.editor.value().selection, Some(Selection::collapsed([0, 0, 4])));
    assert!(session.history.borrow().iter().all(|text| text != "the!!"));
    Ok(())
}

#[test]
fn test_focus_blur_and_selection_sync() -> Result<()> {
    let mut session = Session::with_paragraphs(&["hello"], &[0, 0, 1]);
    let writes = session.selection.writes();

    session.editor.handle_blur();
    session.editor.dispatch(Action::SelectionChange {
        selection: Some(Selection::collapsed([0, 0, 4])),
    });
    session.commit();
    // unfocused editors leave the native selection alone
    assert_eq!(session.selection.writes(), writes);

    session.editor.handle_focus();
    session.commit();
    assert_eq!(session.selection.range(), Some(session.caret_in(&[0, 0], 4)?));
    assert_eq!(*session.changes.borrow(), 3);
    Ok(())
}

#[test]
fn test_controlled_value_feed_back() -> Result<()> {
    let mut session = Session::with_paragraphs(&["old"], &[0, 0, 0]);
    let replacement = Element::new()
        .with_child(Element::new().with_tag("p").with_child("new text"))
        .into_root();

    session
        .editor
        .set_value(Arc::new(Value::new(replacement).with_selection(Selection::collapsed([0, 0, 3])).with_focus(true)));
    session.commit();

    assert_eq!(*session.changes.borrow(), 0);
    assert_eq!(session.node(&[0, 0])?.text_content(), "new text");
    assert_eq!(session.selection.range(), Some(session.caret_in(&[0, 0], 3)?));
    Ok(())
}

#[test]
fn test_remount_rebuilds_registry() -> Result<()> {
    let mut session = Session::with_paragraphs(&["a", "b"], &[0, 0, 0]);
    session.renderer.unmount();
    assert!(session.editor.registry().borrow().is_empty());

    session.editor.reset_registry();
    session.commit();
    assert_eq!(session.node(&[1, 0])?.text_content(), "b");
    Ok(())
}

#[test]
fn test_missing_attributes_are_diagnosed() {
    init_tracing();
    let value = Value::new(Element::new().with_child(Element::new().with_child("x")).into_root());
    let editor: Editor<MemoryNode> =
        Editor::new(value, ManualFrames::new()).with_options(EditorOptions::development());

    let mut renderer = MemoryRenderer::without_attributes(MemoryNode::element("main"));
    let root = renderer.render(&editor.value().element, |path| editor.ref_callback(path));

    let diagnostics = editor.check_rendered(&root);
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.iter().all(|d| matches!(d, Diagnostic::MissingAttributes(_))));
}

#[test]
fn test_action_log_replays_to_same_document() -> Result<()> {
    let element = Element::new().with_child(Element::new().with_child("ho")).into_root();
    let initial = Arc::new(Value::new(element).with_selection(Selection::collapsed([0, 0, 2])));

    let actions = vec![
        Action::Focus,
        Action::InsertText {
            text: "j".to_string(),
            selection: Selection::collapsed([0, 0, 3]),
        },
        Action::DeleteText {
            text: "hj".to_string(),
            selection: Selection::collapsed([0, 0, 1]),
        },
    ];
    let log = serde_json::to_string(&actions)?;
    let replayed: Vec<Action> = serde_json::from_str(&log)?;

    let direct = actions.iter().fold(Arc::clone(&initial), |value, action| reduce(&value, action));
    let from_log = replayed.iter().fold(initial, |value, action| reduce(&value, action));

    assert_eq!(plain_text(&from_log.element), "hj");
    assert_eq!(direct.to_json()?, from_log.to_json()?);
    Ok(())
}

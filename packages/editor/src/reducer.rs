//! # Reducer
//!
//! `reduce(value, action)` is the only state transition of the editor. It is
//! pure: the input is never modified, and when an action would not change
//! anything the *same* `Arc<Value>` comes back. Callers test that with
//! `Arc::ptr_eq` to skip change notifications and DOM resyncs.
//!
//! Actions whose coordinates do not resolve against the current tree are
//! dropped the same way.

use crate::actions::Action;
use folio_model::access::{get_text, resolve_text_point};
use folio_model::normalize::{map_point, normalize};
use folio_model::text::{clamp_offset, utf16_len};
use folio_model::{edit, Element, Path, Selection, Value};
use std::sync::Arc;
use tracing::debug;

/// Apply `action` to `value`
pub fn reduce(value: &Arc<Value>, action: &Action) -> Arc<Value> {
    match action {
        Action::Focus => set_focus(value, true),
        Action::Blur => set_focus(value, false),
        Action::SelectionChange { selection } => select(value, selection.as_ref()),
        Action::InsertText { text, selection } => insert_text(value, text, selection),
        Action::DeleteText { text, selection } => delete_text(value, text, selection),
        Action::InsertReplacementText { text } => replace_under_selection(value, text),
        Action::DeleteContent { selection } => delete_content(value, selection),
        Action::SetText { path, text } => set_text(value, path, text),
    }
}

fn set_focus(value: &Arc<Value>, has_focus: bool) -> Arc<Value> {
    if value.has_focus == has_focus {
        return Arc::clone(value);
    }
    Arc::new(Value {
        element: Arc::clone(&value.element),
        selection: value.selection.clone(),
        has_focus,
    })
}

fn select(value: &Arc<Value>, selection: Option<&Selection>) -> Arc<Value> {
    if value.selection.as_ref() == selection {
        return Arc::clone(value);
    }
    if let Some(selection) = selection {
        if !selection.is_valid(&value.element) {
            debug!(anchor = %selection.anchor, focus = %selection.focus, "dropping unresolvable selection");
            return Arc::clone(value);
        }
    }
    Arc::new(Value {
        element: Arc::clone(&value.element),
        selection: selection.cloned(),
        has_focus: value.has_focus,
    })
}

/// Write first, then select: the caret is only valid once the text exists.
fn insert_text(value: &Arc<Value>, text: &str, selection: &Selection) -> Arc<Value> {
    let (Some(text_path), Some(caret)) = (selection.focus.parent(), selection.focus.last()) else {
        return Arc::clone(value);
    };
    let Some(at) = caret.checked_sub(utf16_len(text)) else {
        debug!(caret, "insertText caret precedes the inserted text");
        return Arc::clone(value);
    };

    let Some(element) = edit::insert_text(&value.element, &text_path, at, text) else {
        debug!(path = %text_path, at, "insertText target does not resolve");
        return Arc::clone(value);
    };
    if !selection.is_valid(&element) {
        return Arc::clone(value);
    }
    commit(value, element, Some(selection.clone()))
}

/// Select first, then write: the selection must resolve against the text as
/// it was before the deletion.
fn delete_text(value: &Arc<Value>, text: &str, selection: &Selection) -> Arc<Value> {
    if !selection.is_valid(&value.element) {
        debug!(anchor = %selection.anchor, focus = %selection.focus, "deleteText selection does not resolve");
        return Arc::clone(value);
    }
    let Some(text_path) = selection.focus.parent() else {
        return Arc::clone(value);
    };
    let Some(element) = edit::replace_text(&value.element, &text_path, text) else {
        return Arc::clone(value);
    };
    let selection = clamp_selection(&element, selection);
    commit(value, element, Some(selection))
}

fn replace_under_selection(value: &Arc<Value>, text: &str) -> Arc<Value> {
    let Some(selection) = &value.selection else {
        debug!("insertReplacementText without a selection");
        return Arc::clone(value);
    };
    let Some(text_path) = selection.focus.parent() else {
        return Arc::clone(value);
    };
    let Some(element) = edit::replace_text(&value.element, &text_path, text) else {
        return Arc::clone(value);
    };
    let selection = clamp_selection(&element, selection);
    commit(value, element, Some(selection))
}

fn delete_content(value: &Arc<Value>, selection: &Selection) -> Arc<Value> {
    if selection.is_collapsed() {
        return Arc::clone(value);
    }
    if !selection.is_valid(&value.element) {
        debug!(anchor = %selection.anchor, focus = %selection.focus, "deleteContent selection does not resolve");
        return Arc::clone(value);
    }
    let range = selection.as_range();
    let element = edit::delete_range(&value.element, &range.start, &range.end);
    commit(value, element, Some(Selection::collapsed(range.start)))
}

fn set_text(value: &Arc<Value>, path: &Path, text: &str) -> Arc<Value> {
    let Some(element) = edit::replace_text(&value.element, path, text) else {
        debug!(path = %path, "setText target is not a text run");
        return Arc::clone(value);
    };
    let selection = value.selection.as_ref().map(|s| clamp_selection(&element, s));
    commit(value, element, selection)
}

/// Normalize the edited tree, carry the selection through any merges, and
/// hand back the old value when neither changed.
fn commit(value: &Arc<Value>, edited: Arc<Element>, selection: Option<Selection>) -> Arc<Value> {
    let element = normalize(&edited);
    let selection = selection.map(|s| Selection {
        anchor: map_point(&edited, &s.anchor),
        focus: map_point(&edited, &s.focus),
    });

    if Arc::ptr_eq(&element, &value.element) && selection == value.selection {
        return Arc::clone(value);
    }

    Arc::new(Value {
        element,
        selection,
        has_focus: value.has_focus,
    })
}

/// Pull offsets that overshoot their run back onto it.
fn clamp_selection(element: &Arc<Element>, selection: &Selection) -> Selection {
    Selection {
        anchor: clamp_point(element, &selection.anchor),
        focus: clamp_point(element, &selection.focus),
    }
}

fn clamp_point(element: &Arc<Element>, point: &Path) -> Path {
    if resolve_text_point(element, point).is_some() {
        return point.clone();
    }
    let (Some(text_path), Some(offset)) = (point.parent(), point.last()) else {
        return point.clone();
    };
    match get_text(element, &text_path) {
        Some(run) => text_path.child(clamp_offset(&run.text, offset)),
        None => point.clone(),
    }
}

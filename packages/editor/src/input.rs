//! # Input interceptor
//!
//! Classifies each `beforeinput` event into one of three outcomes:
//!
//! - [`Interception::Native`]: the browser may apply the edit itself; the model
//!   catches up from the DOM on the next animation frame
//! - [`Interception::Prevent`]: default is prevented and the action is
//!   dispatched to the reducer instead
//! - [`Interception::Drop`]: default is prevented and nothing happens
//!
//! Only a few cases are let through natively: typing at a collapsed caret,
//! spellcheck replacements, and single-character deletions that leave text
//! behind. A deletion that would empty a run is taken over, because engines
//! disagree about the `<br>` they substitute for the emptied node.
//!
//! ## Selection sources
//!
//! Insertions read the caret from `getTargetRanges()[0]`, falling back to the
//! document selection. Deletions judge collapsedness on the document
//! selection and take the span to delete from the target range when present.

use crate::actions::Action;
use crate::after_typing::AfterTyping;
use crate::dom::{DomKind, DomNode, DomPoint, DomRange};
use crate::errors::Diagnostic;
use crate::registry::NodeRegistry;
use crate::translator::{point_to_path, range_to_selection};
use folio_model::access::get_text;
use folio_model::text::{next_boundary, prev_boundary, remove_range};
use folio_model::{Selection, Value};
use std::fmt;
use tracing::debug;

/// `InputEvent.inputType`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    InsertText,
    InsertReplacementText,
    InsertLineBreak,
    InsertParagraph,
    InsertOrderedList,
    InsertUnorderedList,
    InsertHorizontalRule,
    InsertFromYank,
    InsertFromDrop,
    InsertFromPaste,
    InsertFromPasteAsQuotation,
    InsertTranspose,
    InsertCompositionText,
    InsertLink,
    DeleteWordBackward,
    DeleteWordForward,
    DeleteSoftLineBackward,
    DeleteSoftLineForward,
    DeleteEntireSoftLine,
    DeleteHardLineBackward,
    DeleteHardLineForward,
    DeleteByDrag,
    DeleteByCut,
    DeleteContent,
    DeleteContentBackward,
    DeleteContentForward,
    HistoryUndo,
    HistoryRedo,
    /// Any `format*` type, e.g. `formatBold`
    Format(String),
    Unknown(String),
}

impl InputType {
    pub fn parse(input_type: &str) -> Self {
        match input_type {
            "insertText" => InputType::InsertText,
            "insertReplacementText" => InputType::InsertReplacementText,
            "insertLineBreak" => InputType::InsertLineBreak,
            "insertParagraph" => InputType::InsertParagraph,
            "insertOrderedList" => InputType::InsertOrderedList,
            "insertUnorderedList" => InputType::InsertUnorderedList,
            "insertHorizontalRule" => InputType::InsertHorizontalRule,
            "insertFromYank" => InputType::InsertFromYank,
            "insertFromDrop" => InputType::InsertFromDrop,
            "insertFromPaste" => InputType::InsertFromPaste,
            "insertFromPasteAsQuotation" => InputType::InsertFromPasteAsQuotation,
            "insertTranspose" => InputType::InsertTranspose,
            "insertCompositionText" => InputType::InsertCompositionText,
            "insertLink" => InputType::InsertLink,
            "deleteWordBackward" => InputType::DeleteWordBackward,
            "deleteWordForward" => InputType::DeleteWordForward,
            "deleteSoftLineBackward" => InputType::DeleteSoftLineBackward,
            "deleteSoftLineForward" => InputType::DeleteSoftLineForward,
            "deleteEntireSoftLine" => InputType::DeleteEntireSoftLine,
            "deleteHardLineBackward" => InputType::DeleteHardLineBackward,
            "deleteHardLineForward" => InputType::DeleteHardLineForward,
            "deleteByDrag" => InputType::DeleteByDrag,
            "deleteByCut" => InputType::DeleteByCut,
            "deleteContent" => InputType::DeleteContent,
            "deleteContentBackward" => InputType::DeleteContentBackward,
            "deleteContentForward" => InputType::DeleteContentForward,
            "historyUndo" => InputType::HistoryUndo,
            "historyRedo" => InputType::HistoryRedo,
            other if other.starts_with("format") => InputType::Format(other.to_string()),
            other => InputType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InputType::InsertText => "insertText",
            InputType::InsertReplacementText => "insertReplacementText",
            InputType::InsertLineBreak => "insertLineBreak",
            InputType::InsertParagraph => "insertParagraph",
            InputType::InsertOrderedList => "insertOrderedList",
            InputType::InsertUnorderedList => "insertUnorderedList",
            InputType::InsertHorizontalRule => "insertHorizontalRule",
            InputType::InsertFromYank => "insertFromYank",
            InputType::InsertFromDrop => "insertFromDrop",
            InputType::InsertFromPaste => "insertFromPaste",
            InputType::InsertFromPasteAsQuotation => "insertFromPasteAsQuotation",
            InputType::InsertTranspose => "insertTranspose",
            InputType::InsertCompositionText => "insertCompositionText",
            InputType::InsertLink => "insertLink",
            InputType::DeleteWordBackward => "deleteWordBackward",
            InputType::DeleteWordForward => "deleteWordForward",
            InputType::DeleteSoftLineBackward => "deleteSoftLineBackward",
            InputType::DeleteSoftLineForward => "deleteSoftLineForward",
            InputType::DeleteEntireSoftLine => "deleteEntireSoftLine",
            InputType::DeleteHardLineBackward => "deleteHardLineBackward",
            InputType::DeleteHardLineForward => "deleteHardLineForward",
            InputType::DeleteByDrag => "deleteByDrag",
            InputType::DeleteByCut => "deleteByCut",
            InputType::DeleteContent => "deleteContent",
            InputType::DeleteContentBackward => "deleteContentBackward",
            InputType::DeleteContentForward => "deleteContentForward",
            InputType::HistoryUndo => "historyUndo",
            InputType::HistoryRedo => "historyRedo",
            InputType::Format(name) | InputType::Unknown(name) => name,
        }
    }

    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            InputType::DeleteWordBackward
                | InputType::DeleteWordForward
                | InputType::DeleteSoftLineBackward
                | InputType::DeleteSoftLineForward
                | InputType::DeleteEntireSoftLine
                | InputType::DeleteHardLineBackward
                | InputType::DeleteHardLineForward
                | InputType::DeleteByDrag
                | InputType::DeleteByCut
                | InputType::DeleteContent
                | InputType::DeleteContentBackward
                | InputType::DeleteContentForward
        )
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parts of an `InputEvent` the interceptor reads
#[derive(Debug, Clone)]
pub struct BeforeInput<N> {
    pub input_type: InputType,
    pub data: Option<String>,
    pub target_ranges: Vec<DomRange<N>>,
}

impl<N> BeforeInput<N> {
    pub fn new(input_type: &str) -> Self {
        Self {
            input_type: InputType::parse(input_type),
            data: None,
            target_ranges: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_target_range(mut self, range: DomRange<N>) -> Self {
        self.target_ranges.push(range);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    Native(AfterTyping),
    Prevent(Action),
    Drop(Diagnostic),
}

impl Interception {
    pub fn prevents_default(&self) -> bool {
        !matches!(self, Interception::Native(_))
    }
}

/// Classify one `beforeinput` event.
///
/// `native` is the document selection at the time of the event.
pub fn intercept<N: DomNode>(
    event: &BeforeInput<N>,
    native: Option<&DomRange<N>>,
    registry: &NodeRegistry<N>,
    value: &Value,
) -> Interception {
    let interception = match &event.input_type {
        InputType::InsertText => intercept_insert(event, native, registry, value),
        InputType::InsertReplacementText => intercept_replacement(event, native, registry),
        input_type if input_type.is_deletion() => intercept_delete(event, native, registry, value),
        other => Interception::Drop(Diagnostic::UnhandledInput(other.to_string())),
    };
    debug!(input_type = %event.input_type, prevent = interception.prevents_default(), "beforeinput classified");
    interception
}

fn intercept_insert<N: DomNode>(
    event: &BeforeInput<N>,
    native: Option<&DomRange<N>>,
    registry: &NodeRegistry<N>,
    value: &Value,
) -> Interception {
    let Some(range) = event.target_ranges.first().or(native) else {
        return Interception::Drop(Diagnostic::UnresolvableCoordinate("no caret for insertText".to_string()));
    };
    if !range.is_collapsed() {
        return Interception::Drop(Diagnostic::RangeInput(event.input_type.to_string()));
    }
    let Some(point) = point_to_path(registry, &range.focus) else {
        return Interception::Drop(unresolvable(&range.focus));
    };
    // offsets are checked by the reducer once earlier continuations have run
    let Some(text_path) = point.parent().filter(|path| get_text(&value.element, path).is_some()) else {
        return Interception::Drop(Diagnostic::InvalidSelection);
    };
    let Some(data) = event.data.clone().filter(|data| !data.is_empty()) else {
        return Interception::Drop(Diagnostic::UnhandledInput("insertText without data".to_string()));
    };

    Interception::Native(AfterTyping::InsertText {
        data,
        caret: Selection::collapsed(point),
        text_path,
    })
}

fn intercept_replacement<N: DomNode>(
    event: &BeforeInput<N>,
    native: Option<&DomRange<N>>,
    registry: &NodeRegistry<N>,
) -> Interception {
    let Some(range) = event.target_ranges.first().or(native) else {
        return Interception::Drop(Diagnostic::UnresolvableCoordinate(
            "no range for insertReplacementText".to_string(),
        ));
    };
    match point_to_path(registry, &range.focus).and_then(|point| point.parent()) {
        Some(text_path) => Interception::Native(AfterTyping::ReplacementText { text_path }),
        None => Interception::Drop(unresolvable(&range.focus)),
    }
}

fn intercept_delete<N: DomNode>(
    event: &BeforeInput<N>,
    native: Option<&DomRange<N>>,
    registry: &NodeRegistry<N>,
    value: &Value,
) -> Interception {
    let target = event.target_ranges.first();
    let Some(caret) = native.or(target) else {
        return Interception::Drop(Diagnostic::UnresolvableCoordinate(format!(
            "no selection for {}",
            event.input_type
        )));
    };

    if caret.is_collapsed()
        && matches!(
            event.input_type,
            InputType::DeleteContentBackward | InputType::DeleteContentForward
        )
    {
        if let Some(interception) = delete_within_run(event, &caret.focus, registry, value) {
            return interception;
        }
    }

    let span = target.unwrap_or(caret);
    match range_to_selection(registry, span) {
        Some(selection) if !selection.is_collapsed() => Interception::Prevent(Action::DeleteContent { selection }),
        Some(_) => Interception::Drop(Diagnostic::UnresolvableCoordinate(format!(
            "{} has nothing to delete",
            event.input_type
        ))),
        None => Interception::Drop(unresolvable(&span.focus)),
    }
}

/// A single-character deletion inside one text node. `None` when the caret is
/// not in a text node or the deletion would cross the node's edge.
fn delete_within_run<N: DomNode>(
    event: &BeforeInput<N>,
    caret: &DomPoint<N>,
    registry: &NodeRegistry<N>,
    value: &Value,
) -> Option<Interception> {
    if caret.node.kind() != DomKind::Text {
        return None;
    }
    let text_path = registry.by_node(&caret.node)?.clone();
    let content = caret.node.text_content();

    let (from, to) = match event.target_ranges.first() {
        Some(target) if target.anchor.node == caret.node && target.focus.node == caret.node => (
            target.anchor.offset.min(target.focus.offset),
            target.anchor.offset.max(target.focus.offset),
        ),
        _ if event.input_type == InputType::DeleteContentBackward => {
            (prev_boundary(&content, caret.offset), caret.offset)
        }
        _ => (caret.offset, next_boundary(&content, caret.offset)),
    };
    if from >= to {
        return None;
    }

    if get_text(&value.element, &text_path).is_none() {
        return Some(Interception::Drop(Diagnostic::InvalidSelection));
    }

    if remove_range(&content, from, to).is_empty() {
        return Some(Interception::Prevent(Action::DeleteText {
            text: String::new(),
            selection: Selection::collapsed(text_path.child(0)),
        }));
    }

    Some(Interception::Native(AfterTyping::Resync {
        caret: Selection::collapsed(text_path.child(from)),
        text_path,
    }))
}

fn unresolvable<N: DomNode>(point: &DomPoint<N>) -> Diagnostic {
    Diagnostic::UnresolvableCoordinate(format!("{:?} at {}", point.node.kind(), point.offset))
}

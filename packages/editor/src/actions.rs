//! # Actions
//!
//! Every change to the editor state is an [`Action`] run through the reducer.
//!
//! ## Action Semantics
//!
//! ### InsertText
//! - `selection` is the caret *after* the insertion
//! - `text` lands in the run owning `selection.focus`, ending at the caret
//! - Text is written first, then the selection is applied
//!
//! ### DeleteText
//! - `text` is the run's complete content after the deletion
//! - The selection is applied first (it must resolve against the text as it
//!   was before the deletion), then the text is written
//!
//! ### InsertReplacementText
//! - Replaces the run under the current selection wholesale
//!
//! ### SetText
//! - The run at `path` takes the content the DOM reports for it

use folio_model::{Path, Selection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Focus,

    Blur,

    SelectionChange {
        selection: Option<Selection>,
    },

    InsertText {
        text: String,
        selection: Selection,
    },

    DeleteText {
        text: String,
        selection: Selection,
    },

    InsertReplacementText {
        text: String,
    },

    /// Delete everything the selection covers
    DeleteContent {
        selection: Selection,
    },

    /// Resynchronize one run from the DOM
    SetText {
        path: Path,
        text: String,
    },
}

impl Action {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::Focus => "focus",
            Action::Blur => "blur",
            Action::SelectionChange { .. } => "selectionChange",
            Action::InsertText { .. } => "insertText",
            Action::DeleteText { .. } => "deleteText",
            Action::InsertReplacementText { .. } => "insertReplacementText",
            Action::DeleteContent { .. } => "deleteContent",
            Action::SetText { .. } => "setText",
        }
    }
}

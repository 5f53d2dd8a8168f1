//! The externally observed document state.

use crate::errors::ModelError;
use crate::normalize::normalize;
use crate::selection::Selection;
use crate::tree::Element;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Root element, optional selection and focus flag.
///
/// Values are immutable once built; every change produces a new `Arc<Value>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    pub element: Arc<Element>,
    #[serde(default)]
    pub selection: Option<Selection>,
    #[serde(default)]
    pub has_focus: bool,
}

impl Value {
    pub fn new(element: Arc<Element>) -> Self {
        Self {
            element,
            selection: None,
            has_focus: false,
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_focus(mut self, has_focus: bool) -> Self {
        self.has_focus = has_focus;
        self
    }

    /// Parse a value and check that its selection resolves.
    ///
    /// The tree is normalized; a selection that stops resolving because of
    /// that is rejected like any other.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let mut value: Value = serde_json::from_str(json)?;
        value.element = normalize(&value.element);
        if let Some(selection) = &value.selection {
            if !selection.is_valid(&value.element) {
                return Err(ModelError::InvalidSelection(format!(
                    "anchor {} focus {}",
                    selection.anchor, selection.focus
                )));
            }
        }
        Ok(value)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }
}

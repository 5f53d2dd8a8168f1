use crate::errors::EditorError;
use serde::{Deserialize, Serialize};

/// Editor behavior switches, readable from the JS side as camelCase JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorOptions {
    /// Check the normalization and rendered-attribute invariants, warning on
    /// violations. On by default in debug builds.
    pub development_checks: bool,

    /// After afterTyping continuations run, compare each touched run's DOM
    /// text with the model and resync from the DOM when they differ
    pub verify_after_typing: bool,

    /// Withhold text actions derived from mutation batches while afterTyping
    /// continuations are pending
    pub suppress_mutations_while_typing: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            development_checks: cfg!(debug_assertions),
            verify_after_typing: true,
            suppress_mutations_while_typing: true,
        }
    }
}

impl EditorOptions {
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults with development checks on
    pub fn development() -> Self {
        Self {
            development_checks: true,
            ..Default::default()
        }
    }
}

//! Error types for the editor

use folio_model::{ModelError, Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid options: {0}")]
    Options(#[from] serde_json::Error),
}

/// Something the sync layer could not apply.
///
/// Diagnostics are logged and handed back to the caller. They never escape an
/// event handler as a failure: the triggering event is dropped instead, which
/// keeps the DOM and the model from diverging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("DOM coordinate has no tree path ({0})")]
    UnresolvableCoordinate(String),

    #[error("Selection does not resolve against the document")]
    InvalidSelection,

    #[error("Unhandled input type: {0}")]
    UnhandledInput(String),

    #[error("{0} over a non-collapsed selection")]
    RangeInput(String),

    #[error("Unrecognized mutation batch: {0}")]
    UnrecognizedMutation(String),

    #[error("Rendered element at {0} carries no attributes")]
    MissingAttributes(String),

    #[error("Document is not normalized")]
    NotNormalized,

    #[error("DOM text at {path} diverged from the model")]
    TextMismatch { path: Path },
}

impl Diagnostic {
    /// An input or mutation shape the sync layer does not handle, as opposed
    /// to a coordinate or selection that failed to resolve
    pub fn is_unrecognized(&self) -> bool {
        matches!(
            self,
            Diagnostic::UnhandledInput(_) | Diagnostic::RangeInput(_) | Diagnostic::UnrecognizedMutation(_)
        )
    }
}

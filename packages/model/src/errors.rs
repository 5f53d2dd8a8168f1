//! Error types for the model

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Selection does not resolve against the document: {0}")]
    InvalidSelection(String),
}

//! Error types for comptalance

use thiserror::Error;

/// Result type alias using [`ComptaError`]
pub type Result<T> = std::result::Result<T, ComptaError>;

/// Failures a caller sees when loading, merging or exporting workbooks.
///
/// Per-attribute copy problems inside a sheet copy are not part of this
/// enum; they are logged and skipped (see [`crate::merge::AttributeCopyFailure`]).
#[derive(Debug, Error)]
pub enum ComptaError {
    /// The bytes are not a readable workbook
    #[error("Failed to load workbook: {0}")]
    Load(String),

    /// The template could not receive the balance sheets
    #[error("Merge failed: {0}")]
    Merge(String),

    /// The merged workbook could not be written out
    #[error("Failed to serialize workbook: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComptaError {
    pub(crate) fn merge<S: Into<String>>(msg: S) -> Self {
        ComptaError::Merge(msg.into())
    }
}

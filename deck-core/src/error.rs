//! Error types for deck operations.

use thiserror::Error;

/// Result type for deck operations.
pub type DeckResult<T> = Result<T, DeckError>;

/// Errors that can occur in deck operations.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Layer not found on the addressed slide.
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    /// Slide index out of range.
    #[error("Slide not found at index {index} (slide_count={count})")]
    SlideNotFound {
        /// Requested index.
        index: usize,
        /// Number of slides in the presentation.
        count: usize,
    },

    /// Layer variant tag not recognised.
    #[error("Unknown layer type: {0}")]
    UnknownLayerType(String),

    /// Invalid operation on the document.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A content producer (text, image or frame source) failed.
    #[error("Content producer failed: {0}")]
    Producer(String),
}

//! Renderer error types.

use thiserror::Error;

use deck_core::{DeckError, ExportFormat};

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering and export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The whole export failed; no artifact is delivered.
    #[error("Export failed: {0}")]
    Export(String),

    /// The same backend is already running.
    #[error("{0:?} export already in flight")]
    ExportInFlight(ExportFormat),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Fixed-page document encoding failed.
    #[cfg(feature = "export")]
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Slide-deck package encoding failed.
    #[cfg(feature = "export")]
    #[error("Package encoding failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Artifact could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document model error.
    #[error(transparent)]
    Core(#[from] DeckError),
}

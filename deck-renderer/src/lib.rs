//! # Saorsa Deck Renderer
//!
//! Live surface compositor and the three export backends.
//!
//! ## Export Backends
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               ExportManager                 │
//! ├─────────────┬─────────────┬─────────────────┤
//! │ Raster      │ Document    │ Slide deck      │
//! │ Surface→PNG │ Deck→PDF    │ Deck→PPTX       │
//! │ (pixels)    │ (points)    │ (percent→EMU)   │
//! └─────────────┴─────────────┴─────────────────┘
//! ```
//!
//! The raster backend captures whatever the [`Surface`] currently shows. The
//! document and deck backends walk the persisted presentation and never see
//! an in-progress gesture preview.
//!
//! ## Features
//!
//! - `export` (default): the three backends, the export manager and the
//!   artifact sinks. Without it the crate is the surface compositor only.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod compositor;
pub mod error;
#[cfg(feature = "export")]
pub mod export;
pub mod image;
mod markup;
pub mod metrics;

pub use color::Rgba;
pub use compositor::{Surface, SurfaceNode, Visual};
pub use error::{RenderError, RenderResult};
#[cfg(feature = "export")]
pub use export::{
    render_pdf, render_png, render_pptx, ArtifactSink, ExportArtifact, ExportConfig,
    ExportManager, FileSink, MemorySink, Orientation, PageFormat,
};

/// Renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Presentation export.
//!
//! Three independent backends share one traversal:
//!
//! ```text
//! Presentation ─► traverse ─► LayerConverter ─┬─► DocumentWriter (PDF, points)
//!                 slides in order             └─► DeckWriter     (PPTX, EMU)
//!                 layers in paint order
//!
//! Surface ─► to_svg ─► raster::render_png (PNG, device pixels)
//! ```
//!
//! Each backend re-derives absolute geometry from the normalized layer
//! fields; nothing is shared between passes. [`ExportManager`] wraps the
//! backends with the per-backend in-flight guard and artifact hand-off.

pub mod deck;
pub mod document;
pub mod manager;
mod package;
pub mod raster;

use serde::{Deserialize, Serialize};

use deck_core::{
    denormalize, AbsoluteRect, BoundingBox, ExportFormat, ImageLayer, Layer, LayerKind,
    Presentation, ShapeLayer, Slide, TextLayer,
};

use crate::error::{RenderError, RenderResult};
pub(crate) use crate::markup::escape_xml;

pub use deck::{render_pptx, DeckWriter};
pub use document::{render_pdf, DocumentWriter};
pub use manager::{ArtifactSink, ExportManager, FileSink, MemorySink};
pub use raster::render_png;

/// Standard page sizes for the fixed-page document, in points (portrait).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    /// ISO A4, 210 × 297 mm.
    #[default]
    A4,
    /// US Letter, 8.5 × 11 in.
    Letter,
}

impl PageFormat {
    /// Portrait width and height in points.
    #[must_use]
    pub fn portrait_size(self) -> (f32, f32) {
        match self {
            Self::A4 => (595.28, 841.89),
            Self::Letter => (612.0, 792.0),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Wider than tall.
    #[default]
    Landscape,
    /// Taller than wide.
    Portrait,
}

/// Export configuration.
///
/// Deserializes from a partial JSON object; missing fields keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    /// Output pixels per surface pixel for raster capture.
    pub pixel_ratio: f32,
    /// Fixed-page document paper size.
    pub page_format: PageFormat,
    /// Fixed-page document orientation.
    pub orientation: Orientation,
    /// Load system fonts before rasterizing.
    pub load_system_fonts: bool,
    /// Live surface width in pixels used when composing for capture.
    pub surface_width: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            page_format: PageFormat::A4,
            orientation: Orientation::Landscape,
            load_system_fonts: true,
            surface_width: 960.0,
        }
    }
}

impl ExportConfig {
    /// Page box in points for the configured format and orientation.
    #[must_use]
    pub fn page_bounds(&self) -> BoundingBox {
        let (short, long) = self.page_format.portrait_size();
        match self.orientation {
            Orientation::Landscape => BoundingBox::new(long, short),
            Orientation::Portrait => BoundingBox::new(short, long),
        }
    }
}

/// A finished export ready to hand to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Suggested file name including extension.
    pub file_name: String,
    /// Backend that produced it.
    pub format: ExportFormat,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }
}

/// Per-variant conversion into one backend's output.
///
/// [`traverse`] calls `begin_slide`, then one variant method per layer in
/// paint order, then `end_slide`, for every slide in document order, and
/// finally `finish`. Rectangles are already in the units of [`bounds`].
///
/// [`bounds`]: LayerConverter::bounds
pub trait LayerConverter {
    /// Finished output.
    type Output;

    /// Slide box in this backend's absolute unit.
    fn bounds(&self) -> BoundingBox;

    /// Start a new page or slide.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot continue.
    fn begin_slide(&mut self, index: usize, slide: &Slide) -> RenderResult<()>;

    /// Convert a text layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot continue.
    fn text(&mut self, layer: &Layer, text: &TextLayer, rect: AbsoluteRect) -> RenderResult<()>;

    /// Convert an image layer. Per-layer failures are recovered here.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot continue.
    fn image(&mut self, layer: &Layer, image: &ImageLayer, rect: AbsoluteRect)
        -> RenderResult<()>;

    /// Convert a shape layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot continue.
    fn shape(&mut self, layer: &Layer, shape: &ShapeLayer, rect: AbsoluteRect)
        -> RenderResult<()>;

    /// Close the current page or slide.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot continue.
    fn end_slide(&mut self) -> RenderResult<()>;

    /// Assemble the output.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    fn finish(self) -> RenderResult<Self::Output>;
}

/// Drive `converter` over every slide and layer of `presentation`.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if the converter's box has no area, or the
/// first error a converter reports.
pub fn traverse<C: LayerConverter>(
    presentation: &Presentation,
    mut converter: C,
) -> RenderResult<C::Output> {
    let bounds = converter.bounds();
    if !bounds.is_measurable() {
        return Err(RenderError::Export(format!(
            "Target box {}x{} has no area",
            bounds.width, bounds.height
        )));
    }

    for (index, slide) in presentation.slides.iter().enumerate() {
        converter.begin_slide(index, slide)?;
        for layer in slide.paint_order() {
            let Some(rect) = denormalize(layer.geometry(), bounds) else {
                continue;
            };
            match &layer.kind {
                LayerKind::Text(text) => converter.text(layer, text, rect)?,
                LayerKind::Image(image) => converter.image(layer, image, rect)?,
                LayerKind::Shape(shape) => converter.shape(layer, shape, rect)?,
            }
        }
        converter.end_slide()?;
    }

    converter.finish()
}

//! Raster snapshot of a live surface.
//!
//! The surface's SVG markup is parsed with usvg and rasterized by resvg onto
//! a tiny-skia pixmap, so the output matches the editing surface exactly,
//! rotation and object-fit included.

use crate::compositor::Surface;
use crate::error::{RenderError, RenderResult};

use super::ExportConfig;

/// Rasterize `surface` to PNG bytes at the configured pixel ratio.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if the surface has no area or the markup
/// cannot be parsed or encoded.
pub fn render_png(surface: &Surface, config: &ExportConfig) -> RenderResult<Vec<u8>> {
    let bounds = surface.bounds();
    if !bounds.is_measurable() {
        return Err(RenderError::Export(
            "Surface has not been measured".to_string(),
        ));
    }

    let svg = surface.to_svg(config.pixel_ratio);
    let pixmap = rasterize_svg(&svg, config.load_system_fonts)?;
    tracing::debug!(
        width = pixmap.width(),
        height = pixmap.height(),
        "Surface rasterized"
    );

    pixmap
        .encode_png()
        .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rasterize_svg(svg: &str, load_system_fonts: bool) -> RenderResult<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    if load_system_fonts {
        opt.fontdb_mut().load_system_fonts();
    }
    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

    let px_w = tree.size().width().ceil() as u32;
    let px_h = tree.size().height().ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
        .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    Ok(pixmap)
}

//! Live surface compositor.
//!
//! A [`Surface`] is one slide mounted at a concrete pixel size: every layer
//! becomes a [`SurfaceNode`] holding its absolute box and a per-variant
//! visual style, in paint order. The surface renders to SVG markup, which is
//! both the editing preview and the node the raster exporter captures.
//!
//! Gesture feedback goes through [`Surface::apply_preview`], which moves a
//! node on screen without touching the document.

use std::fmt::Write;

use deck_core::{
    denormalize, AbsoluteRect, Background, BoundingBox, ImageFilters, LayerId, LayerKind,
    MountedNode, MountedNodes, ObjectFit, PreviewTransform, ShapeKind, Slide, TextAlign,
};

use crate::markup::escape_xml;
use crate::image::resolve_source;
use crate::metrics::{wrap_lines, DEFAULT_LINE_HEIGHT};

/// Fill used where an image cannot be shown.
const PLACEHOLDER_FILL: &str = "#cccccc";

/// Text style of a mounted text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextVisual {
    /// Text content.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Font family stack.
    pub font_family: String,
    /// CSS colour.
    pub color: String,
    /// Alignment.
    pub align: TextAlign,
    /// Bold weight.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
    /// Underline decoration.
    pub underline: bool,
    /// Extra spacing between characters, in pixels.
    pub letter_spacing: f32,
    /// Line height multiple.
    pub line_height: f32,
}

/// Image style of a mounted image layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageVisual {
    /// Resolved data URI, or `None` when the source could not be resolved.
    pub href: Option<String>,
    /// Fit mode.
    pub object_fit: ObjectFit,
    /// Colour filters, if any differ from identity.
    pub filters: Option<ImageFilters>,
}

/// Shape style of a mounted shape layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeVisual {
    /// Shape kind.
    pub kind: ShapeKind,
    /// CSS fill colour.
    pub fill: String,
    /// CSS stroke colour.
    pub stroke: String,
    /// Stroke width in pixels.
    pub stroke_width: f32,
}

/// Per-variant visual mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    /// Text block.
    Text(TextVisual),
    /// Image.
    Image(ImageVisual),
    /// Shape.
    Shape(ShapeVisual),
}

impl Visual {
    fn from_kind(kind: &LayerKind) -> Self {
        match kind {
            LayerKind::Text(text) => Self::Text(TextVisual {
                content: text.content.clone(),
                font_size: text.font_size,
                font_family: text.font_family.clone(),
                color: text.color.clone(),
                align: text.text_align,
                bold: text.bold.unwrap_or(false),
                italic: text.italic.unwrap_or(false),
                underline: text.underline.unwrap_or(false),
                letter_spacing: text.letter_spacing.unwrap_or(0.0),
                line_height: text.line_height.unwrap_or(DEFAULT_LINE_HEIGHT),
            }),
            LayerKind::Image(image) => {
                let href = match resolve_source(&image.src) {
                    Ok(bytes) => Some(bytes.to_data_uri()),
                    Err(e) => {
                        tracing::debug!("Image source not shown on surface: {e}");
                        None
                    }
                };
                Self::Image(ImageVisual {
                    href,
                    object_fit: image.object_fit,
                    filters: image.filters.filter(|f| !f.is_identity()),
                })
            }
            LayerKind::Shape(shape) => Self::Shape(ShapeVisual {
                kind: shape.shape_type,
                fill: shape.fill_color.clone(),
                stroke: shape.stroke_color.clone(),
                stroke_width: shape.stroke_width,
            }),
        }
    }
}

/// One layer mounted on a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceNode {
    /// Layer id.
    pub id: LayerId,
    /// Absolute box in surface pixels.
    pub rect: AbsoluteRect,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Opacity.
    pub opacity: f32,
    /// Visual style.
    pub visual: Visual,
    preview: Option<PreviewTransform>,
}

impl SurfaceNode {
    /// Box and rotation as currently shown, including any gesture preview.
    #[must_use]
    pub fn displayed(&self) -> (AbsoluteRect, f32) {
        self.preview
            .map_or((self.rect, self.rotation), |p| (p.rect, p.rotation))
    }
}

/// A slide mounted at a concrete size.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    bounds: BoundingBox,
    background: Background,
    nodes: Vec<SurfaceNode>,
}

impl Surface {
    /// Mount `slide` into a box of `bounds` pixels.
    ///
    /// While the box is not measurable nothing is mounted.
    #[must_use]
    pub fn compose(slide: &Slide, bounds: BoundingBox) -> Self {
        let mut nodes = Vec::with_capacity(slide.layers.len());
        if bounds.is_measurable() {
            for layer in slide.paint_order() {
                let Some(rect) = denormalize(layer.geometry(), bounds) else {
                    continue;
                };
                nodes.push(SurfaceNode {
                    id: layer.id.clone(),
                    rect,
                    rotation: layer.rotation,
                    opacity: layer.opacity,
                    visual: Visual::from_kind(&layer.kind),
                    preview: None,
                });
            }
        } else {
            tracing::debug!("Surface not measured yet, skipping layout");
        }

        tracing::trace!(slide = %slide.id, nodes = nodes.len(), "Surface composed");
        Self {
            bounds,
            background: slide.background.clone(),
            nodes,
        }
    }

    /// Surface size in pixels.
    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Mounted nodes in paint order.
    #[must_use]
    pub fn nodes(&self) -> &[SurfaceNode] {
        &self.nodes
    }

    /// Find a mounted node.
    #[must_use]
    pub fn node(&self, id: &LayerId) -> Option<&SurfaceNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Show a gesture preview on a node. Returns `false` if it is not mounted.
    pub fn apply_preview(&mut self, id: &LayerId, preview: PreviewTransform) -> bool {
        match self.nodes.iter_mut().find(|n| &n.id == id) {
            Some(node) => {
                node.preview = Some(preview);
                true
            }
            None => false,
        }
    }

    /// Drop all gesture previews.
    pub fn clear_previews(&mut self) {
        for node in &mut self.nodes {
            node.preview = None;
        }
    }

    /// Render to SVG markup at `pixel_ratio` output pixels per surface pixel.
    #[must_use]
    pub fn to_svg(&self, pixel_ratio: f32) -> String {
        let (view_w, view_h) = (self.bounds.width.max(1.0), self.bounds.height.max(1.0));
        let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        let out_w = (view_w * ratio).round();
        let out_h = (view_h * ratio).round();

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
        );
        self.render_background(&mut svg, view_w, view_h);

        for (index, node) in self.nodes.iter().enumerate() {
            render_node(&mut svg, index, node);
        }

        svg.push_str("</svg>");
        svg
    }

    fn render_background(&self, svg: &mut String, width: f32, height: f32) {
        match &self.background {
            Background::Color(color) => {
                let _ = write!(
                    svg,
                    "<rect width=\"{width}\" height=\"{height}\" fill=\"{}\"/>",
                    escape_xml(color),
                );
            }
            Background::Image(src) => {
                let _ = write!(
                    svg,
                    "<rect width=\"{width}\" height=\"{height}\" fill=\"#ffffff\"/>"
                );
                if let Ok(bytes) = resolve_source(src) {
                    let _ = write!(
                        svg,
                        "<image width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"xMidYMid slice\" href=\"{}\"/>",
                        bytes.to_data_uri(),
                    );
                }
            }
        }
    }
}

impl MountedNodes for Surface {
    fn mounted(&self, id: &LayerId) -> Option<MountedNode> {
        self.node(id).map(|node| MountedNode {
            rect: node.rect,
            rotation: node.rotation,
        })
    }

    fn bounds(&self) -> BoundingBox {
        Surface::bounds(self)
    }
}

fn render_node(svg: &mut String, index: usize, node: &SurfaceNode) {
    let (rect, rotation) = node.displayed();
    let (w, h) = (rect.width, rect.height);
    let _ = write!(
        svg,
        "<g id=\"{}\" transform=\"translate({} {}) rotate({rotation} {} {})\" opacity=\"{}\">",
        escape_xml(node.id.as_str()),
        rect.left,
        rect.top,
        w / 2.0,
        h / 2.0,
        node.opacity.clamp(0.0, 1.0),
    );

    match &node.visual {
        Visual::Text(text) => render_text(svg, text, w, h),
        Visual::Image(image) => render_image(svg, index, image, w, h),
        Visual::Shape(shape) => render_shape(svg, shape, w, h),
    }

    svg.push_str("</g>");
}

#[allow(clippy::cast_precision_loss)]
fn render_text(svg: &mut String, text: &TextVisual, w: f32, h: f32) {
    let (x, anchor) = match text.align {
        TextAlign::Left | TextAlign::Justify => (0.0, "start"),
        TextAlign::Center => (w / 2.0, "middle"),
        TextAlign::Right => (w, "end"),
    };
    let lines = wrap_lines(&text.content, text.font_size, w);
    let line_h = text.font_size * text.line_height;
    let block_top = (h - line_h * lines.len() as f32) / 2.0;

    let _ = write!(
        svg,
        "<text font-size=\"{}\" font-family=\"{}, sans-serif\" fill=\"{}\" text-anchor=\"{anchor}\" dominant-baseline=\"central\"",
        text.font_size,
        escape_xml(&text.font_family),
        escape_xml(&text.color),
    );
    if text.bold {
        svg.push_str(" font-weight=\"bold\"");
    }
    if text.italic {
        svg.push_str(" font-style=\"italic\"");
    }
    if text.underline {
        svg.push_str(" text-decoration=\"underline\"");
    }
    if text.letter_spacing.abs() > f32::EPSILON {
        let _ = write!(svg, " letter-spacing=\"{}\"", text.letter_spacing);
    }
    svg.push('>');

    for (i, line) in lines.iter().enumerate() {
        let y = block_top + line_h * (i as f32 + 0.5);
        let _ = write!(
            svg,
            "<tspan x=\"{x}\" y=\"{y}\">{}</tspan>",
            escape_xml(line)
        );
    }
    svg.push_str("</text>");
}

fn render_image(svg: &mut String, index: usize, image: &ImageVisual, w: f32, h: f32) {
    let Some(href) = &image.href else {
        let _ = write!(
            svg,
            "<rect width=\"{w}\" height=\"{h}\" fill=\"{PLACEHOLDER_FILL}\"/><text x=\"{}\" y=\"{}\" font-size=\"14\" font-family=\"sans-serif\" text-anchor=\"middle\" dominant-baseline=\"central\">Image Layer</text>",
            w / 2.0,
            h / 2.0,
        );
        return;
    };

    let aspect = match image.object_fit {
        ObjectFit::Cover => "xMidYMid slice",
        ObjectFit::Fill => "none",
        ObjectFit::Contain | ObjectFit::None | ObjectFit::ScaleDown => "xMidYMid meet",
    };

    let filter_ref = image.filters.map(|filters| {
        let id = format!("filter-{index}");
        write_filter(svg, &id, &filters);
        format!(" filter=\"url(#{id})\"")
    });

    let _ = write!(
        svg,
        "<image width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"{aspect}\" href=\"{href}\"{}/>",
        filter_ref.unwrap_or_default(),
    );
}

/// CSS filter functions in `brightness contrast saturate grayscale sepia` order.
fn write_filter(svg: &mut String, id: &str, f: &ImageFilters) {
    let _ = write!(
        svg,
        "<defs><filter id=\"{id}\" color-interpolation-filters=\"sRGB\">"
    );
    let linear = |svg: &mut String, slope: f32, intercept: f32| {
        svg.push_str("<feComponentTransfer>");
        for channel in ["R", "G", "B"] {
            let _ = write!(
                svg,
                "<feFunc{channel} type=\"linear\" slope=\"{slope}\" intercept=\"{intercept}\"/>"
            );
        }
        svg.push_str("</feComponentTransfer>");
    };
    if (f.brightness - 1.0).abs() > f32::EPSILON {
        linear(svg, f.brightness, 0.0);
    }
    if (f.contrast - 1.0).abs() > f32::EPSILON {
        linear(svg, f.contrast, 0.5 - 0.5 * f.contrast);
    }
    if (f.saturate - 1.0).abs() > f32::EPSILON {
        let _ = write!(svg, "<feColorMatrix type=\"saturate\" values=\"{}\"/>", f.saturate);
    }
    if f.grayscale > 0.0 {
        let amount = 1.0 - f.grayscale.clamp(0.0, 1.0);
        let _ = write!(svg, "<feColorMatrix type=\"saturate\" values=\"{amount}\"/>");
    }
    if f.sepia > 0.0 {
        let k = 1.0 - f.sepia.clamp(0.0, 1.0);
        let m = [
            0.393 + 0.607 * k,
            0.769 - 0.769 * k,
            0.189 - 0.189 * k,
            0.349 - 0.349 * k,
            0.686 + 0.314 * k,
            0.168 - 0.168 * k,
            0.272 - 0.272 * k,
            0.534 - 0.534 * k,
            0.131 + 0.869 * k,
        ];
        let _ = write!(
            svg,
            "<feColorMatrix type=\"matrix\" values=\"{} {} {} 0 0 {} {} {} 0 0 {} {} {} 0 0 0 0 0 1 0\"/>",
            m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8],
        );
    }
    svg.push_str("</filter></defs>");
}

fn render_shape(svg: &mut String, shape: &ShapeVisual, w: f32, h: f32) {
    let paint = format!(
        "fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"",
        escape_xml(&shape.fill),
        escape_xml(&shape.stroke),
        shape.stroke_width,
    );
    match shape.kind {
        ShapeKind::Rectangle => {
            let _ = write!(svg, "<rect width=\"{w}\" height=\"{h}\" {paint}/>");
        }
        ShapeKind::Circle => {
            let _ = write!(
                svg,
                "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" {paint}/>",
                w / 2.0,
                h / 2.0,
                w / 2.0,
                h / 2.0,
            );
        }
        ShapeKind::Line => {
            let _ = write!(
                svg,
                "<line x1=\"0\" y1=\"0\" x2=\"{w}\" y2=\"{h}\" stroke=\"{}\" stroke-width=\"{}\"/>",
                escape_xml(&shape.stroke),
                shape.stroke_width.max(1.0),
            );
        }
        ShapeKind::Heart => {
            let (mx, top) = (w / 2.0, h * 0.3);
            let _ = write!(
                svg,
                "<path d=\"M{mx} {top} C{mx} 0 0 0 0 {top} C0 {} {mx} {} {mx} {h} C{mx} {} {w} {} {w} {top} C{w} 0 {mx} 0 {mx} {top} Z\" {paint}/>",
                h * 0.6,
                h * 0.8,
                h * 0.8,
                h * 0.6,
            );
        }
        ShapeKind::Triangle | ShapeKind::Polygon | ShapeKind::Arrow | ShapeKind::Star => {
            let points = shape_points(shape.kind, w, h)
                .iter()
                .map(|(x, y)| format!("{x},{y}"))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(svg, "<polygon points=\"{points}\" {paint}/>");
        }
    }
}

/// Outline points for polygonal shape kinds in a `w` by `h` box.
#[allow(clippy::cast_precision_loss)]
fn shape_points(kind: ShapeKind, w: f32, h: f32) -> Vec<(f32, f32)> {
    let (cx, cy) = (w / 2.0, h / 2.0);
    let ring = |count: usize, inner: Option<f32>| -> Vec<(f32, f32)> {
        let steps = if inner.is_some() { count * 2 } else { count };
        (0..steps)
            .map(|i| {
                let angle = -std::f32::consts::FRAC_PI_2
                    + i as f32 * std::f32::consts::TAU / steps as f32;
                let scale = match inner {
                    Some(r) if i % 2 == 1 => r,
                    _ => 1.0,
                };
                (cx + cx * scale * angle.cos(), cy + cy * scale * angle.sin())
            })
            .collect()
    };
    match kind {
        ShapeKind::Triangle => vec![(cx, 0.0), (w, h), (0.0, h)],
        ShapeKind::Arrow => vec![
            (0.0, h * 0.3),
            (w * 0.6, h * 0.3),
            (w * 0.6, 0.0),
            (w, cy),
            (w * 0.6, h),
            (w * 0.6, h * 0.7),
            (0.0, h * 0.7),
        ],
        ShapeKind::Star => ring(5, Some(0.382)),
        _ => ring(6, None),
    }
}

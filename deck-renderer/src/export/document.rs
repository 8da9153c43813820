//! Fixed-page document (PDF) backend.
//!
//! One page per slide at a standard paper size, units in points. Rotation is
//! not applied: rotated layers are drawn axis-aligned. Opacity is set through
//! a per-layer `ExtGState` before each draw.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use deck_core::{
    AbsoluteRect, Background, BoundingBox, ImageLayer, Layer, Presentation, ShapeKind, ShapeLayer,
    Slide, TextAlign, TextLayer, PX_TO_PT,
};

use crate::color::Rgba;
use crate::error::RenderResult;
use crate::image::{load, DecodedImage};
use crate::metrics::{text_width, wrap_lines, DEFAULT_LINE_HEIGHT};

use super::{traverse, ExportConfig, LayerConverter};

/// Resource name of the built-in Helvetica font.
const FONT_NAME: &str = "F1";
/// Bezier control distance for a quarter ellipse.
const KAPPA: f32 = 0.552_284_8;
/// Font size of the image-failure label, in points.
const PLACEHOLDER_FONT_SIZE: f32 = 12.0;

/// Render `presentation` as a PDF document.
///
/// # Errors
///
/// Returns an error if the document cannot be encoded.
pub fn render_pdf(presentation: &Presentation, config: &ExportConfig) -> RenderResult<Vec<u8>> {
    traverse(
        presentation,
        DocumentWriter::new(&presentation.title, config.page_bounds()),
    )
}

/// Resources and operators of the page being drawn.
#[derive(Default)]
struct PageBuilder {
    ops: Vec<Operation>,
    ext_gstates: Dictionary,
    xobjects: Dictionary,
}

/// Builds a PDF document page by page.
pub struct DocumentWriter {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
    page: PageBuilder,
    bounds: BoundingBox,
    images: usize,
}

impl DocumentWriter {
    /// Start a document titled `title` with pages of `bounds` points.
    #[must_use]
    pub fn new(title: &str, bounds: BoundingBox) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(win_ansi(title), StringFormat::Literal),
            "Producer" => Object::string_literal("deck-renderer"),
        });
        doc.trailer.set("Info", info_id);

        Self {
            doc,
            pages_id,
            font_id,
            page_ids: Vec::new(),
            page: PageBuilder::default(),
            bounds,
            images: 0,
        }
    }

    /// PDF y coordinate of a distance from the top of the page.
    fn flip(&self, top: f32) -> f32 {
        self.bounds.height - top
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.page.ops.push(Operation::new(operator, operands));
    }

    /// Open a graphics state with separate fill and stroke alpha.
    fn begin_layer(&mut self, fill_alpha: f32, stroke_alpha: f32) {
        let name = format!("GS{}", self.page.ext_gstates.len());
        self.page.ext_gstates.set(
            name.as_bytes().to_vec(),
            dictionary! {
                "Type" => "ExtGState",
                "ca" => fill_alpha.clamp(0.0, 1.0),
                "CA" => stroke_alpha.clamp(0.0, 1.0),
            },
        );
        self.push("q", vec![]);
        self.push("gs", vec![Object::Name(name.into_bytes())]);
    }

    fn end_layer(&mut self) {
        self.push("Q", vec![]);
    }

    fn set_fill(&mut self, color: Rgba) {
        let [r, g, b] = color.unit_rgb();
        self.push("rg", vec![r.into(), g.into(), b.into()]);
    }

    fn set_stroke(&mut self, color: Rgba) {
        let [r, g, b] = color.unit_rgb();
        self.push("RG", vec![r.into(), g.into(), b.into()]);
    }

    fn rect_path(&mut self, rect: AbsoluteRect) {
        let bottom = self.flip(rect.bottom());
        self.push(
            "re",
            vec![
                rect.left.into(),
                bottom.into(),
                rect.width.into(),
                rect.height.into(),
            ],
        );
    }

    fn ellipse_path(&mut self, rect: AbsoluteRect) {
        let (rx, ry) = (rect.width / 2.0, rect.height / 2.0);
        let cx = rect.left + rx;
        let cy = self.flip(rect.top + ry);
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);

        self.push("m", vec![(cx + rx).into(), cy.into()]);
        let curves = [
            [cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry],
            [cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy],
            [cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry],
            [cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy],
        ];
        for curve in curves {
            self.push("c", curve.iter().map(|&v| v.into()).collect());
        }
        self.push("h", vec![]);
    }

    /// Show `line` with its baseline at `baseline` points from the top.
    fn show_line(&mut self, line: &str, x: f32, baseline: f32) {
        let y = self.flip(baseline);
        self.push(
            "Tm",
            vec![
                1.into(),
                0.into(),
                0.into(),
                1.into(),
                x.into(),
                y.into(),
            ],
        );
        self.push(
            "Tj",
            vec![Object::String(win_ansi(line), StringFormat::Literal)],
        );
    }

    fn begin_text(&mut self, size: f32, color: Rgba) {
        self.push("BT", vec![]);
        self.push(
            "Tf",
            vec![Object::Name(FONT_NAME.as_bytes().to_vec()), size.into()],
        );
        self.set_fill(color);
    }

    fn embed_image(&mut self, image: &DecodedImage) -> String {
        let (rgb, alpha) = image.split_alpha();
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };
        if image.has_transparency() {
            let mask_id = self.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(image.width),
                    "Height" => i64::from(image.height),
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            ));
            dict.set("SMask", mask_id);
        }
        let image_id = self.doc.add_object(Stream::new(dict, rgb));

        let name = format!("Im{}", self.images);
        self.images += 1;
        self.page.xobjects.set(name.as_bytes().to_vec(), image_id);
        name
    }

    fn draw_placeholder(&mut self, rect: AbsoluteRect) {
        self.set_stroke(Rgba::RED);
        self.push("w", vec![1.into()]);
        self.rect_path(rect);
        self.push("S", vec![]);

        self.begin_text(PLACEHOLDER_FONT_SIZE, Rgba::BLACK);
        self.show_line("Image Error", rect.left + 5.0, rect.top + 15.0);
        self.push("ET", vec![]);
    }
}

impl LayerConverter for DocumentWriter {
    type Output = Vec<u8>;

    fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    fn begin_slide(&mut self, index: usize, slide: &Slide) -> RenderResult<()> {
        tracing::trace!(index, slide = %slide.id, "Starting page");
        self.page = PageBuilder::default();

        let fill = match &slide.background {
            Background::Color(color) => {
                Rgba::parse_or(color, Rgba::WHITE).flatten_on(Rgba::WHITE)
            }
            Background::Image(_) => Rgba::WHITE,
        };
        self.set_fill(fill);
        self.rect_path(AbsoluteRect::new(
            0.0,
            0.0,
            self.bounds.width,
            self.bounds.height,
        ));
        self.push("f", vec![]);
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn text(&mut self, layer: &Layer, text: &TextLayer, rect: AbsoluteRect) -> RenderResult<()> {
        let size = text.font_size * PX_TO_PT;
        let line_height = size * text.line_height.unwrap_or(DEFAULT_LINE_HEIGHT);
        let lines = wrap_lines(&text.content, size, rect.width);

        let color = Rgba::parse_or(&text.color, Rgba::BLACK);
        if color.is_invisible() {
            tracing::trace!(layer = %layer.id, "Text colour is transparent, nothing to draw");
            return Ok(());
        }

        self.begin_layer(layer.opacity * color.alpha(), layer.opacity);
        self.begin_text(size, color);
        let first_baseline = rect.top + rect.height / 2.0;
        for (i, line) in lines.iter().enumerate() {
            let width = text_width(line, size);
            let x = match text.text_align {
                TextAlign::Left | TextAlign::Justify => rect.left,
                TextAlign::Center => rect.left + (rect.width - width) / 2.0,
                TextAlign::Right => rect.right() - width,
            };
            self.show_line(line, x, first_baseline + line_height * i as f32);
        }
        self.push("ET", vec![]);
        self.end_layer();
        Ok(())
    }

    fn image(&mut self, layer: &Layer, image: &ImageLayer, rect: AbsoluteRect) -> RenderResult<()> {
        if image.src.trim().is_empty() {
            tracing::debug!(layer = %layer.id, "Skipping image layer without source");
            return Ok(());
        }

        self.begin_layer(layer.opacity, layer.opacity);
        match load(&image.src) {
            Ok(decoded) => {
                let name = self.embed_image(&decoded);
                let bottom = self.flip(rect.bottom());
                self.push(
                    "cm",
                    vec![
                        rect.width.into(),
                        0.into(),
                        0.into(),
                        rect.height.into(),
                        rect.left.into(),
                        bottom.into(),
                    ],
                );
                self.push("Do", vec![Object::Name(name.into_bytes())]);
            }
            Err(e) => {
                tracing::warn!(layer = %layer.id, "Image embed failed, drawing placeholder: {e}");
                self.draw_placeholder(rect);
            }
        }
        self.end_layer();
        Ok(())
    }

    fn shape(&mut self, layer: &Layer, shape: &ShapeLayer, rect: AbsoluteRect) -> RenderResult<()> {
        let fill = Rgba::parse_or(&shape.fill_color, Rgba::WHITE);
        let stroke = Rgba::parse_or(&shape.stroke_color, Rgba::BLACK);
        let filled = !fill.is_invisible();
        let stroked = shape.stroke_width > 0.0 && !stroke.is_invisible();
        let paint = match (filled, stroked) {
            (true, true) => "B",
            (true, false) => "f",
            (false, true) => "S",
            (false, false) => {
                tracing::trace!(layer = %layer.id, "Shape paints nothing, skipped");
                return Ok(());
            }
        };

        self.begin_layer(layer.opacity * fill.alpha(), layer.opacity * stroke.alpha());
        if filled {
            self.set_fill(fill);
        }
        if stroked {
            self.set_stroke(stroke);
            self.push("w", vec![shape.stroke_width.into()]);
        }

        match shape.shape_type {
            ShapeKind::Circle => self.ellipse_path(rect),
            ShapeKind::Rectangle => self.rect_path(rect),
            other => {
                tracing::debug!(layer = %layer.id, "No page primitive for {other:?}, drawing rectangle");
                self.rect_path(rect);
            }
        }
        self.push(paint, vec![]);
        self.end_layer();
        Ok(())
    }

    fn end_slide(&mut self) -> RenderResult<()> {
        let page = std::mem::take(&mut self.page);
        let content = Content {
            operations: page.ops,
        };
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let mut resources = dictionary! {
            "Font" => dictionary! { FONT_NAME => self.font_id },
        };
        if !page.ext_gstates.is_empty() {
            resources.set("ExtGState", page.ext_gstates);
        }
        if !page.xobjects.is_empty() {
            resources.set("XObject", page.xobjects);
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    fn finish(mut self) -> RenderResult<Vec<u8>> {
        if self.page_ids.is_empty() {
            // a document always has at least one page
            self.begin_slide(0, &Slide::new(""))?;
            self.end_slide()?;
        }

        let count = i64::try_from(self.page_ids.len()).unwrap_or(i64::MAX);
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let media_box: Vec<Object> = vec![
            0.into(),
            0.into(),
            self.bounds.width.into(),
            self.bounds.height.into(),
        ];
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => media_box,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes)?;
        tracing::debug!(pages = count, bytes = bytes.len(), "Document encoded");
        Ok(bytes)
    }
}

/// Encode for the WinAnsi built-in font. Unencodable characters become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match u32::from(c) {
        0x80..=0x9F => b'?',
        code @ (0x00..=0x7F | 0xA0..=0xFF) => u8::try_from(code).unwrap_or(b'?'),
        _ => match c {
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => b'?',
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{LayerKind, LayerTemplate, LayerType};

    fn operations(bytes: &[u8]) -> Vec<Vec<Operation>> {
        let doc = Document::load_mem(bytes).expect("parseable pdf");
        doc.get_pages()
            .values()
            .map(|&id| {
                let raw = doc.get_page_content(id).expect("content");
                Content::decode(&raw).expect("decodable").operations
            })
            .collect()
    }

    fn operators(ops: &[Operation]) -> Vec<&str> {
        ops.iter().map(|op| op.operator.as_str()).collect()
    }

    #[test]
    fn test_empty_presentation_still_has_a_page() {
        let pdf = render_pdf(&Presentation::new(""), &ExportConfig::default()).expect("pdf");
        assert_eq!(operations(&pdf).len(), 1);
    }

    #[test]
    fn test_opacity_goes_through_ext_gstate() {
        let shape = Layer::create(LayerType::Shape, &LayerTemplate::default(), None, 0)
            .with_opacity(0.25);
        let presentation = Presentation::new("t").with_slide(Slide::new("s").with_layer(shape));
        let pdf = render_pdf(&presentation, &ExportConfig::default()).expect("pdf");

        let doc = Document::load_mem(&pdf).expect("parseable");
        let page_id = *doc.get_pages().values().next().expect("page");
        let resources = doc
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"Resources"))
            .and_then(Object::as_dict)
            .expect("resources");
        let states = resources
            .get(b"ExtGState")
            .and_then(Object::as_dict)
            .expect("ext gstates");
        let gs = states.get(b"GS0").and_then(Object::as_dict).expect("GS0");
        let ca = gs.get(b"ca").and_then(Object::as_float).expect("ca");
        assert!((ca - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_circle_is_drawn_with_curves() {
        let mut circle = Layer::create(LayerType::Shape, &LayerTemplate::default(), None, 0);
        if let LayerKind::Shape(shape) = &mut circle.kind {
            shape.shape_type = ShapeKind::Circle;
        }
        let presentation = Presentation::new("t").with_slide(Slide::new("s").with_layer(circle));
        let pdf = render_pdf(&presentation, &ExportConfig::default()).expect("pdf");
        let pages = operations(&pdf);
        let ops = operators(&pages[0]);
        assert_eq!(ops.iter().filter(|op| **op == "c").count(), 4);
        assert!(ops.contains(&"B"));
    }

    #[test]
    fn test_unmapped_shape_falls_back_to_rectangle() {
        let mut star = Layer::create(LayerType::Shape, &LayerTemplate::default(), None, 0);
        if let LayerKind::Shape(shape) = &mut star.kind {
            shape.shape_type = ShapeKind::Star;
        }
        let presentation = Presentation::new("t").with_slide(Slide::new("s").with_layer(star));
        let pdf = render_pdf(&presentation, &ExportConfig::default()).expect("pdf");
        let pages = operations(&pdf);
        // background plus the fallback rectangle
        assert_eq!(operators(&pages[0]).iter().filter(|op| **op == "re").count(), 2);
    }

    #[test]
    fn test_rotation_is_not_applied() {
        let shape = Layer::create(LayerType::Shape, &LayerTemplate::default(), None, 0)
            .with_rotation(45.0);
        let presentation = Presentation::new("t").with_slide(Slide::new("s").with_layer(shape));
        let pdf = render_pdf(&presentation, &ExportConfig::default()).expect("pdf");
        let pages = operations(&pdf);
        assert!(!operators(&pages[0]).contains(&"cm"));
    }

    #[test]
    fn test_embedded_image_uses_xobject() {
        let uri = format!(
            "data:image/png;base64,{}",
            crate::image::tests::RED_PIXEL_PNG
        );
        let image = Layer::create(LayerType::Image, &LayerTemplate::default(), Some(&uri), 0);
        let presentation = Presentation::new("t").with_slide(Slide::new("s").with_layer(image));
        let pdf = render_pdf(&presentation, &ExportConfig::default()).expect("pdf");
        let pages = operations(&pdf);
        let ops = operators(&pages[0]);
        assert!(ops.contains(&"cm"));
        assert!(ops.contains(&"Do"));
    }

    #[test]
    fn test_win_ansi_replaces_wide_characters() {
        assert_eq!(win_ansi("Café 漢"), vec![b'C', b'a', b'f', 0xE9, b' ', b'?']);
    }

    #[test]
    fn test_win_ansi_maps_punctuation_block() {
        assert_eq!(
            win_ansi("\u{20AC}\u{201C}x\u{201D}\u{2013}\u{2014}\u{2122}"),
            vec![0x80, 0x93, b'x', 0x94, 0x96, 0x97, 0x99]
        );
        // C1 controls have no glyph in this encoding
        assert_eq!(win_ansi("\u{0080}\u{0093}"), vec![b'?', b'?']);
    }

    fn shape_with_colours(fill: &str, stroke: &str) -> Layer {
        let mut layer = Layer::create(LayerType::Shape, &LayerTemplate::default(), None, 0);
        if let LayerKind::Shape(shape) = &mut layer.kind {
            shape.fill_color = fill.to_string();
            shape.stroke_color = stroke.to_string();
        }
        layer
    }

    fn ext_gstate(pdf: &[u8], name: &str) -> (f32, f32) {
        let doc = Document::load_mem(pdf).expect("parseable");
        let page_id = *doc.get_pages().values().next().expect("page");
        let gs = doc
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"Resources"))
            .and_then(Object::as_dict)
            .and_then(|r| r.get(b"ExtGState"))
            .and_then(Object::as_dict)
            .and_then(|states| states.get(name.as_bytes()))
            .and_then(Object::as_dict)
            .expect("ext gstate");
        let ca = gs.get(b"ca").and_then(Object::as_float).expect("ca");
        let stroke_ca = gs.get(b"CA").and_then(Object::as_float).expect("CA");
        (ca, stroke_ca)
    }

    #[test]
    fn test_transparent_fill_is_stroked_only() {
        let layer = shape_with_colours("transparent", "#ff0000");
        let presentation = Presentation::new("t").with_slide(Slide::new("s").with_layer(layer));
        let pdf = render_pdf(&presentation, &ExportConfig::default()).expect("pdf");
        let pages = operations(&pdf);
        let ops = operators(&pages[0]);

        assert!(ops.contains(&"S"));
        assert!(!ops.contains(&"B"));
        // only the page background sets a fill colour
        assert_eq!(ops.iter().filter(|op| **op == "rg").count(), 1);
    }

    #[test]
    fn test_invisible_shape_draws_nothing() {
        let layer = shape_with_colours("transparent", "rgba(255, 0, 0, 0.0)");
        let presentation = Presentation::new("t").with_slide(Slide::new("s").with_layer(layer));
        let pdf = render_pdf(&presentation, &ExportConfig::default()).expect("pdf");
        let pages = operations(&pdf);
        let ops = operators(&pages[0]);

        assert_eq!(ops, vec!["rg", "re", "f"]);
    }

    #[test]
    fn test_colour_alpha_splits_fill_and_stroke() {
        let layer = shape_with_colours("rgba(0, 0, 255, 0.5)", "#000000").with_opacity(0.5);
        let presentation = Presentation::new("t").with_slide(Slide::new("s").with_layer(layer));
        let pdf = render_pdf(&presentation, &ExportConfig::default()).expect("pdf");

        let (ca, stroke_ca) = ext_gstate(&pdf, "GS0");
        assert!((ca - 0.25).abs() < 0.01);
        assert!((stroke_ca - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_transparent_text_is_skipped() {
        let mut layer = Layer::create(LayerType::Text, &LayerTemplate::default(), Some("Hi"), 0);
        if let LayerKind::Text(text) = &mut layer.kind {
            text.color = "transparent".to_string();
        }
        let presentation = Presentation::new("t").with_slide(Slide::new("s").with_layer(layer));
        let pdf = render_pdf(&presentation, &ExportConfig::default()).expect("pdf");
        let pages = operations(&pdf);
        assert!(!operators(&pages[0]).contains(&"Tj"));
    }
}

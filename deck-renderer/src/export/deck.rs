//! Native slide-deck (PPTX) backend.
//!
//! Layer geometry stays in percent of the slide: the traversal box is
//! [`BoundingBox::PERCENT`] and offsets are only scaled to EMU against the
//! slide size when the DrawingML is written. Rotation and opacity are native.

use std::fmt::Write as _;
use std::io::{Cursor, Write as _};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use deck_core::{
    AbsoluteRect, AspectRatio, Background, BoundingBox, ImageLayer, Layer, Presentation,
    ShapeKind, ShapeLayer, Slide, TextAlign, TextLayer, PX_TO_PT,
};

use crate::color::Rgba;
use crate::error::RenderResult;
use crate::image::{resolve_source, ImageFormat};
use crate::metrics::DEFAULT_LINE_HEIGHT;

use super::package::{self, root_open, SP_TREE_START, XML_HEADER};
use super::{escape_xml, traverse, LayerConverter};

/// EMU per point.
const EMU_PER_PT: f32 = 12_700.0;

/// Slide size in EMU for an aspect ratio.
#[must_use]
pub fn slide_size_emu(ratio: AspectRatio) -> (i64, i64) {
    match ratio {
        AspectRatio::Widescreen => (9_144_000, 5_143_500),
        AspectRatio::Standard => (9_144_000, 6_858_000),
        AspectRatio::Square => (6_858_000, 6_858_000),
        AspectRatio::PortraitWidescreen => (5_143_500, 9_144_000),
        AspectRatio::PortraitStandard => (6_858_000, 9_144_000),
    }
}

/// DrawingML preset for a shape kind.
#[must_use]
pub fn preset_geometry(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Rectangle | ShapeKind::Polygon => "rect",
        ShapeKind::Circle => "ellipse",
        ShapeKind::Triangle => "triangle",
        ShapeKind::Arrow => "rightArrow",
        ShapeKind::Line => "line",
        ShapeKind::Star => "star5",
        ShapeKind::Heart => "heart",
    }
}

/// Render `presentation` as a PPTX package.
///
/// # Errors
///
/// Returns an error if the package cannot be written.
pub fn render_pptx(presentation: &Presentation) -> RenderResult<Vec<u8>> {
    traverse(presentation, DeckWriter::new(presentation))
}

/// One finished slide part.
struct SlidePart {
    xml: String,
    media: Vec<String>,
}

/// Slide being written.
struct OpenSlide {
    shapes: String,
    background: Rgba,
    media: Vec<String>,
}

/// Builds a PPTX package slide by slide.
pub struct DeckWriter {
    title: String,
    font: String,
    size: (i64, i64),
    slides: Vec<SlidePart>,
    current: Option<OpenSlide>,
    /// Package media parts as (file name, bytes).
    media: Vec<(String, Vec<u8>)>,
    next_shape_id: u32,
}

impl DeckWriter {
    /// Start a package sized for `presentation`'s aspect ratio.
    #[must_use]
    pub fn new(presentation: &Presentation) -> Self {
        Self {
            title: presentation.title.clone(),
            font: presentation.global_settings.default_font.clone(),
            size: slide_size_emu(presentation.global_settings.aspect_ratio),
            slides: Vec::new(),
            current: None,
            media: Vec::new(),
            next_shape_id: 2,
        }
    }

    fn shape_id(&mut self) -> u32 {
        let id = self.next_shape_id;
        self.next_shape_id += 1;
        id
    }

    fn open_slide(&mut self) -> &mut OpenSlide {
        self.current.get_or_insert_with(|| OpenSlide {
            shapes: String::new(),
            background: Rgba::WHITE,
            media: Vec::new(),
        })
    }

    fn shapes(&mut self) -> &mut String {
        &mut self.open_slide().shapes
    }

    /// `<a:xfrm>` for a percent box.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn xfrm(&self, rect: AbsoluteRect, rotation: f32) -> String {
        let (cx, cy) = self.size;
        let scale = |percent: f32, extent: i64| -> i64 {
            (f64::from(percent) / 100.0 * extent as f64).round() as i64
        };
        let rot = (f64::from(rotation) * 60_000.0).round() as i64;
        let rot_attr = if rot == 0 {
            String::new()
        } else {
            format!(r#" rot="{rot}""#)
        };
        format!(
            r#"<a:xfrm{rot_attr}><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            scale(rect.left, cx),
            scale(rect.top, cy),
            scale(rect.width, cx).max(1),
            scale(rect.height, cy).max(1),
        )
    }
}

/// `<a:srgbClr>` with alpha from the colour and layer opacity.
#[allow(clippy::cast_possible_truncation)]
fn srgb(color: Rgba, opacity: f32) -> String {
    let alpha = (color.alpha() * opacity.clamp(0.0, 1.0) * 100_000.0).round() as i64;
    if alpha >= 100_000 {
        format!(r#"<a:srgbClr val="{}"/>"#, color.hex())
    } else {
        format!(
            r#"<a:srgbClr val="{}"><a:alpha val="{alpha}"/></a:srgbClr>"#,
            color.hex()
        )
    }
}

impl LayerConverter for DeckWriter {
    type Output = Vec<u8>;

    fn bounds(&self) -> BoundingBox {
        BoundingBox::PERCENT
    }

    fn begin_slide(&mut self, index: usize, slide: &Slide) -> RenderResult<()> {
        tracing::trace!(index, slide = %slide.id, "Starting deck slide");
        let background = match &slide.background {
            Background::Color(color) => {
                Rgba::parse_or(color, Rgba::WHITE).flatten_on(Rgba::WHITE)
            }
            Background::Image(_) => {
                tracing::debug!(slide = %slide.id, "Image background exported as white");
                Rgba::WHITE
            }
        };
        self.current = Some(OpenSlide {
            shapes: String::new(),
            background,
            media: Vec::new(),
        });
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn text(&mut self, layer: &Layer, text: &TextLayer, rect: AbsoluteRect) -> RenderResult<()> {
        let id = self.shape_id();
        let xfrm = self.xfrm(rect, layer.rotation);
        let algn = match text.text_align {
            TextAlign::Left => "l",
            TextAlign::Center => "ctr",
            TextAlign::Right => "r",
            TextAlign::Justify => "just",
        };
        let size = (text.font_size * PX_TO_PT * 100.0).round() as i64;
        let fill = srgb(Rgba::parse_or(&text.color, Rgba::BLACK), layer.opacity);
        let font = escape_xml(&text.font_family);
        let line_spacing = (text.line_height.unwrap_or(DEFAULT_LINE_HEIGHT) * 100_000.0).round() as i64;

        let mut run_attrs = format!(r#" lang="en-US" sz="{size}""#);
        if text.bold == Some(true) {
            run_attrs.push_str(r#" b="1""#);
        }
        if text.italic == Some(true) {
            run_attrs.push_str(r#" i="1""#);
        }
        if text.underline == Some(true) {
            run_attrs.push_str(r#" u="sng""#);
        }
        if let Some(spacing) = text.letter_spacing.filter(|s| s.abs() > f32::EPSILON) {
            let _ = write!(run_attrs, r#" spc="{}""#, (spacing * PX_TO_PT * 100.0).round() as i64);
        }

        let xml = self.shapes();
        xml.push_str("<p:sp><p:nvSpPr>");
        let _ = write!(xml, r#"<p:cNvPr id="{id}" name="Text {id}"/>"#);
        xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#);
        let _ = write!(
            xml,
            r#"<p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#
        );
        xml.push_str(r#"<p:txBody><a:bodyPr wrap="square" lIns="0" tIns="0" rIns="0" bIns="0" rtlCol="0" anchor="ctr"><a:noAutofit/></a:bodyPr><a:lstStyle/>"#);
        for line in text.content.split('\n') {
            let _ = write!(
                xml,
                r#"<a:p><a:pPr algn="{algn}"><a:lnSpc><a:spcPct val="{line_spacing}"/></a:lnSpc></a:pPr><a:r><a:rPr{run_attrs} dirty="0"><a:solidFill>{fill}</a:solidFill><a:latin typeface="{font}"/></a:rPr><a:t>{}</a:t></a:r></a:p>"#,
                escape_xml(line.trim_end_matches('\r'))
            );
        }
        xml.push_str("</p:txBody></p:sp>");
        Ok(())
    }

    fn image(&mut self, layer: &Layer, image: &ImageLayer, rect: AbsoluteRect) -> RenderResult<()> {
        if image.src.trim().is_empty() {
            tracing::debug!(layer = %layer.id, "Skipping image layer without source");
            return Ok(());
        }
        let bytes = match resolve_source(&image.src) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(layer = %layer.id, "Image left out of deck: {e}");
                return Ok(());
            }
        };

        let format = match ImageFormat::from_magic_bytes(&bytes.data) {
            ImageFormat::Unknown => {
                tracing::warn!(layer = %layer.id, "Image format not recognised, left out of deck");
                return Ok(());
            }
            format => format,
        };

        let file_name = format!("image{}.{}", self.media.len() + 1, format.extension());
        self.media.push((file_name.clone(), bytes.data));
        let rel_id = {
            let slide = self.open_slide();
            slide.media.push(file_name);
            format!("rId{}", slide.media.len() + 1)
        };

        let id = self.shape_id();
        let xfrm = self.xfrm(rect, layer.rotation);
        let descr = escape_xml(image.prompt.as_deref().unwrap_or_default());
        let alpha = if layer.opacity < 1.0 {
            #[allow(clippy::cast_possible_truncation)]
            let amt = (layer.opacity.clamp(0.0, 1.0) * 100_000.0).round() as i64;
            format!(r#"<a:alphaModFix amt="{amt}"/>"#)
        } else {
            String::new()
        };

        let xml = self.shapes();
        xml.push_str("<p:pic><p:nvPicPr>");
        let _ = write!(
            xml,
            r#"<p:cNvPr id="{id}" name="Picture {id}" descr="{descr}"/>"#
        );
        xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#);
        let _ = write!(
            xml,
            r#"<p:blipFill><a:blip r:embed="{rel_id}">{alpha}</a:blip><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#
        );
        let _ = write!(
            xml,
            r#"<p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#
        );
        xml.push_str("</p:pic>");
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn shape(&mut self, layer: &Layer, shape: &ShapeLayer, rect: AbsoluteRect) -> RenderResult<()> {
        let id = self.shape_id();
        let xfrm = self.xfrm(rect, layer.rotation);
        let prst = preset_geometry(shape.shape_type);
        let fill = srgb(Rgba::parse_or(&shape.fill_color, Rgba::WHITE), layer.opacity);
        let stroke = srgb(
            Rgba::parse_or(&shape.stroke_color, Rgba::BLACK),
            layer.opacity,
        );
        let line = if shape.stroke_width > 0.0 {
            let w = (shape.stroke_width * EMU_PER_PT).round() as i64;
            format!(r#"<a:ln w="{w}"><a:solidFill>{stroke}</a:solidFill></a:ln>"#)
        } else {
            "<a:ln><a:noFill/></a:ln>".to_string()
        };
        let kind = shape.shape_type;

        let xml = self.shapes();
        xml.push_str("<p:sp><p:nvSpPr>");
        let _ = write!(xml, r#"<p:cNvPr id="{id}" name="{kind:?} {id}"/>"#);
        xml.push_str("<p:cNvSpPr/><p:nvPr/></p:nvSpPr>");
        let _ = write!(
            xml,
            r#"<p:spPr>{xfrm}<a:prstGeom prst="{prst}"><a:avLst/></a:prstGeom><a:solidFill>{fill}</a:solidFill>{line}</p:spPr>"#
        );
        xml.push_str("</p:sp>");
        Ok(())
    }

    fn end_slide(&mut self) -> RenderResult<()> {
        let Some(open) = self.current.take() else {
            return Ok(());
        };

        let mut xml = String::with_capacity(1024 + open.shapes.len());
        xml.push_str(XML_HEADER);
        xml.push_str(&root_open("sld", ""));
        let _ = write!(
            xml,
            r#"<p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
            open.background.hex()
        );
        xml.push_str(SP_TREE_START);
        xml.push_str(&open.shapes);
        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");

        self.slides.push(SlidePart {
            xml,
            media: open.media,
        });
        Ok(())
    }

    fn finish(self) -> RenderResult<Vec<u8>> {
        let count = self.slides.len();
        let (cx, cy) = self.size;
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let mut parts: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".into(), package::content_types(count).into_bytes()),
            ("_rels/.rels".into(), package::root_rels().into_bytes()),
            ("docProps/core.xml".into(), package::core_properties(&self.title).into_bytes()),
            ("docProps/app.xml".into(), package::app_properties(count).into_bytes()),
            ("ppt/presentation.xml".into(), package::presentation(count, cx, cy).into_bytes()),
            ("ppt/_rels/presentation.xml.rels".into(), package::presentation_rels(count).into_bytes()),
            ("ppt/slideMasters/slideMaster1.xml".into(), package::slide_master().into_bytes()),
            ("ppt/slideMasters/_rels/slideMaster1.xml.rels".into(), package::slide_master_rels().into_bytes()),
            ("ppt/slideLayouts/slideLayout1.xml".into(), package::slide_layout().into_bytes()),
            ("ppt/slideLayouts/_rels/slideLayout1.xml.rels".into(), package::slide_layout_rels().into_bytes()),
            ("ppt/theme/theme1.xml".into(), package::theme(&self.font).into_bytes()),
        ];
        for (i, slide) in self.slides.into_iter().enumerate() {
            let n = i + 1;
            parts.push((
                format!("ppt/slides/_rels/slide{n}.xml.rels"),
                package::slide_rels(&slide.media).into_bytes(),
            ));
            parts.push((format!("ppt/slides/slide{n}.xml"), slide.xml.into_bytes()));
        }
        for (name, data) in self.media {
            parts.push((format!("ppt/media/{name}"), data));
        }

        for (path, data) in &parts {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(data)?;
        }
        let bytes = zip.finish()?.into_inner();
        tracing::debug!(slides = count, bytes = bytes.len(), "Deck package encoded");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use deck_core::{LayerKind, LayerTemplate, LayerType};

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("zip");
        let mut file = archive.by_name(name).expect("part present");
        let mut out = String::new();
        file.read_to_string(&mut out).expect("utf-8");
        out
    }

    #[test]
    fn test_slide_size_follows_aspect_ratio() {
        let presentation = Presentation::new("t").with_aspect_ratio(AspectRatio::Standard);
        let pptx = render_pptx(&presentation).expect("pptx");
        let xml = read_part(&pptx, "ppt/presentation.xml");
        assert!(xml.contains(r#"<p:sldSz cx="9144000" cy="6858000"/>"#));
        assert!(!xml.contains("sldIdLst"));
    }

    #[test]
    fn test_geometry_rotation_and_alpha_are_native() {
        let shape = Layer::create(
            LayerType::Shape,
            &LayerTemplate::at(50.0, 50.0, 25.0, 10.0),
            None,
            0,
        )
        .with_rotation(90.0)
        .with_opacity(0.5);
        let presentation = Presentation::new("t").with_slide(Slide::new("s").with_layer(shape));
        let pptx = render_pptx(&presentation).expect("pptx");
        let xml = read_part(&pptx, "ppt/slides/slide1.xml");

        assert!(xml.contains(r#"<a:xfrm rot="5400000"><a:off x="4572000" y="2571750"/><a:ext cx="2286000" cy="514350"/></a:xfrm>"#));
        assert!(xml.contains(r#"<a:srgbClr val="6366F1"><a:alpha val="50000"/></a:srgbClr>"#));
        assert!(xml.contains(r#"prst="rect""#));
        assert!(xml.contains(r#"<a:ln w="25400">"#));
    }

    #[test]
    fn test_text_runs_use_points_and_center_anchor() {
        let mut text = Layer::create(
            LayerType::Text,
            &LayerTemplate::default(),
            Some("One\nTwo & three"),
            0,
        );
        if let LayerKind::Text(t) = &mut text.kind {
            t.font_size = 40.0;
            t.text_align = TextAlign::Right;
            t.bold = Some(true);
        }
        let presentation = Presentation::new("t").with_slide(Slide::new("s").with_layer(text));
        let pptx = render_pptx(&presentation).expect("pptx");
        let xml = read_part(&pptx, "ppt/slides/slide1.xml");

        assert!(xml.contains(r#"anchor="ctr""#));
        assert!(xml.contains(r#"sz="3000""#));
        assert!(xml.contains(r#"algn="r""#));
        assert!(xml.contains(r#" b="1""#));
        assert_eq!(xml.matches("<a:p>").count(), 2);
        assert!(xml.contains("<a:t>Two &amp; three</a:t>"));
    }

    #[test]
    fn test_shape_presets() {
        assert_eq!(preset_geometry(ShapeKind::Circle), "ellipse");
        assert_eq!(preset_geometry(ShapeKind::Star), "star5");
        assert_eq!(preset_geometry(ShapeKind::Polygon), "rect");
    }

    #[test]
    fn test_images_are_embedded_as_media() {
        let uri = format!(
            "data:image/png;base64,{}",
            crate::image::tests::RED_PIXEL_PNG
        );
        let image = Layer::create(LayerType::Image, &LayerTemplate::default(), Some(&uri), 0);
        let remote = Layer::create(
            LayerType::Image,
            &LayerTemplate::default(),
            Some("https://example.com/x.png"),
            1,
        );
        let slide = Slide::new("s").with_layer(image).with_layer(remote);
        let pptx = render_pptx(&Presentation::new("t").with_slide(slide)).expect("pptx");

        let xml = read_part(&pptx, "ppt/slides/slide1.xml");
        assert_eq!(xml.matches("<p:pic>").count(), 1);
        assert!(xml.contains(r#"r:embed="rId2""#));
        let rels = read_part(&pptx, "ppt/slides/_rels/slide1.xml.rels");
        assert!(rels.contains("../media/image1.png"));

        let mut archive = zip::ZipArchive::new(Cursor::new(pptx)).expect("zip");
        assert!(archive.by_name("ppt/media/image1.png").is_ok());
    }

    #[test]
    fn test_unrecognised_image_bytes_are_skipped() {
        let bogus = Layer::create(
            LayerType::Image,
            &LayerTemplate::default(),
            Some("data:image/png;base64,aGVsbG8gd29ybGQ="),
            0,
        );
        let slide = Slide::new("s").with_layer(bogus);
        let pptx = render_pptx(&Presentation::new("t").with_slide(slide)).expect("pptx");

        let xml = read_part(&pptx, "ppt/slides/slide1.xml");
        assert!(!xml.contains("<p:pic>"));
        let archive = zip::ZipArchive::new(Cursor::new(pptx)).expect("zip");
        assert!(!archive.file_names().any(|name| name.starts_with("ppt/media/")));
    }

    #[test]
    fn test_background_colour() {
        let slide = Slide::new("s").with_background("#112233");
        let pptx = render_pptx(&Presentation::new("t").with_slide(slide)).expect("pptx");
        let xml = read_part(&pptx, "ppt/slides/slide1.xml");
        assert!(xml.contains(r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="112233"/>"#));
    }
}

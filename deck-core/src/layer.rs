//! Slide layers - the positioned visual building blocks of a slide.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{normalize_rotation, NormalizedRect};
use crate::{DeckError, DeckResult};

/// Default placement used when a template leaves a field unset.
const DEFAULT_X: f32 = 10.0;
const DEFAULT_Y: f32 = 10.0;
const DEFAULT_WIDTH: f32 = 30.0;
const DEFAULT_HEIGHT: f32 = 10.0;

const DEFAULT_TEXT_CONTENT: &str = "New Text";
const DEFAULT_FONT_SIZE: f32 = 58.0;
const DEFAULT_TEXT_COLOR: &str = "#000000";
const DEFAULT_FONT_FAMILY: &str = "Arial";

const DEFAULT_IMAGE_PROMPT: &str = "A beautiful, high-quality image";

const DEFAULT_SHAPE_FILL: &str = "#6366f1";
const DEFAULT_SHAPE_STROKE: &str = "#4f46e5";
const DEFAULT_STROKE_WIDTH: f32 = 2.0;

/// Unique identifier for a layer within a presentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Generate a fresh identifier prefixed with the layer type.
    #[must_use]
    pub fn generate(layer_type: LayerType) -> Self {
        Self(format!("{}-{}", layer_type.as_str(), Uuid::new_v4().simple()))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The variant tag of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Text block.
    Text,
    /// Raster image.
    Image,
    /// Geometric shape.
    Shape,
}

impl LayerType {
    /// The serialized tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Shape => "shape",
        }
    }
}

impl FromStr for LayerType {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "shape" => Ok(Self::Shape),
            other => Err(DeckError::UnknownLayerType(other.to_string())),
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    Left,
    /// Centred.
    #[default]
    Center,
    /// Flush right.
    Right,
    /// Justified.
    Justify,
}

/// How an image is fitted into its layer box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectFit {
    /// Scale to fit entirely, preserving aspect ratio.
    #[default]
    Contain,
    /// Scale to cover the box, preserving aspect ratio.
    Cover,
    /// Stretch to fill the box.
    Fill,
    /// Natural size.
    None,
    /// Like `None` or `Contain`, whichever is smaller.
    ScaleDown,
}

/// Geometric shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    #[default]
    Rectangle,
    /// Circle or ellipse inscribed in the box.
    Circle,
    /// Isosceles triangle pointing up.
    Triangle,
    /// Regular polygon inscribed in the box.
    Polygon,
    /// Right-pointing block arrow.
    Arrow,
    /// Diagonal line across the box.
    Line,
    /// Five-pointed star.
    Star,
    /// Heart.
    Heart,
}

/// Colour filters applied to an image layer.
///
/// Each value is a multiplier; `grayscale` and `sepia` are amounts in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageFilters {
    /// Brightness multiplier.
    pub brightness: f32,
    /// Contrast multiplier.
    pub contrast: f32,
    /// Saturation multiplier.
    pub saturate: f32,
    /// Grayscale amount.
    pub grayscale: f32,
    /// Sepia amount.
    pub sepia: f32,
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            saturate: 1.0,
            grayscale: 0.0,
            sepia: 0.0,
        }
    }
}

impl ImageFilters {
    /// Whether these filters leave the image unchanged.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Text layer properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    /// Text content.
    pub content: String,
    /// Font size in pixel-equivalent units.
    pub font_size: f32,
    /// Horizontal alignment.
    pub text_align: TextAlign,
    /// Text colour (CSS colour string).
    pub color: String,
    /// Font family name.
    pub font_family: String,
    /// Bold weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    /// Italic style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    /// Underline decoration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    /// Extra spacing between characters, in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f32>,
    /// Line height as a multiple of the font size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
}

/// Image layer properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLayer {
    /// Image source: a data URI, a file path or a URL.
    pub src: String,
    /// Fit mode.
    pub object_fit: ObjectFit,
    /// Prompt the image was generated from (provenance only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Colour filters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<ImageFilters>,
}

/// Shape layer properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeLayer {
    /// Shape kind.
    pub shape_type: ShapeKind,
    /// Fill colour (CSS colour string).
    pub fill_color: String,
    /// Stroke colour (CSS colour string).
    pub stroke_color: String,
    /// Stroke width in pixels.
    pub stroke_width: f32,
}

/// The variant-specific content of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    /// A text block.
    Text(TextLayer),
    /// An image.
    Image(ImageLayer),
    /// A geometric shape.
    Shape(ShapeLayer),
}

/// Placement template used when creating layers.
///
/// Unset (or zero) fields fall back to per-variant defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerTemplate {
    /// Left edge in percent.
    pub x: Option<f32>,
    /// Top edge in percent.
    pub y: Option<f32>,
    /// Width in percent.
    pub width: Option<f32>,
    /// Height in percent.
    pub height: Option<f32>,
    /// Font size for text layers.
    pub font_size: Option<f32>,
    /// Alignment for text layers.
    pub text_align: Option<TextAlign>,
}

impl LayerTemplate {
    /// A template that only fixes position and size.
    #[must_use]
    pub fn at(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }
}

/// Use `value` unless it is missing, zero or not finite.
fn or_default(value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => v,
        _ => default,
    }
}

/// A positioned layer on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Unique identifier.
    pub id: LayerId,
    /// Left edge, percent of slide width.
    pub x: f32,
    /// Top edge, percent of slide height.
    pub y: f32,
    /// Width, percent of slide width.
    pub width: f32,
    /// Height, percent of slide height.
    pub height: f32,
    /// Clockwise rotation in degrees.
    pub rotation: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Paint order; ties keep sequence order.
    pub z_index: i32,
    /// Variant-specific content.
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    /// Create a fully populated layer of the requested type.
    #[must_use]
    pub fn create(
        layer_type: LayerType,
        template: &LayerTemplate,
        content: Option<&str>,
        z_index: i32,
    ) -> Self {
        let content = content.filter(|c| !c.is_empty());
        let kind = match layer_type {
            LayerType::Text => LayerKind::Text(TextLayer {
                content: content.unwrap_or(DEFAULT_TEXT_CONTENT).to_string(),
                font_size: or_default(template.font_size, DEFAULT_FONT_SIZE),
                text_align: template.text_align.unwrap_or_default(),
                color: DEFAULT_TEXT_COLOR.to_string(),
                font_family: DEFAULT_FONT_FAMILY.to_string(),
                bold: None,
                italic: None,
                underline: None,
                letter_spacing: None,
                line_height: None,
            }),
            LayerType::Image => LayerKind::Image(ImageLayer {
                src: content.unwrap_or_default().to_string(),
                object_fit: ObjectFit::default(),
                prompt: Some(DEFAULT_IMAGE_PROMPT.to_string()),
                filters: None,
            }),
            LayerType::Shape => LayerKind::Shape(ShapeLayer {
                shape_type: ShapeKind::default(),
                fill_color: DEFAULT_SHAPE_FILL.to_string(),
                stroke_color: DEFAULT_SHAPE_STROKE.to_string(),
                stroke_width: DEFAULT_STROKE_WIDTH,
            }),
        };

        Self {
            id: LayerId::generate(layer_type),
            x: or_default(template.x, DEFAULT_X),
            y: or_default(template.y, DEFAULT_Y),
            width: or_default(template.width, DEFAULT_WIDTH),
            height: or_default(template.height, DEFAULT_HEIGHT),
            rotation: 0.0,
            opacity: 1.0,
            z_index,
            kind,
        }
    }

    /// Create a layer from a serialized variant tag.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::UnknownLayerType`] if `tag` is not a known variant.
    pub fn create_from_tag(
        tag: &str,
        template: &LayerTemplate,
        content: Option<&str>,
        z_index: i32,
    ) -> DeckResult<Self> {
        let layer_type = tag.parse::<LayerType>()?;
        Ok(Self::create(layer_type, template, content, z_index))
    }

    /// Replace the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<LayerId>) -> Self {
        self.id = id.into();
        self
    }

    /// Replace the geometry.
    #[must_use]
    pub fn with_geometry(mut self, rect: NormalizedRect) -> Self {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
        self
    }

    /// Replace the rotation (normalized into `[0, 360)`).
    #[must_use]
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = normalize_rotation(degrees);
        self
    }

    /// Replace the opacity (clamped into `[0, 1]`).
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Replace the variant content.
    #[must_use]
    pub fn with_kind(mut self, kind: LayerKind) -> Self {
        self.kind = kind;
        self
    }

    /// The variant tag.
    #[must_use]
    pub fn layer_type(&self) -> LayerType {
        match self.kind {
            LayerKind::Text(_) => LayerType::Text,
            LayerKind::Image(_) => LayerType::Image,
            LayerKind::Shape(_) => LayerType::Shape,
        }
    }

    /// The normalized geometry.
    #[must_use]
    pub fn geometry(&self) -> NormalizedRect {
        NormalizedRect::new(self.x, self.y, self.width, self.height)
    }

    /// Produce a new record with `patch` overlaid on this one.
    ///
    /// Fields that belong to a different variant are ignored.
    #[must_use]
    pub fn apply_patch(&self, patch: &LayerPatch) -> Self {
        let mut next = self.clone();

        if let Some(x) = patch.x {
            next.x = x;
        }
        if let Some(y) = patch.y {
            next.y = y;
        }
        if let Some(width) = patch.width {
            next.width = width;
        }
        if let Some(height) = patch.height {
            next.height = height;
        }
        if let Some(rotation) = patch.rotation {
            next.rotation = normalize_rotation(rotation);
        }
        if let Some(opacity) = patch.opacity {
            next.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(z_index) = patch.z_index {
            next.z_index = z_index;
        }

        match &mut next.kind {
            LayerKind::Text(text) => {
                if patch.touches_image() || patch.touches_shape() {
                    tracing::debug!("Ignoring non-text fields in patch for layer {}", self.id);
                }
                overlay(&mut text.content, &patch.content);
                overlay(&mut text.font_size, &patch.font_size);
                overlay(&mut text.text_align, &patch.text_align);
                overlay(&mut text.color, &patch.color);
                overlay(&mut text.font_family, &patch.font_family);
                overlay_opt(&mut text.bold, &patch.bold);
                overlay_opt(&mut text.italic, &patch.italic);
                overlay_opt(&mut text.underline, &patch.underline);
                overlay_opt(&mut text.letter_spacing, &patch.letter_spacing);
                overlay_opt(&mut text.line_height, &patch.line_height);
            }
            LayerKind::Image(image) => {
                if patch.touches_text() || patch.touches_shape() {
                    tracing::debug!("Ignoring non-image fields in patch for layer {}", self.id);
                }
                overlay(&mut image.src, &patch.src);
                overlay(&mut image.object_fit, &patch.object_fit);
                overlay_opt(&mut image.prompt, &patch.prompt);
                overlay_opt(&mut image.filters, &patch.filters);
            }
            LayerKind::Shape(shape) => {
                if patch.touches_text() || patch.touches_image() {
                    tracing::debug!("Ignoring non-shape fields in patch for layer {}", self.id);
                }
                overlay(&mut shape.shape_type, &patch.shape_type);
                overlay(&mut shape.fill_color, &patch.fill_color);
                overlay(&mut shape.stroke_color, &patch.stroke_color);
                overlay(&mut shape.stroke_width, &patch.stroke_width);
            }
        }

        next
    }
}

fn overlay<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

fn overlay_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

/// A partial update merged into an existing layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerPatch {
    /// New left edge.
    pub x: Option<f32>,
    /// New top edge.
    pub y: Option<f32>,
    /// New width.
    pub width: Option<f32>,
    /// New height.
    pub height: Option<f32>,
    /// New rotation in degrees.
    pub rotation: Option<f32>,
    /// New opacity.
    pub opacity: Option<f32>,
    /// New stacking index.
    pub z_index: Option<i32>,

    /// Text content.
    pub content: Option<String>,
    /// Font size.
    pub font_size: Option<f32>,
    /// Alignment.
    pub text_align: Option<TextAlign>,
    /// Text colour.
    pub color: Option<String>,
    /// Font family.
    pub font_family: Option<String>,
    /// Bold weight.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Underline decoration.
    pub underline: Option<bool>,
    /// Letter spacing.
    pub letter_spacing: Option<f32>,
    /// Line height.
    pub line_height: Option<f32>,

    /// Image source.
    pub src: Option<String>,
    /// Image fit mode.
    pub object_fit: Option<ObjectFit>,
    /// Generation prompt.
    pub prompt: Option<String>,
    /// Image filters.
    pub filters: Option<ImageFilters>,

    /// Shape kind.
    pub shape_type: Option<ShapeKind>,
    /// Shape fill colour.
    pub fill_color: Option<String>,
    /// Shape stroke colour.
    pub stroke_color: Option<String>,
    /// Shape stroke width.
    pub stroke_width: Option<f32>,
}

impl LayerPatch {
    /// A patch that moves a layer.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// A patch that replaces position and size.
    #[must_use]
    pub fn geometry(rect: NormalizedRect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Self::default()
        }
    }

    /// A patch that sets the rotation.
    #[must_use]
    pub fn rotation(degrees: f32) -> Self {
        Self {
            rotation: Some(degrees),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn touches_text(&self) -> bool {
        self.content.is_some()
            || self.font_size.is_some()
            || self.text_align.is_some()
            || self.color.is_some()
            || self.font_family.is_some()
            || self.bold.is_some()
            || self.italic.is_some()
            || self.underline.is_some()
            || self.letter_spacing.is_some()
            || self.line_height.is_some()
    }

    fn touches_image(&self) -> bool {
        self.src.is_some() || self.object_fit.is_some() || self.prompt.is_some() || self.filters.is_some()
    }

    fn touches_shape(&self) -> bool {
        self.shape_type.is_some()
            || self.fill_color.is_some()
            || self.stroke_color.is_some()
            || self.stroke_width.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_text_uses_template_and_defaults() {
        let template = LayerTemplate {
            font_size: Some(72.0),
            text_align: Some(TextAlign::Left),
            ..LayerTemplate::at(10.0, 30.0, 80.0, 20.0)
        };
        let layer = Layer::create(LayerType::Text, &template, Some("Title"), 3);

        assert!(layer.id.as_str().starts_with("text-"));
        assert_eq!(layer.geometry(), NormalizedRect::new(10.0, 30.0, 80.0, 20.0));
        assert_eq!(layer.z_index, 3);
        assert!((layer.opacity - 1.0).abs() < f32::EPSILON);
        match &layer.kind {
            LayerKind::Text(text) => {
                assert_eq!(text.content, "Title");
                assert!((text.font_size - 72.0).abs() < f32::EPSILON);
                assert_eq!(text.text_align, TextAlign::Left);
                assert_eq!(text.font_family, "Arial");
            }
            other => panic!("expected text layer, got {other:?}"),
        }
    }

    #[test]
    fn test_create_never_zero_sized() {
        let template = LayerTemplate::at(0.0, 0.0, 0.0, 0.0);
        let layer = Layer::create(LayerType::Shape, &template, None, 0);
        assert!(layer.width > 0.0);
        assert!(layer.height > 0.0);
        assert_eq!(layer.geometry(), NormalizedRect::new(10.0, 10.0, 30.0, 10.0));
    }

    #[test]
    fn test_create_variants_have_disjoint_defaults() {
        let template = LayerTemplate::default();
        let image = Layer::create(LayerType::Image, &template, Some("data:image/png;base64,AA"), 0);
        let shape = Layer::create(LayerType::Shape, &template, Some("ignored"), 0);
        let text = Layer::create(LayerType::Text, &template, None, 0);

        match image.kind {
            LayerKind::Image(img) => {
                assert_eq!(img.src, "data:image/png;base64,AA");
                assert_eq!(img.object_fit, ObjectFit::Contain);
                assert!(img.prompt.is_some());
            }
            other => panic!("expected image, got {other:?}"),
        }
        match shape.kind {
            LayerKind::Shape(s) => {
                assert_eq!(s.shape_type, ShapeKind::Rectangle);
                assert_eq!(s.fill_color, "#6366f1");
            }
            other => panic!("expected shape, got {other:?}"),
        }
        match text.kind {
            LayerKind::Text(t) => assert_eq!(t.content, "New Text"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_create_from_unknown_tag_fails() {
        let err = Layer::create_from_tag("video", &LayerTemplate::default(), None, 0)
            .expect_err("unknown tag");
        assert!(matches!(err, DeckError::UnknownLayerType(tag) if tag == "video"));
    }

    #[test]
    fn test_apply_patch_returns_new_record() {
        let layer = Layer::create(LayerType::Text, &LayerTemplate::default(), Some("a"), 0);
        let patch = LayerPatch {
            content: Some("b".to_string()),
            rotation: Some(-90.0),
            fill_color: Some("#ff0000".to_string()),
            ..LayerPatch::position(5.0, 6.0)
        };
        let next = layer.apply_patch(&patch);

        assert!((layer.x - 10.0).abs() < f32::EPSILON);
        assert!((next.x - 5.0).abs() < f32::EPSILON);
        assert!((next.y - 6.0).abs() < f32::EPSILON);
        assert!((next.rotation - 270.0).abs() < f32::EPSILON);
        assert_eq!(next.id, layer.id);
        match next.kind {
            LayerKind::Text(t) => assert_eq!(t.content, "b"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_serde_uses_type_tag_and_camel_case() {
        let layer = Layer::create(LayerType::Shape, &LayerTemplate::default(), None, 4)
            .with_id("layer-2");
        let json = serde_json::to_value(&layer).expect("serialize");
        assert_eq!(json["type"], "shape");
        assert_eq!(json["zIndex"], 4);
        assert_eq!(json["shapeType"], "rectangle");
        assert_eq!(json["id"], "layer-2");

        let back: Layer = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, layer);
    }

    #[test]
    fn test_deserialize_persisted_text_layer() {
        let json = r##"{
            "id": "layer-1", "type": "text",
            "x": 10, "y": 10, "width": 80, "height": 15,
            "rotation": 0, "opacity": 1, "zIndex": 1,
            "content": "Hello", "fontSize": 60, "textAlign": "center",
            "color": "#000000", "fontFamily": "Arial"
        }"##;
        let layer: Layer = serde_json::from_str(json).expect("deserialize");
        assert_eq!(layer.layer_type(), LayerType::Text);
        assert_eq!(layer.id.as_str(), "layer-1");
    }

    #[test]
    fn test_filters_identity() {
        assert!(ImageFilters::default().is_identity());
        let sepia = ImageFilters {
            sepia: 0.5,
            ..ImageFilters::default()
        };
        assert!(!sepia.is_identity());
    }
}

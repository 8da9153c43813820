//! Presentations - the whole document: slides, settings and history logs.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::BoundingBox;
use crate::layer::{Layer, LayerId, LayerPatch};
use crate::slide::Slide;
use crate::{DeckError, DeckResult};

/// Current document schema version.
pub const SCHEMA_VERSION: &str = "1.0";

/// Current time in milliseconds since the Unix epoch.
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Slide aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// Widescreen.
    #[default]
    #[serde(rename = "16:9")]
    Widescreen,
    /// Standard.
    #[serde(rename = "4:3")]
    Standard,
    /// Square.
    #[serde(rename = "1:1")]
    Square,
    /// Portrait widescreen.
    #[serde(rename = "9:16")]
    PortraitWidescreen,
    /// Portrait standard.
    #[serde(rename = "3:4")]
    PortraitStandard,
}

impl AspectRatio {
    /// Width and height ratio terms.
    #[must_use]
    pub fn terms(self) -> (u32, u32) {
        match self {
            Self::Widescreen => (16, 9),
            Self::Standard => (4, 3),
            Self::Square => (1, 1),
            Self::PortraitWidescreen => (9, 16),
            Self::PortraitStandard => (3, 4),
        }
    }

    /// Bounding box of a slide rendered `width` units wide.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds_for_width(self, width: f32) -> BoundingBox {
        let (w, h) = self.terms();
        BoundingBox::new(width, width * h as f32 / w as f32)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.terms();
        write!(f, "{w}:{h}")
    }
}

/// Document-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationSettings {
    /// Slide aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Font used when a text layer names none.
    pub default_font: String,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            default_font: "Arial".to_string(),
        }
    }
}

/// Versioning stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    /// Schema version the document was written with.
    pub version: String,
    /// When the document was last migrated (ms since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated_at: Option<u64>,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            migrated_at: None,
        }
    }
}

/// Artifact formats recorded in the export history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Raster snapshot.
    Png,
    /// Fixed-page document.
    Pdf,
    /// Native slide deck.
    Pptx,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Pptx => "pptx",
        }
    }
}

/// One entry in the export history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    /// Record identifier.
    pub id: String,
    /// Artifact format.
    pub format: ExportFormat,
    /// When the export finished (ms since epoch).
    pub timestamp: u64,
    /// Whether the artifact was delivered.
    pub success: bool,
    /// Artifact size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl ExportRecord {
    /// Record a delivered artifact.
    #[must_use]
    pub fn succeeded(format: ExportFormat, file_size: u64) -> Self {
        Self {
            id: format!("export-{}", Uuid::new_v4().simple()),
            format,
            timestamp: current_timestamp_ms(),
            success: true,
            file_size: Some(file_size),
        }
    }

    /// Record a failed export.
    #[must_use]
    pub fn failed(format: ExportFormat) -> Self {
        Self {
            id: format!("export-{}", Uuid::new_v4().simple()),
            format,
            timestamp: current_timestamp_ms(),
            success: false,
            file_size: None,
        }
    }
}

/// Kind of request sent to a content producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiRequestType {
    /// Text generation.
    Text,
    /// Image generation.
    Image,
    /// Frame sampling and analysis of a video.
    VideoAnalysis,
}

/// One entry in the AI interaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiInteraction {
    /// Entry identifier.
    pub id: String,
    /// Provider name.
    pub provider: String,
    /// Request kind.
    pub request_type: AiRequestType,
    /// Prompt sent.
    pub prompt: String,
    /// Raw response.
    pub response: serde_json::Value,
    /// Cost reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// When the interaction happened (ms since epoch).
    pub timestamp: u64,
}

/// A slide deck document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    /// Unique identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Visual theme name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Purpose name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Slides in document order.
    pub slides: Vec<Slide>,
    /// Global settings.
    #[serde(default)]
    pub global_settings: PresentationSettings,
    /// Versioning stamp.
    #[serde(default)]
    pub version_info: VersionInfo,
    /// Creation time (ms since epoch).
    #[serde(default)]
    pub created_at: u64,
    /// Last update time (ms since epoch).
    #[serde(default)]
    pub updated_at: u64,
    /// AI interaction log.
    #[serde(default)]
    pub ai_interaction_history: Vec<AiInteraction>,
    /// Export log.
    #[serde(default)]
    pub export_history: Vec<ExportRecord>,
}

impl Presentation {
    /// Create an empty presentation.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let now = current_timestamp_ms();
        Self {
            id: format!("pres-{}", Uuid::new_v4().simple()),
            title: title.into(),
            description: String::new(),
            theme: None,
            purpose: None,
            slides: Vec::new(),
            global_settings: PresentationSettings::default(),
            version_info: VersionInfo::default(),
            created_at: now,
            updated_at: now,
            ai_interaction_history: Vec::new(),
            export_history: Vec::new(),
        }
    }

    /// Append a slide.
    #[must_use]
    pub fn with_slide(mut self, slide: Slide) -> Self {
        self.slides.push(slide);
        self
    }

    /// Set the aspect ratio.
    #[must_use]
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.global_settings.aspect_ratio = ratio;
        self
    }

    /// File stem used for whole-document artifacts.
    #[must_use]
    pub fn file_stem(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() {
            "presentation"
        } else {
            title
        }
    }

    /// Borrow a slide by index.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::SlideNotFound`] if `index` is out of range.
    pub fn slide(&self, index: usize) -> DeckResult<&Slide> {
        self.slides.get(index).ok_or(DeckError::SlideNotFound {
            index,
            count: self.slides.len(),
        })
    }

    /// Find a layer anywhere in the document.
    #[must_use]
    pub fn find_layer(&self, id: &LayerId) -> Option<(usize, &Layer)> {
        self.slides
            .iter()
            .enumerate()
            .find_map(|(index, slide)| slide.layer(id).map(|layer| (index, layer)))
    }

    /// Produce a new document with one layer patched.
    ///
    /// The slide is located by index and the layer by id within it.
    ///
    /// # Errors
    ///
    /// Returns an error if the slide or the layer does not exist.
    pub fn with_layer_updated(
        &self,
        slide_index: usize,
        layer_id: &LayerId,
        patch: &LayerPatch,
    ) -> DeckResult<Self> {
        let slide = self.slide(slide_index)?.with_layer_patched(layer_id, patch)?;
        Ok(self.with_slide_replaced(slide_index, slide))
    }

    /// Produce a new document with a layer appended to a slide.
    ///
    /// # Errors
    ///
    /// Returns an error if the slide does not exist or the id is taken.
    pub fn with_layer_added(&self, slide_index: usize, layer: Layer) -> DeckResult<Self> {
        if self.find_layer(&layer.id).is_some() {
            return Err(DeckError::InvalidOperation(format!(
                "duplicate layer id {}",
                layer.id
            )));
        }
        let slide = self.slide(slide_index)?.clone().with_layer(layer);
        Ok(self.with_slide_replaced(slide_index, slide))
    }

    /// Produce a new document with a layer removed from a slide.
    ///
    /// # Errors
    ///
    /// Returns an error if the slide or the layer does not exist.
    pub fn with_layer_removed(&self, slide_index: usize, layer_id: &LayerId) -> DeckResult<Self> {
        let slide = self.slide(slide_index)?.without_layer(layer_id)?;
        Ok(self.with_slide_replaced(slide_index, slide))
    }

    fn with_slide_replaced(&self, slide_index: usize, slide: Slide) -> Self {
        let mut next = self.clone();
        next.slides[slide_index] = slide;
        next.updated_at = current_timestamp_ms();
        next
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> DeckResult<String> {
        serde_json::to_string_pretty(self).map_err(DeckError::Serialization)
    }

    /// Deserialize a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the schema or layer ids
    /// are not unique.
    pub fn from_json(json: &str) -> DeckResult<Self> {
        let presentation: Self = serde_json::from_str(json)?;
        presentation.check_unique_ids()?;
        Ok(presentation)
    }

    fn check_unique_ids(&self) -> DeckResult<()> {
        let mut seen = std::collections::HashSet::new();
        for layer in self.slides.iter().flat_map(|s| s.layers.iter()) {
            if !seen.insert(layer.id.as_str()) {
                return Err(DeckError::InvalidOperation(format!(
                    "duplicate layer id {}",
                    layer.id
                )));
            }
        }
        Ok(())
    }
}

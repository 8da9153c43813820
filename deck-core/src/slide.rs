//! Slides - an ordered set of layers over a background.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::layer::{Layer, LayerId, LayerPatch, LayerTemplate, LayerType};
use crate::layout::LayoutTemplate;
use crate::{DeckError, DeckResult};

/// Default slide background.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Unique identifier for a slide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(String);

impl SlideId {
    /// Generate a fresh slide identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("slide-{}", Uuid::new_v4().simple()))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SlideId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A slide background: a flat colour or an image reference.
///
/// Persisted as a single string; anything that looks like a CSS colour is a
/// colour, everything else is treated as an image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Background {
    /// CSS colour string.
    Color(String),
    /// Image source (data URI, path or URL).
    Image(String),
}

impl Background {
    /// The colour, if this is a colour background.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        match self {
            Self::Color(c) => Some(c),
            Self::Image(_) => None,
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::Color(DEFAULT_BACKGROUND.to_string())
    }
}

impl From<String> for Background {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        let lower = trimmed.to_ascii_lowercase();
        let looks_like_color = trimmed.is_empty()
            || trimmed.starts_with('#')
            || lower.starts_with("rgb")
            || lower.starts_with("hsl")
            || lower.chars().all(|c| c.is_ascii_alphabetic());
        if trimmed.is_empty() {
            Self::default()
        } else if looks_like_color {
            Self::Color(trimmed.to_string())
        } else {
            Self::Image(trimmed.to_string())
        }
    }
}

impl From<&str> for Background {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Background> for String {
    fn from(value: Background) -> Self {
        match value {
            Background::Color(s) | Background::Image(s) => s,
        }
    }
}

/// A single slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// Unique identifier.
    pub id: SlideId,
    /// Slide title.
    pub title: String,
    /// Layers in sequence order (not paint order).
    pub layers: Vec<Layer>,
    /// Background colour or image.
    #[serde(default)]
    pub background: Background,
    /// Speaker notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Slide {
    /// Create an empty slide with a white background.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: SlideId::generate(),
            title: title.into(),
            layers: Vec::new(),
            background: Background::default(),
            notes: None,
        }
    }

    /// Create a slide with one layer per role of a layout template.
    ///
    /// The `image` role becomes an image layer; every other role becomes a
    /// text layer. Stacking follows role declaration order.
    #[must_use]
    pub fn from_layout(title: impl Into<String>, layout: &LayoutTemplate) -> Self {
        let mut slide = Self::new(title);
        for (z, (role, placement)) in (0_i32..).zip(layout.roles()) {
            let layer_type = if role == "image" {
                LayerType::Image
            } else {
                LayerType::Text
            };
            let content = match layer_type {
                LayerType::Image => None,
                _ => Some(role),
            };
            slide
                .layers
                .push(Layer::create(layer_type, placement, content, z));
        }
        slide
    }

    /// Set the background.
    #[must_use]
    pub fn with_background(mut self, background: impl Into<Background>) -> Self {
        self.background = background.into();
        self
    }

    /// Append a layer.
    #[must_use]
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Set speaker notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Layers in paint order: `(z_index, sequence index)` ascending.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&Layer> {
        let mut ordered: Vec<&Layer> = self.layers.iter().collect();
        // sort_by_key is stable, so equal z-indices keep sequence order
        ordered.sort_by_key(|layer| layer.z_index);
        ordered
    }

    /// Find a layer by id.
    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| &layer.id == id)
    }

    /// One greater than the highest stacking index on the slide.
    #[must_use]
    pub fn next_z_index(&self) -> i32 {
        self.layers
            .iter()
            .map(|layer| layer.z_index)
            .max()
            .map_or(0, |z| z.saturating_add(1))
    }

    /// Produce a new slide with the identified layer patched.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::LayerNotFound`] if no layer has `id`.
    pub fn with_layer_patched(&self, id: &LayerId, patch: &LayerPatch) -> DeckResult<Self> {
        let index = self
            .layers
            .iter()
            .position(|layer| &layer.id == id)
            .ok_or_else(|| DeckError::LayerNotFound(id.to_string()))?;

        let mut next = self.clone();
        next.layers[index] = self.layers[index].apply_patch(patch);
        Ok(next)
    }

    /// Produce a new slide without the identified layer.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::LayerNotFound`] if no layer has `id`.
    pub fn without_layer(&self, id: &LayerId) -> DeckResult<Self> {
        if self.layer(id).is_none() {
            return Err(DeckError::LayerNotFound(id.to_string()));
        }
        let mut next = self.clone();
        next.layers.retain(|layer| &layer.id != id);
        Ok(next)
    }

    /// Create a layer from a template with the next free stacking index.
    #[must_use]
    pub fn new_layer(
        &self,
        layer_type: LayerType,
        template: &LayerTemplate,
        content: Option<&str>,
    ) -> Layer {
        Layer::create(layer_type, template, content, self.next_z_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout;
    use proptest::prelude::*;

    fn shape_with_z(id: &str, z: i32) -> Layer {
        Layer::create(LayerType::Shape, &LayerTemplate::default(), None, z).with_id(id)
    }

    #[test]
    fn test_paint_order_sorts_by_z_then_sequence() {
        let slide = Slide::new("s")
            .with_layer(shape_with_z("a", 2))
            .with_layer(shape_with_z("b", 0))
            .with_layer(shape_with_z("c", 2))
            .with_layer(shape_with_z("d", -1));

        let order: Vec<&str> = slide.paint_order().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(order, vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn test_background_classification() {
        assert_eq!(Background::from("#fff"), Background::Color("#fff".into()));
        assert_eq!(
            Background::from("rgb(1,2,3)"),
            Background::Color("rgb(1,2,3)".into())
        );
        assert_eq!(Background::from("white"), Background::Color("white".into()));
        assert_eq!(
            Background::from("https://example.com/bg.png"),
            Background::Image("https://example.com/bg.png".into())
        );
        assert_eq!(Background::from(""), Background::default());
    }

    #[test]
    fn test_with_layer_patched_leaves_original_untouched() {
        let slide = Slide::new("s").with_layer(shape_with_z("a", 0));
        let id = LayerId::from("a");
        let next = slide
            .with_layer_patched(&id, &LayerPatch::position(50.0, 60.0))
            .expect("patched");

        assert!((slide.layers[0].x - 10.0).abs() < f32::EPSILON);
        assert!((next.layers[0].x - 50.0).abs() < f32::EPSILON);

        let missing = slide.with_layer_patched(&LayerId::from("zzz"), &LayerPatch::default());
        assert!(matches!(missing, Err(DeckError::LayerNotFound(_))));
    }

    #[test]
    fn test_from_layout_creates_layers_per_role() {
        let layout = layout::builtin("image_right_text_left").expect("builtin layout");
        let slide = Slide::from_layout("Intro", &layout);
        assert_eq!(slide.layers.len(), 2);
        assert_eq!(slide.layers[0].layer_type(), LayerType::Text);
        assert_eq!(slide.layers[1].layer_type(), LayerType::Image);
        assert_eq!(slide.layers[1].z_index, 1);
        assert!((slide.layers[1].x - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_next_z_index() {
        let slide = Slide::new("s");
        assert_eq!(slide.next_z_index(), 0);
        let slide = slide.with_layer(shape_with_z("a", 7));
        assert_eq!(slide.next_z_index(), 8);
    }

    proptest! {
        #[test]
        fn prop_paint_order_is_total_and_stable(zs in proptest::collection::vec(-5i32..5, 0..40)) {
            let mut slide = Slide::new("p");
            for (i, z) in zs.iter().enumerate() {
                slide.layers.push(shape_with_z(&i.to_string(), *z));
            }

            let order: Vec<(i32, usize)> = slide
                .paint_order()
                .iter()
                .map(|l| (l.z_index, l.id.as_str().parse::<usize>().unwrap_or(usize::MAX)))
                .collect();

            for pair in order.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }

            let again: Vec<&str> = slide.paint_order().iter().map(|l| l.id.as_str()).collect();
            let first: Vec<&str> = slide.paint_order().iter().map(|l| l.id.as_str()).collect();
            prop_assert_eq!(again, first);
        }
    }
}

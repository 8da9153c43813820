//! Content producers: text, image and frame sources.
//!
//! Producers are external collaborators. The deck only consumes what they
//! return and turns it into layers and slides.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geometry::NormalizedRect;
use crate::layer::{Layer, LayerKind, LayerTemplate, LayerType};
use crate::slide::Slide;
use crate::DeckResult;

/// Token accounting reported by a text producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Prompt tokens.
    pub prompt_tokens: u32,
    /// Completion tokens.
    pub completion_tokens: u32,
    /// Total tokens.
    pub total_tokens: u32,
}

/// Result of a text generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedText {
    /// Generated text.
    pub content: String,
    /// Token usage, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

impl GeneratedText {
    /// Turn the text into a text layer placed by `template`.
    #[must_use]
    pub fn into_layer(self, template: &LayerTemplate, z_index: i32) -> Layer {
        Layer::create(LayerType::Text, template, Some(&self.content), z_index)
    }
}

/// Result of an image generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    /// Image reference: a data URI or URL.
    pub image_url: String,
    /// Prompt as rewritten by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

impl GeneratedImage {
    /// Turn the image into an image layer, keeping the prompt as provenance.
    ///
    /// The revised prompt wins over the one that was sent.
    #[must_use]
    pub fn into_layer(self, prompt: &str, template: &LayerTemplate, z_index: i32) -> Layer {
        let mut layer = Layer::create(LayerType::Image, template, Some(&self.image_url), z_index);
        if let LayerKind::Image(image) = &mut layer.kind {
            image.prompt = Some(self.revised_prompt.unwrap_or_else(|| prompt.to_string()));
        }
        layer
    }
}

/// Generates text from a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text.
    async fn generate_text(&self, prompt: &str) -> DeckResult<GeneratedText>;
}

/// Generates an image from a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image.
    async fn generate_image(&self, prompt: &str) -> DeckResult<GeneratedImage>;
}

/// Samples still frames from a video.
#[async_trait]
pub trait FrameSampler: Send + Sync {
    /// Return up to `count` frame references in playback order.
    async fn sample_frames(&self, video: &str, count: usize) -> DeckResult<Vec<String>>;
}

/// Build one slide per frame with the frame as a full-bleed image.
#[must_use]
pub fn slides_from_frames(frames: &[String]) -> Vec<Slide> {
    let full_bleed = NormalizedRect::new(0.0, 0.0, 100.0, 100.0);
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let title = format!("Step {}", i + 1);
            let layer = Layer::create(LayerType::Image, &LayerTemplate::default(), Some(frame), 0)
                .with_geometry(full_bleed);
            Slide::new(title).with_layer(layer)
        })
        .collect()
}

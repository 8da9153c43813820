//! Image source resolution.
//!
//! Image layers reference their pixels as a data URI, a local file path or a
//! remote URL. Exporters resolve the reference to bytes here; remote URLs are
//! never fetched and resolve to [`RenderError::Resource`].

use std::path::Path;

use base64::Engine;

use crate::error::{RenderError, RenderResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF.
    Gif,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "gif" => Self::Gif,
            "webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/gif" => Self::Gif,
            "image/webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }

    /// MIME type for embedding.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png | Self::Unknown => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }

    /// File extension for package media parts.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png | Self::Unknown => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }
}

/// Encoded image bytes with their detected format.
#[derive(Debug, Clone)]
pub struct ImageBytes {
    /// Encoded bytes.
    pub data: Vec<u8>,
    /// Detected format.
    pub format: ImageFormat,
}

impl ImageBytes {
    fn new(data: Vec<u8>, hint: ImageFormat) -> Self {
        let format = match ImageFormat::from_magic_bytes(&data) {
            ImageFormat::Unknown => hint,
            detected => detected,
        };
        Self { data, format }
    }

    /// Re-encode as a base64 data URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{encoded}", self.format.mime())
    }
}

/// Decoded pixels ready for embedding.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub data: Vec<u8>,
    /// Original format of the image.
    pub format: ImageFormat,
}

impl DecodedImage {
    /// Split into packed RGB and alpha planes.
    #[must_use]
    pub fn split_alpha(&self) -> (Vec<u8>, Vec<u8>) {
        let pixels = self.data.len() / 4;
        let mut rgb = Vec::with_capacity(pixels * 3);
        let mut alpha = Vec::with_capacity(pixels);
        for px in self.data.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
            alpha.push(px[3]);
        }
        (rgb, alpha)
    }

    /// Whether any pixel is not fully opaque.
    #[must_use]
    pub fn has_transparency(&self) -> bool {
        self.data.chunks_exact(4).any(|px| px[3] != 255)
    }
}

/// Whether `src` names a remote resource.
#[must_use]
pub fn is_remote(src: &str) -> bool {
    let lower = src.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Resolve an image reference to encoded bytes.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] for empty or remote sources, malformed
/// data URIs and unreadable files.
pub fn resolve_source(src: &str) -> RenderResult<ImageBytes> {
    let src = src.trim();
    if src.is_empty() {
        return Err(RenderError::Resource("Empty image source".to_string()));
    }
    if src.starts_with("data:") {
        return bytes_from_data_uri(src);
    }
    if is_remote(src) {
        return Err(RenderError::Resource(format!(
            "Remote images are not fetched: {src}"
        )));
    }

    let path = Path::new(src.strip_prefix("file://").unwrap_or(src));
    let data = std::fs::read(path)
        .map_err(|e| RenderError::Resource(format!("Failed to read {}: {e}", path.display())))?;
    let hint = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(ImageFormat::Unknown, ImageFormat::from_extension);
    Ok(ImageBytes::new(data, hint))
}

/// Decode a data URI to encoded bytes.
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...`
///
/// # Errors
///
/// Returns an error if the data URI is malformed.
pub fn bytes_from_data_uri(uri: &str) -> RenderResult<ImageBytes> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let mime = metadata.split(';').next().unwrap_or_default();
    let bytes = if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(encoded_data)?
    };

    Ok(ImageBytes::new(bytes, ImageFormat::from_mime(mime)))
}

/// Percent-decoding for non-base64 data URIs.
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

/// Decode encoded bytes to RGBA pixels.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn decode(bytes: &ImageBytes) -> RenderResult<DecodedImage> {
    let img = image::load_from_memory(&bytes.data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        width,
        height,
        data: rgba.into_raw(),
        format: bytes.format,
    })
}

/// Resolve and decode in one step.
///
/// # Errors
///
/// Returns an error if the source cannot be resolved or decoded.
pub fn load(src: &str) -> RenderResult<DecodedImage> {
    decode(&resolve_source(src)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A 1x1 red PNG.
    pub(crate) const RED_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_format_detection_from_extension() {
        assert_eq!(ImageFormat::from_extension("PNG"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_extension("jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("bmp"), ImageFormat::Unknown);
    }

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
    }

    #[test]
    fn test_data_uri_decodes() {
        let uri = format!("data:image/png;base64,{RED_PIXEL_PNG}");
        let image = load(&uri).expect("valid data uri");
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.format, ImageFormat::Png);
        let (rgb, alpha) = image.split_alpha();
        assert_eq!(rgb.len(), 3);
        assert_eq!(alpha, vec![255]);
    }

    #[test]
    fn test_invalid_sources() {
        assert!(resolve_source("").is_err());
        assert!(resolve_source("data:image/png").is_err());
        assert!(resolve_source("https://example.com/cat.png").is_err());
        assert!(resolve_source("/definitely/not/here.png").is_err());
        assert!(load("data:image/png;base64,AAAA").is_err());
    }

    #[test]
    fn test_percent_encoded_uri() {
        let bytes = bytes_from_data_uri("data:text/plain,a%20b").expect("decoded");
        assert_eq!(bytes.data, b"a b");
        assert!(bytes_from_data_uri("data:text/plain,%zz").is_err());
    }

    #[test]
    fn test_round_trip_data_uri() {
        let uri = format!("data:image/png;base64,{RED_PIXEL_PNG}");
        let bytes = resolve_source(&uri).expect("resolved");
        assert_eq!(bytes.to_data_uri(), uri);
    }
}

//! # Deck Core
//!
//! Document model and geometry for composing slide decks from positioned
//! layers. No I/O: rendering and export live in `deck-renderer`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  deck-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Layer Model      │  Geometry Engine        │
//! │  - Presentation   │  - Percent <-> absolute │
//! │  - Slides         │  - Rotation wrap        │
//! │  - Text/Image/    │  - Drag/resize/rotate   │
//! │    Shape layers   │    gestures             │
//! ├─────────────────────────────────────────────┤
//! │  Editor State     │  Producers              │
//! │  - Pure reducer   │  - Text/image/frames    │
//! │  - Selection      │  - Layout templates     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Layer geometry is always stored as percentages of the slide. Absolute
//! units are derived per target and never persisted.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod layout;
pub mod manipulation;
pub mod presentation;
pub mod producer;
pub mod slide;
pub mod state;

pub use config::{ProviderConfig, ProviderKind};
pub use error::{DeckError, DeckResult};
pub use geometry::{
    denormalize, normalize, normalize_rotation, px_to_pt, AbsoluteRect, BoundingBox,
    NormalizedRect, Point, PX_TO_PT,
};
pub use layer::{
    ImageFilters, ImageLayer, Layer, LayerId, LayerKind, LayerPatch, LayerTemplate, LayerType,
    ObjectFit, ShapeKind, ShapeLayer, TextAlign, TextLayer,
};
pub use layout::{LayoutTemplate, BUILTIN_LAYOUTS};
pub use manipulation::{
    Gesture, GestureKind, MountedNode, MountedNodes, PreviewTransform, ResizeHandle, Selection,
};
pub use presentation::{
    AiInteraction, AiRequestType, AspectRatio, ExportFormat, ExportRecord, Presentation,
    PresentationSettings, VersionInfo,
};
pub use producer::{
    slides_from_frames, FrameSampler, GeneratedImage, GeneratedText, ImageGenerator,
    TextGenerator, TokenUsage,
};
pub use slide::{Background, Slide, SlideId};
pub use state::{CanvasView, EditorAction, EditorState};

/// Deck core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

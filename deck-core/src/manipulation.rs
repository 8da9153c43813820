//! Interactive manipulation: drag, resize and rotate gestures.
//!
//! A gesture is two-phase. While the pointer moves, [`Gesture::update`]
//! yields a [`PreviewTransform`] that a surface may apply to the mounted
//! node without touching the document. When the pointer is released,
//! [`Gesture::finish`] converts the final absolute box back to normalized
//! units and yields at most one [`LayerPatch`] for the owning layer.
//!
//! Gestures bind to exactly one selected layer. If the selection is empty,
//! holds several ids, or names a layer that is not mounted on the surface,
//! no gesture starts; that case is inert rather than an error.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::geometry::{normalize, normalize_rotation, AbsoluteRect, BoundingBox, Point};
use crate::layer::{LayerId, LayerPatch};

/// Smallest extent a resize may produce, in surface pixels.
pub const MIN_EXTENT_PX: f32 = 1.0;

/// Geometry of a layer as currently mounted on a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountedNode {
    /// Absolute box on the surface.
    pub rect: AbsoluteRect,
    /// Rotation in degrees.
    pub rotation: f32,
}

/// A rendered surface that can report where layers are mounted.
pub trait MountedNodes {
    /// Look up a mounted layer by id.
    fn mounted(&self, id: &LayerId) -> Option<MountedNode>;

    /// The surface's current bounding box.
    fn bounds(&self) -> BoundingBox;
}

/// The set of selected layer ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeSet<LayerId>);

impl Selection {
    /// An empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select exactly one layer.
    #[must_use]
    pub fn single(id: impl Into<LayerId>) -> Self {
        let mut set = BTreeSet::new();
        set.insert(id.into());
        Self(set)
    }

    /// The selected id when exactly one layer is selected.
    #[must_use]
    pub fn only(&self) -> Option<&LayerId> {
        if self.0.len() == 1 {
            self.0.iter().next()
        } else {
            None
        }
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: &LayerId) -> bool {
        self.0.contains(id)
    }

    /// Number of selected layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop `id` from the selection.
    pub fn remove(&mut self, id: &LayerId) {
        self.0.remove(id);
    }

    /// Iterate over selected ids.
    pub fn iter(&self) -> impl Iterator<Item = &LayerId> {
        self.0.iter()
    }
}

impl FromIterator<LayerId> for Selection {
    fn from_iter<T: IntoIterator<Item = LayerId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Which handle a resize gesture grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeHandle {
    /// Top edge.
    North,
    /// Bottom edge.
    South,
    /// Right edge.
    East,
    /// Left edge.
    West,
    /// Top-right corner.
    NorthEast,
    /// Top-left corner.
    NorthWest,
    /// Bottom-right corner.
    SouthEast,
    /// Bottom-left corner.
    SouthWest,
}

impl ResizeHandle {
    fn moves_left(self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::East | Self::NorthEast | Self::SouthEast)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::North | Self::NorthEast | Self::NorthWest)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::South | Self::SouthEast | Self::SouthWest)
    }
}

/// The kind of manipulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    /// Move the layer.
    Drag,
    /// Resize from a handle, pinning the opposite edge.
    Resize(ResizeHandle),
    /// Rotate about the layer's centre.
    Rotate,
}

/// Render-only transform applied to the mounted node during a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewTransform {
    /// Absolute box to show.
    pub rect: AbsoluteRect,
    /// Rotation in degrees, normalized.
    pub rotation: f32,
}

/// An in-progress manipulation of one layer.
#[derive(Debug, Clone)]
pub struct Gesture {
    layer_id: LayerId,
    kind: GestureKind,
    bounds: BoundingBox,
    origin: MountedNode,
    start: Point,
    preview: Option<PreviewTransform>,
}

impl Gesture {
    /// Start a gesture on the single selected layer.
    ///
    /// Returns `None` (inert) unless exactly one layer is selected, that
    /// layer is mounted, and the surface has a measurable bounding box.
    #[must_use]
    pub fn begin(
        kind: GestureKind,
        selection: &Selection,
        surface: &impl MountedNodes,
        pointer: Point,
    ) -> Option<Self> {
        let layer_id = selection.only()?;
        let Some(origin) = surface.mounted(layer_id) else {
            tracing::debug!("No mounted node for layer {layer_id}, gesture ignored");
            return None;
        };
        let bounds = surface.bounds();
        if !bounds.is_measurable() {
            tracing::debug!("Surface not measured yet, gesture ignored");
            return None;
        }

        tracing::debug!(layer = %layer_id, ?kind, "Gesture started");
        Some(Self {
            layer_id: layer_id.clone(),
            kind,
            bounds,
            origin,
            start: pointer,
            preview: None,
        })
    }

    /// The layer this gesture manipulates.
    #[must_use]
    pub fn layer_id(&self) -> &LayerId {
        &self.layer_id
    }

    /// The gesture kind.
    #[must_use]
    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    /// Feed a pointer position and get the transform to preview.
    pub fn update(&mut self, pointer: Point) -> PreviewTransform {
        let preview = match self.kind {
            GestureKind::Drag => self.drag(pointer),
            GestureKind::Resize(handle) => self.resize(handle, pointer),
            GestureKind::Rotate => self.rotate(pointer),
        };
        self.preview = Some(preview);
        preview
    }

    /// End the gesture and produce the single model update, if any.
    ///
    /// A gesture that never received an update commits nothing.
    #[must_use]
    pub fn finish(self) -> Option<(LayerId, LayerPatch)> {
        let preview = self.preview?;
        let patch = match self.kind {
            GestureKind::Drag => {
                let rect = normalize(preview.rect, self.bounds)?;
                LayerPatch::position(rect.x, rect.y)
            }
            GestureKind::Resize(_) => LayerPatch::geometry(normalize(preview.rect, self.bounds)?),
            GestureKind::Rotate => LayerPatch::rotation(preview.rotation),
        };
        tracing::debug!(layer = %self.layer_id, kind = ?self.kind, "Gesture committed");
        Some((self.layer_id, patch))
    }

    fn drag(&self, pointer: Point) -> PreviewTransform {
        let rect = AbsoluteRect {
            left: self.origin.rect.left + (pointer.x - self.start.x),
            top: self.origin.rect.top + (pointer.y - self.start.y),
            ..self.origin.rect
        };
        PreviewTransform {
            rect,
            rotation: self.origin.rotation,
        }
    }

    fn resize(&self, handle: ResizeHandle, pointer: Point) -> PreviewTransform {
        let dx = pointer.x - self.start.x;
        let dy = pointer.y - self.start.y;
        let from = self.origin.rect;

        let (left, width) = if handle.moves_left() {
            let width = (from.width - dx).max(MIN_EXTENT_PX);
            (from.right() - width, width)
        } else if handle.moves_right() {
            (from.left, (from.width + dx).max(MIN_EXTENT_PX))
        } else {
            (from.left, from.width)
        };

        let (top, height) = if handle.moves_top() {
            let height = (from.height - dy).max(MIN_EXTENT_PX);
            (from.bottom() - height, height)
        } else if handle.moves_bottom() {
            (from.top, (from.height + dy).max(MIN_EXTENT_PX))
        } else {
            (from.top, from.height)
        };

        PreviewTransform {
            rect: AbsoluteRect::new(left, top, width, height),
            rotation: self.origin.rotation,
        }
    }

    fn rotate(&self, pointer: Point) -> PreviewTransform {
        let center = self.origin.rect.center();
        let angle = |p: Point| (p.y - center.y).atan2(p.x - center.x).to_degrees();
        let delta = angle(pointer) - angle(self.start);
        PreviewTransform {
            rect: self.origin.rect,
            rotation: normalize_rotation(self.origin.rotation + delta),
        }
    }
}

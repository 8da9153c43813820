//! Editing Integration Tests
//!
//! Tests the editing flow end to end:
//! - Layout instantiation
//! - Gesture preview and commit through the editor reducer
//! - Document persistence

use deck_core::{
    denormalize, layout, AbsoluteRect, BoundingBox, EditorAction, EditorState, Gesture,
    GestureKind, LayerId, MountedNode, MountedNodes, Point, Presentation, ResizeHandle,
    Selection, Slide,
};

/// A surface that mounts every layer of one slide at a fixed size.
struct SlideSurface<'a> {
    slide: &'a Slide,
    bounds: BoundingBox,
}

impl MountedNodes for SlideSurface<'_> {
    fn mounted(&self, id: &LayerId) -> Option<MountedNode> {
        let layer = self.slide.layer(id)?;
        Some(MountedNode {
            rect: denormalize(layer.geometry(), self.bounds)?,
            rotation: layer.rotation,
        })
    }

    fn bounds(&self) -> BoundingBox {
        self.bounds
    }
}

fn editor() -> (EditorState, LayerId) {
    let layout = layout::builtin("title_and_content").expect("builtin layout");
    let slide = Slide::from_layout("Agenda", &layout);
    let title_id = slide.layers[0].id.clone();
    let pres = Presentation::new("Quarterly").with_slide(slide);
    (EditorState::with_presentation(pres), title_id)
}

fn rect_of(state: &EditorState, id: &LayerId, bounds: BoundingBox) -> AbsoluteRect {
    let layer = state.slide().and_then(|s| s.layer(id)).expect("layer");
    denormalize(layer.geometry(), bounds).expect("measurable")
}

// ============================================================================
// Gesture Commit Tests
// ============================================================================

#[test]
fn test_resize_commit_pins_opposite_edge() {
    let bounds = BoundingBox::new(1280.0, 720.0);
    let (state, id) = editor();
    let state = state.apply(EditorAction::Select(Selection::single(id.clone())));
    let before = rect_of(&state, &id, bounds);

    let gesture = {
        let surface = SlideSurface {
            slide: state.slide().expect("slide"),
            bounds,
        };
        let mut gesture = Gesture::begin(
            GestureKind::Resize(ResizeHandle::North),
            &state.selection,
            &surface,
            Point::new(before.center().x, before.top),
        )
        .expect("gesture");
        gesture.update(Point::new(before.center().x, before.top - 30.0));
        gesture.update(Point::new(before.center().x, before.top - 50.0));
        gesture
    };

    let (layer_id, patch) = gesture.finish().expect("commit");
    let state = state.apply(EditorAction::UpdateLayer {
        id: layer_id,
        patch,
    });
    let after = rect_of(&state, &id, bounds);

    assert!((after.bottom() - before.bottom()).abs() < 1e-2);
    assert!((after.top - (before.top - 50.0)).abs() < 1e-2);
    assert!((after.left - before.left).abs() < 1e-2);
    assert!(state.dirty);
}

#[test]
fn test_rotation_commit_is_normalized() {
    let bounds = BoundingBox::new(1000.0, 1000.0);
    let (state, id) = editor();
    let state = state.apply(EditorAction::Select(Selection::single(id.clone())));
    let center = rect_of(&state, &id, bounds).center();

    let surface = SlideSurface {
        slide: state.slide().expect("slide"),
        bounds,
    };
    let mut gesture = Gesture::begin(
        GestureKind::Rotate,
        &state.selection,
        &surface,
        Point::new(center.x + 100.0, center.y),
    )
    .expect("gesture");
    // half a turn counter-clockwise, then a little more
    gesture.update(Point::new(center.x - 100.0, center.y - 1.0));
    let (layer_id, patch) = gesture.finish().expect("commit");

    let state = state.apply(EditorAction::UpdateLayer {
        id: layer_id,
        patch,
    });
    let rotation = state.slide().and_then(|s| s.layer(&id)).expect("layer").rotation;
    assert!((0.0..360.0).contains(&rotation));
    assert!((rotation - 180.57).abs() < 0.1);
}

#[test]
fn test_gesture_is_inert_with_multi_selection() {
    let (state, id) = editor();
    let other = state.slide().expect("slide").layers[1].id.clone();
    let selection: Selection = [id, other].into_iter().collect();
    let surface = SlideSurface {
        slide: state.slide().expect("slide"),
        bounds: BoundingBox::new(800.0, 450.0),
    };
    assert!(Gesture::begin(GestureKind::Drag, &selection, &surface, Point::default()).is_none());
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[test]
fn test_edited_document_survives_json() {
    let (state, id) = editor();
    let state = state.apply(EditorAction::UpdateLayer {
        id: id.clone(),
        patch: deck_core::LayerPatch::rotation(-10.0),
    });
    let json = state.presentation.as_ref().expect("doc").to_json().expect("json");
    let back = Presentation::from_json(&json).expect("parse");
    let layer = back.slides[0].layer(&id).expect("layer");
    assert!((layer.rotation - 350.0).abs() < 1e-3);
}

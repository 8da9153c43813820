//! Editor state management.
//!
//! The whole editor session lives in one [`EditorState`] value. Every change
//! goes through [`EditorState::apply`], which consumes the old state and
//! returns the next one, so an export can hold a snapshot of the document
//! while editing continues.

use serde::{Deserialize, Serialize};

use crate::layer::{Layer, LayerId, LayerPatch};
use crate::manipulation::Selection;
use crate::presentation::{AiInteraction, ExportRecord, Presentation};
use crate::slide::Slide;

/// Viewport of the editing canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasView {
    /// Zoom factor.
    pub zoom: f32,
    /// Horizontal pan offset in pixels.
    pub offset_x: f32,
    /// Vertical pan offset in pixels.
    pub offset_y: f32,
    /// Grid spacing in pixels.
    pub grid_size: f32,
    /// Whether the grid is drawn.
    pub show_grid: bool,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            grid_size: 20.0,
            show_grid: false,
        }
    }
}

/// A state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    /// Replace the open document.
    LoadPresentation(Box<Presentation>),
    /// Show another slide.
    GoToSlide(usize),
    /// Replace the selection.
    Select(Selection),
    /// Clear the selection.
    ClearSelection,
    /// Merge a patch into a layer on the current slide.
    UpdateLayer {
        /// Target layer.
        id: LayerId,
        /// Fields to overlay.
        patch: LayerPatch,
    },
    /// Append a layer to the current slide.
    AddLayer(Box<Layer>),
    /// Remove a layer from the current slide.
    RemoveLayer(LayerId),
    /// Append a slide and show it.
    AddSlide(Box<Slide>),
    /// Append to the export history.
    RecordExport(ExportRecord),
    /// Append to the AI interaction history.
    RecordAiInteraction(Box<AiInteraction>),
    /// Clear the dirty flag.
    MarkSaved,
    /// Change the canvas viewport.
    SetView(CanvasView),
}

/// The complete editor state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorState {
    /// Open document, if any.
    pub presentation: Option<Presentation>,
    /// Index of the slide being edited.
    pub current_slide: usize,
    /// Selected layer ids on the current slide.
    pub selection: Selection,
    /// Canvas viewport.
    pub view: CanvasView,
    /// Whether there are unsaved changes.
    pub dirty: bool,
    /// Last rejected operation, for display.
    pub last_error: Option<String>,
}

impl EditorState {
    /// Create a session with a document open.
    #[must_use]
    pub fn with_presentation(presentation: Presentation) -> Self {
        Self {
            presentation: Some(presentation),
            ..Self::default()
        }
    }

    /// The slide being edited.
    #[must_use]
    pub fn slide(&self) -> Option<&Slide> {
        self.presentation
            .as_ref()
            .and_then(|p| p.slides.get(self.current_slide))
    }

    /// Apply an action and return the next state.
    #[must_use]
    pub fn apply(mut self, action: EditorAction) -> Self {
        match action {
            EditorAction::LoadPresentation(presentation) => {
                return Self::with_presentation(*presentation);
            }
            EditorAction::GoToSlide(index) => {
                let count = self.presentation.as_ref().map_or(0, |p| p.slides.len());
                if index < count {
                    self.current_slide = index;
                    self.selection = Selection::new();
                } else {
                    tracing::debug!("Ignoring slide index {index} (slide_count={count})");
                }
            }
            EditorAction::Select(selection) => self.selection = selection,
            EditorAction::ClearSelection => self.selection = Selection::new(),
            EditorAction::UpdateLayer { id, patch } => {
                let index = self.current_slide;
                self = self.edit(|p| p.with_layer_updated(index, &id, &patch));
            }
            EditorAction::AddLayer(layer) => {
                let index = self.current_slide;
                self = self.edit(|p| p.with_layer_added(index, *layer));
            }
            EditorAction::RemoveLayer(id) => {
                let index = self.current_slide;
                self.selection.remove(&id);
                self = self.edit(|p| p.with_layer_removed(index, &id));
            }
            EditorAction::AddSlide(slide) => {
                if let Some(presentation) = self.presentation.take() {
                    let presentation = presentation.with_slide(*slide);
                    self.current_slide = presentation.slides.len() - 1;
                    self.presentation = Some(presentation);
                    self.selection = Selection::new();
                    self.dirty = true;
                }
            }
            EditorAction::RecordExport(record) => {
                if let Some(p) = self.presentation.as_mut() {
                    p.export_history.push(record);
                }
            }
            EditorAction::RecordAiInteraction(entry) => {
                if let Some(p) = self.presentation.as_mut() {
                    p.ai_interaction_history.push(*entry);
                    self.dirty = true;
                }
            }
            EditorAction::MarkSaved => self.dirty = false,
            EditorAction::SetView(view) => self.view = view,
        }
        self
    }

    /// Swap in an edited document, or keep the current one and note why not.
    fn edit(
        mut self,
        f: impl FnOnce(&Presentation) -> crate::DeckResult<Presentation>,
    ) -> Self {
        let Some(current) = self.presentation.as_ref() else {
            tracing::debug!("No presentation open, edit ignored");
            return self;
        };
        match f(current) {
            Ok(next) => {
                self.presentation = Some(next);
                self.dirty = true;
                self.last_error = None;
            }
            Err(e) => {
                tracing::debug!("Edit ignored: {e}");
                self.last_error = Some(e.to_string());
            }
        }
        self
    }
}

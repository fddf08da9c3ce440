//! The editor controller.
//!
//! [`Editor`] is the single owner of the annotation state: the object store
//! with its history, the viewport, the ephemeral [`EditState`] and the tool
//! handlers. Hosts feed it pointer events and named commands, then call
//! [`Editor::redraw`] to repaint.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use annotator::{Editor, EditorConfig};
//!
//! let mut editor = Editor::new(EditorConfig::default());
//! editor.load_image(natural, container, &annotations)?;
//! editor.pointer_down(press);
//! editor.pointer_up(release);
//! let layers = editor.redraw();
//! ```

mod ai;
mod commands;
mod router;

#[cfg(test)]
mod tests;

use image::RgbaImage;
use web_time::Instant;

use crate::ai::{AiTrigger, ImageSource};
use crate::color::Rgb;
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::format::{persisted_to_objects, AutoSave, AutoSaveCallback, PersistedAnnotation};
use crate::model::{
    find_category, Category, DrawData, EditState, EditorTool, LabelId, ModelKind, ObjectType,
    Point, Size, SubTool,
};
use crate::render::{redraw_layers, RenderLayers, Scene};
use crate::store::ObjectStore;
use crate::tools::{ObjectBasics, ToolContext, ToolEffect, ToolSet};
use crate::viewport::{AutoScroll, Viewport, ZoomDirection};

/// Which phase owns the current pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Gesture {
    #[default]
    Idle,
    Panning,
    Creating(ObjectType),
    Editing(ObjectType),
}

/// Annotation editor for one image at a time.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    store: ObjectStore,
    viewport: Viewport,
    autoscroll: AutoScroll,
    edit: EditState,
    tools: ToolSet,
    gesture: Gesture,
    /// Pan key held by the host
    pan_key: bool,
    /// Image reference sent with requests that have no session
    image_source: ImageSource,
    /// Pixels of the current image, when the host provides them
    image: Option<RgbaImage>,
    /// AI request asked for by a tool, waiting for the host
    pending_ai: Option<AiTrigger>,
    /// Rejected commits since the host last looked
    warnings: Vec<EditorError>,
    layers: Option<RenderLayers>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Create an editor with no image loaded.
    pub fn new(config: EditorConfig) -> Self {
        let mut store = ObjectStore::new(config.history.to_history_config());
        store.set_categories(config.categories.clone());
        let viewport = Viewport::with_scale_limits(config.zoom.min_scale, config.zoom.max_scale);
        Self {
            config,
            store,
            viewport,
            autoscroll: AutoScroll::default(),
            edit: EditState::default(),
            tools: ToolSet::new(),
            gesture: Gesture::Idle,
            pan_key: false,
            image_source: ImageSource::default(),
            image: None,
            pending_ai: None,
            warnings: Vec::new(),
            layers: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn data(&self) -> &DrawData {
        self.store.data()
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn categories(&self) -> &[Category] {
        self.store.categories()
    }

    /// True while an AI request is in flight.
    pub fn is_requiring(&self) -> bool {
        self.edit.is_requiring
    }

    /// True when an image is loaded.
    pub fn has_image(&self) -> bool {
        !self.store.natural_size().is_empty()
    }

    /// Committed objects in persisted form.
    pub fn persisted(&self) -> Vec<PersistedAnnotation> {
        self.store.persisted()
    }

    /// AI request a tool asked for, if any. The host passes it to
    /// [`Editor::begin_ai_request`] or [`Editor::run_ai_request`].
    pub fn take_pending_ai(&mut self) -> Option<AiTrigger> {
        self.pending_ai.take()
    }

    /// Commits rejected since the last call.
    pub fn take_warnings(&mut self) -> Vec<EditorError> {
        std::mem::take(&mut self.warnings)
    }

    // ========================================================================
    // Image Session
    // ========================================================================

    /// Start a session on a new image.
    ///
    /// Draw data, edit state and history are reset; the image is fitted into
    /// `container` and the persisted annotations become committed objects.
    pub fn load_image(
        &mut self,
        natural: Size,
        container: Size,
        annotations: &[PersistedAnnotation],
    ) -> EditorResult<()> {
        if natural.is_empty() {
            return Err(EditorError::NoImage);
        }
        self.viewport.fit(natural, container, self.config.padding);
        let client = self.viewport.client_size();
        let objects = persisted_to_objects(annotations, self.store.categories(), client, natural);
        let data = DrawData {
            objects,
            brush_size: self.config.tools.brush_size,
            point_resolution: self.config.tools.point_resolution,
            ..Default::default()
        };

        self.edit = EditState::default();
        self.autoscroll.stop();
        self.gesture = Gesture::Idle;
        self.pending_ai = None;
        self.warnings.clear();
        self.image = None;
        self.store.reset(data, natural, client);
        log::info!(
            "Loaded {}x{} image with {} annotations",
            natural.width,
            natural.height,
            self.store.data().objects.len()
        );
        Ok(())
    }

    /// Provide the image pixels drawn by the image layer.
    pub fn set_image_pixels(&mut self, image: RgbaImage) {
        self.image = Some(image);
    }

    /// Image reference sent with requests that carry no session.
    pub fn set_image_source(&mut self, source: ImageSource) {
        self.image_source = source;
    }

    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.store.set_categories(categories);
    }

    /// Install the hook that receives annotations after every history push.
    pub fn set_auto_save(&mut self, callback: AutoSaveCallback) {
        self.store.set_auto_save(Some(AutoSave::new(callback)));
    }

    pub fn clear_auto_save(&mut self) {
        self.store.set_auto_save(None);
    }

    // ========================================================================
    // Tool Selection
    // ========================================================================

    /// Switch tools. Anything being drawn is dropped.
    pub fn select_tool(&mut self, tool: EditorTool) {
        let ai = self.store.data().ai_annotation;
        let data = self.store.data_mut();
        if data.selected_tool == tool {
            return;
        }
        data.selected_tool = tool;
        data.selected_sub_tool = tool.default_sub_tool(ai);
        data.creating = None;
        data.active_object_index = None;
        data.prompt.creating_prompt = None;
        self.edit.clear_drag();
        self.gesture = Gesture::Idle;
        log::debug!("Tool: {}", tool.name());
    }

    pub fn select_sub_tool(&mut self, sub_tool: SubTool) {
        self.store.data_mut().selected_sub_tool = sub_tool;
    }

    /// Choose the model a tool uses in AI mode.
    pub fn select_model(&mut self, tool: EditorTool, model: ModelKind) {
        self.store.data_mut().selected_model.set(tool, model);
    }

    /// Turn AI-assisted annotation on or off.
    pub fn set_ai_annotation(&mut self, enabled: bool) {
        let data = self.store.data_mut();
        data.ai_annotation = enabled;
        data.selected_sub_tool = data.selected_tool.default_sub_tool(enabled);
        log::debug!("🤖 AI annotation: {}", enabled);
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.store.data_mut().brush_size = size.max(1.0);
    }

    pub fn set_point_resolution(&mut self, resolution: f32) {
        self.store.data_mut().point_resolution = resolution;
    }

    /// Label given to objects created from now on.
    pub fn set_current_label(&mut self, label_id: Option<LabelId>) {
        self.edit.latest_label_id = label_id;
    }

    /// Hold or release the pan key.
    pub fn set_pan_key(&mut self, held: bool) {
        self.pan_key = held;
        self.edit.allow_move = held;
    }

    /// Label and color for a new object.
    fn object_basics(&self) -> ObjectBasics {
        let label_id = self.edit.latest_label_id;
        let color = label_id
            .and_then(|id| find_category(self.store.categories(), id))
            .map_or(Rgb::WHITE, |c| c.color);
        ObjectBasics { label_id, color }
    }

    // ========================================================================
    // Viewport
    // ========================================================================

    /// Zoom around `anchor` (container coordinates) or the container center.
    pub fn zoom(&mut self, direction: ZoomDirection, step: f32, anchor: Option<Point>) {
        self.viewport.zoom(direction, step, anchor);
        self.store.rescale_to(self.viewport.client_size());
    }

    /// One zoom-button step.
    pub fn zoom_button(&mut self, direction: ZoomDirection) {
        self.zoom(direction, self.config.zoom.button_step, None);
    }

    /// One wheel notch at the cursor.
    pub fn zoom_wheel(&mut self, direction: ZoomDirection, anchor: Point) {
        self.zoom(direction, self.config.zoom.wheel_step, Some(anchor));
    }

    /// Translate the image inside the container.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.viewport.pan_by(dx, dy);
    }

    /// The host window changed size; refit the image.
    pub fn resize_container(&mut self, container: Size) {
        self.viewport.resize_container(container);
        self.store.rescale_to(self.viewport.client_size());
    }

    /// Drive boundary autoscroll. Returns true when the view moved.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.autoscroll.tick(&mut self.viewport, now)
    }

    pub fn is_autoscrolling(&self) -> bool {
        self.autoscroll.is_active()
    }

    // ========================================================================
    // History
    // ========================================================================

    pub fn undo(&mut self) -> bool {
        let undone = self.store.undo();
        if undone {
            self.after_history_jump();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.store.redo();
        if redone {
            self.after_history_jump();
        }
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.store.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.history().can_redo()
    }

    fn after_history_jump(&mut self) {
        self.edit.clear_drag();
        self.edit.clear_focus();
        self.gesture = Gesture::Idle;
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Repaint every layer from the current state.
    ///
    /// Returns `None` while the container has no area.
    pub fn redraw(&mut self) -> Option<&RenderLayers> {
        let container = self.viewport.container_size();
        let (width, height) = container.to_pixels();
        let reuse = self
            .layers
            .as_ref()
            .is_some_and(|l| l.width() == width && l.height() == height);
        if !reuse {
            self.layers = RenderLayers::new(width, height);
        }
        let layers = self.layers.as_mut()?;
        let scene = Scene {
            viewport: &self.viewport,
            data: self.store.data(),
            edit: &self.edit,
            image: self.image.as_ref(),
        };
        redraw_layers(layers, &scene);
        self.layers.as_ref()
    }

    // ========================================================================
    // Tool Effects
    // ========================================================================

    /// Run `f` against a tool context and apply the effects it reports.
    fn with_tool_context<R>(&mut self, f: impl FnOnce(&ToolSet, &mut ToolContext<'_>) -> R) -> R {
        let client = self.store.client_size();
        let natural = self.store.natural_size();
        let (result, effects) = {
            let mut cx = ToolContext::new(self.store.data_mut(), &mut self.edit, client, natural);
            let result = f(&self.tools, &mut cx);
            (result, cx.into_effects())
        };
        self.apply_effects(effects);
        result
    }

    fn apply_effects(&mut self, effects: Vec<ToolEffect>) {
        for effect in effects {
            match effect {
                ToolEffect::AddObject(object) => {
                    self.store.add_object(object, false);
                }
                ToolEffect::UpdateObject { index, object } => {
                    if let Err(e) = self.store.update_object(object, index) {
                        log::warn!("⚠️ Dropped object update: {}", e);
                    }
                }
                ToolEffect::PushHistory => {
                    self.store.push_history();
                }
                ToolEffect::RequestAi(trigger) => {
                    log::debug!("🤖 AI: {} requested", trigger.model.wire_id());
                    self.pending_ai = Some(trigger);
                }
                ToolEffect::Warning(error) => self.warnings.push(error),
            }
        }
    }
}

//! Pointer routing.
//!
//! Every pointer event enters here in container coordinates. The router picks
//! which phase owns the gesture on press and keeps feeding that phase until
//! release:
//!
//! 1. editing of the active object
//! 2. creation with the selected tool (or the object already in flight)
//! 3. selection of the focused object
//! 4. panning

use super::{Editor, Gesture};
use crate::hit_test::{element_hit, focus_on_all_objects, focus_on_object, FocusFilter};
use crate::model::{ObjectStatus, ObjectType, Point};
use crate::tools::PointerInput;

impl Editor {
    /// Same event with its point mapped to content coordinates.
    fn to_content(&self, input: &PointerInput) -> PointerInput {
        input.at(self.viewport.container_to_content(input.point))
    }

    /// Object type of the active object being edited, if any.
    fn editing_type(&self) -> Option<ObjectType> {
        let data = self.store.data();
        data.active_object_index?;
        data.creating.as_ref().map(|c| c.object.object_type())
    }

    /// Object type that receives a creation press, if creation is allowed.
    fn creating_type(&self, input: &PointerInput) -> Option<ObjectType> {
        let data = self.store.data();
        if let Some(creating) = &data.creating
            && data.active_object_index.is_none()
        {
            return Some(creating.object.object_type());
        }
        if data.is_batch_editing && !data.uses_visual_prompt() {
            return None;
        }
        // Right-click is a negative prompt in AI mode and a disambiguation
        // request otherwise
        if input.is_right() && !data.ai_annotation {
            return None;
        }
        data.selected_tool.object_type()
    }

    /// Recompute hover focus at a content point.
    fn update_focus(&mut self, p: Point, ctrl: bool) {
        let client = self.store.client_size();
        let natural = self.store.natural_size();
        let data = self.store.data();
        let filter = FocusFilter::for_state(data, ctrl);
        let focus = focus_on_object(
            &data.objects,
            data.active_object_index,
            p,
            client,
            natural,
            filter,
        );
        self.edit.focus_object_index = focus;
        self.edit.focus_element = focus
            .and_then(|i| data.objects.get(i))
            .and_then(|object| element_hit(object, p));
    }

    /// Select the object under the cursor, or collect every hit on right-click.
    fn press_select(&mut self, input: &PointerInput) -> bool {
        let client = self.store.client_size();
        let natural = self.store.natural_size();
        let data = self.store.data();
        let filter = FocusFilter::for_state(data, input.ctrl);

        if input.is_right() {
            let hits = focus_on_all_objects(&data.objects, input.point, client, natural, filter);
            if hits.is_empty() {
                return false;
            }
            log::debug!("🔍 {} objects under cursor", hits.len());
            self.edit.focus_all_indices = hits;
            return true;
        }

        let focus = focus_on_object(
            &data.objects,
            data.active_object_index,
            input.point,
            client,
            natural,
            filter,
        );
        let Some(index) = focus else {
            return false;
        };

        if filter == FocusFilter::UncheckedOnly {
            let mut object = data.objects[index].clone();
            object.status = ObjectStatus::Checked;
            if let Err(e) = self.store.update_object(object, index) {
                log::warn!("⚠️ Cannot re-check object: {}", e);
            }
            return true;
        }

        if let Err(e) = self.store.activate(index) {
            log::warn!("⚠️ Cannot select object: {}", e);
            return false;
        }
        self.edit.focus_all_indices.clear();
        let object_type = self.store.data().objects[index].object_type();
        // A press on the selected object continues as a drag of it
        if self.with_tool_context(|tools, cx| tools.handler(object_type).start_editing(cx, input)) {
            self.gesture = Gesture::Editing(object_type);
        }
        true
    }

    /// Handle a button press.
    ///
    /// Returns true when some phase took the event. Presses are ignored while
    /// an AI request is in flight and when they land outside the image.
    pub fn pointer_down(&mut self, input: PointerInput) -> bool {
        if self.edit.is_requiring || !self.has_image() {
            return false;
        }
        self.edit.is_ctrl_pressed = input.ctrl;
        self.edit.last_pointer = Some(input.point);
        if !self.viewport.is_on_image(input.point) {
            return false;
        }
        if self.edit.allow_move {
            self.gesture = Gesture::Panning;
            return true;
        }
        let content = self.to_content(&input);

        if let Some(object_type) = self.editing_type()
            && self.with_tool_context(|tools, cx| tools.handler(object_type).start_editing(cx, &content))
        {
            self.gesture = Gesture::Editing(object_type);
            return true;
        }

        if let Some(object_type) = self.creating_type(&content) {
            let basics = self.object_basics();
            let handled = self.with_tool_context(|tools, cx| {
                tools.handler(object_type).start_creating(cx, &content, &basics)
            });
            if handled {
                self.gesture = Gesture::Creating(object_type);
                return true;
            }
        }

        if self.press_select(&content) {
            return true;
        }

        self.store.deactivate();
        self.edit.clear_focus();
        self.edit.allow_move = true;
        self.gesture = Gesture::Panning;
        true
    }

    /// Handle pointer movement.
    ///
    /// Returns true when the gesture owner consumed the event. Otherwise the
    /// hover focus is refreshed.
    pub fn pointer_move(&mut self, input: PointerInput) -> bool {
        if self.edit.is_requiring || !self.has_image() {
            return false;
        }
        self.edit.is_ctrl_pressed = input.ctrl;
        let previous = self.edit.last_pointer.replace(input.point);

        if self.gesture == Gesture::Panning {
            if let Some(previous) = previous {
                self.viewport
                    .pan_by(input.point.x - previous.x, input.point.y - previous.y);
            }
            return true;
        }

        let content = self.to_content(&input);
        let handled = match self.gesture {
            Gesture::Editing(object_type) => self
                .with_tool_context(|tools, cx| tools.handler(object_type).update_editing(cx, &content)),
            Gesture::Creating(object_type) => self
                .with_tool_context(|tools, cx| tools.handler(object_type).update_creating(cx, &content)),
            Gesture::Idle | Gesture::Panning => false,
        };
        if handled {
            if input.button_held {
                self.autoscroll.check(&self.viewport, input.point);
            }
            return true;
        }

        self.update_focus(content.point, input.ctrl);
        false
    }

    /// Handle a button release. Ends panning and autoscroll, then lets the
    /// gesture owner finish.
    pub fn pointer_up(&mut self, input: PointerInput) -> bool {
        self.autoscroll.stop();
        let gesture = std::mem::take(&mut self.gesture);
        if !self.has_image() {
            return false;
        }
        self.edit.last_pointer = Some(input.point);
        let content = self.to_content(&input);

        match gesture {
            Gesture::Panning => {
                self.edit.allow_move = self.pan_key;
                true
            }
            Gesture::Editing(object_type) => self
                .with_tool_context(|tools, cx| tools.handler(object_type).finish_editing(cx, &content)),
            Gesture::Creating(object_type) => self
                .with_tool_context(|tools, cx| tools.handler(object_type).finish_creating(cx, &content)),
            Gesture::Idle => false,
        }
    }
}

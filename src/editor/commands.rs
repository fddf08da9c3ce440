//! Named editing and review commands.

use super::{Editor, Gesture};
use crate::constants::MIN_POLYGON_VERTICES;
use crate::error::{EditorError, EditorResult};
use crate::format::validate;
use crate::model::{
    find_category, AnnotationObject, AttributeValue, Classification, EditorTool,
    KeypointVisibility, LabelId, ObjectStatus, ObjectType, PromptState, Shape,
};
use crate::store::LabelChange;
use crate::tools::{
    cancel_pending_step, check_rect_commit, commit_polygon, drop_small_rings, fit_skeleton_commit,
    flatten_mask_steps,
};

impl Editor {
    /// First warning raised since `mark`, as an error.
    fn take_warning_since(&mut self, mark: usize) -> Option<EditorError> {
        (self.warnings.len() > mark).then(|| self.warnings.remove(mark))
    }

    fn active_index(&self) -> EditorResult<usize> {
        self.store
            .data()
            .active_object_index
            .ok_or(EditorError::NoActiveObject)
    }

    // ========================================================================
    // Creating Object
    // ========================================================================

    /// Escape: drop what is being drawn.
    ///
    /// A mask with finished steps only loses its pending step. Otherwise the
    /// creating object is discarded and the active object deselected; in AI
    /// mode the prompt goes with it.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
        self.autoscroll.stop();
        self.edit.clear_drag();
        self.edit.focus_all_indices.clear();

        let data = self.store.data_mut();
        if let Some(creating) = data.creating.as_mut()
            && creating.object.object_type() == ObjectType::Mask
            && cancel_pending_step(creating)
        {
            log::debug!("Dropped pending mask step");
            return;
        }

        let had_creating = data.creating.take().is_some();
        data.active_object_index = None;
        data.prompt.creating_prompt = None;
        if had_creating && data.ai_annotation {
            data.prompt = PromptState::default();
        }
    }

    /// Enter: close the ring being drawn and commit the polygon.
    ///
    /// Does nothing unless a polygon is being created and its open ring has
    /// enough vertices.
    pub fn finish_polygon(&mut self) -> bool {
        let data = self.store.data();
        if data.active_object_index.is_some() {
            return false;
        }
        let Some(creating) = &data.creating else {
            return false;
        };
        let Shape::Polygon(group) = &creating.object.shape else {
            return false;
        };
        let open_ring = creating.curr_index.and_then(|i| group.rings.get(i));
        if open_ring.is_some_and(|ring| ring.len() < MIN_POLYGON_VERTICES) {
            return false;
        }
        self.with_tool_context(|_, cx| commit_polygon(cx))
    }

    /// Commit the creating object, optionally under a new label.
    ///
    /// Masks are rasterized first, a skeleton box gets its template fitted,
    /// and geometry without area is rejected. An edited object is written back in place,
    /// a new one is appended. Either way the object ends up committed and
    /// nothing stays active. Returns the object's index, or `None` when there
    /// was nothing to commit.
    pub fn finish_creating_object(&mut self, label_id: Option<LabelId>) -> EditorResult<Option<usize>> {
        if self.store.data().creating.is_none() {
            return Ok(None);
        }
        let color = label_id
            .and_then(|id| find_category(self.store.categories(), id))
            .map(|c| (c.color, c.attributes.len()));
        if let Some(id) = label_id {
            self.edit.latest_label_id = Some(id);
            if let Some(creating) = self.store.data_mut().creating.as_mut() {
                creating.object.label_id = Some(id);
                if let Some((color, attributes)) = color {
                    creating.object.color = color;
                    creating.object.attributes = vec![None; attributes];
                }
            }
        }

        let mark = self.warnings.len();
        let object_type = self.store.data().creating.as_ref().map(|c| c.object.object_type());
        let prepared = match object_type {
            Some(ObjectType::Mask) => self.with_tool_context(|_, cx| flatten_mask_steps(cx)),
            Some(ObjectType::Polygon) => self.with_tool_context(|_, cx| {
                let Some(mut creating) = cx.data.creating.take() else {
                    return false;
                };
                let Shape::Polygon(group) = &mut creating.object.shape else {
                    return false;
                };
                let kept = drop_small_rings(cx, group);
                if kept {
                    cx.data.creating = Some(creating);
                }
                kept
            }),
            Some(ObjectType::Rectangle) => self.with_tool_context(|_, cx| check_rect_commit(cx)),
            Some(ObjectType::Skeleton) => self.with_tool_context(|_, cx| fit_skeleton_commit(cx)),
            None => false,
        };
        if !prepared {
            return match self.take_warning_since(mark) {
                Some(error) => Err(error),
                None => Ok(None),
            };
        }

        let data = self.store.data_mut();
        let Some(creating) = data.creating.take() else {
            return Ok(None);
        };
        let mut object = creating.object;
        object.commit();
        let active = data.active_object_index;
        data.prompt = PromptState::default();
        let index = match active {
            Some(index) => {
                self.store.update_object_without_history(object, index)?;
                index
            }
            None => self.store.add_object_without_history(object, true),
        };
        self.store.deactivate();
        self.store.push_history();
        log::debug!("📝 Committed object {}", index);
        Ok(Some(index))
    }

    /// Set the tri-state visibility of a keypoint of the active skeleton.
    pub fn set_keypoint_visibility(
        &mut self,
        keypoint: usize,
        visibility: KeypointVisibility,
    ) -> EditorResult<()> {
        let index = self.active_index()?;
        let mut object = self.store.data().objects[index].clone();
        let Shape::Skeleton(skeleton) = &mut object.shape else {
            return Err(EditorError::NoActiveObject);
        };
        let len = skeleton.keypoints.len();
        let point = skeleton
            .keypoints
            .get_mut(keypoint)
            .ok_or(EditorError::invalid_index(keypoint, len))?;
        point.visibility = visibility;
        self.store.update_object(object, index)
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Pick one object from the list collected by the last right-click.
    ///
    /// Selecting an object of another type than the current tool creates
    /// switches to the Drag tool.
    pub fn select_from_disambiguation(&mut self, index: usize) -> EditorResult<()> {
        if !self.edit.focus_all_indices.contains(&index) {
            return Err(EditorError::invalid_index(index, self.store.data().objects.len()));
        }
        self.store.activate(index)?;
        self.edit.focus_all_indices.clear();
        self.edit.focus_object_index = Some(index);

        let data = self.store.data_mut();
        let object_type = data.objects[index].object_type();
        if data.selected_tool.object_type() != Some(object_type) {
            data.selected_tool = EditorTool::Drag;
            data.selected_sub_tool = EditorTool::Drag.default_sub_tool(data.ai_annotation);
        }
        Ok(())
    }

    /// Delete the active object.
    pub fn remove_active_object(&mut self) -> EditorResult<AnnotationObject> {
        let index = self.active_index()?;
        self.store.remove_object(index)
    }

    /// Delete every object.
    pub fn remove_all_objects(&mut self) {
        self.store.remove_all();
    }

    /// Show or hide an object.
    pub fn set_object_hidden(&mut self, index: usize, hidden: bool) -> EditorResult<()> {
        let mut object = self
            .store
            .data()
            .objects
            .get(index)
            .cloned()
            .ok_or(EditorError::invalid_index(index, self.store.data().objects.len()))?;
        object.hidden = hidden;
        self.store.update_object(object, index)
    }

    // ========================================================================
    // Labels, Attributes and Classifications
    // ========================================================================

    /// Move the active object to another category.
    pub fn change_object_label(&mut self, label_id: LabelId) -> EditorResult<LabelChange> {
        let index = self.active_index()?;
        self.edit.latest_label_id = Some(label_id);
        self.store.change_object_label(index, label_id)
    }

    /// Supply attribute values for the active object.
    pub fn set_object_attributes(&mut self, attributes: Vec<Option<AttributeValue>>) -> EditorResult<()> {
        let index = self.active_index()?;
        self.store.set_object_attributes(index, attributes)
    }

    /// Answer an image-level classification.
    pub fn set_classification(&mut self, label_id: LabelId, value: impl Into<String>) {
        let value = value.into();
        let classifications = &mut self.store.data_mut().classifications;
        match classifications.iter_mut().find(|c| c.label_id == label_id) {
            Some(existing) => existing.value = value,
            None => classifications.push(Classification { label_id, value }),
        }
        self.store.push_history();
    }

    /// Check that every committed object and classification is complete.
    pub fn validate(&self) -> EditorResult<()> {
        let data = self.store.data();
        let issues = validate(&data.objects, self.store.categories(), &data.classifications);
        if issues.is_empty() {
            Ok(())
        } else {
            for issue in &issues {
                log::debug!("Validation: {}", issue);
            }
            Err(EditorError::Validation(issues))
        }
    }

    // ========================================================================
    // Batch Review
    // ========================================================================

    /// Re-check candidates: Checked when `accept(conf)`, Unchecked otherwise
    /// or without a confidence. Committed objects are left alone.
    fn review_candidates(&mut self, accept: impl Fn(f32) -> bool) {
        let objects = self
            .store
            .data()
            .objects
            .iter()
            .map(|object| {
                if object.is_committed() {
                    return object.clone();
                }
                let status = match object.conf {
                    Some(conf) if accept(conf) => ObjectStatus::Checked,
                    _ => ObjectStatus::Unchecked,
                };
                AnnotationObject {
                    status,
                    ..object.clone()
                }
            })
            .collect();
        self.store.update_all_objects(objects);
    }

    /// Candidates with `conf >= threshold` become Checked, the rest Unchecked.
    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        self.store.data_mut().limit_conf = threshold;
        self.review_candidates(|conf| conf >= threshold);
        log::debug!("🤖 Confidence threshold {:.2}", threshold);
    }

    /// Candidates with `low <= conf <= high` become Checked, the rest Unchecked.
    pub fn set_confidence_range(&mut self, low: f32, high: f32) {
        self.store.data_mut().limit_conf = low;
        self.review_candidates(|conf| (low..=high).contains(&conf));
        log::debug!("🤖 Confidence range {:.2}..={:.2}", low, high);
    }

    /// Commit every accepted candidate and leave review mode.
    ///
    /// Accepted candidates take their category's color; rejected ones are
    /// dropped.
    pub fn accept_valid_objects(&mut self) {
        let categories = self.store.categories();
        let objects: Vec<AnnotationObject> = self
            .store
            .data()
            .objects
            .iter()
            .filter(|o| o.status != ObjectStatus::Unchecked)
            .map(|object| {
                let mut object = object.clone();
                if !object.is_committed() {
                    object.status = ObjectStatus::Committed;
                    if let Some(category) = object.label_id.and_then(|id| find_category(categories, id)) {
                        object.color = category.color;
                    }
                }
                object
            })
            .collect();
        let accepted = objects.len();
        let data = self.store.data_mut();
        data.is_batch_editing = false;
        data.prompt.prompts_queue.clear();
        data.prompt.creating_prompt = None;
        self.store.update_all_objects(objects);
        log::debug!("🤖 Accepted candidates, {} objects", accepted);
    }

    /// Drop every candidate and leave review mode.
    pub fn abort_batch_objects(&mut self) {
        let objects: Vec<AnnotationObject> = self.store.committed_objects().cloned().collect();
        self.store.data_mut().is_batch_editing = false;
        self.store.update_all_objects(objects);
        log::debug!("🗑️ Aborted batch review");
    }

    /// Leave AI annotation, discarding candidates and prompts.
    pub fn exit_ai_annotation(&mut self) {
        let objects: Vec<AnnotationObject> = self.store.committed_objects().cloned().collect();
        let data = self.store.data_mut();
        data.ai_annotation = false;
        data.is_batch_editing = false;
        data.prompt = PromptState::default();
        data.selected_sub_tool = data.selected_tool.default_sub_tool(false);
        self.store.deactivate();
        self.store.update_all_objects(objects);
        self.pending_ai = None;
        log::debug!("🤖 AI annotation off");
    }
}

//! Annotation data store.
//!
//! [`ObjectStore`] owns the [`DrawData`] and its [`History`]. Every mutation
//! comes in two flavors: the plain one records a snapshot afterwards, the
//! `*_without_history` one leaves recording to the caller so several changes
//! can land as one undo step.

use crate::error::{EditorError, EditorResult};
use crate::format::{objects_to_persisted, AutoSave, PersistedAnnotation};
use crate::history::{History, HistoryConfig};
use crate::model::{
    find_category, AnnotationObject, AttributeValue, Category, CreatingObject, DrawData, LabelId,
    PromptState, Size,
};

/// Outcome of relabeling an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelChange {
    /// The new label is complete
    Applied,
    /// The category has required attributes; the object at this index needs them
    NeedsAttributes(usize),
}

/// Object list, creating object and undo history of the current image.
#[derive(Debug)]
pub struct ObjectStore {
    data: DrawData,
    history: History,
    /// Client size the content coordinates of `data` refer to
    client: Size,
    natural: Size,
    categories: Vec<Category>,
    auto_save: Option<AutoSave>,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl ObjectStore {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            data: DrawData::default(),
            history: History::with_config(config),
            client: Size::default(),
            natural: Size::default(),
            categories: Vec::new(),
            auto_save: None,
        }
    }

    pub fn data(&self) -> &DrawData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DrawData {
        &mut self.data
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn client_size(&self) -> Size {
        self.client
    }

    pub fn natural_size(&self) -> Size {
        self.natural
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories;
    }

    /// Install or remove the auto-save hook.
    pub fn set_auto_save(&mut self, auto_save: Option<AutoSave>) {
        self.auto_save = auto_save;
    }

    /// Start a new image session with `data` as the first snapshot.
    pub fn reset(&mut self, data: DrawData, natural: Size, client: Size) {
        self.history.clear();
        self.data = data;
        self.natural = natural;
        self.client = client;
        self.history.push(self.data.clone(), self.client);
    }

    /// Map all content geometry onto a new client size.
    pub fn rescale_to(&mut self, client: Size) {
        if client == self.client {
            return;
        }
        self.data = self.data.rescale(self.client, client);
        self.client = client;
    }

    /// Record the current data. Fires the auto-save hook when something was recorded.
    pub fn push_history(&mut self) -> bool {
        let pushed = self.history.push(self.data.clone(), self.client);
        if pushed && let Some(auto_save) = self.auto_save.as_mut() {
            let annotations = objects_to_persisted(
                &self.data.objects,
                &self.categories,
                self.client,
                self.natural,
            );
            auto_save.save(&annotations);
        }
        pushed
    }

    /// Restore the previous snapshot. Returns false at the oldest snapshot.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.client) {
            Some(data) => {
                self.data = data;
                true
            }
            None => false,
        }
    }

    /// Restore the next snapshot. Returns false at the newest snapshot.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.client) {
            Some(data) => {
                self.data = data;
                true
            }
            None => false,
        }
    }

    /// Committed objects in persisted form.
    pub fn persisted(&self) -> Vec<PersistedAnnotation> {
        objects_to_persisted(&self.data.objects, &self.categories, self.client, self.natural)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    fn check_index(&self, index: usize) -> EditorResult<()> {
        if index < self.data.objects.len() {
            Ok(())
        } else {
            Err(EditorError::invalid_index(index, self.data.objects.len()))
        }
    }

    /// Append an object and, unless `not_active`, make it the active object
    /// with a creating copy. Returns the new index.
    pub fn add_object_without_history(&mut self, object: AnnotationObject, not_active: bool) -> usize {
        self.data.objects.push(object);
        let index = self.data.objects.len() - 1;
        if not_active {
            self.data.creating = None;
        } else {
            self.data.active_object_index = Some(index);
            self.data.creating = Some(CreatingObject::new(self.data.objects[index].clone()));
        }
        log::debug!("📝 Added object {} ({})", index, self.data.objects[index].object_type().name());
        index
    }

    pub fn add_object(&mut self, object: AnnotationObject, not_active: bool) -> usize {
        let index = self.add_object_without_history(object, not_active);
        self.push_history();
        index
    }

    /// Remove an object and deactivate.
    pub fn remove_object_without_history(&mut self, index: usize) -> EditorResult<AnnotationObject> {
        self.check_index(index)?;
        let removed = self.data.objects.remove(index);
        self.data.active_object_index = None;
        self.data.creating = None;
        log::debug!("🗑️ Removed object {}", index);
        Ok(removed)
    }

    pub fn remove_object(&mut self, index: usize) -> EditorResult<AnnotationObject> {
        let removed = self.remove_object_without_history(index)?;
        self.push_history();
        Ok(removed)
    }

    /// Remove every object and clear the AI prompt state.
    pub fn remove_all_without_history(&mut self) {
        self.data.objects.clear();
        self.data.active_object_index = None;
        self.data.creating = None;
        self.data.prompt = PromptState::default();
        log::debug!("🗑️ Removed all objects");
    }

    pub fn remove_all(&mut self) {
        self.remove_all_without_history();
        self.push_history();
    }

    /// Replace one object. The creating copy follows when it is the active object.
    pub fn update_object_without_history(
        &mut self,
        object: AnnotationObject,
        index: usize,
    ) -> EditorResult<()> {
        self.check_index(index)?;
        if self.data.active_object_index == Some(index) {
            match self.data.creating.as_mut() {
                Some(creating) => creating.object = object.clone(),
                None => self.data.creating = Some(CreatingObject::new(object.clone())),
            }
        }
        self.data.objects[index] = object;
        Ok(())
    }

    pub fn update_object(&mut self, object: AnnotationObject, index: usize) -> EditorResult<()> {
        self.update_object_without_history(object, index)?;
        self.push_history();
        Ok(())
    }

    /// Replace the whole list, keeping the active object when it still exists.
    pub fn update_all_objects_without_history(&mut self, objects: Vec<AnnotationObject>) {
        self.data.objects = objects;
        self.data.revalidate_active();
        match self.data.active_object() {
            Some(active) => {
                let active = active.clone();
                match self.data.creating.as_mut() {
                    Some(creating) => creating.object = active,
                    None => self.data.creating = Some(CreatingObject::new(active)),
                }
            }
            None => self.data.creating = None,
        }
    }

    pub fn update_all_objects(&mut self, objects: Vec<AnnotationObject>) {
        self.update_all_objects_without_history(objects);
        self.push_history();
    }

    /// Make an object active with a fresh creating copy for editing.
    pub fn activate(&mut self, index: usize) -> EditorResult<()> {
        self.check_index(index)?;
        self.data.active_object_index = Some(index);
        self.data.creating = Some(CreatingObject::new(self.data.objects[index].clone()));
        Ok(())
    }

    /// Clear the active object and the creating object.
    pub fn deactivate(&mut self) {
        self.data.active_object_index = None;
        self.data.creating = None;
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Objects that are saved, not AI candidates.
    pub fn committed_objects(&self) -> impl Iterator<Item = &AnnotationObject> + '_ {
        self.data.objects.iter().filter(|o| o.is_committed())
    }

    /// The creating object if any, else the active object.
    pub fn current_object(&self) -> Option<&AnnotationObject> {
        self.data.current_object()
    }

    // ========================================================================
    // Labels and Attributes
    // ========================================================================

    /// Move an object to another category.
    ///
    /// Attributes are reset to the new schema and the color follows the
    /// category. While reviewing AI candidates the confidence becomes 1.
    pub fn change_object_label(
        &mut self,
        index: usize,
        label_id: LabelId,
    ) -> EditorResult<LabelChange> {
        self.check_index(index)?;
        let mut object = self.data.objects[index].clone();
        object.label_id = Some(label_id);
        let mut needs_attributes = false;
        match find_category(&self.categories, label_id) {
            Some(category) => {
                object.color = category.color;
                object.attributes = vec![None; category.attributes.len()];
                needs_attributes = category.has_required_attributes();
            }
            None => {
                log::warn!("⚠️ Unknown category {}", label_id);
                object.attributes.clear();
            }
        }
        if self.data.is_batch_editing {
            object.conf = Some(1.0);
        }
        self.update_object(object, index)?;

        Ok(if needs_attributes {
            LabelChange::NeedsAttributes(index)
        } else {
            LabelChange::Applied
        })
    }

    /// Supply attribute values for an object.
    pub fn set_object_attributes(
        &mut self,
        index: usize,
        attributes: Vec<Option<AttributeValue>>,
    ) -> EditorResult<()> {
        self.check_index(index)?;
        let mut object = self.data.objects[index].clone();
        object.attributes = attributes;
        self.update_object(object, index)
    }
}

//! Auto-save hook fired after history pushes.

use super::persisted::PersistedAnnotation;

/// Callback receiving the committed annotations in persisted form.
pub type AutoSaveCallback = Box<dyn FnMut(&[PersistedAnnotation])>;

/// Host callback plus bookkeeping.
pub struct AutoSave {
    callback: AutoSaveCallback,

    /// Whether auto-save is enabled.
    enabled: bool,

    /// Number of saves handed to the callback.
    saves: u64,
}

impl AutoSave {
    /// Create an enabled hook.
    pub fn new(callback: AutoSaveCallback) -> Self {
        Self {
            callback,
            enabled: true,
            saves: 0,
        }
    }

    /// Hand annotations to the host if enabled.
    pub fn save(&mut self, annotations: &[PersistedAnnotation]) {
        if !self.enabled {
            return;
        }
        (self.callback)(annotations);
        self.saves += 1;
        log::trace!("Auto-save: saved {} annotations", annotations.len());
    }

    /// Set whether auto-save is enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        log::debug!("Auto-save: enabled = {}", enabled);
    }

    /// Check if auto-save is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> u64 {
        self.saves
    }
}

impl std::fmt::Debug for AutoSave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoSave")
            .field("enabled", &self.enabled)
            .field("saves", &self.saves)
            .finish_non_exhaustive()
    }
}

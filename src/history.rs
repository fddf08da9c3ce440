//! Undo/Redo history for the editor.
//!
//! Every history-bearing mutation stores a full [`DrawData`] snapshot together
//! with the client size it was captured at. Undo and redo hand the snapshot
//! back rescaled to the current client size, so zooming between edits never
//! replays stale coordinates.

use std::collections::VecDeque;

use crate::constants::DEFAULT_HISTORY_CAPACITY;
use crate::model::{DrawData, Size};

// ============================================================================
// History Items
// ============================================================================

/// A snapshot and the client size its content coordinates refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryItem {
    pub data: DrawData,
    pub client_size: Size,
}

impl HistoryItem {
    /// Snapshot data mapped onto `client_size`.
    pub fn restore(&self, client_size: Size) -> DrawData {
        self.data.rescale(self.client_size, client_size)
    }
}

// ============================================================================
// History
// ============================================================================

/// Configuration for the history ring
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of snapshots to keep
    pub max_history: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Bounded snapshot ring with a cursor.
///
/// Items after the cursor are redo targets; items before it are undo targets.
/// Pushing truncates the redo side and evicts the oldest snapshot on overflow.
#[derive(Debug, Clone, Default)]
pub struct History {
    items: VecDeque<HistoryItem>,
    cursor: usize,
    config: HistoryConfig,
}

impl History {
    /// Create a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Record a snapshot.
    ///
    /// Returns false (and records nothing) when the snapshot equals the item
    /// at the cursor.
    pub fn push(&mut self, data: DrawData, client_size: Size) -> bool {
        if self.items.get(self.cursor).is_some_and(|item| item.data == data) {
            return false;
        }
        if !self.items.is_empty() {
            self.items.truncate(self.cursor + 1);
        }
        self.items.push_back(HistoryItem { data, client_size });

        // Limit history size
        while self.items.len() > self.config.max_history.max(1) {
            self.items.pop_front();
        }
        self.cursor = self.items.len() - 1;
        log::debug!("📝 History: pushed snapshot {}/{}", self.cursor + 1, self.items.len());
        true
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.items.len()
    }

    /// Step back and return the previous snapshot rescaled to `client_size`.
    pub fn undo(&mut self, client_size: Size) -> Option<DrawData> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        log::debug!("⏪ Undo: snapshot {}/{}", self.cursor + 1, self.items.len());
        self.items.get(self.cursor).map(|item| item.restore(client_size))
    }

    /// Step forward and return the next snapshot rescaled to `client_size`.
    pub fn redo(&mut self, client_size: Size) -> Option<DrawData> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        log::debug!("⏩ Redo: snapshot {}/{}", self.cursor + 1, self.items.len());
        self.items.get(self.cursor).map(|item| item.restore(client_size))
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
        log::debug!("🗑️ History cleared");
    }

    /// Number of stored snapshots
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of undo steps available
    pub fn undo_count(&self) -> usize {
        self.cursor
    }

    /// Number of redo steps available
    pub fn redo_count(&self) -> usize {
        self.items.len().saturating_sub(self.cursor + 1)
    }

    /// Snapshot at the cursor
    pub fn current(&self) -> Option<&HistoryItem> {
        self.items.get(self.cursor)
    }
}

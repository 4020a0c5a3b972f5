//! Transient editor UI state, kept apart from persisted block data.

use crate::model::block::{BlockId, ContentBlock};
use std::collections::HashSet;

/// Which blocks are expanded, focused or being dragged.
///
/// Never serialized and never part of the lesson record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorUiState {
    expanded: HashSet<BlockId>,
    focused: Option<BlockId>,
    dragging: Option<BlockId>,
}

impl EditorUiState {
    pub fn is_expanded(&self, id: &BlockId) -> bool {
        self.expanded.contains(id)
    }

    pub fn set_expanded(&mut self, id: &BlockId, expanded: bool) {
        if expanded {
            self.expanded.insert(id.clone());
        } else {
            self.expanded.remove(id);
        }
    }

    /// Flips the expanded flag and returns the new value.
    pub fn toggle_expanded(&mut self, id: &BlockId) -> bool {
        let next = !self.is_expanded(id);
        self.set_expanded(id, next);
        next
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn focused(&self) -> Option<&BlockId> {
        self.focused.as_ref()
    }

    pub fn focus(&mut self, id: &BlockId) {
        self.focused = Some(id.clone());
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    pub fn dragging(&self) -> Option<&BlockId> {
        self.dragging.as_ref()
    }

    pub fn begin_drag(&mut self, id: &BlockId) {
        self.dragging = Some(id.clone());
    }

    /// Ends a drag and returns the dragged block id.
    pub fn end_drag(&mut self) -> Option<BlockId> {
        self.dragging.take()
    }

    /// Drops references to blocks not present in `blocks`.
    pub fn retain_known(&mut self, blocks: &[ContentBlock]) {
        let known = blocks.iter().map(ContentBlock::id).collect::<HashSet<_>>();
        self.expanded.retain(|id| known.contains(id));
        if self.focused.as_ref().is_some_and(|id| !known.contains(id)) {
            self.focused = None;
        }
        if self.dragging.as_ref().is_some_and(|id| !known.contains(id)) {
            self.dragging = None;
        }
    }
}

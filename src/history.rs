//! Linear undo/redo over whole-list snapshots.
//!
//! Each stack entry is the committed list as it was *before* the action
//! that pushed it. The current list is held by the caller and never lives
//! on either stack.

use crate::model::AnnotationList;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<AnnotationList>,
    redo_stack: Vec<AnnotationList>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// A zero limit is treated as one so that at least the last action can be undone.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the list as it was before a new action. Invalidates redo.
    pub fn record(&mut self, before: AnnotationList) {
        self.undo_stack.push(before);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.limit {
            let excess = self.undo_stack.len() - self.limit;
            self.undo_stack.drain(..excess);
        }
        log::debug!("history: recorded snapshot, depth {}", self.undo_stack.len());
    }

    /// Swap `current` for the most recent undo snapshot.
    /// Returns `None` and leaves both stacks alone when there is nothing to undo.
    pub fn undo(&mut self, current: &AnnotationList) -> Option<AnnotationList> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current.clone());
        log::debug!(
            "history: undo, {} left, {} redoable",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        Some(previous)
    }

    /// Mirror of [`History::undo`].
    pub fn redo(&mut self, current: &AnnotationList) -> Option<AnnotationList> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current.clone());
        log::debug!(
            "history: redo, {} undoable, {} left",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_stack(&self) -> &[AnnotationList] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[AnnotationList] {
        &self.redo_stack
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

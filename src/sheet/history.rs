//! Linear undo/redo history of add/delete edits.
//!
//! The history is decoupled from rendering: it stores component snapshots
//! plus enough terminal context to re-create nodes that were freed when the
//! component was deleted. The sheet interprets the records; this type only
//! keeps the two stacks honest.

use crate::components::Component;

/// The operation a history record reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Add,
    Delete,
}

/// Snapshot of one user edit.
#[derive(Debug, Clone)]
pub struct EditRecord {
    pub component: Component,
    pub op: EditOp,
    /// Terminal (position, explicit name) pairs captured at record time,
    /// in terminal order. Needed to resolve nodes again on undo of a
    /// delete, since releasing the component may have freed them.
    pub terminals: Vec<((i64, i64), Option<String>)>,
}

/// Append-only log of user edits with a single linear undo/redo cursor.
#[derive(Debug, Default)]
pub struct EditHistory {
    undo: Vec<EditRecord>,
    redo: Vec<EditRecord>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh user edit. Any redoable future is discarded.
    pub fn record(&mut self, record: EditRecord) {
        self.redo.clear();
        self.undo.push(record);
    }

    pub(crate) fn pop_undo(&mut self) -> Option<EditRecord> {
        self.undo.pop()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<EditRecord> {
        self.redo.pop()
    }

    /// Push the inverse of an undone record onto the redo stack.
    pub(crate) fn push_redo(&mut self, record: EditRecord) {
        self.redo.push(record);
    }

    /// Push a redone record back onto the undo stack without clearing redo.
    pub(crate) fn push_undo(&mut self, record: EditRecord) {
        self.undo.push(record);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Kind, Component};
    use crate::sheet::NodeId;

    fn record(op: EditOp) -> EditRecord {
        EditRecord {
            component: Component::assemble(Kind::Wire, "W1".to_string(), &[NodeId(1), NodeId(2)]),
            op,
            terminals: vec![((0, 0), None), ((2, 0), None)],
        }
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut history = EditHistory::new();
        history.record(record(EditOp::Add));
        let undone = history.pop_undo().unwrap();
        history.push_redo(undone);
        assert!(history.can_redo());

        history.record(record(EditOp::Add));
        assert!(!history.can_redo());
        assert!(history.can_undo());
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut history = EditHistory::new();
        assert!(history.pop_undo().is_none());
        assert!(history.pop_redo().is_none());
    }
}

//! Undo/Redo Ledger
//!
//! Linear undo history with a bounded size. The ledger is pure bookkeeping:
//! it stores [`UndoAction`]s and hands them back, and the tree mutator
//! applies them. Each ledger is an independent value, so separate projects
//! or tests never share history.

use crate::models::{Node, UndoAction, UndoChange};
use std::collections::VecDeque;

/// Bounded undo/redo history
#[derive(Debug, Clone)]
pub struct UndoLedger {
    history: VecDeque<UndoAction>,
    redo_stack: Vec<UndoAction>,
    limit: usize,
}

impl Default for UndoLedger {
    fn default() -> Self {
        Self::new(50)
    }
}

impl UndoLedger {
    /// Create a ledger keeping at most `limit` entries (at least one)
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            history: VecDeque::with_capacity(limit),
            redo_stack: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn record_move(
        &mut self,
        node_id: &str,
        old_parent_id: Option<String>,
        new_parent_id: Option<String>,
        old_order: Option<f64>,
        new_order: Option<f64>,
    ) {
        self.record(UndoAction::new(
            node_id.to_string(),
            UndoChange::Move {
                old_parent_id,
                new_parent_id,
                old_order,
                new_order,
            },
        ));
    }

    pub fn record_edit(&mut self, node_id: &str, old_content: String, new_content: String) {
        self.record(UndoAction::new(
            node_id.to_string(),
            UndoChange::Edit {
                old_content,
                new_content,
            },
        ));
    }

    pub fn record_create(&mut self, node: Node) {
        self.record(UndoAction::new(node.id.clone(), UndoChange::Create { node }));
    }

    /// Record a cascade delete; `nodes` starts with the deleted node itself
    pub fn record_delete(&mut self, nodes: Vec<Node>) {
        let Some(first) = nodes.first() else {
            return;
        };
        self.record(UndoAction::new(
            first.id.clone(),
            UndoChange::Delete { nodes },
        ));
    }

    /// Push an action, evicting the oldest entry past the limit.
    ///
    /// Any new action invalidates the redo stack.
    pub fn record(&mut self, action: UndoAction) {
        self.redo_stack.clear();
        self.history.push_back(action);
        while self.history.len() > self.limit {
            if let Some(evicted) = self.history.pop_front() {
                tracing::debug!(
                    "Undo history full, dropping oldest {:?} on {}",
                    evicted.action_type(),
                    evicted.node_id
                );
            }
        }
    }

    /// Move the most recent action onto the redo stack and return it for
    /// the caller to reverse
    pub fn undo(&mut self) -> Option<UndoAction> {
        let action = self.history.pop_back()?;
        self.redo_stack.push(action.clone());
        Some(action)
    }

    /// Move the most recently undone action back onto the history and
    /// return it for the caller to re-apply
    pub fn redo(&mut self) -> Option<UndoAction> {
        let action = self.redo_stack.pop()?;
        self.history.push_back(action.clone());
        Some(action)
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// The action `undo()` would return next
    pub fn last_action(&self) -> Option<&UndoAction> {
        self.history.back()
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.redo_stack.clear();
    }

    /// Number of undoable entries
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}

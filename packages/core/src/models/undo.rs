//! Undo Ledger Entries
//!
//! An `UndoAction` records one reversible mutation with enough before/after
//! state to apply it in either direction. The ledger never touches node
//! data itself; applying an action is the tree mutator's job.

use crate::models::Node;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminant of an [`UndoChange`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UndoActionType {
    Move,
    Edit,
    Create,
    Delete,
}

/// Before/after payload of a reversible mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UndoChange {
    #[serde(rename_all = "camelCase")]
    Move {
        old_parent_id: Option<String>,
        new_parent_id: Option<String>,
        old_order: Option<f64>,
        new_order: Option<f64>,
    },

    #[serde(rename_all = "camelCase")]
    Edit {
        old_content: String,
        new_content: String,
    },

    /// The node as it was created
    Create { node: Node },

    /// The deleted node followed by every descendant removed with it
    Delete { nodes: Vec<Node> },
}

/// One ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoAction {
    pub node_id: String,
    pub timestamp: DateTime<Utc>,
    pub change: UndoChange,
}

impl UndoAction {
    pub fn new(node_id: String, change: UndoChange) -> Self {
        Self {
            node_id,
            timestamp: Utc::now(),
            change,
        }
    }

    pub fn action_type(&self) -> UndoActionType {
        match self.change {
            UndoChange::Move { .. } => UndoActionType::Move,
            UndoChange::Edit { .. } => UndoActionType::Edit,
            UndoChange::Create { .. } => UndoActionType::Create,
            UndoChange::Delete { .. } => UndoActionType::Delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_matches_change() {
        let action = UndoAction::new(
            "n1".to_string(),
            UndoChange::Edit {
                old_content: "x".to_string(),
                new_content: "y".to_string(),
            },
        );
        assert_eq!(action.action_type(), UndoActionType::Edit);
    }

    #[test]
    fn test_move_change_serializes_tagged() {
        let change = UndoChange::Move {
            old_parent_id: None,
            new_parent_id: Some("p".to_string()),
            old_order: Some(1000.0),
            new_order: Some(2000.0),
        };
        let value = serde_json::to_value(&change).unwrap();
        assert_eq!(value["type"], "move");
        assert_eq!(value["newParentId"], "p");
        assert_eq!(value["oldOrder"], 1000.0);
    }
}

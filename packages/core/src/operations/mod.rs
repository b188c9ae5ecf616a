//! Node Operations Types
//!
//! This module provides the parameter and result types shared by the node
//! repository and the tree mutator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters for creating a node
///
/// Used by `NodeRepository::create()` for root, child, and sibling adds.
/// The id is always generated: callers cannot supply one, so an id is never
/// reused.
///
/// # Examples
///
/// ```rust
/// # use layercake_core::operations::CreateNodeParams;
/// // Append a root node
/// let root = CreateNodeParams::root("project-1", "Inbox");
///
/// // Child appended under a parent
/// let child = CreateNodeParams::child("project-1", "parent-id", "Call Sam");
///
/// // Placed right after an existing sibling
/// let after = CreateNodeParams {
///     insert_after_node_id: Some("sibling-id".to_string()),
///     ..CreateNodeParams::child("project-1", "parent-id", "Buy stamps")
/// };
/// assert_eq!(after.parent_id.as_deref(), Some("parent-id"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeParams {
    pub project_id: String,
    /// Parent node; `None` creates a root
    pub parent_id: Option<String>,
    pub content: String,
    /// Only kept for root nodes
    pub title: Option<String>,
    /// Sibling to insert after (if None, appends to end)
    pub insert_after_node_id: Option<String>,
}

impl CreateNodeParams {
    pub fn root(project_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn child(
        project_id: impl Into<String>,
        parent_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            parent_id: Some(parent_id.into()),
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Where a dragged node lands relative to the drop target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropPosition {
    /// Sibling of the target, immediately before it
    Before,
    /// Sibling of the target, immediately after it
    After,
    /// Last child of the target
    Child,
}

/// Why a mutation was refused
///
/// Rejections are expected outcomes, not errors: the mutation simply did
/// nothing observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    /// Referenced node does not exist
    NodeNotFound(String),
    /// The node being moved or edited is locked
    NodeLocked(String),
    /// The destination parent is locked and cannot accept new children
    ParentLocked(String),
    /// The move would make the node its own ancestor
    WouldCreateCycle,
    /// Dragged onto itself
    SameNode,
    /// Source and destination belong to different projects
    CrossProject,
    /// Indent needs a preceding sibling
    NoPrecedingSibling,
    /// Outdent needs a parent
    NoParent,
    /// Titles are only kept on root nodes
    NotARoot,
    /// The change would leave the node as it is
    Unchanged,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node '{}' does not exist", id),
            Self::NodeLocked(id) => write!(f, "node '{}' is locked", id),
            Self::ParentLocked(id) => write!(f, "parent '{}' is locked", id),
            Self::WouldCreateCycle => write!(f, "move would create a cycle"),
            Self::SameNode => write!(f, "cannot drop a node onto itself"),
            Self::CrossProject => write!(f, "nodes belong to different projects"),
            Self::NoPrecedingSibling => write!(f, "no preceding sibling to indent under"),
            Self::NoParent => write!(f, "node has no parent to outdent from"),
            Self::NotARoot => write!(f, "only root nodes carry a title"),
            Self::Unchanged => write!(f, "nothing to change"),
        }
    }
}

/// Outcome of a tree mutation
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum MutationOutcome {
    Applied,
    Rejected(RejectReason),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    pub fn rejection(&self) -> Option<&RejectReason> {
        match self {
            Self::Applied => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

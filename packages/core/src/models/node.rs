//! Node Data Structures
//!
//! This module defines the outline `Node` and the types used to patch,
//! delete, and view it.
//!
//! # Architecture
//!
//! - **Flat collection**: nodes are stored as one flat list; the tree is
//!   carried by `parent_id` references, never by nesting
//! - **Sibling order**: position among siblings comes from the numeric
//!   `order` key, not from the position in the stored list
//! - **Opaque payloads**: `voice_note` and `personas` belong to other
//!   features and are carried through moves, merges, and snapshots untouched
//!
//! # Examples
//!
//! ```rust
//! use layercake_core::models::Node;
//!
//! let root = Node::new("project-1".to_string(), None, "Groceries".to_string());
//! let child = Node::new(
//!     "project-1".to_string(),
//!     Some(root.id.clone()),
//!     "Milk".to_string(),
//! );
//!
//! assert!(root.is_root());
//! assert!(!child.is_root());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for Node operations
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Invalid order value: {0}")]
    InvalidOrder(String),

    #[error("Node id already in use: {0}")]
    DuplicateId(String),
}

/// A single outline entry.
///
/// # Fields
///
/// - `id`: Unique identifier, assigned at creation and never reused
/// - `project_id`: Owning project, immutable after creation
/// - `parent_id`: Parent node, `None` for a root node
/// - `content`: Free-text body
/// - `title`: Optional heading, only meaningful on root nodes
/// - `order`: Sibling sort key among nodes sharing `parent_id`
/// - `completed` / `collapsed` / `locked`: Independent flags
/// - `created_at`: Creation timestamp
/// - `voice_note` / `personas`: Opaque attached data owned by other features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Owning project
    pub project_id: String,

    /// Parent node ID (`None` means this node is a root)
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Primary content/text of the node
    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Sibling sort key; unset until the repository assigns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub collapsed: bool,

    /// Locked nodes refuse moves, edits, and new children
    #[serde(default)]
    pub locked: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_note: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personas: Option<serde_json::Value>,
}

impl Node {
    /// Create a new Node with an auto-generated UUID and no order.
    ///
    /// The order is assigned when the node is added to the repository.
    pub fn new(project_id: String, parent_id: Option<String>, content: String) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), project_id, parent_id, content)
    }

    /// Create a new Node with a specified ID
    pub fn new_with_id(
        id: String,
        project_id: String,
        parent_id: Option<String>,
        content: String,
    ) -> Self {
        Self {
            id,
            project_id,
            parent_id,
            content,
            title: None,
            order: None,
            completed: false,
            collapsed: false,
            locked: false,
            created_at: Utc::now(),
            voice_note: None,
            personas: None,
        }
    }

    /// Builder-style order assignment
    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }

    /// Validate node structure and required fields
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `id` or `project_id` is empty
    /// - Node references itself as parent
    /// - `order` is set but not a finite number
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if self.project_id.is_empty() {
            return Err(ValidationError::MissingField("projectId".to_string()));
        }

        if self.parent_id.as_deref() == Some(self.id.as_str()) {
            return Err(ValidationError::InvalidParent(
                "Node cannot be its own parent".to_string(),
            ));
        }

        if let Some(order) = self.order {
            if !order.is_finite() {
                return Err(ValidationError::InvalidOrder(format!(
                    "order must be finite, got {}",
                    order
                )));
            }
        }

        Ok(())
    }

    /// Check if this node is a root node (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Sort key used for sibling ordering; an unset order sorts as `0.0`
    pub fn sort_key(&self) -> f64 {
        self.order.unwrap_or(0.0)
    }

    /// Apply a partial update in place.
    ///
    /// `id` and `project_id` are not part of [`NodeUpdate`], so they can
    /// never change through this path.
    pub fn apply(&mut self, update: NodeUpdate) {
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(parent_id) = update.parent_id {
            self.parent_id = parent_id;
        }
        if let Some(order) = update.order {
            self.order = Some(order);
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        if let Some(collapsed) = update.collapsed {
            self.collapsed = collapsed;
        }
        if let Some(locked) = update.locked {
            self.locked = locked;
        }
        if let Some(voice_note) = update.voice_note {
            self.voice_note = voice_note;
        }
        if let Some(personas) = update.personas {
            self.personas = personas;
        }
    }
}

/// Sort siblings ascending by order.
///
/// The sort is stable, so nodes with equal (or unset) orders keep their
/// insertion order.
pub fn sort_by_order(nodes: &mut [Node]) {
    nodes.sort_by(compare_order);
}

/// Total ordering on sibling sort keys
pub fn compare_order(a: &Node, b: &Node) -> Ordering {
    a.sort_key().total_cmp(&b.sort_key())
}

/// Custom deserializer for optional fields that accepts both plain values and nested Options
///
/// Maps three input formats to the double-Option pattern:
/// - Missing field → None (don't update)
/// - null → Some(None) (set to NULL)
/// - "value" → Some(Some("value")) (set to value)
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Partial node update structure
///
/// All fields are optional; only provided fields are written. There is no
/// `id` or `project_id` field, so an update can never re-identify a node or
/// move it between projects.
///
/// # Double-Option Pattern for Nullable Fields
///
/// - `None`: Don't change this field
/// - `Some(None)`: Clear the field
/// - `Some(Some(value))`: Set the field to the specified value
///
/// # Examples
///
/// ```rust
/// # use layercake_core::models::NodeUpdate;
/// // Update only content
/// let update = NodeUpdate::new().with_content("Updated".to_string());
///
/// // Make the node a root
/// let update = NodeUpdate {
///     parent_id: Some(None),
///     ..Default::default()
/// };
/// assert!(!update.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub title: Option<Option<String>>,

    /// Update parent reference
    ///
    /// - `None`: Don't change parent_id
    /// - `Some(None)`: Make the node a root
    /// - `Some(Some(id))`: Re-parent under `id`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_id: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub voice_note: Option<Option<serde_json::Value>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub personas: Option<Option<serde_json::Value>>,
}

impl NodeUpdate {
    /// Create a new empty NodeUpdate
    pub fn new() -> Self {
        Self::default()
    }

    /// Set content update
    pub fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }

    /// Set parent update (`None` makes the node a root)
    pub fn with_parent(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set order update
    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }

    /// Set locked flag update
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    /// Check if update contains any changes
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.title.is_none()
            && self.parent_id.is_none()
            && self.order.is_none()
            && self.completed.is_none()
            && self.collapsed.is_none()
            && self.locked.is_none()
            && self.voice_note.is_none()
            && self.personas.is_none()
    }

    /// True if the update touches a field protected by the `locked` flag
    pub fn touches_locked_fields(&self) -> bool {
        self.content.is_some() || self.parent_id.is_some() || self.order.is_some()
    }
}

/// Result of a delete operation
///
/// The operation always succeeds; `existed` gives visibility into whether
/// the node was there, and `removed` lists every id that was deleted
/// (the node first, then its descendants).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResult {
    /// Whether the node existed before deletion
    pub existed: bool,

    /// IDs removed by the cascade
    pub removed: Vec<String>,
}

impl DeleteResult {
    /// Create a DeleteResult for a cascade that removed `removed`
    pub fn existed(removed: Vec<String>) -> Self {
        Self {
            existed: true,
            removed,
        }
    }

    /// Create a DeleteResult indicating the node didn't exist
    pub fn not_found() -> Self {
        Self::default()
    }
}

/// Nested read-only view of a subtree, children sorted by order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeWithChildren {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<NodeWithChildren>,
}

impl NodeWithChildren {
    /// Total number of nodes in this subtree, including the root
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(NodeWithChildren::count).sum::<usize>()
    }
}

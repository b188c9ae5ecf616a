//! Project Version Snapshots
//!
//! A `ProjectVersion` is an immutable, named copy of every node a project
//! had when the snapshot was taken. The snapshot owns its nodes outright;
//! nothing in it is shared with the live collection.

use crate::models::Node;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable named snapshot of a project's node set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVersion {
    pub id: String,
    pub project_id: String,

    /// User-supplied semantic version label (e.g. "1.2.0")
    pub version: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Deep copy of the project's nodes at snapshot time
    #[serde(default)]
    pub node_snapshot: Vec<Node>,
}

impl ProjectVersion {
    /// Build a new snapshot. `nodes` is taken by value, so the caller's
    /// live collection cannot alias it afterwards.
    pub fn new(
        project_id: String,
        version: String,
        name: String,
        description: Option<String>,
        nodes: Vec<Node>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            version,
            name,
            description: description.filter(|d| !d.trim().is_empty()),
            created_at: Utc::now(),
            node_snapshot: nodes,
        }
    }

    /// Number of nodes captured in the snapshot
    pub fn node_count(&self) -> usize {
        self.node_snapshot.len()
    }
}

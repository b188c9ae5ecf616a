//! Project Model
//!
//! A project owns one outline (every node with a matching `project_id`)
//! and carries the label of its current version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version label given to freshly created projects
pub const INITIAL_VERSION: &str = "1.0.0";

fn default_version() -> String {
    INITIAL_VERSION.to_string()
}

/// A named outline project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,

    /// Label of the most recently created, restored, or merged version
    #[serde(default = "default_version")]
    pub current_version: String,
}

impl Project {
    /// Create a new project with an auto-generated UUID
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: Utc::now(),
            current_version: default_version(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_project_starts_at_initial_version() {
        let project = Project::new("Roadmap".to_string());
        assert_eq!(project.current_version, INITIAL_VERSION);
        assert!(!project.id.is_empty());
    }

    #[test]
    fn test_legacy_project_without_version_deserializes() {
        let project: Project = serde_json::from_value(json!({
            "id": "p1",
            "name": "Old",
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(project.current_version, "1.0.0");
    }
}

//! Version Snapshot Manager
//!
//! Named, immutable snapshots of a project's outline, plus restore and
//! merge between snapshots.
//!
//! Snapshots own deep copies of their nodes. Restoring gives every node a
//! fresh id, so references to ids from before the restore no longer
//! resolve. Merging never modifies the two input snapshots: the result is
//! stored as a new snapshot.

use crate::config::EngineConfig;
use crate::db::{Collections, KeyValueStore};
use crate::models::{Node, ProjectVersion};
use crate::services::error::ServiceError;
use crate::services::node_repository::NodeRepository;
use crate::services::project_service::ProjectService;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// How two snapshots are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// The result is the source snapshot verbatim
    Destructive,
    /// Start from the target; source nodes replace same-id target nodes,
    /// other source nodes are appended
    NonDestructive,
}

impl MergeStrategy {
    pub fn from_destructive(destructive: bool) -> Self {
        if destructive {
            Self::Destructive
        } else {
            Self::NonDestructive
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Destructive => "Destructive merge: source replaced target",
            Self::NonDestructive => {
                "Non-destructive merge: source nodes override target nodes by id"
            }
        }
    }
}

pub struct VersionService<S: KeyValueStore> {
    collections: Collections<S>,
    nodes: NodeRepository<S>,
    projects: ProjectService<S>,
}

impl<S: KeyValueStore> VersionService<S> {
    pub fn new(store: Arc<S>, config: &EngineConfig) -> Self {
        Self {
            collections: Collections::new(store.clone(), config.keys.clone()),
            nodes: NodeRepository::new(store.clone(), config),
            projects: ProjectService::new(store, config),
        }
    }

    /// Store a snapshot of `nodes` and make `version` the project's
    /// current version label
    pub fn create_version(
        &self,
        project_id: &str,
        version: &str,
        name: &str,
        nodes: &[Node],
        description: Option<&str>,
    ) -> Result<ProjectVersion, ServiceError> {
        let snapshot = ProjectVersion::new(
            project_id.to_string(),
            version.trim().to_string(),
            name.trim().to_string(),
            description.map(|d| d.trim().to_string()),
            nodes.to_vec(),
        );

        let mut versions = self.collections.load_versions()?;
        versions.push(snapshot.clone());
        self.collections.save_versions(&versions)?;
        self.projects.set_current_version(project_id, &snapshot.version)?;

        tracing::info!(
            "Created version {} '{}' of project {} with {} nodes",
            snapshot.version,
            snapshot.name,
            project_id,
            snapshot.node_count()
        );
        Ok(snapshot)
    }

    /// Snapshot the project's live nodes
    pub fn snapshot_project(
        &self,
        project_id: &str,
        version: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<ProjectVersion, ServiceError> {
        let nodes = self.nodes.get_by_project(project_id)?;
        self.create_version(project_id, version, name, &nodes, description)
    }

    /// Versions of a project, oldest first
    pub fn get_versions(&self, project_id: &str) -> Result<Vec<ProjectVersion>, ServiceError> {
        Ok(self
            .collections
            .load_versions()?
            .into_iter()
            .filter(|v| v.project_id == project_id)
            .collect())
    }

    pub fn get_version(&self, version_id: &str) -> Result<Option<ProjectVersion>, ServiceError> {
        Ok(self
            .collections
            .load_versions()?
            .into_iter()
            .find(|v| v.id == version_id))
    }

    /// Replace the project's live nodes with a copy of a snapshot.
    ///
    /// Every restored node gets a fresh id and `parent_id` links are
    /// remapped to match. Returns the restored nodes, or `Ok(None)` when the
    /// version does not exist for this project.
    pub fn restore_version(
        &self,
        project_id: &str,
        version_id: &str,
    ) -> Result<Option<Vec<Node>>, ServiceError> {
        let Some(version) = self.find(project_id, version_id)? else {
            tracing::warn!(
                "Restore ignored: version {} not found for project {}",
                version_id,
                project_id
            );
            return Ok(None);
        };

        let restored = with_fresh_ids(project_id, &version.node_snapshot);
        self.nodes
            .replace_project_nodes(project_id, restored.clone())?;
        self.projects
            .set_current_version(project_id, &version.version)?;

        tracing::info!(
            "Restored project {} to version {} ({} nodes)",
            project_id,
            version.version,
            restored.len()
        );
        Ok(Some(restored))
    }

    /// Combine two snapshots into a new one.
    ///
    /// The new snapshot's label bumps the minor component of the project's
    /// current version, and becomes the project's current version.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::VersionNotFound` if either version id does not
    /// exist for this project.
    pub fn merge_versions(
        &self,
        project_id: &str,
        source_id: &str,
        target_id: &str,
        destructive: bool,
    ) -> Result<ProjectVersion, ServiceError> {
        let source = self
            .find(project_id, source_id)?
            .ok_or_else(|| ServiceError::version_not_found(source_id))?;
        let target = self
            .find(project_id, target_id)?
            .ok_or_else(|| ServiceError::version_not_found(target_id))?;

        let strategy = MergeStrategy::from_destructive(destructive);
        let merged = merge_nodes(&source.node_snapshot, &target.node_snapshot, strategy);

        let current = match self.projects.get(project_id)? {
            Some(project) => project.current_version,
            None => target.version.clone(),
        };

        let result = self.create_version(
            project_id,
            &bump_minor_version(&current),
            &format!("Merge: {} → {}", source.name, target.name),
            &merged,
            Some(strategy.describe()),
        )?;

        tracing::info!(
            "Merged version {} into {} as {} ({:?})",
            source.version,
            target.version,
            result.version,
            strategy
        );
        Ok(result)
    }

    fn find(
        &self,
        project_id: &str,
        version_id: &str,
    ) -> Result<Option<ProjectVersion>, ServiceError> {
        Ok(self
            .get_version(version_id)?
            .filter(|v| v.project_id == project_id))
    }
}

/// Per-id last-writer-wins merge of two node sets
pub fn merge_nodes(source: &[Node], target: &[Node], strategy: MergeStrategy) -> Vec<Node> {
    match strategy {
        MergeStrategy::Destructive => source.to_vec(),
        MergeStrategy::NonDestructive => {
            let mut merged = target.to_vec();
            let mut positions: HashMap<String, usize> = merged
                .iter()
                .enumerate()
                .map(|(i, n)| (n.id.clone(), i))
                .collect();

            for node in source {
                match positions.get(&node.id) {
                    Some(&i) => merged[i] = node.clone(),
                    None => {
                        positions.insert(node.id.clone(), merged.len());
                        merged.push(node.clone());
                    }
                }
            }
            merged
        }
    }
}

/// Copy `nodes` into `project_id` with fresh ids, remapping parent links.
///
/// A parent outside the set becomes `None`.
pub fn with_fresh_ids(project_id: &str, nodes: &[Node]) -> Vec<Node> {
    let id_map: HashMap<&str, String> = nodes
        .iter()
        .map(|n| (n.id.as_str(), Uuid::new_v4().to_string()))
        .collect();

    nodes
        .iter()
        .map(|node| {
            let mut copy = node.clone();
            copy.id = id_map
                .get(node.id.as_str())
                .cloned()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            copy.project_id = project_id.to_string();
            copy.parent_id = node
                .parent_id
                .as_deref()
                .and_then(|p| id_map.get(p))
                .cloned();
            copy
        })
        .collect()
}

/// Increment the minor component of a version label.
///
/// `1.0.0` becomes `1.1.0`, `2.3` becomes `2.4`, and `v1.9.2` becomes
/// `v1.10.0`. A label without a numeric minor component gets `.1` appended.
pub fn bump_minor_version(label: &str) -> String {
    let trimmed = label.trim();
    let (prefix, numbers) = match trimmed.strip_prefix(['v', 'V']) {
        Some(rest) => (&trimmed[..1], rest),
        None => ("", trimmed),
    };

    let parts: Vec<&str> = numbers.split('.').collect();
    let numeric: Option<Vec<u64>> = parts.iter().map(|p| p.parse().ok()).collect();

    match numeric {
        Some(mut values) if values.len() >= 2 => match values[1].checked_add(1) {
            Some(minor) => {
                values[1] = minor;
                for patch in values.iter_mut().skip(2) {
                    *patch = 0;
                }
                let joined: Vec<String> = values.iter().map(u64::to_string).collect();
                format!("{}{}", prefix, joined.join("."))
            }
            // Minor component is saturated
            None => format!("{}.1", trimmed),
        },
        Some(values) if values.len() == 1 => format!("{}{}.1", prefix, values[0]),
        _ => format!("{}.1", trimmed),
    }
}

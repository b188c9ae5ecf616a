//! Text Search
//!
//! Case-insensitive substring search across project names and node
//! contents. Project matches come first.

use crate::config::EngineConfig;
use crate::db::{Collections, KeyValueStore};
use crate::models::{Node, Project};
use crate::services::error::ServiceError;
use serde::Serialize;
use std::sync::Arc;

/// Default cap on returned results
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SearchResult {
    Project {
        project: Project,
    },
    #[serde(rename_all = "camelCase")]
    Node {
        node: Node,
        project_id: String,
    },
}

pub struct SearchService<S: KeyValueStore> {
    collections: Collections<S>,
}

impl<S: KeyValueStore> SearchService<S> {
    pub fn new(store: Arc<S>, config: &EngineConfig) -> Self {
        Self {
            collections: Collections::new(store, config.keys.clone()),
        }
    }

    /// Search projects then nodes, truncated to `limit`.
    ///
    /// A blank query matches nothing.
    pub fn search_all(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ServiceError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let projects = self.collections.load_projects()?;
        let nodes = self.collections.load_nodes()?;

        let project_hits = projects
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .map(|project| SearchResult::Project { project });

        let node_hits = nodes
            .into_iter()
            .filter(|n| n.content.to_lowercase().contains(&needle))
            .map(|node| SearchResult::Node {
                project_id: node.project_id.clone(),
                node,
            });

        let results: Vec<SearchResult> = project_hits.chain(node_hits).take(limit).collect();
        tracing::debug!("Search '{}' matched {} results", needle, results.len());
        Ok(results)
    }
}

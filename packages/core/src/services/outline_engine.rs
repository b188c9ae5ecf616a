//! Outline Engine
//!
//! Wires every service to one key-value store and one configuration.
//!
//! # Examples
//!
//! ```rust
//! use layercake_core::operations::DropPosition;
//! use layercake_core::services::OutlineEngine;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = OutlineEngine::in_memory();
//! let project = engine.projects().create("Groceries")?;
//!
//! let mutator = engine.mutator_mut();
//! let list = mutator.create_root(&project.id, "List", None)?.unwrap();
//! let milk = mutator.create_child(&list.id, "Milk")?.unwrap();
//! let eggs = mutator.create_child(&list.id, "Eggs")?.unwrap();
//!
//! assert!(mutator
//!     .move_to_position(&eggs.id, &milk.id, DropPosition::Before)?
//!     .is_applied());
//! let order: Vec<_> = engine
//!     .nodes()
//!     .get_children(&list.id)?
//!     .into_iter()
//!     .map(|n| n.content)
//!     .collect();
//! assert_eq!(order, vec!["Eggs", "Milk"]);
//! # Ok(())
//! # }
//! ```

use crate::config::EngineConfig;
use crate::db::{FileStore, KeyValueStore, MemoryStore};
use crate::services::error::ServiceError;
use crate::services::node_repository::NodeRepository;
use crate::services::project_service::ProjectService;
use crate::services::search::{SearchResult, SearchService};
use crate::services::tree_mutator::TreeMutator;
use crate::services::undo_ledger::UndoLedger;
use crate::services::version_service::VersionService;
use std::path::PathBuf;
use std::sync::Arc;

pub struct OutlineEngine<S: KeyValueStore> {
    config: EngineConfig,
    store: Arc<S>,
    nodes: NodeRepository<S>,
    mutator: TreeMutator<S>,
    versions: VersionService<S>,
    projects: ProjectService<S>,
    search: SearchService<S>,
}

impl OutlineEngine<MemoryStore> {
    /// Engine over a fresh in-memory store with default configuration
    pub fn in_memory() -> Self {
        Self::with_config(Arc::new(MemoryStore::new()), EngineConfig::default())
    }
}

impl OutlineEngine<FileStore> {
    /// Engine persisting to JSON files under `dir`
    pub fn open_dir(dir: impl Into<PathBuf>, config: EngineConfig) -> Result<Self, ServiceError> {
        let store = FileStore::open(dir)?;
        Self::new(Arc::new(store), config)
    }
}

impl<S: KeyValueStore> OutlineEngine<S> {
    /// Build an engine after validating `config`
    pub fn new(store: Arc<S>, config: EngineConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        Ok(Self::with_config(store, config))
    }

    fn with_config(store: Arc<S>, config: EngineConfig) -> Self {
        let nodes = NodeRepository::new(store.clone(), &config);
        let mutator = TreeMutator::new(nodes.clone(), UndoLedger::new(config.history_limit));

        tracing::debug!(
            "Outline engine ready (order step {}, history limit {})",
            config.order_step,
            config.history_limit
        );

        Self {
            versions: VersionService::new(store.clone(), &config),
            projects: ProjectService::new(store.clone(), &config),
            search: SearchService::new(store.clone(), &config),
            nodes,
            mutator,
            store,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn nodes(&self) -> &NodeRepository<S> {
        &self.nodes
    }

    pub fn mutator(&self) -> &TreeMutator<S> {
        &self.mutator
    }

    pub fn mutator_mut(&mut self) -> &mut TreeMutator<S> {
        &mut self.mutator
    }

    pub fn versions(&self) -> &VersionService<S> {
        &self.versions
    }

    pub fn projects(&self) -> &ProjectService<S> {
        &self.projects
    }

    pub fn search(&self) -> &SearchService<S> {
        &self.search
    }

    /// Shorthand for [`SearchService::search_all`]
    pub fn search_all(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ServiceError> {
        self.search.search_all(query, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use tempfile::TempDir;

    #[test]
    fn test_rejects_invalid_config() {
        let config = EngineConfig {
            order_step: 0.0,
            ..Default::default()
        };
        let result = OutlineEngine::new(Arc::new(MemoryStore::new()), config);
        assert!(matches!(
            result,
            Err(ServiceError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_services_share_store() {
        let mut engine = OutlineEngine::in_memory();
        let project = engine.projects().create("Shared").unwrap();
        engine
            .mutator_mut()
            .create_root(&project.id, "shared node", None)
            .unwrap();

        assert_eq!(engine.nodes().get_by_project(&project.id).unwrap().len(), 1);
        assert_eq!(engine.search_all("shared", 10).unwrap().len(), 2);
    }

    #[test]
    fn test_file_engine_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();

        let project_id = {
            let mut engine =
                OutlineEngine::open_dir(temp_dir.path(), EngineConfig::default()).unwrap();
            let project = engine.projects().create("Persistent").unwrap();
            engine
                .mutator_mut()
                .create_root(&project.id, "kept", None)
                .unwrap();
            project.id
        };

        let engine = OutlineEngine::open_dir(temp_dir.path(), EngineConfig::default()).unwrap();
        let roots = engine.nodes().get_roots(&project_id).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].content, "kept");
        assert!(!engine.mutator().ledger().can_undo());
    }
}

//! Typed JSON Collections
//!
//! Nodes, projects, and versions are each stored as a JSON array under one
//! stable key. `Collections` reads a whole array, hands it to the caller,
//! and writes the whole array back: a read-modify-write of the entire
//! collection per mutation.

use crate::config::StorageKeys;
use crate::db::{KeyValueStore, StoreError};
use crate::models::{Node, Project, ProjectVersion};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Typed access to the JSON collections inside a [`KeyValueStore`]
pub struct Collections<S: KeyValueStore> {
    store: Arc<S>,
    keys: StorageKeys,
}

impl<S: KeyValueStore> Clone for Collections<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
        }
    }
}

impl<S: KeyValueStore> Collections<S> {
    pub fn new(store: Arc<S>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Load the array stored under `key`; a missing key is an empty list
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        match self.store.get(key)? {
            Some(raw) if !raw.trim().is_empty() => {
                serde_json::from_str(&raw).map_err(|e| StoreError::serialization(key, e))
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Replace the array stored under `key`
    pub fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items).map_err(|e| StoreError::serialization(key, e))?;
        self.store.set(key, &raw)
    }

    pub fn load_nodes(&self) -> Result<Vec<Node>, StoreError> {
        self.load(&self.keys.nodes)
    }

    pub fn save_nodes(&self, nodes: &[Node]) -> Result<(), StoreError> {
        self.save(&self.keys.nodes, nodes)
    }

    pub fn load_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.load(&self.keys.projects)
    }

    pub fn save_projects(&self, projects: &[Project]) -> Result<(), StoreError> {
        self.save(&self.keys.projects, projects)
    }

    pub fn load_versions(&self) -> Result<Vec<ProjectVersion>, StoreError> {
        self.load(&self.keys.versions)
    }

    pub fn save_versions(&self, versions: &[ProjectVersion]) -> Result<(), StoreError> {
        self.save(&self.keys.versions, versions)
    }
}

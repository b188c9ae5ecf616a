//! Project Registry
//!
//! Stores the list of projects and each project's current version label.

use crate::config::EngineConfig;
use crate::db::{Collections, KeyValueStore};
use crate::models::Project;
use crate::services::error::ServiceError;
use std::sync::Arc;

/// Name given to projects created with a blank name
pub const UNTITLED_PROJECT: &str = "Untitled Project";

pub struct ProjectService<S: KeyValueStore> {
    collections: Collections<S>,
}

impl<S: KeyValueStore> Clone for ProjectService<S> {
    fn clone(&self) -> Self {
        Self {
            collections: self.collections.clone(),
        }
    }
}

impl<S: KeyValueStore> ProjectService<S> {
    pub fn new(store: Arc<S>, config: &EngineConfig) -> Self {
        Self {
            collections: Collections::new(store, config.keys.clone()),
        }
    }

    pub fn list(&self) -> Result<Vec<Project>, ServiceError> {
        Ok(self.collections.load_projects()?)
    }

    pub fn get(&self, id: &str) -> Result<Option<Project>, ServiceError> {
        Ok(self.list()?.into_iter().find(|p| p.id == id))
    }

    pub fn create(&self, name: &str) -> Result<Project, ServiceError> {
        let name = match name.trim() {
            "" => UNTITLED_PROJECT,
            trimmed => trimmed,
        };
        let project = Project::new(name.to_string());

        let mut projects = self.list()?;
        projects.push(project.clone());
        self.collections.save_projects(&projects)?;

        tracing::info!("Created project {} ({})", project.name, project.id);
        Ok(project)
    }

    /// Rename a project; returns `false` if it does not exist
    pub fn rename(&self, id: &str, name: &str) -> Result<bool, ServiceError> {
        let name = name.trim().to_string();
        self.modify(id, move |project| project.name = name)
    }

    /// Set the current version label; returns `false` if the project does not exist
    pub fn set_current_version(&self, id: &str, version: &str) -> Result<bool, ServiceError> {
        let version = version.to_string();
        self.modify(id, move |project| project.current_version = version)
    }

    /// Current version label of a project
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::ProjectNotFound` for an unknown id.
    pub fn current_version(&self, id: &str) -> Result<String, ServiceError> {
        self.get(id)?
            .map(|p| p.current_version)
            .ok_or_else(|| ServiceError::project_not_found(id))
    }

    fn modify(&self, id: &str, change: impl FnOnce(&mut Project)) -> Result<bool, ServiceError> {
        let mut projects = self.list()?;
        let Some(project) = projects.iter_mut().find(|p| p.id == id) else {
            tracing::warn!("Project {} not found, update ignored", id);
            return Ok(false);
        };
        change(project);
        self.collections.save_projects(&projects)?;
        Ok(true)
    }
}

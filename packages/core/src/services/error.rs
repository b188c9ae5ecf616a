//! Service Layer Error Types
//!
//! Most invalid requests against the outline are not errors: they are
//! absorbed as no-ops and reported through return values. This type covers
//! what must reach the caller: storage failures, invalid nodes, and version
//! references that cannot be resolved.

use crate::config::ConfigError;
use crate::db::StoreError;
use crate::models::ValidationError;
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Storage operation failed
    #[error("Storage operation failed: {0}")]
    Store(#[from] StoreError),

    /// Validation failed for node
    #[error("Node validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Engine configuration is invalid
    #[error("Invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    /// A version id could not be found for the project
    #[error("Version not found: {version_id}")]
    VersionNotFound { version_id: String },

    /// A project id could not be found
    #[error("Project not found: {project_id}")]
    ProjectNotFound { project_id: String },
}

impl ServiceError {
    /// Create a version not found error
    pub fn version_not_found(version_id: impl Into<String>) -> Self {
        Self::VersionNotFound {
            version_id: version_id.into(),
        }
    }

    /// Create a project not found error
    pub fn project_not_found(project_id: impl Into<String>) -> Self {
        Self::ProjectNotFound {
            project_id: project_id.into(),
        }
    }
}

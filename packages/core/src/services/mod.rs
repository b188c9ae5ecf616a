//! Business Services
//!
//! This module contains the outline engine's services:
//!
//! - `NodeRepository` - Node CRUD, ordered child queries, cascade delete
//! - `TreeMutator` - Indent, outdent, drag-and-drop, edits, undo/redo replay
//! - `UndoLedger` - Bounded linear undo/redo history
//! - `VersionService` - Snapshots, restore, and merge
//! - `ProjectService` - Project registry and version labels
//! - `SearchService` - Text search over projects and nodes
//! - `OutlineEngine` - All of the above sharing one store
//!
//! Services coordinate between the storage layer and callers, enforcing the
//! tree invariants before anything is written.

pub mod error;
pub mod node_repository;
pub mod outline_engine;
pub mod project_service;
pub mod search;
pub mod tree_mutator;
pub mod undo_ledger;
pub mod version_service;

pub use error::ServiceError;
pub use node_repository::NodeRepository;
pub use outline_engine::OutlineEngine;
pub use project_service::{ProjectService, UNTITLED_PROJECT};
pub use search::{SearchResult, SearchService, DEFAULT_SEARCH_LIMIT};
pub use tree_mutator::{sibling_focus_target, TreeMutator};
pub use undo_ledger::UndoLedger;
pub use version_service::{
    bump_minor_version, merge_nodes, with_fresh_ids, MergeStrategy, VersionService,
};

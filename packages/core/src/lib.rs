//! Layercake Core Outline Engine
//!
//! This crate provides the data management layer of the Layercake outliner:
//! a hierarchical tree of nodes per project, fractional sibling ordering,
//! structural edits with undo/redo, and named version snapshots.
//!
//! # Architecture
//!
//! - **Flat node collection**: nodes reference their parent by id; the tree
//!   is rebuilt on demand through an adjacency index
//! - **Key-value persistence**: every collection is a JSON array stored
//!   under a stable key, rewritten in full on each mutation
//! - **Synchronous**: every operation runs to completion on the caller's
//!   thread
//! - **Invariants before writes**: moves that would create a cycle or touch
//!   a locked node are rejected before anything is stored
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, Project, ProjectVersion, UndoAction)
//! - [`db`] - Key-value store, typed collections, hierarchy index, ordering
//! - [`operations`] - Parameter and outcome types for mutations
//! - [`services`] - Repository, tree mutator, undo ledger, versions, search
//! - [`config`] - Engine configuration
//! - [`logging`] - `tracing` subscriber setup for host applications

pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig, StorageKeys};
pub use db::{FileStore, KeyValueStore, MemoryStore, OrderAllocator, StoreError};
pub use models::*;
pub use operations::{CreateNodeParams, DropPosition, MutationOutcome, RejectReason};
pub use services::*;

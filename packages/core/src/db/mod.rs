//! Storage Layer
//!
//! This module handles everything below the services:
//!
//! - [`KeyValueStore`] - the string get/set contract persistence goes through
//! - [`Collections`] - typed JSON arrays of nodes, projects, and versions
//! - [`HierarchyIndex`] - adjacency index for descendant and ancestor walks
//! - [`OrderAllocator`] - fractional sibling ordering and renormalization
//!
//! # Architecture
//!
//! Every mutation reads the full collection, changes it in memory, and
//! writes the full collection back. There is never a partially written
//! collection visible between two synchronous calls.

mod collections;
mod error;
pub mod fractional_ordering;
pub mod hierarchy;
mod kv_store;

pub use collections::Collections;
pub use error::StoreError;
pub use fractional_ordering::{OrderAllocator, OrderAssignment};
pub use hierarchy::{AncestorWalk, HierarchyIndex, WalkEnd};
pub use kv_store::{FileStore, KeyValueStore, MemoryStore};

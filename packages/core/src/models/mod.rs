//! Data Models
//!
//! This module contains the core data structures of the outline engine:
//!
//! - `Node` - One outline entry in a flat, parent-referenced collection
//! - `Project` - Owner of an outline and its current version label
//! - `ProjectVersion` - Immutable snapshot of a project's nodes
//! - `UndoAction` - Reversible mutation recorded in the undo ledger

mod node;
mod project;
mod undo;
mod version;

pub use node::{
    compare_order, sort_by_order, DeleteResult, Node, NodeUpdate, NodeWithChildren,
    ValidationError,
};
pub use project::{Project, INITIAL_VERSION};
pub use undo::{UndoAction, UndoActionType, UndoChange};
pub use version::ProjectVersion;

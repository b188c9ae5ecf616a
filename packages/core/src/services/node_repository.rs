//! Node Repository
//!
//! Flat collection of nodes over a [`KeyValueStore`]: CRUD, parent/child
//! queries ordered by sibling order, cascade delete, and ancestry checks.
//!
//! Every call loads the full node collection and, if it mutates, writes the
//! full collection back before returning. Calls that reference a missing id
//! are logged no-ops rather than errors.
//!
//! # Examples
//!
//! ```rust
//! use layercake_core::config::EngineConfig;
//! use layercake_core::db::MemoryStore;
//! use layercake_core::operations::CreateNodeParams;
//! use layercake_core::services::NodeRepository;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = NodeRepository::new(Arc::new(MemoryStore::new()), &EngineConfig::default());
//!
//! let root = repo.create(CreateNodeParams::root("p1", "Trip"))?.unwrap();
//! repo.create(CreateNodeParams::child("p1", root.id.clone(), "Book flights"))?;
//! repo.create(CreateNodeParams::child("p1", root.id.clone(), "Pack"))?;
//!
//! let children = repo.get_children(&root.id)?;
//! assert_eq!(children[0].content, "Book flights");
//! assert_eq!(children[0].order, Some(1000.0));
//! assert_eq!(children[1].order, Some(2000.0));
//! # Ok(())
//! # }
//! ```

use crate::config::EngineConfig;
use crate::db::{Collections, HierarchyIndex, KeyValueStore, OrderAllocator};
use crate::models::{
    sort_by_order, DeleteResult, Node, NodeUpdate, NodeWithChildren, ValidationError,
};
use crate::operations::{CreateNodeParams, RejectReason};
use crate::services::error::ServiceError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Repository for outline nodes
pub struct NodeRepository<S: KeyValueStore> {
    collections: Collections<S>,
    allocator: OrderAllocator,
    max_ancestor_depth: usize,
}

impl<S: KeyValueStore> Clone for NodeRepository<S> {
    fn clone(&self) -> Self {
        Self {
            collections: self.collections.clone(),
            allocator: self.allocator,
            max_ancestor_depth: self.max_ancestor_depth,
        }
    }
}

impl<S: KeyValueStore> NodeRepository<S> {
    pub fn new(store: Arc<S>, config: &EngineConfig) -> Self {
        Self {
            collections: Collections::new(store, config.keys.clone()),
            allocator: config.order_allocator(),
            max_ancestor_depth: config.max_ancestor_depth,
        }
    }

    pub fn allocator(&self) -> &OrderAllocator {
        &self.allocator
    }

    pub fn max_ancestor_depth(&self) -> usize {
        self.max_ancestor_depth
    }

    /// Every node across all projects, in stored order
    pub fn get_all(&self) -> Result<Vec<Node>, ServiceError> {
        Ok(self.collections.load_nodes()?)
    }

    /// Rewrite the whole node collection
    pub fn save_all(&self, nodes: &[Node]) -> Result<(), ServiceError> {
        self.collections.save_nodes(nodes)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Node>, ServiceError> {
        Ok(self.get_all()?.into_iter().find(|n| n.id == id))
    }

    pub fn get_by_project(&self, project_id: &str) -> Result<Vec<Node>, ServiceError> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|n| n.project_id == project_id)
            .collect())
    }

    /// Children of `parent_id`, sorted ascending by order
    pub fn get_children(&self, parent_id: &str) -> Result<Vec<Node>, ServiceError> {
        let mut children: Vec<Node> = self
            .get_all()?
            .into_iter()
            .filter(|n| n.parent_id.as_deref() == Some(parent_id))
            .collect();
        sort_by_order(&mut children);
        Ok(children)
    }

    /// Root nodes of a project, sorted ascending by order
    pub fn get_roots(&self, project_id: &str) -> Result<Vec<Node>, ServiceError> {
        let mut roots: Vec<Node> = self
            .get_all()?
            .into_iter()
            .filter(|n| n.project_id == project_id && n.parent_id.is_none())
            .collect();
        sort_by_order(&mut roots);
        Ok(roots)
    }

    /// Persist a new node.
    ///
    /// If `order` is unset it becomes `max(sibling orders) + step`, so the
    /// node sorts last among its siblings.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the node is malformed or its id
    /// is already in use.
    pub fn add(&self, mut node: Node) -> Result<Node, ServiceError> {
        node.validate()?;

        let mut nodes = self.get_all()?;
        if nodes.iter().any(|n| n.id == node.id) {
            return Err(ValidationError::DuplicateId(node.id).into());
        }

        {
            let index = HierarchyIndex::build(&nodes, self.max_ancestor_depth);
            // Orphans already pointing at this id would close a loop through it
            if let Some(parent_id) = node.parent_id.as_deref() {
                if index.would_create_cycle(&node.id, parent_id)
                    || index.descendants(&node.id).iter().any(|d| d == parent_id)
                {
                    tracing::warn!(
                        "Refusing to add {}: parent {} already descends from it",
                        node.id,
                        parent_id
                    );
                    return Err(ValidationError::InvalidParent(parent_id.to_string()).into());
                }
            }

            if node.order.is_none() {
                let siblings = index.children_of(node.parent_id.as_deref(), &node.project_id);
                node.order = Some(self.allocator.append_order(&siblings));
            }
        }

        tracing::debug!(
            "Adding node {} under {:?} with order {:?}",
            node.id,
            node.parent_id,
            node.order
        );
        nodes.push(node.clone());
        self.save_all(&nodes)?;
        Ok(node)
    }

    /// Create a node with a fresh id (root add, child add, sibling add).
    ///
    /// Returns `Ok(None)` without writing when the parent is missing or
    /// belongs to another project. With `insert_after_node_id` the node is
    /// placed right after that sibling and the sibling set is renormalized;
    /// an unknown sibling falls back to appending.
    pub fn create(&self, params: CreateNodeParams) -> Result<Option<Node>, ServiceError> {
        let mut nodes = self.get_all()?;

        let mut node = Node::new(params.project_id, params.parent_id, params.content);
        if node.is_root() {
            node.title = params.title;
        }
        node.validate()?;

        let order = {
            let index = HierarchyIndex::build(&nodes, self.max_ancestor_depth);

            if let Some(parent_id) = node.parent_id.as_deref() {
                match index.get(parent_id) {
                    Some(parent) if parent.project_id == node.project_id => {}
                    Some(_) => {
                        tracing::warn!(
                            "Refusing to create node under {}: parent belongs to another project",
                            parent_id
                        );
                        return Ok(None);
                    }
                    None => {
                        tracing::warn!("Cannot create node: parent {} not found", parent_id);
                        return Ok(None);
                    }
                }
            }

            let siblings = index.children_of(node.parent_id.as_deref(), &node.project_id);
            let position = params
                .insert_after_node_id
                .as_deref()
                .and_then(|after| siblings.iter().position(|s| s.id == after));

            match (params.insert_after_node_id.as_deref(), position) {
                (Some(_), Some(i)) => self.allocator.order_for_position(&siblings, i + 1),
                (Some(after), None) => {
                    tracing::warn!(
                        "Sibling {} not found under {:?}, appending instead",
                        after,
                        node.parent_id
                    );
                    self.allocator.append_order(&siblings)
                }
                (None, _) => self.allocator.append_order(&siblings),
            }
        };
        node.order = Some(order);

        let parent_id = node.parent_id.clone();
        let project_id = node.project_id.clone();
        nodes.push(node.clone());
        renormalize_siblings(
            &mut nodes,
            parent_id.as_deref(),
            &project_id,
            &self.allocator,
            self.max_ancestor_depth,
        );
        self.save_all(&nodes)?;

        let created = nodes.into_iter().find(|n| n.id == node.id).unwrap_or(node);
        tracing::debug!("Created node {} with order {:?}", created.id, created.order);
        Ok(Some(created))
    }

    /// Merge `update` into the node `id`.
    ///
    /// Returns `Ok(false)` without writing when the node is missing, when a
    /// new parent is missing, in another project, locked, or would create a
    /// cycle, or when the update touches the parent/order/content of a
    /// locked node without unlocking it in the same update. A patched node
    /// that fails validation is an error. `id` and `project_id` cannot
    /// change.
    pub fn update(&self, id: &str, update: NodeUpdate) -> Result<bool, ServiceError> {
        let mut nodes = self.get_all()?;

        let patched = {
            let index = HierarchyIndex::build(&nodes, self.max_ancestor_depth);
            let Some(node) = index.get(id) else {
                tracing::warn!("Update ignored: node {} not found", id);
                return Ok(false);
            };

            if node.locked && update.locked != Some(false) && update.touches_locked_fields() {
                tracing::warn!("Update ignored: node {} is locked", id);
                return Ok(false);
            }

            if let Some(Some(new_parent)) = update.parent_id.as_ref() {
                if let Err(reason) = accepting_parent(&index, node, new_parent) {
                    tracing::warn!(
                        "Update ignored: cannot move {} under {}: {}",
                        id,
                        new_parent,
                        reason
                    );
                    return Ok(false);
                }
            }

            let mut patched = node.clone();
            patched.apply(update);
            patched.validate()?;
            patched
        };

        if let Some(slot) = nodes.iter_mut().find(|n| n.id == id) {
            *slot = patched;
        }
        self.save_all(&nodes)?;
        Ok(true)
    }

    /// Delete a node and, recursively, every descendant
    pub fn delete(&self, id: &str) -> Result<DeleteResult, ServiceError> {
        let removed = self.remove_subtree(id)?;
        if removed.is_empty() {
            return Ok(DeleteResult::not_found());
        }
        Ok(DeleteResult::existed(
            removed.into_iter().map(|n| n.id).collect(),
        ))
    }

    /// Delete a node and its descendants, returning the removed nodes
    /// (the node first, then descendants breadth-first)
    pub fn remove_subtree(&self, id: &str) -> Result<Vec<Node>, ServiceError> {
        let mut nodes = self.get_all()?;

        let subtree = HierarchyIndex::build(&nodes, self.max_ancestor_depth).subtree_ids(id);
        if subtree.is_empty() {
            tracing::warn!("Delete ignored: node {} not found", id);
            return Ok(Vec::new());
        }

        let doomed: HashSet<&str> = subtree.iter().map(String::as_str).collect();
        let (mut removed, kept): (Vec<Node>, Vec<Node>) = nodes
            .drain(..)
            .partition(|n| doomed.contains(n.id.as_str()));
        self.save_all(&kept)?;

        // Report in cascade order rather than storage order
        let position: HashMap<&str, usize> = subtree
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        removed.sort_by_key(|n| position.get(n.id.as_str()).copied());
        tracing::debug!("Deleted node {} and {} descendants", id, removed.len() - 1);
        Ok(removed)
    }

    /// Remove every node of `project_id` and store `replacement` in its place
    pub fn replace_project_nodes(
        &self,
        project_id: &str,
        replacement: Vec<Node>,
    ) -> Result<(), ServiceError> {
        let mut nodes = self.get_all()?;
        nodes.retain(|n| n.project_id != project_id);
        nodes.extend(replacement);
        self.save_all(&nodes)
    }

    /// True iff `ancestor_id` is reached walking up from `node_id`'s parent.
    ///
    /// The walk is bounded, so it terminates on corrupted data.
    pub fn is_descendant_of(&self, node_id: &str, ancestor_id: &str) -> Result<bool, ServiceError> {
        let nodes = self.get_all()?;
        Ok(HierarchyIndex::build(&nodes, self.max_ancestor_depth)
            .is_descendant_of(node_id, ancestor_id))
    }

    /// Ancestor chain from the root down to (and including) the node
    pub fn breadcrumbs(&self, id: &str) -> Result<Vec<Node>, ServiceError> {
        let nodes = self.get_all()?;
        let index = HierarchyIndex::build(&nodes, self.max_ancestor_depth);

        let Some(node) = index.get(id) else {
            return Ok(Vec::new());
        };

        let mut crumbs: Vec<Node> = index
            .ancestors(id)
            .ancestors
            .iter()
            .filter_map(|a| index.get(a).cloned())
            .collect();
        crumbs.reverse();
        crumbs.push(node.clone());
        Ok(crumbs)
    }

    /// Ordered nested view of a project's outline
    pub fn get_tree(&self, project_id: &str) -> Result<Vec<NodeWithChildren>, ServiceError> {
        let nodes = self.get_all()?;
        let index = HierarchyIndex::build(&nodes, self.max_ancestor_depth);
        let mut visited = HashSet::new();

        Ok(index
            .roots(project_id)
            .into_iter()
            .map(|root| build_tree_recursive(&index, root, &mut visited))
            .collect())
    }

    /// Renormalize the children of `parent_id` (or a project's roots)
    ///
    /// Returns how many orders changed.
    pub fn renormalize_children(
        &self,
        parent_id: Option<&str>,
        project_id: &str,
    ) -> Result<usize, ServiceError> {
        let mut nodes = self.get_all()?;
        let changed = renormalize_siblings(
            &mut nodes,
            parent_id,
            project_id,
            &self.allocator,
            self.max_ancestor_depth,
        );
        if changed > 0 {
            self.save_all(&nodes)?;
        }
        Ok(changed)
    }
}

fn build_tree_recursive<'a>(
    index: &HierarchyIndex<'a>,
    node: &'a Node,
    visited: &mut HashSet<&'a str>,
) -> NodeWithChildren {
    visited.insert(node.id.as_str());
    let children = index
        .children(&node.id)
        .iter()
        .filter(|child| !visited.contains(child.id.as_str()))
        .copied()
        .collect::<Vec<_>>()
        .into_iter()
        .map(|child| build_tree_recursive(index, child, visited))
        .collect();

    NodeWithChildren {
        node: node.clone(),
        children,
    }
}

/// Check that `parent_id` can take `node` as a child
pub(crate) fn accepting_parent(
    index: &HierarchyIndex<'_>,
    node: &Node,
    parent_id: &str,
) -> Result<(), RejectReason> {
    let parent = index
        .get(parent_id)
        .ok_or_else(|| RejectReason::NodeNotFound(parent_id.to_string()))?;

    if parent.project_id != node.project_id {
        return Err(RejectReason::CrossProject);
    }
    // A locked node keeps the children it has but accepts no new ones
    if parent.locked && node.parent_id.as_deref() != Some(parent_id) {
        return Err(RejectReason::ParentLocked(parent.id.clone()));
    }
    if index.would_create_cycle(&node.id, parent_id) {
        return Err(RejectReason::WouldCreateCycle);
    }
    Ok(())
}

/// Renormalize one sibling set inside an in-memory collection.
///
/// Not recorded anywhere: renormalization is bookkeeping, not a user edit.
/// Returns how many orders changed.
pub(crate) fn renormalize_siblings(
    nodes: &mut [Node],
    parent_id: Option<&str>,
    project_id: &str,
    allocator: &OrderAllocator,
    max_depth: usize,
) -> usize {
    let assignments = {
        let index = HierarchyIndex::build(nodes, max_depth);
        allocator.renormalize(&index.children_of(parent_id, project_id))
    };

    let slots: HashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), i))
        .collect();
    for assignment in &assignments {
        if let Some(&slot) = slots.get(&assignment.node_id) {
            nodes[slot].order = Some(assignment.order);
        }
    }
    assignments.len()
}

//! Tree Mutator
//!
//! Structural edits of an outline: indent, outdent, drag-and-drop moves,
//! cascade delete, node creation, and content/flag edits. Every operation
//! re-checks the tree invariants against freshly loaded state before it
//! writes anything:
//!
//! - no node may become its own ancestor
//! - a locked node's parent, order, and content never change
//! - a locked node never receives new children
//! - nodes never move across projects
//!
//! A refused operation returns [`MutationOutcome::Rejected`] and leaves the
//! store untouched. User-visible moves, edits, creates, and deletes are
//! recorded in the mutator's [`UndoLedger`]; renormalization writes are not.

use crate::db::{HierarchyIndex, KeyValueStore};
use crate::models::{DeleteResult, Node, UndoAction, UndoChange};
use crate::operations::{CreateNodeParams, DropPosition, MutationOutcome, RejectReason};
use crate::services::error::ServiceError;
use crate::services::node_repository::{accepting_parent, renormalize_siblings, NodeRepository};
use crate::services::undo_ledger::UndoLedger;
use std::collections::HashSet;

/// A validated move, ready to apply
#[derive(Debug, Clone)]
struct MovePlan {
    node_id: String,
    old_parent_id: Option<String>,
    old_order: Option<f64>,
    new_parent_id: Option<String>,
    order: f64,
}

/// Which way a ledger entry is replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    Undo,
    Redo,
}

/// Applies structural edits to the outline and records them for undo
pub struct TreeMutator<S: KeyValueStore> {
    repo: NodeRepository<S>,
    ledger: UndoLedger,
}

impl<S: KeyValueStore> TreeMutator<S> {
    pub fn new(repo: NodeRepository<S>, ledger: UndoLedger) -> Self {
        Self { repo, ledger }
    }

    pub fn repository(&self) -> &NodeRepository<S> {
        &self.repo
    }

    pub fn ledger(&self) -> &UndoLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut UndoLedger {
        &mut self.ledger
    }

    // ---------------------------------------------------------------------
    // Structural moves
    // ---------------------------------------------------------------------

    /// Make the node the last child of its immediately preceding sibling
    pub fn indent(&mut self, node_id: &str) -> Result<MutationOutcome, ServiceError> {
        let mut nodes = self.repo.get_all()?;

        let plan = {
            let index = self.index(&nodes);
            self.plan_indent(&index, node_id)
        };

        match plan {
            Ok(plan) => self.commit_move(&mut nodes, plan),
            Err(reason) => Ok(reject("indent", node_id, reason)),
        }
    }

    /// Make the node a sibling of its parent, placed right after the parent
    pub fn outdent(&mut self, node_id: &str) -> Result<MutationOutcome, ServiceError> {
        let mut nodes = self.repo.get_all()?;

        let plan = {
            let index = self.index(&nodes);
            self.plan_outdent(&index, node_id)
        };

        match plan {
            Ok(plan) => self.commit_move(&mut nodes, plan),
            Err(reason) => Ok(reject("outdent", node_id, reason)),
        }
    }

    /// Drop `dragged_id` before, after, or inside `target_id`
    pub fn move_to_position(
        &mut self,
        dragged_id: &str,
        target_id: &str,
        position: DropPosition,
    ) -> Result<MutationOutcome, ServiceError> {
        let mut nodes = self.repo.get_all()?;

        let plan = {
            let index = self.index(&nodes);
            self.plan_drop(&index, dragged_id, target_id, position)
        };

        match plan {
            Ok(plan) => self.commit_move(&mut nodes, plan),
            Err(reason) => Ok(reject("move", dragged_id, reason)),
        }
    }

    fn plan_indent(
        &self,
        index: &HierarchyIndex<'_>,
        node_id: &str,
    ) -> Result<MovePlan, RejectReason> {
        let node = movable(index, node_id)?;

        let siblings = index.sibling_set(node);
        let position = siblings
            .iter()
            .position(|s| s.id == node.id)
            .unwrap_or_default();
        let prev = position
            .checked_sub(1)
            .and_then(|i| siblings.get(i))
            .ok_or(RejectReason::NoPrecedingSibling)?;

        if prev.locked {
            return Err(RejectReason::ParentLocked(prev.id.clone()));
        }
        if index.would_create_cycle(&node.id, &prev.id) {
            return Err(RejectReason::WouldCreateCycle);
        }

        let new_siblings: Vec<&Node> = index.children(&prev.id).to_vec();
        Ok(MovePlan {
            node_id: node.id.clone(),
            old_parent_id: node.parent_id.clone(),
            old_order: node.order,
            new_parent_id: Some(prev.id.clone()),
            order: self.repo.allocator().append_order(&new_siblings),
        })
    }

    fn plan_outdent(
        &self,
        index: &HierarchyIndex<'_>,
        node_id: &str,
    ) -> Result<MovePlan, RejectReason> {
        let node = movable(index, node_id)?;

        let parent_id = node.parent_id.as_deref().ok_or(RejectReason::NoParent)?;
        let parent = index
            .get(parent_id)
            .ok_or_else(|| RejectReason::NodeNotFound(parent_id.to_string()))?;

        let new_parent_id = parent.parent_id.clone();
        if let Some(grandparent_id) = new_parent_id.as_deref() {
            accepting_parent(index, node, grandparent_id)?;
        }

        let siblings: Vec<&Node> = index
            .sibling_set(parent)
            .into_iter()
            .filter(|s| s.id != node.id)
            .collect();
        let after_parent = siblings
            .iter()
            .position(|s| s.id == parent.id)
            .map_or(siblings.len(), |i| i + 1);

        Ok(MovePlan {
            node_id: node.id.clone(),
            old_parent_id: node.parent_id.clone(),
            old_order: node.order,
            new_parent_id,
            order: self
                .repo
                .allocator()
                .order_for_position(&siblings, after_parent),
        })
    }

    fn plan_drop(
        &self,
        index: &HierarchyIndex<'_>,
        dragged_id: &str,
        target_id: &str,
        position: DropPosition,
    ) -> Result<MovePlan, RejectReason> {
        if dragged_id == target_id {
            return Err(RejectReason::SameNode);
        }

        let dragged = movable(index, dragged_id)?;
        let target = index
            .get(target_id)
            .ok_or_else(|| RejectReason::NodeNotFound(target_id.to_string()))?;

        if dragged.project_id != target.project_id {
            return Err(RejectReason::CrossProject);
        }
        if index.is_descendant_of(&target.id, &dragged.id) {
            return Err(RejectReason::WouldCreateCycle);
        }

        let new_parent_id = match position {
            DropPosition::Child => Some(target.id.clone()),
            DropPosition::Before | DropPosition::After => target.parent_id.clone(),
        };
        if let Some(parent_id) = new_parent_id.as_deref() {
            accepting_parent(index, dragged, parent_id)?;
        }

        let siblings: Vec<&Node> = index
            .children_of(new_parent_id.as_deref(), &dragged.project_id)
            .into_iter()
            .filter(|s| s.id != dragged.id)
            .collect();

        let allocator = self.repo.allocator();
        let order = match position {
            DropPosition::Child => allocator.append_order(&siblings),
            DropPosition::Before | DropPosition::After => {
                let target_index = siblings
                    .iter()
                    .position(|s| s.id == target.id)
                    .unwrap_or(siblings.len());
                let insert_index = if position == DropPosition::After {
                    target_index + 1
                } else {
                    target_index
                };
                allocator.order_for_position(&siblings, insert_index)
            }
        };

        Ok(MovePlan {
            node_id: dragged.id.clone(),
            old_parent_id: dragged.parent_id.clone(),
            old_order: dragged.order,
            new_parent_id,
            order,
        })
    }

    /// Apply a validated move, renormalize the destination siblings, and
    /// record the move with the node's final order
    fn commit_move(
        &mut self,
        nodes: &mut Vec<Node>,
        plan: MovePlan,
    ) -> Result<MutationOutcome, ServiceError> {
        let final_order = self.place(nodes, &plan.node_id, plan.new_parent_id.clone(), plan.order);
        self.repo.save_all(nodes)?;

        tracing::debug!(
            "Moved node {} from {:?} to {:?} (order {:?})",
            plan.node_id,
            plan.old_parent_id,
            plan.new_parent_id,
            final_order
        );
        self.ledger.record_move(
            &plan.node_id,
            plan.old_parent_id,
            plan.new_parent_id,
            plan.old_order,
            final_order,
        );
        Ok(MutationOutcome::Applied)
    }

    /// Set a node's parent and order in memory, then renormalize its new
    /// sibling set. Returns the node's order after renormalization.
    fn place(
        &self,
        nodes: &mut Vec<Node>,
        node_id: &str,
        parent_id: Option<String>,
        order: f64,
    ) -> Option<f64> {
        let position = nodes.iter().position(|n| n.id == node_id)?;
        let mut node = nodes.remove(position);
        node.parent_id = parent_id;
        node.order = Some(order);
        let project_id = node.project_id.clone();
        let sibling_parent = node.parent_id.clone();

        // Storage order breaks ties between equal orders, so a placed node
        // sorts ahead of any sibling sharing its order
        nodes.insert(0, node);
        renormalize_siblings(
            nodes,
            sibling_parent.as_deref(),
            &project_id,
            self.repo.allocator(),
            self.repo.max_ancestor_depth(),
        );
        nodes.first().and_then(|n| n.order)
    }

    // ---------------------------------------------------------------------
    // Delete and create
    // ---------------------------------------------------------------------

    /// Delete a node and every descendant, recording the removed subtree
    pub fn delete_with_descendants(&mut self, node_id: &str) -> Result<DeleteResult, ServiceError> {
        let removed = self.repo.remove_subtree(node_id)?;
        if removed.is_empty() {
            return Ok(DeleteResult::not_found());
        }

        let ids = removed.iter().map(|n| n.id.clone()).collect();
        self.ledger.record_delete(removed);
        Ok(DeleteResult::existed(ids))
    }

    /// Append a new root node to a project
    pub fn create_root(
        &mut self,
        project_id: &str,
        content: &str,
        title: Option<String>,
    ) -> Result<Option<Node>, ServiceError> {
        let params = CreateNodeParams {
            title,
            ..CreateNodeParams::root(project_id, content)
        };
        self.create_recorded(params)
    }

    /// Append a new child under `parent_id`; refused for a locked parent
    pub fn create_child(
        &mut self,
        parent_id: &str,
        content: &str,
    ) -> Result<Option<Node>, ServiceError> {
        let Some(parent) = self.repo.get(parent_id)? else {
            tracing::debug!("Cannot add child: parent {} not found", parent_id);
            return Ok(None);
        };
        if parent.locked {
            tracing::warn!("Cannot add child: parent {} is locked", parent_id);
            return Ok(None);
        }

        self.create_recorded(CreateNodeParams::child(parent.project_id, parent.id, content))
    }

    /// Insert a new node right after `node_id` under the same parent
    pub fn create_sibling(
        &mut self,
        node_id: &str,
        content: &str,
    ) -> Result<Option<Node>, ServiceError> {
        let nodes = self.repo.get_all()?;

        let params = {
            let index = self.index(&nodes);
            let Some(node) = index.get(node_id) else {
                tracing::debug!("Cannot add sibling: node {} not found", node_id);
                return Ok(None);
            };
            if let Some(parent) = node.parent_id.as_deref().and_then(|p| index.get(p)) {
                if parent.locked {
                    tracing::warn!("Cannot add sibling: parent {} is locked", parent.id);
                    return Ok(None);
                }
            }
            CreateNodeParams {
                project_id: node.project_id.clone(),
                parent_id: node.parent_id.clone(),
                content: content.to_string(),
                title: None,
                insert_after_node_id: Some(node.id.clone()),
            }
        };

        self.create_recorded(params)
    }

    fn create_recorded(&mut self, params: CreateNodeParams) -> Result<Option<Node>, ServiceError> {
        let created = self.repo.create(params)?;
        if let Some(node) = &created {
            self.ledger.record_create(node.clone());
        }
        Ok(created)
    }

    // ---------------------------------------------------------------------
    // Content and flag edits
    // ---------------------------------------------------------------------

    /// Replace a node's content, recording the edit
    pub fn edit_content(
        &mut self,
        node_id: &str,
        content: &str,
    ) -> Result<MutationOutcome, ServiceError> {
        let mut nodes = self.repo.get_all()?;

        let Some(node) = nodes.iter_mut().find(|n| n.id == node_id) else {
            return Ok(reject("edit", node_id, RejectReason::NodeNotFound(node_id.to_string())));
        };
        if node.locked {
            return Ok(reject("edit", node_id, RejectReason::NodeLocked(node_id.to_string())));
        }
        if node.content == content {
            return Ok(reject("edit", node_id, RejectReason::Unchanged));
        }

        let old_content = std::mem::replace(&mut node.content, content.to_string());
        self.repo.save_all(&nodes)?;
        self.ledger
            .record_edit(node_id, old_content, content.to_string());
        Ok(MutationOutcome::Applied)
    }

    /// Set or clear the title of a root node
    pub fn set_title(
        &mut self,
        node_id: &str,
        title: Option<String>,
    ) -> Result<MutationOutcome, ServiceError> {
        let mut nodes = self.repo.get_all()?;

        let Some(node) = nodes.iter_mut().find(|n| n.id == node_id) else {
            return Ok(reject("set title", node_id, RejectReason::NodeNotFound(node_id.to_string())));
        };
        if !node.is_root() {
            return Ok(reject("set title", node_id, RejectReason::NotARoot));
        }
        if node.locked {
            return Ok(reject("set title", node_id, RejectReason::NodeLocked(node_id.to_string())));
        }

        node.title = title.filter(|t| !t.trim().is_empty());
        self.repo.save_all(&nodes)?;
        Ok(MutationOutcome::Applied)
    }

    /// Flip `completed`; returns the new value, or `None` if the node is missing
    pub fn toggle_completed(&mut self, node_id: &str) -> Result<Option<bool>, ServiceError> {
        self.toggle(node_id, |node| &mut node.completed)
    }

    /// Flip `collapsed`; returns the new value, or `None` if the node is missing
    pub fn toggle_collapsed(&mut self, node_id: &str) -> Result<Option<bool>, ServiceError> {
        self.toggle(node_id, |node| &mut node.collapsed)
    }

    /// Flip `locked`; the only way to unlock a node
    pub fn toggle_locked(&mut self, node_id: &str) -> Result<Option<bool>, ServiceError> {
        self.toggle(node_id, |node| &mut node.locked)
    }

    fn toggle(
        &mut self,
        node_id: &str,
        flag: impl Fn(&mut Node) -> &mut bool,
    ) -> Result<Option<bool>, ServiceError> {
        let mut nodes = self.repo.get_all()?;
        let Some(node) = nodes.iter_mut().find(|n| n.id == node_id) else {
            tracing::debug!("Toggle ignored: node {} not found", node_id);
            return Ok(None);
        };

        let value = flag(node);
        *value = !*value;
        let new_value = *value;

        self.repo.save_all(&nodes)?;
        Ok(Some(new_value))
    }

    // ---------------------------------------------------------------------
    // Undo / redo
    // ---------------------------------------------------------------------

    /// Reverse the most recent recorded action.
    ///
    /// Returns the action taken off the history, or `None` if there was
    /// nothing to undo. Replays that would break an invariant are skipped.
    pub fn undo(&mut self) -> Result<Option<UndoAction>, ServiceError> {
        let Some(action) = self.ledger.undo() else {
            return Ok(None);
        };
        self.replay(&action, Replay::Undo)?;
        Ok(Some(action))
    }

    /// Re-apply the most recently undone action
    pub fn redo(&mut self) -> Result<Option<UndoAction>, ServiceError> {
        let Some(action) = self.ledger.redo() else {
            return Ok(None);
        };
        self.replay(&action, Replay::Redo)?;
        Ok(Some(action))
    }

    fn replay(&self, action: &UndoAction, direction: Replay) -> Result<(), ServiceError> {
        let mut nodes = self.repo.get_all()?;
        let node_id = action.node_id.as_str();

        let changed = match (&action.change, direction) {
            (
                UndoChange::Move {
                    old_parent_id,
                    old_order,
                    ..
                },
                Replay::Undo,
            ) => self.replay_move(&mut nodes, node_id, old_parent_id.clone(), *old_order),
            (
                UndoChange::Move {
                    new_parent_id,
                    new_order,
                    ..
                },
                Replay::Redo,
            ) => self.replay_move(&mut nodes, node_id, new_parent_id.clone(), *new_order),
            (UndoChange::Edit { old_content, .. }, Replay::Undo) => {
                replay_edit(&mut nodes, node_id, old_content)
            }
            (UndoChange::Edit { new_content, .. }, Replay::Redo) => {
                replay_edit(&mut nodes, node_id, new_content)
            }
            (UndoChange::Create { .. }, Replay::Undo) => self.remove_subtree(&mut nodes, node_id),
            (UndoChange::Create { node }, Replay::Redo) => {
                self.reinsert(&mut nodes, std::slice::from_ref(node))
            }
            (UndoChange::Delete { nodes: removed }, Replay::Undo) => {
                self.reinsert(&mut nodes, removed)
            }
            (UndoChange::Delete { .. }, Replay::Redo) => self.remove_subtree(&mut nodes, node_id),
        };

        if changed {
            self.repo.save_all(&nodes)?;
            tracing::debug!(
                "{:?} of {:?} on node {} applied",
                direction,
                action.action_type(),
                node_id
            );
        }
        Ok(())
    }

    fn replay_move(
        &self,
        nodes: &mut Vec<Node>,
        node_id: &str,
        parent_id: Option<String>,
        order: Option<f64>,
    ) -> bool {
        let order = {
            let index = self.index(nodes);
            let check = movable(&index, node_id).and_then(|node| {
                if let Some(parent_id) = parent_id.as_deref() {
                    accepting_parent(&index, node, parent_id)?;
                }
                Ok(node)
            });
            match check {
                Ok(node) => order.unwrap_or_else(|| {
                    let siblings: Vec<&Node> = index
                        .children_of(parent_id.as_deref(), &node.project_id)
                        .into_iter()
                        .filter(|s| s.id != node.id)
                        .collect();
                    self.repo.allocator().append_order(&siblings)
                }),
                Err(reason) => {
                    log_rejection("replay move", node_id, &reason);
                    return false;
                }
            }
        };

        self.place(nodes, node_id, parent_id, order).is_some()
    }

    fn remove_subtree(&self, nodes: &mut Vec<Node>, node_id: &str) -> bool {
        let doomed: HashSet<String> = self.index(nodes).subtree_ids(node_id).into_iter().collect();
        if doomed.is_empty() {
            tracing::debug!("Replay skipped: node {} no longer exists", node_id);
            return false;
        }
        nodes.retain(|n| !doomed.contains(&n.id));
        true
    }

    /// Put back a removed subtree (top node first) with its original ids
    /// and orders
    fn reinsert(&self, nodes: &mut Vec<Node>, subtree: &[Node]) -> bool {
        let Some(top) = subtree.first() else {
            return false;
        };

        {
            let index = self.index(nodes);
            if index.contains(&top.id) {
                tracing::debug!("Replay skipped: node {} already exists", top.id);
                return false;
            }
            if let Some(parent_id) = top.parent_id.as_deref() {
                if let Err(reason) = accepting_parent(&index, top, parent_id) {
                    log_rejection("replay insert", &top.id, &reason);
                    return false;
                }
            }
        }

        let existing: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
        let restored: Vec<Node> = subtree
            .iter()
            .filter(|n| !existing.contains(&n.id))
            .cloned()
            .collect();

        // Top node first so it wins order ties against its siblings
        let rest = std::mem::replace(nodes, restored);
        nodes.extend(rest);
        renormalize_siblings(
            nodes,
            top.parent_id.as_deref(),
            &top.project_id,
            self.repo.allocator(),
            self.repo.max_ancestor_depth(),
        );
        true
    }

    fn index<'a>(&self, nodes: &'a [Node]) -> HierarchyIndex<'a> {
        HierarchyIndex::build(nodes, self.repo.max_ancestor_depth())
    }
}

/// Node that should take focus once `node_id` is gone: the previous
/// sibling, else the next one.
///
/// `siblings` must be sorted by order and include `node_id`. Pure: no
/// store access.
pub fn sibling_focus_target(node_id: &str, siblings: &[Node]) -> Option<String> {
    let position = siblings.iter().position(|n| n.id == node_id)?;
    position
        .checked_sub(1)
        .and_then(|i| siblings.get(i))
        .or_else(|| siblings.get(position + 1))
        .map(|n| n.id.clone())
}

/// Look up a node that is allowed to move or change content
fn movable<'a>(index: &HierarchyIndex<'a>, node_id: &str) -> Result<&'a Node, RejectReason> {
    let node = index
        .get(node_id)
        .ok_or_else(|| RejectReason::NodeNotFound(node_id.to_string()))?;
    if node.locked {
        return Err(RejectReason::NodeLocked(node.id.clone()));
    }
    Ok(node)
}

fn replay_edit(nodes: &mut [Node], node_id: &str, content: &str) -> bool {
    match nodes.iter_mut().find(|n| n.id == node_id) {
        Some(node) if node.locked => {
            log_rejection("replay edit", node_id, &RejectReason::NodeLocked(node_id.to_string()));
            false
        }
        Some(node) => {
            node.content = content.to_string();
            true
        }
        None => {
            tracing::debug!("Replay skipped: node {} no longer exists", node_id);
            false
        }
    }
}

fn log_rejection(operation: &str, node_id: &str, reason: &RejectReason) {
    match reason {
        RejectReason::WouldCreateCycle
        | RejectReason::NodeLocked(_)
        | RejectReason::ParentLocked(_)
        | RejectReason::CrossProject => {
            tracing::warn!("Rejected {} of node {}: {}", operation, node_id, reason)
        }
        _ => tracing::debug!("Ignored {} of node {}: {}", operation, node_id, reason),
    }
}

fn reject(operation: &str, node_id: &str, reason: RejectReason) -> MutationOutcome {
    log_rejection(operation, node_id, &reason);
    MutationOutcome::Rejected(reason)
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "tree_mutator_test.rs"]
mod tree_mutator_test;

//! Hierarchy Index
//!
//! Adjacency index over a flat node slice: `id -> node` and
//! `parent_id -> [children sorted by order]`, built once per operation so
//! descendant collection and ancestor walks do not rescan the whole slice
//! for every step.
//!
//! Every upward walk is bounded twice, by a visited set and by a maximum
//! depth, so it terminates even when the stored graph is corrupted.

use crate::models::{compare_order, Node};
use std::collections::{HashMap, HashSet, VecDeque};

/// How an upward `parent_id` walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// Reached a root node
    Root,
    /// Reached a `parent_id` that points at no stored node
    Orphan,
    /// Revisited an id: the stored graph contains a cycle
    Cycle,
    /// Gave up after the configured maximum depth
    DepthExceeded,
}

/// Result of walking `parent_id` links upward from a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorWalk {
    /// Ancestor ids, nearest parent first
    pub ancestors: Vec<String>,
    pub end: WalkEnd,
}

impl AncestorWalk {
    /// True if the walk ran into a cycle or the depth bound
    pub fn is_corrupted(&self) -> bool {
        matches!(self.end, WalkEnd::Cycle | WalkEnd::DepthExceeded)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ancestors.iter().any(|a| a == id)
    }
}

/// Borrowed adjacency index over a node slice
pub struct HierarchyIndex<'a> {
    by_id: HashMap<&'a str, &'a Node>,
    children: HashMap<&'a str, Vec<&'a Node>>,
    roots: Vec<&'a Node>,
    max_depth: usize,
}

impl<'a> HierarchyIndex<'a> {
    pub fn build(nodes: &'a [Node], max_depth: usize) -> Self {
        let mut by_id = HashMap::with_capacity(nodes.len());
        let mut children: HashMap<&'a str, Vec<&'a Node>> = HashMap::new();
        let mut roots = Vec::new();

        for node in nodes {
            by_id.insert(node.id.as_str(), node);
            match node.parent_id.as_deref() {
                Some(parent_id) => children.entry(parent_id).or_default().push(node),
                None => roots.push(node),
            }
        }

        // Stable sort keeps insertion order for ties
        for siblings in children.values_mut() {
            siblings.sort_by(|a, b| compare_order(a, b));
        }
        roots.sort_by(|a, b| compare_order(a, b));

        Self {
            by_id,
            children,
            roots,
            max_depth,
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&'a Node> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Children of `parent_id`, sorted by order
    pub fn children(&self, parent_id: &str) -> &[&'a Node] {
        self.children
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Root nodes of a project, sorted by order
    pub fn roots(&self, project_id: &str) -> Vec<&'a Node> {
        self.roots
            .iter()
            .copied()
            .filter(|n| n.project_id == project_id)
            .collect()
    }

    /// Nodes sharing a parent with `node` (including `node`), sorted by order.
    ///
    /// For roots the sibling set is the project's roots.
    pub fn sibling_set(&self, node: &Node) -> Vec<&'a Node> {
        match node.parent_id.as_deref() {
            Some(parent_id) => self.children(parent_id).to_vec(),
            None => self.roots(&node.project_id),
        }
    }

    /// Children of `parent_id` (or the project's roots when `None`)
    pub fn children_of(&self, parent_id: Option<&str>, project_id: &str) -> Vec<&'a Node> {
        match parent_id {
            Some(parent_id) => self.children(parent_id).to_vec(),
            None => self.roots(project_id),
        }
    }

    /// Walk `parent_id` links upward from `node_id`, excluding `node_id`
    pub fn ancestors(&self, node_id: &str) -> AncestorWalk {
        let mut ancestors = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(node_id);

        let mut current = self.get(node_id).and_then(|n| n.parent_id.as_deref());

        while let Some(parent_id) = current {
            if ancestors.len() >= self.max_depth {
                return AncestorWalk {
                    ancestors,
                    end: WalkEnd::DepthExceeded,
                };
            }
            if !visited.insert(parent_id) {
                return AncestorWalk {
                    ancestors,
                    end: WalkEnd::Cycle,
                };
            }
            let Some(parent) = self.get(parent_id) else {
                return AncestorWalk {
                    ancestors,
                    end: WalkEnd::Orphan,
                };
            };
            ancestors.push(parent.id.clone());
            current = parent.parent_id.as_deref();
        }

        AncestorWalk {
            ancestors,
            end: WalkEnd::Root,
        }
    }

    /// True iff `ancestor_id` is reached walking upward from `node_id`'s parent
    pub fn is_descendant_of(&self, node_id: &str, ancestor_id: &str) -> bool {
        let walk = self.ancestors(node_id);
        if walk.is_corrupted() {
            tracing::warn!(
                "Ancestor walk from node {} ended with {:?} after {} steps",
                node_id,
                walk.end,
                walk.ancestors.len()
            );
        }
        walk.contains(ancestor_id)
    }

    /// True if making `new_parent_id` the parent of `node_id` would put
    /// `node_id` on its own ancestor chain.
    ///
    /// A corrupted chain above `new_parent_id` counts as a cycle.
    pub fn would_create_cycle(&self, node_id: &str, new_parent_id: &str) -> bool {
        if node_id == new_parent_id {
            return true;
        }
        let walk = self.ancestors(new_parent_id);
        if walk.is_corrupted() {
            tracing::warn!(
                "Refusing to attach {} under {}: ancestor chain ended with {:?}",
                node_id,
                new_parent_id,
                walk.end
            );
            return true;
        }
        walk.contains(node_id)
    }

    /// Every transitive descendant of `node_id` (breadth-first, excluding the node)
    pub fn descendants(&self, node_id: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(node_id);

        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(node_id);

        while let Some(current) = queue.pop_front() {
            for child in self.children(current) {
                if visited.insert(child.id.as_str()) {
                    result.push(child.id.clone());
                    queue.push_back(child.id.as_str());
                }
            }
        }

        result
    }

    /// The node followed by all its descendants; empty if the node is unknown
    pub fn subtree_ids(&self, node_id: &str) -> Vec<String> {
        match self.get(node_id) {
            Some(node) => {
                let mut ids = vec![node.id.clone()];
                ids.extend(self.descendants(node_id));
                ids
            }
            None => Vec::new(),
        }
    }
}

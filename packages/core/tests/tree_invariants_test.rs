//! Integration tests for outline tree invariants
//!
//! Tests cover:
//! - Acyclicity under generated sequences of structural moves
//! - Sibling order totality after inserts and renormalization
//! - Locked-node immutability
//! - Cascade-delete completeness
//! - The insert-between ordering scenario

use anyhow::Result;
use layercake_core::{
    db::{HierarchyIndex, WalkEnd},
    DropPosition, MemoryStore, Node, OrderAllocator, OutlineEngine,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

/// Node count of the outline built by `create_test_outline`
const OUTLINE_SIZE: usize = 12;

/// One user action against the outline, addressing nodes by index
#[derive(Debug, Clone)]
enum Op {
    Indent(usize),
    Outdent(usize),
    Move(usize, usize, DropPosition),
    Edit(usize),
    Undo,
    Redo,
}

fn position_strategy() -> impl Strategy<Value = DropPosition> {
    prop_oneof![
        Just(DropPosition::Before),
        Just(DropPosition::After),
        Just(DropPosition::Child),
    ]
}

fn move_strategy() -> impl Strategy<Value = Op> {
    (0..OUTLINE_SIZE, 0..OUTLINE_SIZE, position_strategy())
        .prop_map(|(node, target, position)| Op::Move(node, target, position))
}

fn structural_op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => (0..OUTLINE_SIZE).prop_map(Op::Indent),
        1 => (0..OUTLINE_SIZE).prop_map(Op::Outdent),
        2 => move_strategy(),
    ]
}

fn any_op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => structural_op_strategy(),
        1 => (0..OUTLINE_SIZE).prop_map(Op::Edit),
        1 => Just(Op::Undo),
        1 => Just(Op::Redo),
    ]
}

/// Run `op`, returning whether it changed the outline
fn apply_op(engine: &mut OutlineEngine<MemoryStore>, ids: &[String], op: &Op) -> Result<bool> {
    let mutator = engine.mutator_mut();
    let changed = match op {
        Op::Indent(node) => mutator.indent(&ids[*node])?.is_applied(),
        Op::Outdent(node) => mutator.outdent(&ids[*node])?.is_applied(),
        Op::Move(node, target, position) => mutator
            .move_to_position(&ids[*node], &ids[*target], *position)?
            .is_applied(),
        Op::Edit(node) => mutator
            .edit_content(&ids[*node], &format!("edit of {}", node))?
            .is_applied(),
        Op::Undo => mutator.undo()?.is_some(),
        Op::Redo => mutator.redo()?.is_some(),
    };
    Ok(changed)
}

/// Test helper: engine with one project holding a two-level outline.
///
/// Returns the engine, the project id, and every node id.
fn create_test_outline() -> Result<(OutlineEngine<MemoryStore>, String, Vec<String>)> {
    let mut engine = OutlineEngine::in_memory();
    let project = engine.projects().create("Invariants")?;
    let mutator = engine.mutator_mut();

    let mut ids = Vec::new();
    for r in 0..3 {
        let root = mutator
            .create_root(&project.id, &format!("root {}", r), None)?
            .expect("root created");
        ids.push(root.id.clone());
        for c in 0..3 {
            let child = mutator
                .create_child(&root.id, &format!("child {}.{}", r, c))?
                .expect("child created");
            ids.push(child.id);
        }
    }
    mutator.ledger_mut().clear();

    Ok((engine, project.id, ids))
}

fn assert_acyclic(nodes: &[Node]) {
    let index = HierarchyIndex::build(nodes, 10_000);
    for node in nodes {
        assert!(
            !index.is_descendant_of(&node.id, &node.id),
            "node {} is its own ancestor",
            node.id
        );
        assert_eq!(index.ancestors(&node.id).end, WalkEnd::Root);
    }
}

fn assert_orders_total(nodes: &[Node]) {
    let mut sets: HashMap<(&str, Option<&str>), Vec<f64>> = HashMap::new();
    for node in nodes {
        sets.entry((node.project_id.as_str(), node.parent_id.as_deref()))
            .or_default()
            .push(node.order.expect("every stored node has an order"));
    }

    for (key, mut orders) in sets {
        orders.sort_by(f64::total_cmp);
        assert!(
            orders.windows(2).all(|pair| pair[0] < pair[1]),
            "duplicate sibling orders under {:?}: {:?}",
            key,
            orders
        );
    }
}

// =========================================================================
// Generated operation sequences
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]

    #[test]
    fn structural_moves_keep_tree_acyclic_and_totally_ordered(
        ops in prop::collection::vec(structural_op_strategy(), 1..80)
    ) {
        let (mut engine, _project_id, ids) = create_test_outline()
            .unwrap_or_else(|e| panic!("outline setup failed: {e:?}"));

        for op in &ops {
            apply_op(&mut engine, &ids, op)
                .unwrap_or_else(|e| panic!("{op:?} failed: {e:?}"));

            let nodes = engine
                .nodes()
                .get_all()
                .unwrap_or_else(|e| panic!("read failed: {e:?}"));
            prop_assert_eq!(nodes.len(), ids.len());
            assert_acyclic(&nodes);
            assert_orders_total(&nodes);
        }
    }

    #[test]
    fn undo_redo_interleaving_keeps_tree_acyclic(
        ops in prop::collection::vec(any_op_strategy(), 1..80)
    ) {
        let (mut engine, _project_id, ids) = create_test_outline()
            .unwrap_or_else(|e| panic!("outline setup failed: {e:?}"));

        for op in &ops {
            apply_op(&mut engine, &ids, op)
                .unwrap_or_else(|e| panic!("{op:?} failed: {e:?}"));

            let nodes = engine
                .nodes()
                .get_all()
                .unwrap_or_else(|e| panic!("read failed: {e:?}"));
            prop_assert_eq!(nodes.len(), ids.len());
            assert_acyclic(&nodes);
            assert_orders_total(&nodes);
        }

        // Draining the history keeps the invariants too
        while engine
            .mutator_mut()
            .undo()
            .unwrap_or_else(|e| panic!("undo failed: {e:?}"))
            .is_some()
        {}
        let nodes = engine
            .nodes()
            .get_all()
            .unwrap_or_else(|e| panic!("read failed: {e:?}"));
        assert_acyclic(&nodes);
        assert_orders_total(&nodes);
    }

    #[test]
    fn locked_nodes_never_change(
        ops in prop::collection::vec(any_op_strategy(), 1..80)
    ) {
        let (mut engine, _project_id, ids) = create_test_outline()
            .unwrap_or_else(|e| panic!("outline setup failed: {e:?}"));
        let locked = [ids[0].clone(), ids[2].clone(), ids[9].clone()];
        for id in &locked {
            let toggled = engine
                .mutator_mut()
                .toggle_locked(id)
                .unwrap_or_else(|e| panic!("lock failed: {e:?}"));
            prop_assert_eq!(toggled, Some(true));
        }

        let frozen = |engine: &OutlineEngine<MemoryStore>| -> Vec<Frozen> {
            locked
                .iter()
                .map(|id| {
                    let node = engine
                        .nodes()
                        .get(id)
                        .unwrap_or_else(|e| panic!("read failed: {e:?}"))
                        .unwrap_or_else(|| panic!("locked node {id} vanished"));
                    (node.parent_id, node.order, node.content)
                })
                .collect()
        };
        let before = frozen(&engine);

        for op in &ops {
            apply_op(&mut engine, &ids, op)
                .unwrap_or_else(|e| panic!("{op:?} failed: {e:?}"));
        }

        prop_assert_eq!(frozen(&engine), before);
    }
}

#[test]
fn test_is_descendant_of_self_is_false() -> Result<()> {
    let (engine, _project_id, ids) = create_test_outline()?;
    for id in &ids {
        assert!(!engine.nodes().is_descendant_of(id, id)?);
    }
    assert!(engine.nodes().is_descendant_of(&ids[1], &ids[0])?);
    assert!(!engine.nodes().is_descendant_of(&ids[0], &ids[1])?);
    Ok(())
}

// =========================================================================
// Locked-node immutability
// =========================================================================

type Frozen = (Option<String>, Option<f64>, String);

#[test]
fn test_unlocked_node_is_editable_again() -> Result<()> {
    let (mut engine, _project_id, ids) = create_test_outline()?;
    let target = &ids[2];

    engine.mutator_mut().toggle_locked(target)?;
    assert!(!engine
        .mutator_mut()
        .edit_content(target, "blocked")?
        .is_applied());

    engine.mutator_mut().toggle_locked(target)?;
    assert!(engine
        .mutator_mut()
        .edit_content(target, "finally")?
        .is_applied());
    assert_eq!(engine.nodes().get(target)?.expect("exists").content, "finally");
    Ok(())
}

// =========================================================================
// Cascade delete
// =========================================================================

#[test]
fn test_cascade_delete_removes_every_descendant() -> Result<()> {
    let (mut engine, _project_id, ids) = create_test_outline()?;
    let root = ids[0].clone();

    // Deepen the first subtree: child 0.0 gets a chain of three
    let mut parent = ids[1].clone();
    for depth in 0..3 {
        let node = engine
            .mutator_mut()
            .create_child(&parent, &format!("deep {}", depth))?
            .expect("created");
        parent = node.id;
    }

    let expected: HashSet<String> = {
        let nodes = engine.nodes().get_all()?;
        let index = HierarchyIndex::build(&nodes, 10_000);
        index.subtree_ids(&root).into_iter().collect()
    };
    assert_eq!(expected.len(), 7);

    let result = engine.mutator_mut().delete_with_descendants(&root)?;
    assert!(result.existed);
    let removed: HashSet<String> = result.removed.into_iter().collect();
    assert_eq!(removed, expected);

    let remaining = engine.nodes().get_all()?;
    assert_eq!(remaining.len(), ids.len() + 3 - 7);
    for node in &remaining {
        assert!(!removed.contains(&node.id));
        if let Some(parent_id) = &node.parent_id {
            assert!(
                !removed.contains(parent_id),
                "node {} still points at deleted parent {}",
                node.id,
                parent_id
            );
        }
    }
    Ok(())
}

// =========================================================================
// Insert-between scenario
// =========================================================================

#[test]
fn test_insert_between_then_renormalize() -> Result<()> {
    let mut engine = OutlineEngine::in_memory();
    let project = engine.projects().create("Ordering")?;
    let mutator = engine.mutator_mut();

    let parent = mutator
        .create_root(&project.id, "parent", None)?
        .expect("created");
    let mut siblings = Vec::new();
    for name in ["one", "two", "three"] {
        siblings.push(mutator.create_child(&parent.id, name)?.expect("created"));
    }
    let orders: Vec<_> = siblings.iter().map(Node::sort_key).collect();
    assert_eq!(orders, vec![1000.0, 2000.0, 3000.0]);

    assert_eq!(OrderAllocator::default().order_for_position(&siblings, 1), 1500.0);

    let inserted = mutator.create_child(&parent.id, "new")?.expect("created");
    assert!(mutator
        .move_to_position(&inserted.id, &siblings[1].id, DropPosition::Before)?
        .is_applied());

    let children = engine.nodes().get_children(&parent.id)?;
    let contents: Vec<_> = children.iter().map(|n| n.content.as_str()).collect();
    let orders: Vec<_> = children.iter().map(Node::sort_key).collect();
    assert_eq!(contents, vec!["one", "new", "two", "three"]);
    assert_eq!(orders, vec![1000.0, 2000.0, 3000.0, 4000.0]);
    Ok(())
}

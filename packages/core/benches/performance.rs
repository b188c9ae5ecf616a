//! Performance benchmarks for Layercake core operations
//!
//! Run with: `cargo bench -p layercake-core`
//!
//! These benchmarks measure critical path performance:
//! - Order allocation and sibling renormalization
//! - Structural moves on a wide outline (full collection rewrite per call)
//! - Cascade delete of a deep subtree
//! - Version snapshot of a large project

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use layercake_core::db::OrderAllocator;
use layercake_core::{DropPosition, MemoryStore, Node, OutlineEngine};

/// Setup an engine with one project holding `width` roots of `depth`-long chains
fn setup_outline(width: usize, depth: usize) -> (OutlineEngine<MemoryStore>, String, Vec<String>) {
    let mut engine = OutlineEngine::in_memory();
    let project = engine.projects().create("Bench").unwrap();
    let mutator = engine.mutator_mut();

    let mut roots = Vec::new();
    for i in 0..width {
        let root = mutator
            .create_root(&project.id, &format!("Root {}", i), None)
            .unwrap()
            .unwrap();
        let mut parent = root.id.clone();
        for d in 0..depth {
            parent = mutator
                .create_child(&parent, &format!("Level {} of {}", d, i))
                .unwrap()
                .unwrap()
                .id;
        }
        roots.push(root.id);
    }
    mutator.ledger_mut().clear();

    (engine, project.id, roots)
}

fn siblings(count: usize) -> Vec<Node> {
    (0..count)
        .map(|i| {
            Node::new_with_id(format!("n{}", i), "p".to_string(), None, String::new())
                .with_order((i + 1) as f64)
        })
        .collect()
}

/// Benchmark order allocation and renormalization over sibling sets
fn bench_ordering(c: &mut Criterion) {
    let allocator = OrderAllocator::default();

    let mut group = c.benchmark_group("ordering");
    for count in [10, 100, 1000] {
        let nodes = siblings(count);

        group.bench_with_input(BenchmarkId::new("order_for_position", count), &nodes, |b, nodes| {
            b.iter(|| black_box(allocator.order_for_position(nodes, nodes.len() / 2)))
        });

        group.bench_with_input(BenchmarkId::new("renormalize", count), &nodes, |b, nodes| {
            b.iter(|| black_box(allocator.renormalize(nodes)))
        });
    }
    group.finish();
}

/// Benchmark structural moves
///
/// Each move reads and rewrites the whole node collection, so cost grows
/// with outline size rather than sibling count.
fn bench_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("moves");
    group.sample_size(20); // Every iteration rewrites the full collection

    group.bench_function("indent_outdent_500_nodes", |b| {
        let (mut engine, _project_id, roots) = setup_outline(100, 4);
        let target = roots[50].clone();

        b.iter(|| {
            let mutator = engine.mutator_mut();
            black_box(mutator.indent(&target).unwrap());
            black_box(mutator.outdent(&target).unwrap());
        })
    });

    group.bench_function("drop_before_500_nodes", |b| {
        let (mut engine, _project_id, roots) = setup_outline(100, 4);
        let dragged = roots[99].clone();
        let anchor = roots[0].clone();

        b.iter(|| {
            let mutator = engine.mutator_mut();
            black_box(
                mutator
                    .move_to_position(&dragged, &anchor, DropPosition::Before)
                    .unwrap(),
            );
            black_box(
                mutator
                    .move_to_position(&dragged, &anchor, DropPosition::After)
                    .unwrap(),
            );
        })
    });

    group.finish();
}

/// Benchmark cascade delete followed by undo of a 200-deep chain
fn bench_cascade_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade_delete");
    group.sample_size(20);

    group.bench_function("delete_undo_deep_chain", |b| {
        let (mut engine, _project_id, roots) = setup_outline(10, 200);
        let target = roots[5].clone();

        b.iter(|| {
            let mutator = engine.mutator_mut();
            black_box(mutator.delete_with_descendants(&target).unwrap());
            black_box(mutator.undo().unwrap());
        })
    });

    group.finish();
}

/// Benchmark snapshotting a 1000-node project
fn bench_snapshot(c: &mut Criterion) {
    let (engine, project_id, _roots) = setup_outline(200, 4);

    let mut group = c.benchmark_group("versions");
    group.sample_size(10); // Snapshots accumulate in the versions collection

    group.bench_function("snapshot_1000_nodes", |b| {
        b.iter(|| {
            black_box(
                engine
                    .versions()
                    .snapshot_project(&project_id, "1.0.0", "Bench", None)
                    .unwrap(),
            )
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_ordering,
    bench_moves,
    bench_cascade_delete,
    bench_snapshot
);
criterion_main!(benches);

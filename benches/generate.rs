//! Code generation throughput.
//!
//! Measures descriptor → C source for each family, with trees large enough
//! that the recursive emitter and the shape check dominate.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use modelc::model::TreeNode;
use modelc::{generate, ModelDescriptor};

/// Complete binary tree of the given depth, splitting on features round-robin.
fn balanced_tree(depth: u32, n_features: usize) -> Vec<TreeNode> {
    let internal = (1usize << depth) - 1;
    let total = (1usize << (depth + 1)) - 1;
    (0..total)
        .map(|i| {
            if i < internal {
                TreeNode::split(i % n_features, i as f64 * 0.5 - 10.0, 2 * i + 1, 2 * i + 2)
            } else {
                TreeNode::leaf(vec![(i % 3) as f64, 1.0, 0.5])
            }
        })
        .collect()
}

fn linear(n: usize) -> ModelDescriptor {
    ModelDescriptor::Linear {
        intercept: 1.25,
        coefficients: (0..n).map(|i| (i as f64).sin() * 100.0).collect(),
    }
}

fn bench_linear(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear");
    for n in [8, 256, 4096] {
        let descriptor = linear(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &descriptor, |b, d| {
            b.iter(|| generate(black_box(d)).unwrap())
        });
    }
    group.finish();
}

fn bench_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree");
    for depth in [4, 10, 14] {
        let descriptor = ModelDescriptor::Tree {
            nodes: balanced_tree(depth, 16),
        };
        group.bench_with_input(BenchmarkId::from_parameter(depth), &descriptor, |b, d| {
            b.iter(|| generate(black_box(d)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_linear, bench_tree);
criterion_main!(benches);

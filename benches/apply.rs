//! Apply, reordering and ZDD benchmarks.
//!
//! Run with:
//! ```bash
//! cargo bench --bench apply
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dd_rs::config::ManagerConfig;
use dd_rs::handle::{Bdd, Zdd};
use dd_rs::manager::Manager;
use dd_rs::reorder::ReorderMethod;
use dd_rs::types::Var;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// Helper: N-Queens Problem (canonical BDD benchmark)
// ============================================================================

fn solve_queens(mgr: &Manager, n: usize) -> Bdd {
    // Variables: q[i][j] = queen at row i, column j, index i * n + j
    let var = |i: usize, j: usize| -> Bdd { mgr.var((i * n + j) as u32).unwrap() };
    let not_both = |a: Bdd, b: Bdd| -> Bdd { mgr.or(&!&a, &!&b).unwrap() };

    let mut result = mgr.one();
    for i in 0..n {
        let row: Vec<Bdd> = (0..n).map(|j| var(i, j)).collect();
        result = mgr.and(&result, &mgr.or_all(&row).unwrap()).unwrap();
    }
    for i1 in 0..n {
        for j1 in 0..n {
            for i2 in 0..n {
                for j2 in 0..n {
                    if (i1, j1) >= (i2, j2) {
                        continue;
                    }
                    let attack = i1 == i2 || j1 == j2 || i1 + j2 == i2 + j1 || i1 + j1 == i2 + j2;
                    if attack {
                        result = mgr.and(&result, &not_both(var(i1, j1), var(i2, j2))).unwrap();
                    }
                }
            }
        }
    }
    result
}

// ============================================================================
// Helper: random formulas
// ============================================================================

fn build_random_formula(mgr: &Manager, num_vars: usize, num_ops: usize, seed: u64) -> Bdd {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut nodes: Vec<Bdd> = (0..num_vars)
        .map(|i| {
            let v = mgr.var(i as u32).unwrap();
            if rng.random_bool(0.5) {
                v
            } else {
                !&v
            }
        })
        .collect();

    for _ in 0..num_ops {
        let i = rng.random_range(0..nodes.len());
        let j = rng.random_range(0..nodes.len());
        if i == j {
            continue;
        }
        let (a, b) = (&nodes[i], &nodes[j]);
        let result = match rng.random_range(0..4) {
            0 => mgr.and(a, b),
            1 => mgr.or(a, b),
            2 => mgr.xor(a, b),
            _ => mgr.implies(a, b),
        }
        .unwrap();
        nodes[i] = result;
    }

    mgr.and_all(&nodes).unwrap()
}

/// `(x0 ∧ y0) ∨ ... ∨ (xn ∧ yn)` with all `x` above all `y`.
fn separated_pairs(mgr: &Manager, n: usize) -> Bdd {
    let mut f = mgr.zero();
    for i in 0..n {
        let t = mgr.and(&mgr.var(i as u32).unwrap(), &mgr.var((n + i) as u32).unwrap()).unwrap();
        f = mgr.or(&f, &t).unwrap();
    }
    f
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_queens_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("bdd/queens_scaling");
    group.sample_size(10);

    for n in [4, 5, 6, 7] {
        group.bench_with_input(BenchmarkId::new("queens", n), &n, |b, &n| {
            b.iter(|| {
                let mgr = Manager::with_config(ManagerConfig::default().with_cache_bits(18));
                solve_queens(&mgr, n).size()
            });
        });
    }

    group.finish();
}

fn bench_random_formula(c: &mut Criterion) {
    let mut group = c.benchmark_group("bdd/random_formula");

    for cache_bits in [14, 16, 18] {
        let config = ManagerConfig::default().with_cache_bits(cache_bits);
        group.bench_with_input(
            BenchmarkId::new("v=20,ops=1000", format!("2^{}", cache_bits)),
            &config,
            |b, config| {
                b.iter(|| {
                    let mgr = Manager::with_config(config.clone());
                    build_random_formula(&mgr, 20, 1000, 42).size()
                });
            },
        );
    }

    group.finish();
}

fn bench_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder/separated_pairs");
    group.sample_size(10);

    for method in [ReorderMethod::Sift, ReorderMethod::Window3, ReorderMethod::Genetic] {
        group.bench_with_input(BenchmarkId::new(format!("{:?}", method), 8), &method, |b, &method| {
            b.iter(|| {
                let mgr = Manager::new(16, 0, None);
                let f = separated_pairs(&mgr, 8);
                mgr.reorder(method).unwrap();
                f.size()
            });
        });
    }

    group.finish();
}

fn bench_zdd_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("zdd/join");

    for n in [8, 12, 16] {
        group.bench_with_input(BenchmarkId::new("singletons", n), &n, |b, &n| {
            b.iter(|| {
                let mgr = Manager::new(0, n, None);
                let singletons: Vec<Zdd> = (0..n).map(|i| mgr.zdd_singleton(Var::new(i as u32)).unwrap()).collect();
                let mut family = mgr.zdd_base();
                for s in &singletons {
                    let with = mgr.zdd_join(&family, s).unwrap();
                    family = mgr.zdd_union(&family, &with).unwrap();
                }
                mgr.zdd_count(&family).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_queens_scaling, bench_random_formula, bench_reorder, bench_zdd_join);
criterion_main!(benches);

//! Garbage collection and reordering keep every handle meaningful.

use test_log::test;

use dd_rs::config::ManagerConfig;
use dd_rs::error::DdError;
use dd_rs::handle::Bdd;
use dd_rs::manager::Manager;
use dd_rs::order::GroupKind;
use dd_rs::reorder::ReorderMethod;
use dd_rs::types::Var;

fn assignments(n: usize) -> impl Iterator<Item = Vec<bool>> {
    (0..1u32 << n).map(move |m| (0..n).map(|i| m & (1 << i) != 0).collect())
}

fn truth_table(mgr: &Manager, f: &Bdd, n: usize) -> Vec<bool> {
    assignments(n).map(|a| mgr.eval(f, &a).unwrap()).collect()
}

/// `(x0 ∧ x_n) ∨ (x1 ∧ x_{n+1}) ∨ ...`, badly ordered under the identity.
fn separated_pairs(mgr: &Manager, n: u32) -> Bdd {
    let mut f = mgr.zero();
    for i in 0..n {
        let t = mgr.and(&mgr.var(i).unwrap(), &mgr.var(n + i).unwrap()).unwrap();
        f = mgr.or(&f, &t).unwrap();
    }
    f
}

#[test]
fn test_collection_preserves_live_functions() {
    let mgr = Manager::with_config(ManagerConfig::default().with_vars(6).with_gc(false));
    let f = separated_pairs(&mgr, 3);
    let table = truth_table(&mgr, &f, 6);
    for i in 0..6 {
        let x = mgr.var(i).unwrap();
        let _ = mgr.xor(&f, &x).unwrap();
    }
    assert!(mgr.dead_nodes() > 0);
    let freed = mgr.collect_garbage().unwrap();
    assert!(freed > 0);
    assert_eq!(mgr.dead_nodes(), 0);
    assert_eq!(truth_table(&mgr, &f, 6), table);
    mgr.check_invariants().unwrap();
}

#[test]
fn test_every_method_preserves_semantics() {
    let methods = [
        ReorderMethod::Sift,
        ReorderMethod::SiftConverge,
        ReorderMethod::Window2,
        ReorderMethod::Window3,
        ReorderMethod::Random,
        ReorderMethod::Exact,
        ReorderMethod::Genetic,
    ];
    for method in methods {
        let mgr = Manager::new(8, 0, None);
        let f = separated_pairs(&mgr, 4);
        let g = mgr.xor(&mgr.var(1).unwrap(), &mgr.var(6).unwrap()).unwrap();
        let (tf, tg) = (truth_table(&mgr, &f, 8), truth_table(&mgr, &g, 8));
        let stats = mgr.reorder(method).unwrap();
        assert!(stats.final_size <= stats.initial_size, "{:?} grew the diagram", method);
        assert_eq!(truth_table(&mgr, &f, 8), tf, "{:?}", method);
        assert_eq!(truth_table(&mgr, &g, 8), tg, "{:?}", method);
        mgr.check_invariants().unwrap();
    }
}

#[test]
fn test_sifting_finds_interleaved_order() {
    let mgr = Manager::new(8, 0, None);
    let f = separated_pairs(&mgr, 4);
    let before = f.size();
    mgr.reorder(ReorderMethod::SiftConverge).unwrap();
    assert!(f.size() < before);
    mgr.check_invariants().unwrap();
}

#[test]
fn test_groups_move_as_units() {
    let mgr = Manager::new(8, 0, None);
    let f = separated_pairs(&mgr, 4);
    mgr.make_group(Var::new(2), 3, GroupKind::Fixed).unwrap();
    mgr.reorder(ReorderMethod::Sift).unwrap();
    let order = mgr.order();
    let at = order.iter().position(|&v| v == Var::new(2)).unwrap();
    assert_eq!(&order[at..at + 3], &[Var::new(2), Var::new(3), Var::new(4)]);
    assert_eq!(mgr.sat_count(&f, 8).unwrap(), mgr.sat_count(&separated_pairs(&mgr, 4), 8).unwrap());
    mgr.check_invariants().unwrap();
}

#[test]
fn test_reordering_mixed_kinds() {
    let mgr = Manager::new(6, 0, None);
    let f = separated_pairs(&mgr, 3);
    let a = mgr.bdd_to_add(&f).unwrap();
    let weights = mgr.add_plus(&a, &mgr.add_var(4).unwrap()).unwrap();
    let before: Vec<f64> = assignments(6).map(|x| mgr.add_eval(&weights, &x).unwrap()).collect();
    mgr.reorder(ReorderMethod::Sift).unwrap();
    let after: Vec<f64> = assignments(6).map(|x| mgr.add_eval(&weights, &x).unwrap()).collect();
    assert_eq!(before, after);
    assert_eq!(mgr.add_to_bdd(&a).unwrap(), f);
    mgr.check_invariants().unwrap();
}

#[test]
fn test_auto_reordering_triggers_between_operations() {
    let config = ManagerConfig::default()
        .with_vars(12)
        .with_auto_reorder(ReorderMethod::Sift)
        .with_reorder_threshold(20);
    let mgr = Manager::with_config(config);
    let f = separated_pairs(&mgr, 6);
    assert!(mgr.auto_reorderings() > 0);
    assert!(mgr.next_reorder_threshold() >= 20);
    assert_eq!(mgr.sat_count(&f, 12).unwrap(), mgr.sat_count(&separated_pairs(&mgr, 6), 12).unwrap());
    mgr.check_invariants().unwrap();
}

#[test]
fn test_node_limit_aborts_cleanly() {
    let mgr = Manager::new(16, 0, None);
    mgr.set_node_limit(Some(40));
    let mut failed = false;
    let mut f = mgr.zero();
    for i in 0..8 {
        let t = match mgr.and(&mgr.var(i).unwrap(), &mgr.var(8 + i).unwrap()) {
            Ok(t) => t,
            Err(e) => {
                assert!(matches!(e, DdError::ResourceLimitExceeded(_)));
                failed = true;
                break;
            }
        };
        match mgr.or(&f, &t) {
            Ok(g) => f = g,
            Err(e) => {
                assert!(matches!(e, DdError::ResourceLimitExceeded(_)));
                failed = true;
                break;
            }
        }
    }
    assert!(failed);
    mgr.check_invariants().unwrap();

    mgr.set_node_limit(None);
    let x = mgr.var(0).unwrap();
    assert_eq!(mgr.and(&x, &x).unwrap(), x);
}

#[test]
fn test_iterators_stop_after_reordering() {
    let mgr = Manager::new(6, 0, None);
    let f = separated_pairs(&mgr, 3);
    let mut cubes = mgr.cubes(&f).unwrap();
    assert!(cubes.next().is_some());
    mgr.reorder(ReorderMethod::Sift).unwrap();
    assert!(cubes.next().is_none());
    assert!(cubes.is_interrupted());
}

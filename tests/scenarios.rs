use test_log::test;

use dd_rs::manager::Manager;
use dd_rs::types::Var;

fn v(i: u32) -> Var {
    Var::new(i)
}

#[test]
fn test_conjunction_of_three_variables() {
    let mgr = Manager::new(3, 0, None);
    let x: Vec<_> = (0..3).map(|i| mgr.var(i).unwrap()).collect();
    let f = mgr.and_all(&x).unwrap();

    // Three tests and the terminal.
    assert_eq!(f.size(), 4);

    let cubes: Vec<_> = mgr.cubes(&f).unwrap().collect();
    assert_eq!(cubes, vec![vec![v(0).pos(), v(1).pos(), v(2).pos()]]);
    assert_eq!(mgr.sat_count(&f, 3).unwrap(), 1u32.into());
}

#[test]
fn test_ite_survives_order_reversal() {
    let mgr = Manager::new(3, 0, None);
    let x: Vec<_> = (0..3).map(|i| mgr.var(i).unwrap()).collect();
    let f = mgr.ite(&x[0], &x[1], &x[2]).unwrap();
    assert_eq!(f.size() - 1, 3);

    let before: Vec<bool> = (0..8u32)
        .map(|m| mgr.eval(&f, &[m & 1 != 0, m & 2 != 0, m & 4 != 0]).unwrap())
        .collect();

    let swaps_before = mgr.stats().swaps;
    mgr.set_order(&[v(2), v(1), v(0)]).unwrap();
    assert_eq!(mgr.stats().swaps - swaps_before, 3);
    assert_eq!(mgr.order(), vec![v(2), v(1), v(0)]);

    let after: Vec<bool> = (0..8u32)
        .map(|m| mgr.eval(&f, &[m & 1 != 0, m & 2 != 0, m & 4 != 0]).unwrap())
        .collect();
    assert_eq!(before, after);
    assert!((3..=4).contains(&(f.size() - 1)));
    mgr.check_invariants().unwrap();
}

#[test]
fn test_repeated_conjunction_is_canonical() {
    let mgr = Manager::new(2, 0, None);
    let a = mgr.var(0).unwrap();
    let b = mgr.var(1).unwrap();
    let ab = mgr.and(&a, &b).unwrap();
    let again = mgr.and(&ab, &ab).unwrap();
    assert_eq!(again, ab);
    assert_eq!(again.node(), ab.node());
    assert_eq!(mgr.and(&b, &a).unwrap(), ab);
}

#[test]
fn test_negation_is_constant_time_and_involutive() {
    let mgr = Manager::new(3, 0, None);
    let x: Vec<_> = (0..3).map(|i| mgr.var(i).unwrap()).collect();
    let f = mgr.or(&x[0], &mgr.and(&x[1], &x[2]).unwrap()).unwrap();
    let live = mgr.live_nodes();
    let nf = !&f;
    assert_eq!(mgr.live_nodes(), live);
    assert_eq!(!&nf, f);
    assert_eq!(mgr.or(&f, &nf).unwrap(), mgr.one());
}

#[test]
fn test_outstanding_handles_fail_after_destroy() {
    let mgr = Manager::new(2, 0, None);
    let other = mgr.clone();
    let x = mgr.var(0).unwrap();
    mgr.destroy();
    assert!(other.and(&x, &x).is_err());
    assert!(other.var(1).is_err());
}

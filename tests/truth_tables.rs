//! Exhaustive comparison of diagram operations against direct evaluation.

use std::collections::BTreeSet;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use test_log::test;

use dd_rs::handle::{Bdd, Zdd};
use dd_rs::manager::Manager;
use dd_rs::types::Var;

#[derive(Debug, Clone)]
enum Expr {
    Var(u32),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
    Ite(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn random(rng: &mut ChaCha8Rng, num_vars: u32, depth: usize) -> Expr {
        if depth == 0 || rng.random_bool(0.2) {
            return Expr::Var(rng.random_range(0..num_vars));
        }
        let choice = rng.random_range(0..5);
        let mut sub = || Box::new(Expr::random(rng, num_vars, depth - 1));
        match choice {
            0 => Expr::Not(sub()),
            1 => Expr::And(sub(), sub()),
            2 => Expr::Or(sub(), sub()),
            3 => Expr::Xor(sub(), sub()),
            _ => Expr::Ite(sub(), sub(), sub()),
        }
    }

    fn eval(&self, a: &[bool]) -> bool {
        match self {
            Expr::Var(i) => a[*i as usize],
            Expr::Not(e) => !e.eval(a),
            Expr::And(l, r) => l.eval(a) && r.eval(a),
            Expr::Or(l, r) => l.eval(a) || r.eval(a),
            Expr::Xor(l, r) => l.eval(a) ^ r.eval(a),
            Expr::Ite(c, t, e) => {
                if c.eval(a) {
                    t.eval(a)
                } else {
                    e.eval(a)
                }
            }
        }
    }

    fn build(&self, mgr: &Manager) -> Bdd {
        match self {
            Expr::Var(i) => mgr.var(*i).unwrap(),
            Expr::Not(e) => mgr.not(&e.build(mgr)).unwrap(),
            Expr::And(l, r) => mgr.and(&l.build(mgr), &r.build(mgr)).unwrap(),
            Expr::Or(l, r) => mgr.or(&l.build(mgr), &r.build(mgr)).unwrap(),
            Expr::Xor(l, r) => mgr.xor(&l.build(mgr), &r.build(mgr)).unwrap(),
            Expr::Ite(c, t, e) => mgr.ite(&c.build(mgr), &t.build(mgr), &e.build(mgr)).unwrap(),
        }
    }
}

fn assignments(n: usize) -> impl Iterator<Item = Vec<bool>> {
    (0..1u32 << n).map(move |m| (0..n).map(|i| m & (1 << i) != 0).collect())
}

#[test]
fn test_random_formulas_match_truth_tables() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for n in [1usize, 3, 6, 9, 12] {
        let mgr = Manager::new(n, 0, None);
        for _ in 0..4 {
            let expr = Expr::random(&mut rng, n as u32, 6);
            let f = expr.build(&mgr);
            let mut models = 0u32;
            for a in assignments(n) {
                let expected = expr.eval(&a);
                assert_eq!(mgr.eval(&f, &a).unwrap(), expected, "{:?} at {:?}", expr, a);
                models += expected as u32;
            }
            assert_eq!(mgr.sat_count(&f, n).unwrap(), models.into());
        }
        mgr.check_invariants().unwrap();
    }
}

#[test]
fn test_binary_connectives() {
    let n = 4;
    let mgr = Manager::new(n, 0, None);
    let x: Vec<Bdd> = (0..n as u32).map(|i| mgr.var(i).unwrap()).collect();
    let f = mgr.or(&x[0], &mgr.and(&x[1], &x[2]).unwrap()).unwrap();
    let g = mgr.xor(&x[2], &x[3]).unwrap();
    let f_ref = |a: &[bool]| a[0] || (a[1] && a[2]);
    let g_ref = |a: &[bool]| a[2] ^ a[3];

    let ops: [(&str, Bdd, fn(bool, bool) -> bool); 5] = [
        ("nand", mgr.nand(&f, &g).unwrap(), |p, q| !(p && q)),
        ("nor", mgr.nor(&f, &g).unwrap(), |p, q| !(p || q)),
        ("xnor", mgr.xnor(&f, &g).unwrap(), |p, q| p == q),
        ("implies", mgr.implies(&f, &g).unwrap(), |p, q| !p || q),
        ("iff", mgr.iff(&f, &g).unwrap(), |p, q| p == q),
    ];
    for (name, h, op) in &ops {
        for a in assignments(n) {
            assert_eq!(mgr.eval(h, &a).unwrap(), op(f_ref(&a), g_ref(&a)), "{} at {:?}", name, a);
        }
    }
    assert_eq!(ops[2].1, ops[4].1);
}

#[test]
fn test_quantification_tables() {
    let n = 4;
    let mgr = Manager::new(n, 0, None);
    let x: Vec<Bdd> = (0..n as u32).map(|i| mgr.var(i).unwrap()).collect();
    let f = mgr.ite(&x[1], &mgr.and(&x[0], &x[3]).unwrap(), &mgr.xor(&x[2], &x[0]).unwrap()).unwrap();
    let f_ref = |a: &[bool]| if a[1] { a[0] && a[3] } else { a[2] ^ a[0] };
    let cube = mgr.cube_of_vars(&[Var::new(0), Var::new(2)]).unwrap();
    let ex = mgr.exists(&f, &cube).unwrap();
    let all = mgr.forall(&f, &cube).unwrap();

    for a in assignments(n) {
        let mut values = Vec::new();
        for (b0, b2) in [(false, false), (false, true), (true, false), (true, true)] {
            let mut a2 = a.clone();
            a2[0] = b0;
            a2[2] = b2;
            values.push(f_ref(&a2));
        }
        assert_eq!(mgr.eval(&ex, &a).unwrap(), values.iter().any(|&b| b));
        assert_eq!(mgr.eval(&all, &a).unwrap(), values.iter().all(|&b| b));
    }

    let g = mgr.or(&x[0], &x[2]).unwrap();
    let product = mgr.and_exists(&f, &g, &cube).unwrap();
    assert_eq!(product, mgr.exists(&mgr.and(&f, &g).unwrap(), &cube).unwrap());
}

#[test]
fn test_add_arithmetic_tables() {
    let n = 3;
    let mgr = Manager::new(n, 0, None);
    let xs: Vec<_> = (0..n as u32).map(|i| mgr.add_var(i).unwrap()).collect();
    let two = mgr.add_const(2.0).unwrap();
    // f = 2*x0 + x1, g = x2 + 1
    let f = mgr.add_plus(&mgr.add_times(&two, &xs[0]).unwrap(), &xs[1]).unwrap();
    let g = mgr.add_plus(&xs[2], &mgr.add_one()).unwrap();
    let f_ref = |a: &[bool]| 2.0 * a[0] as u8 as f64 + a[1] as u8 as f64;
    let g_ref = |a: &[bool]| a[2] as u8 as f64 + 1.0;

    let sum = mgr.add_plus(&f, &g).unwrap();
    let diff = mgr.add_minus(&f, &g).unwrap();
    let prod = mgr.add_times(&f, &g).unwrap();
    let quot = mgr.add_divide(&f, &g).unwrap();
    let lo = mgr.add_min(&f, &g).unwrap();
    let hi = mgr.add_max(&f, &g).unwrap();
    for a in assignments(n) {
        let (p, q) = (f_ref(&a), g_ref(&a));
        assert_eq!(mgr.add_eval(&sum, &a).unwrap(), p + q);
        assert_eq!(mgr.add_eval(&diff, &a).unwrap(), p - q);
        assert_eq!(mgr.add_eval(&prod, &a).unwrap(), p * q);
        assert_eq!(mgr.add_eval(&quot, &a).unwrap(), p / q);
        assert_eq!(mgr.add_eval(&lo, &a).unwrap(), p.min(q));
        assert_eq!(mgr.add_eval(&hi, &a).unwrap(), p.max(q));
    }
    assert_eq!(mgr.add_find_max(&prod).unwrap(), 6.0);
    assert_eq!(mgr.add_find_min(&diff).unwrap(), -2.0);
}

type Family = BTreeSet<BTreeSet<u32>>;

fn family_of(mgr: &Manager, f: &Zdd) -> Family {
    mgr.zdd_sets(f)
        .unwrap()
        .map(|set| set.into_iter().map(|v| v.index()).collect())
        .collect()
}

fn random_family(rng: &mut ChaCha8Rng, n: u32) -> Vec<Vec<Var>> {
    (0..rng.random_range(0..6))
        .map(|_| (0..n).filter(|_| rng.random_bool(0.4)).map(Var::new).collect())
        .collect()
}

#[test]
fn test_zdd_operations_match_set_semantics() {
    let n = 5;
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mgr = Manager::new(0, n as usize, None);
    for _ in 0..10 {
        let p = mgr.zdd_from_sets(&random_family(&mut rng, n)).unwrap();
        let q = mgr.zdd_from_sets(&random_family(&mut rng, n)).unwrap();
        let (fp, fq) = (family_of(&mgr, &p), family_of(&mgr, &q));

        let union: Family = fp.union(&fq).cloned().collect();
        let inter: Family = fp.intersection(&fq).cloned().collect();
        let diff: Family = fp.difference(&fq).cloned().collect();
        let sym: Family = fp.symmetric_difference(&fq).cloned().collect();
        let join: Family = fp
            .iter()
            .flat_map(|a| fq.iter().map(move |b| a.union(b).copied().collect()))
            .collect();
        let meet: Family = fp
            .iter()
            .flat_map(|a| fq.iter().map(move |b| a.intersection(b).copied().collect()))
            .collect();

        assert_eq!(family_of(&mgr, &mgr.zdd_union(&p, &q).unwrap()), union);
        assert_eq!(family_of(&mgr, &mgr.zdd_intersection(&p, &q).unwrap()), inter);
        assert_eq!(family_of(&mgr, &mgr.zdd_difference(&p, &q).unwrap()), diff);
        assert_eq!(family_of(&mgr, &mgr.zdd_symmetric_difference(&p, &q).unwrap()), sym);
        assert_eq!(family_of(&mgr, &mgr.zdd_join(&p, &q).unwrap()), join);
        assert_eq!(family_of(&mgr, &mgr.zdd_meet(&p, &q).unwrap()), meet);
        assert_eq!(mgr.zdd_count(&p).unwrap(), fp.len().into());

        let v2 = Var::new(2);
        let sub1: Family = fp.iter().filter(|s| s.contains(&2)).map(|s| s.iter().copied().filter(|&x| x != 2).collect()).collect();
        let sub0: Family = fp.iter().filter(|s| !s.contains(&2)).cloned().collect();
        assert_eq!(family_of(&mgr, &mgr.zdd_subset1(&p, v2).unwrap()), sub1);
        assert_eq!(family_of(&mgr, &mgr.zdd_subset0(&p, v2).unwrap()), sub0);
    }
}

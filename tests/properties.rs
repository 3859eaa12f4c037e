use proptest::prelude::*;

use dd_rs::handle::Bdd;
use dd_rs::manager::Manager;
use dd_rs::types::Var;

const N: usize = 5;

#[derive(Debug, Clone)]
enum Expr {
    Var(u32),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
}

fn expr() -> impl Strategy<Value = Expr> {
    let leaf = (0..N as u32).prop_map(Expr::Var);
    leaf.prop_recursive(5, 48, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| Expr::Not(Box::new(e))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::And(Box::new(l), Box::new(r))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::Or(Box::new(l), Box::new(r))),
            (inner.clone(), inner).prop_map(|(l, r)| Expr::Xor(Box::new(l), Box::new(r))),
        ]
    })
}

impl Expr {
    fn eval(&self, a: &[bool]) -> bool {
        match self {
            Expr::Var(i) => a[*i as usize],
            Expr::Not(e) => !e.eval(a),
            Expr::And(l, r) => l.eval(a) && r.eval(a),
            Expr::Or(l, r) => l.eval(a) || r.eval(a),
            Expr::Xor(l, r) => l.eval(a) ^ r.eval(a),
        }
    }

    fn build(&self, mgr: &Manager) -> Bdd {
        match self {
            Expr::Var(i) => mgr.var(*i).unwrap(),
            Expr::Not(e) => !&e.build(mgr),
            Expr::And(l, r) => mgr.and(&l.build(mgr), &r.build(mgr)).unwrap(),
            Expr::Or(l, r) => mgr.or(&l.build(mgr), &r.build(mgr)).unwrap(),
            Expr::Xor(l, r) => mgr.xor(&l.build(mgr), &r.build(mgr)).unwrap(),
        }
    }
}

fn assignments() -> impl Iterator<Item = Vec<bool>> {
    (0..1u32 << N).map(|m| (0..N).map(|i| m & (1 << i) != 0).collect())
}

fn permutation() -> impl Strategy<Value = Vec<Var>> {
    Just((0..N as u32).map(Var::new).collect::<Vec<_>>()).prop_shuffle()
}

proptest! {
    #[test]
    fn prop_build_matches_eval(e in expr()) {
        let mgr = Manager::new(N, 0, None);
        let f = e.build(&mgr);
        for a in assignments() {
            prop_assert_eq!(mgr.eval(&f, &a).unwrap(), e.eval(&a));
        }
    }

    #[test]
    fn prop_equivalent_formulas_share_a_node(e in expr()) {
        let mgr = Manager::new(N, 0, None);
        let f = e.build(&mgr);
        let twice = Expr::Not(Box::new(Expr::Not(Box::new(e.clone()))));
        prop_assert_eq!(twice.build(&mgr), f.clone());
        let x0 = mgr.var(0).unwrap();
        // Shannon expansion rebuilds the same node.
        let hi = mgr.cofactor_var(&f, Var::new(0), true).unwrap();
        let lo = mgr.cofactor_var(&f, Var::new(0), false).unwrap();
        prop_assert_eq!(mgr.ite(&x0, &hi, &lo).unwrap(), f);
    }

    #[test]
    fn prop_set_order_preserves_functions(e in expr(), order in permutation()) {
        let mgr = Manager::new(N, 0, None);
        let f = e.build(&mgr);
        let before: Vec<bool> = assignments().map(|a| mgr.eval(&f, &a).unwrap()).collect();
        mgr.set_order(&order).unwrap();
        prop_assert_eq!(mgr.order(), order);
        let after: Vec<bool> = assignments().map(|a| mgr.eval(&f, &a).unwrap()).collect();
        prop_assert_eq!(before, after);
        prop_assert!(mgr.check_invariants().is_ok());
    }

    #[test]
    fn prop_sat_count_matches_models(e in expr()) {
        let mgr = Manager::new(N, 0, None);
        let f = e.build(&mgr);
        let models = assignments().filter(|a| e.eval(a)).count() as u32;
        prop_assert_eq!(mgr.sat_count(&f, N).unwrap(), models.into());
        prop_assert_eq!(mgr.sat_count_f64(&f, N).unwrap(), models as f64);
    }

    #[test]
    fn prop_exists_is_disjunction_of_cofactors(e in expr(), v in 0..N as u32) {
        let mgr = Manager::new(N, 0, None);
        let f = e.build(&mgr);
        let cube = mgr.cube_of_vars(&[Var::new(v)]).unwrap();
        let hi = mgr.cofactor_var(&f, Var::new(v), true).unwrap();
        let lo = mgr.cofactor_var(&f, Var::new(v), false).unwrap();
        prop_assert_eq!(mgr.exists(&f, &cube).unwrap(), mgr.or(&hi, &lo).unwrap());
        prop_assert_eq!(mgr.forall(&f, &cube).unwrap(), mgr.and(&hi, &lo).unwrap());
    }
}

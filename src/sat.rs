use std::collections::HashMap;

use num_bigint::BigUint;

use crate::error::{DdError, DdResult};
use crate::handle::{Add, Bdd};
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::{ADD_ZERO, BDD_ONE, BDD_ZERO};
use crate::types::{Kind, Lit, NodeId, Var};

const K: Kind = Kind::Bdd;

/// Arithmetic shared by the exact and the floating-point minterm counts.
trait Count: Clone {
    fn zero() -> Self;
    fn pow2(n: usize) -> Self;
    fn half_sum(a: &Self, b: &Self) -> Self;
    fn complement(max: &Self, x: &Self) -> Self;
}

impl Count for BigUint {
    fn zero() -> Self {
        BigUint::ZERO
    }

    fn pow2(n: usize) -> Self {
        BigUint::from(1u32) << n
    }

    fn half_sum(a: &Self, b: &Self) -> Self {
        (a + b) >> 1
    }

    fn complement(max: &Self, x: &Self) -> Self {
        max - x
    }
}

impl Count for f64 {
    fn zero() -> Self {
        0.0
    }

    fn pow2(n: usize) -> Self {
        2f64.powi(n as i32)
    }

    fn half_sum(a: &Self, b: &Self) -> Self {
        (a + b) / 2.0
    }

    fn complement(max: &Self, x: &Self) -> Self {
        max - x
    }
}

impl Core {
    /// Minterms of `f` over `num_vars` variables. Every node halves the sum
    /// of its children's counts, so counts are exact as long as the support
    /// fits into `num_vars`.
    fn sat_count<C: Count>(&self, f: Ref, num_vars: usize) -> C {
        fn count<C: Count>(core: &Core, r: Ref, max: &C, memo: &mut HashMap<NodeId, C>) -> C {
            if r == BDD_ZERO {
                return C::zero();
            }
            let regular = if r.is_negated() { -r } else { r };
            let value = if regular == BDD_ONE {
                max.clone()
            } else if let Some(c) = memo.get(&regular.id()) {
                c.clone()
            } else {
                let (high, low) = core.children(K, regular);
                let c = C::half_sum(&count(core, high, max, memo), &count(core, low, max, memo));
                memo.insert(regular.id(), c.clone());
                c
            };
            if r.is_negated() {
                C::complement(max, &value)
            } else {
                value
            }
        }
        let max = C::pow2(num_vars);
        count(self, f, &max, &mut HashMap::new())
    }

    /// Paths from `f` that end in a terminal accepted by `accept`.
    fn path_count(&self, kind: Kind, f: Ref, accept: &dyn Fn(Ref) -> bool) -> BigUint {
        fn count(core: &Core, kind: Kind, r: Ref, accept: &dyn Fn(Ref) -> bool, memo: &mut HashMap<Ref, BigUint>) -> BigUint {
            if core.is_terminal(kind, r) {
                return if accept(r) { BigUint::from(1u32) } else { BigUint::ZERO };
            }
            if let Some(c) = memo.get(&r) {
                return c.clone();
            }
            let (high, low) = core.children(kind, r);
            let c = count(core, kind, high, accept, memo) + count(core, kind, low, accept, memo);
            memo.insert(r, c.clone());
            c
        }
        count(self, kind, f, accept, &mut HashMap::new())
    }

    /// One satisfying cube, preferring then-branches.
    pub(crate) fn pick_one_cube(&self, f: Ref) -> Option<Vec<Lit>> {
        if f == BDD_ZERO {
            return None;
        }
        let mut path = Vec::new();
        let mut current = f;
        // Walk down the BDD, always picking a satisfying branch.
        while current != BDD_ONE {
            let var = self.var_of(K, current);
            let (high, low) = self.children(K, current);
            if high != BDD_ZERO {
                path.push(var.pos());
                current = high;
            } else {
                path.push(var.neg());
                current = low;
            }
        }
        Some(path)
    }

    fn support_len(&self, f: Ref) -> usize {
        let ids = crate::handle::reachable(self, K, [f]);
        let table = self.forest(K).table.borrow();
        let vars: std::collections::HashSet<Var> = ids
            .into_iter()
            .map(|id| table.node(id).var)
            .filter(|v| !v.is_terminal())
            .collect();
        vars.len()
    }
}

impl Manager {
    /// Number of satisfying assignments of `f` over `num_vars` variables.
    ///
    /// ```
    /// use dd_rs::manager::Manager;
    ///
    /// let mgr = Manager::new(3, 0, None);
    /// let f = mgr.or(&mgr.var(0).unwrap(), &mgr.var(1).unwrap()).unwrap();
    /// assert_eq!(mgr.sat_count(&f, 3).unwrap(), 6u32.into());
    /// ```
    pub fn sat_count(&self, f: &Bdd, num_vars: usize) -> DdResult<BigUint> {
        let f = self.check(f)?;
        self.query(|core| {
            if core.support_len(f) > num_vars {
                return Err(DdError::invalid(format!("function depends on more than {} variables", num_vars)));
            }
            Ok(core.sat_count::<BigUint>(f, num_vars))
        })
    }

    /// Floating-point minterm count; may lose precision or overflow to infinity.
    pub fn sat_count_f64(&self, f: &Bdd, num_vars: usize) -> DdResult<f64> {
        let f = self.check(f)?;
        self.query(|core| Ok(core.sat_count::<f64>(f, num_vars)))
    }

    /// Number of paths from the root of `f` to `true`, which is the number
    /// of cubes [`Manager::cubes`] yields.
    pub fn path_count(&self, f: &Bdd) -> DdResult<BigUint> {
        let f = self.check(f)?;
        self.query(|core| Ok(core.path_count(Kind::Bdd, f, &|r| r == BDD_ONE)))
    }

    /// Number of paths from the root of `f` to a non-zero leaf.
    pub fn add_path_count(&self, f: &Add) -> DdResult<BigUint> {
        let f = self.check(f)?;
        self.query(|core| Ok(core.path_count(Kind::Add, f, &|r| r != ADD_ZERO)))
    }

    /// One satisfying cube of `f`, top-down, or `None` if `f` is false.
    pub fn pick_one_cube(&self, f: &Bdd) -> DdResult<Option<Vec<Lit>>> {
        let f = self.check(f)?;
        self.query(|core| Ok(core.pick_one_cube(f)))
    }

    /// One satisfying assignment to exactly `vars`, which must cover the
    /// support of `f`. Variables the cube leaves open are set to false.
    pub fn pick_one_minterm(&self, f: &Bdd, vars: &[Var]) -> DdResult<Option<Vec<Lit>>> {
        let node = self.check(f)?;
        if let Some(v) = f.support().into_iter().find(|v| !vars.contains(v)) {
            return Err(DdError::invalid(format!("variable {} of the support is missing", v)));
        }
        let cube = self.query(|core| Ok(core.pick_one_cube(node)))?;
        Ok(cube.map(|cube| {
            vars.iter()
                .map(|&v| cube.iter().copied().find(|l| l.var() == v).unwrap_or(v.neg()))
                .collect()
        }))
    }
}

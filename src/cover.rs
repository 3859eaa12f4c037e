//! Two-level covers and cube-oriented queries on BDDs.
//!
//! [`Manager::isop`] computes an irredundant sum of products between two
//! bounds (Minato-Morreale). The remaining queries look for literals every
//! model shares, cheapest paths to `true`, and the dual of a function.

use std::collections::HashMap;
use std::fmt::Write;

use log::debug;

use crate::error::{DdError, DdResult};
use crate::handle::Bdd;
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::{BDD_ONE, BDD_ZERO};
use crate::types::{Kind, Lit, Var};

const K: Kind = Kind::Bdd;

/// A sum of products: the disjunction of its cubes.
pub type Cover = Vec<Vec<Lit>>;

type IsopMemo = HashMap<(Bdd, Bdd), (Bdd, Cover)>;

impl Manager {
    /// Irredundant sum of products `c` with `lower ≤ c ≤ upper`.
    ///
    /// Returns the cover both as a BDD and as a list of cubes.
    ///
    /// ```
    /// use dd_rs::manager::Manager;
    ///
    /// let mgr = Manager::new(3, 0, None);
    /// let x0 = mgr.var(0).unwrap();
    /// let x1 = mgr.var(1).unwrap();
    /// let f = mgr.or(&x0, &x1).unwrap();
    /// let (c, cubes) = mgr.isop(&f, &f).unwrap();
    /// assert_eq!(c, f);
    /// assert_eq!(cubes.len(), 2);
    /// ```
    pub fn isop(&self, lower: &Bdd, upper: &Bdd) -> DdResult<(Bdd, Cover)> {
        if !self.leq(lower, upper)? {
            return Err(DdError::invalid("isop lower bound does not imply the upper bound"));
        }
        let mut memo = HashMap::new();
        let res = self.isop_rec(lower, upper, &mut memo)?;
        debug!("isop: {} cubes", res.1.len());
        Ok(res)
    }

    fn isop_rec(&self, lower: &Bdd, upper: &Bdd, memo: &mut IsopMemo) -> DdResult<(Bdd, Cover)> {
        if lower.is_zero() {
            return Ok((self.zero(), Vec::new()));
        }
        if upper.is_one() {
            return Ok((self.one(), vec![Vec::new()]));
        }
        let key = (lower.clone(), upper.clone());
        if let Some(res) = memo.get(&key) {
            return Ok(res.clone());
        }

        let var = self.topmost(&[lower, upper]);
        let (l1, l0) = (self.cofactor_var(lower, var, true)?, self.cofactor_var(lower, var, false)?);
        let (u1, u0) = (self.cofactor_var(upper, var, true)?, self.cofactor_var(upper, var, false)?);

        // Minterms only one branch can cover.
        let (c0, cubes0) = self.isop_rec(&self.and(&l0, &!&u1)?, &u0, memo)?;
        let (c1, cubes1) = self.isop_rec(&self.and(&l1, &!&u0)?, &u1, memo)?;
        // The rest goes to cubes without `var`.
        let rest = self.or(&self.and(&l0, &!&c0)?, &self.and(&l1, &!&c1)?)?;
        let (cd, cubes_d) = self.isop_rec(&rest, &self.and(&u0, &u1)?, memo)?;

        let x = self.var(var.index())?;
        let cover = self.or_all([&self.and(&!&x, &c0)?, &self.and(&x, &c1)?, &cd])?;
        let prefixed = |lit: Lit, cubes: Cover| {
            cubes.into_iter().map(move |cube| std::iter::once(lit).chain(cube).collect::<Vec<_>>())
        };
        let cubes: Cover = prefixed(var.neg(), cubes0)
            .chain(prefixed(var.pos(), cubes1))
            .chain(cubes_d)
            .collect();

        memo.insert(key, (cover.clone(), cubes.clone()));
        Ok((cover, cubes))
    }

    /// Variable at the topmost level among the roots of `fs`.
    fn topmost(&self, fs: &[&Bdd]) -> Var {
        fs.iter()
            .filter_map(|f| f.top_var())
            .min_by_key(|&v| self.level_of(v))
            .unwrap_or(Var::TERMINAL)
    }

    /// Irredundant cover of `f`, one cube per line.
    ///
    /// Each line has one column per variable, `1`, `0` or `-`, followed by ` 1`.
    pub fn cover_string(&self, f: &Bdd) -> DdResult<String> {
        let (_, cubes) = self.isop(f, f)?;
        let n = self.num_vars();
        let mut out = String::new();
        for cube in cubes {
            let mut row = vec!['-'; n];
            for lit in cube {
                row[lit.var().as_usize()] = if lit.is_positive() { '1' } else { '0' };
            }
            let row: String = row.into_iter().collect();
            let _ = writeln!(out, "{} 1", row);
        }
        Ok(out)
    }

    /// Literals implied by `f`, in the order of its support. Empty for `false`.
    pub fn essential(&self, f: &Bdd) -> DdResult<Vec<Lit>> {
        self.check(f)?;
        let mut lits = Vec::new();
        for var in f.support() {
            let x = self.var(var.index())?;
            if self.leq(f, &x)? {
                lits.push(var.pos());
            } else if self.leq(f, &!&x)? {
                lits.push(var.neg());
            }
        }
        Ok(lits)
    }

    /// Whether every model of `f` satisfies `lit`.
    pub fn is_essential(&self, f: &Bdd, lit: Lit) -> DdResult<bool> {
        let lit = self.cube(&[lit])?;
        self.leq(f, &lit)
    }

    /// Whether `f ≤ g` wherever `d` is false.
    pub fn leq_unless(&self, f: &Bdd, g: &Bdd, d: &Bdd) -> DdResult<bool> {
        self.leq(f, &self.or(g, d)?)
    }

    /// A cube of `f` with the fewest literals, and its literal count.
    ///
    /// Returns `None` when `f` is `false`.
    pub fn largest_cube(&self, f: &Bdd) -> DdResult<Option<(Bdd, u64)>> {
        let f = self.check(f)?;
        let path = self.query(|core| Ok(core.cheapest_path(f, |_, _| 1)))?;
        self.path_cube(path)
    }

    /// A cube of `f` minimizing the total weight of its positive literals.
    ///
    /// Taking the then-branch of variable `v` costs `weights[v]`; else-branches
    /// are free. Returns `None` when `f` is `false`.
    pub fn shortest_path(&self, f: &Bdd, weights: &[u64]) -> DdResult<Option<(Bdd, u64)>> {
        let f = self.check(f)?;
        if weights.len() != self.num_vars() {
            return Err(DdError::invalid(format!(
                "weight vector has {} entries for {} variables",
                weights.len(),
                self.num_vars()
            )));
        }
        let path = self.query(|core| {
            Ok(core.cheapest_path(f, |var, high| if high { weights[var.as_usize()] } else { 0 }))
        })?;
        self.path_cube(path)
    }

    fn path_cube(&self, path: Option<(Vec<Lit>, u64)>) -> DdResult<Option<(Bdd, u64)>> {
        match path {
            Some((lits, cost)) => Ok(Some((self.cube(&lits)?, cost))),
            None => Ok(None),
        }
    }

    /// `¬f(¬x₀, …, ¬xₙ₋₁)`
    pub fn dual(&self, f: &Bdd) -> DdResult<Bdd> {
        let negated = (0..self.num_vars() as u32).map(|i| self.nvar(i)).collect::<DdResult<Vec<_>>>()?;
        self.not(&self.vector_compose(f, &negated)?)
    }

    pub fn is_self_dual(&self, f: &Bdd) -> DdResult<bool> {
        Ok(self.dual(f)? == *f)
    }
}

impl Core {
    /// Literals and cost of a cheapest path from `f` to `true`, where taking
    /// the `high` edge of a node on `var` costs `cost(var, high)`.
    pub(crate) fn cheapest_path(&self, f: Ref, cost: impl Fn(Var, bool) -> u64) -> Option<(Vec<Lit>, u64)> {
        let mut memo = HashMap::new();
        let total = self.path_cost(f, &cost, &mut memo)?;

        let mut lits = Vec::new();
        let mut r = f;
        while !self.is_terminal(K, r) {
            let var = self.var_of(K, r);
            let (high, low) = self.children(K, r);
            let via_high = self.path_cost(high, &cost, &mut memo).map(|c| c.saturating_add(cost(var, true)));
            let via_low = self.path_cost(low, &cost, &mut memo).map(|c| c.saturating_add(cost(var, false)));
            let take_high = match (via_high, via_low) {
                (Some(h), Some(l)) => h <= l,
                (h, _) => h.is_some(),
            };
            if take_high {
                lits.push(var.pos());
                r = high;
            } else {
                lits.push(var.neg());
                r = low;
            }
        }
        Some((lits, total))
    }

    fn path_cost(&self, r: Ref, cost: &impl Fn(Var, bool) -> u64, memo: &mut HashMap<Ref, Option<u64>>) -> Option<u64> {
        if r == BDD_ONE {
            return Some(0);
        }
        if r == BDD_ZERO {
            return None;
        }
        if let Some(&res) = memo.get(&r) {
            return res;
        }
        let var = self.var_of(K, r);
        let (high, low) = self.children(K, r);
        let via_high = self.path_cost(high, cost, memo).map(|c| c.saturating_add(cost(var, true)));
        let via_low = self.path_cost(low, cost, memo).map(|c| c.saturating_add(cost(var, false)));
        let res = match (via_high, via_low) {
            (Some(h), Some(l)) => Some(h.min(l)),
            (h, l) => h.or(l),
        };
        memo.insert(r, res);
        res
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn setup(n: u32) -> (Manager, Vec<Bdd>) {
        let mgr = Manager::new(n as usize, 0, None);
        let vars = (0..n).map(|i| mgr.var(i).unwrap()).collect();
        (mgr, vars)
    }

    fn majority(mgr: &Manager, x: &[Bdd]) -> Bdd {
        let ab = mgr.and(&x[0], &x[1]).unwrap();
        let ac = mgr.and(&x[0], &x[2]).unwrap();
        let bc = mgr.and(&x[1], &x[2]).unwrap();
        mgr.or_all([&ab, &ac, &bc]).unwrap()
    }

    #[test]
    fn test_isop_covers_function() {
        let (mgr, x) = setup(3);
        let f = majority(&mgr, &x);
        let (c, cubes) = mgr.isop(&f, &f).unwrap();
        assert_eq!(c, f);
        assert_eq!(cubes.len(), 3);
        assert!(cubes.iter().all(|cube| cube.len() == 2));

        let rebuilt: Vec<Bdd> = cubes.iter().map(|cube| mgr.cube(cube).unwrap()).collect();
        assert_eq!(mgr.or_all(&rebuilt).unwrap(), f);
    }

    #[test]
    fn test_isop_uses_dont_cares() {
        let (mgr, x) = setup(2);
        let lower = mgr.and(&x[0], &x[1]).unwrap();
        let upper = x[0].clone();
        let (c, cubes) = mgr.isop(&lower, &upper).unwrap();
        assert_eq!(c, x[0]);
        assert_eq!(cubes, vec![vec![Var::new(0).pos()]]);

        assert!(matches!(mgr.isop(&upper, &lower), Err(DdError::InvalidArgument(_))));
    }

    #[test]
    fn test_isop_constants() {
        let (mgr, _) = setup(2);
        assert_eq!(mgr.isop(&mgr.zero(), &mgr.zero()).unwrap(), (mgr.zero(), vec![]));
        assert_eq!(mgr.isop(&mgr.one(), &mgr.one()).unwrap(), (mgr.one(), vec![vec![]]));
    }

    #[test]
    fn test_cover_string() {
        let (mgr, x) = setup(3);
        let f = mgr.and(&x[0], &!&x[2]).unwrap();
        assert_eq!(mgr.cover_string(&f).unwrap(), "1-0 1\n");
        assert_eq!(mgr.cover_string(&mgr.zero()).unwrap(), "");

        let g = mgr.xor(&x[0], &x[1]).unwrap();
        let text = mgr.cover_string(&g).unwrap();
        let mut rows: Vec<&str> = text.lines().collect();
        rows.sort();
        assert_eq!(rows, vec!["01- 1", "10- 1"]);
    }

    #[test]
    fn test_essential() {
        let (mgr, x) = setup(3);
        let f = mgr.and(&x[0], &mgr.or(&x[1], &x[2]).unwrap()).unwrap();
        assert_eq!(mgr.essential(&f).unwrap(), vec![Var::new(0).pos()]);

        let g = mgr.and(&!&x[1], &mgr.xor(&x[0], &x[2]).unwrap()).unwrap();
        assert_eq!(mgr.essential(&g).unwrap(), vec![Var::new(1).neg()]);
        assert!(mgr.is_essential(&g, Var::new(1).neg()).unwrap());
        assert!(!mgr.is_essential(&g, Var::new(0).pos()).unwrap());
        assert!(!mgr.is_essential(&g, Var::new(1).pos()).unwrap());

        assert!(mgr.essential(&mgr.zero()).unwrap().is_empty());
        assert!(mgr.essential(&mgr.one()).unwrap().is_empty());
    }

    #[test]
    fn test_leq_unless() {
        let (mgr, x) = setup(2);
        let f = x[0].clone();
        let g = mgr.and(&x[0], &x[1]).unwrap();
        assert!(!mgr.leq(&f, &g).unwrap());
        assert!(mgr.leq_unless(&f, &g, &!&x[1]).unwrap());
        assert!(!mgr.leq_unless(&f, &g, &x[1]).unwrap());
    }

    #[test]
    fn test_largest_cube() {
        let (mgr, x) = setup(4);
        let long = mgr.and_all(&x[..3]).unwrap();
        let short = mgr.and(&!&x[0], &x[3]).unwrap();
        let f = mgr.or(&long, &short).unwrap();
        let (cube, len) = mgr.largest_cube(&f).unwrap().unwrap();
        assert_eq!(len, 2);
        assert_eq!(cube, short);
        assert!(mgr.leq(&cube, &f).unwrap());

        assert_eq!(mgr.largest_cube(&mgr.zero()).unwrap(), None);
        assert_eq!(mgr.largest_cube(&mgr.one()).unwrap(), Some((mgr.one(), 0)));
    }

    #[test]
    fn test_shortest_path() {
        let (mgr, x) = setup(3);
        // Either x0 or x1 and x2.
        let f = mgr.or(&x[0], &mgr.and(&x[1], &x[2]).unwrap()).unwrap();

        let (cube, cost) = mgr.shortest_path(&f, &[1, 1, 1]).unwrap().unwrap();
        assert_eq!(cost, 1);
        assert_eq!(cube, x[0]);

        let (cube, cost) = mgr.shortest_path(&f, &[10, 2, 3]).unwrap().unwrap();
        assert_eq!(cost, 5);
        assert_eq!(cube, mgr.and_all([&!&x[0], &x[1], &x[2]]).unwrap());

        assert_eq!(mgr.shortest_path(&mgr.zero(), &[1, 1, 1]).unwrap(), None);
        assert!(matches!(mgr.shortest_path(&f, &[1]), Err(DdError::InvalidArgument(_))));
    }

    #[test]
    fn test_dual() {
        let (mgr, x) = setup(3);
        let and = mgr.and(&x[0], &x[1]).unwrap();
        let or = mgr.or(&x[0], &x[1]).unwrap();
        assert_eq!(mgr.dual(&and).unwrap(), or);
        assert_eq!(mgr.dual(&or).unwrap(), and);
        assert_eq!(mgr.dual(&mgr.one()).unwrap(), mgr.zero());

        assert!(mgr.is_self_dual(&majority(&mgr, &x)).unwrap());
        assert!(mgr.is_self_dual(&mgr.xor(&x[0], &mgr.xor(&x[1], &x[2]).unwrap()).unwrap()).unwrap());
        assert!(!mgr.is_self_dual(&and).unwrap());
    }
}

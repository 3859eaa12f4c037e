//! Zero-suppressed decision diagrams.
//!
//! A ZDD denotes a family of sets over the ZDD variables. A node
//! `(v, high, low)` stands for `{ s ∪ {v} | s ∈ high } ∪ low`; a variable
//! skipped on a path is absent from the set, which is why nodes whose
//! then-child is the empty family are never created.
//!
//! Basic operations, for families `P` and `Q`:
//!   - `P.subset0(v)` selects the sets not containing `v` (offset);
//!   - `P.subset1(v)` selects the sets containing `v` and removes `v` (onset);
//!   - `P.change(v)` toggles `v` in every set;
//!   - union, intersection, difference and symmetric difference of `P` and `Q`;
//!   - `P.join(Q)` is `{ p ∪ q }` and `P.meet(Q)` is `{ p ∩ q }`;
//!   - `P.count()` is the number of sets in `P`.

use std::collections::HashMap;

use log::trace;
use num_bigint::BigUint;

use crate::cache::OpKey;
use crate::error::DdResult;
use crate::handle::Zdd;
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::{ZDD_BASE, ZDD_EMPTY};
use crate::types::{Kind, Level, NodeId, Space, Var};

const K: Kind = Kind::Zdd;

/// Binary family operations sharing one recursion.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ZddOp {
    Union,
    Intersection,
    Difference,
    SymmetricDifference,
    Join,
    Meet,
}

/// Operations parameterized by one variable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ZddVarOp {
    Subset0,
    Subset1,
    Change,
}

impl ZddOp {
    fn is_commutative(self) -> bool {
        self != ZddOp::Difference
    }

    fn terminal_case(self, f: Ref, g: Ref) -> Option<Ref> {
        match self {
            ZddOp::Union if f == ZDD_EMPTY => Some(g),
            ZddOp::Union if g == ZDD_EMPTY || f == g => Some(f),
            ZddOp::Intersection if f == ZDD_EMPTY || g == ZDD_EMPTY => Some(ZDD_EMPTY),
            ZddOp::Intersection if f == g => Some(f),
            ZddOp::Difference if f == ZDD_EMPTY || f == g => Some(ZDD_EMPTY),
            ZddOp::Difference if g == ZDD_EMPTY => Some(f),
            ZddOp::SymmetricDifference if f == g => Some(ZDD_EMPTY),
            ZddOp::SymmetricDifference if f == ZDD_EMPTY => Some(g),
            ZddOp::SymmetricDifference if g == ZDD_EMPTY => Some(f),
            ZddOp::Join | ZddOp::Meet if f == ZDD_EMPTY || g == ZDD_EMPTY => Some(ZDD_EMPTY),
            ZddOp::Join if f == ZDD_BASE => Some(g),
            ZddOp::Join if g == ZDD_BASE => Some(f),
            ZddOp::Meet if f == ZDD_BASE || g == ZDD_BASE => Some(ZDD_BASE),
            ZddOp::Meet if f == g => Some(f),
            _ => None,
        }
    }
}

impl Core {
    pub(crate) fn zdd_top(&self, refs: &[Ref]) -> (Level, Var) {
        let top = refs.iter().map(|&r| self.level(K, r)).min().unwrap_or(Level::TERMINAL);
        (top, self.var_at(Space::Zdd, top))
    }

    pub(crate) fn zdd_apply(&self, op: ZddOp, f: Ref, g: Ref) -> DdResult<Ref> {
        trace!("zdd_apply({:?}, f = {}, g = {})", op, f, g);

        if let Some(res) = op.terminal_case(f, g) {
            return Ok(res);
        }
        if self.is_terminal(K, f) && self.is_terminal(K, g) {
            // Both are BASE or EMPTY, every remaining combination is covered
            // by `terminal_case` except BASE ∘ BASE for set operations.
            return Ok(match op {
                ZddOp::Union | ZddOp::Intersection | ZddOp::Join | ZddOp::Meet => ZDD_BASE,
                ZddOp::Difference | ZddOp::SymmetricDifference => ZDD_EMPTY,
            });
        }

        let (f, g) = if op.is_commutative() && f > g { (g, f) } else { (f, g) };
        let key = OpKey::Zdd(op, f, g);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let (top, var) = self.zdd_top(&[f, g]);
        let (f1, f0) = self.cofactors(K, f, top);
        let (g1, g0) = self.cofactors(K, g, top);

        let (t, e) = match op {
            ZddOp::Join => {
                // {a ∪ b}: `var` is in the result if it is in either set.
                let a = self.zdd_apply(op, f1, g1)?;
                let a = self.pin(K, a);
                let b = self.zdd_apply(op, f1, g0)?;
                let b = self.pin(K, b);
                let c = self.zdd_apply(op, f0, g1)?;
                let c = self.pin(K, c);
                let ab = self.zdd_apply(ZddOp::Union, a.get(), b.get())?;
                let ab = self.pin(K, ab);
                let t = self.zdd_apply(ZddOp::Union, ab.get(), c.get())?;
                let t = self.pin(K, t);
                let e = self.zdd_apply(op, f0, g0)?;
                (t, self.pin(K, e))
            }
            ZddOp::Meet => {
                // {a ∩ b}: `var` is in the result only if it is in both.
                let t = self.zdd_apply(op, f1, g1)?;
                let t = self.pin(K, t);
                let a = self.zdd_apply(op, f1, g0)?;
                let a = self.pin(K, a);
                let b = self.zdd_apply(op, f0, g1)?;
                let b = self.pin(K, b);
                let c = self.zdd_apply(op, f0, g0)?;
                let c = self.pin(K, c);
                let ab = self.zdd_apply(ZddOp::Union, a.get(), b.get())?;
                let ab = self.pin(K, ab);
                let e = self.zdd_apply(ZddOp::Union, ab.get(), c.get())?;
                (t, self.pin(K, e))
            }
            _ => {
                let t = self.zdd_apply(op, f1, g1)?;
                let t = self.pin(K, t);
                let e = self.zdd_apply(op, f0, g0)?;
                (t, self.pin(K, e))
            }
        };
        let res = self.unique(K, var, t.get(), e.get())?;

        self.cache_put(K, key, res);
        Ok(res)
    }

    pub(crate) fn zdd_var_op(&self, op: ZddVarOp, f: Ref, var: Var) -> DdResult<Ref> {
        trace!("zdd_var_op({:?}, f = {}, var = {})", op, f, var);

        let level = self.var_level(Space::Zdd, var);
        let f_level = self.level(K, f);
        if f_level > level {
            // No set of `f` contains `var`.
            return match op {
                ZddVarOp::Subset0 => Ok(f),
                ZddVarOp::Subset1 => Ok(ZDD_EMPTY),
                ZddVarOp::Change => self.unique(K, var, f, ZDD_EMPTY),
            };
        }
        if f_level == level {
            let (high, low) = self.children(K, f);
            return match op {
                ZddVarOp::Subset0 => Ok(low),
                ZddVarOp::Subset1 => Ok(high),
                ZddVarOp::Change => self.unique(K, var, low, high),
            };
        }

        let key = OpKey::ZddVar(op, f, var);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let top_var = self.var_of(K, f);
        let (high, low) = self.children(K, f);
        let t = self.zdd_var_op(op, high, var)?;
        let t = self.pin(K, t);
        let e = self.zdd_var_op(op, low, var)?;
        let e = self.pin(K, e);
        let res = self.unique(K, top_var, t.get(), e.get())?;

        self.cache_put(K, key, res);
        Ok(res)
    }

    /// The family holding exactly one set.
    pub(crate) fn zdd_set(&self, vars: &[Var]) -> DdResult<Ref> {
        let mut vars = vars.to_vec();
        vars.sort_by_key(|&v| std::cmp::Reverse(self.var_level(Space::Zdd, v)));
        vars.dedup();
        let mut acc = self.pin(K, ZDD_BASE);
        for v in vars {
            let r = self.unique(K, v, acc.get(), ZDD_EMPTY)?;
            acc = self.pin(K, r);
        }
        Ok(acc.get())
    }

    /// Builds a family bottom-up over all ZDD levels; `node(var, child)`
    /// gives the `(high, low)` pair of the node created at `var`.
    fn zdd_layers(&self, node: impl Fn(Var, Ref) -> (Ref, Ref)) -> DdResult<Ref> {
        let vars = self.space(Space::Zdd).order.borrow().vars().to_vec();
        let mut acc = self.pin(K, ZDD_BASE);
        for &v in vars.iter().rev() {
            let (high, low) = node(v, acc.get());
            let r = self.unique(K, v, high, low)?;
            acc = self.pin(K, r);
        }
        Ok(acc.get())
    }

    /// The power set of all ZDD variables.
    pub(crate) fn zdd_universe(&self) -> DdResult<Ref> {
        self.zdd_layers(|_, r| (r, r))
    }

    /// All sets over the ZDD variables that contain `var`.
    pub(crate) fn zdd_ith_var(&self, var: Var) -> DdResult<Ref> {
        self.zdd_layers(|v, r| if v == var { (r, ZDD_EMPTY) } else { (r, r) })
    }

    pub(crate) fn zdd_complement(&self, f: Ref) -> DdResult<Ref> {
        let u = self.zdd_universe()?;
        let u = self.pin(K, u);
        self.zdd_apply(ZddOp::Difference, u.get(), f)
    }

    /// `(f ∩ g) ∪ (h \ f)`
    pub(crate) fn zdd_ite(&self, f: Ref, g: Ref, h: Ref) -> DdResult<Ref> {
        let a = self.zdd_apply(ZddOp::Intersection, f, g)?;
        let a = self.pin(K, a);
        let b = self.zdd_apply(ZddOp::Difference, h, f)?;
        let b = self.pin(K, b);
        self.zdd_apply(ZddOp::Union, a.get(), b.get())
    }

    pub(crate) fn zdd_count(&self, f: Ref) -> BigUint {
        fn count(core: &Core, f: Ref, memo: &mut HashMap<NodeId, BigUint>) -> BigUint {
            if f == ZDD_EMPTY {
                return BigUint::from(0u32);
            }
            if f == ZDD_BASE {
                return BigUint::from(1u32);
            }
            if let Some(c) = memo.get(&f.id()) {
                return c.clone();
            }
            let (high, low) = core.children(K, f);
            let c = count(core, high, memo) + count(core, low, memo);
            memo.insert(f.id(), c.clone());
            c
        }
        count(self, f, &mut HashMap::new())
    }

    pub(crate) fn zdd_count_f64(&self, f: Ref) -> f64 {
        fn count(core: &Core, f: Ref, memo: &mut HashMap<NodeId, f64>) -> f64 {
            if f == ZDD_EMPTY {
                return 0.0;
            }
            if f == ZDD_BASE {
                return 1.0;
            }
            if let Some(&c) = memo.get(&f.id()) {
                return c;
            }
            let (high, low) = core.children(K, f);
            let c = count(core, high, memo) + count(core, low, memo);
            memo.insert(f.id(), c);
            c
        }
        count(self, f, &mut HashMap::new())
    }

    pub(crate) fn zdd_contains(&self, f: Ref, set: &[Var]) -> bool {
        let mut levels: Vec<Level> = set.iter().map(|&v| self.var_level(Space::Zdd, v)).collect();
        levels.sort();
        levels.dedup();
        let mut next = levels.into_iter().peekable();
        let mut cur = f;
        while !self.is_terminal(K, cur) {
            let level = self.level(K, cur);
            let (high, low) = self.children(K, cur);
            match next.peek() {
                Some(&l) if l == level => {
                    next.next();
                    cur = high;
                }
                Some(&l) if l < level => return false,
                _ => cur = low,
            }
        }
        cur == ZDD_BASE && next.peek().is_none()
    }
}

impl Manager {
    /// The empty family `∅`.
    pub fn zdd_empty(&self) -> Zdd {
        self.zdd(ZDD_EMPTY)
    }

    /// The family `{∅}`.
    pub fn zdd_base(&self) -> Zdd {
        self.zdd(ZDD_BASE)
    }

    /// The family `{{var}}`, creating ZDD variables as needed.
    pub fn zdd_singleton(&self, var: Var) -> DdResult<Zdd> {
        self.run(|core| {
            core.ensure_var(Space::Zdd, var)?;
            core.unique(K, var, ZDD_BASE, ZDD_EMPTY)
        })
    }

    /// The family `{vars}` holding one set.
    pub fn zdd_set(&self, vars: &[Var]) -> DdResult<Zdd> {
        self.run(|core| {
            if let Some(&max) = vars.iter().max() {
                core.ensure_var(Space::Zdd, max)?;
            }
            core.zdd_set(vars)
        })
    }

    /// The family of the given sets.
    pub fn zdd_from_sets<S: AsRef<[Var]>>(&self, sets: &[S]) -> DdResult<Zdd> {
        let mut acc = self.zdd_empty();
        for set in sets {
            let s = self.zdd_set(set.as_ref())?;
            acc = self.zdd_union(&acc, &s)?;
        }
        Ok(acc)
    }

    /// The power set of all ZDD variables.
    pub fn zdd_universe(&self) -> DdResult<Zdd> {
        self.run(|core| core.zdd_universe())
    }

    /// The Boolean function `x_var` in ZDD form: every set over all ZDD
    /// variables that contains `var`.
    pub fn zdd_var(&self, var: Var) -> DdResult<Zdd> {
        self.run(|core| {
            core.ensure_var(Space::Zdd, var)?;
            core.zdd_ith_var(var)
        })
    }

    pub fn zdd_apply(&self, op: ZddOp, f: &Zdd, g: &Zdd) -> DdResult<Zdd> {
        let f = self.check(f)?;
        let g = self.check(g)?;
        self.run(|core| core.zdd_apply(op, f, g))
    }

    pub fn zdd_union(&self, f: &Zdd, g: &Zdd) -> DdResult<Zdd> {
        self.zdd_apply(ZddOp::Union, f, g)
    }

    pub fn zdd_intersection(&self, f: &Zdd, g: &Zdd) -> DdResult<Zdd> {
        self.zdd_apply(ZddOp::Intersection, f, g)
    }

    pub fn zdd_difference(&self, f: &Zdd, g: &Zdd) -> DdResult<Zdd> {
        self.zdd_apply(ZddOp::Difference, f, g)
    }

    pub fn zdd_symmetric_difference(&self, f: &Zdd, g: &Zdd) -> DdResult<Zdd> {
        self.zdd_apply(ZddOp::SymmetricDifference, f, g)
    }

    /// `{ p ∪ q | p ∈ f, q ∈ g }`
    pub fn zdd_join(&self, f: &Zdd, g: &Zdd) -> DdResult<Zdd> {
        self.zdd_apply(ZddOp::Join, f, g)
    }

    /// `{ p ∩ q | p ∈ f, q ∈ g }`
    pub fn zdd_meet(&self, f: &Zdd, g: &Zdd) -> DdResult<Zdd> {
        self.zdd_apply(ZddOp::Meet, f, g)
    }

    /// Complement relative to [`Manager::zdd_universe`].
    pub fn zdd_complement(&self, f: &Zdd) -> DdResult<Zdd> {
        let f = self.check(f)?;
        self.run(|core| core.zdd_complement(f))
    }

    /// `(f ∩ g) ∪ (h \ f)`, the if-then-else of ZDD-encoded functions.
    pub fn zdd_ite(&self, f: &Zdd, g: &Zdd, h: &Zdd) -> DdResult<Zdd> {
        let f = self.check(f)?;
        let g = self.check(g)?;
        let h = self.check(h)?;
        self.run(|core| core.zdd_ite(f, g, h))
    }

    fn zdd_var_op(&self, op: ZddVarOp, f: &Zdd, var: Var) -> DdResult<Zdd> {
        let f = self.check(f)?;
        self.core.check_var(Space::Zdd, var)?;
        self.run(|core| core.zdd_var_op(op, f, var))
    }

    /// Sets not containing `var`.
    pub fn zdd_subset0(&self, f: &Zdd, var: Var) -> DdResult<Zdd> {
        self.zdd_var_op(ZddVarOp::Subset0, f, var)
    }

    /// Sets containing `var`, with `var` removed.
    pub fn zdd_subset1(&self, f: &Zdd, var: Var) -> DdResult<Zdd> {
        self.zdd_var_op(ZddVarOp::Subset1, f, var)
    }

    /// Toggles `var` in every set.
    pub fn zdd_change(&self, f: &Zdd, var: Var) -> DdResult<Zdd> {
        self.zdd_var_op(ZddVarOp::Change, f, var)
    }

    /// Number of sets in the family.
    pub fn zdd_count(&self, f: &Zdd) -> DdResult<BigUint> {
        let f = self.check(f)?;
        self.query(|core| Ok(core.zdd_count(f)))
    }

    /// Number of sets as a float, saturating to infinity.
    pub fn zdd_count_f64(&self, f: &Zdd) -> DdResult<f64> {
        let f = self.check(f)?;
        self.query(|core| Ok(core.zdd_count_f64(f)))
    }

    /// Whether `set` is a member of the family.
    pub fn zdd_contains(&self, f: &Zdd, set: &[Var]) -> DdResult<bool> {
        let f = self.check(f)?;
        if set.iter().any(|v| v.as_usize() >= self.num_zdd_vars()) {
            return Ok(false);
        }
        self.query(|core| Ok(core.zdd_contains(f, set)))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn v(i: u32) -> Var {
        Var::new(i)
    }

    #[test]
    fn test_empty() {
        let mgr = Manager::new(0, 3, None);
        let e = mgr.zdd_empty();
        assert!(e.is_empty());
        assert_eq!(mgr.zdd_count(&e).unwrap(), BigUint::from(0u32));
        assert!(!mgr.zdd_contains(&e, &[]).unwrap());
        assert!(mgr.zdd_contains(&mgr.zdd_base(), &[]).unwrap());
    }

    #[test]
    fn test_singleton() {
        let mgr = Manager::new(0, 3, None);
        let a = mgr.zdd_singleton(v(1)).unwrap();
        assert_eq!(mgr.zdd_count(&a).unwrap(), BigUint::from(1u32));
        assert!(mgr.zdd_contains(&a, &[v(1)]).unwrap());
        assert!(!mgr.zdd_contains(&a, &[]).unwrap());
        assert!(!mgr.zdd_contains(&a, &[v(1), v(2)]).unwrap());
    }

    #[test]
    fn test_union_and_intersection() {
        let mgr = Manager::new(0, 3, None);
        let f = mgr.zdd_from_sets(&[vec![v(0)], vec![v(0), v(2)]]).unwrap();
        let g = mgr.zdd_from_sets(&[vec![v(0), v(2)], vec![v(1)]]).unwrap();
        let u = mgr.zdd_union(&f, &g).unwrap();
        assert_eq!(mgr.zdd_count(&u).unwrap(), BigUint::from(3u32));
        let i = mgr.zdd_intersection(&f, &g).unwrap();
        assert_eq!(i, mgr.zdd_set(&[v(2), v(0)]).unwrap());
        let d = mgr.zdd_difference(&f, &g).unwrap();
        assert_eq!(d, mgr.zdd_singleton(v(0)).unwrap());
        let s = mgr.zdd_symmetric_difference(&f, &g).unwrap();
        assert_eq!(s, mgr.zdd_from_sets(&[vec![v(0)], vec![v(1)]]).unwrap());
    }

    #[test]
    fn test_subsets_and_change() {
        let mgr = Manager::new(0, 3, None);
        let f = mgr.zdd_from_sets(&[vec![v(0), v(1)], vec![v(1), v(2)], vec![v(2)]]).unwrap();
        let s1 = mgr.zdd_subset1(&f, v(1)).unwrap();
        assert_eq!(s1, mgr.zdd_from_sets(&[vec![v(0)], vec![v(2)]]).unwrap());
        let s0 = mgr.zdd_subset0(&f, v(1)).unwrap();
        assert_eq!(s0, mgr.zdd_set(&[v(2)]).unwrap());
        let c = mgr.zdd_change(&f, v(2)).unwrap();
        assert_eq!(c, mgr.zdd_from_sets(&[vec![v(0), v(1), v(2)], vec![v(1)], vec![]]).unwrap());
        assert_eq!(mgr.zdd_change(&c, v(2)).unwrap(), f);
    }

    #[test]
    fn test_join_and_meet() {
        let mgr = Manager::new(0, 3, None);
        let f = mgr.zdd_from_sets(&[vec![v(0)], vec![v(1)]]).unwrap();
        let g = mgr.zdd_from_sets(&[vec![v(1)], vec![v(2)]]).unwrap();
        let j = mgr.zdd_join(&f, &g).unwrap();
        let expected = mgr
            .zdd_from_sets(&[vec![v(0), v(1)], vec![v(0), v(2)], vec![v(1)], vec![v(1), v(2)]])
            .unwrap();
        assert_eq!(j, expected);
        let m = mgr.zdd_meet(&f, &g).unwrap();
        assert_eq!(m, mgr.zdd_from_sets(&[vec![], vec![v(1)]]).unwrap());
    }

    #[test]
    fn test_universe_and_complement() {
        let mgr = Manager::new(0, 3, None);
        let u = mgr.zdd_universe().unwrap();
        assert_eq!(mgr.zdd_count(&u).unwrap(), BigUint::from(8u32));
        let f = mgr.zdd_from_sets(&[vec![v(0)], vec![]]).unwrap();
        let c = mgr.zdd_complement(&f).unwrap();
        assert_eq!(mgr.zdd_count(&c).unwrap(), BigUint::from(6u32));
        assert_eq!(mgr.zdd_complement(&c).unwrap(), f);
    }

    #[test]
    fn test_zdd_var_and_ite() {
        let mgr = Manager::new(0, 3, None);
        let x0 = mgr.zdd_var(v(0)).unwrap();
        let x1 = mgr.zdd_var(v(1)).unwrap();
        let x2 = mgr.zdd_var(v(2)).unwrap();
        assert_eq!(mgr.zdd_count(&x1).unwrap(), BigUint::from(4u32));
        let f = mgr.zdd_ite(&x0, &x1, &x2).unwrap();
        // x0 ? x1 : x2 holds on 4 of the 8 assignments.
        assert_eq!(mgr.zdd_count(&f).unwrap(), BigUint::from(4u32));
        assert!(mgr.zdd_contains(&f, &[v(0), v(1)]).unwrap());
        assert!(mgr.zdd_contains(&f, &[v(2)]).unwrap());
        assert!(!mgr.zdd_contains(&f, &[v(0), v(2)]).unwrap());
    }
}

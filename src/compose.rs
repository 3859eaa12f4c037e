//! Substitution and generalized cofactors of BDDs.

use std::collections::HashMap;

use log::trace;

use crate::cache::OpKey;
use crate::error::{DdError, DdResult};
use crate::gc::Pin;
use crate::handle::Bdd;
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::{BDD_ONE, BDD_ZERO};
use crate::types::{Kind, Space, Var};

const K: Kind = Kind::Bdd;

impl Core {
    /// `f[var := g]`
    pub(crate) fn bdd_compose(&self, f: Ref, var: Var, g: Ref) -> DdResult<Ref> {
        trace!("bdd_compose(f = {}, var = {}, g = {})", f, var, g);

        let level = self.var_level(Space::Bdd, var);
        let f_level = self.level(K, f);
        if f_level > level {
            // `f` does not depend on `var`
            return Ok(f);
        }

        let negate = f.is_negated();
        let f = f.regular();
        let key = OpKey::Compose(f, g, var);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res.negate_if(negate));
        }
        self.check_limits()?;

        let res = if f_level == level {
            let (high, low) = self.children(K, f);
            self.bdd_ite(g, high, low)?
        } else {
            let (top, top_var) = self.bdd_top(&[f, g]);
            let (f1, f0) = self.cofactors(K, f, top);
            let (g1, g0) = self.cofactors(K, g, top);
            let t = self.bdd_compose(f1, var, g1)?;
            let t = self.pin(K, t);
            let e = self.bdd_compose(f0, var, g0)?;
            let e = self.pin(K, e);
            self.unique(K, top_var, t.get(), e.get())?
        };

        self.cache_put(K, key, res);
        Ok(res.negate_if(negate))
    }

    /// Simultaneous substitution of `vector[v]` for every variable `v`.
    pub(crate) fn bdd_vector_compose(&self, f: Ref, vector: &[Ref]) -> DdResult<Ref> {
        let mut memo: HashMap<Ref, Pin<'_>> = HashMap::new();
        self.bdd_vector_compose_rec(f, vector, &mut memo)
    }

    fn bdd_vector_compose_rec<'a>(&'a self, f: Ref, vector: &[Ref], memo: &mut HashMap<Ref, Pin<'a>>) -> DdResult<Ref> {
        if self.is_terminal(K, f) {
            return Ok(f);
        }
        let negate = f.is_negated();
        let f = f.regular();
        if let Some(res) = memo.get(&f) {
            return Ok(res.get().negate_if(negate));
        }
        self.check_limits()?;

        let var = self.var_of(K, f);
        let (high, low) = self.children(K, f);
        let t = self.bdd_vector_compose_rec(high, vector, memo)?;
        let t = self.pin(K, t);
        let e = self.bdd_vector_compose_rec(low, vector, memo)?;
        let e = self.pin(K, e);
        let res = self.bdd_ite(vector[var.as_usize()], t.get(), e.get())?;

        memo.insert(f, self.pin(K, res));
        Ok(res.negate_if(negate))
    }

    /// Renames every variable `v` to `perm[v]`.
    pub(crate) fn bdd_permute(&self, f: Ref, perm: &[Var]) -> DdResult<Ref> {
        let mut pins = Vec::with_capacity(perm.len());
        for &v in perm {
            let r = self.bdd_var(v)?;
            pins.push(self.pin(K, r));
        }
        let vector: Vec<Ref> = pins.iter().map(|p| p.get()).collect();
        self.bdd_vector_compose(f, &vector)
    }

    /// Cofactor of `f` by a cube of literals.
    pub(crate) fn bdd_cofactor(&self, f: Ref, cube: Ref) -> DdResult<Ref> {
        if cube == BDD_ONE || self.is_terminal(K, f) {
            return Ok(f);
        }
        let f_level = self.level(K, f);
        let mut cube = cube;
        while cube != BDD_ONE && self.level(K, cube) < f_level {
            cube = self.cube_rest(cube);
        }
        if cube == BDD_ONE {
            return Ok(f);
        }

        let negate = f.is_negated();
        let f = f.regular();
        let key = OpKey::Cofactor(f, cube);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res.negate_if(negate));
        }
        self.check_limits()?;

        let (f1, f0) = self.children(K, f);
        let res = if self.level(K, cube) == f_level {
            let (c1, c0) = self.children(K, cube);
            if c0 == BDD_ZERO {
                self.bdd_cofactor(f1, c1)?
            } else {
                self.bdd_cofactor(f0, c0)?
            }
        } else {
            let var = self.var_of(K, f);
            let t = self.bdd_cofactor(f1, cube)?;
            let t = self.pin(K, t);
            let e = self.bdd_cofactor(f0, cube)?;
            let e = self.pin(K, e);
            self.unique(K, var, t.get(), e.get())?
        };

        self.cache_put(K, key, res);
        Ok(res.negate_if(negate))
    }

    /// The non-zero branch of a literal cube node.
    fn cube_rest(&self, cube: Ref) -> Ref {
        let (high, low) = self.children(K, cube);
        if low == BDD_ZERO {
            high
        } else {
            low
        }
    }

    /// Generalized cofactor `f ↓ c` (constrain).
    pub(crate) fn bdd_constrain(&self, f: Ref, c: Ref) -> DdResult<Ref> {
        trace!("bdd_constrain(f = {}, c = {})", f, c);

        if c == BDD_ONE || self.is_terminal(K, f) {
            return Ok(f);
        }
        if f == c {
            return Ok(BDD_ONE);
        }
        if f == -c {
            return Ok(BDD_ZERO);
        }

        let negate = f.is_negated();
        let f = f.regular();
        let key = OpKey::Constrain(f, c);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res.negate_if(negate));
        }
        self.check_limits()?;

        let (top, var) = self.bdd_top(&[f, c]);
        let (f1, f0) = self.cofactors(K, f, top);
        let (c1, c0) = self.cofactors(K, c, top);
        let res = if c1 == BDD_ZERO {
            self.bdd_constrain(f0, c0)?
        } else if c0 == BDD_ZERO {
            self.bdd_constrain(f1, c1)?
        } else {
            let t = self.bdd_constrain(f1, c1)?;
            let t = self.pin(K, t);
            let e = self.bdd_constrain(f0, c0)?;
            let e = self.pin(K, e);
            self.unique(K, var, t.get(), e.get())?
        };

        self.cache_put(K, key, res);
        Ok(res.negate_if(negate))
    }

    /// Coudert-Madre restrict: simplifies `f` using the care set `c`,
    /// never introducing variables of `c` that `f` does not depend on.
    pub(crate) fn bdd_restrict(&self, f: Ref, c: Ref) -> DdResult<Ref> {
        trace!("bdd_restrict(f = {}, c = {})", f, c);

        if c == BDD_ONE || self.is_terminal(K, f) {
            return Ok(f);
        }
        if f == c {
            return Ok(BDD_ONE);
        }
        if f == -c {
            return Ok(BDD_ZERO);
        }

        let negate = f.is_negated();
        let f = f.regular();
        let key = OpKey::Restrict(f, c);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res.negate_if(negate));
        }
        self.check_limits()?;

        let f_level = self.level(K, f);
        let res = if self.level(K, c) < f_level {
            // Abstract the care-set variable `f` does not mention.
            let (c1, c0) = self.children(K, c);
            let c = self.bdd_or(c1, c0)?;
            let c = self.pin(K, c);
            self.bdd_restrict(f, c.get())?
        } else {
            let var = self.var_of(K, f);
            let (f1, f0) = self.children(K, f);
            let (c1, c0) = self.cofactors(K, c, f_level);
            if c1 == BDD_ZERO {
                self.bdd_restrict(f0, c0)?
            } else if c0 == BDD_ZERO {
                self.bdd_restrict(f1, c1)?
            } else {
                let t = self.bdd_restrict(f1, c1)?;
                let t = self.pin(K, t);
                let e = self.bdd_restrict(f0, c0)?;
                let e = self.pin(K, e);
                self.unique(K, var, t.get(), e.get())?
            }
        };

        self.cache_put(K, key, res);
        Ok(res.negate_if(negate))
    }
}

/// Checks that `vars` are distinct and in range.
pub(crate) fn check_distinct(core: &Core, space: Space, vars: &[Var]) -> DdResult<()> {
    let mut seen = vec![false; core.num_vars(space)];
    for &v in vars {
        match seen.get_mut(v.as_usize()) {
            None => return Err(DdError::invalid(format!("variable {} does not exist", v))),
            Some(true) => return Err(DdError::invalid(format!("variable {} is listed twice", v))),
            Some(s) => *s = true,
        }
    }
    Ok(())
}

/// The permutation that exchanges `xs[i]` with `ys[i]`.
pub(crate) fn swap_permutation(core: &Core, space: Space, xs: &[Var], ys: &[Var]) -> DdResult<Vec<Var>> {
    if xs.len() != ys.len() {
        return Err(DdError::invalid(format!(
            "cannot swap {} variables with {}",
            xs.len(),
            ys.len()
        )));
    }
    let all: Vec<Var> = xs.iter().chain(ys).copied().collect();
    check_distinct(core, space, &all)?;
    let mut perm: Vec<Var> = (0..core.num_vars(space) as u32).map(Var::new).collect();
    for (&x, &y) in xs.iter().zip(ys) {
        perm[x.as_usize()] = y;
        perm[y.as_usize()] = x;
    }
    Ok(perm)
}

impl Manager {
    /// Substitutes `g` for `var` in `f`.
    pub fn compose(&self, f: &Bdd, var: Var, g: &Bdd) -> DdResult<Bdd> {
        let f = self.check(f)?;
        let g = self.check(g)?;
        self.core.check_var(Space::Bdd, var)?;
        self.run(|core| core.bdd_compose(f, var, g))
    }

    /// Substitutes `vector[v]` for every variable `v` simultaneously.
    ///
    /// The vector must have one entry per variable.
    pub fn vector_compose(&self, f: &Bdd, vector: &[Bdd]) -> DdResult<Bdd> {
        let f = self.check(f)?;
        if vector.len() != self.num_vars() {
            return Err(DdError::invalid(format!(
                "composition vector has {} entries for {} variables",
                vector.len(),
                self.num_vars()
            )));
        }
        let vector = vector.iter().map(|g| self.check(g)).collect::<DdResult<Vec<_>>>()?;
        self.run(|core| core.bdd_vector_compose(f, &vector))
    }

    /// Renames every variable `v` to `perm[v]`. `perm` must be a permutation.
    pub fn permute(&self, f: &Bdd, perm: &[Var]) -> DdResult<Bdd> {
        let f = self.check(f)?;
        if perm.len() != self.num_vars() {
            return Err(DdError::invalid(format!(
                "permutation has {} entries for {} variables",
                perm.len(),
                self.num_vars()
            )));
        }
        check_distinct(&self.core, Space::Bdd, perm)?;
        self.run(|core| core.bdd_permute(f, perm))
    }

    /// Exchanges `xs[i]` and `ys[i]` for every `i`, simultaneously.
    pub fn swap_variables(&self, f: &Bdd, xs: &[Var], ys: &[Var]) -> DdResult<Bdd> {
        let f = self.check(f)?;
        let perm = swap_permutation(&self.core, Space::Bdd, xs, ys)?;
        self.run(|core| core.bdd_permute(f, &perm))
    }

    /// Cofactor of `f` with respect to a cube of literals.
    pub fn cofactor(&self, f: &Bdd, cube: &Bdd) -> DdResult<Bdd> {
        let f = self.check(f)?;
        let cube = self.check(cube)?;
        self.run(|core| {
            if core.bdd_cube_literals(cube).is_none() {
                return Err(DdError::invalid("cofactor expects a cube of literals"));
            }
            core.bdd_cofactor(f, cube)
        })
    }

    /// Generalized cofactor: agrees with `f` wherever `c` holds.
    pub fn constrain(&self, f: &Bdd, c: &Bdd) -> DdResult<Bdd> {
        let f = self.check(f)?;
        let c = self.check(c)?;
        if c == BDD_ZERO {
            return Err(DdError::invalid("care set is empty"));
        }
        self.run(|core| core.bdd_constrain(f, c))
    }

    /// Like [`Manager::constrain`], but never adds variables outside the support of `f`.
    pub fn restrict(&self, f: &Bdd, c: &Bdd) -> DdResult<Bdd> {
        let f = self.check(f)?;
        let c = self.check(c)?;
        if c == BDD_ZERO {
            return Err(DdError::invalid("care set is empty"));
        }
        self.run(|core| core.bdd_restrict(f, c))
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

    #[test]
    fn test_compose() {
        let (mgr, x) = setup(4);
        let f = mgr.and(&x[0], &x[1]).unwrap();
        let g = mgr.or(&x[2], &x[3]).unwrap();
        let h = mgr.compose(&f, Var::new(1), &g).unwrap();
        assert_eq!(h, mgr.and(&x[0], &g).unwrap());

        // Substituting a variable above the top one.
        let h = mgr.compose(&x[3], Var::new(3), &x[0]).unwrap();
        assert_eq!(h, x[0]);
        let h = mgr.compose(&!&f, Var::new(0), &mgr.one()).unwrap();
        assert_eq!(h, !&x[1]);
    }

    #[test]
    fn test_vector_compose() {
        let (mgr, x) = setup(3);
        let f = mgr.ite(&x[0], &x[1], &x[2]).unwrap();
        let vector = vec![!&x[0], x[2].clone(), x[1].clone()];
        let g = mgr.vector_compose(&f, &vector).unwrap();
        assert_eq!(g, mgr.ite(&!&x[0], &x[2], &x[1]).unwrap());
        assert!(mgr.vector_compose(&f, &vector[..2]).is_err());
    }

    #[test]
    fn test_permute_and_swap() {
        let (mgr, x) = setup(4);
        let f = mgr.and(&x[0], &!&x[3]).unwrap();
        let perm = [Var::new(3), Var::new(1), Var::new(2), Var::new(0)];
        let g = mgr.permute(&f, &perm).unwrap();
        assert_eq!(g, mgr.and(&x[3], &!&x[0]).unwrap());
        let h = mgr.swap_variables(&f, &[Var::new(0)], &[Var::new(3)]).unwrap();
        assert_eq!(g, h);

        let bad = [Var::new(0), Var::new(0), Var::new(2), Var::new(3)];
        assert!(mgr.permute(&f, &bad).is_err());
        assert!(mgr.swap_variables(&f, &[Var::new(0)], &[Var::new(0)]).is_err());
        assert!(mgr.swap_variables(&f, &[Var::new(0)], &[]).is_err());
    }

    #[test]
    fn test_cofactor_by_cube() {
        let (mgr, x) = setup(3);
        let f = mgr.ite(&x[0], &x[1], &x[2]).unwrap();
        let c = mgr.cube(&[Var::new(0).pos(), Var::new(2).neg()]).unwrap();
        assert_eq!(mgr.cofactor(&f, &c).unwrap(), x[1]);
        let c = mgr.cube(&[Var::new(1).neg()]).unwrap();
        assert_eq!(mgr.cofactor(&f, &c).unwrap(), mgr.and(&!&x[0], &x[2]).unwrap());
        assert!(mgr.cofactor(&f, &mgr.or(&x[0], &x[1]).unwrap()).is_err());
    }

    #[test]
    fn test_constrain_and_restrict_agree_on_care_set() {
        let (mgr, x) = setup(4);
        let f = mgr.or(&mgr.and(&x[0], &x[1]).unwrap(), &mgr.and(&x[2], &x[3]).unwrap()).unwrap();
        let c = mgr.and(&x[0], &x[2]).unwrap();
        for g in [mgr.constrain(&f, &c).unwrap(), mgr.restrict(&f, &c).unwrap()] {
            let lhs = mgr.and(&g, &c).unwrap();
            let rhs = mgr.and(&f, &c).unwrap();
            assert_eq!(lhs, rhs);
        }
        assert_eq!(mgr.constrain(&f, &c).unwrap(), mgr.or(&x[1], &x[3]).unwrap());
    }

    #[test]
    fn test_restrict_does_not_add_support() {
        let (mgr, x) = setup(3);
        let f = x[1].clone();
        let c = mgr.xor(&x[0], &x[1]).unwrap();
        let g = mgr.restrict(&f, &c).unwrap();
        assert!(g.support().iter().all(|v| *v == Var::new(1)));
    }

    #[test]
    fn test_empty_care_set_is_rejected() {
        let (mgr, x) = setup(1);
        assert!(matches!(mgr.constrain(&x[0], &mgr.zero()), Err(DdError::InvalidArgument(_))));
        assert!(matches!(mgr.restrict(&x[0], &mgr.zero()), Err(DdError::InvalidArgument(_))));
    }
}

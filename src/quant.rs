//! Quantification over BDD variables.
//!
//! Quantified variables are given as a cube of positive literals. Cube
//! variables above the current top level are skipped as the recursion
//! descends, so the cube can mention variables `f` does not depend on.

use log::trace;

use crate::cache::OpKey;
use crate::error::DdResult;
use crate::handle::Bdd;
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::{BDD_ONE, BDD_ZERO};
use crate::types::{Kind, Level, Var};

const K: Kind = Kind::Bdd;

impl Core {
    /// Drops the cube variables above `level`.
    fn skip_cube(&self, mut cube: Ref, level: Level) -> Ref {
        while cube != BDD_ONE && self.level(K, cube) < level {
            cube = self.children(K, cube).0;
        }
        cube
    }

    /// `∃ cube. f`
    pub(crate) fn bdd_exists(&self, f: Ref, cube: Ref) -> DdResult<Ref> {
        trace!("bdd_exists(f = {}, cube = {})", f, cube);

        if cube == BDD_ONE || self.is_terminal(K, f) {
            return Ok(f);
        }
        let top = self.level(K, f);
        let cube = self.skip_cube(cube, top);
        if cube == BDD_ONE {
            return Ok(f);
        }

        let key = OpKey::Exists(f, cube);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let var = self.var_of(K, f);
        let (f1, f0) = self.children(K, f);
        let res = if self.level(K, cube) == top {
            let next = self.children(K, cube).0;
            let t = self.bdd_exists(f1, next)?;
            if t == BDD_ONE {
                self.cache_put(K, key, BDD_ONE);
                return Ok(BDD_ONE);
            }
            let t = self.pin(K, t);
            let e = self.bdd_exists(f0, next)?;
            let e = self.pin(K, e);
            self.bdd_or(t.get(), e.get())?
        } else {
            let t = self.bdd_exists(f1, cube)?;
            let t = self.pin(K, t);
            let e = self.bdd_exists(f0, cube)?;
            let e = self.pin(K, e);
            self.unique(K, var, t.get(), e.get())?
        };

        self.cache_put(K, key, res);
        Ok(res)
    }

    /// `∀ cube. f = ¬∃ cube. ¬f`
    pub(crate) fn bdd_forall(&self, f: Ref, cube: Ref) -> DdResult<Ref> {
        Ok(-self.bdd_exists(-f, cube)?)
    }

    /// `∃ cube. (f ∧ g)` without building the conjunction.
    pub(crate) fn bdd_and_exists(&self, f: Ref, g: Ref, cube: Ref) -> DdResult<Ref> {
        trace!("bdd_and_exists(f = {}, g = {}, cube = {})", f, g, cube);

        if f == BDD_ZERO || g == BDD_ZERO || f == -g {
            return Ok(BDD_ZERO);
        }
        if f == BDD_ONE && g == BDD_ONE {
            return Ok(BDD_ONE);
        }
        if cube == BDD_ONE {
            return self.bdd_and(f, g);
        }
        if f == BDD_ONE || f == g {
            return self.bdd_exists(g, cube);
        }
        if g == BDD_ONE {
            return self.bdd_exists(f, cube);
        }

        let (f, g) = if f <= g { (f, g) } else { (g, f) };
        let top = self.level(K, f).min(self.level(K, g));
        let cube = self.skip_cube(cube, top);
        if cube == BDD_ONE {
            return self.bdd_and(f, g);
        }

        let key = OpKey::AndExists(f, g, cube);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let (_, var) = self.bdd_top(&[f, g]);
        let (f1, f0) = self.cofactors(K, f, top);
        let (g1, g0) = self.cofactors(K, g, top);
        let res = if self.level(K, cube) == top {
            let next = self.children(K, cube).0;
            let t = self.bdd_and_exists(f1, g1, next)?;
            if t == BDD_ONE {
                self.cache_put(K, key, BDD_ONE);
                return Ok(BDD_ONE);
            }
            let t = self.pin(K, t);
            let e = self.bdd_and_exists(f0, g0, next)?;
            if t.get() == e || e == BDD_ZERO {
                t.get()
            } else {
                let e = self.pin(K, e);
                self.bdd_or(t.get(), e.get())?
            }
        } else {
            let t = self.bdd_and_exists(f1, g1, cube)?;
            let t = self.pin(K, t);
            let e = self.bdd_and_exists(f0, g0, cube)?;
            let e = self.pin(K, e);
            self.unique(K, var, t.get(), e.get())?
        };

        self.cache_put(K, key, res);
        Ok(res)
    }

    /// `f|x=1 ⊕ f|x=0`
    pub(crate) fn bdd_boolean_diff(&self, f: Ref, var: Var) -> DdResult<Ref> {
        let f1 = self.bdd_cofactor_var(f, var, true)?;
        let f1 = self.pin(K, f1);
        let f0 = self.bdd_cofactor_var(f, var, false)?;
        let f0 = self.pin(K, f0);
        self.bdd_xor(f1.get(), f0.get())
    }
}

impl Manager {
    fn quantifier(&self, f: &Bdd, cube: &Bdd, op: fn(&Core, Ref, Ref) -> DdResult<Ref>) -> DdResult<Bdd> {
        let f = self.check(f)?;
        let cube = self.check(cube)?;
        self.run(|core| {
            core.bdd_positive_cube_vars(cube)?;
            op(core, f, cube)
        })
    }

    /// Existential abstraction of the variables of `cube`.
    pub fn exists(&self, f: &Bdd, cube: &Bdd) -> DdResult<Bdd> {
        self.quantifier(f, cube, Core::bdd_exists)
    }

    /// Universal abstraction of the variables of `cube`.
    pub fn forall(&self, f: &Bdd, cube: &Bdd) -> DdResult<Bdd> {
        self.quantifier(f, cube, Core::bdd_forall)
    }

    /// Relational product `∃ cube. (f ∧ g)`.
    pub fn and_exists(&self, f: &Bdd, g: &Bdd, cube: &Bdd) -> DdResult<Bdd> {
        let f = self.check(f)?;
        let g = self.check(g)?;
        let cube = self.check(cube)?;
        self.run(|core| {
            core.bdd_positive_cube_vars(cube)?;
            core.bdd_and_exists(f, g, cube)
        })
    }

    /// Boolean difference of `f` with respect to `var`.
    pub fn boolean_diff(&self, f: &Bdd, var: Var) -> DdResult<Bdd> {
        let f = self.check(f)?;
        self.core.check_var(crate::types::Space::Bdd, var)?;
        self.run(|core| core.bdd_boolean_diff(f, var))
    }
}

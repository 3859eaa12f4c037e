//! Conversions between BDDs and ZDDs.
//!
//! BDD variable `i` corresponds to ZDD variable `i`. A conversion is given a
//! positive cube naming the variables the ZDD family ranges over: a BDD `f`
//! becomes the family of sets `S ⊆ cube` whose characteristic assignment
//! satisfies `f`, and a family becomes the function true exactly on the
//! characteristic assignments of its sets. Both recursions walk the cube in
//! ZDD order and build the BDD side through cofactors and `ite`, so the two
//! spaces do not need to be ordered alike.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::error::{DdError, DdResult};
use crate::handle::{reachable, Bdd, Zdd};
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::{BDD_ONE, BDD_ZERO, ZDD_BASE, ZDD_EMPTY};
use crate::types::{Kind, Space, Var};

impl Core {
    fn support_of(&self, kind: Kind, r: Ref) -> HashSet<Var> {
        let ids = reachable(self, kind, [r]);
        let table = self.forest(kind).table.borrow();
        ids.into_iter()
            .map(|id| table.node(id).var)
            .filter(|v| !v.is_terminal())
            .collect()
    }

    /// Cube variables sorted by ZDD level. Missing ZDD variables are created
    /// only once the cube and `f`'s support have been validated.
    fn conversion_vars(&self, kind: Kind, f: Ref, cube: Ref) -> DdResult<Vec<Var>> {
        let mut vars = self.bdd_positive_cube_vars(cube)?;
        let allowed: HashSet<Var> = vars.iter().copied().collect();
        if let Some(v) = self.support_of(kind, f).into_iter().find(|v| !allowed.contains(v)) {
            return Err(DdError::invalid(format!("variable {} is outside the conversion cube", v)));
        }
        if let Some(&max) = vars.iter().max() {
            self.ensure_var(Space::Zdd, max)?;
        }
        vars.sort_by_key(|&v| self.var_level(Space::Zdd, v));
        Ok(vars)
    }

    pub(crate) fn bdd_to_zdd(&self, f: Ref, cube: Ref) -> DdResult<Ref> {
        fn go<'a>(core: &'a Core, f: Ref, vars: &[Var], k: usize, memo: &mut HashMap<(Ref, usize), crate::gc::Pin<'a>>) -> DdResult<Ref> {
            trace!("bdd_to_zdd(f = {}, k = {})", f, k);
            if f == BDD_ZERO {
                return Ok(ZDD_EMPTY);
            }
            if k == vars.len() {
                return Ok(if f == BDD_ONE { ZDD_BASE } else { ZDD_EMPTY });
            }
            if let Some(p) = memo.get(&(f, k)) {
                return Ok(p.get());
            }
            core.check_limits()?;

            let var = vars[k];
            let f1 = core.bdd_cofactor_var(f, var, true)?;
            let f1 = core.pin(Kind::Bdd, f1);
            let f0 = core.bdd_cofactor_var(f, var, false)?;
            let f0 = core.pin(Kind::Bdd, f0);
            let t = go(core, f1.get(), vars, k + 1, memo)?;
            let t = core.pin(Kind::Zdd, t);
            let e = go(core, f0.get(), vars, k + 1, memo)?;
            let e = core.pin(Kind::Zdd, e);
            let res = core.unique(Kind::Zdd, var, t.get(), e.get())?;
            memo.insert((f, k), core.pin(Kind::Zdd, res));
            Ok(res)
        }

        let vars = self.conversion_vars(Kind::Bdd, f, cube)?;
        go(self, f, &vars, 0, &mut HashMap::new())
    }

    pub(crate) fn zdd_to_bdd(&self, z: Ref, cube: Ref) -> DdResult<Ref> {
        fn go<'a>(core: &'a Core, z: Ref, vars: &[Var], k: usize, memo: &mut HashMap<(Ref, usize), crate::gc::Pin<'a>>) -> DdResult<Ref> {
            trace!("zdd_to_bdd(z = {}, k = {})", z, k);
            if z == ZDD_EMPTY {
                return Ok(BDD_ZERO);
            }
            if k == vars.len() {
                return Ok(if z == ZDD_BASE { BDD_ONE } else { BDD_ZERO });
            }
            if let Some(p) = memo.get(&(z, k)) {
                return Ok(p.get());
            }
            core.check_limits()?;

            let var = vars[k];
            let (z1, z0) = core.cofactors(Kind::Zdd, z, core.var_level(Space::Zdd, var));
            let t = go(core, z1, vars, k + 1, memo)?;
            let t = core.pin(Kind::Bdd, t);
            let e = go(core, z0, vars, k + 1, memo)?;
            let e = core.pin(Kind::Bdd, e);
            let x = core.bdd_var(var)?;
            let x = core.pin(Kind::Bdd, x);
            let res = core.bdd_ite(x.get(), t.get(), e.get())?;
            memo.insert((z, k), core.pin(Kind::Bdd, res));
            Ok(res)
        }

        let vars = self.conversion_vars(Kind::Zdd, z, cube)?;
        for &v in &vars {
            self.ensure_var(Space::Bdd, v)?;
        }
        go(self, z, &vars, 0, &mut HashMap::new())
    }

    pub(crate) fn zdd_vars_from_bdd_vars(&self, multiplicity: usize) -> DdResult<()> {
        if multiplicity == 0 {
            return Err(DdError::invalid("multiplicity must be positive"));
        }
        let n = self.num_vars(Space::Bdd);
        let needed = n.saturating_mul(multiplicity);
        if needed > 0 {
            let last = u32::try_from(needed - 1).unwrap_or(u32::MAX);
            self.ensure_var(Space::Zdd, Var::new(last))?;
        }
        debug!("{} ZDD variables for {} BDD variables", needed, n);
        self.zdd_multiplicity.set(Some(multiplicity));
        self.zdd_realign()
    }
}

impl Manager {
    /// The family of subsets of `cube`'s variables whose characteristic
    /// assignment satisfies `f`.
    ///
    /// ```
    /// use dd_rs::manager::Manager;
    /// use dd_rs::types::Var;
    ///
    /// let mgr = Manager::new(2, 0, None);
    /// let f = mgr.or(&mgr.var(0).unwrap(), &mgr.var(1).unwrap()).unwrap();
    /// let cube = mgr.cube_of_vars(&[Var::new(0), Var::new(1)]).unwrap();
    /// let z = mgr.bdd_to_zdd(&f, &cube).unwrap();
    /// assert_eq!(mgr.zdd_count(&z).unwrap(), 3u32.into());
    /// ```
    pub fn bdd_to_zdd(&self, f: &Bdd, cube: &Bdd) -> DdResult<Zdd> {
        let f = self.check(f)?;
        let cube = self.check(cube)?;
        self.run(|core| core.bdd_to_zdd(f, cube))
    }

    /// The characteristic function of a family over `cube`'s variables.
    pub fn zdd_to_bdd(&self, z: &Zdd, cube: &Bdd) -> DdResult<Bdd> {
        let z = self.check(z)?;
        let cube = self.check(cube)?;
        self.run(|core| core.zdd_to_bdd(z, cube))
    }

    /// Creates `multiplicity` ZDD variables per BDD variable, ZDD variables
    /// `i * multiplicity ..` standing for BDD variable `i`, and orders them
    /// like the BDD variables.
    pub fn zdd_vars_from_bdd_vars(&self, multiplicity: usize) -> DdResult<()> {
        let _guard = self.core.enter()?;
        self.core.zdd_vars_from_bdd_vars(multiplicity)
    }
}

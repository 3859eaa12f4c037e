//! Boolean connectives on BDDs with complement edges.
//!
//! Every recursion follows the same scheme: resolve terminal cases, look up
//! the operation cache, split on the operand with the topmost level, pin
//! the cofactor results and canonicalize `(var, high, low)`.

use log::trace;

use crate::cache::OpKey;
use crate::error::{DdError, DdResult};
use crate::handle::Bdd;
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::{BDD_ONE, BDD_ZERO};
use crate::types::{Kind, Level, Lit, Space, Var};

const K: Kind = Kind::Bdd;

impl Core {
    pub(crate) fn bdd_var(&self, var: Var) -> DdResult<Ref> {
        self.unique(K, var, BDD_ONE, BDD_ZERO)
    }

    /// Topmost level among `refs` and the variable living there.
    #[inline]
    pub(crate) fn bdd_top(&self, refs: &[Ref]) -> (Level, Var) {
        let top = refs.iter().map(|&r| self.level(K, r)).min().unwrap_or(Level::TERMINAL);
        (top, self.var_at(Space::Bdd, top))
    }

    /// `ite(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)`
    pub(crate) fn bdd_ite(&self, f: Ref, g: Ref, h: Ref) -> DdResult<Ref> {
        trace!("bdd_ite(f = {}, g = {}, h = {})", f, g, h);

        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if f == BDD_ONE {
            return Ok(g);
        }
        if f == BDD_ZERO {
            return Ok(h);
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        let g = if g == f {
            BDD_ONE
        } else if g == -f {
            BDD_ZERO
        } else {
            g
        };
        let h = if h == f {
            BDD_ZERO
        } else if h == -f {
            BDD_ONE
        } else {
            h
        };

        // More base cases:
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if g == h {
            return Ok(g);
        }
        if g == BDD_ONE && h == BDD_ZERO {
            return Ok(f);
        }
        if g == BDD_ZERO && h == BDD_ONE {
            return Ok(-f);
        }

        // Equivalent pairs are two-operand functions, and the dedicated
        // recursions below normalize operand order themselves:
        //   ite(F,G,0) = F ∧ G
        //   ite(F,1,H) = ~(~F ∧ ~H)
        //   ite(F,0,H) = ~F ∧ H
        //   ite(F,G,1) = ~(F ∧ ~G)
        //   ite(F,~H,H) = F ⊕ H
        if h == BDD_ZERO {
            return self.bdd_and(f, g);
        }
        if g == BDD_ONE {
            return Ok(-self.bdd_and(-f, -h)?);
        }
        if g == BDD_ZERO {
            return self.bdd_and(-f, h);
        }
        if h == BDD_ONE {
            return Ok(-self.bdd_and(f, -g)?);
        }
        if g == -h {
            return self.bdd_xor(f, h);
        }

        // ite(~F,G,H) => ite(F,H,G)
        let (f, g, h) = if f.is_negated() { (-f, h, g) } else { (f, g, h) };
        // ite(F,~G,H) => ~ite(F,G,~H)
        let (g, h, negate) = if g.is_negated() { (-g, -h, true) } else { (g, h, false) };

        let key = OpKey::Ite(f, g, h);
        if let Some(res) = self.cache_get(K, &key) {
            trace!("cache: bdd_ite(f = {}, g = {}, h = {}) -> {}", f, g, h, res);
            return Ok(res.negate_if(negate));
        }
        self.check_limits()?;

        let (top, var) = self.bdd_top(&[f, g, h]);
        let (f1, f0) = self.cofactors(K, f, top);
        let (g1, g0) = self.cofactors(K, g, top);
        let (h1, h0) = self.cofactors(K, h, top);

        let t = self.bdd_ite(f1, g1, h1)?;
        let t = self.pin(K, t);
        let e = self.bdd_ite(f0, g0, h0)?;
        let e = self.pin(K, e);
        let res = self.unique(K, var, t.get(), e.get())?;
        trace!("computed: bdd_ite(f = {}, g = {}, h = {}) -> {}", f, g, h, res);

        self.cache_put(K, key, res);
        Ok(res.negate_if(negate))
    }

    pub(crate) fn bdd_and(&self, f: Ref, g: Ref) -> DdResult<Ref> {
        trace!("bdd_and(f = {}, g = {})", f, g);

        if f == BDD_ZERO || g == BDD_ZERO || f == -g {
            return Ok(BDD_ZERO);
        }
        if f == BDD_ONE {
            return Ok(g);
        }
        if g == BDD_ONE || f == g {
            return Ok(f);
        }

        let (f, g) = if f <= g { (f, g) } else { (g, f) };
        let key = OpKey::And(f, g);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let (top, var) = self.bdd_top(&[f, g]);
        let (f1, f0) = self.cofactors(K, f, top);
        let (g1, g0) = self.cofactors(K, g, top);

        let t = self.bdd_and(f1, g1)?;
        let t = self.pin(K, t);
        let e = self.bdd_and(f0, g0)?;
        let e = self.pin(K, e);
        let res = self.unique(K, var, t.get(), e.get())?;

        self.cache_put(K, key, res);
        Ok(res)
    }

    pub(crate) fn bdd_or(&self, f: Ref, g: Ref) -> DdResult<Ref> {
        Ok(-self.bdd_and(-f, -g)?)
    }

    pub(crate) fn bdd_xor(&self, f: Ref, g: Ref) -> DdResult<Ref> {
        trace!("bdd_xor(f = {}, g = {})", f, g);

        if f == g {
            return Ok(BDD_ZERO);
        }
        if f == -g {
            return Ok(BDD_ONE);
        }
        if f == BDD_ZERO {
            return Ok(g);
        }
        if g == BDD_ZERO {
            return Ok(f);
        }
        if f == BDD_ONE {
            return Ok(-g);
        }
        if g == BDD_ONE {
            return Ok(-f);
        }

        // ~F ⊕ G = ~(F ⊕ G)
        let negate = f.is_negated() != g.is_negated();
        let (f, g) = (f.regular(), g.regular());
        let (f, g) = if f <= g { (f, g) } else { (g, f) };

        let key = OpKey::Xor(f, g);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res.negate_if(negate));
        }
        self.check_limits()?;

        let (top, var) = self.bdd_top(&[f, g]);
        let (f1, f0) = self.cofactors(K, f, top);
        let (g1, g0) = self.cofactors(K, g, top);

        let t = self.bdd_xor(f1, g1)?;
        let t = self.pin(K, t);
        let e = self.bdd_xor(f0, g0)?;
        let e = self.pin(K, e);
        let res = self.unique(K, var, t.get(), e.get())?;

        self.cache_put(K, key, res);
        Ok(res.negate_if(negate))
    }

    /// Whether `f → g` is a tautology. Builds no nodes.
    pub(crate) fn bdd_leq(&self, f: Ref, g: Ref) -> DdResult<bool> {
        if f == g || f == BDD_ZERO || g == BDD_ONE {
            return Ok(true);
        }
        if f == BDD_ONE || g == BDD_ZERO || f == -g {
            return Ok(false);
        }

        let key = OpKey::Leq(f, g);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res == BDD_ONE);
        }
        self.check_limits()?;

        let (top, _) = self.bdd_top(&[f, g]);
        let (f1, f0) = self.cofactors(K, f, top);
        let (g1, g0) = self.cofactors(K, g, top);
        let res = self.bdd_leq(f1, g1)? && self.bdd_leq(f0, g0)?;

        self.cache_put(K, key, if res { BDD_ONE } else { BDD_ZERO });
        Ok(res)
    }

    /// Positive or negative cofactor of `f` with respect to one variable.
    pub(crate) fn bdd_cofactor_var(&self, f: Ref, var: Var, value: bool) -> DdResult<Ref> {
        let level = self.var_level(Space::Bdd, var);
        let f_level = self.level(K, f);
        if f_level > level {
            return Ok(f);
        }
        if f_level == level {
            let (high, low) = self.children(K, f);
            return Ok(if value { high } else { low });
        }

        // Cofactoring commutes with negation.
        let negate = f.is_negated();
        let f = f.regular();
        let key = OpKey::CofactorVar(f, var, value);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res.negate_if(negate));
        }
        self.check_limits()?;

        let top_var = self.var_of(K, f);
        let (high, low) = self.children(K, f);
        let t = self.bdd_cofactor_var(high, var, value)?;
        let t = self.pin(K, t);
        let e = self.bdd_cofactor_var(low, var, value)?;
        let e = self.pin(K, e);
        let res = self.unique(K, top_var, t.get(), e.get())?;

        self.cache_put(K, key, res);
        Ok(res.negate_if(negate))
    }

    /// Builds the conjunction of `lits`. Variables must be distinct.
    pub(crate) fn bdd_cube(&self, lits: &[Lit]) -> DdResult<Ref> {
        let mut lits = lits.to_vec();
        for lit in &lits {
            self.check_var(Space::Bdd, lit.var())?;
        }
        lits.sort_by_key(|lit| std::cmp::Reverse(self.var_level(Space::Bdd, lit.var())));
        if lits.windows(2).any(|w| w[0].var() == w[1].var()) {
            return Err(DdError::invalid("cube mentions a variable twice"));
        }

        // Build bottom-up so every node is created once.
        let mut acc = self.pin(K, BDD_ONE);
        for lit in lits {
            let r = if lit.is_positive() {
                self.unique(K, lit.var(), acc.get(), BDD_ZERO)?
            } else {
                self.unique(K, lit.var(), BDD_ZERO, acc.get())?
            };
            acc = self.pin(K, r);
        }
        Ok(acc.get())
    }

    /// Literals of a cube, top-down, or `None` if `f` is not a cube.
    pub(crate) fn bdd_cube_literals(&self, f: Ref) -> Option<Vec<Lit>> {
        if f == BDD_ZERO {
            return None;
        }
        let mut lits = Vec::new();
        let mut cur = f;
        while cur != BDD_ONE {
            let var = self.var_of(K, cur);
            let (high, low) = self.children(K, cur);
            if low == BDD_ZERO {
                lits.push(var.pos());
                cur = high;
            } else if high == BDD_ZERO {
                lits.push(var.neg());
                cur = low;
            } else {
                return None;
            }
        }
        Some(lits)
    }

    /// Checks that `cube` is a conjunction of positive literals and returns its variables.
    pub(crate) fn bdd_positive_cube_vars(&self, cube: Ref) -> DdResult<Vec<Var>> {
        let lits = self
            .bdd_cube_literals(cube)
            .ok_or_else(|| DdError::invalid("expected a cube of variables"))?;
        if lits.iter().any(|lit| lit.is_negative()) {
            return Err(DdError::invalid("expected a cube of positive literals"));
        }
        Ok(lits.into_iter().map(|lit| lit.var()).collect())
    }

    pub(crate) fn bdd_fold(&self, init: Ref, items: &[Ref], op: fn(&Core, Ref, Ref) -> DdResult<Ref>) -> DdResult<Ref> {
        let mut acc = self.pin(K, init);
        for &item in items {
            let r = op(self, acc.get(), item)?;
            acc = self.pin(K, r);
        }
        Ok(acc.get())
    }
}

impl Manager {
    /// The constant `true`.
    pub fn one(&self) -> Bdd {
        self.bdd(BDD_ONE)
    }

    /// The constant `false`.
    pub fn zero(&self) -> Bdd {
        self.bdd(BDD_ZERO)
    }

    pub fn constant(&self, value: bool) -> Bdd {
        if value {
            self.one()
        } else {
            self.zero()
        }
    }

    fn bdd_binary(&self, f: &Bdd, g: &Bdd, op: fn(&Core, Ref, Ref) -> DdResult<Ref>) -> DdResult<Bdd> {
        let f = self.check(f)?;
        let g = self.check(g)?;
        self.run(|core| op(core, f, g))
    }

    pub fn not(&self, f: &Bdd) -> DdResult<Bdd> {
        let f = self.check(f)?;
        self.run(|_| Ok(-f))
    }

    pub fn and(&self, f: &Bdd, g: &Bdd) -> DdResult<Bdd> {
        self.bdd_binary(f, g, Core::bdd_and)
    }

    pub fn or(&self, f: &Bdd, g: &Bdd) -> DdResult<Bdd> {
        self.bdd_binary(f, g, Core::bdd_or)
    }

    pub fn xor(&self, f: &Bdd, g: &Bdd) -> DdResult<Bdd> {
        self.bdd_binary(f, g, Core::bdd_xor)
    }

    pub fn nand(&self, f: &Bdd, g: &Bdd) -> DdResult<Bdd> {
        self.bdd_binary(f, g, |core, f, g| Ok(-core.bdd_and(f, g)?))
    }

    pub fn nor(&self, f: &Bdd, g: &Bdd) -> DdResult<Bdd> {
        self.bdd_binary(f, g, |core, f, g| core.bdd_and(-f, -g))
    }

    pub fn xnor(&self, f: &Bdd, g: &Bdd) -> DdResult<Bdd> {
        self.bdd_binary(f, g, |core, f, g| Ok(-core.bdd_xor(f, g)?))
    }

    /// Logical equivalence, an alias of [`Manager::xnor`].
    pub fn iff(&self, f: &Bdd, g: &Bdd) -> DdResult<Bdd> {
        self.xnor(f, g)
    }

    /// `f → g`
    pub fn implies(&self, f: &Bdd, g: &Bdd) -> DdResult<Bdd> {
        self.bdd_binary(f, g, |core, f, g| Ok(-core.bdd_and(f, -g)?))
    }

    /// If-then-else.
    ///
    /// ```
    /// use dd_rs::manager::Manager;
    ///
    /// let mgr = Manager::new(3, 0, None);
    /// let x = mgr.var(0).unwrap();
    /// let y = mgr.var(1).unwrap();
    /// let z = mgr.var(2).unwrap();
    /// let f = mgr.ite(&x, &y, &z).unwrap();
    /// let x_and_y = mgr.and(&x, &y).unwrap();
    /// let not_x_and_z = mgr.and(&!&x, &z).unwrap();
    /// assert_eq!(f, mgr.or(&x_and_y, &not_x_and_z).unwrap());
    /// ```
    pub fn ite(&self, f: &Bdd, g: &Bdd, h: &Bdd) -> DdResult<Bdd> {
        let f = self.check(f)?;
        let g = self.check(g)?;
        let h = self.check(h)?;
        self.run(|core| core.bdd_ite(f, g, h))
    }

    /// Whether `f` implies `g`, without building `f → g`.
    pub fn leq(&self, f: &Bdd, g: &Bdd) -> DdResult<bool> {
        let f = self.check(f)?;
        let g = self.check(g)?;
        self.query(|core| core.bdd_leq(f, g))
    }

    /// Conjunction of all `fs`; `true` for none.
    pub fn and_all<'a>(&self, fs: impl IntoIterator<Item = &'a Bdd>) -> DdResult<Bdd> {
        let fs = fs.into_iter().map(|f| self.check(f)).collect::<DdResult<Vec<_>>>()?;
        self.run(|core| core.bdd_fold(BDD_ONE, &fs, Core::bdd_and))
    }

    /// Disjunction of all `fs`; `false` for none.
    pub fn or_all<'a>(&self, fs: impl IntoIterator<Item = &'a Bdd>) -> DdResult<Bdd> {
        let fs = fs.into_iter().map(|f| self.check(f)).collect::<DdResult<Vec<_>>>()?;
        self.run(|core| core.bdd_fold(BDD_ZERO, &fs, Core::bdd_or))
    }

    /// Conjunction of literals.
    pub fn cube(&self, lits: &[Lit]) -> DdResult<Bdd> {
        self.run(|core| core.bdd_cube(lits))
    }

    /// Conjunction of positive literals over `vars`.
    pub fn cube_of_vars(&self, vars: &[Var]) -> DdResult<Bdd> {
        let lits: Vec<Lit> = vars.iter().map(|v| v.pos()).collect();
        self.cube(&lits)
    }

    /// Disjunction of literals.
    pub fn clause(&self, lits: &[Lit]) -> DdResult<Bdd> {
        let negated: Vec<Lit> = lits.iter().map(|&lit| -lit).collect();
        self.run(|core| Ok(-core.bdd_cube(&negated)?))
    }

    /// Whether `f` is a conjunction of literals. `true` is the empty cube.
    pub fn is_cube(&self, f: &Bdd) -> bool {
        self.check(f)
            .and_then(|f| self.query(|core| Ok(core.bdd_cube_literals(f).is_some())))
            .unwrap_or(false)
    }

    /// Literals of a cube, top level first.
    pub fn cube_literals(&self, f: &Bdd) -> DdResult<Vec<Lit>> {
        let f = self.check(f)?;
        self.query(|core| {
            core.bdd_cube_literals(f)
                .ok_or_else(|| DdError::invalid(format!("{} is not a cube", f)))
        })
    }

    /// `f` with `var` fixed to `value`.
    pub fn cofactor_var(&self, f: &Bdd, var: Var, value: bool) -> DdResult<Bdd> {
        let f = self.check(f)?;
        self.core.check_var(Space::Bdd, var)?;
        self.run(|core| core.bdd_cofactor_var(f, var, value))
    }
}

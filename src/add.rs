//! Algebraic decision diagrams.
//!
//! ADDs share the variable space (and order) of BDDs but live in their own
//! node table without complement edges. Leaves are `f64`; a handful are
//! permanent (`0`, `1`, `+∞`, `-∞`), the rest are hash-consed by value and
//! collected like any other node.

use std::collections::HashMap;

use log::trace;

use crate::cache::OpKey;
use crate::error::{DdError, DdResult};
use crate::gc::Pin;
use crate::handle::{reachable, Add, Bdd};
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::{ADD_MINUS_INF, ADD_ONE, ADD_PLUS_INF, ADD_ZERO, BDD_ONE, BDD_ZERO};
use crate::types::{Kind, Level, Space, Var};

const K: Kind = Kind::Add;

/// Binary operators of [`Manager::add_apply`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AddOp {
    Plus,
    Minus,
    Times,
    Divide,
    Min,
    Max,
    /// The common value where both agree, the background elsewhere.
    Agreement,
    Or,
    And,
    Xor,
    Nand,
    Nor,
    Xnor,
}

impl AddOp {
    /// Operators defined only on 0/1 leaves.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            AddOp::Or | AddOp::And | AddOp::Xor | AddOp::Nand | AddOp::Nor | AddOp::Xnor
        )
    }

    pub fn is_commutative(self) -> bool {
        !matches!(self, AddOp::Minus | AddOp::Divide)
    }

    fn leaves(self, a: f64, b: f64, background: f64) -> DdResult<f64> {
        let bool_of = |x: f64| x != 0.0;
        let num_of = |x: bool| if x { 1.0 } else { 0.0 };
        Ok(match self {
            AddOp::Plus => a + b,
            AddOp::Minus => a - b,
            AddOp::Times => a * b,
            AddOp::Divide => {
                if b == 0.0 {
                    return Err(DdError::DivideByZero);
                }
                a / b
            }
            AddOp::Min => a.min(b),
            AddOp::Max => a.max(b),
            AddOp::Agreement => {
                if a == b {
                    a
                } else {
                    background
                }
            }
            AddOp::Or => num_of(bool_of(a) || bool_of(b)),
            AddOp::And => num_of(bool_of(a) && bool_of(b)),
            AddOp::Xor => num_of(bool_of(a) != bool_of(b)),
            AddOp::Nand => num_of(!(bool_of(a) && bool_of(b))),
            AddOp::Nor => num_of(!(bool_of(a) || bool_of(b))),
            AddOp::Xnor => num_of(bool_of(a) == bool_of(b)),
        })
    }

    /// Cases resolved without looking at the structure of `f` and `g`.
    fn shortcut(self, f: Ref, g: Ref) -> Option<Ref> {
        match self {
            AddOp::Plus if f == ADD_ZERO => Some(g),
            AddOp::Plus if g == ADD_ZERO => Some(f),
            AddOp::Minus if g == ADD_ZERO => Some(f),
            AddOp::Minus if f == g => Some(ADD_ZERO),
            AddOp::Times if f == ADD_ZERO || g == ADD_ZERO => Some(ADD_ZERO),
            AddOp::Times if f == ADD_ONE => Some(g),
            AddOp::Times if g == ADD_ONE => Some(f),
            AddOp::Divide if g == ADD_ONE => Some(f),
            AddOp::Min | AddOp::Max | AddOp::Agreement if f == g => Some(f),
            AddOp::Min if f == ADD_PLUS_INF => Some(g),
            AddOp::Min if g == ADD_PLUS_INF => Some(f),
            AddOp::Min if f == ADD_MINUS_INF || g == ADD_MINUS_INF => Some(ADD_MINUS_INF),
            AddOp::Max if f == ADD_MINUS_INF => Some(g),
            AddOp::Max if g == ADD_MINUS_INF => Some(f),
            AddOp::Max if f == ADD_PLUS_INF || g == ADD_PLUS_INF => Some(ADD_PLUS_INF),
            AddOp::Or if f == ADD_ONE || g == ADD_ONE => Some(ADD_ONE),
            AddOp::Or if f == ADD_ZERO || f == g => Some(g),
            AddOp::Or if g == ADD_ZERO => Some(f),
            AddOp::And if f == ADD_ZERO || g == ADD_ZERO => Some(ADD_ZERO),
            AddOp::And if f == ADD_ONE || f == g => Some(g),
            AddOp::And if g == ADD_ONE => Some(f),
            AddOp::Xor if f == g => Some(ADD_ZERO),
            AddOp::Xor if f == ADD_ZERO => Some(g),
            AddOp::Xor if g == ADD_ZERO => Some(f),
            AddOp::Xnor if f == g => Some(ADD_ONE),
            _ => None,
        }
    }
}

/// Unary operators of [`Manager::add_monadic`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AddUnaryOp {
    Negate,
    /// Natural logarithm; negative leaves are rejected.
    Log,
    /// `1 - f` on 0/1 leaves.
    Complement,
}

impl AddUnaryOp {
    fn leaf(self, a: f64) -> DdResult<f64> {
        match self {
            AddUnaryOp::Negate => Ok(-a),
            AddUnaryOp::Log if a < 0.0 => Err(DdError::invalid(format!("logarithm of negative leaf {}", a))),
            AddUnaryOp::Log => Ok(a.ln()),
            AddUnaryOp::Complement => Ok(if a == 0.0 { 1.0 } else { 0.0 }),
        }
    }
}

/// How ADD leaves are mapped to BDD terminals.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LeafTest {
    /// `v >= lower`
    Threshold,
    /// `v > lower`
    StrictThreshold,
    /// `lower <= v <= upper`
    Interval,
    /// `v != 0`
    Pattern,
}

impl LeafTest {
    fn holds(self, v: f64, lower: f64, upper: f64) -> bool {
        match self {
            LeafTest::Threshold => v >= lower,
            LeafTest::StrictThreshold => v > lower,
            LeafTest::Interval => lower <= v && v <= upper,
            LeafTest::Pattern => v != 0.0,
        }
    }
}

impl Core {
    fn add_value(&self, r: Ref) -> Option<f64> {
        self.leaf_value(r)
    }

    pub(crate) fn add_var(&self, var: Var) -> DdResult<Ref> {
        self.unique(K, var, ADD_ONE, ADD_ZERO)
    }

    /// Topmost level among `refs` and the variable living there.
    fn add_top(&self, refs: &[Ref]) -> (Level, Var) {
        let top = refs.iter().map(|&r| self.level(K, r)).min().unwrap_or(Level::TERMINAL);
        (top, self.var_at(Space::Bdd, top))
    }

    /// Distinct leaf values reachable from `f`.
    pub(crate) fn add_leaves(&self, f: Ref) -> Vec<f64> {
        let ids = reachable(self, K, [f]);
        let table = self.forest(K).table.borrow();
        ids.into_iter()
            .filter_map(|id| table.value(Ref::positive(id)))
            .collect()
    }

    /// Fails with TypeMismatch unless every leaf of `f` is 0 or 1.
    pub(crate) fn add_check_01(&self, f: Ref, what: &str) -> DdResult<()> {
        match self.add_leaves(f).into_iter().find(|&v| v != 0.0 && v != 1.0) {
            Some(v) => Err(DdError::TypeMismatch(format!("{} requires 0/1 leaves, found {}", what, v))),
            None => Ok(()),
        }
    }

    pub(crate) fn add_apply(&self, op: AddOp, f: Ref, g: Ref) -> DdResult<Ref> {
        trace!("add_apply({:?}, f = {}, g = {})", op, f, g);

        if let (Some(a), Some(b)) = (self.add_value(f), self.add_value(g)) {
            let background = self.add_value(self.background.get()).unwrap_or(0.0);
            return self.constant(op.leaves(a, b, background)?);
        }
        if let Some(res) = op.shortcut(f, g) {
            return Ok(res);
        }

        let (f, g) = if op.is_commutative() && f > g { (g, f) } else { (f, g) };
        let key = OpKey::AddApply(op, f, g);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let (top, var) = self.add_top(&[f, g]);
        let (f1, f0) = self.cofactors(K, f, top);
        let (g1, g0) = self.cofactors(K, g, top);
        let t = self.add_apply(op, f1, g1)?;
        let t = self.pin(K, t);
        let e = self.add_apply(op, f0, g0)?;
        let e = self.pin(K, e);
        let res = self.unique(K, var, t.get(), e.get())?;

        self.cache_put(K, key, res);
        Ok(res)
    }

    pub(crate) fn add_monadic(&self, op: AddUnaryOp, f: Ref) -> DdResult<Ref> {
        if let Some(a) = self.add_value(f) {
            return self.constant(op.leaf(a)?);
        }

        let key = OpKey::AddUnary(op, f);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let var = self.var_of(K, f);
        let (f1, f0) = self.children(K, f);
        let t = self.add_monadic(op, f1)?;
        let t = self.pin(K, t);
        let e = self.add_monadic(op, f0)?;
        let e = self.pin(K, e);
        let res = self.unique(K, var, t.get(), e.get())?;

        self.cache_put(K, key, res);
        Ok(res)
    }

    /// Bit `bit` of the integer part of every leaf.
    pub(crate) fn add_ith_bit(&self, f: Ref, bit: u32) -> DdResult<Ref> {
        if let Some(a) = self.add_value(f) {
            let value = a.trunc() as i64;
            return Ok(if (value >> bit) & 1 == 1 { ADD_ONE } else { ADD_ZERO });
        }

        let key = OpKey::AddIthBit(f, bit);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let var = self.var_of(K, f);
        let (f1, f0) = self.children(K, f);
        let t = self.add_ith_bit(f1, bit)?;
        let t = self.pin(K, t);
        let e = self.add_ith_bit(f0, bit)?;
        let e = self.pin(K, e);
        let res = self.unique(K, var, t.get(), e.get())?;

        self.cache_put(K, key, res);
        Ok(res)
    }

    /// `ite(f, g, h)` for a 0/1-valued `f`.
    pub(crate) fn add_ite(&self, f: Ref, g: Ref, h: Ref) -> DdResult<Ref> {
        if f == ADD_ONE {
            return Ok(g);
        }
        if f == ADD_ZERO || g == h {
            return Ok(h);
        }
        if g == ADD_ONE && h == ADD_ZERO {
            return Ok(f);
        }

        let key = OpKey::AddIte(f, g, h);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let (top, var) = self.add_top(&[f, g, h]);
        let (f1, f0) = self.cofactors(K, f, top);
        let (g1, g0) = self.cofactors(K, g, top);
        let (h1, h0) = self.cofactors(K, h, top);
        let t = self.add_ite(f1, g1, h1)?;
        let t = self.pin(K, t);
        let e = self.add_ite(f0, g0, h0)?;
        let e = self.pin(K, e);
        let res = self.unique(K, var, t.get(), e.get())?;

        self.cache_put(K, key, res);
        Ok(res)
    }

    /// Number of variables of a positive BDD cube.
    fn cube_len(&self, mut cube: Ref) -> i32 {
        let mut n = 0;
        while cube != BDD_ONE {
            cube = self.children(Kind::Bdd, cube).0;
            n += 1;
        }
        n
    }

    /// Sum (`sum = true`) or product abstraction of the variables of a BDD cube.
    pub(crate) fn add_abstract(&self, f: Ref, cube: Ref, sum: bool) -> DdResult<Ref> {
        let op = if sum { AddOp::Plus } else { AddOp::Times };
        if cube == BDD_ONE {
            return Ok(f);
        }
        if let Some(a) = self.add_value(f) {
            // Every abstracted variable doubles the sum or squares the product.
            let n = self.cube_len(cube);
            let value = if sum { a * 2f64.powi(n) } else { a.powf(2f64.powi(n)) };
            return self.constant(value);
        }

        let f_level = self.level(K, f);
        let cube_level = self.level(Kind::Bdd, cube);
        if cube_level < f_level {
            let rest = self.children(Kind::Bdd, cube).0;
            let r = self.add_abstract(f, rest, sum)?;
            let r = self.pin(K, r);
            return self.add_apply(op, r.get(), r.get());
        }

        let key = if sum {
            OpKey::AddExists(f, cube)
        } else {
            OpKey::AddForall(f, cube)
        };
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let var = self.var_of(K, f);
        let (f1, f0) = self.children(K, f);
        let res = if cube_level == f_level {
            let rest = self.children(Kind::Bdd, cube).0;
            let t = self.add_abstract(f1, rest, sum)?;
            let t = self.pin(K, t);
            let e = self.add_abstract(f0, rest, sum)?;
            let e = self.pin(K, e);
            self.add_apply(op, t.get(), e.get())?
        } else {
            let t = self.add_abstract(f1, cube, sum)?;
            let t = self.pin(K, t);
            let e = self.add_abstract(f0, cube, sum)?;
            let e = self.pin(K, e);
            self.unique(K, var, t.get(), e.get())?
        };

        self.cache_put(K, key, res);
        Ok(res)
    }

    /// Maps leaves to BDD terminals with `test`.
    pub(crate) fn add_to_bdd(&self, f: Ref, test: LeafTest, lower: f64, upper: f64) -> DdResult<Ref> {
        if let Some(a) = self.add_value(f) {
            return Ok(if test.holds(a, lower, upper) { BDD_ONE } else { BDD_ZERO });
        }

        let key = OpKey::AddToBdd(test, f, lower.to_bits(), upper.to_bits());
        if let Some(res) = self.cache_get(Kind::Bdd, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let var = self.var_of(K, f);
        let (f1, f0) = self.children(K, f);
        let t = self.add_to_bdd(f1, test, lower, upper)?;
        let t = self.pin(Kind::Bdd, t);
        let e = self.add_to_bdd(f0, test, lower, upper)?;
        let e = self.pin(Kind::Bdd, e);
        let res = self.unique(Kind::Bdd, var, t.get(), e.get())?;

        self.cache_put(Kind::Bdd, key, res);
        Ok(res)
    }

    /// `true`/`false` become `1.0`/`0.0`.
    pub(crate) fn bdd_to_add(&self, f: Ref) -> DdResult<Ref> {
        if f == BDD_ONE {
            return Ok(ADD_ONE);
        }
        if f == BDD_ZERO {
            return Ok(ADD_ZERO);
        }

        let key = OpKey::BddToAdd(f);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let var = self.var_of(Kind::Bdd, f);
        let (f1, f0) = self.children(Kind::Bdd, f);
        let t = self.bdd_to_add(f1)?;
        let t = self.pin(K, t);
        let e = self.bdd_to_add(f0)?;
        let e = self.pin(K, e);
        let res = self.unique(K, var, t.get(), e.get())?;

        self.cache_put(K, key, res);
        Ok(res)
    }

    /// `f[var := g]` for a 0/1-valued ADD `g`.
    pub(crate) fn add_compose(&self, f: Ref, var: Var, g: Ref) -> DdResult<Ref> {
        let level = self.var_level(Space::Bdd, var);
        let f_level = self.level(K, f);
        if f_level > level {
            return Ok(f);
        }

        let key = OpKey::AddCompose(f, g, var);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let res = if f_level == level {
            let (high, low) = self.children(K, f);
            self.add_ite(g, high, low)?
        } else {
            let (top, top_var) = self.add_top(&[f, g]);
            let (f1, f0) = self.cofactors(K, f, top);
            let (g1, g0) = self.cofactors(K, g, top);
            let t = self.add_compose(f1, var, g1)?;
            let t = self.pin(K, t);
            let e = self.add_compose(f0, var, g0)?;
            let e = self.pin(K, e);
            self.unique(K, top_var, t.get(), e.get())?
        };

        self.cache_put(K, key, res);
        Ok(res)
    }

    /// Renames every variable `v` to `perm[v]`.
    pub(crate) fn add_permute(&self, f: Ref, perm: &[Var]) -> DdResult<Ref> {
        let mut vars = Vec::with_capacity(perm.len());
        for &v in perm {
            let r = self.add_var(v)?;
            vars.push(self.pin(K, r));
        }
        let vector: Vec<Ref> = vars.iter().map(|p| p.get()).collect();
        let mut memo: HashMap<Ref, Pin<'_>> = HashMap::new();
        self.add_permute_rec(f, &vector, &mut memo)
    }

    fn add_permute_rec<'a>(&'a self, f: Ref, vector: &[Ref], memo: &mut HashMap<Ref, Pin<'a>>) -> DdResult<Ref> {
        if self.is_terminal(K, f) {
            return Ok(f);
        }
        if let Some(res) = memo.get(&f) {
            return Ok(res.get());
        }
        self.check_limits()?;

        let var = self.var_of(K, f);
        let (high, low) = self.children(K, f);
        let t = self.add_permute_rec(high, vector, memo)?;
        let t = self.pin(K, t);
        let e = self.add_permute_rec(low, vector, memo)?;
        let e = self.pin(K, e);
        let res = self.add_ite(vector[var.as_usize()], t.get(), e.get())?;

        memo.insert(f, self.pin(K, res));
        Ok(res)
    }

    /// Cofactor of an ADD by a BDD cube of literals.
    pub(crate) fn add_cofactor(&self, f: Ref, cube: Ref) -> DdResult<Ref> {
        if cube == BDD_ONE || self.is_terminal(K, f) {
            return Ok(f);
        }
        let f_level = self.level(K, f);
        let mut cube = cube;
        while cube != BDD_ONE && self.level(Kind::Bdd, cube) < f_level {
            let (high, low) = self.children(Kind::Bdd, cube);
            cube = if low == BDD_ZERO { high } else { low };
        }
        if cube == BDD_ONE {
            return Ok(f);
        }

        let key = OpKey::Cofactor(f, cube);
        if let Some(res) = self.cache_get(K, &key) {
            return Ok(res);
        }
        self.check_limits()?;

        let (f1, f0) = self.children(K, f);
        let res = if self.level(Kind::Bdd, cube) == f_level {
            let (c1, c0) = self.children(Kind::Bdd, cube);
            if c0 == BDD_ZERO {
                self.add_cofactor(f1, c1)?
            } else {
                self.add_cofactor(f0, c0)?
            }
        } else {
            let var = self.var_of(K, f);
            let t = self.add_cofactor(f1, cube)?;
            let t = self.pin(K, t);
            let e = self.add_cofactor(f0, cube)?;
            let e = self.pin(K, e);
            self.unique(K, var, t.get(), e.get())?
        };

        self.cache_put(K, key, res);
        Ok(res)
    }
}

impl Manager {
    /// The ADD leaf `value`. NaN is rejected.
    pub fn add_const(&self, value: f64) -> DdResult<Add> {
        self.run(|core| core.constant(value))
    }

    pub fn add_zero(&self) -> Add {
        self.add(ADD_ZERO)
    }

    pub fn add_one(&self) -> Add {
        self.add(ADD_ONE)
    }

    pub fn plus_infinity(&self) -> Add {
        self.add(ADD_PLUS_INF)
    }

    pub fn minus_infinity(&self) -> Add {
        self.add(ADD_MINUS_INF)
    }

    /// The value [`AddOp::Agreement`] yields where its operands differ.
    pub fn background(&self) -> Add {
        self.add(self.core.background.get())
    }

    pub fn set_background(&self, value: f64) -> DdResult<()> {
        let r = self.query(|core| core.constant(value))?;
        let old = self.core.background.replace(r);
        self.core.acquire(K, r);
        self.core.release(K, old);
        if old != r {
            // Cached agreement results embed the old background.
            self.core.invalidate_caches();
        }
        Ok(())
    }

    /// The 0/1 projection function of variable `index`.
    pub fn add_var(&self, index: u32) -> DdResult<Add> {
        let var = Var::new(index);
        self.run(|core| {
            core.ensure_var(Space::Bdd, var)?;
            core.add_var(var)
        })
    }

    /// Applies a binary operator leaf by leaf.
    ///
    /// Boolean operators require 0/1 leaves (TypeMismatch otherwise).
    /// Division fails with DivideByZero only if a zero divisor leaf is
    /// actually reached by the recursion.
    pub fn add_apply(&self, op: AddOp, f: &Add, g: &Add) -> DdResult<Add> {
        let f = self.check(f)?;
        let g = self.check(g)?;
        self.run(|core| {
            if op.is_boolean() {
                core.add_check_01(f, &format!("{:?}", op))?;
                core.add_check_01(g, &format!("{:?}", op))?;
            }
            core.add_apply(op, f, g)
        })
    }

    pub fn add_plus(&self, f: &Add, g: &Add) -> DdResult<Add> {
        self.add_apply(AddOp::Plus, f, g)
    }

    pub fn add_minus(&self, f: &Add, g: &Add) -> DdResult<Add> {
        self.add_apply(AddOp::Minus, f, g)
    }

    pub fn add_times(&self, f: &Add, g: &Add) -> DdResult<Add> {
        self.add_apply(AddOp::Times, f, g)
    }

    pub fn add_divide(&self, f: &Add, g: &Add) -> DdResult<Add> {
        self.add_apply(AddOp::Divide, f, g)
    }

    pub fn add_min(&self, f: &Add, g: &Add) -> DdResult<Add> {
        self.add_apply(AddOp::Min, f, g)
    }

    pub fn add_max(&self, f: &Add, g: &Add) -> DdResult<Add> {
        self.add_apply(AddOp::Max, f, g)
    }

    /// Applies a unary operator leaf by leaf.
    pub fn add_monadic(&self, op: AddUnaryOp, f: &Add) -> DdResult<Add> {
        let f = self.check(f)?;
        self.run(|core| {
            if op == AddUnaryOp::Complement {
                core.add_check_01(f, "Complement")?;
            }
            core.add_monadic(op, f)
        })
    }

    pub fn add_negate(&self, f: &Add) -> DdResult<Add> {
        self.add_monadic(AddUnaryOp::Negate, f)
    }

    pub fn add_log(&self, f: &Add) -> DdResult<Add> {
        self.add_monadic(AddUnaryOp::Log, f)
    }

    pub fn add_complement(&self, f: &Add) -> DdResult<Add> {
        self.add_monadic(AddUnaryOp::Complement, f)
    }

    /// `ite(f, g, h)` where `f` is 0/1-valued.
    pub fn add_ite(&self, f: &Add, g: &Add, h: &Add) -> DdResult<Add> {
        let f = self.check(f)?;
        let g = self.check(g)?;
        let h = self.check(h)?;
        self.run(|core| {
            core.add_check_01(f, "ite condition")?;
            core.add_ite(f, g, h)
        })
    }

    /// Sums `f` over both values of every variable of `cube`.
    pub fn add_exists(&self, f: &Add, cube: &Bdd) -> DdResult<Add> {
        let f = self.check(f)?;
        let cube = self.check(cube)?;
        self.run(|core| {
            core.bdd_positive_cube_vars(cube)?;
            core.add_abstract(f, cube, true)
        })
    }

    /// Multiplies `f` over both values of every variable of `cube`.
    pub fn add_forall(&self, f: &Add, cube: &Bdd) -> DdResult<Add> {
        let f = self.check(f)?;
        let cube = self.check(cube)?;
        self.run(|core| {
            core.bdd_positive_cube_vars(cube)?;
            core.add_abstract(f, cube, false)
        })
    }

    /// Smallest leaf value.
    pub fn add_find_min(&self, f: &Add) -> DdResult<f64> {
        let f = self.check(f)?;
        self.query(|core| Ok(core.add_leaves(f).into_iter().fold(f64::INFINITY, f64::min)))
    }

    /// Largest leaf value.
    pub fn add_find_max(&self, f: &Add) -> DdResult<f64> {
        let f = self.check(f)?;
        self.query(|core| Ok(core.add_leaves(f).into_iter().fold(f64::NEG_INFINITY, f64::max)))
    }

    /// Bit `bit` of the integer part of every leaf, as a 0/1 ADD.
    pub fn add_ith_bit(&self, f: &Add, bit: u32) -> DdResult<Add> {
        let f = self.check(f)?;
        if bit >= 64 {
            return Err(DdError::invalid(format!("bit {} out of range", bit)));
        }
        self.run(|core| core.add_ith_bit(f, bit))
    }

    fn leaf_test(&self, f: &Add, test: LeafTest, lower: f64, upper: f64) -> DdResult<Bdd> {
        let f = self.check(f)?;
        if lower.is_nan() || upper.is_nan() {
            return Err(DdError::invalid("NaN bound"));
        }
        self.run(|core| core.add_to_bdd(f, test, lower, upper))
    }

    /// The set where `f >= value`.
    pub fn add_threshold(&self, f: &Add, value: f64) -> DdResult<Bdd> {
        self.leaf_test(f, LeafTest::Threshold, value, 0.0)
    }

    /// The set where `f > value`.
    pub fn add_strict_threshold(&self, f: &Add, value: f64) -> DdResult<Bdd> {
        self.leaf_test(f, LeafTest::StrictThreshold, value, 0.0)
    }

    /// The set where `lower <= f <= upper`.
    pub fn add_interval(&self, f: &Add, lower: f64, upper: f64) -> DdResult<Bdd> {
        self.leaf_test(f, LeafTest::Interval, lower, upper)
    }

    /// The set where `f != 0`.
    pub fn add_pattern(&self, f: &Add) -> DdResult<Bdd> {
        self.leaf_test(f, LeafTest::Pattern, 0.0, 0.0)
    }

    /// Same as [`Manager::add_pattern`], the inverse of [`Manager::bdd_to_add`].
    pub fn add_to_bdd(&self, f: &Add) -> DdResult<Bdd> {
        self.add_pattern(f)
    }

    pub fn bdd_to_add(&self, f: &Bdd) -> DdResult<Add> {
        let f = self.check(f)?;
        self.run(|core| core.bdd_to_add(f))
    }

    /// Substitutes the Boolean function `g` for `var` in `f`.
    pub fn add_compose(&self, f: &Add, var: Var, g: &Bdd) -> DdResult<Add> {
        let f = self.check(f)?;
        let g = self.check(g)?;
        self.core.check_var(Space::Bdd, var)?;
        self.run(|core| {
            let g = core.bdd_to_add(g)?;
            let g = core.pin(K, g);
            core.add_compose(f, var, g.get())
        })
    }

    /// Renames every variable `v` to `perm[v]`.
    pub fn add_permute(&self, f: &Add, perm: &[Var]) -> DdResult<Add> {
        let f = self.check(f)?;
        if perm.len() != self.num_vars() {
            return Err(DdError::invalid(format!(
                "permutation has {} entries for {} variables",
                perm.len(),
                self.num_vars()
            )));
        }
        crate::compose::check_distinct(&self.core, Space::Bdd, perm)?;
        self.run(|core| core.add_permute(f, perm))
    }

    pub fn add_swap_variables(&self, f: &Add, xs: &[Var], ys: &[Var]) -> DdResult<Add> {
        let f = self.check(f)?;
        let perm = crate::compose::swap_permutation(&self.core, Space::Bdd, xs, ys)?;
        self.run(|core| core.add_permute(f, &perm))
    }

    /// Cofactor of `f` with respect to a cube of literals.
    pub fn add_cofactor(&self, f: &Add, cube: &Bdd) -> DdResult<Add> {
        let f = self.check(f)?;
        let cube = self.check(cube)?;
        self.run(|core| {
            if core.bdd_cube_literals(cube).is_none() {
                return Err(DdError::invalid("cofactor expects a cube of literals"));
            }
            core.add_cofactor(f, cube)
        })
    }
}
